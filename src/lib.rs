pub mod app;
pub mod channels;
pub mod config;
pub mod consultation;
pub mod prompts;
pub mod provider;
pub mod shared;
pub mod transcript;
