const CONSULTATION_PREAMBLE: &str = include_str!("assets/consultation.preamble.md");

pub const PATIENT_LABEL: &str = "Patient";

/// Instructions sent ahead of every patient message: persona, the five-step
/// consultation, reply-in-the-patient's-script, one question per turn, no
/// immediate diagnosis.
pub fn consultation_preamble() -> &'static str {
    CONSULTATION_PREAMBLE.trim_end()
}

/// Builds the exact text sent to the completion gateway for one utterance.
/// The preamble is resent on every turn and never depends on history.
pub fn compose_prompt(user_utterance: &str) -> String {
    format!(
        "{}\n\n{PATIENT_LABEL} : {user_utterance}",
        consultation_preamble()
    )
}
