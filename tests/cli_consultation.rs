use serde_json::{json, Value};
use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use tempfile::tempdir;

fn command(cwd: &Path, args: &[&str], envs: &[(&str, &str)]) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_tbibkom"));
    cmd.args(args)
        .current_dir(cwd)
        .env_remove("OPENAI_API_KEY")
        .env_remove("TBIBKOM_CONFIG")
        .env_remove("TBIBKOM_API_BASE");
    for (key, value) in envs {
        cmd.env(key, value);
    }
    cmd
}

fn run(cwd: &Path, args: &[&str], envs: &[(&str, &str)]) -> Output {
    command(cwd, args, envs).output().expect("run tbibkom")
}

fn run_with_stdin_and_env(
    cwd: &Path,
    args: &[&str],
    stdin_body: &str,
    envs: &[(&str, &str)],
) -> Output {
    let mut cmd = command(cwd, args, envs);
    cmd.stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    let mut child = cmd.spawn().expect("spawn tbibkom");
    if let Some(mut stdin) = child.stdin.take() {
        // The process may exit before reading (e.g. missing credential).
        let _ = stdin.write_all(stdin_body.as_bytes());
    }
    child.wait_with_output().expect("wait output")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

fn assert_ok(output: &Output) {
    assert!(
        output.status.success(),
        "stdout:\n{}\nstderr:\n{}",
        stdout(output),
        stderr(output)
    );
}

fn assert_err_contains(output: &Output, needle: &str) {
    assert!(
        !output.status.success(),
        "expected failure, stdout:\n{}\nstderr:\n{}",
        stdout(output),
        stderr(output)
    );
    let text = format!("{}{}", stdout(output), stderr(output));
    assert!(
        text.contains(needle),
        "expected error to contain `{needle}`, got:\n{text}"
    );
}

fn transcript_files(cwd: &Path) -> Vec<std::path::PathBuf> {
    let dir = cwd.join("conversations");
    if !dir.exists() {
        return Vec::new();
    }
    fs::read_dir(dir)
        .expect("read conversations")
        .map(|entry| entry.expect("entry").path())
        .collect()
}

fn completion_mock(server: &mut mockito::Server, content: &str) -> mockito::Mock {
    server
        .mock("POST", "/chat/completions")
        .match_header("authorization", "Bearer sk-test")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({"choices": [{"message": {"role": "assistant", "content": content}}]})
                .to_string(),
        )
        .create()
}

#[test]
fn help_lists_commands() {
    let temp = tempdir().expect("tempdir");
    let output = run(temp.path(), &["help"], &[]);
    assert_ok(&output);
    let text = stdout(&output);
    assert!(text.contains("chat [--plain]"));
    assert!(text.contains("doctor"));
}

#[test]
fn unknown_command_fails() {
    let temp = tempdir().expect("tempdir");
    let output = run(temp.path(), &["serve"], &[]);
    assert_err_contains(&output, "unknown command `serve`");
}

#[test]
fn chat_without_credential_fails_before_reading_input() {
    let temp = tempdir().expect("tempdir");
    let output = run_with_stdin_and_env(temp.path(), &["chat", "--plain"], "bonjour\n", &[]);
    assert_err_contains(&output, "OPENAI_API_KEY");
    assert!(!stdout(&output).contains("you>"));
    assert!(!temp.path().join("conversations").exists());
}

#[test]
fn blank_credential_in_dotenv_is_missing() {
    let temp = tempdir().expect("tempdir");
    fs::write(temp.path().join(".env"), "OPENAI_API_KEY=   \n").expect("write .env");
    let output = run_with_stdin_and_env(temp.path(), &["chat", "--plain"], "bonjour\n", &[]);
    assert_err_contains(&output, "Clé API OpenAI manquante");
}

#[test]
fn plain_chat_persists_each_exchange() {
    let question = "لدي صداع منذ يومين";
    let answer = "منذ متى بدأ الصداع بالتحديد؟";
    let mut server = mockito::Server::new();
    let mock = completion_mock(&mut server, answer);

    let temp = tempdir().expect("tempdir");
    let url = server.url();
    let output = run_with_stdin_and_env(
        temp.path(),
        &["chat", "--plain"],
        &format!("{question}\n\n/exit\n"),
        &[("OPENAI_API_KEY", "sk-test"), ("TBIBKOM_API_BASE", &url)],
    );
    assert_ok(&output);
    mock.assert();

    let text = stdout(&output);
    assert!(text.contains(&format!("assistant> {answer}")));
    assert!(text.contains("turns=2"));

    let files = transcript_files(temp.path());
    assert_eq!(files.len(), 1);
    let record: Value =
        serde_json::from_str(&fs::read_to_string(&files[0]).expect("read")).expect("json");
    assert_eq!(
        files[0].file_name().and_then(|n| n.to_str()),
        record["id"].as_str().map(|id| format!("{id}.json")).as_deref()
    );
    assert_eq!(
        record["dialogue"],
        json!([
            {"role": "user", "content": question},
            {"role": "assistant", "content": answer}
        ])
    );

    let log = fs::read_to_string(temp.path().join("logs/tbibkom.log")).expect("read log");
    assert!(log.contains("session.started"));
    assert!(log.contains("transcript.persisted"));
}

#[test]
fn plain_chat_reports_gateway_errors_and_continues() {
    let mut server = mockito::Server::new();
    let _mock = server
        .mock("POST", "/chat/completions")
        .with_status(500)
        .with_body("boom")
        .create();

    let temp = tempdir().expect("tempdir");
    let url = server.url();
    let output = run_with_stdin_and_env(
        temp.path(),
        &["chat", "--plain"],
        "test\n",
        &[("OPENAI_API_KEY", "sk-test"), ("TBIBKOM_API_BASE", &url)],
    );
    assert_ok(&output);
    let text = stdout(&output);
    assert!(text.contains("error> ❌ Erreur : "));
    assert!(text.contains("turns=1"));
    assert!(transcript_files(temp.path()).is_empty());
}

#[test]
fn new_command_resets_the_consultation() {
    let mut server = mockito::Server::new();
    let _mock = completion_mock(&mut server, "Où avez-vous mal ?");

    let temp = tempdir().expect("tempdir");
    let url = server.url();
    let output = run_with_stdin_and_env(
        temp.path(),
        &["chat", "--plain"],
        "bonjour\n/new\n",
        &[("OPENAI_API_KEY", "sk-test"), ("TBIBKOM_API_BASE", &url)],
    );
    assert_ok(&output);
    let text = stdout(&output);
    assert!(text.contains("notice> 🆕 Nouvelle consultation démarrée."));
    assert!(text.contains("turns=0"));
    assert_eq!(transcript_files(temp.path()).len(), 1);
}

#[test]
fn chat_honours_config_file_transcript_dir() {
    let mut server = mockito::Server::new();
    let _mock = completion_mock(&mut server, "Depuis quand ?");

    let temp = tempdir().expect("tempdir");
    fs::write(
        temp.path().join("tbibkom.yaml"),
        "transcripts:\n  dir: archive\n  layout: per_session\n",
    )
    .expect("write config");
    let url = server.url();
    let output = run_with_stdin_and_env(
        temp.path(),
        &["chat", "--plain"],
        "bonjour\nj'ai mal\n",
        &[("OPENAI_API_KEY", "sk-test"), ("TBIBKOM_API_BASE", &url)],
    );
    assert_ok(&output);
    let files: Vec<_> = fs::read_dir(temp.path().join("archive"))
        .expect("read archive")
        .collect();
    assert_eq!(files.len(), 1);
    assert!(!temp.path().join("conversations").exists());
}

#[test]
fn doctor_reports_health_checks() {
    let temp = tempdir().expect("tempdir");
    let output = run(temp.path(), &["doctor"], &[]);
    assert_ok(&output);
    let text = stdout(&output);
    assert!(text.contains("summary=unhealthy"));
    assert!(text.contains("check:env.OPENAI_API_KEY=fail"));
    assert!(text.contains("check:transcripts.dir=ok"));

    let output = run(temp.path(), &["doctor"], &[("OPENAI_API_KEY", "sk-test")]);
    assert_ok(&output);
    let text = stdout(&output);
    assert!(text.contains("summary=healthy"));
    assert!(text.contains("checks_failed=0"));
}

#[test]
fn doctor_flags_invalid_settings() {
    let temp = tempdir().expect("tempdir");
    fs::write(temp.path().join("tbibkom.yaml"), "temperature: 7\n").expect("write config");
    let output = run(temp.path(), &["doctor"], &[("OPENAI_API_KEY", "sk-test")]);
    assert_ok(&output);
    let text = stdout(&output);
    assert!(text.contains("check:config.parse=fail"));
    assert!(text.contains("check:config.parse.remediation="));
}
