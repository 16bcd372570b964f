use crate::app::command_support::{
    load_environment, load_settings, parse_command_options, require_api_key,
};
use crate::config::resolve_config_path;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone)]
struct DoctorFinding {
    id: String,
    ok: bool,
    detail: String,
    remediation: String,
}

fn doctor_finding(
    id: impl Into<String>,
    ok: bool,
    detail: impl Into<String>,
    remediation: impl Into<String>,
) -> DoctorFinding {
    DoctorFinding {
        id: id.into(),
        ok,
        detail: detail.into(),
        remediation: remediation.into(),
    }
}

fn can_write_directory(path: &Path) -> Result<(), String> {
    fs::create_dir_all(path).map_err(|e| format!("failed to create {}: {e}", path.display()))?;
    tempfile::Builder::new()
        .prefix(".tbibkom-doctor-")
        .tempfile_in(path)
        .map(drop)
        .map_err(|e| format!("failed to write in {}: {e}", path.display()))
}

pub fn cmd_doctor(args: &[String]) -> Result<String, String> {
    let options = parse_command_options(args, false)?;
    let mut findings = Vec::new();

    if let Err(err) = load_environment() {
        findings.push(doctor_finding(
            "env.dotenv",
            false,
            err,
            "fix the syntax of ./.env",
        ));
    }

    let source = resolve_config_path(options.config.as_deref());
    findings.push(doctor_finding(
        "config.path",
        true,
        format!(
            "config={} present={}",
            source.path().display(),
            source.path().exists()
        ),
        "none",
    ));

    let settings = match load_settings(&options) {
        Ok(settings) => {
            findings.push(doctor_finding(
                "config.parse",
                true,
                format!(
                    "model={} temperature={} layout={}",
                    settings.model,
                    settings.temperature,
                    settings.transcripts.layout.as_str()
                ),
                "none",
            ));
            Some(settings)
        }
        Err(err) => {
            findings.push(doctor_finding(
                "config.parse",
                false,
                format!("settings load failed: {err}"),
                "fix the settings file and retry `tbibkom doctor`",
            ));
            None
        }
    };

    findings.push(match require_api_key() {
        Ok(_) => doctor_finding("env.OPENAI_API_KEY", true, "credential present", "none"),
        Err(err) => doctor_finding(
            "env.OPENAI_API_KEY",
            false,
            err,
            "set OPENAI_API_KEY in the environment or in ./.env",
        ),
    });

    if let Some(settings) = settings.as_ref() {
        let transcripts = &settings.transcripts.dir;
        findings.push(match can_write_directory(transcripts) {
            Ok(_) => doctor_finding(
                "transcripts.dir",
                true,
                format!("writable={}", transcripts.display()),
                "none",
            ),
            Err(err) => doctor_finding(
                "transcripts.dir",
                false,
                err,
                "grant write permission or change `transcripts.dir`",
            ),
        });

        let log_dir = settings
            .log_file
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        findings.push(match can_write_directory(log_dir) {
            Ok(_) => doctor_finding(
                "log.dir",
                true,
                format!("writable={}", log_dir.display()),
                "none",
            ),
            Err(err) => doctor_finding(
                "log.dir",
                false,
                err,
                "grant write permission or change `log_file`",
            ),
        });
    }

    let failed = findings.iter().filter(|f| !f.ok).count();
    let summary = if failed == 0 { "healthy" } else { "unhealthy" };
    let mut lines = vec![
        format!("summary={summary}"),
        format!("checks_total={}", findings.len()),
        format!("checks_failed={failed}"),
    ];
    for finding in findings {
        lines.push(format!(
            "check:{}={}",
            finding.id,
            if finding.ok { "ok" } else { "fail" }
        ));
        lines.push(format!("check:{}.detail={}", finding.id, finding.detail));
        if !finding.ok {
            lines.push(format!(
                "check:{}.remediation={}",
                finding.id, finding.remediation
            ));
        }
    }
    Ok(lines.join("\n"))
}
