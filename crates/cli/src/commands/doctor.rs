//! Doctor command - validate configuration and show status

use anyhow::Result;
use serde::Serialize;
use social_relay_adapters::credentials::SqliteCredentialStore;
use std::path::{Path, PathBuf};

use crate::args::DoctorArgs;
use crate::config::{AppConfig, OAuthAppConfig};

#[derive(Debug, Serialize)]
struct DoctorReport {
    config: CheckResult,
    storage: CheckResult,
    linkedin: CheckResult,
    linkedin_page: CheckResult,
    github: CheckResult,
    google: CheckResult,
    openid: CheckResult,
    publishing: CheckResult,
    overall: String,
}

#[derive(Debug, Serialize)]
struct CheckResult {
    status: String,
    message: String,
    details: Option<serde_json::Value>,
}

impl CheckResult {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            status: "ok".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn warn(message: impl Into<String>) -> Self {
        Self {
            status: "warn".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    fn is_ok(&self) -> bool {
        self.status == "ok"
    }

    fn is_error(&self) -> bool {
        self.status == "error"
    }
}

pub async fn execute(args: DoctorArgs, config_path: Option<PathBuf>) -> Result<()> {
    let mut report = DoctorReport {
        config: CheckResult::error("Not checked"),
        storage: CheckResult::error("Not checked"),
        linkedin: CheckResult::error("Not checked"),
        linkedin_page: CheckResult::error("Not checked"),
        github: CheckResult::error("Not checked"),
        google: CheckResult::error("Not checked"),
        openid: CheckResult::error("Not checked"),
        publishing: CheckResult::error("Not checked"),
        overall: "error".to_string(),
    };

    // Check config
    let config = match AppConfig::load(config_path.as_deref()) {
        Ok(c) => {
            report.config = CheckResult::ok("Configuration loaded successfully");
            Some(c)
        }
        Err(e) => {
            report.config = CheckResult::error(format!("Failed to load config: {:#}", e));
            None
        }
    };

    if let Some(ref config) = config {
        report.storage = check_storage(&config.general.state_db_path).await;
        report.linkedin = check_app(config.linkedin.as_ref().map(|s| &s.app));
        report.linkedin_page = check_app(config.linkedin_page.as_ref().map(|s| &s.app));
        report.github = check_app(config.github.as_ref());
        report.google = check_app(config.google.as_ref());
        report.openid = check_app(config.openid.as_ref().map(|s| &s.app));
    }

    // Login providers are optional; only publishing setup decides the outcome
    report.publishing = check_publishing(config.as_ref());

    let checks = [&report.config, &report.storage, &report.publishing];

    let has_error = checks.iter().any(|c| c.is_error());
    let all_ok = checks.iter().all(|c| c.is_ok());

    report.overall = if has_error {
        "error".to_string()
    } else if all_ok {
        "ok".to_string()
    } else {
        "warn".to_string()
    };

    // Output report
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if report.overall == "error" {
        std::process::exit(1);
    }

    Ok(())
}

async fn check_storage(path: &Path) -> CheckResult {
    match SqliteCredentialStore::new(path).await {
        Ok(_) => CheckResult::ok(format!("Credential store: {}", path.display()))
            .with_details(serde_json::json!({ "path": path.display().to_string() })),
        Err(e) => CheckResult::error(format!(
            "Failed to open credential store {}: {}",
            path.display(),
            e
        )),
    }
}

fn check_app(section: Option<&OAuthAppConfig>) -> CheckResult {
    let Some(app) = section else {
        return CheckResult::ok("Not configured");
    };

    if app.client_id.trim().is_empty() {
        return CheckResult::error("client_id is empty");
    }

    if app.client_secret_env.trim().is_empty() {
        return CheckResult::error("No client secret env var configured");
    }

    // Report whether the secret is set without revealing the value
    if app.secret_is_set() {
        CheckResult::ok(format!(
            "Client secret: {} (set), Redirect: {}",
            app.client_secret_env, app.redirect_uri
        ))
    } else {
        CheckResult::warn(format!(
            "Client secret: {} (not set), Redirect: {}",
            app.client_secret_env, app.redirect_uri
        ))
    }
}

/// Publishing needs a LinkedIn section whose client secret is available
fn check_publishing(config: Option<&AppConfig>) -> CheckResult {
    let Some(config) = config else {
        return CheckResult::error("Configuration not loaded");
    };

    let sections = [
        ("linkedin", config.linkedin.as_ref()),
        ("linkedin_page", config.linkedin_page.as_ref()),
    ];
    let checks: Vec<(&str, CheckResult)> = sections
        .into_iter()
        .filter_map(|(name, section)| section.map(|s| (name, check_app(Some(&s.app)))))
        .collect();

    if checks.iter().any(|(_, check)| check.is_error()) {
        return CheckResult::error("LinkedIn configuration is invalid");
    }

    let ready: Vec<&str> = checks
        .iter()
        .filter(|(_, check)| check.is_ok())
        .map(|(name, _)| *name)
        .collect();

    if ready.is_empty() {
        CheckResult::warn("No publishing provider ready (only `stub` is usable)")
    } else {
        CheckResult::ok(format!("Publishing configured: {}", ready.join(", ")))
            .with_details(serde_json::json!({ "providers": ready }))
    }
}

fn print_report(report: &DoctorReport) {
    println!("social-relay Doctor Report");
    println!("==========================");
    println!();

    print_check("Config", &report.config);
    print_check("Storage", &report.storage);
    print_check("LinkedIn", &report.linkedin);
    print_check("LinkedIn Page", &report.linkedin_page);
    print_check("GitHub Login", &report.github);
    print_check("Google Login", &report.google);
    print_check("OpenID Login", &report.openid);
    print_check("Publishing", &report.publishing);

    println!();
    let symbol = match report.overall.as_str() {
        "ok" => "✓",
        "warn" => "⚠",
        _ => "✗",
    };
    println!("{} Overall: {}", symbol, report.overall.to_uppercase());

    if report.overall == "ok" {
        println!();
        println!("Ready! Try: social-relay auth-url --provider linkedin");
    }
}

fn print_check(name: &str, result: &CheckResult) {
    let symbol = match result.status.as_str() {
        "ok" => "✓",
        "warn" => "⚠",
        _ => "✗",
    };
    println!("{} {}: {}", symbol, name, result.message);
}
