//! Startup validation of environment variables.
//!
//! Checks that required variables are present and that third-party keys carry
//! the prefixes their providers issue, including Stripe live/test consistency.

use std::collections::HashMap;

const REQUIRED: [&str; 2] = ["DATABASE_URL", "JWT_SECRET"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyMode {
    Live,
    Test,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvIssue {
    pub variable: String,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct EnvReport {
    pub errors: Vec<EnvIssue>,
    pub warnings: Vec<EnvIssue>,
    /// Variables that passed every check
    pub ok: Vec<String>,
}

impl EnvReport {
    fn error(&mut self, variable: &str, message: impl Into<String>) {
        self.errors.push(EnvIssue { variable: variable.to_string(), message: message.into() });
    }

    fn warn(&mut self, variable: &str, message: impl Into<String>) {
        self.warnings.push(EnvIssue { variable: variable.to_string(), message: message.into() });
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Run the checks against the current process environment.
pub fn validate_process_env() -> EnvReport {
    dotenvy::dotenv().ok();
    let vars: HashMap<String, String> = std::env::vars().collect();
    validate_env(&vars)
}

pub fn validate_env(vars: &HashMap<String, String>) -> EnvReport {
    let mut report = EnvReport::default();
    let get = |name: &str| vars.get(name).map(|v| v.trim()).filter(|v| !v.is_empty());
    let production = get("APP_ENV")
        .map(|v| v.eq_ignore_ascii_case("production"))
        .unwrap_or(false);

    for name in REQUIRED {
        if get(name).is_none() {
            report.error(name, "is required but not set");
        }
    }

    if let Some(secret) = get("JWT_SECRET") {
        if secret == "your-secret-key" || secret.len() < 32 {
            let message = "should be a random value of at least 32 characters";
            if production {
                report.error("JWT_SECRET", message);
            } else {
                report.warn("JWT_SECRET", message);
            }
        } else {
            report.ok.push("JWT_SECRET".to_string());
        }
    }

    if let Some(url) = get("DATABASE_URL") {
        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            report.ok.push("DATABASE_URL".to_string());
        } else {
            report.error("DATABASE_URL", "must be a postgres:// or postgresql:// URL");
        }
    }

    match get("ANTHROPIC_API_KEY") {
        Some(key) if key.starts_with("sk-ant-") => report.ok.push("ANTHROPIC_API_KEY".to_string()),
        Some(_) => report.error("ANTHROPIC_API_KEY", "must start with 'sk-ant-'"),
        None => report.warn("ANTHROPIC_API_KEY", "not set; documents are analysed with local heuristics"),
    }

    let secret_mode = check_stripe_key(&mut report, get("STRIPE_SECRET_KEY"), "STRIPE_SECRET_KEY", &["sk_", "rk_"]);
    let publishable_mode = check_stripe_key(&mut report, get("STRIPE_PUBLISHABLE_KEY"), "STRIPE_PUBLISHABLE_KEY", &["pk_"]);

    if let (Some(secret), Some(publishable)) = (secret_mode, publishable_mode) {
        if secret != publishable {
            report.error(
                "STRIPE_PUBLISHABLE_KEY",
                format!("is a {:?} key but STRIPE_SECRET_KEY is a {:?} key", publishable, secret),
            );
        }
    }
    for (name, mode) in [("STRIPE_SECRET_KEY", secret_mode), ("STRIPE_PUBLISHABLE_KEY", publishable_mode)] {
        match (mode, production) {
            (Some(KeyMode::Test), true) => report.warn(name, "is a test key in production"),
            (Some(KeyMode::Live), false) => report.warn(name, "is a live key outside production"),
            _ => {}
        }
    }

    check_prefix(&mut report, get("STRIPE_WEBHOOK_SECRET"), "STRIPE_WEBHOOK_SECRET", "whsec_");
    check_prefix(&mut report, get("RESEND_API_KEY"), "RESEND_API_KEY", "re_");
    check_prefix(&mut report, get("HCAPTCHA_SECRET"), "HCAPTCHA_SECRET", "0x");

    let mut price_vars: Vec<&String> = vars.keys().filter(|k| k.starts_with("STRIPE_PRICE_")).collect();
    price_vars.sort();
    for name in price_vars {
        check_prefix(&mut report, get(name), name, "price_");
    }

    report
}

/// Mode implied by a Stripe key such as `sk_live_...` or `pk_test_...`.
pub fn stripe_key_mode(key: &str) -> Option<KeyMode> {
    let rest = key.get(3..)?;
    if rest.starts_with("live_") {
        Some(KeyMode::Live)
    } else if rest.starts_with("test_") {
        Some(KeyMode::Test)
    } else {
        None
    }
}

fn check_stripe_key(report: &mut EnvReport, value: Option<&str>, name: &str, prefixes: &[&str]) -> Option<KeyMode> {
    let value = value?;
    if !prefixes.iter().any(|p| value.starts_with(p)) {
        report.error(name, format!("must start with one of {:?}", prefixes));
        return None;
    }
    match stripe_key_mode(value) {
        Some(mode) => {
            report.ok.push(name.to_string());
            Some(mode)
        }
        None => {
            report.error(name, "must be a live_ or test_ key");
            None
        }
    }
}

fn check_prefix(report: &mut EnvReport, value: Option<&str>, name: &str, prefix: &str) {
    if let Some(value) = value {
        if value.starts_with(prefix) {
            report.ok.push(name.to_string());
        } else {
            report.error(name, format!("must start with '{}'", prefix));
        }
    }
}
