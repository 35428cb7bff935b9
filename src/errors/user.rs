use axum::http::StatusCode;
use thiserror::Error;

use super::{AppError, ErrorSeverity, impl_into_response};

/// Errors raised by registration and login
#[derive(Error, Debug)]
pub enum UserError {
    #[error("Username '{username}' already exists")]
    DuplicateUsername { username: String },

    #[error("Email '{email}' already exists")]
    DuplicateEmail { email: String },

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Password does not meet requirements: {requirements}")]
    InvalidPassword { requirements: String },

    #[error("Username '{username}' is invalid: {reason}")]
    InvalidUsername { username: String, reason: String },

    #[error("Email '{email}' is invalid")]
    InvalidEmail { email: String },

    #[error("Captcha verification failed")]
    CaptchaFailed,

    #[error("Captcha token is missing")]
    CaptchaMissing,

    #[error("Internal server error: {message}")]
    InternalServerError { message: String },
}

impl AppError for UserError {
    fn status_code(&self) -> StatusCode {
        match self {
            UserError::DuplicateUsername { .. } | UserError::DuplicateEmail { .. } => StatusCode::CONFLICT,
            UserError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            UserError::InvalidPassword { .. }
            | UserError::InvalidUsername { .. }
            | UserError::InvalidEmail { .. }
            | UserError::CaptchaMissing => StatusCode::BAD_REQUEST,
            UserError::CaptchaFailed => StatusCode::FORBIDDEN,
            UserError::InternalServerError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn user_message(&self) -> String {
        match self {
            UserError::DuplicateUsername { .. } => "Username already exists".to_string(),
            UserError::DuplicateEmail { .. } => "Email already exists".to_string(),
            UserError::InvalidCredentials => "Invalid username or password".to_string(),
            UserError::InvalidPassword { requirements } => format!("Password does not meet requirements: {}", requirements),
            UserError::InvalidUsername { reason, .. } => format!("Invalid username: {}", reason),
            UserError::InvalidEmail { .. } => "Invalid email address".to_string(),
            UserError::CaptchaFailed => "Captcha verification failed".to_string(),
            UserError::CaptchaMissing => "Captcha token is required".to_string(),
            UserError::InternalServerError { .. } => "An internal error occurred".to_string(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            UserError::DuplicateUsername { .. } => "USER_DUPLICATE_USERNAME",
            UserError::DuplicateEmail { .. } => "USER_DUPLICATE_EMAIL",
            UserError::InvalidCredentials => "USER_INVALID_CREDENTIALS",
            UserError::InvalidPassword { .. } => "USER_INVALID_PASSWORD",
            UserError::InvalidUsername { .. } => "USER_INVALID_USERNAME",
            UserError::InvalidEmail { .. } => "USER_INVALID_EMAIL",
            UserError::CaptchaFailed => "USER_CAPTCHA_FAILED",
            UserError::CaptchaMissing => "USER_CAPTCHA_MISSING",
            UserError::InternalServerError { .. } => "USER_INTERNAL_SERVER_ERROR",
        }
    }

    fn error_severity(&self) -> ErrorSeverity {
        match self {
            UserError::InvalidCredentials => ErrorSeverity::Expected,
            UserError::CaptchaFailed => ErrorSeverity::Important,
            UserError::InternalServerError { .. } => ErrorSeverity::Critical,
            _ => ErrorSeverity::Minor,
        }
    }

    fn suggested_action(&self) -> Option<String> {
        match self {
            UserError::DuplicateUsername { .. } => Some("Please choose a different username".to_string()),
            UserError::DuplicateEmail { .. } => Some("Please use a different email address".to_string()),
            UserError::InvalidPassword { .. } => Some("Use at least 8 characters".to_string()),
            UserError::InvalidCredentials => Some("Please check your username and password".to_string()),
            UserError::CaptchaFailed | UserError::CaptchaMissing => Some("Complete the captcha and try again".to_string()),
            _ => None,
        }
    }
}

impl_into_response!(UserError);

impl UserError {
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::InternalServerError { message: message.into() }
    }
}

/// Basic shape checks run before a user row is created.
pub fn validate_registration(username: &str, email: &str, password: &str) -> Result<(), UserError> {
    let username_trimmed = username.trim();
    if username_trimmed.len() < 3 || username_trimmed.len() > 64 {
        return Err(UserError::InvalidUsername {
            username: username.to_string(),
            reason: "must be between 3 and 64 characters".to_string(),
        });
    }
    if !username_trimmed
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        return Err(UserError::InvalidUsername {
            username: username.to_string(),
            reason: "may only contain letters, digits, '.', '_' and '-'".to_string(),
        });
    }

    let mut parts = email.trim().splitn(2, '@');
    let local = parts.next().unwrap_or("");
    let domain = parts.next().unwrap_or("");
    if local.is_empty() || !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return Err(UserError::InvalidEmail { email: email.to_string() });
    }

    if password.chars().count() < 8 {
        return Err(UserError::InvalidPassword {
            requirements: "at least 8 characters".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_registration_accepts_accented_usernames() {
        assert!(validate_registration("hélène.roy", "helene@exemple.ca", "motdepasse1").is_ok());
    }

    #[test]
    fn test_validate_registration_rejects_bad_input() {
        assert!(matches!(
            validate_registration("ab", "a@b.ca", "password1"),
            Err(UserError::InvalidUsername { .. })
        ));
        assert!(matches!(
            validate_registration("good_name", "not-an-email", "password1"),
            Err(UserError::InvalidEmail { .. })
        ));
        assert!(matches!(
            validate_registration("good_name", "a@b.ca", "short"),
            Err(UserError::InvalidPassword { .. })
        ));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(UserError::InvalidCredentials.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(UserError::CaptchaFailed.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            UserError::DuplicateUsername { username: "x".into() }.status_code(),
            StatusCode::CONFLICT
        );
    }
}
