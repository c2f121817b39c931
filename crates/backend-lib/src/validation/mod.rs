// ============================
// crates/backend-lib/src/validation/mod.rs
// ============================
//! Request validation module.
//!
//! Every handler turns its raw request body into a validated domain value
//! through one of the functions below before any service is called.

use std::fmt;
use std::sync::LazyLock;

use notes_common::{AuthRequest, CreateNoteRequest, EditNoteRequest, EditUserRequest, NoteId};
use regex::Regex;
use serde::de::DeserializeOwned;
use thiserror::Error;
use zeroize::Zeroize;

use crate::models::{NewNote, NotePatch, UserPatch};

// Common validation constants
const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321 SMTP limit
const MAX_PASSWORD_LENGTH: usize = 128;
const MAX_NAME_LENGTH: usize = 100;
const MAX_TITLE_LENGTH: usize = 200;
const MAX_DESCRIPTION_LENGTH: usize = 10_000;

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email regex is valid")
});

/// A single field-level validation failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{message}")]
    MissingField {
        field: &'static str,
        message: String,
    },

    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("Invalid password: {0}")]
    InvalidPassword(String),

    #[error("Invalid title: {0}")]
    InvalidTitle(String),

    #[error("Invalid description: {0}")]
    InvalidDescription(String),

    #[error("Invalid {field}: {message}")]
    InvalidName {
        field: &'static str,
        message: String,
    },

    #[error("Invalid note ID: {0}")]
    InvalidNoteId(String),

    #[error("Malformed request body: {0}")]
    MalformedBody(String),
}

impl ValidationError {
    /// Name of the request field this error belongs to
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::MissingField { field, .. } | ValidationError::InvalidName { field, .. } => {
                *field
            },
            ValidationError::InvalidEmail(_) => "email",
            ValidationError::InvalidPassword(_) => "password",
            ValidationError::InvalidTitle(_) => "title",
            ValidationError::InvalidDescription(_) => "description",
            ValidationError::InvalidNoteId(_) => "id",
            ValidationError::MalformedBody(_) => "body",
        }
    }

    /// Client facing message, without the field prefix
    pub fn message(&self) -> &str {
        match self {
            ValidationError::MissingField { message, .. }
            | ValidationError::InvalidName { message, .. }
            | ValidationError::InvalidEmail(message)
            | ValidationError::InvalidPassword(message)
            | ValidationError::InvalidTitle(message)
            | ValidationError::InvalidDescription(message)
            | ValidationError::InvalidNoteId(message)
            | ValidationError::MalformedBody(message) => message,
        }
    }
}

/// All failures found while validating one request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    pub fn push(&mut self, error: ValidationError) {
        self.0.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.0.iter()
    }

    /// Whether any error is bound to `field`
    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field() == field)
    }

    fn record<T>(&mut self, result: Result<T, ValidationError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                self.push(err);
                None
            },
        }
    }

    fn finish<T>(self, value: impl FnOnce() -> T) -> ValidationResult<T> {
        if self.is_empty() {
            Ok(value())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Validation failed")?;
        for (i, err) in self.0.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{sep}{err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl From<ValidationError> for ValidationErrors {
    fn from(err: ValidationError) -> Self {
        Self(vec![err])
    }
}

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, ValidationErrors>;

/// Validated sign-up / sign-in credentials. The password is wiped on drop.
#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Drop for Credentials {
    fn drop(&mut self) {
        self.password.zeroize();
    }
}

/// Decode a JSON request body. An empty body decodes to `T::default()` so that
/// missing fields surface as field-level errors.
pub fn parse_body<T: DeserializeOwned + Default>(body: &[u8]) -> ValidationResult<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| ValidationError::MalformedBody(e.to_string()).into())
}

/// Validate an email address
pub fn validate_email(email: &str) -> Result<&str, ValidationError> {
    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::InvalidEmail(format!(
            "Email address cannot exceed {MAX_EMAIL_LENGTH} characters"
        )));
    }

    if !EMAIL_REGEX.is_match(email) {
        return Err(ValidationError::InvalidEmail("Email is not valid".to_string()));
    }

    Ok(email)
}

fn required<'a>(
    value: Option<&'a str>,
    field: &'static str,
    message: &str,
) -> Result<&'a str, ValidationError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ValidationError::MissingField {
            field,
            message: message.to_string(),
        }),
    }
}

fn validate_name(value: String, field: &'static str) -> Result<String, ValidationError> {
    if value.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::InvalidName {
            field,
            message: format!("Must not exceed {MAX_NAME_LENGTH} characters"),
        });
    }
    Ok(value)
}

fn validate_title(title: &str) -> Result<String, ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::InvalidTitle("Title must not be empty".to_string()));
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(ValidationError::InvalidTitle(format!(
            "Title must not exceed {MAX_TITLE_LENGTH} characters"
        )));
    }
    Ok(title.to_string())
}

fn validate_description(description: String) -> Result<String, ValidationError> {
    if description.chars().count() > MAX_DESCRIPTION_LENGTH {
        return Err(ValidationError::InvalidDescription(format!(
            "Description must not exceed {MAX_DESCRIPTION_LENGTH} characters"
        )));
    }
    Ok(description)
}

/// Validate the body of `POST /auth/signup` and `POST /auth/signin`
pub fn validate_auth_request(request: AuthRequest) -> ValidationResult<Credentials> {
    let mut errors = ValidationErrors::default();

    let email = errors
        .record(required(request.email.as_deref(), "email", "Email is not provided"))
        .and_then(|email| errors.record(validate_email(email)))
        .map(str::to_string);

    let password = errors
        .record(required(request.password.as_deref(), "password", "Password is not provided"))
        .and_then(|password| {
            if password.chars().count() > MAX_PASSWORD_LENGTH {
                errors.push(ValidationError::InvalidPassword(format!(
                    "Password cannot exceed {MAX_PASSWORD_LENGTH} characters"
                )));
                None
            } else {
                Some(password.to_string())
            }
        });

    let mut request = request;
    if let Some(plain) = request.password.as_mut() {
        plain.zeroize();
    }

    errors.finish(|| Credentials {
        email: email.unwrap_or_default(),
        password: password.unwrap_or_default(),
    })
}

/// Validate the body of `PATCH /users`
pub fn validate_edit_user(request: EditUserRequest) -> ValidationResult<UserPatch> {
    let mut errors = ValidationErrors::default();

    let email = match request.email {
        Some(email) => errors.record(validate_email(&email).map(str::to_string)),
        None => None,
    };
    let first_name = request
        .firstname
        .and_then(|name| errors.record(validate_name(name, "firstname")));
    let last_name = request
        .lastname
        .and_then(|name| errors.record(validate_name(name, "lastname")));

    errors.finish(|| UserPatch {
        email,
        first_name,
        last_name,
    })
}

/// Validate the body of `POST /notes`
pub fn validate_create_note(request: CreateNoteRequest) -> ValidationResult<NewNote> {
    let mut errors = ValidationErrors::default();

    let title = errors
        .record(required(request.title.as_deref(), "title", "Title is not provided"))
        .and_then(|title| errors.record(validate_title(title)));
    let description = request
        .description
        .and_then(|d| errors.record(validate_description(d)));

    errors.finish(|| NewNote {
        title: title.unwrap_or_default(),
        description,
    })
}

/// Validate the body of `PATCH /notes/{id}`
pub fn validate_edit_note(request: EditNoteRequest) -> ValidationResult<NotePatch> {
    let mut errors = ValidationErrors::default();

    let title = request
        .title
        .and_then(|title| errors.record(validate_title(&title)));
    let description = request
        .description
        .and_then(|d| errors.record(validate_description(d)));

    errors.finish(|| NotePatch { title, description })
}

/// Validate a note id path segment
pub fn validate_note_id(raw: &str) -> Result<NoteId, ValidationError> {
    raw.parse::<NoteId>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| {
            ValidationError::InvalidNoteId("Validation failed (numeric string is expected)".to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth(email: Option<&str>, password: Option<&str>) -> AuthRequest {
        AuthRequest {
            email: email.map(str::to_string),
            password: password.map(str::to_string),
        }
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("test@example.com").is_ok());
        assert!(validate_email("user.name+tag@example.co.uk").is_ok());

        assert!(matches!(
            validate_email("test.example.com"),
            Err(ValidationError::InvalidEmail(_))
        ));
        assert!(matches!(validate_email("test@"), Err(ValidationError::InvalidEmail(_))));
        assert!(matches!(
            validate_email("test@example"),
            Err(ValidationError::InvalidEmail(_))
        ));

        let long = format!("{}@example.com", "a".repeat(250));
        assert!(matches!(validate_email(&long), Err(ValidationError::InvalidEmail(_))));
    }

    #[test]
    fn test_validate_auth_request() {
        let creds = validate_auth_request(auth(Some("foo@baz.com"), Some("foobaz"))).unwrap();
        assert_eq!(creds.email, "foo@baz.com");
        assert_eq!(creds.password, "foobaz");

        let errors = validate_auth_request(auth(None, Some("foobaz"))).unwrap_err();
        assert!(errors.has_field("email"));
        assert!(!errors.has_field("password"));
        assert_eq!(errors.iter().next().unwrap().message(), "Email is not provided");

        let errors = validate_auth_request(AuthRequest::default()).unwrap_err();
        assert!(errors.has_field("email"));
        assert!(errors.has_field("password"));

        let errors = validate_auth_request(auth(Some("not-an-email"), Some("x"))).unwrap_err();
        assert_eq!(errors.iter().next().unwrap().message(), "Email is not valid");

        let errors = validate_auth_request(auth(Some("foo@baz.com"), Some(""))).unwrap_err();
        assert!(errors.has_field("password"));

        // only the empty string counts as missing
        let creds = validate_auth_request(auth(Some("foo@baz.com"), Some("   "))).unwrap();
        assert_eq!(creds.password, "   ");
        let errors = validate_auth_request(auth(Some("   "), Some("foobaz"))).unwrap_err();
        assert_eq!(errors.iter().next().unwrap().message(), "Email is not valid");
    }

    #[test]
    fn test_password_length_counts_characters() {
        let at_limit = "é".repeat(MAX_PASSWORD_LENGTH);
        assert!(validate_auth_request(auth(Some("foo@baz.com"), Some(&at_limit))).is_ok());

        let over = "é".repeat(MAX_PASSWORD_LENGTH + 1);
        let errors = validate_auth_request(auth(Some("foo@baz.com"), Some(&over))).unwrap_err();
        assert!(errors.has_field("password"));
    }

    #[test]
    fn test_validate_edit_user() {
        let patch = validate_edit_user(EditUserRequest {
            email: Some("baz@foo.com".to_string()),
            firstname: Some("baz".to_string()),
            lastname: None,
        })
        .unwrap();
        assert_eq!(patch.email.as_deref(), Some("baz@foo.com"));
        assert_eq!(patch.first_name.as_deref(), Some("baz"));
        assert!(patch.last_name.is_none());

        assert_eq!(validate_edit_user(EditUserRequest::default()).unwrap(), UserPatch::default());

        let errors = validate_edit_user(EditUserRequest {
            email: Some("nope".to_string()),
            firstname: None,
            lastname: Some("x".repeat(101)),
        })
        .unwrap_err();
        assert!(errors.has_field("email"));
        assert!(errors.has_field("lastname"));
    }

    #[test]
    fn test_validate_create_note() {
        let note = validate_create_note(CreateNoteRequest {
            title: Some("foo note".to_string()),
            description: Some("baz note".to_string()),
        })
        .unwrap();
        assert_eq!(note.title, "foo note");
        assert_eq!(note.description.as_deref(), Some("baz note"));

        let errors = validate_create_note(CreateNoteRequest::default()).unwrap_err();
        assert!(errors.has_field("title"));

        let errors = validate_create_note(CreateNoteRequest {
            title: Some("   ".to_string()),
            description: None,
        })
        .unwrap_err();
        assert!(errors.has_field("title"));
    }

    #[test]
    fn test_validate_edit_note() {
        let patch = validate_edit_note(EditNoteRequest {
            title: None,
            description: Some("new".to_string()),
        })
        .unwrap();
        assert!(patch.title.is_none());
        assert_eq!(patch.description.as_deref(), Some("new"));

        let errors = validate_edit_note(EditNoteRequest {
            title: Some(String::new()),
            description: None,
        })
        .unwrap_err();
        assert!(errors.has_field("title"));
    }

    #[test]
    fn test_validate_note_id() {
        assert_eq!(validate_note_id("42").unwrap(), 42);
        assert!(matches!(validate_note_id("abc"), Err(ValidationError::InvalidNoteId(_))));
        assert!(matches!(validate_note_id("-1"), Err(ValidationError::InvalidNoteId(_))));
        assert!(matches!(validate_note_id("0"), Err(ValidationError::InvalidNoteId(_))));
    }

    #[test]
    fn test_parse_body() {
        let empty: AuthRequest = parse_body(b"").unwrap();
        assert!(empty.email.is_none());

        let parsed: AuthRequest = parse_body(br#"{"email":"foo@baz.com"}"#).unwrap();
        assert_eq!(parsed.email.as_deref(), Some("foo@baz.com"));

        let errors = parse_body::<AuthRequest>(b"{not json").unwrap_err();
        assert!(errors.has_field("body"));
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let creds = validate_auth_request(auth(Some("foo@baz.com"), Some("hunter2"))).unwrap();
        assert!(!format!("{creds:?}").contains("hunter2"));
    }
}
