//! Field checks applied before anything reaches the store.

use once_cell::sync::Lazy;
use regex::Regex;

use super::domain::{
    ApplicantChanges, ApplicantPatch, ApplicantStatus, ApplicantSubmission, NewApplicant,
};

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_EMAIL_LEN: usize = 150;
pub const MAX_POSITION_LEN: usize = 100;

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email pattern compiles")
});

static PHONE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9\s()\-]{10,15}$").expect("phone pattern compiles"));

/// Reasons a create or update payload is rejected before any store access.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Name, email, and position are required")]
    MissingRequiredFields,
    #[error("Invalid email format")]
    InvalidEmail,
    #[error("Invalid phone number format")]
    InvalidPhone,
    #[error("Invalid status value")]
    InvalidStatus,
    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },
}

pub fn validate_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

/// Phone is optional, so the empty string is accepted.
pub fn validate_phone(phone: &str) -> bool {
    phone.is_empty() || PHONE_PATTERN.is_match(phone)
}

pub fn validate_status(status: &str) -> bool {
    ApplicantStatus::from_label(status).is_some()
}

pub fn sanitize(input: &str) -> String {
    input.trim().to_string()
}

fn sanitize_optional(input: Option<String>) -> Option<String> {
    input
        .map(|value| sanitize(&value))
        .filter(|value| !value.is_empty())
}

fn check_length(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(())
}

/// Sanitize and validate a create payload. Email is lower-cased so that
/// uniqueness is case-insensitive.
pub fn normalize_submission(
    submission: ApplicantSubmission,
) -> Result<NewApplicant, ValidationError> {
    let name = sanitize(&submission.name);
    let email = sanitize(&submission.email).to_lowercase();
    let position = sanitize(&submission.position);
    let phone = sanitize_optional(submission.phone);
    let notes = sanitize_optional(submission.notes);
    let resume = submission.resume.filter(|resume| !resume.trim().is_empty());

    if name.is_empty() || email.is_empty() || position.is_empty() {
        return Err(ValidationError::MissingRequiredFields);
    }

    check_length("name", &name, MAX_NAME_LEN)?;
    check_length("email", &email, MAX_EMAIL_LEN)?;
    check_length("position", &position, MAX_POSITION_LEN)?;

    if !validate_email(&email) {
        return Err(ValidationError::InvalidEmail);
    }

    if let Some(phone) = &phone {
        if !validate_phone(phone) {
            return Err(ValidationError::InvalidPhone);
        }
    }

    let status = match submission.status.as_deref().map(str::trim) {
        None | Some("") => ApplicantStatus::default(),
        Some(raw) => ApplicantStatus::from_label(raw).ok_or(ValidationError::InvalidStatus)?,
    };

    Ok(NewApplicant {
        name,
        email,
        position,
        status,
        phone,
        resume,
        notes,
    })
}

/// Convert an update payload into column changes.
///
/// Supplied fields are sanitized the same way as on create and email is
/// lower-cased. A value that is empty after trimming counts as "not supplied".
/// Only the status is checked against a fixed set, because the column is typed.
pub fn patch_changes(patch: ApplicantPatch) -> Result<ApplicantChanges, ValidationError> {
    let status = match sanitize_optional(patch.status) {
        Some(raw) => {
            Some(ApplicantStatus::from_label(&raw).ok_or(ValidationError::InvalidStatus)?)
        }
        None => None,
    };

    Ok(ApplicantChanges {
        name: sanitize_optional(patch.name),
        email: sanitize_optional(patch.email).map(|email| email.to_lowercase()),
        position: sanitize_optional(patch.position),
        status,
        phone: sanitize_optional(patch.phone),
        resume: patch.resume.filter(|resume| !resume.trim().is_empty()),
        notes: sanitize_optional(patch.notes),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission() -> ApplicantSubmission {
        ApplicantSubmission {
            name: "  John Smith ".to_string(),
            email: " John@Example.COM ".to_string(),
            position: "Backend Engineer".to_string(),
            status: None,
            phone: Some(" +1 555-123-4567 ".to_string()),
            resume: None,
            notes: Some("   ".to_string()),
        }
    }

    #[test]
    fn email_shapes() {
        assert!(validate_email("john@example.com"));
        assert!(validate_email("first.last+tag@sub.example.io"));
        assert!(!validate_email("not-an-email"));
        assert!(!validate_email("john@example"));
        assert!(!validate_email("john@example.c"));
        assert!(!validate_email("@example.com"));
    }

    #[test]
    fn phone_shapes() {
        assert!(validate_phone(""));
        assert!(validate_phone("+1234567890"));
        assert!(validate_phone("(555) 123-4567"));
        assert!(!validate_phone("abc"));
        assert!(!validate_phone("12345"));
        assert!(!validate_phone("+1 555 123 4567 8901"));
    }

    #[test]
    fn status_membership() {
        assert!(validate_status("hired"));
        assert!(validate_status("pending"));
        assert!(!validate_status("ghosted"));
        assert!(!validate_status("HIRED"));
    }

    #[test]
    fn sanitize_trims_whitespace() {
        assert_eq!(sanitize("  padded\t\n"), "padded");
        assert_eq!(sanitize(""), "");
    }

    #[test]
    fn normalize_trims_and_lowercases() {
        let applicant = normalize_submission(submission()).expect("valid submission");
        assert_eq!(applicant.name, "John Smith");
        assert_eq!(applicant.email, "john@example.com");
        assert_eq!(applicant.phone.as_deref(), Some("+1 555-123-4567"));
        assert_eq!(applicant.notes, None);
        assert_eq!(applicant.status, ApplicantStatus::Pending);
    }

    #[test]
    fn normalize_requires_core_fields() {
        let mut missing = submission();
        missing.position = "   ".to_string();
        assert_eq!(
            normalize_submission(missing),
            Err(ValidationError::MissingRequiredFields)
        );
    }

    #[test]
    fn normalize_rejects_bad_fields_in_order() {
        let mut bad_email = submission();
        bad_email.email = "nope".to_string();
        bad_email.phone = Some("abc".to_string());
        assert_eq!(
            normalize_submission(bad_email),
            Err(ValidationError::InvalidEmail)
        );

        let mut bad_phone = submission();
        bad_phone.phone = Some("abc".to_string());
        assert_eq!(
            normalize_submission(bad_phone),
            Err(ValidationError::InvalidPhone)
        );

        let mut bad_status = submission();
        bad_status.status = Some("ghosted".to_string());
        assert_eq!(
            normalize_submission(bad_status),
            Err(ValidationError::InvalidStatus)
        );

        let mut long_name = submission();
        long_name.name = "x".repeat(MAX_NAME_LEN + 1);
        assert_eq!(
            normalize_submission(long_name),
            Err(ValidationError::TooLong {
                field: "name",
                max: MAX_NAME_LEN
            })
        );
    }

    #[test]
    fn patch_only_checks_status() {
        let changes = patch_changes(ApplicantPatch {
            email: Some("Not An Email".to_string()),
            notes: Some(String::new()),
            status: Some("reviewed".to_string()),
            ..ApplicantPatch::default()
        })
        .expect("patch accepted");

        assert_eq!(changes.email.as_deref(), Some("not an email"));
        assert_eq!(changes.notes, None);
        assert_eq!(changes.status, Some(ApplicantStatus::Reviewed));

        let rejected = patch_changes(ApplicantPatch {
            status: Some("ghosted".to_string()),
            ..ApplicantPatch::default()
        });
        assert_eq!(rejected, Err(ValidationError::InvalidStatus));
    }

    #[test]
    fn patch_sanitizes_supplied_fields() {
        let changes = patch_changes(ApplicantPatch {
            name: Some("   ".to_string()),
            email: Some(" JANE@Example.COM ".to_string()),
            position: Some("  Staff Engineer ".to_string()),
            phone: Some("\t".to_string()),
            status: Some(" hired ".to_string()),
            ..ApplicantPatch::default()
        })
        .expect("patch accepted");

        assert_eq!(changes.name, None);
        assert_eq!(changes.email.as_deref(), Some("jane@example.com"));
        assert_eq!(changes.position.as_deref(), Some("Staff Engineer"));
        assert_eq!(changes.phone, None);
        assert_eq!(changes.status, Some(ApplicantStatus::Hired));
    }
}
