//! Field-level validation of creation inputs.
//!
//! Each `validate` collects every failing field so clients can show them all
//! at once.

use crate::error::{BookingError, FieldError, Result};
use crate::types::{NewDealer, NewEvent, NewMotorcycle, NewSession, Role, User, UserId};

/// Upper bound on a session's capacity.
pub const MAX_SESSION_SLOTS: u32 = 50;

fn finish(errors: Vec<FieldError>) -> Result<()> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(BookingError::Validation(errors))
    }
}

fn require(errors: &mut Vec<FieldError>, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.push(FieldError::new(field, "must not be empty"));
    }
}

/// Lowercase and trim an email, rejecting obviously malformed ones.
///
/// # Errors
///
/// `Validation` on the `email` field.
pub fn normalize_email(email: &str) -> Result<String> {
    let email = email.trim().to_lowercase();
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        })
        && !email.contains(char::is_whitespace);

    if valid {
        Ok(email)
    } else {
        Err(BookingError::invalid("email", "must be a valid email address"))
    }
}

impl NewDealer {
    /// # Errors
    ///
    /// `Validation` listing every invalid field.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();
        require(&mut errors, "name", &self.name);
        require(&mut errors, "city", &self.city);
        finish(errors)
    }
}

impl NewEvent {
    /// # Errors
    ///
    /// `Validation` listing every invalid field.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();
        require(&mut errors, "name", &self.name);
        require(&mut errors, "location", &self.location);
        if self.ends_at < self.starts_at {
            errors.push(FieldError::new("ends_at", "must not be before starts_at"));
        }
        finish(errors)
    }
}

impl NewSession {
    /// # Errors
    ///
    /// `Validation` listing every invalid field.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();
        require(&mut errors, "group_tag", &self.group_tag);
        if self.ends_at <= self.starts_at {
            errors.push(FieldError::new("ends_at", "must be after starts_at"));
        }
        if self.available_slots == 0 || self.available_slots > MAX_SESSION_SLOTS {
            errors.push(FieldError::new(
                "available_slots",
                format!("must be between 1 and {MAX_SESSION_SLOTS}"),
            ));
        }
        finish(errors)
    }
}

impl NewMotorcycle {
    /// # Errors
    ///
    /// `Validation` listing every invalid field.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();
        require(&mut errors, "model", &self.model);
        require(&mut errors, "group_tag", &self.group_tag);
        finish(errors)
    }
}

/// Check that `candidate`, looked up by `id`, may lead a session.
///
/// Only INSTRUCTOR and ADMIN accounts can be assigned.
///
/// # Errors
///
/// `NotFound` when the account does not exist, `Validation` on
/// `instructor_id` when its role cannot lead rides.
pub fn ensure_instructor(id: UserId, candidate: Option<&User>) -> Result<()> {
    match candidate {
        None => Err(BookingError::not_found("User", id)),
        Some(user) if matches!(user.role, Role::Instructor | Role::Admin) => Ok(()),
        Some(_) => Err(BookingError::invalid(
            "instructor_id",
            "must reference an instructor or administrator",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EventId;
    use chrono::{Duration, Utc};

    fn account(role: Role) -> User {
        User {
            id: UserId::new(),
            email: "coach@example.com".into(),
            first_name: "Test".into(),
            last_name: "Coach".into(),
            phone: None,
            role,
            license: None,
            password_hash: String::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn emails_are_normalized() {
        assert_eq!(
            normalize_email("  Rider@Example.COM ").ok().as_deref(),
            Some("rider@example.com")
        );
        assert!(normalize_email("rider@localhost").is_err());
        assert!(normalize_email("@example.com").is_err());
        assert!(normalize_email("ri der@example.com").is_err());
    }

    #[test]
    fn session_collects_all_field_errors() {
        let now = Utc::now();
        let session = NewSession {
            event_id: EventId::new(),
            starts_at: now,
            ends_at: now - Duration::minutes(30),
            group_tag: " ".into(),
            available_slots: 0,
            instructor_id: None,
        };

        let Err(BookingError::Validation(fields)) = session.validate() else {
            unreachable!("invalid session accepted");
        };
        let names: Vec<_> = fields.iter().map(|f| f.field.as_str()).collect();
        assert_eq!(names, vec!["group_tag", "ends_at", "available_slots"]);
    }

    #[test]
    fn valid_session_passes() {
        let now = Utc::now();
        let session = NewSession {
            event_id: EventId::new(),
            starts_at: now,
            ends_at: now + Duration::minutes(45),
            group_tag: "roadster".into(),
            available_slots: 8,
            instructor_id: None,
        };
        assert!(session.validate().is_ok());
    }

    #[test]
    fn instructors_and_admins_may_lead() {
        for role in [Role::Instructor, Role::Admin] {
            let user = account(role);
            assert!(ensure_instructor(user.id, Some(&user)).is_ok());
        }
    }

    #[test]
    fn other_roles_cannot_lead() {
        for role in [Role::Client, Role::Dealer] {
            let user = account(role);
            let Err(BookingError::Validation(fields)) = ensure_instructor(user.id, Some(&user)) else {
                unreachable!("{role:?} accepted as instructor");
            };
            assert_eq!(fields[0].field, "instructor_id");
        }
    }

    #[test]
    fn missing_instructor_is_not_found() {
        let id = UserId::new();
        assert!(matches!(
            ensure_instructor(id, None),
            Err(BookingError::NotFound { resource: "User", .. })
        ));
    }
}
