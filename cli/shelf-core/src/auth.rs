//! Credential checks for the local session.
//!
//! There is no account authority behind shelf.
//! Every credential check goes through [CredentialVerifier],
//! and the only implementation, [UncheckedVerifier], accepts any non-empty
//! username and password.
//! Keep it that way: a real verifier replaces [UncheckedVerifier],
//! the session store does not grow its own checks.

use crate::session::SessionError;

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Clone, Copy)]
pub struct Credentials<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

impl std::fmt::Debug for Credentials<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, credentials: Credentials<'_>) -> Result<(), SessionError>;
}

/// Accepts every non-empty username and password.
///
/// Passwords are neither checked nor stored.
#[derive(Debug, Clone, Copy, Default)]
pub struct UncheckedVerifier;

impl CredentialVerifier for UncheckedVerifier {
    fn verify(&self, credentials: Credentials<'_>) -> Result<(), SessionError> {
        if credentials.username.trim().is_empty() || credentials.password.is_empty() {
            return Err(SessionError::EmptyFields);
        }
        Ok(())
    }
}

/// Data entered in the registration form.
#[derive(Clone, Default)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub username: String,
    pub password: String,
    pub confirm_password: String,
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl Registration {
    /// Check the form in the order errors are reported to the user:
    /// missing fields, then mismatching passwords, then password length.
    pub fn validate(&self) -> Result<(), SessionError> {
        let fields = [
            self.name.trim(),
            self.email.trim(),
            self.username.trim(),
            self.password.as_str(),
            self.confirm_password.as_str(),
        ];
        if fields.iter().any(|field| field.is_empty()) {
            return Err(SessionError::EmptyFields);
        }

        if self.password != self.confirm_password {
            return Err(SessionError::PasswordMismatch);
        }

        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(SessionError::PasswordTooShort);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration(password: &str, confirm_password: &str) -> Registration {
        Registration {
            name: "Alice Liddell".to_string(),
            email: "alice@example.com".to_string(),
            username: "alice".to_string(),
            password: password.to_string(),
            confirm_password: confirm_password.to_string(),
        }
    }

    #[test]
    fn unchecked_verifier_accepts_any_non_empty_pair() {
        let verifier = UncheckedVerifier;
        assert!(
            verifier
                .verify(Credentials {
                    username: "alice",
                    password: "x",
                })
                .is_ok()
        );
    }

    #[test]
    fn unchecked_verifier_rejects_blank_fields() {
        let verifier = UncheckedVerifier;
        let result = verifier.verify(Credentials {
            username: "   ",
            password: "x",
        });
        assert!(matches!(result, Err(SessionError::EmptyFields)));

        let result = verifier.verify(Credentials {
            username: "alice",
            password: "",
        });
        assert!(matches!(result, Err(SessionError::EmptyFields)));
    }

    #[test]
    fn short_password_is_rejected() {
        let result = registration("abc", "abc").validate();
        assert!(matches!(result, Err(SessionError::PasswordTooShort)));
    }

    #[test]
    fn six_character_password_is_accepted() {
        assert!(registration("abcdef", "abcdef").validate().is_ok());
    }

    #[test]
    fn mismatch_is_reported_before_length() {
        let result = registration("abc", "abd").validate();
        assert!(matches!(result, Err(SessionError::PasswordMismatch)));
    }

    #[test]
    fn empty_field_is_reported_first() {
        let result = Registration {
            email: " ".to_string(),
            ..registration("abc", "abd")
        }
        .validate();
        assert!(matches!(result, Err(SessionError::EmptyFields)));
    }

    #[test]
    fn debug_output_omits_passwords() {
        let debug = format!("{:?}", registration("secret1", "secret1"));
        assert!(!debug.contains("secret1"), "{debug}");
    }
}
