//! Sign-in form rules and where to send the user afterwards.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use tandem_model::UserProfile;

pub const MIN_PASSWORD_LEN: usize = 6;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*$",
    )
    .expect("email regex should compile")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginField {
    Email,
    Password,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldError {
    Required(LoginField),
    InvalidEmail,
    PasswordTooShort { min: usize },
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldError::Required(LoginField::Email) => {
                write!(f, "email is required")
            }
            FieldError::Required(LoginField::Password) => {
                write!(f, "password is required")
            }
            FieldError::InvalidEmail => write!(f, "email address is invalid"),
            FieldError::PasswordTooShort { min } => {
                write!(f, "password must be at least {min} characters")
            }
        }
    }
}

/// Credentials that passed form validation.
#[derive(Clone, PartialEq, Eq)]
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

#[derive(Default, Clone)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginForm")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

impl LoginForm {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Collect every field error, or hand back trimmed credentials.
    pub fn validate(&self) -> Result<Credentials, Vec<FieldError>> {
        let mut errors = Vec::new();
        let email = self.email.trim();

        if email.is_empty() {
            errors.push(FieldError::Required(LoginField::Email));
        } else if !EMAIL_RE.is_match(email) {
            errors.push(FieldError::InvalidEmail);
        }

        if self.password.is_empty() {
            errors.push(FieldError::Required(LoginField::Password));
        } else if self.password.chars().count() < MIN_PASSWORD_LEN {
            errors.push(FieldError::PasswordTooShort {
                min: MIN_PASSWORD_LEN,
            });
        }

        if errors.is_empty() {
            Ok(Credentials {
                email: email.to_string(),
                password: self.password.clone(),
            })
        } else {
            Err(errors)
        }
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Clear both fields after a submit attempt.
    pub fn reset(&mut self) {
        self.email.clear();
        self.password.clear();
    }
}

/// Message shown for an authentication provider error code.
pub fn auth_error_message(code: &str) -> &'static str {
    match code {
        "auth/user-not-found" => "Email address could not be found",
        "auth/wrong-password" => "Please enter a correct password",
        _ => "Could not sign you up, please try again.",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostLoginRoute {
    Home,
    SignupLanguages,
    SignupComplete,
}

impl PostLoginRoute {
    pub fn path(self) -> &'static str {
        match self {
            PostLoginRoute::Home => "/home",
            PostLoginRoute::SignupLanguages => "/login/signup/language",
            PostLoginRoute::SignupComplete => "/login/signup/complete",
        }
    }
}

impl fmt::Display for PostLoginRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Unfinished sign-ups resume where they stopped.
pub fn post_login_route(profile: &UserProfile) -> PostLoginRoute {
    if !profile.complete_profile {
        PostLoginRoute::SignupComplete
    } else if !profile.complete_languages {
        PostLoginRoute::SignupLanguages
    } else {
        PostLoginRoute::Home
    }
}
