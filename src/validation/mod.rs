//! Field rules for user-entered data.
//!
//! Two modes share the email and city rules: [`Mode::Create`] requires a
//! name, [`Mode::Update`] treats a blank name as "keep the current one".
//! Invalid input is reported as [`FieldErrors`], never as a panic.

mod form;

pub use form::*;

use crate::domain::UserInput;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;

pub const NAME_CHARS_MIN: usize = 2;
pub const NAME_CHARS_MAX: usize = 50;

static NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z\x{00C0}-\x{00FF}\s]+$").expect("valid name pattern"));

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[a-z0-9_'+\-.]*[a-z0-9_+\-]@([a-z0-9][a-z0-9\-]*\.)+[a-z]{2,}$")
        .expect("valid email pattern")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Create,
    Update,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Name,
    Email,
    City,
}

impl Field {
    pub const ALL: [Field; 3] = [Field::Name, Field::Email, Field::City];
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Name => write!(f, "name"),
            Field::Email => write!(f, "email"),
            Field::City => write!(f, "city"),
        }
    }
}

/// Raw field values as typed by the user.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserDraft {
    pub name: String,
    pub email: String,
    pub city: String,
    pub phone: String,
    pub website: String,
    pub company: String,
}

impl UserDraft {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            ..Default::default()
        }
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = city.into();
        self
    }

    pub fn value(&self, field: Field) -> &str {
        match field {
            Field::Name => &self.name,
            Field::Email => &self.email,
            Field::City => &self.city,
        }
    }
}

/// The first failing message of each invalid field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldErrors {
    errors: BTreeMap<Field, String>,
}

impl FieldErrors {
    pub fn get(&self, field: Field) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.errors.iter().map(|(field, msg)| (*field, msg.as_str()))
    }

    fn set(&mut self, field: Field, message: Option<String>) {
        match message {
            Some(message) => {
                self.errors.insert(field, message);
            }
            None => {
                self.errors.remove(&field);
            }
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.iter().map(|(field, msg)| format!("{}: {}", field, msg)).collect();
        write!(f, "Invalid input ({})", parts.join("; "))
    }
}

impl std::error::Error for FieldErrors {}

/// Checks a single field, returning its error message if any.
pub fn validate_field(mode: Mode, field: Field, value: &str) -> Option<String> {
    match field {
        Field::Name => match mode {
            Mode::Update if value.trim().is_empty() => None,
            Mode::Create if value.trim().is_empty() => Some("Name is required".to_string()),
            _ => check_name(value),
        },
        Field::Email => check_email(value),
        // optional, blank means absent
        Field::City => None,
    }
}

/// Validates a whole draft and normalizes it into a [`UserInput`].
pub fn validate(mode: Mode, draft: &UserDraft) -> Result<UserInput, FieldErrors> {
    let mut errors = FieldErrors::default();
    for field in Field::ALL {
        errors.set(field, validate_field(mode, field, draft.value(field)));
    }
    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(UserInput {
        name: non_blank(&draft.name),
        email: draft.email.clone(),
        city: non_blank(&draft.city),
        phone: non_blank(&draft.phone),
        website: non_blank(&draft.website),
        company: non_blank(&draft.company),
    })
}

fn check_name(name: &str) -> Option<String> {
    let chars = name.chars().count();
    if chars < NAME_CHARS_MIN {
        Some(format!("Name must be at least {} characters", NAME_CHARS_MIN))
    } else if chars > NAME_CHARS_MAX {
        Some(format!("Name must be at most {} characters", NAME_CHARS_MAX))
    } else if !NAME_PATTERN.is_match(name) {
        Some("Name must contain only letters and spaces".to_string())
    } else {
        None
    }
}

fn check_email(email: &str) -> Option<String> {
    if email.is_empty() {
        Some("Email is required".to_string())
    } else if !is_email(email) {
        Some("Email must be a valid format".to_string())
    } else {
        None
    }
}

pub fn is_email(email: &str) -> bool {
    !email.starts_with('.') && !email.contains("..") && EMAIL_PATTERN.is_match(email)
}

fn non_blank(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
