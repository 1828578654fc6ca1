use super::{validate, validate_field, Field, FieldErrors, Mode, UserDraft};
use crate::domain::{User, UserInput, CITY_NOT_INFORMED};

/// Live form state: every change re-validates the touched field so the
/// caller can reflect validity before submission.
#[derive(Debug, Clone)]
pub struct UserForm {
    mode: Mode,
    initial: UserDraft,
    values: UserDraft,
    errors: FieldErrors,
}

impl UserForm {
    pub fn for_create() -> Self {
        Self::new(Mode::Create, UserDraft::default())
    }

    /// Pre-fills name, email and city from an existing record.
    pub fn for_edit(user: &User) -> Self {
        let city = user
            .address
            .city
            .as_deref()
            .filter(|city| *city != CITY_NOT_INFORMED)
            .unwrap_or_default();
        let draft = UserDraft {
            name: user.name.clone(),
            email: user.email.clone(),
            city: city.to_string(),
            ..Default::default()
        };
        Self::new(Mode::Update, draft)
    }

    fn new(mode: Mode, initial: UserDraft) -> Self {
        let errors = match validate(mode, &initial) {
            Ok(_) => FieldErrors::default(),
            Err(errors) => errors,
        };
        Self {
            mode,
            values: initial.clone(),
            initial,
            errors,
        }
    }

    pub fn set_field(&mut self, field: Field, value: impl Into<String>) {
        let value = value.into();
        let message = validate_field(self.mode, field, &value);
        match field {
            Field::Name => self.values.name = value,
            Field::Email => self.values.email = value,
            Field::City => self.values.city = value,
        }
        self.errors.set(field, message);
    }

    pub fn values(&self) -> &UserDraft {
        &self.values
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn error(&self, field: Field) -> Option<&str> {
        self.errors.get(field)
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        self.values != self.initial
    }

    /// Full validation of the current values.
    pub fn submit(&mut self) -> Result<UserInput, FieldErrors> {
        let result = validate(self.mode, &self.values);
        self.errors = match &result {
            Ok(_) => FieldErrors::default(),
            Err(errors) => errors.clone(),
        };
        result
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.mode, self.initial.clone());
    }
}
