use serde::{Deserialize, Serialize};
use std::fmt;

/// Substituted for a city the user left blank.
pub const CITY_NOT_INFORMED: &str = "City not informed";

/// Identifier of a user record, stable for the whole session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub city: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Company {
    #[serde(default)]
    pub name: String,
}

/// Represents a user record as held in the collection.
///
/// Decoded straight from the remote collection; fields the remote sends
/// that are not listed here are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub address: Address,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub company: Company,
}

impl User {
    /// Creates a user with only the required fields set.
    pub fn new(id: UserId, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
            address: Address::default(),
            phone: String::new(),
            website: String::new(),
            company: Company::default(),
        }
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.address.city = Some(city.into());
        self
    }

    /// The city, if one was actually informed.
    ///
    /// Blank values and the "not informed" sentinel both count as absent.
    pub fn informed_city(&self) -> Option<&str> {
        self.address
            .city
            .as_deref()
            .filter(|city| !city.trim().is_empty() && *city != CITY_NOT_INFORMED)
    }

    /// Builds the full record a write produces from a validated input.
    pub fn from_input(id: UserId, name: String, input: UserInput) -> Self {
        let city = resolve_city(input.city.as_deref());
        Self {
            phone: resolve_optional(input.phone),
            website: resolve_optional(input.website),
            company: Company {
                name: resolve_optional(input.company),
            },
            ..Self::new(id, name, input.email).with_city(city)
        }
    }
}

/// Normalized output of validation, ready to hand to a writer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserInput {
    /// Always present for creates. `None` on an update means "keep the name".
    pub name: Option<String>,
    pub email: String,
    pub city: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub company: Option<String>,
}

/// Resolves the stored city: absent or whitespace-only becomes the sentinel.
pub fn resolve_city(city: Option<&str>) -> String {
    match city {
        Some(city) if !city.trim().is_empty() => city.to_string(),
        _ => CITY_NOT_INFORMED.to_string(),
    }
}

/// Resolves a pass-through optional field to its stored form.
pub fn resolve_optional(value: Option<String>) -> String {
    value.unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_city_defaults_blank_values() {
        assert_eq!(resolve_city(None), CITY_NOT_INFORMED);
        assert_eq!(resolve_city(Some("   ")), CITY_NOT_INFORMED);
        assert_eq!(resolve_city(Some("Recife")), "Recife");
    }

    #[test]
    fn test_decode_remote_payload_ignores_extra_fields() {
        let json = r#"{
            "id": 1,
            "name": "Leanne Graham",
            "username": "Bret",
            "email": "Sincere@april.biz",
            "address": { "street": "Kulas Light", "city": "Gwenborough" },
            "phone": "1-770-736-8031 x56442",
            "website": "hildegard.org",
            "company": { "name": "Romaguera-Crona", "bs": "harness" }
        }"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.id, UserId(1));
        assert_eq!(user.informed_city(), Some("Gwenborough"));
        assert_eq!(user.company.name, "Romaguera-Crona");
    }

    #[test]
    fn test_decode_defaults_missing_optional_fields() {
        let user: User = serde_json::from_str(r#"{"id": 7, "name": "Ana", "email": "a@x.com"}"#).unwrap();
        assert_eq!(user.phone, "");
        assert_eq!(user.address.city, None);
        assert_eq!(user.informed_city(), None);
    }

    #[test]
    fn test_from_input_fills_defaults() {
        let input = UserInput {
            name: Some("Ana".into()),
            email: "a@x.com".into(),
            ..Default::default()
        };
        let user = User::from_input(UserId(3), "Ana".into(), input);
        assert_eq!(user.address.city.as_deref(), Some(CITY_NOT_INFORMED));
        assert_eq!(user.website, "");
        assert_eq!(user.company.name, "");
    }
}
