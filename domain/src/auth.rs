use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::DomainError;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    #[default]
    Farmer,
    Buyer,
    Admin,
    #[serde(alias = "VET")]
    Veterinarian,
    Expert,
}

impl UserRole {
    pub const ALL: [UserRole; 5] = [
        UserRole::Farmer,
        UserRole::Buyer,
        UserRole::Admin,
        UserRole::Veterinarian,
        UserRole::Expert,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            UserRole::Farmer => "FARMER",
            UserRole::Buyer => "BUYER",
            UserRole::Admin => "ADMIN",
            UserRole::Veterinarian => "VETERINARIAN",
            UserRole::Expert => "EXPERT",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            UserRole::Farmer => "Farmer",
            UserRole::Buyer => "Buyer",
            UserRole::Admin => "Administrator",
            UserRole::Veterinarian => "Veterinarian",
            UserRole::Expert => "Poultry Expert",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "FARMER" => Ok(UserRole::Farmer),
            "BUYER" => Ok(UserRole::Buyer),
            "ADMIN" => Ok(UserRole::Admin),
            "VETERINARIAN" | "VET" => Ok(UserRole::Veterinarian),
            "EXPERT" => Ok(UserRole::Expert),
            other => Err(DomainError::UnknownRole(other.to_string())),
        }
    }
}

// Never hard-deleted; `is_active` carries the soft state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub display_name: String,
    pub phone_number: String,
    pub profile_image_url: Option<String>,
    pub role: UserRole,
    pub is_email_verified: bool,
    pub is_phone_verified: bool,
    pub is_active: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl User {
    pub fn new_profile(
        id: UserId,
        email: impl Into<String>,
        display_name: impl Into<String>,
        role: UserRole,
        now: OffsetDateTime,
    ) -> Self {
        Self {
            id,
            email: email.into(),
            display_name: display_name.into(),
            phone_number: String::new(),
            profile_image_url: None,
            role,
            is_email_verified: false,
            is_phone_verified: false,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[must_use]
    pub fn with_phone_number(mut self, phone_number: Option<String>) -> Self {
        self.phone_number = phone_number.unwrap_or_default();
        self
    }

    #[must_use]
    pub fn touched(mut self, now: OffsetDateTime) -> Self {
        self.updated_at = now;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthState {
    #[default]
    Loading,
    Unauthenticated,
    Authenticated(User),
    Error(String),
}

impl AuthState {
    pub fn from_user(user: Option<User>) -> Self {
        match user {
            Some(user) => AuthState::Authenticated(user),
            None => AuthState::Unauthenticated,
        }
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            AuthState::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            AuthState::Loading => "loading",
            AuthState::Unauthenticated => "unauthenticated",
            AuthState::Authenticated(_) => "authenticated",
            AuthState::Error(_) => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUpProfile {
    pub email: String,
    pub display_name: String,
    pub role: UserRole,
    pub phone_number: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parses_aliases_case_insensitively() {
        assert_eq!("vet".parse::<UserRole>().unwrap(), UserRole::Veterinarian);
        assert_eq!(" Buyer ".parse::<UserRole>().unwrap(), UserRole::Buyer);
        assert!("rooster".parse::<UserRole>().is_err());
    }

    #[test]
    fn role_serializes_upper_case() {
        let json = serde_json::to_string(&UserRole::Veterinarian).unwrap();
        assert_eq!(json, "\"VETERINARIAN\"");
        let role: UserRole = serde_json::from_str("\"VET\"").unwrap();
        assert_eq!(role, UserRole::Veterinarian);
    }

    #[test]
    fn auth_state_wraps_exactly_the_given_user() {
        let now = OffsetDateTime::UNIX_EPOCH;
        let user = User::new_profile(
            UserId::new("uid1"),
            "test@example.com",
            "Test User",
            UserRole::Farmer,
            now,
        );

        let state = AuthState::from_user(Some(user.clone()));
        assert!(state.is_authenticated());
        assert_eq!(state.user(), Some(&user));
        assert_eq!(AuthState::from_user(None), AuthState::Unauthenticated);
        assert_eq!(AuthState::default(), AuthState::Loading);
    }

    #[test]
    fn new_profile_is_active_and_unverified() {
        let now = OffsetDateTime::UNIX_EPOCH;
        let user = User::new_profile(UserId::new("u"), "a@b.c", "A", UserRole::Buyer, now)
            .with_phone_number(Some("+911234567890".to_string()));

        assert!(user.is_active);
        assert!(!user.is_email_verified);
        assert_eq!(user.phone_number, "+911234567890");
        assert_eq!(user.created_at, user.updated_at);
    }
}
