use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::users::repo_types::User;
use crate::validation::{check_password, normalize_email, normalize_username};

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// A registration that passed validation; email and username are normalized.
#[derive(Debug)]
pub struct Registration {
    pub(crate) username: String,
    pub(crate) email: String,
    pub(crate) password: String,
}

impl RegisterRequest {
    pub fn validate(self) -> AppResult<Registration> {
        let username = normalize_username(&self.username)?;
        let email = normalize_email(&self.email)?;
        check_password(&self.password)?;
        Ok(Registration {
            username,
            email,
            password: self.password,
        })
    }
}

/// Request body for login. The identifier may be an email or a username.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(alias = "email", alias = "username", alias = "emailOrUsername")]
    pub login: String,
    pub password: String,
}

#[derive(Debug)]
pub struct Credentials {
    pub(crate) login: String,
    pub(crate) password: String,
}

impl LoginRequest {
    pub fn validate(self) -> AppResult<Credentials> {
        let login = self.login.trim();
        if login.is_empty() {
            return Err(AppError::validation("Email or username is required"));
        }
        if self.password.is_empty() {
            return Err(AppError::validation("Password is required"));
        }
        let login = if login.contains('@') {
            login.to_lowercase()
        } else {
            login.to_string()
        };
        Ok(Credentials {
            login,
            password: self.password,
        })
    }
}

/// Response returned after login or register.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: PublicUser,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub favorite_countries: Vec<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            favorite_countries: u.favorite_countries,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_request_normalizes() {
        let reg = RegisterRequest {
            username: " alice ".into(),
            email: " A@X.com".into(),
            password: "Secret123".into(),
        }
        .validate()
        .unwrap();
        assert_eq!(reg.username, "alice");
        assert_eq!(reg.email, "a@x.com");
    }

    #[test]
    fn register_request_rejects_empty_password() {
        let err = RegisterRequest {
            username: "alice".into(),
            email: "a@x.com".into(),
            password: "".into(),
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn login_request_accepts_email_alias() {
        let req: LoginRequest =
            serde_json::from_str(r#"{"email":"A@X.com","password":"Secret123"}"#).unwrap();
        let creds = req.validate().unwrap();
        assert_eq!(creds.login, "a@x.com");

        let req: LoginRequest =
            serde_json::from_str(r#"{"username":"Alice","password":"Secret123"}"#).unwrap();
        assert_eq!(req.validate().unwrap().login, "Alice");
    }

    #[test]
    fn public_user_uses_camel_case_and_has_no_hash() {
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            username: "alice".into(),
            email: "a@x.com".into(),
            password_hash: "$argon2id$secret".into(),
            favorite_countries: vec!["FRA".into()],
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_string(&PublicUser::from(user)).unwrap();
        assert!(json.contains("favoriteCountries"));
        assert!(json.contains("FRA"));
        assert!(!json.contains("argon2"));
    }
}
