use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::validation::{check_password, normalize_country_code, normalize_email, normalize_username};

/// Body of `PUT /user/profile`. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

/// A checked profile update. A password change always carries the current
/// password it must be verified against.
#[derive(Debug, Default)]
pub struct ProfileUpdate {
    pub(crate) username: Option<String>,
    pub(crate) email: Option<String>,
    pub(crate) password: Option<PasswordChange>,
}

#[derive(Debug)]
pub struct PasswordChange {
    pub(crate) current: String,
    pub(crate) new: String,
}

impl UpdateProfileRequest {
    pub fn validate(self) -> AppResult<ProfileUpdate> {
        // Blank strings from the client form mean "unchanged".
        let username = self
            .username
            .filter(|s| !s.trim().is_empty())
            .map(|s| normalize_username(&s))
            .transpose()?;
        let email = self
            .email
            .filter(|s| !s.trim().is_empty())
            .map(|s| normalize_email(&s))
            .transpose()?;

        let password = match self.new_password.filter(|s| !s.is_empty()) {
            None => None,
            Some(new) => {
                check_password(&new)?;
                let current = self
                    .current_password
                    .filter(|s| !s.is_empty())
                    .ok_or(AppError::InvalidCredentials)?;
                Some(PasswordChange { current, new })
            }
        };

        Ok(ProfileUpdate {
            username,
            email,
            password,
        })
    }
}

/// Body of `POST /user/favorites`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddFavoriteRequest {
    pub country_code: String,
}

/// Uppercase three-letter country code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryCode(String);

impl CountryCode {
    pub fn parse(raw: &str) -> AppResult<Self> {
        normalize_country_code(raw).map(Self)
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl AddFavoriteRequest {
    pub fn validate(self) -> AppResult<CountryCode> {
        CountryCode::parse(&self.country_code)
    }
}
