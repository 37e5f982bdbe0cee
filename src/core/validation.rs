//! Input validation shared by the core and the HTTP layer.
//!
//! Everything here runs before storage is touched, so a rejected request never
//! leaves partial state behind.

use crate::errors::{Error, Result};

/// Longest accepted nightline name.
pub const MAX_NIGHTLINE_NAME_LEN: usize = 50;
/// Longest accepted status name.
pub const MAX_STATUS_NAME_LEN: usize = 20;
/// Longest accepted status description.
pub const MAX_DESCRIPTION_LEN: usize = 200;
/// Longest accepted external account username.
pub const MAX_USERNAME_LEN: usize = 50;
/// Longest accepted external account password.
pub const MAX_PASSWORD_LEN: usize = 100;

// Collide with static routes (`/public/all`, `/admin/nightline/all`)
const RESERVED_NIGHTLINE_NAMES: [&str; 1] = ["all"];

/// Language filter for nightline listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    /// German
    De,
    /// English
    En,
}

impl Language {
    /// Status names under which a nightline is reachable in this language.
    #[must_use]
    pub const fn status_names(self) -> [&'static str; 2] {
        match self {
            Self::De => ["german", "german-english"],
            Self::En => ["english", "german-english"],
        }
    }
}

impl std::str::FromStr for Language {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "de" => Ok(Self::De),
            "en" => Ok(Self::En),
            _ => Err(Error::validation(
                "Invalid value for language filter. Only 'en' or 'de' are allowed",
            )),
        }
    }
}

/// Trims and lowercases a nightline name, then checks it.
///
/// Names are 1 to 50 ASCII alphanumeric characters.
pub fn normalize_nightline_name(raw: &str) -> Result<String> {
    let name = raw.trim().to_lowercase();
    if name.is_empty() || name.len() > MAX_NIGHTLINE_NAME_LEN {
        return Err(Error::validation(format!(
            "Nightline name must be 1 to {MAX_NIGHTLINE_NAME_LEN} characters long"
        )));
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(Error::validation("Invalid name format"));
    }
    if RESERVED_NIGHTLINE_NAMES.contains(&name.as_str()) {
        return Err(Error::validation(format!("'{name}' is a reserved name")));
    }
    Ok(name)
}

/// Checks a status name: 1 to 20 characters of lowercase ASCII letters, digits or `-`.
pub fn validate_status_name(name: &str) -> Result<()> {
    if name.is_empty() || name.len() > MAX_STATUS_NAME_LEN {
        return Err(Error::validation(
            "'status' must be a non-empty valid status name",
        ));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(Error::validation(format!("Invalid status name '{name}'")));
    }
    Ok(())
}

/// Checks that a description is present and not longer than 200 characters.
pub fn validate_description(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::validation(format!("'{field}' must not be empty")));
    }
    if value.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(Error::validation(format!(
            "'{field}' must be at most {MAX_DESCRIPTION_LEN} characters"
        )));
    }
    Ok(())
}

/// Checks external account credentials before they are stored.
pub fn validate_instagram_credentials(username: &str, password: &str) -> Result<()> {
    validate_instagram_username(username)?;
    validate_instagram_password(password)
}

/// Checks an external account username.
pub fn validate_instagram_username(username: &str) -> Result<()> {
    if username.trim().is_empty() || username.len() > MAX_USERNAME_LEN {
        return Err(Error::validation("Invalid 'username' in request"));
    }
    Ok(())
}

/// Checks an external account password.
pub fn validate_instagram_password(password: &str) -> Result<()> {
    if password.is_empty() || password.len() > MAX_PASSWORD_LEN {
        return Err(Error::validation("Invalid 'password' in request"));
    }
    Ok(())
}

/// Parses the `now` listing filter.
pub fn parse_now_filter(value: &str) -> Result<bool> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(Error::validation(
            "Invalid value for 'now' filter. Use 'true' or 'false'",
        )),
    }
}
