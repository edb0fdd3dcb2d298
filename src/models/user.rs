// User account model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::Id;

/// Role of a user inside their company
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    CompanyAdmin,
    Dispatcher,
    Mechanic,
    Driver,
    Accountant,
    Guest,
}

impl UserRole {
    pub const ALL: [UserRole; 6] = [
        UserRole::CompanyAdmin,
        UserRole::Dispatcher,
        UserRole::Mechanic,
        UserRole::Driver,
        UserRole::Accountant,
        UserRole::Guest,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::CompanyAdmin => "COMPANY_ADMIN",
            UserRole::Dispatcher => "DISPATCHER",
            UserRole::Mechanic => "MECHANIC",
            UserRole::Driver => "DRIVER",
            UserRole::Accountant => "ACCOUNTANT",
            UserRole::Guest => "GUEST",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase().replace('-', "_");
        UserRole::ALL
            .into_iter()
            .find(|role| role.as_str() == normalized)
            .ok_or_else(|| format!("unknown role: {}", s))
    }
}

/// Interface language of a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Ru,
    En,
    Ky,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Ru => "ru",
            Language::En => "en",
            Language::Ky => "ky",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ru" => Ok(Language::Ru),
            "en" => Ok(Language::En),
            "ky" => Ok(Language::Ky),
            other => Err(format!("unknown language: {}", other)),
        }
    }
}

/// Authenticated user profile as returned by `auth/me/`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Id,
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    pub role: UserRole,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub language: Language,
    #[serde(default)]
    pub company: Option<Id>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl User {
    /// Full name, falling back to the username when no name is set
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

/// Partial update of the current user's own profile
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MeUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
}

/// Payload for creating a user (company admins only)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserCreate {
    pub username: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub role: UserRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    pub language: Language,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

/// Partial update of another user
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}
