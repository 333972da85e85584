//! User models: accounts, registration/profile forms and session claims.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validation::{
    BIO_MAX_CHARS, FieldErrors, check_length, is_valid_email, validate_password,
    validate_username,
};

/// User stored in database.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    /// Path relative to the media directory.
    pub avatar: Option<String>,
    pub bio: Option<String>,
    pub is_staff: bool,
    pub date_joined: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl User {
    /// "First Last", falling back to the username.
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }

    /// Public URL of the avatar, if one was uploaded.
    pub fn avatar_url(&self) -> Option<String> {
        self.avatar.as_ref().map(|path| format!("/media/{}", path))
    }
}

impl From<crate::entity::user::Model> for User {
    fn from(m: crate::entity::user::Model) -> Self {
        Self {
            id: m.id,
            username: m.username,
            email: m.email,
            first_name: m.first_name,
            last_name: m.last_name,
            avatar: m.avatar,
            bio: m.bio,
            is_staff: m.is_staff,
            date_joined: m.date_joined,
            last_login: m.last_login,
        }
    }
}

/// Validated registration data, ready to be hashed and inserted.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

/// Registration form as posted by the signup page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
}

impl SignupForm {
    pub fn validate(&self) -> Result<NewUser, FieldErrors> {
        let mut errors = FieldErrors::new();

        let username = self.username.trim();
        validate_username(&mut errors, username);

        let email = self.email.trim();
        if email.is_empty() {
            errors.add("email", "Email address is required.");
        } else if !is_valid_email(email) {
            errors.add("email", "Enter a valid email address.");
        }

        let first_name = self.first_name.trim();
        let last_name = self.last_name.trim();
        check_length(&mut errors, "first_name", "First name", first_name, 0, Some(150));
        check_length(&mut errors, "last_name", "Last name", last_name, 0, Some(150));

        validate_password(&mut errors, &self.password1, &self.password2);

        errors.into_result(NewUser {
            username: username.to_string(),
            email: email.to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            password: self.password1.clone(),
        })
    }
}

/// Login form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// Where to go after a successful login.
    pub next: Option<String>,
}

/// Profile fields editable by the owner.
#[derive(Debug, Clone, Default)]
pub struct ProfileForm {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub bio: String,
    /// Remove the current avatar.
    pub clear_avatar: bool,
}

/// Validated profile update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub bio: Option<String>,
}

impl ProfileForm {
    pub fn from_user(user: &User) -> Self {
        Self {
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            bio: user.bio.clone().unwrap_or_default(),
            clear_avatar: false,
        }
    }

    pub fn validate(&self) -> Result<ProfileUpdate, FieldErrors> {
        let mut errors = FieldErrors::new();

        let email = self.email.trim();
        if !email.is_empty() && !is_valid_email(email) {
            errors.add("email", "Enter a valid email address.");
        }

        let first_name = self.first_name.trim();
        let last_name = self.last_name.trim();
        check_length(&mut errors, "first_name", "First name", first_name, 0, Some(150));
        check_length(&mut errors, "last_name", "Last name", last_name, 0, Some(150));

        let bio = self.bio.trim();
        if bio.chars().count() > BIO_MAX_CHARS {
            errors.add("bio", "The bio cannot exceed 500 characters.");
        }

        errors.into_result(ProfileUpdate {
            email: email.to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            bio: if bio.is_empty() {
                None
            } else {
                Some(bio.to_string())
            },
        })
    }
}

/// Session JWT claims.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub iss: String,
    pub exp: usize,
    pub iat: usize,
    pub user_id: i32,
    pub username: String,
}
