//! Field-level validation shared by the HTML forms and the category CLI.
//!
//! Validators collect every failure instead of stopping at the first one so a
//! form can be re-rendered with all of its messages at once.

use std::collections::BTreeMap;

/// Allowed avatar file extensions (lowercase, without the dot).
pub const AVATAR_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Maximum avatar size in bytes (2 MiB).
pub const AVATAR_MAX_BYTES: usize = 2 * 1024 * 1024;

/// Maximum bio length in characters.
pub const BIO_MAX_CHARS: usize = 500;

/// Validation messages keyed by form field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    errors: BTreeMap<&'static str, Vec<String>>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message for `field`.
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.entry(field).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    /// Messages for one field (empty when the field is valid).
    pub fn get(&self, field: &str) -> &[String] {
        self.errors.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// First message for a field, joined for display next to the input.
    pub fn message(&self, field: &str) -> String {
        self.get(field).join(" ")
    }

    /// Merge another set of errors into this one.
    pub fn extend(&mut self, other: FieldErrors) {
        for (field, messages) in other.errors {
            self.errors.entry(field).or_default().extend(messages);
        }
    }

    /// `Ok(value)` when no error was recorded.
    pub fn into_result<T>(self, value: T) -> Result<T, FieldErrors> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|(field, messages)| format!("{}: {}", field, messages.join(" ")))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

/// Number of characters (not bytes) in `value`.
pub fn char_len(value: &str) -> usize {
    value.chars().count()
}

/// Check that `value` has between `min` and `max` characters.
pub fn check_length(
    errors: &mut FieldErrors,
    field: &'static str,
    label: &str,
    value: &str,
    min: usize,
    max: Option<usize>,
) {
    let len = char_len(value);
    if len < min {
        errors.add(
            field,
            format!("{} must be at least {} characters long.", label, min),
        );
    }
    if let Some(max) = max
        && len > max
    {
        errors.add(
            field,
            format!("{} must be at most {} characters long.", label, max),
        );
    }
}

/// Usernames: 1-150 characters of letters, digits and `@.+-_`.
pub fn validate_username(errors: &mut FieldErrors, username: &str) {
    if username.is_empty() {
        errors.add("username", "Username is required.");
        return;
    }
    if char_len(username) > 150 {
        errors.add("username", "Username must be at most 150 characters long.");
    }
    let valid = username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'));
    if !valid {
        errors.add(
            "username",
            "Enter a valid username. It may contain only letters, numbers and @/./+/-/_ characters.",
        );
    }
}

/// Minimal email syntax check: `local@domain.tld`.
pub fn is_valid_email(email: &str) -> bool {
    let mut parts = email.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    !local.is_empty()
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && domain.contains('.')
        && !email.chars().any(char::is_whitespace)
}

/// Passwords: at least 8 characters, not entirely numeric, confirmed.
pub fn validate_password(errors: &mut FieldErrors, password: &str, confirmation: &str) {
    if char_len(password) < 8 {
        errors.add(
            "password1",
            "This password is too short. It must contain at least 8 characters.",
        );
    }
    if !password.is_empty() && password.chars().all(|c| c.is_ascii_digit()) {
        errors.add("password1", "This password is entirely numeric.");
    }
    if password != confirmation {
        errors.add("password2", "The two password fields didn't match.");
    }
}

/// Category names: 3-100 characters.
pub fn validate_category_name(name: &str) -> Result<String, FieldErrors> {
    let name = name.trim();
    let mut errors = FieldErrors::new();
    check_length(&mut errors, "name", "Category name", name, 3, Some(100));
    errors.into_result(name.to_string())
}

/// Lowercase extension of `filename`, if any.
pub fn file_extension(filename: &str) -> Option<String> {
    std::path::Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

/// Image format of `data` from its leading magic bytes, as a canonical
/// extension.
pub fn sniff_image(data: &[u8]) -> Option<&'static str> {
    if data.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("png")
    } else if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("jpg")
    } else if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        Some("gif")
    } else if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
        Some("webp")
    } else {
        None
    }
}

/// Avatars must be one of [`AVATAR_EXTENSIONS`], at most
/// [`AVATAR_MAX_BYTES`], and their content must be an image of the format
/// the extension names.
///
/// `size` is the full upload size; `data` may be empty when it was too large
/// to buffer.
pub fn validate_avatar(filename: &str, data: &[u8], size: usize) -> Result<String, FieldErrors> {
    let mut errors = FieldErrors::new();
    let extension = file_extension(filename);
    match extension.as_deref() {
        Some(ext) if AVATAR_EXTENSIONS.contains(&ext) => {
            let expected = if ext == "jpeg" { "jpg" } else { ext };
            if size <= AVATAR_MAX_BYTES && sniff_image(data) != Some(expected) {
                errors.add("avatar", "The uploaded file is not a valid image.");
            }
        }
        _ => errors.add(
            "avatar",
            format!(
                "Unsupported image format. Allowed extensions: {}.",
                AVATAR_EXTENSIONS.join(", ")
            ),
        ),
    }
    if size > AVATAR_MAX_BYTES {
        errors.add("avatar", "The image must not exceed 2 MB.");
    }
    errors.into_result(extension.unwrap_or_default())
}
