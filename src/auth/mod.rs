//! Session authentication for the HTML pages.

mod extractor;

pub use extractor::{AuthError, MaybeUser, SessionUser, login_redirect};
