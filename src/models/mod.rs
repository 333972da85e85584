//! Domain models for AirLibre.

pub mod activity;
pub mod category;
pub mod user;
pub mod validation;

// Re-export commonly used types
pub use activity::{
    ActivityEntry, ActivityFilter, ActivityForm, ActivityScope, ListActivitiesQuery, NewActivity,
    PAGE_SIZE, ReservationOutcome,
};
pub use category::Category;
pub use user::{
    LoginForm, NewUser, ProfileForm, ProfileUpdate, SessionClaims, SignupForm, User,
};
pub use validation::FieldErrors;

/// Pagination metadata for catalog pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
    pub total_pages: u64,
}

impl Pagination {
    /// Create pagination metadata.
    pub fn new(page: u64, per_page: u64, total: u64) -> Self {
        let total_pages = if total == 0 {
            0
        } else {
            total.div_ceil(per_page)
        };

        Pagination {
            page,
            per_page,
            total,
            total_pages,
        }
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}
