//! Activity models: creation form, validation and catalog filters.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;

use super::category::Category;
use super::user::User;
use super::validation::{FieldErrors, check_length};

/// Activities shown per catalog page.
pub const PAGE_SIZE: u64 = 20;

/// Accepted formats for `datetime-local` inputs. Values are read as UTC.
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Activity creation form as posted by the browser.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActivityForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location_city: String,
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub end_time: String,
    /// Category id, empty for "no category".
    #[serde(default)]
    pub category: String,
}

/// Validated activity, ready to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewActivity {
    pub title: String,
    pub description: String,
    pub location_city: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub category_id: Option<i32>,
}

impl ActivityForm {
    /// Validate every field against the activity rules.
    ///
    /// `now` is the reference instant for the "start in the future" rule.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<NewActivity, FieldErrors> {
        let mut errors = FieldErrors::new();

        let title = self.title.trim();
        check_length(&mut errors, "title", "The title", title, 5, Some(200));

        let description = self.description.trim();
        check_length(
            &mut errors,
            "description",
            "The description",
            description,
            10,
            None,
        );

        let location_city = self.location_city.trim();
        check_length(
            &mut errors,
            "location_city",
            "The city",
            location_city,
            2,
            Some(100),
        );

        let start_time = parse_datetime(&self.start_time);
        if start_time.is_none() {
            errors.add("start_time", "Enter a valid start date and time.");
        }
        let end_time = parse_datetime(&self.end_time);
        if end_time.is_none() {
            errors.add("end_time", "Enter a valid end date and time.");
        }

        let category_id = match self.category.trim() {
            "" => None,
            raw => match raw.parse::<i32>() {
                Ok(id) => Some(id),
                Err(_) => {
                    errors.add("category", "Select a valid category.");
                    None
                }
            },
        };

        let (Some(start_time), Some(end_time)) = (start_time, end_time) else {
            return Err(errors);
        };

        let activity = NewActivity {
            title: title.to_string(),
            description: description.to_string(),
            location_city: location_city.to_string(),
            start_time,
            end_time,
            category_id,
        };
        errors.extend(activity.check_schedule(now));

        errors.into_result(activity)
    }
}

impl NewActivity {
    /// The activity must end after it starts. Enforced on every insert.
    pub fn check_window(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if self.end_time <= self.start_time {
            errors.add("end_time", "The end time must be after the start time.");
        }
        errors
    }

    /// Form-level schedule rules: a valid window that starts in the future.
    pub fn check_schedule(&self, now: DateTime<Utc>) -> FieldErrors {
        let mut errors = self.check_window();
        if self.start_time < now {
            errors.add("start_time", "The start time must be in the future.");
        }
        errors
    }
}

/// Activity joined with its proposer, category and attendance count.
#[derive(Debug, Clone)]
pub struct ActivityEntry {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub location_city: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub proposer: User,
    pub category: Option<Category>,
    pub attendee_count: usize,
}

impl ActivityEntry {
    pub fn new(
        m: crate::entity::activity::Model,
        proposer: User,
        category: Option<Category>,
        attendee_count: usize,
    ) -> Self {
        Self {
            id: m.id,
            title: m.title,
            description: m.description,
            location_city: m.location_city,
            start_time: m.start_time,
            end_time: m.end_time,
            created_at: m.created_at,
            proposer,
            category,
            attendee_count,
        }
    }

    /// Reservations close once the activity has started.
    pub fn has_started(&self, now: DateTime<Utc>) -> bool {
        self.start_time <= now
    }
}

/// Result of a reservation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservationOutcome {
    Reserved,
    AlreadyReserved,
    /// The activity has already started.
    Closed,
}

impl ReservationOutcome {
    /// Notice key shown on the detail page after the redirect.
    pub fn notice(&self) -> &'static str {
        match self {
            Self::Reserved => "reserved",
            Self::AlreadyReserved => "already_reserved",
            Self::Closed => "closed",
        }
    }
}

/// Parse a `datetime-local` value (or RFC 3339) as a UTC instant.
pub fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Which activities of the current user to restrict the catalog to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityScope {
    /// Activities the user proposed.
    Proposed,
    /// Activities the user reserved.
    Attending,
}

impl ActivityScope {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "proposed" => Some(Self::Proposed),
            "attending" => Some(Self::Attending),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Proposed => "proposed",
            Self::Attending => "attending",
        }
    }
}

/// Catalog querystring.
#[derive(Debug, Clone, Default)]
pub struct ListActivitiesQuery {
    pub city: Option<String>,
    pub category: Option<String>,
    pub q: Option<String>,
    pub scope: Option<String>,
    pub past: Option<String>,
    pub page: Option<String>,
}

/// Filters applied to the activity catalog query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityFilter {
    pub city: Option<String>,
    pub category_id: Option<i32>,
    pub search: Option<String>,
    /// Scope and the user it applies to.
    pub scope: Option<(ActivityScope, i32)>,
    /// Only activities starting at or after this instant.
    pub starts_after: Option<DateTime<Utc>>,
    pub page: u64,
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl ListActivitiesQuery {
    /// Collect decoded querystring pairs. The first occurrence of a key wins
    /// and unknown keys are dropped.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut query = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "city" => &mut query.city,
                "category" => &mut query.category,
                "q" => &mut query.q,
                "scope" => &mut query.scope,
                "past" => &mut query.past,
                "page" => &mut query.page,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        query
    }

    /// Build the catalog filter. Scopes only apply to authenticated users;
    /// unknown or malformed values are ignored.
    pub fn to_filter(&self, user_id: Option<i32>, now: DateTime<Utc>) -> ActivityFilter {
        let scope = match (self.scope.as_deref().and_then(ActivityScope::parse), user_id) {
            (Some(scope), Some(id)) => Some((scope, id)),
            _ => None,
        };
        let include_past = matches!(self.past.as_deref(), Some("1") | Some("true") | Some("on"));

        ActivityFilter {
            city: non_empty(&self.city),
            category_id: non_empty(&self.category).and_then(|c| c.parse().ok()),
            search: non_empty(&self.q),
            scope,
            starts_after: if include_past { None } else { Some(now) },
            page: self
                .page
                .as_deref()
                .and_then(|p| p.trim().parse::<u64>().ok())
                .unwrap_or(1)
                .max(1),
        }
    }
}

impl ActivityFilter {
    /// Upcoming activities, no other restriction.
    pub fn upcoming(now: DateTime<Utc>) -> Self {
        Self {
            city: None,
            category_id: None,
            search: None,
            scope: None,
            starts_after: Some(now),
            page: 1,
        }
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1) * PAGE_SIZE
    }
}
