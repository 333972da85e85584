//! Server-rendered HTML pages.
//!
//! Handlers build a template struct per page and render it with askama.
//! Every template extends `base.html`, which reads the [`Nav`] context.

pub mod accounts;
pub mod activities;
pub mod errors;
pub mod home;
pub mod profile;

use actix_web::http::header;
use actix_web::{HttpResponse, web};
use askama::Template;
use chrono::{DateTime, Utc};

use crate::error::AppResult;
use crate::models::{ActivityEntry, User};

/// Navigation bar state shared by every page.
#[derive(Debug, Clone, Default)]
pub struct Nav {
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

impl Nav {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn for_user(user: Option<&User>) -> Self {
        match user {
            Some(user) => Self {
                username: Some(user.username.clone()),
                display_name: Some(user.display_name()),
                avatar_url: user.avatar_url(),
            },
            None => Self::anonymous(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.username.is_some()
    }
}

/// Activity summary as shown in lists.
#[derive(Debug, Clone)]
pub struct ActivityCard {
    pub id: i32,
    pub title: String,
    pub excerpt: String,
    pub city: String,
    pub category: Option<String>,
    pub starts: String,
    pub ends: String,
    pub proposer: String,
    pub proposer_username: String,
    pub attendee_count: usize,
}

impl ActivityCard {
    pub fn new(entry: &ActivityEntry) -> Self {
        Self {
            id: entry.id,
            title: entry.title.clone(),
            excerpt: excerpt(&entry.description, 160),
            city: entry.location_city.clone(),
            category: entry.category.as_ref().map(|c| c.name.clone()),
            starts: format_datetime(&entry.start_time),
            ends: format_datetime(&entry.end_time),
            proposer: entry.proposer.display_name(),
            proposer_username: entry.proposer.username.clone(),
            attendee_count: entry.attendee_count,
        }
    }

    pub fn from_entries(entries: &[ActivityEntry]) -> Vec<Self> {
        entries.iter().map(Self::new).collect()
    }
}

/// Display format for instants (UTC).
pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.format("%a %d %b %Y, %H:%M UTC").to_string()
}

/// Value for a `datetime-local` input.
pub fn datetime_input(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M").to_string()
}

/// First `max` characters of `text`, with an ellipsis when cut.
pub fn excerpt(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max).collect();
    format!("{}…", cut.trim_end())
}

/// Render a template into a 200 HTML response.
pub fn render<T: Template>(template: &T) -> AppResult<HttpResponse> {
    let body = template.render()?;
    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(body))
}

/// 303 redirect, so a POST is followed by a GET.
pub fn redirect(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location.to_string()))
        .finish()
}

/// Configure all HTML routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.configure(home::configure_routes)
        .configure(activities::configure_routes)
        .configure(accounts::configure_routes)
        .configure(profile::configure_routes);
}
