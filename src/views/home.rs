//! Home page.

use actix_web::{HttpResponse, get, web};
use askama::Template;
use chrono::Utc;

use super::{ActivityCard, Nav, render};
use crate::auth::MaybeUser;
use crate::db::DbPool;
use crate::error::AppResult;

/// Upcoming activities featured on the home page.
const HOME_ACTIVITY_COUNT: u64 = 6;

#[derive(Template)]
#[template(path = "home.html")]
struct HomeTemplate {
    nav: Nav,
    activities: Vec<ActivityCard>,
}

/// GET /
#[get("/")]
pub async fn index(user: MaybeUser, pool: web::Data<DbPool>) -> AppResult<HttpResponse> {
    let upcoming = pool
        .upcoming_activities(Utc::now(), HOME_ACTIVITY_COUNT)
        .await?;

    render(&HomeTemplate {
        nav: Nav::for_user(user.0.as_ref()),
        activities: ActivityCard::from_entries(&upcoming),
    })
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(index);
}
