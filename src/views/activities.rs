//! Activity catalog, detail, creation and reservation pages.

use actix_web::{HttpRequest, HttpResponse, get, post, web};
use askama::Template;
use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};

use super::{ActivityCard, Nav, datetime_input, redirect, render};
use crate::auth::{MaybeUser, SessionUser};
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::{
    ActivityForm, Category, FieldErrors, ListActivitiesQuery, PAGE_SIZE, Pagination, User,
};
use crate::services::{AqiClient, AqiReading};

/// Category `<option>` with its selection state.
struct CategoryOption {
    id: i32,
    name: String,
    selected: bool,
}

fn category_options(categories: Vec<Category>, selected: Option<&str>) -> Vec<CategoryOption> {
    categories
        .into_iter()
        .map(|c| CategoryOption {
            selected: selected.is_some_and(|s| s.trim() == c.id.to_string()),
            id: c.id,
            name: c.name,
        })
        .collect()
}

// ============================================================================
// Catalog
// ============================================================================

#[derive(Template)]
#[template(path = "activity_list.html")]
struct ActivityListTemplate {
    nav: Nav,
    activities: Vec<ActivityCard>,
    categories: Vec<CategoryOption>,
    city: String,
    q: String,
    scope: String,
    past: bool,
    pagination: Pagination,
    previous_url: Option<String>,
    next_url: Option<String>,
}

/// Catalog URL for `page`, keeping the other filters.
fn page_url(query: &ListActivitiesQuery, page: u64) -> String {
    let mut params: Vec<String> = Vec::new();
    let fields = [
        ("city", &query.city),
        ("category", &query.category),
        ("q", &query.q),
        ("scope", &query.scope),
        ("past", &query.past),
    ];
    for (name, value) in fields {
        if let Some(value) = value.as_deref().filter(|v| !v.trim().is_empty()) {
            params.push(format!("{}={}", name, urlencoding::encode(value)));
        }
    }
    params.push(format!("page={}", page));
    format!("/activities/?{}", params.join("&"))
}

/// Catalog filters from the raw querystring. Malformed input yields an
/// unfiltered first page instead of an error.
fn catalog_query(req: &HttpRequest) -> ListActivitiesQuery {
    web::Query::<Vec<(String, String)>>::from_query(req.query_string())
        .map(|pairs| ListActivitiesQuery::from_pairs(pairs.into_inner()))
        .unwrap_or_default()
}

/// GET /activities/
#[get("/activities/")]
pub async fn list_activities(
    req: HttpRequest,
    user: MaybeUser,
    pool: web::Data<DbPool>,
) -> AppResult<HttpResponse> {
    let query = catalog_query(&req);
    let filter = query.to_filter(user.id(), Utc::now());
    let (entries, total) = pool.list_activities(&filter).await?;
    let categories = pool.list_categories().await?;

    let pagination = Pagination::new(filter.page, PAGE_SIZE, total);
    let previous_url = pagination
        .has_previous()
        .then(|| page_url(&query, pagination.page - 1));
    let next_url = pagination
        .has_next()
        .then(|| page_url(&query, pagination.page + 1));

    render(&ActivityListTemplate {
        nav: Nav::for_user(user.0.as_ref()),
        activities: ActivityCard::from_entries(&entries),
        categories: category_options(categories, query.category.as_deref()),
        city: filter.city.clone().unwrap_or_default(),
        q: filter.search.clone().unwrap_or_default(),
        scope: filter
            .scope
            .map(|(scope, _)| scope.as_str().to_string())
            .unwrap_or_default(),
        past: filter.starts_after.is_none(),
        pagination,
        previous_url,
        next_url,
    })
}

// ============================================================================
// Detail
// ============================================================================

/// Air-quality block of the detail page.
struct AirQualityView {
    reading: Option<AqiReading>,
    /// Placeholder shown when no reading is available.
    message: &'static str,
}

impl AirQualityView {
    async fn lookup(client: &AqiClient, city: &str) -> Self {
        match client.lookup(Some(city)).await {
            Ok(reading) => Self {
                reading: Some(reading),
                message: "",
            },
            Err(e) => {
                warn!(city = %city, error = %e, "Air quality unavailable for activity page");
                Self {
                    reading: None,
                    message: e.user_message(),
                }
            }
        }
    }
}

struct AttendeeView {
    username: String,
    display_name: String,
    avatar_url: Option<String>,
}

impl AttendeeView {
    fn new(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            display_name: user.display_name(),
            avatar_url: user.avatar_url(),
        }
    }
}

#[derive(Template)]
#[template(path = "activity_detail.html")]
struct ActivityDetailTemplate {
    nav: Nav,
    activity: ActivityCard,
    description: String,
    attendees: Vec<AttendeeView>,
    is_attending: bool,
    is_proposer: bool,
    started: bool,
    air: AirQualityView,
    notice: Option<&'static str>,
    login_url: String,
}

/// Flash message for the `notice` query parameter.
pub fn notice_message(key: &str) -> Option<&'static str> {
    match key {
        "created" => Some("Your activity has been published."),
        "reserved" => Some("Your place is reserved."),
        "already_reserved" => Some("You already have a place for this activity."),
        "closed" => Some("Reservations are closed: this activity has already started."),
        "unreserved" => Some("Your reservation has been cancelled."),
        "not_reserved" => Some("You had no reservation for this activity."),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
pub struct NoticeQuery {
    pub notice: Option<String>,
}

/// GET /activities/{id}/
#[get("/activities/{id:\\d+}/")]
pub async fn activity_detail(
    user: MaybeUser,
    pool: web::Data<DbPool>,
    aqi: web::Data<AqiClient>,
    path: web::Path<i32>,
    query: web::Query<NoticeQuery>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let entry = pool
        .get_activity(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Activity {}", id)))?;

    let attendees = pool.list_attendees(id).await?;
    let user_id = user.id();
    let is_attending = user_id.is_some_and(|uid| attendees.iter().any(|a| a.id == uid));
    let is_proposer = user_id == Some(entry.proposer.id);

    let air = AirQualityView::lookup(&aqi, &entry.location_city).await;

    render(&ActivityDetailTemplate {
        nav: Nav::for_user(user.0.as_ref()),
        activity: ActivityCard::new(&entry),
        description: entry.description.clone(),
        attendees: attendees.iter().map(AttendeeView::new).collect(),
        is_attending,
        is_proposer,
        started: entry.has_started(Utc::now()),
        air,
        notice: query.notice.as_deref().and_then(notice_message),
        login_url: format!(
            "/accounts/login/?next={}",
            urlencoding::encode(&format!("/activities/{}/", id))
        ),
    })
}

// ============================================================================
// Creation
// ============================================================================

#[derive(Template)]
#[template(path = "activity_form.html")]
struct ActivityFormTemplate {
    nav: Nav,
    form: ActivityForm,
    errors: FieldErrors,
    categories: Vec<CategoryOption>,
    min_start: String,
}

async fn render_form(
    pool: &DbPool,
    user: &User,
    form: ActivityForm,
    errors: FieldErrors,
) -> AppResult<HttpResponse> {
    let categories = pool.list_categories().await?;
    render(&ActivityFormTemplate {
        nav: Nav::for_user(Some(user)),
        categories: category_options(categories, Some(&form.category)),
        form,
        errors,
        min_start: datetime_input(&Utc::now()),
    })
}

/// GET /activities/new/
#[get("/activities/new/")]
pub async fn new_activity(session: SessionUser, pool: web::Data<DbPool>) -> AppResult<HttpResponse> {
    render_form(&pool, &session.user, ActivityForm::default(), FieldErrors::new()).await
}

/// POST /activities/new/
#[post("/activities/new/")]
pub async fn create_activity(
    session: SessionUser,
    pool: web::Data<DbPool>,
    form: web::Form<ActivityForm>,
) -> AppResult<HttpResponse> {
    let form = form.into_inner();
    let mut errors = FieldErrors::new();

    let validated = match form.validate(Utc::now()) {
        Ok(activity) => Some(activity),
        Err(e) => {
            errors.extend(e);
            None
        }
    };

    if let Ok(category_id) = form.category.trim().parse::<i32>()
        && pool.get_category(category_id).await?.is_none()
    {
        errors.add("category", "Select a valid category.");
    }

    let activity = match validated {
        Some(activity) if errors.is_empty() => activity,
        _ => return render_form(&pool, &session.user, form, errors).await,
    };

    let created = pool.insert_activity(session.user.id, &activity).await?;
    info!(
        "Activity created: id={}, proposer={}",
        created.id, session.user.username
    );

    Ok(redirect(&format!("/activities/{}/?notice=created", created.id)))
}

// ============================================================================
// Reservations
// ============================================================================

/// POST /activities/{id}/reserve
pub async fn reserve(
    session: SessionUser,
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let outcome = pool
        .reserve_activity(id, session.user.id, Utc::now())
        .await?;
    info!(
        "Reservation: activity={}, user={}, outcome={}",
        id,
        session.user.username,
        outcome.notice()
    );

    Ok(redirect(&format!(
        "/activities/{}/?notice={}",
        id,
        outcome.notice()
    )))
}

/// POST /activities/{id}/unreserve
pub async fn unreserve(
    session: SessionUser,
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    if pool.get_activity(id).await?.is_none() {
        return Err(AppError::NotFound(format!("Activity {}", id)));
    }

    let notice = if pool.unreserve_activity(id, session.user.id).await? {
        info!(
            "Reservation cancelled: activity={}, user={}",
            id, session.user.username
        );
        "unreserved"
    } else {
        "not_reserved"
    };

    Ok(redirect(&format!("/activities/{}/?notice={}", id, notice)))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(list_activities)
        .service(new_activity)
        .service(create_activity)
        .service(activity_detail)
        .service(
            web::resource(["/activities/{id:\\d+}/reserve", "/activities/{id:\\d+}/reserve/"])
                .route(web::post().to(reserve)),
        )
        .service(
            web::resource([
                "/activities/{id:\\d+}/unreserve",
                "/activities/{id:\\d+}/unreserve/",
            ])
            .route(web::post().to(unreserve)),
        );
}
