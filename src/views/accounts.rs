//! Login, logout and registration.

use actix_web::{HttpResponse, get, post, web};
use askama::Template;
use serde::Deserialize;
use tracing::{info, warn};

use super::{Nav, redirect, render};
use crate::auth::MaybeUser;
use crate::db::DbPool;
use crate::error::AppResult;
use crate::models::{FieldErrors, LoginForm, SignupForm};
use crate::services::passwords::{hash_password, verify_password};
use crate::services::session::{SessionManager, sanitize_next};

#[derive(Template)]
#[template(path = "login.html")]
struct LoginTemplate {
    nav: Nav,
    username: String,
    next: String,
    error: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

/// GET /accounts/login/
#[get("/accounts/login/")]
pub async fn login_page(user: MaybeUser, query: web::Query<NextQuery>) -> AppResult<HttpResponse> {
    let next = sanitize_next(query.next.as_deref());
    if user.0.is_some() {
        return Ok(redirect(next.as_deref().unwrap_or("/")));
    }

    render(&LoginTemplate {
        nav: Nav::anonymous(),
        username: String::new(),
        next: next.unwrap_or_default(),
        error: None,
    })
}

/// POST /accounts/login/
#[post("/accounts/login/")]
pub async fn login(
    pool: web::Data<DbPool>,
    sessions: web::Data<SessionManager>,
    form: web::Form<LoginForm>,
) -> AppResult<HttpResponse> {
    let form = form.into_inner();
    let username = form.username.trim().to_string();
    let next = sanitize_next(form.next.as_deref());

    let credentials = pool.get_credentials(&username).await?;
    let authenticated = match credentials {
        Some((user, hash)) => {
            let password = form.password.clone();
            let valid = web::block(move || verify_password(&password, &hash)).await?;
            valid.then_some(user)
        }
        None => None,
    };

    let Some(user) = authenticated else {
        warn!(username = %username, "Failed login attempt");
        return render(&LoginTemplate {
            nav: Nav::anonymous(),
            username,
            next: next.unwrap_or_default(),
            error: Some("Please enter a correct username and password."),
        });
    };

    pool.touch_last_login(user.id).await?;
    info!("User logged in: {}", user.username);

    let cookie = sessions.login_cookie(&user)?;
    let mut response = redirect(next.as_deref().unwrap_or("/"));
    response.add_cookie(&cookie)?;
    Ok(response)
}

/// POST /accounts/logout/
#[post("/accounts/logout/")]
pub async fn logout(sessions: web::Data<SessionManager>) -> AppResult<HttpResponse> {
    let mut response = redirect("/");
    response.add_cookie(&sessions.logout_cookie())?;
    Ok(response)
}

#[derive(Template)]
#[template(path = "signup.html")]
struct SignupTemplate {
    nav: Nav,
    form: SignupForm,
    errors: FieldErrors,
}

/// GET /accounts/register/
#[get("/accounts/register/")]
pub async fn signup_page(user: MaybeUser) -> AppResult<HttpResponse> {
    if user.0.is_some() {
        return Ok(redirect("/"));
    }
    render(&SignupTemplate {
        nav: Nav::anonymous(),
        form: SignupForm::default(),
        errors: FieldErrors::new(),
    })
}

/// POST /accounts/register/
///
/// Creates the account and logs the new user in.
#[post("/accounts/register/")]
pub async fn signup(
    pool: web::Data<DbPool>,
    sessions: web::Data<SessionManager>,
    form: web::Form<SignupForm>,
) -> AppResult<HttpResponse> {
    let mut form = form.into_inner();

    let mut errors = FieldErrors::new();
    let validated = match form.validate() {
        Ok(new_user) => Some(new_user),
        Err(e) => {
            errors.extend(e);
            None
        }
    };

    if !form.username.trim().is_empty() && pool.username_exists(form.username.trim()).await? {
        errors.add("username", "A user with that username already exists.");
    }

    let new_user = match validated {
        Some(new_user) if errors.is_empty() => new_user,
        _ => {
            // Never echo passwords back into the form
            form.password1.clear();
            form.password2.clear();
            return render(&SignupTemplate {
                nav: Nav::anonymous(),
                form,
                errors,
            });
        }
    };

    let password = new_user.password.clone();
    let hash = web::block(move || hash_password(&password)).await??;
    let user = pool.create_user(&new_user, &hash).await?;
    pool.touch_last_login(user.id).await?;
    info!("User registered: {}", user.username);

    let cookie = sessions.login_cookie(&user)?;
    let mut response = redirect("/");
    response.add_cookie(&cookie)?;
    Ok(response)
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(login_page)
        .service(login)
        .service(logout)
        .service(signup_page)
        .service(signup);
}
