//! Public profiles and self-service profile editing.

use actix_multipart::Multipart;
use actix_web::{HttpResponse, get, post, web};
use askama::Template;
use chrono::Utc;
use futures_util::StreamExt;
use serde::Deserialize;
use tracing::info;

use super::{ActivityCard, Nav, redirect, render};
use crate::auth::{MaybeUser, SessionUser};
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::validation::{AVATAR_MAX_BYTES, validate_avatar};
use crate::models::{ActivityFilter, ActivityScope, FieldErrors, ProfileForm, User};
use crate::services::MediaStorage;

/// Upper bound for a single text field of the profile form.
const MAX_TEXT_FIELD_BYTES: usize = 16 * 1024;

fn profile_url(username: &str) -> String {
    format!("/users/{}/", urlencoding::encode(username))
}

// ============================================================================
// Public profile
// ============================================================================

#[derive(Template)]
#[template(path = "profile.html")]
struct ProfileTemplate {
    nav: Nav,
    profile: User,
    member_since: String,
    proposed: Vec<ActivityCard>,
    attending: Vec<ActivityCard>,
    is_own: bool,
    notice: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
pub struct ProfileQuery {
    pub notice: Option<String>,
}

/// GET /accounts/profile/
#[get("/accounts/profile/")]
pub async fn own_profile(session: SessionUser) -> HttpResponse {
    redirect(&profile_url(&session.user.username))
}

/// GET /users/{username}/
#[get("/users/{username}/")]
pub async fn public_profile(
    user: MaybeUser,
    pool: web::Data<DbPool>,
    path: web::Path<String>,
    query: web::Query<ProfileQuery>,
) -> AppResult<HttpResponse> {
    let username = path.into_inner();
    let profile = pool
        .get_user_by_username(&username)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {}", username)))?;

    let now = Utc::now();
    let proposed_filter = ActivityFilter {
        scope: Some((ActivityScope::Proposed, profile.id)),
        ..ActivityFilter::upcoming(now)
    };
    let attending_filter = ActivityFilter {
        scope: Some((ActivityScope::Attending, profile.id)),
        ..ActivityFilter::upcoming(now)
    };
    let (proposed, _) = pool.list_activities(&proposed_filter).await?;
    let (attending, _) = pool.list_activities(&attending_filter).await?;

    let notice = match query.notice.as_deref() {
        Some("updated") => Some("Your profile has been updated."),
        _ => None,
    };

    render(&ProfileTemplate {
        nav: Nav::for_user(user.0.as_ref()),
        is_own: user.id() == Some(profile.id),
        member_since: profile.date_joined.format("%B %Y").to_string(),
        profile,
        proposed: ActivityCard::from_entries(&proposed),
        attending: ActivityCard::from_entries(&attending),
        notice,
    })
}

// ============================================================================
// Profile editing
// ============================================================================

#[derive(Template)]
#[template(path = "profile_edit.html")]
struct ProfileEditTemplate {
    nav: Nav,
    form: ProfileForm,
    errors: FieldErrors,
    avatar_url: Option<String>,
}

/// Uploaded avatar file.
struct AvatarUpload {
    filename: String,
    data: Vec<u8>,
    /// Bytes received; may exceed `data.len()` when the file was too large.
    size: usize,
}

/// GET /accounts/profile/edit/
#[get("/accounts/profile/edit/")]
pub async fn edit_profile_page(session: SessionUser) -> AppResult<HttpResponse> {
    render(&ProfileEditTemplate {
        nav: Nav::for_user(Some(&session.user)),
        form: ProfileForm::from_user(&session.user),
        errors: FieldErrors::new(),
        avatar_url: session.user.avatar_url(),
    })
}

/// Read the multipart profile form.
///
/// Avatar bytes beyond the size limit are counted but not buffered.
async fn read_profile_form(payload: &mut Multipart) -> AppResult<(ProfileForm, Option<AvatarUpload>)> {
    let mut form = ProfileForm::default();
    let mut avatar = None;

    while let Some(item) = payload.next().await {
        let mut field =
            item.map_err(|e| AppError::InvalidInput(format!("Multipart error: {}", e)))?;

        let name = field.name().unwrap_or_default().to_string();
        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_string);

        // Collect field data
        let limit = if name == "avatar" {
            AVATAR_MAX_BYTES
        } else {
            MAX_TEXT_FIELD_BYTES
        };
        let mut data = Vec::new();
        let mut size = 0usize;
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| AppError::InvalidInput(format!("Read error: {}", e)))?;
            size += chunk.len();
            if data.len() + chunk.len() <= limit {
                data.extend_from_slice(&chunk);
            }
        }

        if name == "avatar" {
            // An empty file input still sends a part with no filename
            if let Some(filename) = filename.filter(|f| !f.is_empty())
                && size > 0
            {
                avatar = Some(AvatarUpload {
                    filename,
                    data,
                    size,
                });
            }
            continue;
        }

        if size > MAX_TEXT_FIELD_BYTES {
            return Err(AppError::InvalidInput(format!("Field {} is too large", name)));
        }
        let value = String::from_utf8(data)
            .map_err(|_| AppError::InvalidInput(format!("Field {} is not valid UTF-8", name)))?;
        match name.as_str() {
            "email" => form.email = value,
            "first_name" => form.first_name = value,
            "last_name" => form.last_name = value,
            "bio" => form.bio = value,
            "clear_avatar" => form.clear_avatar = !value.is_empty() && value != "false",
            _ => {}
        }
    }

    Ok((form, avatar))
}

/// POST /accounts/profile/edit/
#[post("/accounts/profile/edit/")]
pub async fn edit_profile(
    session: SessionUser,
    pool: web::Data<DbPool>,
    media: web::Data<MediaStorage>,
    mut payload: Multipart,
) -> AppResult<HttpResponse> {
    let user = session.user;
    let (form, avatar) = read_profile_form(&mut payload).await?;

    let mut errors = FieldErrors::new();
    let update = match form.validate() {
        Ok(update) => Some(update),
        Err(e) => {
            errors.extend(e);
            None
        }
    };
    let extension = match avatar
        .as_ref()
        .map(|a| validate_avatar(&a.filename, &a.data, a.size))
    {
        Some(Ok(ext)) => Some(ext),
        Some(Err(e)) => {
            errors.extend(e);
            None
        }
        None => None,
    };

    let update = match update {
        Some(update) if errors.is_empty() => update,
        _ => {
            return render(&ProfileEditTemplate {
                nav: Nav::for_user(Some(&user)),
                avatar_url: user.avatar_url(),
                form,
                errors,
            });
        }
    };

    pool.update_profile(user.id, &update).await?;

    let replaced = match (avatar, extension) {
        (Some(upload), Some(ext)) => {
            let key = media.save_avatar(&ext, &upload.data).await?;
            info!("Avatar stored for {}: {}", user.username, key);
            pool.set_avatar(user.id, Some(key)).await?
        }
        _ if form.clear_avatar => pool.set_avatar(user.id, None).await?,
        _ => None,
    };
    if let Some(previous) = replaced {
        media.delete_quietly(&previous).await;
    }

    info!("Profile updated: {}", user.username);
    Ok(redirect(&format!("{}?notice=updated", profile_url(&user.username))))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(own_profile)
        .service(public_profile)
        .service(edit_profile_page)
        .service(edit_profile);
}
