//! E2E tests: catalog, creation and reservations.

use actix_web::http::StatusCode;
use actix_web::test;
use chrono::{Duration, Utc};

use airlibre_lib::error::AppError;
use airlibre_lib::models::{ActivityFilter, NewActivity};

use super::mock_aqi;
use super::test_helpers::*;

#[actix_rt::test]
async fn test_anonymous_creation_redirects_to_login() {
    let env = TestEnv::new().await;
    let app = create_test_app(&env, unconfigured_aqi()).await;

    let req = test::TestRequest::get().uri("/activities/new/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&resp),
        "/accounts/login/?next=%2Factivities%2Fnew%2F"
    );

    // Form posts carry no `next`
    let req = test::TestRequest::post()
        .uri("/activities/new/")
        .set_form([("title", "Sunset hike")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/accounts/login/");
}

#[actix_rt::test]
async fn test_create_activity_and_view_it() {
    let env = TestEnv::new().await;
    let user = env.create_user("camille").await;
    let category = env.pool.create_category("Hiking").await.unwrap();
    let app = create_test_app(&env, unconfigured_aqi()).await;

    let start = form_datetime(Duration::days(3));
    let end = form_datetime(Duration::days(3) + Duration::hours(4));
    let category_id = category.id.to_string();
    let req = test::TestRequest::post()
        .uri("/activities/new/")
        .cookie(env.session_cookie(&user))
        .set_form([
            ("title", "Sunset hike on the ridge"),
            ("description", "Easy walk, about 8 km with a picnic at the top."),
            ("location_city", "Grenoble"),
            ("start_time", start.as_str()),
            ("end_time", end.as_str()),
            ("category", category_id.as_str()),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    let target = location(&resp);
    assert!(target.ends_with("/?notice=created"), "got {}", target);

    let req = test::TestRequest::get().uri(&target).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_text(resp).await;
    assert!(body.contains("Sunset hike on the ridge"));
    assert!(body.contains("Your activity has been published."));
    assert!(body.contains("Hiking"));
    assert!(body.contains("Air quality information is not available on this site."));
    assert!(body.contains("Log in</a> to reserve a place."));
}

#[actix_rt::test]
async fn test_invalid_activity_form_is_redisplayed() {
    let env = TestEnv::new().await;
    let user = env.create_user("camille").await;
    let app = create_test_app(&env, unconfigured_aqi()).await;

    let start = form_datetime(-Duration::hours(1));
    let end = form_datetime(-Duration::hours(2));
    let req = test::TestRequest::post()
        .uri("/activities/new/")
        .cookie(env.session_cookie(&user))
        .set_form([
            ("title", "Hike"),
            ("description", "Short"),
            ("location_city", "Grenoble"),
            ("start_time", start.as_str()),
            ("end_time", end.as_str()),
            ("category", "999"),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_text(resp).await;
    assert!(body.contains("The title must be at least 5 characters long."));
    assert!(body.contains("The description must be at least 10 characters long."));
    assert!(body.contains("Select a valid category."));
    assert!(body.contains("value=\"Grenoble\""), "Input should be kept");

    let (entries, total) = env
        .pool
        .list_activities(&airlibre_lib::models::ActivityFilter::upcoming(Utc::now()))
        .await
        .unwrap();
    assert!(entries.is_empty());
    assert_eq!(total, 0);
}

#[actix_rt::test]
async fn test_reservation_lifecycle() {
    let env = TestEnv::new().await;
    let proposer = env.create_user("camille").await;
    let guest = env.create_user("lucas").await;
    let id = env
        .create_activity(&proposer, "Lake swim", "Annecy", Utc::now() + Duration::days(1))
        .await;
    let app = create_test_app(&env, unconfigured_aqi()).await;

    let post = |path: String| {
        test::TestRequest::post()
            .uri(&path)
            .cookie(env.session_cookie(&guest))
            .to_request()
    };

    let resp = test::call_service(&app, post(format!("/activities/{}/reserve", id))).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), format!("/activities/{}/?notice=reserved", id));

    // Reserving twice keeps a single reservation
    let resp = test::call_service(&app, post(format!("/activities/{}/reserve/", id))).await;
    assert_eq!(
        location(&resp),
        format!("/activities/{}/?notice=already_reserved", id)
    );
    assert_eq!(env.pool.list_attendees(id).await.unwrap().len(), 1);
    assert!(env.pool.is_attending(id, guest.id).await.unwrap());

    let req = test::TestRequest::get()
        .uri(&format!("/activities/{}/", id))
        .cookie(env.session_cookie(&guest))
        .to_request();
    let body = body_text(test::call_service(&app, req).await).await;
    assert!(body.contains("1 attending"));
    assert!(body.contains("Cancel my reservation"));

    let resp = test::call_service(&app, post(format!("/activities/{}/unreserve", id))).await;
    assert_eq!(location(&resp), format!("/activities/{}/?notice=unreserved", id));
    let resp = test::call_service(&app, post(format!("/activities/{}/unreserve", id))).await;
    assert_eq!(
        location(&resp),
        format!("/activities/{}/?notice=not_reserved", id)
    );
    assert!(env.pool.list_attendees(id).await.unwrap().is_empty());
}

#[actix_rt::test]
async fn test_started_activity_is_closed() {
    let env = TestEnv::new().await;
    let proposer = env.create_user("camille").await;
    let guest = env.create_user("lucas").await;
    let id = env
        .create_activity(&proposer, "Morning run", "Lyon", Utc::now() - Duration::minutes(30))
        .await;
    let app = create_test_app(&env, unconfigured_aqi()).await;

    let req = test::TestRequest::post()
        .uri(&format!("/activities/{}/reserve", id))
        .cookie(env.session_cookie(&guest))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(location(&resp), format!("/activities/{}/?notice=closed", id));
    assert!(!env.pool.is_attending(id, guest.id).await.unwrap());
}

#[actix_rt::test]
async fn test_reserving_unknown_activity() {
    let env = TestEnv::new().await;
    let guest = env.create_user("lucas").await;
    let app = create_test_app(&env, unconfigured_aqi()).await;

    let req = test::TestRequest::post()
        .uri("/activities/4242/reserve")
        .cookie(env.session_cookie(&guest))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_catalog_filters() {
    let env = TestEnv::new().await;
    let camille = env.create_user("camille").await;
    let lucas = env.create_user("lucas").await;
    let soon = Utc::now() + Duration::days(2);
    env.create_activity(&camille, "Canal cycling tour", "Lyon", soon).await;
    env.create_activity(&lucas, "Calanques climbing", "Marseille", soon).await;
    env.create_activity(&camille, "Old bike swap", "Lyon", Utc::now() - Duration::days(2))
        .await;
    let app = create_test_app(&env, unconfigured_aqi()).await;

    let req = test::TestRequest::get().uri("/activities/?city=lyo").to_request();
    let body = body_text(test::call_service(&app, req).await).await;
    assert!(body.contains("Canal cycling tour"));
    assert!(!body.contains("Calanques climbing"));
    assert!(!body.contains("Old bike swap"), "Past activities are hidden");

    let req = test::TestRequest::get()
        .uri("/activities/?city=Lyon&past=1")
        .to_request();
    let body = body_text(test::call_service(&app, req).await).await;
    assert!(body.contains("Old bike swap"));

    let req = test::TestRequest::get()
        .uri("/activities/?q=climb")
        .to_request();
    let body = body_text(test::call_service(&app, req).await).await;
    assert!(body.contains("Calanques climbing"));
    assert!(!body.contains("Canal cycling tour"));

    let req = test::TestRequest::get()
        .uri("/activities/?scope=proposed")
        .cookie(env.session_cookie(&lucas))
        .to_request();
    let body = body_text(test::call_service(&app, req).await).await;
    assert!(body.contains("Calanques climbing"));
    assert!(!body.contains("Canal cycling tour"));
}

#[actix_rt::test]
async fn test_home_lists_upcoming_activities() {
    let env = TestEnv::new().await;
    let camille = env.create_user("camille").await;
    env.create_activity(&camille, "Forest walk", "Nancy", Utc::now() + Duration::days(1))
        .await;
    let app = create_test_app(&env, unconfigured_aqi()).await;

    let req = test::TestRequest::get().uri("/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_text(resp).await.contains("Forest walk"));
}

#[actix_rt::test]
async fn test_detail_shows_air_quality() {
    let env = TestEnv::new().await;
    let camille = env.create_user("camille").await;
    let id = env
        .create_activity(&camille, "Forest walk", "Nancy", Utc::now() + Duration::days(1))
        .await;
    let app = create_test_app(&env, mock_aqi::start().await).await;

    let req = test::TestRequest::get()
        .uri(&format!("/activities/{}/", id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_text(resp).await;
    assert!(body.contains("<strong>42</strong>"));
    assert!(body.contains("aqi-good"));
    assert!(body.contains("Station: Test station"));
}

#[actix_rt::test]
async fn test_detail_survives_provider_failures() {
    let env = TestEnv::new().await;
    let camille = env.create_user("camille").await;
    let app = create_test_app(&env, mock_aqi::start().await).await;

    let cases = [
        (mock_aqi::REJECTED_CITY, "No air quality station was found for this city."),
        (
            mock_aqi::ERROR_CITY,
            "The air quality service is unreachable right now. Please try again later.",
        ),
        (
            mock_aqi::JUNK_CITY,
            "The air quality service is unreachable right now. Please try again later.",
        ),
    ];
    for (city, message) in cases {
        let id = env
            .create_activity(&camille, "Harbour swim", city, Utc::now() + Duration::days(1))
            .await;
        let req = test::TestRequest::get()
            .uri(&format!("/activities/{}/", id))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK, "{}", city);

        let body = body_text(resp).await;
        assert!(body.contains("Harbour swim"));
        assert!(body.contains(message), "{}: {}", city, body);
        for detail in ["Unknown station", "upstream exploded", "not json", "expected value", "AQI_"] {
            assert!(!body.contains(detail), "{} leaked {:?}", city, detail);
        }
    }
}

#[actix_rt::test]
async fn test_catalog_ignores_malformed_page() {
    let env = TestEnv::new().await;
    let camille = env.create_user("camille").await;
    env.create_activity(&camille, "Canal cycling tour", "Lyon", Utc::now() + Duration::days(2))
        .await;
    let app = create_test_app(&env, unconfigured_aqi()).await;

    for uri in [
        "/activities/?page=abc",
        "/activities/?page=-1",
        "/activities/?page=2&page=3",
        "/activities/?city=Lyon&city=Paris&page=",
        "/activities/?category=hiking&scope=everything",
    ] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK, "{}", uri);
        assert!(body_text(resp).await.contains("Canal cycling tour"), "{}", uri);
    }
}

#[actix_rt::test]
async fn test_undecodable_requests_get_error_page() {
    let env = TestEnv::new().await;
    let user = env.create_user("camille").await;
    let app = create_test_app(&env, unconfigured_aqi()).await;

    let req = test::TestRequest::post()
        .uri("/activities/new/")
        .cookie(env.session_cookie(&user))
        .insert_header(("content-type", "application/x-www-form-urlencoded"))
        .set_payload("title=One&title=Two")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_text(resp).await;
    assert!(body.contains("Bad request"));
    assert!(body.contains("The submitted form could not be read."));

    let req = test::TestRequest::get()
        .uri("/activities/1/?notice=created&notice=reserved")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(resp).await.contains("The request address is malformed."));
}

#[actix_rt::test]
async fn test_insert_rejects_end_before_start() {
    let env = TestEnv::new().await;
    let camille = env.create_user("camille").await;
    let start = Utc::now() + Duration::days(1);
    let activity = NewActivity {
        title: "Backwards hike".to_string(),
        description: "Ends before it even begins.".to_string(),
        location_city: "Annecy".to_string(),
        start_time: start,
        end_time: start - Duration::hours(3),
        category_id: None,
    };

    let result = env.pool.insert_activity(camille.id, &activity).await;
    assert!(matches!(result, Err(AppError::InvalidInput(_))), "{:?}", result);

    let equal = NewActivity {
        end_time: start,
        ..activity.clone()
    };
    assert!(env.pool.insert_activity(camille.id, &equal).await.is_err());

    let (entries, total) = env
        .pool
        .list_activities(&ActivityFilter::upcoming(Utc::now()))
        .await
        .unwrap();
    assert_eq!(total, 0);
    assert!(entries.is_empty());

    // Past starts stay allowed for seeding
    let past = NewActivity {
        start_time: Utc::now() - Duration::days(2),
        end_time: Utc::now() - Duration::days(2) + Duration::hours(1),
        ..activity
    };
    assert!(env.pool.insert_activity(camille.id, &past).await.is_ok());
}

#[actix_rt::test]
async fn test_unknown_pages_are_404() {
    let env = TestEnv::new().await;
    let app = create_test_app(&env, unconfigured_aqi()).await;

    for uri in ["/activities/999/", "/nowhere/", "/users/ghost/"] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{}", uri);
        assert!(body_text(resp).await.contains("Page not found"));
    }
}
