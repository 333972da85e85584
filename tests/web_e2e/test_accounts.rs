//! E2E tests: registration, login and logout.

use actix_web::http::StatusCode;
use actix_web::test;

use super::test_helpers::*;

#[actix_rt::test]
async fn test_signup_logs_the_new_user_in() {
    let env = TestEnv::new().await;
    let app = create_test_app(&env, unconfigured_aqi()).await;

    let req = test::TestRequest::post()
        .uri("/accounts/register/")
        .set_form([
            ("username", "marie"),
            ("email", "marie@example.com"),
            ("first_name", "Marie"),
            ("last_name", "Curie"),
            ("password1", "radium-1898"),
            ("password2", "radium-1898"),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/");
    let cookie = session_cookie_of(&resp).expect("Signup should set a session cookie");
    assert!(cookie.http_only().unwrap_or(false));

    // The cookie identifies the new user
    let req = test::TestRequest::get()
        .uri("/")
        .cookie(cookie)
        .to_request();
    let body = body_text(test::call_service(&app, req).await).await;
    assert!(body.contains("Marie Curie"), "Nav should show the user: {}", body);

    let user = env.pool.get_user_by_username("marie").await.unwrap().unwrap();
    assert!(user.last_login.is_some());
}

#[actix_rt::test]
async fn test_signup_rejects_taken_username_any_case() {
    let env = TestEnv::new().await;
    env.create_user("Marie").await;
    assert!(env.pool.username_exists("MARIE").await.unwrap());
    assert!(!env.pool.username_exists("maria").await.unwrap());
    let app = create_test_app(&env, unconfigured_aqi()).await;

    let req = test::TestRequest::post()
        .uri("/accounts/register/")
        .set_form([
            ("username", "marie"),
            ("email", "other@example.com"),
            ("password1", "radium-1898"),
            ("password2", "radium-1898"),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(session_cookie_of(&resp).is_none());
    let body = body_text(resp).await;
    assert!(body.contains("A user with that username already exists."));
    assert!(!body.contains("radium-1898"), "Passwords must not be echoed");
}

#[actix_rt::test]
async fn test_signup_reports_every_invalid_field() {
    let env = TestEnv::new().await;
    let app = create_test_app(&env, unconfigured_aqi()).await;

    let req = test::TestRequest::post()
        .uri("/accounts/register/")
        .set_form([
            ("username", "bad name!"),
            ("email", "not-an-email"),
            ("password1", "12345678"),
            ("password2", "87654321"),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_text(resp).await;
    assert!(body.contains("Enter a valid username."));
    assert!(body.contains("Enter a valid email address."));
    assert!(body.contains("This password is entirely numeric."));
}

#[actix_rt::test]
async fn test_login_redirects_to_next() {
    let env = TestEnv::new().await;
    env.create_user("paul").await;
    let app = create_test_app(&env, unconfigured_aqi()).await;

    let req = test::TestRequest::post()
        .uri("/accounts/login/")
        .set_form([
            ("username", "paul"),
            ("password", TEST_PASSWORD),
            ("next", "/activities/new/"),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/activities/new/");
    assert!(session_cookie_of(&resp).is_some());
}

#[actix_rt::test]
async fn test_login_ignores_external_next() {
    let env = TestEnv::new().await;
    env.create_user("paul").await;
    let app = create_test_app(&env, unconfigured_aqi()).await;

    let req = test::TestRequest::post()
        .uri("/accounts/login/")
        .set_form([
            ("username", "paul"),
            ("password", TEST_PASSWORD),
            ("next", "//evil.example.com/"),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/");
}

#[actix_rt::test]
async fn test_login_with_wrong_password() {
    let env = TestEnv::new().await;
    env.create_user("paul").await;
    let app = create_test_app(&env, unconfigured_aqi()).await;

    for (username, password) in [("paul", "wrong-password"), ("nobody", TEST_PASSWORD)] {
        let req = test::TestRequest::post()
            .uri("/accounts/login/")
            .set_form([("username", username), ("password", password)])
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert!(session_cookie_of(&resp).is_none());
        let body = body_text(resp).await;
        assert!(body.contains("Please enter a correct username and password."));
    }
}

#[actix_rt::test]
async fn test_logout_expires_cookie() {
    let env = TestEnv::new().await;
    let user = env.create_user("paul").await;
    let app = create_test_app(&env, unconfigured_aqi()).await;

    let req = test::TestRequest::post()
        .uri("/accounts/logout/")
        .cookie(env.session_cookie(&user))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    let cookie = session_cookie_of(&resp).expect("Logout should reset the cookie");
    assert_eq!(cookie.value(), "");
    assert_eq!(cookie.max_age(), Some(actix_web::cookie::time::Duration::ZERO));
}

#[actix_rt::test]
async fn test_login_page_redirects_authenticated_user() {
    let env = TestEnv::new().await;
    let user = env.create_user("paul").await;
    let app = create_test_app(&env, unconfigured_aqi()).await;

    let req = test::TestRequest::get()
        .uri("/accounts/login/")
        .cookie(env.session_cookie(&user))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/");
}

#[actix_rt::test]
async fn test_tampered_cookie_is_anonymous() {
    let env = TestEnv::new().await;
    let app = create_test_app(&env, unconfigured_aqi()).await;

    let req = test::TestRequest::get()
        .uri("/activities/new/")
        .cookie(actix_web::cookie::Cookie::new(
            airlibre_lib::services::session::SESSION_COOKIE,
            "not-a-jwt",
        ))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&resp),
        "/accounts/login/?next=%2Factivities%2Fnew%2F"
    );
}
