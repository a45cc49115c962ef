//! Registration, login and logout.

use reqwest::StatusCode;

use tity_core::Style;
use tity_integration_tests::{TestApp, location};

const PASSWORD: &str = "collares-de-luna";

#[tokio::test]
async fn test_register_logs_the_user_in() {
    let app = TestApp::spawn().await;

    let response = app.register("maria", PASSWORD).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    assert!(app.get_text("/").await.contains("maria"));
}

#[tokio::test]
async fn test_duplicate_username_is_rejected() {
    let app = TestApp::spawn().await;
    app.register("maria", PASSWORD).await;

    let other = app.new_session();
    let response = other.register("maria", "otra-contraseña").await;

    assert!(location(&response).starts_with("/auth/register?error=username_taken"));
    let page = other.get_text(&location(&response)).await;
    assert!(page.contains("Ese usuario ya existe"));
}

#[tokio::test]
async fn test_password_rules() {
    let app = TestApp::spawn().await;

    let short = app.register("maria", "corta").await;
    assert!(location(&short).contains("error=password_too_short"));

    let mismatch = app
        .post_form(
            "/auth/register",
            &[
                ("username", "maria"),
                ("password", PASSWORD),
                ("password_confirm", "collares-de-sol"),
            ],
        )
        .await;
    assert!(location(&mismatch).contains("error=password_mismatch"));
}

#[tokio::test]
async fn test_login_with_correct_and_wrong_password() {
    let app = TestApp::spawn().await;
    app.register("maria", PASSWORD).await;

    let fresh = app.new_session();
    let wrong = fresh.login("maria", "no-es-esta").await;
    assert!(location(&wrong).starts_with("/auth/login?error=credentials"));

    let unknown = fresh.login("nadie", PASSWORD).await;
    assert!(location(&unknown).starts_with("/auth/login?error=credentials"));

    let ok = fresh.login("maria", PASSWORD).await;
    assert_eq!(location(&ok), "/");
    assert!(fresh.get_text("/").await.contains("maria"));
}

#[tokio::test]
async fn test_login_follows_safe_next_only() {
    let app = TestApp::spawn().await;
    app.register("maria", PASSWORD).await;

    let fresh = app.new_session();
    let response = fresh
        .post_form(
            "/auth/login",
            &[
                ("username", "maria"),
                ("password", PASSWORD),
                ("next", "//evil.example"),
            ],
        )
        .await;

    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn test_logout_keeps_the_cart() {
    let app = TestApp::spawn().await;
    app.register("maria", PASSWORD).await;
    app.add_to_cart(Style::Hippie, "Blusa hippie", "1").await;

    let response = app.post_form("/auth/logout", &[]).await;
    assert_eq!(location(&response), "/");

    let body = app.get_text("/cart").await;
    assert!(body.contains("Iniciar sesión"));
    assert!(body.contains("Blusa hippie"));
}

#[tokio::test]
async fn test_login_page_skips_when_logged_in() {
    let app = TestApp::spawn().await;

    assert_eq!(app.get("/auth/login").await.status(), StatusCode::OK);

    app.register("maria", PASSWORD).await;
    let response = app.get("/auth/login?next=%2Fcart").await;
    assert_eq!(location(&response), "/cart");
}
