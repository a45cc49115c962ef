//! Integration tests for the Tity Creations storefront.
//!
//! Each test starts its own storefront on an ephemeral port, backed by the
//! in-memory demo catalog and in-memory sessions, and drives it over HTTP
//! with a cookie-keeping client.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p tity-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, Response, redirect};
use tower_sessions::MemoryStore;

use tity_core::Style;
use tity_storefront::config::StorefrontConfig;
use tity_storefront::db::memory::MemoryProductRepository;
use tity_storefront::middleware::create_session_layer;
use tity_storefront::state::AppState;

/// Distinct client IPs so auth rate limits never leak between tests.
static NEXT_CLIENT: AtomicU8 = AtomicU8::new(1);

/// A running storefront plus a client with its own session.
pub struct TestApp {
    pub base_url: String,
    pub client: Client,
    pub repo: Arc<MemoryProductRepository>,
}

impl TestApp {
    /// Start a storefront over the demo catalog.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound or the client cannot be built.
    pub async fn spawn() -> Self {
        let repo = Arc::new(MemoryProductRepository::with_demo_catalog());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Listener has no address");
        let base_url = format!("http://{addr}");

        let mut config = StorefrontConfig::local(&base_url);
        config.static_dir = concat!(env!("CARGO_MANIFEST_DIR"), "/../storefront/static").into();

        let state = AppState::new(config, repo.clone());
        let app = tity_storefront::app(state, create_session_layer(MemoryStore::default(), false));

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Test server failed");
        });

        Self {
            base_url,
            client: Self::client(),
            repo,
        }
    }

    /// A client that keeps cookies and does not follow redirects.
    fn client() -> Client {
        let ip = NEXT_CLIENT.fetch_add(1, Ordering::Relaxed);
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_str(&format!("203.0.113.{ip}")).expect("Valid header value"),
        );

        Client::builder()
            .cookie_store(true)
            .redirect(redirect::Policy::none())
            .default_headers(headers)
            .build()
            .expect("Failed to create HTTP client")
    }

    /// Start a second, independent session against the same server.
    #[must_use]
    pub fn new_session(&self) -> Self {
        Self {
            base_url: self.base_url.clone(),
            client: Self::client(),
            repo: self.repo.clone(),
        }
    }

    /// GET a path.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(format!("{}{path}", self.base_url))
            .send()
            .await
            .expect("GET request failed")
    }

    /// GET a path and return the body text.
    ///
    /// # Panics
    ///
    /// Panics if the request or body read fails.
    pub async fn get_text(&self, path: &str) -> String {
        self.get(path).await.text().await.expect("Failed to read body")
    }

    /// POST a form to a path.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> Response {
        self.client
            .post(format!("{}{path}", self.base_url))
            .form(form)
            .send()
            .await
            .expect("POST request failed")
    }

    /// Add a product to the persistent cart.
    pub async fn add_to_cart(&self, style: Style, name: &str, quantity: &str) -> Response {
        self.post_form(
            "/cart/add",
            &[("style", style.slug()), ("name", name), ("quantity", quantity)],
        )
        .await
    }

    /// Start a "buy now" purchase.
    pub async fn buy_now(&self, style: Style, name: &str, quantity: &str) -> Response {
        self.post_form(
            "/cart/buy-now",
            &[("style", style.slug()), ("name", name), ("quantity", quantity)],
        )
        .await
    }

    /// Register and log in.
    pub async fn register(&self, username: &str, password: &str) -> Response {
        self.post_form(
            "/auth/register",
            &[
                ("username", username),
                ("password", password),
                ("password_confirm", password),
            ],
        )
        .await
    }

    /// Log in.
    pub async fn login(&self, username: &str, password: &str) -> Response {
        self.post_form(
            "/auth/login",
            &[("username", username), ("password", password)],
        )
        .await
    }
}

/// The `Location` header of a redirect.
///
/// # Panics
///
/// Panics if the response has no valid `Location` header.
#[must_use]
pub fn location(response: &Response) -> String {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .expect("Response has no Location header")
        .to_owned()
}
