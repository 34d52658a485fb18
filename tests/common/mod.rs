#![allow(dead_code)]

use std::{net::TcpListener, sync::Arc, time::Duration};

use reqwest::{
    header::{HeaderMap, HeaderValue, COOKIE},
    redirect::Policy,
    Client, Response,
};
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use tempfile::TempDir;

use yatube::{
    db_helpers::{create_group_in_db, create_post_in_db, insert_user},
    issue_session_token,
    models::{Group, Post, User},
    run_app, run_migrations, AppState, Config, CreateGroupRequest, NewUser, PostChanges,
    SESSION_COOKIE,
};

pub const JWT_SECRET: &str = "test-secret";

pub const SMALL_GIF: &[u8] = &[
    0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x02, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, 0x00, 0x00,
    0x00, 0xFF, 0xFF, 0xFF, 0x21, 0xF9, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x2C, 0x00, 0x00,
    0x00, 0x00, 0x02, 0x00, 0x01, 0x00, 0x00, 0x02, 0x02, 0x0C, 0x0A, 0x00, 0x3B,
];

pub struct TestApp {
    pub address: String,
    pub state: Arc<AppState>,
    pub pool: SqlitePool,
    /// Anonymous visitor. Redirects are not followed so tests can inspect them.
    pub guest: Client,
    _media: TempDir,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    /// A client that is already signed in as `user`.
    pub fn client_for(&self, user: &User) -> Client {
        let token = issue_session_token(JWT_SECRET, user.id).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("{}={}", SESSION_COOKIE, token)).unwrap(),
        );
        Client::builder()
            .redirect(Policy::none())
            .default_headers(headers)
            .build()
            .unwrap()
    }

    pub async fn create_user(&self, username: &str) -> User {
        self.insert_user(username, false).await
    }

    pub async fn create_staff(&self, username: &str) -> User {
        self.insert_user(username, true).await
    }

    async fn insert_user(&self, username: &str, is_staff: bool) -> User {
        let new_user = NewUser {
            username: username.to_owned(),
            email: format!("{}@example.com", username),
            // Never verified: these users only sign in through minted tokens.
            password: "!".to_owned(),
            is_staff,
        };
        insert_user(&self.pool, &new_user).await.unwrap()
    }

    pub async fn create_group(&self, title: &str, slug: &str) -> Group {
        let request = CreateGroupRequest {
            title: title.to_owned(),
            slug: slug.to_owned(),
            description: "Test description".to_owned(),
        };
        create_group_in_db(&self.pool, request).await.unwrap()
    }

    pub async fn create_post(&self, author: &User, text: &str, group: Option<&Group>) -> Post {
        let changes = PostChanges {
            text: text.to_owned(),
            group_id: group.map(|g| g.id),
            image: None,
        };
        create_post_in_db(&self.pool, author.id, changes)
            .await
            .unwrap()
    }

    pub async fn create_post_with_image(&self, author: &User, text: &str, group: &Group) -> Post {
        let changes = PostChanges {
            text: text.to_owned(),
            group_id: Some(group.id),
            image: Some("posts/small.gif".to_owned()),
        };
        create_post_in_db(&self.pool, author.id, changes)
            .await
            .unwrap()
    }
}

pub async fn spawn_app() -> TestApp {
    let media = tempfile::tempdir().unwrap();

    // One long-lived connection keeps the in-memory database alive.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    run_migrations(&pool).await.unwrap();

    let config = Config {
        database_url: "sqlite::memory:".to_owned(),
        jwt_secret: JWT_SECRET.to_owned(),
        media_root: media.path().to_path_buf(),
        bind_address: "127.0.0.1:0".parse().unwrap(),
        index_cache_ttl: Duration::from_secs(20),
    };
    let state = Arc::new(AppState::new(config, pool.clone()).unwrap());

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let address = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(run_app(state.clone(), listener));

    let guest = Client::builder().redirect(Policy::none()).build().unwrap();
    TestApp {
        address,
        state,
        pool,
        guest,
        _media: media,
    }
}

pub fn location(response: &Response) -> &str {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
}

pub fn template_marker(template: &str) -> String {
    format!(r#"data-template="{}""#, template)
}

pub fn count_post_cards(html: &str) -> usize {
    html.matches(r#"<article class="post">"#).count()
}
