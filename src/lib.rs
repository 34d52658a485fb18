mod authentication;
pub mod cache;
pub mod config;
mod data_formats;
pub mod db_helpers;
mod errors;
mod forms;
mod handlers;
mod media;
pub mod models;
pub mod paginator;
mod templates;

use std::{net::TcpListener, sync::Arc};

use anyhow::Context;
pub use anyhow::Result;
use axum::http::StatusCode;
use axum::{routing::*, Extension, Json, Router};
use handlers::*;
use sqlx::{migrate::MigrateDatabase, Sqlite, SqlitePool};
use tower_http::{services::ServeDir, trace::TraceLayer};

pub use authentication::{
    hash_password_argon2, issue_session_token, LOGIN_URL, SESSION_COOKIE,
};
pub use cache::PageCache;
pub use config::Config;
pub use data_formats::*;
pub use errors::RequestError;
pub use templates::Templates;

pub type JsonResponse<T> = (StatusCode, Json<T>);

/// Everything a request handler needs, shared behind an `Arc`.
#[derive(Debug)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Config,
    pub templates: Templates,
    pub index_cache: PageCache,
}

impl AppState {
    pub fn new(config: Config, pool: SqlitePool) -> Result<Self> {
        let templates = Templates::new().context("Failed to compile templates")?;
        let index_cache = PageCache::new(config.index_cache_ttl);
        Ok(AppState {
            pool,
            config,
            templates,
            index_cache,
        })
    }
}

pub async fn run_app(state: Arc<AppState>, listener: TcpListener) -> Result<()> {
    let address = listener.local_addr()?;
    let app = make_app(state);
    tracing::info!("Listening on http://{}", address);
    axum::Server::from_tcp(listener)?
        .serve(app.into_make_service())
        .await?;
    Ok(())
}

pub async fn init_db(db_url: &str) -> Result<SqlitePool> {
    if !Sqlite::database_exists(db_url).await.unwrap_or(false) {
        tracing::info!("Creating database {}", db_url);
        Sqlite::create_database(db_url)
            .await
            .with_context(|| format!("Failed to create database {}", db_url))?;
    } else {
        tracing::info!("Database already exists");
    }
    let pool = SqlitePool::connect(db_url).await?;
    run_migrations(&pool).await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    tracing::info!("Running migrations");
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Migrations completed");
    Ok(())
}

/// The full application: routes, uploaded media, request tracing and state.
pub fn make_app(state: Arc<AppState>) -> Router {
    make_router()
        .nest_service("/media", ServeDir::new(&state.config.media_root))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(state))
}

pub fn make_router() -> Router {
    let admin = Router::new()
        .route("/posts/", get(admin_list_posts))
        .route("/posts/:post_id/", delete(admin_delete_post))
        .route("/posts/:post_id/group/", post(admin_set_post_group))
        .route("/groups/", get(admin_list_groups).post(admin_create_group))
        .route("/comments/", get(admin_list_comments))
        .route("/follows/", get(admin_list_follows))
        .route("/cache/clear/", post(admin_clear_cache));

    Router::new()
        .route("/check_health", get(alive))
        .route("/", get(index))
        .route("/group/:slug/", get(group_posts))
        .route("/profile/:username/", get(profile))
        .route("/profile/:username/follow/", get(profile_follow))
        .route("/profile/:username/unfollow/", get(profile_unfollow))
        .route("/follow/", get(follow_index))
        .route("/create/", get(post_create_form).post(post_create))
        .route("/posts/:post_id/", get(post_detail))
        .route("/posts/:post_id/edit/", get(post_edit_form).post(post_edit))
        .route(
            "/posts/:post_id/comment/",
            get(add_comment_redirect).post(add_comment),
        )
        .route("/about/author/", get(about_author))
        .route("/about/tech/", get(about_tech))
        .route("/auth/signup/", get(signup_form).post(register_user))
        .route("/auth/login/", get(login_form).post(login_user))
        .route("/auth/logout/", get(logout_user))
        .nest("/admin", admin)
        .fallback(not_found)
}
