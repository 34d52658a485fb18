use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, Multipart, Path, Query},
    http::Uri,
    response::{Html, IntoResponse, Response},
    Extension, Form,
};
use tera::Context;

use crate::{
    authentication::{AuthUser, LoginRedirect, LoginRequired, MaybeUser},
    cache::PageCache,
    data_formats::{CommentCard, CommentForm, PageQuery, PostCard, PostChanges, ProfileResponse},
    db_helpers::{
        add_comment_to_post_in_db, count_feed_in_db, create_post_in_db, feed_page_in_db,
        follow_user_in_db, get_author_or_404, get_comments_for_post_in_db, get_group_by_slug,
        get_post_by_id_in_db, is_following_in_db, list_groups_in_db, unfollow_user_in_db,
        update_post_in_db, Feed,
    },
    errors::RequestError,
    forms::{validate_comment, FormErrors, PostForm},
    media::save_post_image,
    models::{Group, Post, POST_FIELDS},
    paginator::Page,
    templates::Templates,
    AppState,
};

use super::found;

type HtmlResult = Result<Html<String>, RequestError>;

fn profile_url(username: &str) -> String {
    format!("/profile/{}/", urlencoding::encode(username))
}

fn post_url(post_id: i64) -> String {
    format!("/posts/{}/", post_id)
}

fn full_path(uri: &Uri) -> String {
    uri.path_and_query()
        .map(|path| path.as_str().to_owned())
        .unwrap_or_else(|| uri.path().to_owned())
}

/// Post ids come from the path as text so that junk ids are a 404, not a 400.
fn parse_post_id(raw: &str) -> Result<i64, RequestError> {
    raw.parse().map_err(|_| RequestError::NotFound)
}

fn page_context(user: Option<&AuthUser>, page: Page<Post>) -> Context {
    let mut context = Templates::context(user);
    context.insert("page_obj", &page.map(PostCard::from));
    context
}

// ----------------- Feed Handlers -----------------

/// The index is the only cached page.
pub async fn index(
    Extension(state): Extension<Arc<AppState>>,
    maybe_user: MaybeUser,
    uri: Uri,
    Query(PageQuery { page }): Query<PageQuery>,
) -> HtmlResult {
    let key = PageCache::key(&uri, maybe_user.get_id());
    if let Some(body) = state.index_cache.get(&key).await {
        tracing::debug!("Serving {} from the page cache", key);
        return Ok(Html(body.as_ref().clone()));
    }

    let MaybeUser(user) = maybe_user;
    let page = feed_page_in_db(&state.pool, Feed::Index, page.as_deref()).await?;
    let context = page_context(user.as_ref(), page);
    let body = state.templates.render("posts/index.html", &context)?;
    state.index_cache.insert(key, body.clone()).await;
    Ok(Html(body))
}

pub async fn group_posts(
    Extension(state): Extension<Arc<AppState>>,
    MaybeUser(user): MaybeUser,
    Path(slug): Path<String>,
    Query(PageQuery { page }): Query<PageQuery>,
) -> HtmlResult {
    let group = get_group_by_slug(&state.pool, &slug).await?;
    let page = feed_page_in_db(&state.pool, Feed::Group(group.id), page.as_deref()).await?;

    let mut context = page_context(user.as_ref(), page);
    context.insert("group", &group);
    state
        .templates
        .render("posts/group_list.html", &context)
        .map(Html)
}

pub async fn profile(
    Extension(state): Extension<Arc<AppState>>,
    MaybeUser(user): MaybeUser,
    Path(username): Path<String>,
    Query(PageQuery { page }): Query<PageQuery>,
) -> HtmlResult {
    let author = get_author_or_404(&state.pool, &username).await?;
    let page = feed_page_in_db(&state.pool, Feed::Profile(author.id), page.as_deref()).await?;
    let viewer_id = user.as_ref().map(|u| u.id);
    let following = is_following_in_db(&state.pool, viewer_id, author.id).await?;

    let profile = ProfileResponse {
        posts_count: i64::from(page.count),
        following,
        is_self: viewer_id == Some(author.id),
        username: author.username,
    };
    let mut context = page_context(user.as_ref(), page);
    context.insert("author", &profile);
    state
        .templates
        .render("posts/profile.html", &context)
        .map(Html)
}

pub async fn follow_index(
    Extension(state): Extension<Arc<AppState>>,
    LoginRequired(user): LoginRequired,
    Query(PageQuery { page }): Query<PageQuery>,
) -> HtmlResult {
    let page = feed_page_in_db(&state.pool, Feed::Following(user.id), page.as_deref()).await?;
    let context = page_context(Some(&user), page);
    state
        .templates
        .render("posts/follow.html", &context)
        .map(Html)
}

pub async fn post_detail(
    Extension(state): Extension<Arc<AppState>>,
    MaybeUser(user): MaybeUser,
    Path(post_id): Path<String>,
) -> HtmlResult {
    let post = get_post_by_id_in_db(&state.pool, parse_post_id(&post_id)?).await?;
    let comments = get_comments_for_post_in_db(&state.pool, post.id).await?;
    let posts_count = count_feed_in_db(&state.pool, Feed::Profile(post.author_id)).await?;

    let mut context = Templates::context(user.as_ref());
    let is_author = user.as_ref().map(|u| u.id) == Some(post.author_id);
    context.insert("is_author", &is_author);
    context.insert("posts_count", &posts_count);
    context.insert("post", &PostCard::from(post));
    context.insert(
        "comments",
        &comments
            .into_iter()
            .map(CommentCard::from)
            .collect::<Vec<_>>(),
    );
    context.insert("comment_form", &CommentForm::default());
    state
        .templates
        .render("posts/post_detail.html", &context)
        .map(Html)
}

// ----------------- Post Form Handlers -----------------

struct PostFormPage<'a> {
    user: &'a AuthUser,
    text: &'a str,
    group: Option<i64>,
    errors: &'a FormErrors,
    editing: Option<&'a Post>,
}

fn render_post_form(state: &AppState, page: PostFormPage, groups: &[Group]) -> HtmlResult {
    let mut context = Templates::context(Some(page.user));
    context.insert("fields", &POST_FIELDS);
    context.insert("groups", groups);
    context.insert("text", page.text);
    context.insert("selected_group", &page.group);
    context.insert("errors", page.errors);
    context.insert("is_edit", &page.editing.is_some());
    context.insert("post", &page.editing.cloned().map(PostCard::from));
    state
        .templates
        .render("posts/create_post.html", &context)
        .map(Html)
}

async fn store_image(state: &AppState, form: &PostForm) -> Result<Option<String>, RequestError> {
    match &form.image {
        Some(upload) => save_post_image(&state.config.media_root, upload)
            .await
            .map(Some)
            .map_err(|e| {
                tracing::error!("Could not store uploaded image: {:?}", e);
                RequestError::ServerError
            }),
        None => Ok(None),
    }
}

pub async fn post_create_form(
    Extension(state): Extension<Arc<AppState>>,
    LoginRequired(user): LoginRequired,
) -> HtmlResult {
    let groups = list_groups_in_db(&state.pool).await?;
    let page = PostFormPage {
        user: &user,
        text: "",
        group: None,
        errors: &FormErrors::default(),
        editing: None,
    };
    render_post_form(&state, page, &groups)
}

pub async fn post_create(
    Extension(state): Extension<Arc<AppState>>,
    LoginRequired(user): LoginRequired,
    multipart: Multipart,
) -> Result<Response, RequestError> {
    let form = PostForm::from_multipart(multipart).await?;
    let groups = list_groups_in_db(&state.pool).await?;

    let group_id = match form.validate(&groups) {
        Ok(group_id) => group_id,
        Err(errors) => {
            let page = PostFormPage {
                user: &user,
                text: &form.text,
                group: form.group_id(),
                errors: &errors,
                editing: None,
            };
            return render_post_form(&state, page, &groups).map(IntoResponse::into_response);
        }
    };

    let image = store_image(&state, &form).await?;
    let changes = PostChanges {
        text: form.text.trim().to_owned(),
        group_id,
        image,
    };
    create_post_in_db(&state.pool, user.id, changes).await?;
    Ok(found(&profile_url(&user.username)))
}

/// Only the author may edit a post; everybody else is sent to log in.
async fn post_for_editing(
    state: &AppState,
    user: Option<AuthUser>,
    uri: &Uri,
    post_id: &str,
) -> Result<(AuthUser, Post), Response> {
    let user = user.ok_or_else(|| LoginRedirect::new(full_path(uri)).into_response())?;
    let post_id = parse_post_id(post_id).map_err(IntoResponse::into_response)?;
    let post = get_post_by_id_in_db(&state.pool, post_id)
        .await
        .map_err(IntoResponse::into_response)?;
    if post.author_id != user.id {
        tracing::warn!("User {} tried to edit post {}", user.id, post.id);
        return Err(LoginRedirect::new(full_path(uri)).into_response());
    }
    Ok((user, post))
}

pub async fn post_edit_form(
    Extension(state): Extension<Arc<AppState>>,
    MaybeUser(user): MaybeUser,
    uri: Uri,
    Path(post_id): Path<String>,
) -> Result<Response, Response> {
    let (user, post) = post_for_editing(&state, user, &uri, &post_id).await?;
    let groups = list_groups_in_db(&state.pool)
        .await
        .map_err(IntoResponse::into_response)?;
    let page = PostFormPage {
        user: &user,
        text: &post.text,
        group: post.group_id,
        errors: &FormErrors::default(),
        editing: Some(&post),
    };
    render_post_form(&state, page, &groups)
        .map(IntoResponse::into_response)
        .map_err(IntoResponse::into_response)
}

pub async fn post_edit(
    Extension(state): Extension<Arc<AppState>>,
    MaybeUser(user): MaybeUser,
    uri: Uri,
    Path(post_id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, Response> {
    // Access is checked before the body is read.
    let (user, post) = post_for_editing(&state, user, &uri, &post_id).await?;
    let result = async {
        let multipart = multipart.map_err(|e| {
            tracing::warn!("Rejected edit body for post {}: {}", post.id, e);
            RequestError::RunTimeError("Malformed form data")
        })?;
        let form = PostForm::from_multipart(multipart).await?;
        let groups = list_groups_in_db(&state.pool).await?;

        let group_id = match form.validate(&groups) {
            Ok(group_id) => group_id,
            Err(errors) => {
                let page = PostFormPage {
                    user: &user,
                    text: &form.text,
                    group: form.group_id(),
                    errors: &errors,
                    editing: Some(&post),
                };
                return render_post_form(&state, page, &groups).map(IntoResponse::into_response);
            }
        };

        let image = store_image(&state, &form).await?;
        let changes = PostChanges {
            text: form.text.trim().to_owned(),
            group_id,
            image,
        };
        update_post_in_db(&state.pool, user.id, post.id, changes).await?;
        Ok::<_, RequestError>(found(&post_url(post.id)))
    }
    .await;
    result.map_err(IntoResponse::into_response)
}

// ----------------- Comment Handlers -----------------

pub async fn add_comment(
    Extension(state): Extension<Arc<AppState>>,
    LoginRequired(user): LoginRequired,
    Path(post_id): Path<String>,
    Form(form): Form<CommentForm>,
) -> Result<Response, RequestError> {
    let post_id = parse_post_id(&post_id)?;
    match validate_comment(&form) {
        Ok(text) => {
            add_comment_to_post_in_db(&state.pool, user.id, post_id, &text).await?;
        }
        Err(_) => {
            // Nothing to store, but an unknown post is still a 404.
            get_post_by_id_in_db(&state.pool, post_id).await?;
        }
    }
    Ok(found(&post_url(post_id)))
}

/// Comments are only accepted by POST; a GET just goes back to the post.
pub async fn add_comment_redirect(
    Extension(state): Extension<Arc<AppState>>,
    LoginRequired(_user): LoginRequired,
    Path(post_id): Path<String>,
) -> Result<Response, RequestError> {
    let post = get_post_by_id_in_db(&state.pool, parse_post_id(&post_id)?).await?;
    Ok(found(&post_url(post.id)))
}

// ----------------- Follow Handlers -----------------

pub async fn profile_follow(
    Extension(state): Extension<Arc<AppState>>,
    LoginRequired(user): LoginRequired,
    Path(username): Path<String>,
) -> Result<Response, RequestError> {
    let author = get_author_or_404(&state.pool, &username).await?;
    follow_user_in_db(&state.pool, user.id, author.id).await?;
    Ok(found(&profile_url(&author.username)))
}

pub async fn profile_unfollow(
    Extension(state): Extension<Arc<AppState>>,
    LoginRequired(user): LoginRequired,
    Path(username): Path<String>,
) -> Result<Response, RequestError> {
    let author = get_author_or_404(&state.pool, &username).await?;
    unfollow_user_in_db(&state.pool, user.id, author.id).await?;
    Ok(found(&profile_url(&author.username)))
}
