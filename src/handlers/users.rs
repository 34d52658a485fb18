use std::sync::Arc;

use axum::{
    extract::Query,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Extension, Form,
};

use crate::{
    authentication::{
        expired_session_cookie, hash_password_argon2, issue_session_token, safe_next_path,
        session_cookie, verify_password_argon2, MaybeUser,
    },
    data_formats::{LoginForm, NewUser, NextQuery, SignupForm},
    db_helpers::{get_user_by_username, insert_user},
    errors::RequestError,
    forms::{validate_signup, FormErrors, NON_FIELD_ERRORS},
    templates::Templates,
    AppState,
};

use super::found_with_cookie;

type HtmlResult = Result<Html<String>, RequestError>;

fn render_login(
    state: &AppState,
    MaybeUser(user): MaybeUser,
    username: &str,
    next: Option<&str>,
    errors: &FormErrors,
) -> HtmlResult {
    let mut context = Templates::context(user.as_ref());
    context.insert("username", username);
    context.insert("next", &next);
    context.insert("errors", errors);
    state.templates.render("users/login.html", &context).map(Html)
}

fn render_signup(
    state: &AppState,
    MaybeUser(user): MaybeUser,
    form: &SignupForm,
    errors: &FormErrors,
) -> HtmlResult {
    let mut context = Templates::context(user.as_ref());
    context.insert("username", &form.username);
    context.insert("email", &form.email);
    context.insert("errors", errors);
    state.templates.render("users/signup.html", &context).map(Html)
}

fn logged_in_redirect(state: &AppState, user_id: i64, next: &str) -> Result<Response, RequestError> {
    let token = issue_session_token(&state.config.jwt_secret, user_id).map_err(|e| {
        tracing::error!("Could not issue a session token: {:?}", e);
        RequestError::ServerError
    })?;
    Ok(found_with_cookie(next, session_cookie(&token)))
}

// ----------------- User Handlers -----------------
pub async fn login_form(
    Extension(state): Extension<Arc<AppState>>,
    maybe_user: MaybeUser,
    Query(NextQuery { next }): Query<NextQuery>,
) -> HtmlResult {
    render_login(
        &state,
        maybe_user,
        "",
        next.as_deref(),
        &FormErrors::default(),
    )
}

pub async fn login_user(
    Extension(state): Extension<Arc<AppState>>,
    maybe_user: MaybeUser,
    Form(form): Form<LoginForm>,
) -> Result<Response, RequestError> {
    let username = form.username.trim();
    let user = get_user_by_username(&state.pool, username).await?;

    let verified = match &user {
        Some(user) => verify_password_argon2(form.password.clone(), &user.password)
            .await
            .map_err(|e| {
                tracing::error!("Password check failed: {:?}", e);
                RequestError::ServerError
            })?,
        None => false,
    };

    match user {
        Some(user) if verified => {
            tracing::info!("User {} logged in", user.username);
            logged_in_redirect(&state, user.id, safe_next_path(form.next.as_deref()))
        }
        _ => {
            let mut errors = FormErrors::default();
            errors.add(
                NON_FIELD_ERRORS,
                "Please enter a correct username and password. Note that both fields may be case-sensitive.",
            );
            render_login(&state, maybe_user, username, form.next.as_deref(), &errors)
                .map(IntoResponse::into_response)
        }
    }
}

pub async fn signup_form(
    Extension(state): Extension<Arc<AppState>>,
    maybe_user: MaybeUser,
) -> HtmlResult {
    render_signup(
        &state,
        maybe_user,
        &SignupForm::default(),
        &FormErrors::default(),
    )
}

pub async fn register_user(
    Extension(state): Extension<Arc<AppState>>,
    maybe_user: MaybeUser,
    Form(form): Form<SignupForm>,
) -> Result<Response, RequestError> {
    let mut errors = validate_signup(&form);
    let username = form.username.trim().to_owned();
    if errors.get("username").is_none()
        && get_user_by_username(&state.pool, &username).await?.is_some()
    {
        errors.add("username", "A user with that username already exists.");
    }
    if !errors.is_empty() {
        return render_signup(&state, maybe_user, &form, &errors).map(IntoResponse::into_response);
    }

    let password = hash_password_argon2(form.password1.clone())
        .await
        .map_err(|e| {
            tracing::error!("Could not hash password: {:?}", e);
            RequestError::ServerError
        })?;
    let new_user = NewUser {
        username,
        email: form.email.trim().to_owned(),
        password,
        is_staff: false,
    };
    let user = match insert_user(&state.pool, &new_user).await {
        Ok(user) => user,
        // Lost a race with another signup for the same name.
        Err(e) if e.is_unique_violation() => {
            errors.add("username", "A user with that username already exists.");
            return render_signup(&state, maybe_user, &form, &errors)
                .map(IntoResponse::into_response);
        }
        Err(e) => return Err(e),
    };

    logged_in_redirect(&state, user.id, "/")
}

pub async fn logout_user(
    Extension(state): Extension<Arc<AppState>>,
    MaybeUser(user): MaybeUser,
) -> Result<Response, RequestError> {
    if let Some(user) = &user {
        tracing::info!("User {} logged out", user.username);
    }
    let body = state
        .templates
        .render("users/logged_out.html", &Templates::context(None))?;
    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, expired_session_cookie())],
        Html(body),
    )
        .into_response())
}
