use std::sync::Arc;

use axum::{response::Html, Extension};

use crate::{authentication::MaybeUser, errors::RequestError, templates::Templates, AppState};

fn static_page(
    state: &AppState,
    MaybeUser(user): MaybeUser,
    template: &str,
) -> Result<Html<String>, RequestError> {
    let context = Templates::context(user.as_ref());
    state.templates.render(template, &context).map(Html)
}

pub async fn about_author(
    Extension(state): Extension<Arc<AppState>>,
    maybe_user: MaybeUser,
) -> Result<Html<String>, RequestError> {
    static_page(&state, maybe_user, "about/author.html")
}

pub async fn about_tech(
    Extension(state): Extension<Arc<AppState>>,
    maybe_user: MaybeUser,
) -> Result<Html<String>, RequestError> {
    static_page(&state, maybe_user, "about/tech.html")
}
