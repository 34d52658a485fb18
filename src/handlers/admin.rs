use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    Extension, Json,
};

use crate::{
    authentication::StaffUser,
    data_formats::{
        AdminCommentResponse, AdminFollowResponse, AdminGroupResponse, AdminPostQuery,
        AdminPostResponse, CreateGroupRequest, GroupWrapper, MultipleResultsWrapper,
        UpdatePostGroupRequest,
    },
    db_helpers::{
        create_group_in_db, delete_post_in_db, list_comments_in_db, list_follows_in_db,
        list_groups_in_db, search_posts_in_db, set_post_group_in_db,
    },
    errors::{RequestError, RequestErrorJsonWrapper},
    AppState,
};

type JsonResult<T> = Result<Json<T>, (StatusCode, Json<RequestErrorJsonWrapper>)>;
type StatusResult = Result<StatusCode, (StatusCode, Json<RequestErrorJsonWrapper>)>;

// ----------------- Post Admin -----------------
pub async fn admin_list_posts(
    Extension(state): Extension<Arc<AppState>>,
    StaffUser(_staff): StaffUser,
    Query(AdminPostQuery { search, pub_date }): Query<AdminPostQuery>,
) -> JsonResult<MultipleResultsWrapper<AdminPostResponse>> {
    let posts = search_posts_in_db(&state.pool, search.as_deref(), pub_date)
        .await
        .map_err(|e| e.to_json_response())?;
    let results = posts.into_iter().map(AdminPostResponse::from).collect();
    Ok(Json(MultipleResultsWrapper::wrap(results)))
}

pub async fn admin_set_post_group(
    Extension(state): Extension<Arc<AppState>>,
    StaffUser(staff): StaffUser,
    Path(post_id): Path<i64>,
    Json(UpdatePostGroupRequest { group }): Json<UpdatePostGroupRequest>,
) -> JsonResult<AdminPostResponse> {
    if let Some(group_id) = group {
        let groups = list_groups_in_db(&state.pool)
            .await
            .map_err(|e| e.to_json_response())?;
        if !groups.iter().any(|g| g.id == group_id) {
            return Err(RequestError::RunTimeError("Group not found").to_json_response());
        }
    }
    let post = set_post_group_in_db(&state.pool, post_id, group)
        .await
        .map_err(|e| e.to_json_response())?;
    tracing::info!("Staff {} moved post {} to group {:?}", staff.username, post_id, group);
    Ok(Json(AdminPostResponse::from(post)))
}

pub async fn admin_delete_post(
    Extension(state): Extension<Arc<AppState>>,
    StaffUser(staff): StaffUser,
    Path(post_id): Path<i64>,
) -> StatusResult {
    delete_post_in_db(&state.pool, post_id)
        .await
        .map_err(|e| e.to_json_response())?;
    tracing::info!("Staff {} deleted post {}", staff.username, post_id);
    Ok(StatusCode::NO_CONTENT)
}

// ----------------- Group Admin -----------------
pub async fn admin_list_groups(
    Extension(state): Extension<Arc<AppState>>,
    StaffUser(_staff): StaffUser,
) -> JsonResult<MultipleResultsWrapper<AdminGroupResponse>> {
    let groups = list_groups_in_db(&state.pool)
        .await
        .map_err(|e| e.to_json_response())?;
    let results = groups.into_iter().map(AdminGroupResponse::from).collect();
    Ok(Json(MultipleResultsWrapper::wrap(results)))
}

pub async fn admin_create_group(
    Extension(state): Extension<Arc<AppState>>,
    StaffUser(_staff): StaffUser,
    Json(request): Json<CreateGroupRequest>,
) -> Result<(StatusCode, Json<GroupWrapper>), (StatusCode, Json<RequestErrorJsonWrapper>)> {
    if request.title.trim().is_empty() || request.slug.trim().is_empty() {
        return Err(RequestError::RunTimeError("Title and slug are required").to_json_response());
    }
    let group = create_group_in_db(&state.pool, request)
        .await
        .map_err(|e| {
            if e.is_unique_violation() {
                return RequestError::RunTimeError("Slug already exists").to_json_response();
            }
            e.to_json_response()
        })?;
    Ok((
        StatusCode::CREATED,
        Json(GroupWrapper {
            group: AdminGroupResponse::from(group),
        }),
    ))
}

// ----------------- Comment & Follow Admin -----------------
pub async fn admin_list_comments(
    Extension(state): Extension<Arc<AppState>>,
    StaffUser(_staff): StaffUser,
) -> JsonResult<MultipleResultsWrapper<AdminCommentResponse>> {
    let comments = list_comments_in_db(&state.pool)
        .await
        .map_err(|e| e.to_json_response())?;
    let results = comments
        .into_iter()
        .map(|(comment, post)| AdminCommentResponse::new(comment, post))
        .collect();
    Ok(Json(MultipleResultsWrapper::wrap(results)))
}

pub async fn admin_list_follows(
    Extension(state): Extension<Arc<AppState>>,
    StaffUser(_staff): StaffUser,
) -> JsonResult<MultipleResultsWrapper<AdminFollowResponse>> {
    let follows = list_follows_in_db(&state.pool)
        .await
        .map_err(|e| e.to_json_response())?;
    let results = follows.into_iter().map(AdminFollowResponse::from).collect();
    Ok(Json(MultipleResultsWrapper::wrap(results)))
}

// ----------------- Cache Admin -----------------
pub async fn admin_clear_cache(
    Extension(state): Extension<Arc<AppState>>,
    StaffUser(staff): StaffUser,
) -> StatusCode {
    state.index_cache.clear();
    tracing::info!("Staff {} cleared the page cache", staff.username);
    StatusCode::NO_CONTENT
}
