mod common;

use reqwest::StatusCode;
use serde_json::{json, Value};

use common::spawn_app;
use yatube::{
    db_helpers::{count_posts_in_db, get_post_by_id_in_db},
    GroupWrapper, MultipleResultsWrapper,
};

#[tokio::test]
async fn admin_api_is_for_staff_only() {
    let app = spawn_app().await;
    let staff = app.create_staff("admin").await;
    let user = app.create_user("regular").await;

    let response = app.guest.get(app.url("/admin/posts/")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .client_for(&user)
        .get(app.url("/admin/posts/"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "errors": { "body": ["Forbidden"] } }));

    let response = app
        .client_for(&staff)
        .get(app.url("/admin/posts/"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn admin_post_list_searches_text_and_marks_empty_groups() {
    let app = spawn_app().await;
    let staff = app.create_staff("admin").await;
    let author = app.create_user("user_author").await;
    app.create_post(&author, "Something about cats", None).await;
    app.create_post(&author, "Something about dogs", None).await;
    let client = app.client_for(&staff);

    let list: MultipleResultsWrapper<Value> = client
        .get(app.url("/admin/posts/"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list.results_count, 2);

    let list: MultipleResultsWrapper<Value> = client
        .get(app.url("/admin/posts/?search=cats"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list.results_count, 1);
    assert_eq!(list.results[0]["text"], "Something about cats");
    assert_eq!(list.results[0]["author"], "user_author");
    assert_eq!(list.results[0]["group"], "-empty-");
}

#[tokio::test]
async fn admin_can_move_and_delete_posts() {
    let app = spawn_app().await;
    let staff = app.create_staff("admin").await;
    let author = app.create_user("user_author").await;
    let group = app.create_group("Test group", "test-slug").await;
    let post = app.create_post(&author, "Test post text", None).await;
    let client = app.client_for(&staff);

    let response = client
        .post(app.url(&format!("/admin/posts/{}/group/", post.id)))
        .json(&json!({ "group": group.id }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["group"], "Test group");
    let moved = get_post_by_id_in_db(&app.pool, post.id).await.unwrap();
    assert_eq!(moved.group_id, Some(group.id));

    let response = client
        .post(app.url(&format!("/admin/posts/{}/group/", post.id)))
        .json(&json!({ "group": 999 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = client
        .delete(app.url(&format!("/admin/posts/{}/", post.id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(count_posts_in_db(&app.pool).await.unwrap(), 0);

    let response = client
        .delete(app.url(&format!("/admin/posts/{}/", post.id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_creates_groups_with_unique_slugs() {
    let app = spawn_app().await;
    let staff = app.create_staff("admin").await;
    let client = app.client_for(&staff);
    let request = json!({ "title": "Cats", "slug": "cats", "description": "" });

    let response = client
        .post(app.url("/admin/groups/"))
        .json(&request)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let GroupWrapper { group } = response.json().await.unwrap();
    assert_eq!(group.slug, "cats");
    assert_eq!(group.description, "-empty-");

    let response = client
        .post(app.url("/admin/groups/"))
        .json(&request)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "errors": { "body": ["Slug already exists"] } }));

    let list: MultipleResultsWrapper<Value> = client
        .get(app.url("/admin/groups/"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list.results_count, 1);

    // The new group has a public page straight away.
    let response = app.guest.get(app.url("/group/cats/")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn admin_lists_comments_and_follows() {
    let app = spawn_app().await;
    let staff = app.create_staff("admin").await;
    let author = app.create_user("user_author").await;
    let reader = app.create_user("reader").await;
    let post = app.create_post(&author, "A post worth discussing", None).await;
    let reader_client = app.client_for(&reader);

    reader_client
        .post(app.url(&format!("/posts/{}/comment/", post.id)))
        .form(&[("text", "First!")])
        .send()
        .await
        .unwrap();
    reader_client
        .get(app.url("/profile/user_author/follow/"))
        .send()
        .await
        .unwrap();

    let client = app.client_for(&staff);
    let comments: MultipleResultsWrapper<Value> = client
        .get(app.url("/admin/comments/"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(comments.results_count, 1);
    assert_eq!(comments.results[0]["author"], "reader");
    assert_eq!(comments.results[0]["post"], "A post worth di");

    let follows: MultipleResultsWrapper<Value> = client
        .get(app.url("/admin/follows/"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(follows.results_count, 1);
    assert_eq!(follows.results[0]["user"], "reader");
    assert_eq!(follows.results[0]["author"], "user_author");
}

#[tokio::test]
async fn admin_can_clear_the_index_cache() {
    let app = spawn_app().await;
    let staff = app.create_staff("admin").await;
    let author = app.create_user("user_author").await;

    let before = app.guest.get(app.url("/")).send().await.unwrap().text().await.unwrap();
    app.create_post(&author, "Fresh post", None).await;

    let response = app
        .client_for(&staff)
        .post(app.url("/admin/cache/clear/"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let after = app.guest.get(app.url("/")).send().await.unwrap().text().await.unwrap();
    assert_ne!(before, after);
    assert!(after.contains("Fresh post"));
}
