mod common;

use reqwest::StatusCode;

use common::{count_post_cards, location, spawn_app};
use yatube::db_helpers::{count_follows_in_db, delete_post_in_db, is_following_in_db};

const FIRST_PAGE_POSTS: usize = 10;
const SECOND_PAGE_POSTS: usize = 3;

async fn page_body(client: &reqwest::Client, url: String) -> String {
    let response = client.get(url).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    response.text().await.unwrap()
}

#[tokio::test]
async fn feeds_are_split_into_pages_of_ten() {
    let app = spawn_app().await;
    let author = app.create_user("user_author").await;
    let group = app.create_group("Test group", "test-slug").await;
    for i in 0..(FIRST_PAGE_POSTS + SECOND_PAGE_POSTS) {
        app.create_post(&author, &format!("Post number {}", i), Some(&group))
            .await;
    }

    for path in ["/", "/group/test-slug/", "/profile/user_author/"] {
        let first = page_body(&app.guest, app.url(path)).await;
        assert_eq!(count_post_cards(&first), FIRST_PAGE_POSTS, "{}", path);

        let second = page_body(&app.guest, app.url(&format!("{}?page=2", path))).await;
        assert_eq!(count_post_cards(&second), SECOND_PAGE_POSTS, "{}", path);
    }
}

#[tokio::test]
async fn odd_page_numbers_still_render_a_page() {
    let app = spawn_app().await;
    let author = app.create_user("user_author").await;
    for i in 0..13 {
        app.create_post(&author, &format!("Post number {}", i), None)
            .await;
    }

    let junk = page_body(&app.guest, app.url("/?page=abc")).await;
    assert_eq!(count_post_cards(&junk), FIRST_PAGE_POSTS);

    let past_the_end = page_body(&app.guest, app.url("/?page=99")).await;
    assert_eq!(count_post_cards(&past_the_end), SECOND_PAGE_POSTS);
}

#[tokio::test]
async fn newest_post_comes_first() {
    let app = spawn_app().await;
    let author = app.create_user("user_author").await;
    app.create_post(&author, "Older post", None).await;
    app.create_post(&author, "Newer post", None).await;

    let body = page_body(&app.guest, app.url("/")).await;
    let newer = body.find("Newer post").unwrap();
    let older = body.find("Older post").unwrap();
    assert!(newer < older);
}

#[tokio::test]
async fn group_page_shows_only_that_group() {
    let app = spawn_app().await;
    let author = app.create_user("user_author").await;
    let group = app.create_group("Test group", "test-slug").await;
    let other = app.create_group("Other group", "other-slug").await;
    app.create_post(&author, "Post in the test group", Some(&group))
        .await;
    app.create_post(&author, "Post in the other group", Some(&other))
        .await;

    let body = page_body(&app.guest, app.url("/group/test-slug/")).await;
    assert!(body.contains("Test group"));
    assert!(body.contains("Test description"));
    assert!(body.contains("Post in the test group"));
    assert!(!body.contains("Post in the other group"));
    assert_eq!(count_post_cards(&body), 1);
}

#[tokio::test]
async fn pages_show_the_post_image() {
    let app = spawn_app().await;
    let author = app.create_user("user_author").await;
    let group = app.create_group("Test group", "test-slug").await;
    let post = app
        .create_post_with_image(&author, "Post with a picture", &group)
        .await;

    for path in [
        "/".to_owned(),
        "/group/test-slug/".to_owned(),
        "/profile/user_author/".to_owned(),
        format!("/posts/{}/", post.id),
    ] {
        let body = page_body(&app.guest, app.url(&path)).await;
        assert!(body.contains(r#"<img class="post-image""#), "{}", path);
        assert!(body.contains("small.gif"), "{}", path);
    }
}

#[tokio::test]
async fn profile_and_detail_show_post_counts() {
    let app = spawn_app().await;
    let author = app.create_user("user_author").await;
    let post = app.create_post(&author, "First post", None).await;
    app.create_post(&author, "Second post", None).await;

    let profile = page_body(&app.guest, app.url("/profile/user_author/")).await;
    assert!(profile.contains("Posts: 2"));

    let detail = page_body(&app.guest, app.url(&format!("/posts/{}/", post.id))).await;
    assert!(detail.contains(r#"<span class="posts-count">2</span>"#));
    assert!(detail.contains("First post"));
}

#[tokio::test]
async fn following_adds_and_removes_authors() {
    let app = spawn_app().await;
    let author = app.create_user("user_author").await;
    let follower = app.create_user("follower").await;
    let client = app.client_for(&follower);

    let response = client
        .get(app.url("/profile/user_author/follow/"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/profile/user_author/");
    assert_eq!(count_follows_in_db(&app.pool).await.unwrap(), 1);
    assert!(is_following_in_db(&app.pool, Some(follower.id), author.id)
        .await
        .unwrap());

    // Following twice does not add a second row.
    client
        .get(app.url("/profile/user_author/follow/"))
        .send()
        .await
        .unwrap();
    assert_eq!(count_follows_in_db(&app.pool).await.unwrap(), 1);

    let response = client
        .get(app.url("/profile/user_author/unfollow/"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(count_follows_in_db(&app.pool).await.unwrap(), 0);
}

#[tokio::test]
async fn users_cannot_follow_themselves() {
    let app = spawn_app().await;
    let author = app.create_user("user_author").await;

    let response = app
        .client_for(&author)
        .get(app.url("/profile/user_author/follow/"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(count_follows_in_db(&app.pool).await.unwrap(), 0);
}

#[tokio::test]
async fn follow_feed_shows_only_followed_authors() {
    let app = spawn_app().await;
    let author = app.create_user("user_author").await;
    let follower = app.create_user("follower").await;
    let stranger = app.create_user("stranger").await;
    let follower_client = app.client_for(&follower);

    follower_client
        .get(app.url("/profile/user_author/follow/"))
        .send()
        .await
        .unwrap();
    let before = count_post_cards(&page_body(&follower_client, app.url("/follow/")).await);

    app.create_post(&stranger, "Post nobody follows", None).await;
    let feed = page_body(&follower_client, app.url("/follow/")).await;
    assert_eq!(count_post_cards(&feed), before);
    assert!(!feed.contains("Post nobody follows"));

    app.create_post(&author, "Post for the followers", None)
        .await;
    let feed = page_body(&follower_client, app.url("/follow/")).await;
    assert_eq!(count_post_cards(&feed), before + 1);
    assert!(feed.contains("Post for the followers"));
}

#[tokio::test]
async fn profile_offers_follow_only_to_other_users() {
    let app = spawn_app().await;
    let author = app.create_user("user_author").await;
    let follower = app.create_user("follower").await;

    let own = page_body(&app.client_for(&author), app.url("/profile/user_author/")).await;
    assert!(!own.contains(r#"class="btn follow""#));

    let other = page_body(&app.client_for(&follower), app.url("/profile/user_author/")).await;
    assert!(other.contains(r#"class="btn follow""#));

    let guest = page_body(&app.guest, app.url("/profile/user_author/")).await;
    assert!(!guest.contains(r#"class="btn follow""#));
}

#[tokio::test]
async fn index_is_served_from_cache_until_cleared() {
    let app = spawn_app().await;
    let author = app.create_user("user_author").await;
    app.create_post(&author, "Cached post", None).await;

    let first = page_body(&app.guest, app.url("/")).await;
    app.create_post(&author, "Post written after caching", None)
        .await;
    let second = page_body(&app.guest, app.url("/")).await;
    assert_eq!(first, second);

    app.state.index_cache.clear();
    let third = page_body(&app.guest, app.url("/")).await;
    assert_ne!(first, third);
    assert!(third.contains("Post written after caching"));
}

#[tokio::test]
async fn cached_index_outlives_a_deleted_post() {
    let app = spawn_app().await;
    let author = app.create_user("user_author").await;
    let post = app.create_post(&author, "Soon to be deleted", None).await;

    let first = page_body(&app.guest, app.url("/")).await;
    assert!(first.contains("Soon to be deleted"));

    delete_post_in_db(&app.pool, post.id).await.unwrap();
    let second = page_body(&app.guest, app.url("/")).await;
    assert_eq!(first, second);

    app.state.index_cache.clear();
    let third = page_body(&app.guest, app.url("/")).await;
    assert!(!third.contains("Soon to be deleted"));
}
