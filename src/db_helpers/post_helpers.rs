use chrono::NaiveDate;
use sqlx::SqlitePool;

use crate::{
    data_formats::PostChanges,
    errors::RequestError,
    models::Post,
    paginator::{Page, PageWindow, POSTS_PER_PAGE},
};

const POST_QUERY: &str = r#"
            SELECT posts_post.id          AS "id",
                   posts_post.text        AS "text",
                   posts_post.pub_date    AS "pub_date",
                   posts_post.image       AS "image",
                   posts_post.author_id   AS "author_id",
                   users.username         AS "author_username",
                   posts_post.group_id    AS "group_id",
                   posts_group.title      AS "group_title",
                   posts_group.slug       AS "group_slug"
            FROM   posts_post
                JOIN users
                    ON users.id = posts_post.author_id
                LEFT JOIN posts_group
                    ON posts_group.id = posts_post.group_id
"#;

// ?1 group, ?2 author, ?3 follower; a NULL parameter disables its filter.
const FEED_FILTER: &str = r#"
            WHERE  ( posts_post.group_id = ?1
                        OR ?1 IS NULL )
                AND ( posts_post.author_id = ?2
                        OR ?2 IS NULL )
                AND ( posts_post.author_id IN (SELECT posts_follow.author_id
                                               FROM   posts_follow
                                               WHERE  posts_follow.user_id = ?3)
                        OR ?3 IS NULL )
"#;

const NEWEST_FIRST: &str = " ORDER BY posts_post.pub_date DESC, posts_post.id DESC ";

/// The lists of posts the site shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feed {
    Index,
    Group(i64),
    Profile(i64),
    /// Posts by the authors this user follows.
    Following(i64),
}

impl Feed {
    fn params(self) -> (Option<i64>, Option<i64>, Option<i64>) {
        match self {
            Feed::Index => (None, None, None),
            Feed::Group(group_id) => (Some(group_id), None, None),
            Feed::Profile(author_id) => (None, Some(author_id), None),
            Feed::Following(user_id) => (None, None, Some(user_id)),
        }
    }
}

pub async fn count_feed_in_db(pool: &SqlitePool, feed: Feed) -> Result<i64, RequestError> {
    let (group, author, follower) = feed.params();
    let query = format!("SELECT COUNT(*) FROM posts_post {}", FEED_FILTER);
    let (count,): (i64,) = sqlx::query_as(&query)
        .bind(group)
        .bind(author)
        .bind(follower)
        .fetch_one(pool)
        .await?;
    Ok(count)
}

pub async fn list_feed_in_db(
    pool: &SqlitePool,
    feed: Feed,
    limit: u32,
    offset: u32,
) -> Result<Vec<Post>, RequestError> {
    let (group, author, follower) = feed.params();
    let query = format!(
        "{} {} {} LIMIT ?4 OFFSET ?5",
        POST_QUERY, FEED_FILTER, NEWEST_FIRST
    );
    let posts = sqlx::query_as::<_, Post>(&query)
        .bind(group)
        .bind(author)
        .bind(follower)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;
    Ok(posts)
}

/// One page of a feed, newest post first.
pub async fn feed_page_in_db(
    pool: &SqlitePool,
    feed: Feed,
    requested_page: Option<&str>,
) -> Result<Page<Post>, RequestError> {
    let count = count_feed_in_db(pool, feed).await?;
    let window = PageWindow::new(
        u32::try_from(count).unwrap_or(u32::MAX),
        POSTS_PER_PAGE,
        requested_page,
    );
    let posts = list_feed_in_db(pool, feed, window.limit(), window.offset()).await?;
    Ok(window.into_page(posts))
}

pub async fn get_post_by_id_in_db(pool: &SqlitePool, id: i64) -> Result<Post, RequestError> {
    let query = format!("{} WHERE posts_post.id = ?1", POST_QUERY);
    let post = sqlx::query_as::<_, Post>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    post.ok_or(RequestError::NotFound)
}

pub async fn create_post_in_db(
    pool: &SqlitePool,
    author_id: i64,
    PostChanges {
        text,
        group_id,
        image,
    }: PostChanges,
) -> Result<Post, RequestError> {
    let mut tx = pool.begin().await?;
    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO posts_post (text, author_id, group_id, image)
        VALUES (?1, ?2, ?3, ?4)
        RETURNING id
        "#,
    )
    .bind(text)
    .bind(author_id)
    .bind(group_id)
    .bind(image)
    .fetch_one(&mut tx)
    .await?;
    tx.commit().await?;
    tracing::info!("Post {} created by user {}", id, author_id);

    get_post_by_id_in_db(pool, id).await
}

/// Rewrites a post in place. A `None` image keeps the current one.
/// Only the author may edit; anyone else gets `Forbidden`.
pub async fn update_post_in_db(
    pool: &SqlitePool,
    author_id: i64,
    post_id: i64,
    PostChanges {
        text,
        group_id,
        image,
    }: PostChanges,
) -> Result<Post, RequestError> {
    let mut tx = pool.begin().await?;
    let result = sqlx::query(
        r#"
        UPDATE posts_post
        SET    text = ?1,
               group_id = ?2,
               image = COALESCE(?3, image)
        WHERE  id = ?4 AND author_id = ?5
        "#,
    )
    .bind(text)
    .bind(group_id)
    .bind(image)
    .bind(post_id)
    .bind(author_id)
    .execute(&mut tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(RequestError::Forbidden);
    }
    tx.commit().await?;
    tracing::info!("Post {} edited", post_id);

    get_post_by_id_in_db(pool, post_id).await
}

pub async fn delete_post_in_db(pool: &SqlitePool, post_id: i64) -> Result<(), RequestError> {
    let mut tx = pool.begin().await?;
    let result = sqlx::query("DELETE FROM posts_post WHERE id = ?1")
        .bind(post_id)
        .execute(&mut tx)
        .await?;
    if result.rows_affected() == 0 {
        return Err(RequestError::NotFound);
    }
    tx.commit().await?;
    tracing::info!("Post {} deleted", post_id);
    Ok(())
}

pub async fn set_post_group_in_db(
    pool: &SqlitePool,
    post_id: i64,
    group_id: Option<i64>,
) -> Result<Post, RequestError> {
    let mut tx = pool.begin().await?;
    let result = sqlx::query("UPDATE posts_post SET group_id = ?1 WHERE id = ?2")
        .bind(group_id)
        .bind(post_id)
        .execute(&mut tx)
        .await?;
    if result.rows_affected() == 0 {
        return Err(RequestError::NotFound);
    }
    tx.commit().await?;
    get_post_by_id_in_db(pool, post_id).await
}

pub async fn count_posts_in_db(pool: &SqlitePool) -> Result<i64, RequestError> {
    count_feed_in_db(pool, Feed::Index).await
}

/// Admin listing: text search and publication-day filter, newest first.
pub async fn search_posts_in_db(
    pool: &SqlitePool,
    search: Option<&str>,
    pub_date: Option<NaiveDate>,
) -> Result<Vec<Post>, RequestError> {
    let query = format!(
        r#"{}
            WHERE  ( posts_post.text LIKE '%' || ?1 || '%'
                        OR ?1 IS NULL )
                AND ( date(posts_post.pub_date) = ?2
                        OR ?2 IS NULL )
            {}"#,
        POST_QUERY, NEWEST_FIRST
    );
    let posts = sqlx::query_as::<_, Post>(&query)
        .bind(search.filter(|term| !term.is_empty()))
        .bind(pub_date.map(|date| date.format("%Y-%m-%d").to_string()))
        .fetch_all(pool)
        .await?;
    Ok(posts)
}
