use sqlx::SqlitePool;

use crate::{
    errors::RequestError,
    models::{Comment, POST_TITLE_CHARS},
};

const COMMENT_QUERY: &str = r#"
            SELECT posts_comment.id          AS "id",
                   posts_comment.post_id     AS "post_id",
                   posts_comment.author_id   AS "author_id",
                   users.username            AS "author_username",
                   posts_comment.text        AS "text",
                   posts_comment.created     AS "created"
            FROM   posts_comment
                JOIN users
                    ON users.id = posts_comment.author_id
"#;

pub async fn add_comment_to_post_in_db(
    pool: &SqlitePool,
    author_id: i64,
    post_id: i64,
    text: &str,
) -> Result<Comment, RequestError> {
    let mut tx = pool.begin().await?;

    let post = sqlx::query_as::<_, (i64,)>("SELECT id FROM posts_post WHERE id = ?1")
        .bind(post_id)
        .fetch_optional(&mut tx)
        .await?;
    if post.is_none() {
        return Err(RequestError::NotFound);
    }

    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO posts_comment (post_id, author_id, text)
        VALUES (?1, ?2, ?3)
        RETURNING id
        "#,
    )
    .bind(post_id)
    .bind(author_id)
    .bind(text)
    .fetch_one(&mut tx)
    .await?;

    let query = format!("{} WHERE posts_comment.id = ?1", COMMENT_QUERY);
    let comment = sqlx::query_as::<_, Comment>(&query)
        .bind(id)
        .fetch_one(&mut tx)
        .await?;
    tx.commit().await?;
    tracing::info!("Comment {} added to post {}", comment.id, post_id);

    Ok(comment)
}

/// Comments of one post, oldest first.
pub async fn get_comments_for_post_in_db(
    pool: &SqlitePool,
    post_id: i64,
) -> Result<Vec<Comment>, RequestError> {
    let query = format!(
        "{} WHERE posts_comment.post_id = ?1 ORDER BY posts_comment.created, posts_comment.id",
        COMMENT_QUERY
    );
    let comments = sqlx::query_as::<_, Comment>(&query)
        .bind(post_id)
        .fetch_all(pool)
        .await?;
    Ok(comments)
}

#[derive(sqlx::FromRow)]
struct CommentWithPost {
    #[sqlx(flatten)]
    comment: Comment,
    post_text: String,
}

/// Every comment with the display text of its post, newest first.
pub async fn list_comments_in_db(
    pool: &SqlitePool,
) -> Result<Vec<(Comment, String)>, RequestError> {
    let query = r#"
            SELECT posts_comment.id          AS "id",
                   posts_comment.post_id     AS "post_id",
                   posts_comment.author_id   AS "author_id",
                   users.username            AS "author_username",
                   posts_comment.text        AS "text",
                   posts_comment.created     AS "created",
                   posts_post.text           AS "post_text"
            FROM   posts_comment
                JOIN users
                    ON users.id = posts_comment.author_id
                JOIN posts_post
                    ON posts_post.id = posts_comment.post_id
            ORDER  BY posts_comment.created DESC, posts_comment.id DESC
    "#;
    let rows = sqlx::query_as::<_, CommentWithPost>(query)
        .fetch_all(pool)
        .await?;
    Ok(rows
        .into_iter()
        .map(|row| {
            let post_title = row.post_text.chars().take(POST_TITLE_CHARS).collect();
            (row.comment, post_title)
        })
        .collect())
}

pub async fn count_comments_in_db(pool: &SqlitePool) -> Result<i64, RequestError> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM posts_comment")
        .fetch_one(pool)
        .await?;
    Ok(count)
}
