use sqlx::SqlitePool;

use crate::{errors::RequestError, models::Follow};

pub async fn is_following_in_db(
    pool: &SqlitePool,
    user_id: Option<i64>,
    author_id: i64,
) -> Result<bool, RequestError> {
    let user_id = match user_id {
        Some(id) => id,
        None => return Ok(false),
    };
    let result = sqlx::query_as::<_, (i64,)>(
        r#"
        SELECT id FROM posts_follow WHERE user_id = ?1 AND author_id = ?2
        "#,
    )
    .bind(user_id)
    .bind(author_id)
    .fetch_optional(pool)
    .await?;
    Ok(result.is_some())
}

/// Subscribes `user_id` to `author_id`. Following twice or following
/// oneself changes nothing; the return value says whether a row was added.
pub async fn follow_user_in_db(
    pool: &SqlitePool,
    user_id: i64,
    author_id: i64,
) -> Result<bool, RequestError> {
    if user_id == author_id {
        return Ok(false);
    }
    let mut tx = pool.begin().await?;
    let result = sqlx::query(
        r#"
        INSERT OR IGNORE INTO posts_follow (user_id, author_id)
        VALUES (?1, ?2)
        "#,
    )
    .bind(user_id)
    .bind(author_id)
    .execute(&mut tx)
    .await?;
    tx.commit().await?;

    let created = result.rows_affected() > 0;
    if created {
        tracing::info!("User {} now follows {}", user_id, author_id);
    }
    Ok(created)
}

pub async fn unfollow_user_in_db(
    pool: &SqlitePool,
    user_id: i64,
    author_id: i64,
) -> Result<bool, RequestError> {
    let mut tx = pool.begin().await?;
    let result = sqlx::query(
        r#"
        DELETE FROM posts_follow WHERE user_id = ?1 AND author_id = ?2
        "#,
    )
    .bind(user_id)
    .bind(author_id)
    .execute(&mut tx)
    .await?;
    tx.commit().await?;

    let removed = result.rows_affected() > 0;
    if removed {
        tracing::info!("User {} unfollowed {}", user_id, author_id);
    }
    Ok(removed)
}

pub async fn list_follows_in_db(pool: &SqlitePool) -> Result<Vec<Follow>, RequestError> {
    let follows = sqlx::query_as::<_, Follow>(
        r#"
        SELECT posts_follow.id          AS "id",
               posts_follow.user_id     AS "user_id",
               follower.username        AS "user_username",
               posts_follow.author_id   AS "author_id",
               author.username          AS "author_username"
        FROM   posts_follow
            JOIN users AS follower
                ON follower.id = posts_follow.user_id
            JOIN users AS author
                ON author.id = posts_follow.author_id
        ORDER  BY posts_follow.id
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(follows)
}

pub async fn count_follows_in_db(pool: &SqlitePool) -> Result<i64, RequestError> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM posts_follow")
        .fetch_one(pool)
        .await?;
    Ok(count)
}
