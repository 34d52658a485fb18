use sqlx::SqlitePool;

use crate::{data_formats::NewUser, errors::RequestError, models::User};

pub async fn insert_user(pool: &SqlitePool, user: &NewUser) -> Result<User, RequestError> {
    let mut tx = pool.begin().await?;
    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (username, email, password, is_staff)
        VALUES (?1, ?2, ?3, ?4)
        RETURNING id, username, email, password, is_staff, created_at
        "#,
    )
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.password)
    .bind(user.is_staff)
    .fetch_one(&mut tx)
    .await?;
    tx.commit().await?;
    tracing::info!("Registered user {}", user.username);
    Ok(user)
}

/// Grants or revokes staff rights. Returns false when no such user exists.
pub async fn set_staff_in_db(
    pool: &SqlitePool,
    username: &str,
    is_staff: bool,
) -> Result<bool, RequestError> {
    let mut tx = pool.begin().await?;
    let result = sqlx::query("UPDATE users SET is_staff = ?1 WHERE username = ?2")
        .bind(is_staff)
        .bind(username)
        .execute(&mut tx)
        .await?;
    tx.commit().await?;
    Ok(result.rows_affected() > 0)
}
