use sqlx::SqlitePool;

use crate::{data_formats::CreateGroupRequest, errors::RequestError, models::Group};

pub async fn list_groups_in_db(pool: &SqlitePool) -> Result<Vec<Group>, RequestError> {
    let groups = sqlx::query_as::<_, Group>(
        "SELECT id, title, slug, description FROM posts_group ORDER BY title, id",
    )
    .fetch_all(pool)
    .await?;
    Ok(groups)
}

pub async fn get_group_by_slug(pool: &SqlitePool, slug: &str) -> Result<Group, RequestError> {
    let group = sqlx::query_as::<_, Group>(
        "SELECT id, title, slug, description FROM posts_group WHERE slug = ?1",
    )
    .bind(slug)
    .fetch_optional(pool)
    .await?;
    group.ok_or(RequestError::NotFound)
}

pub async fn create_group_in_db(
    pool: &SqlitePool,
    CreateGroupRequest {
        title,
        slug,
        description,
    }: CreateGroupRequest,
) -> Result<Group, RequestError> {
    let mut tx = pool.begin().await?;
    let group = sqlx::query_as::<_, Group>(
        r#"
        INSERT INTO posts_group (title, slug, description)
        VALUES (?1, ?2, ?3)
        RETURNING id, title, slug, description
        "#,
    )
    .bind(title)
    .bind(slug)
    .bind(description)
    .fetch_one(&mut tx)
    .await?;
    tx.commit().await?;
    tracing::info!("Created group \"{}\" ({})", group, group.slug);
    Ok(group)
}
