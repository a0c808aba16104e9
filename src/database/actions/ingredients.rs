use sqlx::{Pool, Postgres};

use crate::{error::QueryError, schema::Ingredient};

pub async fn create_ingredient(
    title: &str,
    dimension: &str,
    pool: &Pool<Postgres>,
) -> Result<Ingredient, potion::Error> {
    let created: Option<Ingredient> = sqlx::query_as(
        "INSERT INTO ingredients (title, dimension) VALUES ($1, $2) ON CONFLICT (title) DO NOTHING RETURNING *",
    )
    .bind(title)
    .bind(dimension)
    .fetch_optional(pool)
    .await
    .map_err(QueryError::from)?;

    if let Some(ingredient) = created {
        log::debug!("> Created ingredient {}", ingredient.title);
        return Ok(ingredient);
    }

    let existing: Ingredient = sqlx::query_as("SELECT * FROM ingredients WHERE title = $1")
        .bind(title)
        .fetch_one(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(existing)
}

pub async fn get_ingredient(
    title: &str,
    pool: &Pool<Postgres>,
) -> Result<Option<Ingredient>, potion::Error> {
    let row: Option<Ingredient> = sqlx::query_as("SELECT * FROM ingredients WHERE title = $1")
        .bind(title)
        .fetch_optional(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(row)
}

pub async fn search_ingredients(
    prefix: &str,
    pool: &Pool<Postgres>,
) -> Result<Vec<Ingredient>, potion::Error> {
    let rows: Vec<Ingredient> =
        sqlx::query_as("SELECT * FROM ingredients WHERE title LIKE $1 ORDER BY title")
            .bind(like_prefix(prefix))
            .fetch_all(pool)
            .await
            .map_err(QueryError::from)?;

    Ok(rows)
}

/// `LIKE` pattern matching titles starting with `prefix` literally.
fn like_prefix(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
