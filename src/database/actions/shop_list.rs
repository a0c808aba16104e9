use sqlx::{postgres::PgArguments, query::QueryAs, Pool, Postgres};

use super::recipes::{into_recipes, RECIPE_SELECT};
use crate::{
    error::QueryError,
    identity::{Actor, SessionKey},
    schema::{Id, PurchaseLine, Recipe, RecipeRow},
};

fn owner_column(actor: &Actor) -> &'static str {
    match actor {
        Actor::User(_) => "user_id",
        Actor::Anonymous(_) => "session_key",
    }
}

fn bind_owner<'q, O>(
    query: QueryAs<'q, Postgres, O, PgArguments>,
    actor: &'q Actor,
) -> QueryAs<'q, Postgres, O, PgArguments> {
    match actor {
        Actor::User(user_id) => query.bind(*user_id),
        Actor::Anonymous(key) => query.bind(key.as_str()),
    }
}

pub async fn list_purchases(actor: &Actor, pool: &Pool<Postgres>) -> Result<Vec<Recipe>, potion::Error> {
    let sql = format!(
        "{RECIPE_SELECT} INNER JOIN shop_list s ON s.recipe_id = r.id WHERE s.{} = $1 ORDER BY s.id",
        owner_column(actor)
    );

    let rows: Vec<RecipeRow> = bind_owner(sqlx::query_as(&sql), actor)
        .fetch_all(pool)
        .await
        .map_err(QueryError::from)?;

    into_recipes(rows)
}

/// Every ingredient line of every recipe on the actor's shop list.
pub async fn list_purchase_lines(
    actor: &Actor,
    pool: &Pool<Postgres>,
) -> Result<Vec<PurchaseLine>, potion::Error> {
    let sql = format!(
        "
        SELECT s.recipe_id, l.id AS line_id, i.id AS ingredient_id, i.title, i.dimension, l.amount
        FROM shop_list s
        INNER JOIN recipe_lines rl ON rl.recipe_id = s.recipe_id
        INNER JOIN ingredient_lines l ON l.id = rl.line_id
        INNER JOIN ingredients i ON i.id = l.ingredient_id
        WHERE s.{} = $1
        ORDER BY s.id, l.id
    ",
        owner_column(actor)
    );

    let rows: Vec<PurchaseLine> = bind_owner(sqlx::query_as(&sql), actor)
        .fetch_all(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(rows)
}

/// Hands every row of an anonymous shop list over to `user_id`.
/// Recipes the user already has are dropped from the anonymous list first.
pub async fn transfer_purchases(
    key: &SessionKey,
    user_id: Id,
    pool: &Pool<Postgres>,
) -> Result<u64, potion::Error> {
    let mut tr = pool
        .begin()
        .await
        .map_err(|_| QueryError::new("Could not start transaction".to_owned()))?;

    sqlx::query(
        "
        DELETE FROM shop_list s
        WHERE s.session_key = $1
          AND EXISTS (SELECT 1 FROM shop_list o WHERE o.user_id = $2 AND o.recipe_id = s.recipe_id)
    ",
    )
    .bind(key.as_str())
    .bind(user_id)
    .execute(&mut *tr)
    .await
    .map_err(QueryError::from)?;

    let moved = sqlx::query(
        "UPDATE shop_list SET user_id = $2, session_key = NULL WHERE session_key = $1",
    )
    .bind(key.as_str())
    .bind(user_id)
    .execute(&mut *tr)
    .await
    .map_err(QueryError::from)?;

    tr.commit()
        .await
        .map_err(|_| QueryError::new("Could not commit transaction".to_owned()))?;

    Ok(moved.rows_affected())
}
