use sqlx::{postgres::PgArguments, query::Query, Pool, Postgres};

use crate::{
    error::QueryError,
    identity::Actor,
    schema::{AuthorSummary, Id},
    store::Relation,
};

fn insert_query(relation: &Relation) -> Query<'_, Postgres, PgArguments> {
    match relation {
        Relation::Favorite { user_id, recipe_id } => {
            sqlx::query("INSERT INTO favorites (user_id, recipe_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
                .bind(*user_id)
                .bind(*recipe_id)
        }
        Relation::Subscription { user_id, author_id } => {
            sqlx::query("INSERT INTO subscriptions (user_id, author_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
                .bind(*user_id)
                .bind(*author_id)
        }
        Relation::Purchase {
            actor: Actor::User(user_id),
            recipe_id,
        } => sqlx::query("INSERT INTO shop_list (user_id, recipe_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
            .bind(*user_id)
            .bind(*recipe_id),
        Relation::Purchase {
            actor: Actor::Anonymous(key),
            recipe_id,
        } => sqlx::query("INSERT INTO shop_list (session_key, recipe_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
            .bind(key.as_str())
            .bind(*recipe_id),
    }
}

fn delete_query(relation: &Relation) -> Query<'_, Postgres, PgArguments> {
    match relation {
        Relation::Favorite { user_id, recipe_id } => {
            sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND recipe_id = $2")
                .bind(*user_id)
                .bind(*recipe_id)
        }
        Relation::Subscription { user_id, author_id } => {
            sqlx::query("DELETE FROM subscriptions WHERE user_id = $1 AND author_id = $2")
                .bind(*user_id)
                .bind(*author_id)
        }
        Relation::Purchase {
            actor: Actor::User(user_id),
            recipe_id,
        } => sqlx::query("DELETE FROM shop_list WHERE user_id = $1 AND recipe_id = $2")
            .bind(*user_id)
            .bind(*recipe_id),
        Relation::Purchase {
            actor: Actor::Anonymous(key),
            recipe_id,
        } => sqlx::query("DELETE FROM shop_list WHERE session_key = $1 AND recipe_id = $2")
            .bind(key.as_str())
            .bind(*recipe_id),
    }
}

/// Unique constraints make a concurrent duplicate insert affect zero rows.
pub async fn insert_relation(
    relation: &Relation,
    pool: &Pool<Postgres>,
) -> Result<bool, potion::Error> {
    if let Relation::Subscription { user_id, author_id } = relation {
        if user_id == author_id {
            return Ok(false);
        }
    }

    let query = insert_query(relation)
        .execute(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(query.rows_affected() > 0)
}

pub async fn delete_relation(
    relation: &Relation,
    pool: &Pool<Postgres>,
) -> Result<bool, potion::Error> {
    let query = delete_query(relation)
        .execute(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(query.rows_affected() > 0)
}

pub async fn list_favorite_ids(user_id: Id, pool: &Pool<Postgres>) -> Result<Vec<Id>, potion::Error> {
    let rows: Vec<Id> = sqlx::query_scalar("SELECT recipe_id FROM favorites WHERE user_id = $1")
        .bind(user_id)
        .fetch_all(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(rows)
}

pub async fn list_subscription_ids(
    user_id: Id,
    pool: &Pool<Postgres>,
) -> Result<Vec<Id>, potion::Error> {
    let rows: Vec<Id> =
        sqlx::query_scalar("SELECT author_id FROM subscriptions WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(pool)
            .await
            .map_err(QueryError::from)?;

    Ok(rows)
}

pub async fn list_followed_authors(
    user_id: Id,
    pool: &Pool<Postgres>,
) -> Result<Vec<AuthorSummary>, potion::Error> {
    let rows: Vec<AuthorSummary> = sqlx::query_as(
        "
        SELECT u.id, u.username, u.first_name, u.last_name, COUNT(r.id) AS recipe_count
        FROM subscriptions s
        INNER JOIN users u ON u.id = s.author_id
        INNER JOIN recipes r ON r.author_id = u.id
        WHERE s.user_id = $1
        GROUP BY u.id
        ORDER BY u.username
    ",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .map_err(QueryError::from)?;

    Ok(rows)
}
