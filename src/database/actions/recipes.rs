use sqlx::{Pool, Postgres, QueryBuilder, Transaction};

use crate::{
    error::{not_found, QueryError},
    filter::{RecipeQuery, Scope},
    schema::{Id, IngredientLine, Recipe, RecipeDraft, RecipeRow, ResolvedLine},
};

/// Recipe columns joined with the author's username and the recipe's tag set.
pub(super) const RECIPE_SELECT: &str = "
    SELECT r.id, r.author_id, u.username AS author_username, r.title, r.slug, r.text,
           r.image, r.cooking_time, r.pub_date,
           ARRAY(SELECT t.tag FROM recipe_tags t WHERE t.recipe_id = r.id) AS tags
    FROM recipes r
    INNER JOIN users u ON u.id = r.author_id";

pub(super) fn into_recipes(rows: Vec<RecipeRow>) -> Result<Vec<Recipe>, potion::Error> {
    Ok(rows
        .into_iter()
        .map(Recipe::try_from)
        .collect::<Result<Vec<Recipe>, _>>()?)
}

/// Rewrites the tag set and ingredient lines of `recipe_id`.
async fn write_composition(
    recipe_id: Id,
    draft: &RecipeDraft,
    lines: &[ResolvedLine],
    tr: &mut Transaction<'_, Postgres>,
) -> Result<(), potion::Error> {
    sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut **tr)
        .await
        .map_err(QueryError::from)?;

    sqlx::query("DELETE FROM recipe_lines WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut **tr)
        .await
        .map_err(QueryError::from)?;

    if !draft.tags.is_empty() {
        let mut query_builder: QueryBuilder<Postgres> =
            QueryBuilder::new("INSERT INTO recipe_tags (recipe_id, tag) ");
        query_builder.push_values(draft.tags.iter(), |mut b, tag| {
            b.push_bind(recipe_id).push_bind(tag.as_str());
        });
        query_builder.push(" ON CONFLICT DO NOTHING");

        query_builder
            .build()
            .execute(&mut **tr)
            .await
            .map_err(QueryError::from)?;
    }

    for line in lines {
        // Lines are shared between recipes, keyed by (ingredient, amount).
        let line_id: Id = sqlx::query_scalar(
            "
            INSERT INTO ingredient_lines (ingredient_id, amount) VALUES ($1, $2)
            ON CONFLICT (ingredient_id, amount) DO UPDATE SET amount = EXCLUDED.amount
            RETURNING id
        ",
        )
        .bind(line.ingredient_id)
        .bind(line.amount)
        .fetch_one(&mut **tr)
        .await
        .map_err(QueryError::from)?;

        sqlx::query("INSERT INTO recipe_lines (recipe_id, line_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
            .bind(recipe_id)
            .bind(line_id)
            .execute(&mut **tr)
            .await
            .map_err(QueryError::from)?;
    }

    Ok(())
}

pub async fn insert_recipe(
    author_id: Id,
    slug: &str,
    draft: &RecipeDraft,
    lines: &[ResolvedLine],
    pool: &Pool<Postgres>,
) -> Result<Recipe, potion::Error> {
    let mut tr = pool
        .begin()
        .await
        .map_err(|_| QueryError::new("Could not start transaction".to_owned()))?;

    let id: Id = sqlx::query_scalar(
        "
        INSERT INTO recipes (author_id, title, slug, text, image, cooking_time)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id
    ",
    )
    .bind(author_id)
    .bind(&draft.title)
    .bind(slug)
    .bind(&draft.text)
    .bind(&draft.image)
    .bind(draft.cooking_time)
    .fetch_one(&mut *tr)
    .await
    .map_err(QueryError::from)?;

    write_composition(id, draft, lines, &mut tr).await?;

    tr.commit()
        .await
        .map_err(|_| QueryError::new("Could not commit transaction".to_owned()))?;

    get_recipe(id, pool)
        .await?
        .ok_or_else(|| not_found("Recipe not found"))
}

pub async fn update_recipe(
    id: Id,
    draft: &RecipeDraft,
    lines: &[ResolvedLine],
    pool: &Pool<Postgres>,
) -> Result<Recipe, potion::Error> {
    let mut tr = pool
        .begin()
        .await
        .map_err(|_| QueryError::new("Could not start transaction".to_owned()))?;

    let updated = sqlx::query(
        "UPDATE recipes SET title = $2, text = $3, image = $4, cooking_time = $5 WHERE id = $1",
    )
    .bind(id)
    .bind(&draft.title)
    .bind(&draft.text)
    .bind(&draft.image)
    .bind(draft.cooking_time)
    .execute(&mut *tr)
    .await
    .map_err(QueryError::from)?;

    if updated.rows_affected() == 0 {
        return Err(not_found("Recipe not found"));
    }

    write_composition(id, draft, lines, &mut tr).await?;

    tr.commit()
        .await
        .map_err(|_| QueryError::new("Could not commit transaction".to_owned()))?;

    get_recipe(id, pool)
        .await?
        .ok_or_else(|| not_found("Recipe not found"))
}

/// Tags, line joins, favorites and shop list rows go with the recipe through `ON DELETE CASCADE`.
pub async fn delete_recipe(id: Id, pool: &Pool<Postgres>) -> Result<bool, potion::Error> {
    let query = sqlx::query("DELETE FROM recipes WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(query.rows_affected() > 0)
}

pub async fn get_recipe(id: Id, pool: &Pool<Postgres>) -> Result<Option<Recipe>, potion::Error> {
    let row: Option<RecipeRow> = sqlx::query_as(&format!("{RECIPE_SELECT} WHERE r.id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(row.map(Recipe::try_from).transpose()?)
}

pub async fn get_recipe_by_slug(
    slug: &str,
    pool: &Pool<Postgres>,
) -> Result<Option<Recipe>, potion::Error> {
    let row: Option<RecipeRow> = sqlx::query_as(&format!("{RECIPE_SELECT} WHERE r.slug = $1"))
        .bind(slug)
        .fetch_optional(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(row.map(Recipe::try_from).transpose()?)
}

pub async fn get_recipe_lines(
    recipe_id: Id,
    pool: &Pool<Postgres>,
) -> Result<Vec<IngredientLine>, potion::Error> {
    let rows: Vec<IngredientLine> = sqlx::query_as(
        "
        SELECT l.id AS line_id, i.id AS ingredient_id, i.title, i.dimension, l.amount
        FROM recipe_lines rl
        INNER JOIN ingredient_lines l ON l.id = rl.line_id
        INNER JOIN ingredients i ON i.id = l.ingredient_id
        WHERE rl.recipe_id = $1
        ORDER BY l.id
    ",
    )
    .bind(recipe_id)
    .fetch_all(pool)
    .await
    .map_err(QueryError::from)?;

    Ok(rows)
}

/// Appends the scope and tag predicates of `query` to a statement over `recipes r` joined with `users u`.
fn push_filter<'a>(query_builder: &mut QueryBuilder<'a, Postgres>, query: &'a RecipeQuery) {
    query_builder.push(" WHERE TRUE");

    match &query.scope {
        Scope::Global => {}
        Scope::ByAuthor(username) => {
            query_builder
                .push(" AND u.username = ")
                .push_bind(username.as_str());
        }
        Scope::Favorites(user_id) => {
            query_builder
                .push(" AND EXISTS (SELECT 1 FROM favorites f WHERE f.recipe_id = r.id AND f.user_id = ")
                .push_bind(*user_id)
                .push(")");
        }
    }

    if query.is_filtered() {
        let tags: Vec<String> = query.tags.iter().map(|t| t.as_str().to_string()).collect();
        query_builder
            .push(" AND EXISTS (SELECT 1 FROM recipe_tags t WHERE t.recipe_id = r.id AND t.tag = ANY(")
            .push_bind(tags)
            .push("))");
    }
}

pub async fn count_recipes(query: &RecipeQuery, pool: &Pool<Postgres>) -> Result<i64, potion::Error> {
    let mut query_builder: QueryBuilder<Postgres> = QueryBuilder::new(
        "SELECT COUNT(*) FROM recipes r INNER JOIN users u ON u.id = r.author_id",
    );
    push_filter(&mut query_builder, query);

    let count: i64 = query_builder
        .build_query_scalar()
        .fetch_one(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(count)
}

pub async fn fetch_recipes(
    query: &RecipeQuery,
    limit: i64,
    offset: i64,
    pool: &Pool<Postgres>,
) -> Result<Vec<Recipe>, potion::Error> {
    let mut query_builder: QueryBuilder<Postgres> = QueryBuilder::new(RECIPE_SELECT);
    push_filter(&mut query_builder, query);
    query_builder
        .push(" ORDER BY r.pub_date DESC, r.id DESC LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);

    let rows: Vec<RecipeRow> = query_builder
        .build_query_as()
        .fetch_all(pool)
        .await
        .map_err(QueryError::from)?;

    into_recipes(rows)
}
