use potion::HtmlError;
use redis::aio::MultiplexedConnection;

use crate::{
    cache::cache::{get_or_search, invalidate_ingredient_cache},
    database::store::RelationStore,
    jwt::SessionData,
    permissions::ActionType,
    schema::{Ingredient, IngredientHint},
    INGREDIENT_QUERY_MIN_LEN,
};

/// Shorter queries are answered with an empty list without touching storage.
pub fn is_searchable(query: &str) -> bool {
    query.chars().count() >= INGREDIENT_QUERY_MIN_LEN
}

pub async fn search_ingredients<S: RelationStore + ?Sized>(
    query: &str,
    store: &S,
) -> Result<Vec<IngredientHint>, potion::Error> {
    if !is_searchable(query) {
        return Ok(vec![]);
    }

    let rows = store.search_ingredients(query).await?;
    Ok(rows.into_iter().map(IngredientHint::from).collect())
}

/// Same as [`search_ingredients`], served from the cache when one is configured.
/// A failing cache falls back to storage.
pub async fn search_ingredients_cached<S: RelationStore + ?Sized>(
    query: &str,
    store: &S,
    cache: Option<&mut MultiplexedConnection>,
) -> Result<Vec<IngredientHint>, potion::Error> {
    let Some(cache) = cache else {
        return search_ingredients(query, store).await;
    };
    if !is_searchable(query) {
        return Ok(vec![]);
    }

    match get_or_search(query, cache, || search_ingredients(query, store)).await {
        Ok(rows) => Ok(rows),
        Err(e) => {
            log::error!("Ingredient cache unavailable: {e:?}");
            search_ingredients(query, store).await
        }
    }
}

pub async fn create_ingredient<S: RelationStore + ?Sized>(
    session: &SessionData,
    title: &str,
    dimension: &str,
    store: &S,
    cache: Option<&mut MultiplexedConnection>,
) -> Result<Ingredient, potion::Error> {
    session.authenticate(ActionType::ManageIngredients)?;

    let (title, dimension) = (title.trim(), dimension.trim());
    if title.is_empty() || dimension.is_empty() {
        return Err(HtmlError::InvalidRequest.new("Title and dimension are required"));
    }

    let ingredient = store.create_ingredient(title, dimension).await?;

    if let Some(cache) = cache {
        if let Err(e) = invalidate_ingredient_cache(cache).await {
            log::error!("Failed to invalidate ingredient cache: {e:?}");
        }
    }
    Ok(ingredient)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{memory::MemoryStore, schema::UserRole};

    fn admin() -> SessionData {
        SessionData {
            user_id: 1,
            username: "admin".to_string(),
            role: UserRole::Admin,
            is_admin: true,
        }
    }

    #[tokio::test]
    async fn short_queries_return_nothing() {
        let store = MemoryStore::new();
        store.create_ingredient("Сахар", "г.").await.unwrap();

        assert!(search_ingredients("Са", &store).await.unwrap().is_empty());
        assert_eq!(
            search_ingredients("Сах", &store).await.unwrap(),
            vec![IngredientHint {
                title: "Сахар".to_string(),
                dimension: "г.".to_string()
            }]
        );
        assert!(search_ingredients("сах", &store).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn only_admins_create_ingredients() {
        let store = MemoryStore::new();
        let user = SessionData {
            role: UserRole::User,
            is_admin: false,
            ..admin()
        };

        assert!(create_ingredient(&user, "Соль", "г.", &store, None).await.is_err());
        let salt = create_ingredient(&admin(), "Соль", "г.", &store, None).await.unwrap();
        let again = create_ingredient(&admin(), "Соль", "кг.", &store, None).await.unwrap();
        assert_eq!(salt, again);
    }
}
