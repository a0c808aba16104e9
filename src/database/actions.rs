pub mod ingredients;
pub mod recipes;
pub mod relations;
pub mod shop_list;
pub mod users;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use super::store::{Relation, RelationStore};
use crate::{
    filter::RecipeQuery,
    identity::{Actor, SessionKey},
    schema::{
        AuthorSummary, Id, Ingredient, IngredientLine, NewUser, PurchaseLine, Recipe,
        RecipeDraft, ResolvedLine, User,
    },
};

#[async_trait]
impl RelationStore for Pool<Postgres> {
    async fn create_user(&self, user: &NewUser) -> Result<Option<User>, potion::Error> {
        users::register_user(user, self).await
    }

    async fn get_user(&self, id: Id) -> Result<Option<User>, potion::Error> {
        users::get_user_by_id(self, id).await
    }

    async fn find_user(&self, username: &str) -> Result<Option<User>, potion::Error> {
        users::get_user(self, username).await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, potion::Error> {
        users::get_user_by_email(self, email).await
    }

    async fn create_ingredient(
        &self,
        title: &str,
        dimension: &str,
    ) -> Result<Ingredient, potion::Error> {
        ingredients::create_ingredient(title, dimension, self).await
    }

    async fn find_ingredient(&self, title: &str) -> Result<Option<Ingredient>, potion::Error> {
        ingredients::get_ingredient(title, self).await
    }

    async fn search_ingredients(&self, prefix: &str) -> Result<Vec<Ingredient>, potion::Error> {
        ingredients::search_ingredients(prefix, self).await
    }

    async fn insert_recipe(
        &self,
        author_id: Id,
        slug: &str,
        draft: &RecipeDraft,
        lines: &[ResolvedLine],
    ) -> Result<Recipe, potion::Error> {
        recipes::insert_recipe(author_id, slug, draft, lines, self).await
    }

    async fn update_recipe(
        &self,
        id: Id,
        draft: &RecipeDraft,
        lines: &[ResolvedLine],
    ) -> Result<Recipe, potion::Error> {
        recipes::update_recipe(id, draft, lines, self).await
    }

    async fn delete_recipe(&self, id: Id) -> Result<bool, potion::Error> {
        recipes::delete_recipe(id, self).await
    }

    async fn get_recipe(&self, id: Id) -> Result<Option<Recipe>, potion::Error> {
        recipes::get_recipe(id, self).await
    }

    async fn get_recipe_by_slug(&self, slug: &str) -> Result<Option<Recipe>, potion::Error> {
        recipes::get_recipe_by_slug(slug, self).await
    }

    async fn recipe_lines(&self, recipe_id: Id) -> Result<Vec<IngredientLine>, potion::Error> {
        recipes::get_recipe_lines(recipe_id, self).await
    }

    async fn count_recipes(&self, query: &RecipeQuery) -> Result<i64, potion::Error> {
        recipes::count_recipes(query, self).await
    }

    async fn fetch_recipes(
        &self,
        query: &RecipeQuery,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Recipe>, potion::Error> {
        recipes::fetch_recipes(query, limit, offset, self).await
    }

    async fn insert_relation(&self, relation: &Relation) -> Result<bool, potion::Error> {
        relations::insert_relation(relation, self).await
    }

    async fn delete_relation(&self, relation: &Relation) -> Result<bool, potion::Error> {
        relations::delete_relation(relation, self).await
    }

    async fn favorite_ids(&self, user_id: Id) -> Result<Vec<Id>, potion::Error> {
        relations::list_favorite_ids(user_id, self).await
    }

    async fn subscription_ids(&self, user_id: Id) -> Result<Vec<Id>, potion::Error> {
        relations::list_subscription_ids(user_id, self).await
    }

    async fn followed_authors(&self, user_id: Id) -> Result<Vec<AuthorSummary>, potion::Error> {
        relations::list_followed_authors(user_id, self).await
    }

    async fn list_purchases(&self, actor: &Actor) -> Result<Vec<Recipe>, potion::Error> {
        shop_list::list_purchases(actor, self).await
    }

    async fn purchase_lines(&self, actor: &Actor) -> Result<Vec<PurchaseLine>, potion::Error> {
        shop_list::list_purchase_lines(actor, self).await
    }

    async fn transfer_purchases(
        &self,
        key: &SessionKey,
        user_id: Id,
    ) -> Result<u64, potion::Error> {
        shop_list::transfer_purchases(key, user_id, self).await
    }
}
