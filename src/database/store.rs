use async_trait::async_trait;

use crate::{
    filter::RecipeQuery,
    identity::{Actor, SessionKey},
    schema::{
        AuthorSummary, Id, Ingredient, IngredientLine, NewUser, PurchaseLine, Recipe,
        RecipeDraft, ResolvedLine, User,
    },
};

/// A row of one of the toggleable relations.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Relation {
    Favorite { user_id: Id, recipe_id: Id },
    Subscription { user_id: Id, author_id: Id },
    Purchase { actor: Actor, recipe_id: Id },
}

/// Persistence used by every service.
///
/// Relation inserts must be atomic get-or-create operations guarded by a
/// uniqueness constraint: concurrent inserts of the same row yield exactly one
/// `true`, and a lost race is reported as `false`, never as an error.
#[async_trait]
pub trait RelationStore: Send + Sync {
    /// Returns `None` when the username or email is taken.
    async fn create_user(&self, user: &NewUser) -> Result<Option<User>, potion::Error>;
    async fn get_user(&self, id: Id) -> Result<Option<User>, potion::Error>;
    async fn find_user(&self, username: &str) -> Result<Option<User>, potion::Error>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, potion::Error>;

    /// Get-or-create by title. An existing ingredient keeps its dimension.
    async fn create_ingredient(
        &self,
        title: &str,
        dimension: &str,
    ) -> Result<Ingredient, potion::Error>;
    async fn find_ingredient(&self, title: &str) -> Result<Option<Ingredient>, potion::Error>;
    /// Case-sensitive title prefix match, ordered by title.
    async fn search_ingredients(&self, prefix: &str) -> Result<Vec<Ingredient>, potion::Error>;

    async fn insert_recipe(
        &self,
        author_id: Id,
        slug: &str,
        draft: &RecipeDraft,
        lines: &[ResolvedLine],
    ) -> Result<Recipe, potion::Error>;
    /// Replaces the editable fields, tags and lines. Slug and publish date are kept.
    async fn update_recipe(
        &self,
        id: Id,
        draft: &RecipeDraft,
        lines: &[ResolvedLine],
    ) -> Result<Recipe, potion::Error>;
    /// Deletes the recipe together with every relation row referencing it.
    async fn delete_recipe(&self, id: Id) -> Result<bool, potion::Error>;
    async fn get_recipe(&self, id: Id) -> Result<Option<Recipe>, potion::Error>;
    async fn get_recipe_by_slug(&self, slug: &str) -> Result<Option<Recipe>, potion::Error>;
    async fn recipe_lines(&self, recipe_id: Id) -> Result<Vec<IngredientLine>, potion::Error>;
    async fn count_recipes(&self, query: &RecipeQuery) -> Result<i64, potion::Error>;
    /// Newest first.
    async fn fetch_recipes(
        &self,
        query: &RecipeQuery,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Recipe>, potion::Error>;

    async fn insert_relation(&self, relation: &Relation) -> Result<bool, potion::Error>;
    async fn delete_relation(&self, relation: &Relation) -> Result<bool, potion::Error>;
    async fn favorite_ids(&self, user_id: Id) -> Result<Vec<Id>, potion::Error>;
    async fn subscription_ids(&self, user_id: Id) -> Result<Vec<Id>, potion::Error>;
    /// Followed authors with at least one recipe, ordered by username.
    async fn followed_authors(&self, user_id: Id) -> Result<Vec<AuthorSummary>, potion::Error>;
    /// Recipes on the actor's shop list in insertion order.
    async fn list_purchases(&self, actor: &Actor) -> Result<Vec<Recipe>, potion::Error>;
    async fn purchase_lines(&self, actor: &Actor) -> Result<Vec<PurchaseLine>, potion::Error>;
    /// Re-keys every shop list row of `key` to `user_id`. Returns the number of rows moved.
    async fn transfer_purchases(&self, key: &SessionKey, user_id: Id)
        -> Result<u64, potion::Error>;
}
