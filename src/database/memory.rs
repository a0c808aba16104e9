//! In-process [`RelationStore`] with the same uniqueness rules as the
//! PostgreSQL schema. Used by the test suites and for local development.

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use super::{
    error::{not_found, QueryError},
    store::{Relation, RelationStore},
};
use crate::{
    filter::{RecipeQuery, Scope},
    identity::{Actor, SessionKey},
    schema::{
        AuthorSummary, Id, Ingredient, IngredientLine, NewUser, PurchaseLine, Recipe,
        RecipeDraft, RecipeTag, ResolvedLine, User,
    },
};

#[derive(Debug, Clone)]
struct StoredLine {
    id: Id,
    ingredient_id: Id,
    amount: i32,
}

#[derive(Debug, Clone)]
struct Purchase {
    id: Id,
    owner: Actor,
    recipe_id: Id,
}

#[derive(Default)]
struct State {
    next_id: Id,
    users: Vec<User>,
    ingredients: Vec<Ingredient>,
    lines: Vec<StoredLine>,
    recipes: Vec<Recipe>,
    recipe_lines: BTreeSet<(Id, Id)>,
    favorites: BTreeSet<(Id, Id)>,
    subscriptions: BTreeSet<(Id, Id)>,
    purchases: Vec<Purchase>,
}

impl State {
    fn next_id(&mut self) -> Id {
        self.next_id += 1;
        self.next_id
    }

    fn line_id(&mut self, line: &ResolvedLine) -> Id {
        if let Some(existing) = self
            .lines
            .iter()
            .find(|l| l.ingredient_id == line.ingredient_id && l.amount == line.amount)
        {
            return existing.id;
        }

        let id = self.next_id();
        self.lines.push(StoredLine {
            id,
            ingredient_id: line.ingredient_id,
            amount: line.amount,
        });
        id
    }

    fn attach_lines(&mut self, recipe_id: Id, lines: &[ResolvedLine]) {
        self.recipe_lines.retain(|(r, _)| *r != recipe_id);
        for line in lines {
            let line_id = self.line_id(line);
            self.recipe_lines.insert((recipe_id, line_id));
        }
    }

    fn ingredient_lines(&self, recipe_id: Id) -> Vec<IngredientLine> {
        self.recipe_lines
            .iter()
            .filter(|(r, _)| *r == recipe_id)
            .filter_map(|(_, line_id)| {
                let line = self.lines.iter().find(|l| l.id == *line_id)?;
                let ingredient = self
                    .ingredients
                    .iter()
                    .find(|i| i.id == line.ingredient_id)?;
                Some(IngredientLine {
                    line_id: line.id,
                    ingredient_id: ingredient.id,
                    title: ingredient.title.to_owned(),
                    dimension: ingredient.dimension.to_owned(),
                    amount: line.amount,
                })
            })
            .collect()
    }

    fn matches(&self, recipe: &Recipe, query: &RecipeQuery) -> bool {
        let in_scope = match &query.scope {
            Scope::Global => true,
            Scope::ByAuthor(username) => &recipe.author_username == username,
            Scope::Favorites(user_id) => self.favorites.contains(&(*user_id, recipe.id)),
        };

        in_scope && (query.tags.is_empty() || recipe.tags.iter().any(|t| query.tags.contains(t)))
    }

    fn purchases_of<'a>(&'a self, actor: &'a Actor) -> impl Iterator<Item = &'a Purchase> {
        self.purchases.iter().filter(move |p| &p.owner == actor)
    }
}

fn normalize_tags(tags: &[RecipeTag]) -> Vec<RecipeTag> {
    let set: BTreeSet<RecipeTag> = tags.iter().copied().collect();
    set.into_iter().collect()
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RelationStore for MemoryStore {
    async fn create_user(&self, user: &NewUser) -> Result<Option<User>, potion::Error> {
        let mut state = self.state.lock().await;
        if state
            .users
            .iter()
            .any(|u| u.username == user.username || u.email == user.email)
        {
            return Ok(None);
        }

        let created = User {
            id: state.next_id(),
            username: user.username.to_owned(),
            email: user.email.to_owned(),
            first_name: user.first_name.to_owned(),
            last_name: user.last_name.to_owned(),
            password: user.password.to_owned(),
            role: user.role.to_owned(),
            date_joined: Utc::now(),
        };
        state.users.push(created.clone());
        Ok(Some(created))
    }

    async fn get_user(&self, id: Id) -> Result<Option<User>, potion::Error> {
        let state = self.state.lock().await;
        Ok(state.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user(&self, username: &str) -> Result<Option<User>, potion::Error> {
        let state = self.state.lock().await;
        Ok(state.users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, potion::Error> {
        let state = self.state.lock().await;
        Ok(state.users.iter().find(|u| u.email == email).cloned())
    }

    async fn create_ingredient(
        &self,
        title: &str,
        dimension: &str,
    ) -> Result<Ingredient, potion::Error> {
        let mut state = self.state.lock().await;
        if let Some(existing) = state.ingredients.iter().find(|i| i.title == title) {
            return Ok(existing.clone());
        }

        let ingredient = Ingredient {
            id: state.next_id(),
            title: title.to_string(),
            dimension: dimension.to_string(),
        };
        state.ingredients.push(ingredient.clone());
        Ok(ingredient)
    }

    async fn find_ingredient(&self, title: &str) -> Result<Option<Ingredient>, potion::Error> {
        let state = self.state.lock().await;
        Ok(state.ingredients.iter().find(|i| i.title == title).cloned())
    }

    async fn search_ingredients(&self, prefix: &str) -> Result<Vec<Ingredient>, potion::Error> {
        let state = self.state.lock().await;
        let mut rows: Vec<Ingredient> = state
            .ingredients
            .iter()
            .filter(|i| i.title.starts_with(prefix))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(rows)
    }

    async fn insert_recipe(
        &self,
        author_id: Id,
        slug: &str,
        draft: &RecipeDraft,
        lines: &[ResolvedLine],
    ) -> Result<Recipe, potion::Error> {
        let mut state = self.state.lock().await;
        let author_username = state
            .users
            .iter()
            .find(|u| u.id == author_id)
            .map(|u| u.username.to_owned())
            .ok_or_else(|| not_found("Author not found"))?;
        if state.recipes.iter().any(|r| r.slug == slug) {
            return Err(QueryError::new(format!("duplicate recipe slug {slug}")).into());
        }

        let recipe = Recipe {
            id: state.next_id(),
            author_id,
            author_username,
            title: draft.title.to_owned(),
            slug: slug.to_string(),
            text: draft.text.to_owned(),
            image: draft.image.to_owned(),
            cooking_time: draft.cooking_time,
            pub_date: Utc::now(),
            tags: normalize_tags(&draft.tags),
        };
        state.attach_lines(recipe.id, lines);
        state.recipes.push(recipe.clone());
        Ok(recipe)
    }

    async fn update_recipe(
        &self,
        id: Id,
        draft: &RecipeDraft,
        lines: &[ResolvedLine],
    ) -> Result<Recipe, potion::Error> {
        let mut state = self.state.lock().await;
        let recipe = state
            .recipes
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| not_found("Recipe not found"))?;

        recipe.title = draft.title.to_owned();
        recipe.text = draft.text.to_owned();
        recipe.image = draft.image.to_owned();
        recipe.cooking_time = draft.cooking_time;
        recipe.tags = normalize_tags(&draft.tags);
        let updated = recipe.clone();

        state.attach_lines(id, lines);
        Ok(updated)
    }

    async fn delete_recipe(&self, id: Id) -> Result<bool, potion::Error> {
        let mut state = self.state.lock().await;
        let before = state.recipes.len();
        state.recipes.retain(|r| r.id != id);
        if state.recipes.len() == before {
            return Ok(false);
        }

        state.recipe_lines.retain(|(r, _)| *r != id);
        state.favorites.retain(|(_, r)| *r != id);
        state.purchases.retain(|p| p.recipe_id != id);
        Ok(true)
    }

    async fn get_recipe(&self, id: Id) -> Result<Option<Recipe>, potion::Error> {
        let state = self.state.lock().await;
        Ok(state.recipes.iter().find(|r| r.id == id).cloned())
    }

    async fn get_recipe_by_slug(&self, slug: &str) -> Result<Option<Recipe>, potion::Error> {
        let state = self.state.lock().await;
        Ok(state.recipes.iter().find(|r| r.slug == slug).cloned())
    }

    async fn recipe_lines(&self, recipe_id: Id) -> Result<Vec<IngredientLine>, potion::Error> {
        let state = self.state.lock().await;
        Ok(state.ingredient_lines(recipe_id))
    }

    async fn count_recipes(&self, query: &RecipeQuery) -> Result<i64, potion::Error> {
        let state = self.state.lock().await;
        let count = state
            .recipes
            .iter()
            .filter(|r| state.matches(r, query))
            .count();
        Ok(count as i64)
    }

    async fn fetch_recipes(
        &self,
        query: &RecipeQuery,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Recipe>, potion::Error> {
        let state = self.state.lock().await;
        let mut rows: Vec<Recipe> = state
            .recipes
            .iter()
            .filter(|r| state.matches(r, query))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.pub_date.cmp(&a.pub_date).then(b.id.cmp(&a.id)));

        Ok(rows
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn insert_relation(&self, relation: &Relation) -> Result<bool, potion::Error> {
        let mut state = self.state.lock().await;
        let created = match relation {
            Relation::Favorite { user_id, recipe_id } => {
                state.favorites.insert((*user_id, *recipe_id))
            }
            Relation::Subscription { user_id, author_id } => {
                user_id != author_id && state.subscriptions.insert((*user_id, *author_id))
            }
            Relation::Purchase { actor, recipe_id } => {
                if state
                    .purchases_of(actor)
                    .any(|p| p.recipe_id == *recipe_id)
                {
                    false
                } else {
                    let id = state.next_id();
                    state.purchases.push(Purchase {
                        id,
                        owner: actor.to_owned(),
                        recipe_id: *recipe_id,
                    });
                    true
                }
            }
        };
        Ok(created)
    }

    async fn delete_relation(&self, relation: &Relation) -> Result<bool, potion::Error> {
        let mut state = self.state.lock().await;
        let removed = match relation {
            Relation::Favorite { user_id, recipe_id } => {
                state.favorites.remove(&(*user_id, *recipe_id))
            }
            Relation::Subscription { user_id, author_id } => {
                state.subscriptions.remove(&(*user_id, *author_id))
            }
            Relation::Purchase { actor, recipe_id } => {
                let before = state.purchases.len();
                state
                    .purchases
                    .retain(|p| !(&p.owner == actor && p.recipe_id == *recipe_id));
                state.purchases.len() != before
            }
        };
        Ok(removed)
    }

    async fn favorite_ids(&self, user_id: Id) -> Result<Vec<Id>, potion::Error> {
        let state = self.state.lock().await;
        Ok(state
            .favorites
            .iter()
            .filter(|(u, _)| *u == user_id)
            .map(|(_, r)| *r)
            .collect())
    }

    async fn subscription_ids(&self, user_id: Id) -> Result<Vec<Id>, potion::Error> {
        let state = self.state.lock().await;
        Ok(state
            .subscriptions
            .iter()
            .filter(|(u, _)| *u == user_id)
            .map(|(_, a)| *a)
            .collect())
    }

    async fn followed_authors(&self, user_id: Id) -> Result<Vec<AuthorSummary>, potion::Error> {
        let state = self.state.lock().await;
        let mut authors: Vec<AuthorSummary> = state
            .subscriptions
            .iter()
            .filter(|(u, _)| *u == user_id)
            .filter_map(|(_, author_id)| {
                let author = state.users.iter().find(|u| u.id == *author_id)?;
                let recipe_count = state
                    .recipes
                    .iter()
                    .filter(|r| r.author_id == author.id)
                    .count() as i64;
                (recipe_count > 0).then(|| AuthorSummary {
                    id: author.id,
                    username: author.username.to_owned(),
                    first_name: author.first_name.to_owned(),
                    last_name: author.last_name.to_owned(),
                    recipe_count,
                })
            })
            .collect();
        authors.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(authors)
    }

    async fn list_purchases(&self, actor: &Actor) -> Result<Vec<Recipe>, potion::Error> {
        let state = self.state.lock().await;
        Ok(state
            .purchases_of(actor)
            .filter_map(|p| state.recipes.iter().find(|r| r.id == p.recipe_id).cloned())
            .collect())
    }

    async fn purchase_lines(&self, actor: &Actor) -> Result<Vec<PurchaseLine>, potion::Error> {
        let state = self.state.lock().await;
        Ok(state
            .purchases_of(actor)
            .flat_map(|p| {
                state
                    .ingredient_lines(p.recipe_id)
                    .into_iter()
                    .map(move |line| PurchaseLine {
                        recipe_id: p.recipe_id,
                        line_id: line.line_id,
                        ingredient_id: line.ingredient_id,
                        title: line.title,
                        dimension: line.dimension,
                        amount: line.amount,
                    })
            })
            .collect())
    }

    async fn transfer_purchases(
        &self,
        key: &SessionKey,
        user_id: Id,
    ) -> Result<u64, potion::Error> {
        let mut state = self.state.lock().await;
        let anonymous = Actor::Anonymous(key.to_owned());
        let owner = Actor::User(user_id);
        let owned: BTreeSet<Id> = state.purchases_of(&owner).map(|p| p.recipe_id).collect();

        state
            .purchases
            .retain(|p| !(p.owner == anonymous && owned.contains(&p.recipe_id)));

        let mut moved = 0;
        for purchase in state.purchases.iter_mut().filter(|p| p.owner == anonymous) {
            purchase.owner = owner.to_owned();
            moved += 1;
        }
        Ok(moved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::UserRole;

    fn new_user(username: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            password: "hash".to_string(),
            role: UserRole::User,
        }
    }

    #[tokio::test]
    async fn users_are_unique_by_username_and_email() {
        let store = MemoryStore::new();

        assert!(store.create_user(&new_user("anna")).await.unwrap().is_some());
        assert!(store.create_user(&new_user("anna")).await.unwrap().is_none());

        let same_email = NewUser {
            username: "other".to_string(),
            ..new_user("anna")
        };
        assert!(store.create_user(&same_email).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn identical_lines_are_shared_between_recipes() {
        let store = MemoryStore::new();
        let author = store.create_user(&new_user("anna")).await.unwrap().unwrap();
        let sugar = store.create_ingredient("Сахар", "г.").await.unwrap();
        let draft = RecipeDraft {
            title: "Pie".to_string(),
            text: "Bake".to_string(),
            image: String::new(),
            cooking_time: 40,
            tags: vec![RecipeTag::Dinner, RecipeTag::Breakfast, RecipeTag::Dinner],
            ingredients: vec![],
        };
        let lines = [ResolvedLine {
            ingredient_id: sugar.id,
            amount: 100,
        }];

        let first = store.insert_recipe(author.id, "pie", &draft, &lines).await.unwrap();
        let second = store.insert_recipe(author.id, "pie-2", &draft, &lines).await.unwrap();

        let a = store.recipe_lines(first.id).await.unwrap();
        let b = store.recipe_lines(second.id).await.unwrap();
        assert_eq!(a[0].line_id, b[0].line_id);
        assert_eq!(first.tags, vec![RecipeTag::Breakfast, RecipeTag::Dinner]);
        assert!(store.insert_recipe(author.id, "pie", &draft, &lines).await.is_err());
    }

    #[tokio::test]
    async fn purchases_are_unique_per_owner() {
        let store = MemoryStore::new();
        let key = SessionKey::generate();
        let anonymous = Relation::Purchase {
            actor: Actor::Anonymous(key),
            recipe_id: 1,
        };
        let owned = Relation::Purchase {
            actor: Actor::User(1),
            recipe_id: 1,
        };

        assert!(store.insert_relation(&anonymous).await.unwrap());
        assert!(!store.insert_relation(&anonymous).await.unwrap());
        assert!(store.insert_relation(&owned).await.unwrap());
    }
}
