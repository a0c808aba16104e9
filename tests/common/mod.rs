#![allow(dead_code)]

use std::{collections::HashMap, sync::Arc};

use foodgram_sdk::{
    error::RenderError,
    export::ShoppingListRenderer,
    form::Form,
    identity::RequestIdentity,
    jwt::{generate_jwt_session, SessionData},
    memory::MemoryStore,
    recipes::create_recipe,
    routes::AppContext,
    schema::{Ingredient, NewUser, Recipe, ShoppingListItem, User, UserRole},
    store::RelationStore,
    Config,
};

pub fn config() -> Config {
    Config::from_lookup(|key| match key {
        "DATABASE_URL" => Some("postgres://localhost/foodgram".to_string()),
        "JWT_SECRET" => Some("integration-secret".to_string()),
        _ => None,
    })
    .unwrap()
}

pub async fn user(store: &MemoryStore, username: &str, role: UserRole) -> User {
    store
        .create_user(&NewUser {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            first_name: "Иван".to_string(),
            last_name: "Петров".to_string(),
            password: "not-a-hash".to_string(),
            role,
        })
        .await
        .unwrap()
        .unwrap()
}

pub fn session(user: &User) -> SessionData {
    SessionData::from(user)
}

pub fn identity(user: &User) -> RequestIdentity {
    RequestIdentity::authenticated(session(user))
}

/// `Cookie` header value of a logged-in user.
pub fn login_cookie(user: &User, config: &Config) -> String {
    let token = generate_jwt_session(user, &config.jwt_secret, config.session_lifetime_hours).unwrap();
    format!("session={token}")
}

pub async fn ingredient(store: &MemoryStore, title: &str, dimension: &str) -> Ingredient {
    store.create_ingredient(title, dimension).await.unwrap()
}

pub fn recipe_form(title: &str, tags: &[&str], lines: &[(&str, i32)]) -> Form {
    let mut fields: HashMap<String, String> = HashMap::from([
        ("title".to_string(), title.to_string()),
        ("text".to_string(), "Готовить до готовности".to_string()),
        ("time".to_string(), "30".to_string()),
    ]);
    for tag in tags {
        fields.insert(tag.to_string(), "on".to_string());
    }
    for (i, (name, amount)) in lines.iter().enumerate() {
        fields.insert(format!("nameIngredient_{}", i + 1), name.to_string());
        fields.insert(format!("valueIngredient_{}", i + 1), amount.to_string());
    }
    Form::from_fields(fields)
}

pub async fn recipe(
    store: &MemoryStore,
    author: &User,
    title: &str,
    tags: &[&str],
    lines: &[(&str, i32)],
) -> Recipe {
    create_recipe(&session(author), &recipe_form(title, tags, lines), store)
        .await
        .unwrap()
}

/// Renders one `title total dimension` line per item.
pub struct TextRenderer;

impl ShoppingListRenderer for TextRenderer {
    fn render(&self, items: &[ShoppingListItem]) -> Result<Vec<u8>, RenderError> {
        let mut out = String::from("%PDF\n");
        for item in items {
            out.push_str(&format!("{} {} {}\n", item.title, item.total, item.dimension));
        }
        Ok(out.into_bytes())
    }
}

pub struct FailingRenderer;

impl ShoppingListRenderer for FailingRenderer {
    fn render(&self, _: &[ShoppingListItem]) -> Result<Vec<u8>, RenderError> {
        Err(RenderError::new("no fonts"))
    }
}

pub fn context(store: Arc<MemoryStore>) -> AppContext<MemoryStore> {
    AppContext::new(config(), store, Arc::new(TextRenderer))
}
