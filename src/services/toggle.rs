//! Add/remove operations on favorites, subscriptions and the shop list.
//!
//! Every relation holds at most one row per (actor, target). Adding an
//! existing row or removing a missing one is a `false` result, while a
//! target that does not exist is a 404.

use crate::{
    database::store::{Relation, RelationStore},
    error::not_found,
    identity::{RequestIdentity, SessionKey},
    permissions::ActionType,
    schema::Id,
};

async fn ensure_recipe<S: RelationStore + ?Sized>(
    recipe_id: Id,
    store: &S,
) -> Result<(), potion::Error> {
    match store.get_recipe(recipe_id).await? {
        Some(_) => Ok(()),
        None => Err(not_found("Recipe not found")),
    }
}

async fn ensure_target<S: RelationStore + ?Sized>(
    relation: &Relation,
    store: &S,
) -> Result<(), potion::Error> {
    match relation {
        Relation::Favorite { recipe_id, .. } | Relation::Purchase { recipe_id, .. } => {
            ensure_recipe(*recipe_id, store).await
        }
        Relation::Subscription { author_id, .. } => match store.get_user(*author_id).await? {
            Some(_) => Ok(()),
            None => Err(not_found("Author not found")),
        },
    }
}

fn is_self_subscription(relation: &Relation) -> bool {
    matches!(relation, Relation::Subscription { user_id, author_id } if user_id == author_id)
}

pub async fn add<S: RelationStore + ?Sized>(
    relation: &Relation,
    store: &S,
) -> Result<bool, potion::Error> {
    ensure_target(relation, store).await?;
    if is_self_subscription(relation) {
        return Ok(false);
    }

    let created = store.insert_relation(relation).await?;
    log::debug!("> Add {relation:?}: created={created}");
    Ok(created)
}

pub async fn remove<S: RelationStore + ?Sized>(
    relation: &Relation,
    store: &S,
) -> Result<bool, potion::Error> {
    ensure_target(relation, store).await?;
    if is_self_subscription(relation) {
        return Ok(false);
    }

    let removed = store.delete_relation(relation).await?;
    log::debug!("> Remove {relation:?}: removed={removed}");
    Ok(removed)
}

fn favorite(identity: &RequestIdentity, recipe_id: Id) -> Result<Relation, potion::Error> {
    let session = identity.user()?;
    session.authenticate(ActionType::ManageOwnFavorites)?;
    Ok(Relation::Favorite {
        user_id: session.user_id,
        recipe_id,
    })
}

fn subscription(identity: &RequestIdentity, author_id: Id) -> Result<Relation, potion::Error> {
    let session = identity.user()?;
    session.authenticate(ActionType::ManageOwnSubscriptions)?;
    Ok(Relation::Subscription {
        user_id: session.user_id,
        author_id,
    })
}

pub async fn add_favorite<S: RelationStore + ?Sized>(
    identity: &RequestIdentity,
    recipe_id: Id,
    store: &S,
) -> Result<bool, potion::Error> {
    add(&favorite(identity, recipe_id)?, store).await
}

pub async fn remove_favorite<S: RelationStore + ?Sized>(
    identity: &RequestIdentity,
    recipe_id: Id,
    store: &S,
) -> Result<bool, potion::Error> {
    remove(&favorite(identity, recipe_id)?, store).await
}

pub async fn add_subscription<S: RelationStore + ?Sized>(
    identity: &RequestIdentity,
    author_id: Id,
    store: &S,
) -> Result<bool, potion::Error> {
    add(&subscription(identity, author_id)?, store).await
}

pub async fn remove_subscription<S: RelationStore + ?Sized>(
    identity: &RequestIdentity,
    author_id: Id,
    store: &S,
) -> Result<bool, potion::Error> {
    remove(&subscription(identity, author_id)?, store).await
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseOutcome {
    pub created: bool,
    /// Newly minted anonymous key the caller must persist.
    pub issued: Option<SessionKey>,
}

/// Anonymous visitors get a session key on their first purchase.
pub async fn add_purchase<S: RelationStore + ?Sized>(
    identity: &RequestIdentity,
    recipe_id: Id,
    store: &S,
) -> Result<PurchaseOutcome, potion::Error> {
    ensure_recipe(recipe_id, store).await?;

    let (actor, issued) = identity.writer();
    let created = add(&Relation::Purchase { actor, recipe_id }, store).await?;

    Ok(PurchaseOutcome { created, issued })
}

/// Never mints a key: without one there is nothing to remove.
pub async fn remove_purchase<S: RelationStore + ?Sized>(
    identity: &RequestIdentity,
    recipe_id: Id,
    store: &S,
) -> Result<bool, potion::Error> {
    ensure_recipe(recipe_id, store).await?;

    match identity.reader() {
        Some(actor) => remove(&Relation::Purchase { actor, recipe_id }, store).await,
        None => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        identity::Actor,
        jwt::SessionData,
        memory::MemoryStore,
        schema::{NewUser, RecipeDraft, RecipeTag, UserRole},
    };

    async fn seeded() -> (MemoryStore, Id, Id) {
        let store = MemoryStore::new();
        let user = store
            .create_user(&NewUser {
                username: "chef".to_string(),
                email: "chef@example.com".to_string(),
                first_name: "Chef".to_string(),
                last_name: "Cook".to_string(),
                password: "hash".to_string(),
                role: UserRole::User,
            })
            .await
            .unwrap()
            .unwrap();
        let draft = RecipeDraft {
            title: "Soup".to_string(),
            text: "Boil".to_string(),
            image: String::new(),
            cooking_time: 10,
            tags: vec![RecipeTag::Lunch],
            ingredients: vec![],
        };
        let recipe = store.insert_recipe(user.id, "soup", &draft, &[]).await.unwrap();
        (store, user.id, recipe.id)
    }

    fn session(user_id: Id) -> RequestIdentity {
        RequestIdentity::authenticated(SessionData {
            user_id,
            username: "chef".to_string(),
            role: UserRole::User,
            is_admin: false,
        })
    }

    #[tokio::test]
    async fn add_is_at_most_once() {
        let (store, user_id, recipe_id) = seeded().await;
        let relation = Relation::Favorite { user_id, recipe_id };

        assert!(add(&relation, &store).await.unwrap());
        assert!(!add(&relation, &store).await.unwrap());
        assert_eq!(store.favorite_ids(user_id).await.unwrap(), vec![recipe_id]);
    }

    #[tokio::test]
    async fn remove_reports_missing_rows() {
        let (store, user_id, recipe_id) = seeded().await;
        let relation = Relation::Favorite { user_id, recipe_id };

        assert!(!remove(&relation, &store).await.unwrap());
        add(&relation, &store).await.unwrap();
        assert!(remove(&relation, &store).await.unwrap());
        assert!(!remove(&relation, &store).await.unwrap());
    }

    #[tokio::test]
    async fn missing_targets_are_errors() {
        let (store, user_id, _) = seeded().await;

        let err = add(&Relation::Favorite { user_id, recipe_id: 999 }, &store)
            .await
            .unwrap_err();
        assert_eq!(err.code, 404);
        assert!(add_subscription(&session(user_id), 999, &store).await.is_err());
    }

    #[tokio::test]
    async fn self_subscription_is_never_created() {
        let (store, user_id, _) = seeded().await;

        assert!(!add_subscription(&session(user_id), user_id, &store).await.unwrap());
        assert!(!add_subscription(&session(user_id), user_id, &store).await.unwrap());
        assert!(store.subscription_ids(user_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn favorites_require_login() {
        let (store, _, recipe_id) = seeded().await;

        assert!(add_favorite(&RequestIdentity::default(), recipe_id, &store).await.is_err());
    }

    #[tokio::test]
    async fn anonymous_purchases_issue_a_key_once() {
        let (store, _, recipe_id) = seeded().await;

        let first = add_purchase(&RequestIdentity::default(), recipe_id, &store).await.unwrap();
        let key = first.issued.clone().unwrap();
        assert!(first.created);

        let identity = RequestIdentity::anonymous(Some(key.clone()));
        let second = add_purchase(&identity, recipe_id, &store).await.unwrap();
        assert_eq!(second.issued, None);
        assert!(!second.created);

        let recipes = store.list_purchases(&Actor::Anonymous(key)).await.unwrap();
        assert_eq!(recipes.len(), 1);
    }

    #[tokio::test]
    async fn logged_in_purchases_never_issue_a_key() {
        let (store, user_id, recipe_id) = seeded().await;

        let outcome = add_purchase(&session(user_id), recipe_id, &store).await.unwrap();
        assert_eq!(
            outcome,
            PurchaseOutcome {
                created: true,
                issued: None
            }
        );
        assert_eq!(store.list_purchases(&Actor::User(user_id)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn removing_without_a_session_is_false() {
        let (store, _, recipe_id) = seeded().await;

        assert!(!remove_purchase(&RequestIdentity::default(), recipe_id, &store).await.unwrap());
    }
}
