//! Recipe listings and per-actor UI state.

use serde::Serialize;

use crate::{
    database::store::RelationStore,
    error::not_found,
    filter::{filter, RecipeQuery, Scope},
    identity::RequestIdentity,
    pagination::PageContext,
    schema::{FollowedAuthor, Id, Recipe, RecipeTag},
    FOLLOWED_AUTHOR_PREVIEW, RECIPE_COUNT_PER_PAGE,
};

async fn page<S: RelationStore + ?Sized>(
    query: RecipeQuery,
    offset: i64,
    store: &S,
) -> Result<PageContext<Recipe>, potion::Error> {
    let total_rows = store.count_recipes(&query).await?;
    let rows = store
        .fetch_recipes(&query, RECIPE_COUNT_PER_PAGE, offset.max(0))
        .await?;

    Ok(PageContext::from_rows(
        rows,
        total_rows,
        RECIPE_COUNT_PER_PAGE,
        offset,
    ))
}

pub async fn list_recipes<S: RelationStore + ?Sized>(
    tags: &[RecipeTag],
    offset: i64,
    store: &S,
) -> Result<PageContext<Recipe>, potion::Error> {
    let query = filter(tags, Scope::Global, store).await?;
    page(query, offset, store).await
}

pub async fn author_recipes<S: RelationStore + ?Sized>(
    username: &str,
    tags: &[RecipeTag],
    offset: i64,
    store: &S,
) -> Result<PageContext<Recipe>, potion::Error> {
    if store.find_user(username).await?.is_none() {
        return Err(not_found("Author not found"));
    }

    let query = filter(tags, Scope::ByAuthor(username.to_string()), store).await?;
    page(query, offset, store).await
}

pub async fn favorite_recipes<S: RelationStore + ?Sized>(
    identity: &RequestIdentity,
    tags: &[RecipeTag],
    offset: i64,
    store: &S,
) -> Result<PageContext<Recipe>, potion::Error> {
    let session = identity.user()?;

    let query = filter(tags, Scope::Favorites(session.user_id), store).await?;
    page(query, offset, store).await
}

/// Followed authors with their newest recipes.
pub async fn followed_authors<S: RelationStore + ?Sized>(
    identity: &RequestIdentity,
    store: &S,
) -> Result<Vec<FollowedAuthor>, potion::Error> {
    let session = identity.user()?;

    let mut followed = vec![];
    for author in store.followed_authors(session.user_id).await? {
        let query = RecipeQuery::unfiltered(Scope::ByAuthor(author.username.to_owned()));
        let recipes = store
            .fetch_recipes(&query, FOLLOWED_AUTHOR_PREVIEW, 0)
            .await?;
        followed.push(FollowedAuthor { author, recipes });
    }
    Ok(followed)
}

/// `None` when the request has neither a login nor an anonymous key.
pub async fn shop_list<S: RelationStore + ?Sized>(
    identity: &RequestIdentity,
    store: &S,
) -> Result<Option<Vec<Recipe>>, potion::Error> {
    match identity.reader() {
        Some(actor) => Ok(Some(store.list_purchases(&actor).await?)),
        None => Ok(None),
    }
}

/// Ids the UI marks as favorited, followed or purchased.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Personalization {
    pub favorites: Vec<Id>,
    pub subscriptions: Vec<Id>,
    pub purchases: Vec<Id>,
}

pub async fn personalize<S: RelationStore + ?Sized>(
    identity: &RequestIdentity,
    store: &S,
) -> Result<Personalization, potion::Error> {
    let mut personalization = Personalization::default();

    if let Some(session) = &identity.session {
        personalization.favorites = store.favorite_ids(session.user_id).await?;
        personalization.subscriptions = store.subscription_ids(session.user_id).await?;
    }
    if let Some(recipes) = shop_list(identity, store).await? {
        personalization.purchases = recipes.into_iter().map(|r| r.id).collect();
    }

    Ok(personalization)
}
