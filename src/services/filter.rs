//! Tag filtering of recipe listings.
//!
//! Listings are narrowed to recipes carrying any of the requested tags, but
//! only if the *first* requested tag alone matches something in scope. When it
//! does not, the listing falls back to the whole scope. Tag order in the
//! request therefore decides whether filtering activates at all.

use serde::Serialize;

use crate::{
    database::store::RelationStore,
    schema::{Id, RecipeTag},
};

/// Base recipe set a listing works on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum Scope {
    Global,
    ByAuthor(String),
    Favorites(Id),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RecipeQuery {
    pub scope: Scope,
    /// Recipes must carry at least one of these. Empty means unfiltered.
    pub tags: Vec<RecipeTag>,
}

impl RecipeQuery {
    pub fn unfiltered(scope: Scope) -> Self {
        Self {
            scope,
            tags: vec![],
        }
    }

    pub fn is_filtered(&self) -> bool {
        !self.tags.is_empty()
    }
}

/// Builds the listing query for `requested` tags within `scope`.
// TODO: product review of the first-tag check; checking any tag would make order irrelevant.
pub async fn filter<S: RelationStore + ?Sized>(
    requested: &[RecipeTag],
    scope: Scope,
    store: &S,
) -> Result<RecipeQuery, potion::Error> {
    let mut tags: Vec<RecipeTag> = Vec::with_capacity(requested.len());
    for tag in requested {
        if !tags.contains(tag) {
            tags.push(*tag);
        }
    }

    let Some(first) = tags.first().copied() else {
        return Ok(RecipeQuery::unfiltered(scope));
    };

    let leading = RecipeQuery {
        scope,
        tags: vec![first],
    };
    if store.count_recipes(&leading).await? == 0 {
        log::trace!("> Tag {first} matches nothing in scope, listing unfiltered");
        return Ok(RecipeQuery::unfiltered(leading.scope));
    }

    Ok(RecipeQuery {
        scope: leading.scope,
        tags,
    })
}

/// Reads the multi-value `tag` parameter of a listing query string, keeping request order.
///
/// An unknown first value can never match, so the listing stays unfiltered.
/// Unknown later values add nothing to the union and are skipped.
pub fn parse_tags(query: &str) -> Vec<RecipeTag> {
    let values: Vec<String> = query_pairs(query)
        .into_iter()
        .filter(|(key, _)| key == "tag")
        .map(|(_, value)| value)
        .collect();

    match values.first().map(|first| first.parse::<RecipeTag>()) {
        Some(Ok(_)) => values.iter().filter_map(|value| value.parse().ok()).collect(),
        _ => vec![],
    }
}

/// 1-based `page` parameter of a listing query string. Missing or malformed values mean page 1.
pub fn parse_page(query: &str) -> i64 {
    query_pairs(query)
        .into_iter()
        .find(|(key, _)| key == "page")
        .and_then(|(_, value)| value.parse().ok())
        .unwrap_or(1)
}

fn query_pairs(query: &str) -> Vec<(String, String)> {
    serde_urlencoded::from_str(query).unwrap_or_default()
}
