//! Shopping list totals.

use std::collections::{BTreeMap, HashSet};

use crate::{
    database::store::RelationStore,
    identity::Actor,
    schema::{Id, PurchaseLine, ShoppingListItem},
};

/// Collapses join rows into one item per ingredient.
///
/// A (recipe, line) pair is counted once even if the join produced it
/// repeatedly; distinct recipes sharing a line each contribute its amount.
pub fn summarize(lines: Vec<PurchaseLine>) -> Vec<ShoppingListItem> {
    let mut seen: HashSet<(Id, Id)> = HashSet::new();
    let mut totals: BTreeMap<Id, ShoppingListItem> = BTreeMap::new();

    for line in lines {
        if !seen.insert((line.recipe_id, line.line_id)) {
            continue;
        }

        totals
            .entry(line.ingredient_id)
            .or_insert_with(|| ShoppingListItem {
                title: line.title,
                dimension: line.dimension,
                total: 0,
            })
            .total += i64::from(line.amount);
    }

    let mut items: Vec<ShoppingListItem> = totals.into_values().collect();
    items.sort_by(|a, b| a.title.cmp(&b.title));
    items
}

/// Totals for the actor's shop list. No actor means an empty list.
pub async fn aggregate<S: RelationStore + ?Sized>(
    actor: Option<&Actor>,
    store: &S,
) -> Result<Vec<ShoppingListItem>, potion::Error> {
    let Some(actor) = actor else {
        return Ok(vec![]);
    };

    let lines = store.purchase_lines(actor).await?;
    Ok(summarize(lines))
}
