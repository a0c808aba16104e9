use potion::HtmlError;

use crate::{
    database::store::RelationStore,
    error::not_found,
    form::Form,
    jwt::SessionData,
    permissions::ActionType,
    schema::{Recipe, RecipeDetail, RecipeDraft, ResolvedLine},
    slug::{recipe_slug, with_suffix},
};

/// Every line must name a stored ingredient; nothing is created here.
async fn resolve_lines<S: RelationStore + ?Sized>(
    draft: &RecipeDraft,
    store: &S,
) -> Result<Vec<ResolvedLine>, potion::Error> {
    let mut lines = Vec::with_capacity(draft.ingredients.len());
    for line in &draft.ingredients {
        let Some(ingredient) = store.find_ingredient(&line.title).await? else {
            return Err(HtmlError::InvalidRequest.new(&format!("Unknown ingredient: {}", line.title)));
        };

        let resolved = ResolvedLine {
            ingredient_id: ingredient.id,
            amount: line.amount,
        };
        if !lines.contains(&resolved) {
            lines.push(resolved);
        }
    }
    Ok(lines)
}

async fn unique_slug<S: RelationStore + ?Sized>(
    base: &str,
    store: &S,
) -> Result<String, potion::Error> {
    let mut attempt = 1;
    loop {
        let candidate = with_suffix(base, attempt);
        if store.get_recipe_by_slug(&candidate).await?.is_none() {
            return Ok(candidate);
        }
        attempt += 1;
    }
}

async fn editable_recipe<S: RelationStore + ?Sized>(
    session: &SessionData,
    slug: &str,
    store: &S,
) -> Result<Recipe, potion::Error> {
    let recipe = store
        .get_recipe_by_slug(slug)
        .await?
        .ok_or_else(|| not_found("Recipe not found"))?;

    session.authenticate_owner(
        recipe.author_id,
        ActionType::ManageOwnRecipes,
        ActionType::ManageAllRecipes,
    )?;
    Ok(recipe)
}

pub async fn create_recipe<S: RelationStore + ?Sized>(
    session: &SessionData,
    form: &Form,
    store: &S,
) -> Result<Recipe, potion::Error> {
    session.authenticate(ActionType::CreateRecipes)?;

    let draft = form.recipe_draft()?;
    let lines = resolve_lines(&draft, store).await?;
    let author = store
        .get_user(session.user_id)
        .await?
        .ok_or_else(|| HtmlError::InvalidSession.new("Unknown user"))?;

    let slug = unique_slug(
        &recipe_slug(&author.full_name(), &draft.title),
        store,
    )
    .await?;

    let recipe = store.insert_recipe(author.id, &slug, &draft, &lines).await?;
    log::info!("Created recipe {}", recipe.slug);
    Ok(recipe)
}

/// Slug and publish date stay as they were.
pub async fn update_recipe<S: RelationStore + ?Sized>(
    session: &SessionData,
    slug: &str,
    form: &Form,
    store: &S,
) -> Result<Recipe, potion::Error> {
    let recipe = editable_recipe(session, slug, store).await?;

    let draft = form.recipe_draft()?;
    let lines = resolve_lines(&draft, store).await?;

    store.update_recipe(recipe.id, &draft, &lines).await
}

pub async fn delete_recipe<S: RelationStore + ?Sized>(
    session: &SessionData,
    slug: &str,
    store: &S,
) -> Result<(), potion::Error> {
    let recipe = editable_recipe(session, slug, store).await?;

    if !store.delete_recipe(recipe.id).await? {
        return Err(not_found("Recipe not found"));
    }
    log::info!("Deleted recipe {}", recipe.slug);
    Ok(())
}

pub async fn recipe_detail<S: RelationStore + ?Sized>(
    slug: &str,
    store: &S,
) -> Result<RecipeDetail, potion::Error> {
    let recipe = store
        .get_recipe_by_slug(slug)
        .await?
        .ok_or_else(|| not_found("Recipe not found"))?;
    let ingredients = store.recipe_lines(recipe.id).await?;

    Ok(RecipeDetail {
        recipe,
        ingredients,
    })
}
