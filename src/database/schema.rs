use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::TypeError;

pub type Id = i32;

#[derive(
    Clone, Debug, PartialEq, PartialOrd, sqlx::Type, Serialize, Eq, Ord, Hash, Deserialize,
)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    User,
    Admin,
}

/// Meal category a recipe is published under.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize, Deserialize, Eq, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecipeTag {
    Breakfast,
    Lunch,
    Dinner,
}

impl RecipeTag {
    pub const ALL: [RecipeTag; 3] = [Self::Breakfast, Self::Lunch, Self::Dinner];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Breakfast => "BREAKFAST",
            Self::Lunch => "LUNCH",
            Self::Dinner => "DINNER",
        }
    }
}

impl fmt::Display for RecipeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecipeTag {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BREAKFAST" => Ok(Self::Breakfast),
            "LUNCH" => Ok(Self::Lunch),
            "DINNER" => Ok(Self::Dinner),
            _ => Err(TypeError::new("Invalid variant")),
        }
    }
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct User {
    pub id: Id,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub role: UserRole,
    pub date_joined: DateTime<Utc>,
}

impl User {
    /// `"{first} {last}"`, trimmed when either part is blank.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Account data ready to be stored; `password` is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub role: UserRole,
}

#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: Id,
    pub title: String,
    pub dimension: String,
}

/// Public projection returned by the ingredient lookup endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientHint {
    pub title: String,
    pub dimension: String,
}

impl From<Ingredient> for IngredientHint {
    fn from(value: Ingredient) -> Self {
        Self {
            title: value.title,
            dimension: value.dimension,
        }
    }
}

/// One (ingredient, quantity) line of a recipe's composition.
#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngredientLine {
    pub line_id: Id,
    pub ingredient_id: Id,
    pub title: String,
    pub dimension: String,
    pub amount: i32,
}

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct RecipeRow {
    pub id: Id,
    pub author_id: Id,
    pub author_username: String,
    pub title: String,
    pub slug: String,
    pub text: String,
    pub image: String,
    pub cooking_time: i32,
    pub pub_date: DateTime<Utc>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recipe {
    pub id: Id,
    pub author_id: Id,
    pub author_username: String,
    pub title: String,
    pub slug: String,
    pub text: String,
    pub image: String,
    pub cooking_time: i32,
    pub pub_date: DateTime<Utc>,
    pub tags: Vec<RecipeTag>,
}

impl TryFrom<RecipeRow> for Recipe {
    type Error = TypeError;

    fn try_from(row: RecipeRow) -> Result<Self, Self::Error> {
        let mut tags = row
            .tags
            .iter()
            .map(|tag| tag.parse())
            .collect::<Result<Vec<RecipeTag>, TypeError>>()?;
        tags.sort();
        tags.dedup();

        Ok(Self {
            id: row.id,
            author_id: row.author_id,
            author_username: row.author_username,
            title: row.title,
            slug: row.slug,
            text: row.text,
            image: row.image,
            cooking_time: row.cooking_time,
            pub_date: row.pub_date,
            tags,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RecipeDetail {
    pub recipe: Recipe,
    pub ingredients: Vec<IngredientLine>,
}

/// Validated recipe form contents.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeDraft {
    pub title: String,
    pub text: String,
    pub image: String,
    pub cooking_time: i32,
    pub tags: Vec<RecipeTag>,
    pub ingredients: Vec<DraftLine>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftLine {
    pub title: String,
    pub amount: i32,
}

/// A draft line whose ingredient title was resolved to a stored ingredient.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedLine {
    pub ingredient_id: Id,
    pub amount: i32,
}

/// Join row from a shop list entry down to one ingredient line.
#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq)]
pub struct PurchaseLine {
    pub recipe_id: Id,
    pub line_id: Id,
    pub ingredient_id: Id,
    pub title: String,
    pub dimension: String,
    pub amount: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShoppingListItem {
    pub title: String,
    pub dimension: String,
    pub total: i64,
}

#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorSummary {
    pub id: Id,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub recipe_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FollowedAuthor {
    pub author: AuthorSummary,
    pub recipes: Vec<Recipe>,
}
