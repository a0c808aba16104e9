use std::{collections::HashMap, str::FromStr};

use potion::{Error, HtmlError};
use serde_json::Value;

use super::{
    error::TypeError,
    schema::{DraftLine, RecipeDraft, RecipeTag},
};
use crate::RECIPE_TITLE_MAX_LEN;

pub type FormData = HashMap<String, Value>;

pub struct Form {
    inner: HashMap<String, Value>,
}

/// Account fields of the signup form. `password` is still plain text.
#[derive(Debug, Clone, PartialEq)]
pub struct SignupData {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

impl Form {
    pub fn from_data(data: FormData) -> Self {
        Self { inner: data }
    }

    /// Url-encoded bodies only carry strings.
    pub fn from_fields(fields: HashMap<String, String>) -> Self {
        Self::from_data(
            fields
                .into_iter()
                .map(|(k, v)| (k, Value::String(v)))
                .collect(),
        )
    }

    pub fn get_number<T>(&self, key: &str) -> Result<T, Error>
    where
        T: FromStr,
    {
        match self.inner.get(key) {
            Some(Value::Number(n)) => n
                .to_string()
                .parse()
                .map_err(|_e| TypeError::new("Invalid type conversion").into()),
            Some(value) => match value.as_str() {
                Some(v) => v
                    .trim()
                    .parse()
                    .map_err(|_e| TypeError::new("Invalid type conversion").into()),
                None => Err(TypeError::new("Failed to parse value as str").into()),
            },
            None => Err(TypeError::new("Invalid key").into()),
        }
    }

    pub fn get_str(&self, key: &str) -> Result<String, TypeError> {
        match self.inner.get(key) {
            Some(value) => match value.as_str() {
                Some(v) => Ok(v.to_string()),
                None => Err(TypeError::new("Invalid key")),
            },
            None => Err(TypeError::new("Invalid key")),
        }
    }

    /// Trimmed, non-empty string field.
    fn required(&self, key: &str, message: &str) -> Result<String, Error> {
        match self.get_str(key) {
            Ok(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
            _ => Err(HtmlError::InvalidRequest.new(message)),
        }
    }

    /// A checkbox counts as set when it was sent with any non-empty value.
    fn flag(&self, key: &str) -> bool {
        match self.inner.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => !s.is_empty(),
            Some(Value::Null) | None => false,
            Some(_) => true,
        }
    }

    /// Reads and validates the recipe form. Ingredient titles are not resolved here.
    pub fn recipe_draft(&self) -> Result<RecipeDraft, Error> {
        let title = self.required("title", "Title is required")?;
        if title.chars().count() > RECIPE_TITLE_MAX_LEN {
            return Err(HtmlError::InvalidRequest.new("Title is too long"));
        }

        let text = self.required("text", "Description is required")?;
        let cooking_time: i32 = self
            .get_number("time")
            .map_err(|_| HtmlError::InvalidRequest.new("Cooking time must be a number"))?;
        if cooking_time <= 0 {
            return Err(HtmlError::InvalidRequest.new("Cooking time must be positive"));
        }

        let tags: Vec<RecipeTag> = RecipeTag::ALL
            .into_iter()
            .filter(|tag| self.flag(tag.as_str()))
            .collect();
        if tags.is_empty() {
            return Err(HtmlError::InvalidRequest.new("Select at least one tag"));
        }

        let mut ingredients = vec![];
        for i in 1.. {
            let Ok(name) = self.get_str(&format!("nameIngredient_{i}")) else {
                break;
            };
            let amount: i32 = self
                .get_number(&format!("valueIngredient_{i}"))
                .map_err(|_| HtmlError::InvalidRequest.new("Ingredient amount must be a number"))?;
            if amount <= 0 {
                return Err(HtmlError::InvalidRequest.new("Ingredient amount must be positive"));
            }

            ingredients.push(DraftLine {
                title: name.trim().to_string(),
                amount,
            });
        }
        if ingredients.is_empty() {
            return Err(HtmlError::InvalidRequest.new("Add at least one ingredient"));
        }

        Ok(RecipeDraft {
            title,
            text,
            image: self.get_str("image").unwrap_or_default(),
            cooking_time,
            tags,
            ingredients,
        })
    }

    pub fn signup(&self) -> Result<SignupData, Error> {
        let username = self.required("username", "Username is required")?;
        let valid_username = username.chars().count() <= 150
            && username
                .chars()
                .all(|c| c.is_alphanumeric() || "@.+-_".contains(c));
        if !valid_username {
            return Err(HtmlError::InvalidRequest.new("Invalid username"));
        }

        let email = self.required("email", "Email is required")?;
        if !email.contains('@') {
            return Err(HtmlError::InvalidRequest.new("Invalid email"));
        }

        let password = self.get_str("password1").unwrap_or_default();
        if password.chars().count() < 8 {
            return Err(HtmlError::InvalidRequest.new("Password is too short"));
        }
        if self.get_str("password2").unwrap_or_default() != password {
            return Err(HtmlError::InvalidRequest.new("Passwords don't match"));
        }

        Ok(SignupData {
            username,
            email,
            first_name: self.required("first_name", "First name is required")?,
            last_name: self.required("last_name", "Last name is required")?,
            password,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> Form {
        Form::from_fields(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    fn recipe_fields() -> Vec<(&'static str, &'static str)> {
        vec![
            ("title", "Сырники"),
            ("text", "Смешать и обжарить"),
            ("time", "25"),
            ("BREAKFAST", "on"),
            ("nameIngredient_1", "Творог"),
            ("valueIngredient_1", "400"),
            ("nameIngredient_2", "Яйцо"),
            ("valueIngredient_2", "2"),
            ("nameIngredient_4", "Сахар"),
            ("valueIngredient_4", "50"),
        ]
    }

    #[test]
    fn recipe_form_reads_lines_until_a_gap() {
        let draft = form(&recipe_fields()).recipe_draft().unwrap();

        assert_eq!(draft.tags, vec![RecipeTag::Breakfast]);
        assert_eq!(draft.cooking_time, 25);
        assert_eq!(
            draft.ingredients,
            vec![
                DraftLine {
                    title: "Творог".to_string(),
                    amount: 400
                },
                DraftLine {
                    title: "Яйцо".to_string(),
                    amount: 2
                },
            ]
        );
    }

    #[test]
    fn recipe_form_requires_a_tag_and_an_ingredient() {
        let without_tag: Vec<_> = recipe_fields()
            .into_iter()
            .filter(|(k, _)| *k != "BREAKFAST")
            .collect();
        assert!(form(&without_tag).recipe_draft().is_err());

        let without_lines: Vec<_> = recipe_fields()
            .into_iter()
            .filter(|(k, _)| !k.contains("Ingredient"))
            .collect();
        assert!(form(&without_lines).recipe_draft().is_err());
    }

    #[test]
    fn recipe_form_rejects_bad_numbers_and_long_titles() {
        let mut negative = form(&recipe_fields());
        negative
            .inner
            .insert("valueIngredient_1".to_string(), Value::String("-3".to_string()));
        assert!(negative.recipe_draft().is_err());

        let title = "x".repeat(RECIPE_TITLE_MAX_LEN + 1);
        let mut long = form(&recipe_fields());
        long.inner.insert("title".to_string(), Value::String(title));
        assert!(long.recipe_draft().is_err());

        let mut zero_time = form(&recipe_fields());
        zero_time
            .inner
            .insert("time".to_string(), Value::String("0".to_string()));
        assert!(zero_time.recipe_draft().is_err());
    }

    #[test]
    fn signup_checks_passwords() {
        let fields = [
            ("username", "sarah"),
            ("email", "sarah@example.com"),
            ("first_name", "Sarah"),
            ("last_name", "Connor"),
            ("password1", "correct horse"),
            ("password2", "correct horse"),
        ];
        let data = form(&fields).signup().unwrap();
        assert_eq!(data.username, "sarah");

        let mut mismatch = form(&fields);
        mismatch
            .inner
            .insert("password2".to_string(), Value::String("other".to_string()));
        assert!(mismatch.signup().is_err());
    }
}
