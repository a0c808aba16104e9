//! URL slugs for recipes.

use crate::SLUG_MAX_LEN;

fn transliterate(c: char) -> Option<&'static str> {
    let latin = match c {
        'а' => "a",
        'б' => "b",
        'в' => "v",
        'г' => "g",
        'д' => "d",
        'е' => "e",
        'ё' => "yo",
        'ж' => "zh",
        'з' => "z",
        'и' => "i",
        'й' => "y",
        'к' => "k",
        'л' => "l",
        'м' => "m",
        'н' => "n",
        'о' => "o",
        'п' => "p",
        'р' => "r",
        'с' => "s",
        'т' => "t",
        'у' => "u",
        'ф' => "f",
        'х' => "h",
        'ц' => "ts",
        'ч' => "ch",
        'ш' => "sh",
        'щ' => "sch",
        'ъ' | 'ь' => "",
        'ы' => "y",
        'э' => "e",
        'ю' => "yu",
        'я' => "ya",
        _ => return None,
    };
    Some(latin)
}

/// Lowercase ASCII slug. Cyrillic is transliterated, everything else that is
/// not alphanumeric collapses into single hyphens.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut prev_hyphen = true;

    for c in text.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
            prev_hyphen = false;
        } else if let Some(latin) = transliterate(c) {
            slug.push_str(latin);
            prev_hyphen = prev_hyphen && latin.is_empty();
        } else if !prev_hyphen {
            slug.push('-');
            prev_hyphen = true;
        }
    }

    let mut slug = slug.trim_matches('-').to_string();
    slug.truncate(SLUG_MAX_LEN);
    slug
}

/// Base slug of a recipe: `"{author full name}-{title}"`.
pub fn recipe_slug(full_name: &str, title: &str) -> String {
    let slug = slugify(&format!("{full_name}-{title}"));
    if slug.is_empty() {
        return String::from("recipe");
    }
    slug
}

/// `base` on the first attempt, `base-{attempt}` afterwards.
pub fn with_suffix(base: &str, attempt: u32) -> String {
    if attempt <= 1 {
        return base.to_string();
    }

    let suffix = format!("-{attempt}");
    let mut base = base.to_string();
    base.truncate(SLUG_MAX_LEN.saturating_sub(suffix.len()));
    format!("{}{suffix}", base.trim_end_matches('-'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cyrillic_is_transliterated() {
        assert_eq!(
            recipe_slug("Иван Петров", "Борщ с ёжиком"),
            "ivan-petrov-borsch-s-yozhikom"
        );
    }

    #[test]
    fn separators_collapse() {
        assert_eq!(slugify("  Pancakes -- with   jam! "), "pancakes-with-jam");
        assert_eq!(slugify("Подъезд"), "podezd");
        assert_eq!(recipe_slug("", "!!!"), "recipe");
    }

    #[test]
    fn suffixes_start_at_two() {
        assert_eq!(with_suffix("soup", 1), "soup");
        assert_eq!(with_suffix("soup", 2), "soup-2");

        let long = "a".repeat(SLUG_MAX_LEN);
        assert_eq!(with_suffix(&long, 12).len(), SLUG_MAX_LEN);
    }
}
