pub const RECIPE_COUNT_PER_PAGE: i64 = 6;
pub const FOLLOWED_AUTHOR_PREVIEW: i64 = 3;

/// Cookie carrying the signed JWT of an authenticated user.
pub const SESSION_COOKIE: &str = "session";
/// Session attribute holding the surrogate key of an anonymous shopper.
pub const PURCHASE_SESSION_KEY: &str = "purchase_id";

pub const INGREDIENT_QUERY_MIN_LEN: usize = 3;
pub const RECIPE_TITLE_MAX_LEN: usize = 50;
pub const SLUG_MAX_LEN: usize = 255;
pub const SESSION_KEY_MAX_LEN: usize = 1024;

pub const SHOPPING_LIST_FILENAME: &str = "Shop list.pdf";
