pub const RECIPE_COUNT_PER_PAGE: i64 = 6;
pub const MAX_COUNT_PER_PAGE: i64 = 100;

pub const LENGTH_TEXT_150: usize = 150;
pub const LENGTH_EMAIL: usize = 254;
pub const LENGTH_COLOR: usize = 7;

pub const COOKING_TIME_MIN: i32 = 1;
pub const COOKING_TIME_MAX: i32 = 720;
pub const INGREDIENT_AMOUNT_MIN: i32 = 1;

pub const SHOPPING_LIST_HEADER: &str = "Shopping list:";
pub const SHOPPING_LIST_FILENAME: &str = "list_of_products.txt";

pub const AUTHORIZATION_SCHEME: &str = "Token ";
