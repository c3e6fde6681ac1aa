use async_trait::async_trait;

use crate::{
    error::ServiceError,
    pagination::Pagination,
    schema::{
        CartLine, Ingredient, IngredientForm, IngredientLine, NewUser, Recipe, RecipeFilter,
        Relation, RelationKind, Tag, TagForm, User, Uuid, ValidatedRecipe,
    },
};

/// Persistence primitives consumed by the actions.
///
/// Inserts that can collide with a uniqueness constraint return `Ok(None)`
/// when the row already exists; the check happens inside the store so two
/// concurrent writers can never both succeed. Recipe writes are atomic.
#[async_trait]
pub trait Store: Send + Sync {
    async fn create_user(&self, user: NewUser) -> Result<Option<User>, ServiceError>;
    async fn get_user(&self, id: Uuid) -> Result<Option<User>, ServiceError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, ServiceError>;
    async fn update_password(&self, id: Uuid, password: &str) -> Result<(), ServiceError>;
    /// Users ordered by username, plus the total count.
    async fn list_users(&self, pagination: Pagination) -> Result<(Vec<User>, i64), ServiceError>;

    async fn create_tag(&self, tag: TagForm) -> Result<Option<Tag>, ServiceError>;
    async fn get_tag(&self, id: Uuid) -> Result<Option<Tag>, ServiceError>;
    async fn find_tags(&self, ids: &[Uuid]) -> Result<Vec<Tag>, ServiceError>;
    async fn list_tags(&self) -> Result<Vec<Tag>, ServiceError>;

    async fn create_ingredient(
        &self,
        ingredient: IngredientForm,
    ) -> Result<Option<Ingredient>, ServiceError>;
    async fn get_ingredient(&self, id: Uuid) -> Result<Option<Ingredient>, ServiceError>;
    async fn find_ingredients(&self, ids: &[Uuid]) -> Result<Vec<Ingredient>, ServiceError>;
    /// Case-insensitive name prefix search, ordered by name.
    async fn search_ingredients(&self, prefix: &str) -> Result<Vec<Ingredient>, ServiceError>;

    async fn insert_recipe(
        &self,
        author_id: Uuid,
        recipe: &ValidatedRecipe,
    ) -> Result<Recipe, ServiceError>;
    /// Replaces fields, tag set and every ingredient line in one transaction.
    async fn replace_recipe(
        &self,
        id: Uuid,
        recipe: &ValidatedRecipe,
    ) -> Result<Option<Recipe>, ServiceError>;
    async fn delete_recipe(&self, id: Uuid) -> Result<bool, ServiceError>;
    async fn get_recipe(&self, id: Uuid) -> Result<Option<Recipe>, ServiceError>;
    async fn recipe_tags(&self, id: Uuid) -> Result<Vec<Tag>, ServiceError>;
    async fn recipe_ingredients(&self, id: Uuid) -> Result<Vec<IngredientLine>, ServiceError>;
    /// Recipes matching `filter`, newest first, plus the total count.
    async fn list_recipes(
        &self,
        filter: &RecipeFilter,
        viewer: Option<Uuid>,
        pagination: Pagination,
    ) -> Result<(Vec<Recipe>, i64), ServiceError>;
    /// Newest recipes of an author, truncated to `limit` when given.
    async fn recipes_by_author(
        &self,
        author_id: Uuid,
        limit: Option<i64>,
    ) -> Result<Vec<Recipe>, ServiceError>;
    async fn count_recipes_by_author(&self, author_id: Uuid) -> Result<i64, ServiceError>;

    async fn insert_relation(
        &self,
        kind: RelationKind,
        user_id: Uuid,
        target_id: Uuid,
    ) -> Result<Option<Relation>, ServiceError>;
    async fn delete_relation(
        &self,
        kind: RelationKind,
        user_id: Uuid,
        target_id: Uuid,
    ) -> Result<bool, ServiceError>;
    async fn relation_exists(
        &self,
        kind: RelationKind,
        user_id: Uuid,
        target_id: Uuid,
    ) -> Result<bool, ServiceError>;
    /// Relations of a user, newest first.
    async fn list_relations(
        &self,
        kind: RelationKind,
        user_id: Uuid,
        limit: Option<i64>,
        offset: i64,
    ) -> Result<Vec<Relation>, ServiceError>;
    async fn count_relations(&self, kind: RelationKind, user_id: Uuid)
        -> Result<i64, ServiceError>;

    /// Every ingredient line of every recipe in the user's cart, unmerged.
    async fn cart_lines(&self, user_id: Uuid) -> Result<Vec<CartLine>, ServiceError>;
}
