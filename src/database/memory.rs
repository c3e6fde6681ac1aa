use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use crate::{
    error::ServiceError,
    pagination::Pagination,
    schema::{
        CartLine, Ingredient, IngredientAmount, IngredientForm, IngredientLine, NewUser, Recipe,
        RecipeFilter, Relation, RelationKind, Tag, TagForm, User, Uuid, ValidatedRecipe,
    },
    store::Store,
};

#[derive(Default)]
struct MemoryState {
    last_id: Uuid,
    users: Vec<User>,
    tags: Vec<Tag>,
    ingredients: Vec<Ingredient>,
    recipes: Vec<Recipe>,
    recipe_tags: Vec<(Uuid, Uuid)>,
    recipe_ingredients: Vec<(Uuid, IngredientAmount)>,
    relations: Vec<Relation>,
}

impl MemoryState {
    fn next_id(&mut self) -> Uuid {
        self.last_id += 1;
        self.last_id
    }

    fn has_relation(&self, kind: RelationKind, user_id: Uuid, target_id: Uuid) -> bool {
        self.relations
            .iter()
            .any(|r| r.kind == kind && r.user_id == user_id && r.target_id == target_id)
    }

    fn recipe_has_any_tag(&self, recipe_id: Uuid, slugs: &[String]) -> bool {
        self.recipe_tags
            .iter()
            .filter(|(r, _)| *r == recipe_id)
            .filter_map(|(_, tag_id)| self.tags.iter().find(|t| t.id == *tag_id))
            .any(|tag| slugs.contains(&tag.slug))
    }

    fn relation_condition(
        &self,
        kind: RelationKind,
        flag: Option<bool>,
        viewer: Option<Uuid>,
        recipe_id: Uuid,
    ) -> bool {
        match (flag, viewer) {
            (Some(flag), Some(viewer)) => self.has_relation(kind, viewer, recipe_id) == flag,
            (Some(true), None) => false,
            _ => true,
        }
    }

    fn matches(&self, recipe: &Recipe, filter: &RecipeFilter, viewer: Option<Uuid>) -> bool {
        filter.author.map_or(true, |author| recipe.author_id == author)
            && (filter.tags.is_empty() || self.recipe_has_any_tag(recipe.id, &filter.tags))
            && self.relation_condition(
                RelationKind::Favorite,
                filter.is_favorited,
                viewer,
                recipe.id,
            )
            && self.relation_condition(
                RelationKind::Cart,
                filter.is_in_shopping_cart,
                viewer,
                recipe.id,
            )
    }

    fn link_recipe(&mut self, recipe_id: Uuid, recipe: &ValidatedRecipe) {
        self.recipe_tags.retain(|(r, _)| *r != recipe_id);
        self.recipe_ingredients.retain(|(r, _)| *r != recipe_id);

        self.recipe_tags
            .extend(recipe.tag_ids.iter().map(|tag_id| (recipe_id, *tag_id)));
        self.recipe_ingredients
            .extend(recipe.ingredients.iter().map(|line| (recipe_id, *line)));
    }

    fn lines_of(&self, recipe_id: Uuid) -> Vec<IngredientLine> {
        let mut lines: Vec<IngredientLine> = self
            .recipe_ingredients
            .iter()
            .filter(|(r, _)| *r == recipe_id)
            .filter_map(|(_, line)| {
                self.ingredients
                    .iter()
                    .find(|i| i.id == line.id)
                    .map(|ingredient| IngredientLine {
                        recipe_id,
                        ingredient_id: ingredient.id,
                        name: ingredient.name.to_owned(),
                        measurement_unit: ingredient.measurement_unit.to_owned(),
                        amount: line.amount,
                    })
            })
            .collect();
        lines.sort_by(|a, b| a.name.cmp(&b.name));
        lines
    }
}

fn newest_first(recipes: &mut [Recipe]) {
    recipes.sort_by(|a, b| (b.pub_date, b.id).cmp(&(a.pub_date, a.id)));
}

/// In-process `Store`. Every operation holds one lock, which gives the same
/// uniqueness and all-or-nothing guarantees as the database constraints.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<Option<User>, ServiceError> {
        let mut state = self.state.lock().await;
        let taken = state.users.iter().any(|u| {
            u.email.to_lowercase() == user.email.to_lowercase() || u.username == user.username
        });
        if taken {
            return Ok(None);
        }

        let user = User {
            id: state.next_id(),
            email: user.email,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            password: user.password,
            role: user.role,
        };
        state.users.push(user.clone());

        Ok(Some(user))
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, ServiceError> {
        let state = self.state.lock().await;
        Ok(state.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, ServiceError> {
        let state = self.state.lock().await;
        let email = email.to_lowercase();
        Ok(state
            .users
            .iter()
            .find(|u| u.email.to_lowercase() == email)
            .cloned())
    }

    async fn update_password(&self, id: Uuid, password: &str) -> Result<(), ServiceError> {
        let mut state = self.state.lock().await;
        if let Some(user) = state.users.iter_mut().find(|u| u.id == id) {
            user.password = password.to_string();
        }
        Ok(())
    }

    async fn list_users(&self, pagination: Pagination) -> Result<(Vec<User>, i64), ServiceError> {
        let state = self.state.lock().await;
        let mut users = state.users.clone();
        users.sort_by(|a, b| a.username.cmp(&b.username));

        let total = users.len() as i64;
        let rows = users
            .into_iter()
            .skip(pagination.offset() as usize)
            .take(pagination.limit as usize)
            .collect();

        Ok((rows, total))
    }

    async fn create_tag(&self, tag: TagForm) -> Result<Option<Tag>, ServiceError> {
        let mut state = self.state.lock().await;
        let taken = state
            .tags
            .iter()
            .any(|t| t.name == tag.name || t.color == tag.color || t.slug == tag.slug);
        if taken {
            return Ok(None);
        }

        let tag = Tag {
            id: state.next_id(),
            name: tag.name,
            color: tag.color,
            slug: tag.slug,
        };
        state.tags.push(tag.clone());

        Ok(Some(tag))
    }

    async fn get_tag(&self, id: Uuid) -> Result<Option<Tag>, ServiceError> {
        let state = self.state.lock().await;
        Ok(state.tags.iter().find(|t| t.id == id).cloned())
    }

    async fn find_tags(&self, ids: &[Uuid]) -> Result<Vec<Tag>, ServiceError> {
        let state = self.state.lock().await;
        let mut tags: Vec<Tag> = state
            .tags
            .iter()
            .filter(|t| ids.contains(&t.id))
            .cloned()
            .collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(tags)
    }

    async fn list_tags(&self) -> Result<Vec<Tag>, ServiceError> {
        let state = self.state.lock().await;
        let mut tags = state.tags.clone();
        tags.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(tags)
    }

    async fn create_ingredient(
        &self,
        ingredient: IngredientForm,
    ) -> Result<Option<Ingredient>, ServiceError> {
        let mut state = self.state.lock().await;
        let taken = state.ingredients.iter().any(|i| {
            i.name == ingredient.name && i.measurement_unit == ingredient.measurement_unit
        });
        if taken {
            return Ok(None);
        }

        let ingredient = Ingredient {
            id: state.next_id(),
            name: ingredient.name,
            measurement_unit: ingredient.measurement_unit,
        };
        state.ingredients.push(ingredient.clone());

        Ok(Some(ingredient))
    }

    async fn get_ingredient(&self, id: Uuid) -> Result<Option<Ingredient>, ServiceError> {
        let state = self.state.lock().await;
        Ok(state.ingredients.iter().find(|i| i.id == id).cloned())
    }

    async fn find_ingredients(&self, ids: &[Uuid]) -> Result<Vec<Ingredient>, ServiceError> {
        let state = self.state.lock().await;
        Ok(state
            .ingredients
            .iter()
            .filter(|i| ids.contains(&i.id))
            .cloned()
            .collect())
    }

    async fn search_ingredients(&self, prefix: &str) -> Result<Vec<Ingredient>, ServiceError> {
        let state = self.state.lock().await;
        let prefix = prefix.to_lowercase();
        let mut rows: Vec<Ingredient> = state
            .ingredients
            .iter()
            .filter(|i| i.name.to_lowercase().starts_with(&prefix))
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            (&a.name, &a.measurement_unit).cmp(&(&b.name, &b.measurement_unit))
        });

        Ok(rows)
    }

    async fn insert_recipe(
        &self,
        author_id: Uuid,
        recipe: &ValidatedRecipe,
    ) -> Result<Recipe, ServiceError> {
        let mut state = self.state.lock().await;
        let row = Recipe {
            id: state.next_id(),
            author_id,
            name: recipe.name.to_owned(),
            text: recipe.text.to_owned(),
            cooking_time: recipe.cooking_time,
            image: recipe.image.to_owned(),
            pub_date: Utc::now(),
        };

        state.recipes.push(row.clone());
        state.link_recipe(row.id, recipe);

        Ok(row)
    }

    async fn replace_recipe(
        &self,
        id: Uuid,
        recipe: &ValidatedRecipe,
    ) -> Result<Option<Recipe>, ServiceError> {
        let mut state = self.state.lock().await;
        let Some(row) = state.recipes.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };

        row.name = recipe.name.to_owned();
        row.text = recipe.text.to_owned();
        row.cooking_time = recipe.cooking_time;
        row.image = recipe.image.to_owned();
        let row = row.clone();

        state.link_recipe(id, recipe);

        Ok(Some(row))
    }

    async fn delete_recipe(&self, id: Uuid) -> Result<bool, ServiceError> {
        let mut state = self.state.lock().await;
        let before = state.recipes.len();
        state.recipes.retain(|r| r.id != id);
        if state.recipes.len() == before {
            return Ok(false);
        }

        state.recipe_tags.retain(|(r, _)| *r != id);
        state.recipe_ingredients.retain(|(r, _)| *r != id);
        state
            .relations
            .retain(|r| r.kind.targets_user() || r.target_id != id);

        Ok(true)
    }

    async fn get_recipe(&self, id: Uuid) -> Result<Option<Recipe>, ServiceError> {
        let state = self.state.lock().await;
        Ok(state.recipes.iter().find(|r| r.id == id).cloned())
    }

    async fn recipe_tags(&self, id: Uuid) -> Result<Vec<Tag>, ServiceError> {
        let state = self.state.lock().await;
        let mut tags: Vec<Tag> = state
            .recipe_tags
            .iter()
            .filter(|(r, _)| *r == id)
            .filter_map(|(_, tag_id)| state.tags.iter().find(|t| t.id == *tag_id))
            .cloned()
            .collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(tags)
    }

    async fn recipe_ingredients(&self, id: Uuid) -> Result<Vec<IngredientLine>, ServiceError> {
        let state = self.state.lock().await;
        Ok(state.lines_of(id))
    }

    async fn list_recipes(
        &self,
        filter: &RecipeFilter,
        viewer: Option<Uuid>,
        pagination: Pagination,
    ) -> Result<(Vec<Recipe>, i64), ServiceError> {
        let state = self.state.lock().await;
        let mut rows: Vec<Recipe> = state
            .recipes
            .iter()
            .filter(|r| state.matches(r, filter, viewer))
            .cloned()
            .collect();
        newest_first(&mut rows);

        let total = rows.len() as i64;
        let rows = rows
            .into_iter()
            .skip(pagination.offset() as usize)
            .take(pagination.limit as usize)
            .collect();

        Ok((rows, total))
    }

    async fn recipes_by_author(
        &self,
        author_id: Uuid,
        limit: Option<i64>,
    ) -> Result<Vec<Recipe>, ServiceError> {
        let state = self.state.lock().await;
        let mut rows: Vec<Recipe> = state
            .recipes
            .iter()
            .filter(|r| r.author_id == author_id)
            .cloned()
            .collect();
        newest_first(&mut rows);

        if let Some(limit) = limit {
            rows.truncate(limit.max(0) as usize);
        }

        Ok(rows)
    }

    async fn count_recipes_by_author(&self, author_id: Uuid) -> Result<i64, ServiceError> {
        let state = self.state.lock().await;
        Ok(state
            .recipes
            .iter()
            .filter(|r| r.author_id == author_id)
            .count() as i64)
    }

    async fn insert_relation(
        &self,
        kind: RelationKind,
        user_id: Uuid,
        target_id: Uuid,
    ) -> Result<Option<Relation>, ServiceError> {
        let mut state = self.state.lock().await;
        if state.has_relation(kind, user_id, target_id) {
            return Ok(None);
        }

        let relation = Relation {
            id: state.next_id(),
            kind,
            user_id,
            target_id,
            created_at: Utc::now(),
        };
        state.relations.push(relation.clone());

        Ok(Some(relation))
    }

    async fn delete_relation(
        &self,
        kind: RelationKind,
        user_id: Uuid,
        target_id: Uuid,
    ) -> Result<bool, ServiceError> {
        let mut state = self.state.lock().await;
        let before = state.relations.len();
        state
            .relations
            .retain(|r| !(r.kind == kind && r.user_id == user_id && r.target_id == target_id));

        Ok(state.relations.len() < before)
    }

    async fn relation_exists(
        &self,
        kind: RelationKind,
        user_id: Uuid,
        target_id: Uuid,
    ) -> Result<bool, ServiceError> {
        let state = self.state.lock().await;
        Ok(state.has_relation(kind, user_id, target_id))
    }

    async fn list_relations(
        &self,
        kind: RelationKind,
        user_id: Uuid,
        limit: Option<i64>,
        offset: i64,
    ) -> Result<Vec<Relation>, ServiceError> {
        let state = self.state.lock().await;
        let rows = state
            .relations
            .iter()
            .rev()
            .filter(|r| r.kind == kind && r.user_id == user_id)
            .skip(offset.max(0) as usize)
            .take(limit.map_or(usize::MAX, |limit| limit.max(0) as usize))
            .cloned()
            .collect();

        Ok(rows)
    }

    async fn count_relations(
        &self,
        kind: RelationKind,
        user_id: Uuid,
    ) -> Result<i64, ServiceError> {
        let state = self.state.lock().await;
        Ok(state
            .relations
            .iter()
            .filter(|r| r.kind == kind && r.user_id == user_id)
            .count() as i64)
    }

    async fn cart_lines(&self, user_id: Uuid) -> Result<Vec<CartLine>, ServiceError> {
        let state = self.state.lock().await;
        let lines = state
            .relations
            .iter()
            .filter(|r| r.kind == RelationKind::Cart && r.user_id == user_id)
            .flat_map(|r| state.lines_of(r.target_id))
            .map(|line| CartLine {
                name: line.name,
                measurement_unit: line.measurement_unit,
                amount: line.amount,
            })
            .collect();

        Ok(lines)
    }
}
