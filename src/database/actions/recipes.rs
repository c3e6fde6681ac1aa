use std::collections::HashSet;

use crate::{
    authentication::{jwt::SessionData, permissions::ActionType},
    constants::{COOKING_TIME_MAX, COOKING_TIME_MIN, INGREDIENT_AMOUNT_MIN, LENGTH_TEXT_150},
    error::ServiceError,
    pagination::{PageContext, Pagination},
    schema::{
        IngredientAmount, Recipe, RecipeDetail, RecipeFilter, RecipeForm, RelationKind, Uuid,
        ValidatedRecipe,
    },
    store::Store,
};

use super::{require_text, users::get_user_profile};

/// Shape checks on the ingredient lines that need no lookups.
pub fn check_ingredient_lines(lines: &[IngredientAmount]) -> Result<(), ServiceError> {
    if lines.is_empty() {
        return Err(ServiceError::validation(
            "ingredients",
            "A recipe needs at least one ingredient",
        ));
    }

    let mut seen = HashSet::with_capacity(lines.len());
    for line in lines {
        if !seen.insert(line.id) {
            return Err(ServiceError::validation(
                "ingredients",
                format!("Ingredient {} is listed more than once", line.id),
            ));
        }
        if line.amount < INGREDIENT_AMOUNT_MIN {
            return Err(ServiceError::validation(
                "amount",
                format!("Amount of ingredient {} must be at least {INGREDIENT_AMOUNT_MIN}", line.id),
            ));
        }
    }
    Ok(())
}

pub fn check_cooking_time(cooking_time: i32) -> Result<(), ServiceError> {
    if !(COOKING_TIME_MIN..=COOKING_TIME_MAX).contains(&cooking_time) {
        return Err(ServiceError::validation(
            "cooking_time",
            format!("Cooking time must be between {COOKING_TIME_MIN} and {COOKING_TIME_MAX} minutes"),
        ));
    }
    Ok(())
}

/// Runs every recipe check, resolving tag and ingredient ids against the store.
/// Nothing is written here.
pub async fn validate_recipe<S: Store>(
    store: &S,
    form: RecipeForm,
) -> Result<ValidatedRecipe, ServiceError> {
    require_text("name", &form.name, LENGTH_TEXT_150)?;
    require_text("text", &form.text, usize::MAX)?;
    require_text("image", &form.image, usize::MAX)?;
    check_cooking_time(form.cooking_time)?;
    check_ingredient_lines(&form.ingredients)?;

    let ids: Vec<Uuid> = form.ingredients.iter().map(|line| line.id).collect();
    let found = store.find_ingredients(&ids).await?;
    if let Some(missing) = ids.iter().find(|id| !found.iter().any(|i| i.id == **id)) {
        return Err(ServiceError::validation(
            "ingredients",
            format!("Ingredient {missing} does not exist"),
        ));
    }

    let mut tag_ids = Vec::with_capacity(form.tags.len());
    for id in form.tags {
        if !tag_ids.contains(&id) {
            tag_ids.push(id);
        }
    }
    let found = store.find_tags(&tag_ids).await?;
    if let Some(missing) = tag_ids.iter().find(|id| !found.iter().any(|t| t.id == **id)) {
        return Err(ServiceError::validation(
            "tags",
            format!("Tag {missing} does not exist"),
        ));
    }

    Ok(ValidatedRecipe {
        name: form.name,
        text: form.text,
        cooking_time: form.cooking_time,
        image: form.image,
        tag_ids,
        ingredients: form.ingredients,
    })
}

pub async fn recipe_detail<S: Store>(
    store: &S,
    viewer: Option<&SessionData>,
    recipe: Recipe,
) -> Result<RecipeDetail, ServiceError> {
    let author = get_user_profile(store, viewer, recipe.author_id).await?;
    let tags = store.recipe_tags(recipe.id).await?;
    let ingredients = store.recipe_ingredients(recipe.id).await?;

    let (is_favorited, is_in_shopping_cart) = match viewer {
        Some(viewer) => (
            store
                .relation_exists(RelationKind::Favorite, viewer.user_id, recipe.id)
                .await?,
            store
                .relation_exists(RelationKind::Cart, viewer.user_id, recipe.id)
                .await?,
        ),
        None => (false, false),
    };

    Ok(RecipeDetail {
        recipe,
        author,
        tags,
        ingredients,
        is_favorited,
        is_in_shopping_cart,
    })
}

pub async fn create_recipe<S: Store>(
    store: &S,
    session: &SessionData,
    form: RecipeForm,
) -> Result<RecipeDetail, ServiceError> {
    session.authenticate(ActionType::ManageOwnRecipes)?;

    let recipe = validate_recipe(store, form).await?;
    let recipe = store.insert_recipe(session.user_id, &recipe).await?;

    log::info!("User {} created recipe {}", session.user_id, recipe.id);
    recipe_detail(store, Some(session), recipe).await
}

/// Fetches a recipe the session is allowed to change.
pub async fn get_recipe_mut<S: Store>(
    store: &S,
    session: &SessionData,
    id: Uuid,
) -> Result<Recipe, ServiceError> {
    let recipe = store
        .get_recipe(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(String::from("Recipe not found")))?;

    session.authenticate_recipe(&recipe)?;
    Ok(recipe)
}

pub async fn update_recipe<S: Store>(
    store: &S,
    session: &SessionData,
    id: Uuid,
    form: RecipeForm,
) -> Result<RecipeDetail, ServiceError> {
    get_recipe_mut(store, session, id).await?;

    let recipe = validate_recipe(store, form).await?;
    let recipe = store
        .replace_recipe(id, &recipe)
        .await?
        .ok_or_else(|| ServiceError::NotFound(String::from("Recipe not found")))?;

    log::info!("User {} updated recipe {}", session.user_id, recipe.id);
    recipe_detail(store, Some(session), recipe).await
}

pub async fn delete_recipe<S: Store>(
    store: &S,
    session: &SessionData,
    id: Uuid,
) -> Result<(), ServiceError> {
    get_recipe_mut(store, session, id).await?;

    if !store.delete_recipe(id).await? {
        return Err(ServiceError::NotFound(String::from("Recipe not found")));
    }

    log::info!("User {} deleted recipe {}", session.user_id, id);
    Ok(())
}

pub async fn get_recipe<S: Store>(
    store: &S,
    viewer: Option<&SessionData>,
    id: Uuid,
) -> Result<RecipeDetail, ServiceError> {
    let recipe = store
        .get_recipe(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(String::from("Recipe not found")))?;

    recipe_detail(store, viewer, recipe).await
}

pub async fn fetch_recipes<S: Store>(
    store: &S,
    viewer: Option<&SessionData>,
    filter: &RecipeFilter,
    pagination: Pagination,
) -> Result<PageContext<RecipeDetail>, ServiceError> {
    let (rows, total) = store
        .list_recipes(filter, viewer.map(|v| v.user_id), pagination)
        .await?;

    let mut details = Vec::with_capacity(rows.len());
    for recipe in rows {
        details.push(recipe_detail(store, viewer, recipe).await?);
    }

    Ok(PageContext::from_rows(details, total, pagination))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(id: Uuid, amount: i32) -> IngredientAmount {
        IngredientAmount { id, amount }
    }

    #[test]
    fn empty_ingredient_list_is_rejected() {
        assert!(matches!(
            check_ingredient_lines(&[]),
            Err(ServiceError::Validation { field, .. }) if field == "ingredients"
        ));
    }

    #[test]
    fn duplicate_ingredient_is_rejected() {
        assert!(check_ingredient_lines(&[line(1, 10), line(2, 5), line(1, 3)]).is_err());
    }

    #[test]
    fn amount_must_be_positive() {
        assert!(check_ingredient_lines(&[line(1, 1)]).is_ok());
        assert!(matches!(
            check_ingredient_lines(&[line(1, 0)]),
            Err(ServiceError::Validation { field, .. }) if field == "amount"
        ));
        assert!(check_ingredient_lines(&[line(1, -5)]).is_err());
    }

    #[test]
    fn cooking_time_bounds_are_inclusive() {
        assert!(check_cooking_time(1).is_ok());
        assert!(check_cooking_time(720).is_ok());
        assert!(check_cooking_time(0).is_err());
        assert!(check_cooking_time(721).is_err());
    }
}
