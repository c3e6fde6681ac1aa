use crate::{
    authentication::{jwt::SessionData, permissions::ActionType},
    constants::LENGTH_TEXT_150,
    error::ServiceError,
    schema::{Ingredient, IngredientForm, Uuid},
    store::Store,
};

use super::require_text;

pub async fn create_ingredient<S: Store>(
    store: &S,
    session: &SessionData,
    form: IngredientForm,
) -> Result<Ingredient, ServiceError> {
    session.authenticate(ActionType::ManageIngredients)?;

    require_text("name", &form.name, LENGTH_TEXT_150)?;
    require_text("measurement_unit", &form.measurement_unit, LENGTH_TEXT_150)?;

    let form = IngredientForm {
        name: form.name.trim().to_string(),
        measurement_unit: form.measurement_unit.trim().to_string(),
    };

    let ingredient = store.create_ingredient(form).await?.ok_or_else(|| {
        ServiceError::AlreadyExists(String::from(
            "This ingredient already exists with that measurement unit",
        ))
    })?;

    log::info!(
        "User {} created ingredient {} ({}, {})",
        session.user_id,
        ingredient.id,
        ingredient.name,
        ingredient.measurement_unit
    );
    Ok(ingredient)
}

/// Ingredients whose name starts with `query`, case-insensitively.
/// A leading `^` is accepted and ignored. An empty query lists everything.
pub async fn search_ingredients<S: Store>(
    store: &S,
    query: Option<&str>,
) -> Result<Vec<Ingredient>, ServiceError> {
    let prefix = query
        .map(|q| q.trim().trim_start_matches('^'))
        .unwrap_or_default();

    store.search_ingredients(prefix).await
}

pub async fn get_ingredient<S: Store>(store: &S, id: Uuid) -> Result<Ingredient, ServiceError> {
    store
        .get_ingredient(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(String::from("Ingredient not found")))
}
