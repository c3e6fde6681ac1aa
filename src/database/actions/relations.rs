use crate::{
    authentication::{jwt::SessionData, permissions::ActionType},
    error::ServiceError,
    pagination::{PageContext, Pagination},
    schema::{Relation, RelationKind, ShortRecipe, SubscriptionEntry, UserProfile, Uuid},
    store::Store,
};

async fn target_exists<S: Store>(
    store: &S,
    kind: RelationKind,
    target_id: Uuid,
) -> Result<bool, ServiceError> {
    if kind.targets_user() {
        Ok(store.get_user(target_id).await?.is_some())
    } else {
        Ok(store.get_recipe(target_id).await?.is_some())
    }
}

/// Records that `user_id` relates to `target_id`.
///
/// Uniqueness is decided by the store's insert, so of two concurrent calls
/// for the same triple exactly one succeeds.
pub async fn add_relation<S: Store>(
    store: &S,
    kind: RelationKind,
    user_id: Uuid,
    target_id: Uuid,
) -> Result<Relation, ServiceError> {
    if kind.targets_user() && user_id == target_id {
        return Err(ServiceError::SelfRelation);
    }

    if !target_exists(store, kind, target_id).await? {
        let what = if kind.targets_user() { "User" } else { "Recipe" };
        return Err(ServiceError::NotFound(format!("{what} not found")));
    }

    let relation = store
        .insert_relation(kind, user_id, target_id)
        .await?
        .ok_or_else(|| {
            ServiceError::AlreadyExists(format!("Already in {}", kind.label()))
        })?;

    log::info!(
        "User {user_id} added {target_id} to {}",
        kind.label()
    );
    Ok(relation)
}

pub async fn remove_relation<S: Store>(
    store: &S,
    kind: RelationKind,
    user_id: Uuid,
    target_id: Uuid,
) -> Result<(), ServiceError> {
    if !store.delete_relation(kind, user_id, target_id).await? {
        return Err(ServiceError::NotFound(format!("Not in {}", kind.label())));
    }

    log::info!(
        "User {user_id} removed {target_id} from {}",
        kind.label()
    );
    Ok(())
}

pub async fn relation_exists<S: Store>(
    store: &S,
    kind: RelationKind,
    user_id: Uuid,
    target_id: Uuid,
) -> Result<bool, ServiceError> {
    store.relation_exists(kind, user_id, target_id).await
}

/// Truncation limits must not be negative; zero gives an empty list.
fn check_limit(field: &str, limit: Option<i64>) -> Result<(), ServiceError> {
    match limit {
        Some(limit) if limit < 0 => Err(ServiceError::validation(
            field,
            "Ensure this value is greater than or equal to 0",
        )),
        _ => Ok(()),
    }
}

/// Relations of a user, newest first, truncated to `limit` when given.
pub async fn list_for_user<S: Store>(
    store: &S,
    kind: RelationKind,
    user_id: Uuid,
    limit: Option<i64>,
) -> Result<Vec<Relation>, ServiceError> {
    check_limit("limit", limit)?;
    store.list_relations(kind, user_id, limit, 0).await
}

async fn short_recipe<S: Store>(store: &S, id: Uuid) -> Result<ShortRecipe, ServiceError> {
    store
        .get_recipe(id)
        .await?
        .map(ShortRecipe::from)
        .ok_or_else(|| ServiceError::NotFound(String::from("Recipe not found")))
}

pub async fn add_favorite<S: Store>(
    store: &S,
    session: &SessionData,
    recipe_id: Uuid,
) -> Result<ShortRecipe, ServiceError> {
    session.authenticate(ActionType::ManageOwnRelations)?;
    add_relation(store, RelationKind::Favorite, session.user_id, recipe_id).await?;
    short_recipe(store, recipe_id).await
}

pub async fn remove_favorite<S: Store>(
    store: &S,
    session: &SessionData,
    recipe_id: Uuid,
) -> Result<(), ServiceError> {
    session.authenticate(ActionType::ManageOwnRelations)?;
    remove_relation(store, RelationKind::Favorite, session.user_id, recipe_id).await
}

pub async fn add_to_shopping_cart<S: Store>(
    store: &S,
    session: &SessionData,
    recipe_id: Uuid,
) -> Result<ShortRecipe, ServiceError> {
    session.authenticate(ActionType::ManageOwnRelations)?;
    add_relation(store, RelationKind::Cart, session.user_id, recipe_id).await?;
    short_recipe(store, recipe_id).await
}

pub async fn remove_from_shopping_cart<S: Store>(
    store: &S,
    session: &SessionData,
    recipe_id: Uuid,
) -> Result<(), ServiceError> {
    session.authenticate(ActionType::ManageOwnRelations)?;
    remove_relation(store, RelationKind::Cart, session.user_id, recipe_id).await
}

async fn subscription_entry<S: Store>(
    store: &S,
    author_id: Uuid,
    recipes_limit: Option<i64>,
) -> Result<Option<SubscriptionEntry>, ServiceError> {
    let Some(author) = store.get_user(author_id).await? else {
        return Ok(None);
    };

    let recipes = store
        .recipes_by_author(author_id, recipes_limit)
        .await?
        .into_iter()
        .map(ShortRecipe::from)
        .collect();
    let recipes_count = store.count_recipes_by_author(author_id).await?;

    Ok(Some(SubscriptionEntry {
        author: UserProfile::from_user(author, true),
        recipes,
        recipes_count,
    }))
}

pub async fn subscribe<S: Store>(
    store: &S,
    session: &SessionData,
    author_id: Uuid,
    recipes_limit: Option<i64>,
) -> Result<SubscriptionEntry, ServiceError> {
    session.authenticate(ActionType::ManageOwnRelations)?;
    check_limit("recipes_limit", recipes_limit)?;
    add_relation(store, RelationKind::Subscription, session.user_id, author_id).await?;

    subscription_entry(store, author_id, recipes_limit)
        .await?
        .ok_or_else(|| ServiceError::NotFound(String::from("User not found")))
}

pub async fn unsubscribe<S: Store>(
    store: &S,
    session: &SessionData,
    author_id: Uuid,
) -> Result<(), ServiceError> {
    session.authenticate(ActionType::ManageOwnRelations)?;
    remove_relation(store, RelationKind::Subscription, session.user_id, author_id).await
}

/// Authors the session follows, newest subscription first, each with up to
/// `recipes_limit` of their latest recipes.
pub async fn list_subscriptions<S: Store>(
    store: &S,
    session: &SessionData,
    pagination: Pagination,
    recipes_limit: Option<i64>,
) -> Result<PageContext<SubscriptionEntry>, ServiceError> {
    check_limit("recipes_limit", recipes_limit)?;

    let kind = RelationKind::Subscription;
    let total = store.count_relations(kind, session.user_id).await?;
    let relations = store
        .list_relations(
            kind,
            session.user_id,
            Some(pagination.limit),
            pagination.offset(),
        )
        .await?;

    let mut rows = Vec::with_capacity(relations.len());
    for relation in relations {
        if let Some(entry) = subscription_entry(store, relation.target_id, recipes_limit).await? {
            rows.push(entry);
        }
    }

    Ok(PageContext::from_rows(rows, total, pagination))
}
