mod common;

use std::sync::Arc;

use common::{ingredient, recipe_form, session, user};
use foodgram_sdk::{
    add_favorite, add_relation, add_to_shopping_cart, create_recipe, delete_recipe,
    get_user_profile, list_for_user, list_subscriptions, relation_exists, remove_favorite,
    remove_relation, subscribe, unsubscribe,
    error::ServiceError,
    pagination::Pagination,
    schema::{RelationKind, UserRole},
    MemoryStore,
};

#[tokio::test]
async fn second_add_is_rejected() {
    let store = MemoryStore::new();
    let cook = session(&user(&store, "cook", UserRole::User).await);
    let flour = ingredient(&store, "Flour", "g").await;
    let recipe = create_recipe(&store, &cook, recipe_form("Bread", vec![], &[(flour.id, 1)]))
        .await
        .unwrap()
        .recipe;

    for kind in [RelationKind::Favorite, RelationKind::Cart] {
        add_relation(&store, kind, cook.user_id, recipe.id)
            .await
            .unwrap();
        assert!(matches!(
            add_relation(&store, kind, cook.user_id, recipe.id).await,
            Err(ServiceError::AlreadyExists(_))
        ));
        assert!(relation_exists(&store, kind, cook.user_id, recipe.id)
            .await
            .unwrap());
    }
}

#[tokio::test]
async fn self_subscription_is_rejected() {
    let store = MemoryStore::new();
    let cook = user(&store, "cook", UserRole::User).await;

    assert_eq!(
        add_relation(&store, RelationKind::Subscription, cook.id, cook.id).await,
        Err(ServiceError::SelfRelation)
    );
    assert!(matches!(
        subscribe(&store, &session(&cook), cook.id, None).await,
        Err(ServiceError::SelfRelation)
    ));
}

#[tokio::test]
async fn missing_relation_or_target_is_not_found() {
    let store = MemoryStore::new();
    let cook = session(&user(&store, "cook", UserRole::User).await);

    assert!(matches!(
        remove_relation(&store, RelationKind::Favorite, cook.user_id, 42).await,
        Err(ServiceError::NotFound(_))
    ));
    assert!(matches!(
        add_favorite(&store, &cook, 42).await,
        Err(ServiceError::NotFound(_))
    ));
    assert!(matches!(
        unsubscribe(&store, &cook, 42).await,
        Err(ServiceError::NotFound(_))
    ));
}

#[tokio::test]
async fn remove_then_add_again() {
    let store = MemoryStore::new();
    let cook = session(&user(&store, "cook", UserRole::User).await);
    let flour = ingredient(&store, "Flour", "g").await;
    let recipe = create_recipe(&store, &cook, recipe_form("Bread", vec![], &[(flour.id, 1)]))
        .await
        .unwrap()
        .recipe;

    let short = add_favorite(&store, &cook, recipe.id).await.unwrap();
    assert_eq!(short.name, "Bread");
    remove_favorite(&store, &cook, recipe.id).await.unwrap();
    assert!(!relation_exists(&store, RelationKind::Favorite, cook.user_id, recipe.id)
        .await
        .unwrap());
    add_favorite(&store, &cook, recipe.id).await.unwrap();
}

#[tokio::test]
async fn concurrent_adds_leave_one_relation() {
    let store = Arc::new(MemoryStore::new());
    let cook = session(&user(&store, "cook", UserRole::User).await);
    let flour = ingredient(&store, "Flour", "g").await;
    let recipe = create_recipe(&*store, &cook, recipe_form("Bread", vec![], &[(flour.id, 1)]))
        .await
        .unwrap()
        .recipe;

    let mut handles = vec![];
    for _ in 0..8 {
        let store = store.clone();
        let (user_id, recipe_id) = (cook.user_id, recipe.id);
        handles.push(tokio::spawn(async move {
            add_relation(&*store, RelationKind::Cart, user_id, recipe_id).await
        }));
    }

    let mut created = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => created += 1,
            Err(e) => assert!(matches!(e, ServiceError::AlreadyExists(_))),
        }
    }
    assert_eq!(created, 1);

    let relations = list_for_user(&*store, RelationKind::Cart, cook.user_id, None)
        .await
        .unwrap();
    assert_eq!(relations.len(), 1);
}

#[tokio::test]
async fn subscriptions_list_newest_first_with_recipe_limit() {
    let store = MemoryStore::new();
    let reader = session(&user(&store, "reader", UserRole::User).await);
    let first = session(&user(&store, "first", UserRole::User).await);
    let second = session(&user(&store, "second", UserRole::User).await);
    let flour = ingredient(&store, "Flour", "g").await;

    for name in ["One", "Two", "Three"] {
        create_recipe(&store, &first, recipe_form(name, vec![], &[(flour.id, 1)]))
            .await
            .unwrap();
    }

    let entry = subscribe(&store, &reader, first.user_id, Some(2)).await.unwrap();
    assert!(entry.author.is_subscribed);
    assert_eq!(entry.recipes_count, 3);
    let names: Vec<_> = entry.recipes.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Three", "Two"]);

    subscribe(&store, &reader, second.user_id, None).await.unwrap();
    assert!(matches!(
        subscribe(&store, &reader, second.user_id, None).await,
        Err(ServiceError::AlreadyExists(_))
    ));

    let page = list_subscriptions(&store, &reader, Pagination::first(10), Some(1))
        .await
        .unwrap();
    assert_eq!(page.total_rows, 2);
    assert_eq!(page.rows[0].author.id, second.user_id);
    assert_eq!(page.rows[1].author.id, first.user_id);
    assert_eq!(page.rows[1].recipes.len(), 1);

    let limited = list_for_user(&store, RelationKind::Subscription, reader.user_id, Some(1))
        .await
        .unwrap();
    assert_eq!(limited.len(), 1);
    assert_eq!(limited[0].target_id, second.user_id);

    let profile = get_user_profile(&store, Some(&reader), first.user_id)
        .await
        .unwrap();
    assert!(profile.is_subscribed);
    let profile = get_user_profile(&store, None, first.user_id).await.unwrap();
    assert!(!profile.is_subscribed);
}

#[tokio::test]
async fn deleting_a_recipe_drops_its_relations() {
    let store = MemoryStore::new();
    let cook = session(&user(&store, "cook", UserRole::User).await);
    let flour = ingredient(&store, "Flour", "g").await;
    let recipe = create_recipe(&store, &cook, recipe_form("Bread", vec![], &[(flour.id, 1)]))
        .await
        .unwrap()
        .recipe;

    add_to_shopping_cart(&store, &cook, recipe.id).await.unwrap();
    delete_recipe(&store, &cook, recipe.id).await.unwrap();

    assert!(list_for_user(&store, RelationKind::Cart, cook.user_id, None)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn negative_limits_are_rejected_before_any_write() {
    let store = MemoryStore::new();
    let reader = session(&user(&store, "reader", UserRole::User).await);
    let author = session(&user(&store, "author", UserRole::User).await);

    assert!(matches!(
        subscribe(&store, &reader, author.user_id, Some(-1)).await,
        Err(ServiceError::Validation { field, .. }) if field == "recipes_limit"
    ));
    assert!(!relation_exists(&store, RelationKind::Subscription, reader.user_id, author.user_id)
        .await
        .unwrap());

    assert!(matches!(
        list_subscriptions(&store, &reader, Pagination::first(10), Some(-1)).await,
        Err(ServiceError::Validation { field, .. }) if field == "recipes_limit"
    ));
    assert!(matches!(
        list_for_user(&store, RelationKind::Favorite, reader.user_id, Some(-5)).await,
        Err(ServiceError::Validation { field, .. }) if field == "limit"
    ));

    let entry = subscribe(&store, &reader, author.user_id, Some(0)).await.unwrap();
    assert!(entry.recipes.is_empty());
}
