mod common;

use common::{ingredient, session, user};
use foodgram_sdk::{
    create_ingredient, create_tag, fetch_users, get_current_user, login_user, register_user,
    search_ingredients, set_password, list_tags,
    error::ServiceError,
    jwt::verify_jwt_session,
    pagination::Pagination,
    schema::{IngredientForm, TagForm, UserForm, UserRole},
    Config, MemoryStore,
};

fn config() -> Config {
    Config {
        database_url: String::new(),
        max_connections: 1,
        jwt_secret: String::from("users-test-secret"),
        session_hours: 1,
        page_size: 6,
    }
}

fn form(email: &str, username: &str) -> UserForm {
    UserForm {
        email: email.to_string(),
        username: username.to_string(),
        first_name: String::from("Ann"),
        last_name: String::from("Cook"),
        password: String::from("correct horse"),
    }
}

#[tokio::test]
async fn register_login_and_change_password() {
    let store = MemoryStore::new();
    let config = config();

    let registered = register_user(&store, form("ann@example.com", "ann"))
        .await
        .unwrap();
    assert_ne!(registered.password, "correct horse");
    assert_eq!(registered.role, UserRole::User);

    let token = login_user(&store, &config, "ANN@example.com", "correct horse")
        .await
        .unwrap();
    let claims = verify_jwt_session(&token, &config.jwt_secret).unwrap();
    assert_eq!(claims.user_id, registered.id);

    let wrong_password = login_user(&store, &config, "ann@example.com", "nope").await;
    let wrong_email = login_user(&store, &config, "bob@example.com", "correct horse").await;
    assert_eq!(wrong_password, wrong_email);
    assert!(matches!(wrong_email, Err(ServiceError::Unauthorized(_))));

    let ann = session(&registered);
    assert!(matches!(
        set_password(&store, &ann, "nope", "new secret").await,
        Err(ServiceError::Validation { .. })
    ));
    set_password(&store, &ann, "correct horse", "new secret")
        .await
        .unwrap();
    login_user(&store, &config, "ann@example.com", "new secret")
        .await
        .unwrap();

    let me = get_current_user(&store, &ann).await.unwrap();
    assert_eq!(me.username, "ann");
    assert!(!me.is_subscribed);
}

#[tokio::test]
async fn duplicate_and_malformed_registrations() {
    let store = MemoryStore::new();
    register_user(&store, form("ann@example.com", "ann"))
        .await
        .unwrap();

    assert!(matches!(
        register_user(&store, form("Ann@Example.com", "ann2")).await,
        Err(ServiceError::AlreadyExists(_))
    ));
    assert!(matches!(
        register_user(&store, form("other@example.com", "ann")).await,
        Err(ServiceError::AlreadyExists(_))
    ));
    assert!(matches!(
        register_user(&store, form("not-an-email", "bob")).await,
        Err(ServiceError::Validation { field, .. }) if field == "email"
    ));
    assert!(matches!(
        register_user(&store, form("bob@example.com", "bob smith")).await,
        Err(ServiceError::Validation { field, .. }) if field == "username"
    ));

    let page = fetch_users(&store, None, Pagination::first(6)).await.unwrap();
    assert_eq!(page.total_rows, 1);
}

#[tokio::test]
async fn reference_data_is_admin_only() {
    let store = MemoryStore::new();
    let cook = session(&user(&store, "cook", UserRole::User).await);
    let admin = session(&user(&store, "admin", UserRole::Admin).await);

    let breakfast = TagForm {
        name: String::from("Breakfast"),
        color: String::from("#f5a623"),
        slug: String::from("breakfast"),
    };
    assert_eq!(
        create_tag(&store, &cook, breakfast.clone()).await,
        Err(ServiceError::Forbidden)
    );
    let tag = create_tag(&store, &admin, breakfast.clone()).await.unwrap();
    assert_eq!(tag.color, "#F5A623");
    assert!(matches!(
        create_tag(&store, &admin, breakfast).await,
        Err(ServiceError::AlreadyExists(_))
    ));
    assert_eq!(list_tags(&store).await.unwrap(), vec![tag]);

    let flour = IngredientForm {
        name: String::from("Flour"),
        measurement_unit: String::from("g"),
    };
    assert_eq!(
        create_ingredient(&store, &cook, flour.clone()).await,
        Err(ServiceError::Forbidden)
    );
    create_ingredient(&store, &admin, flour.clone()).await.unwrap();
    assert!(matches!(
        create_ingredient(&store, &admin, flour).await,
        Err(ServiceError::AlreadyExists(_))
    ));
    create_ingredient(
        &store,
        &admin,
        IngredientForm {
            name: String::from("Fennel"),
            measurement_unit: String::from("g"),
        },
    )
    .await
    .unwrap();

    let found = search_ingredients(&store, Some("^fl")).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "Flour");
    assert_eq!(search_ingredients(&store, None).await.unwrap().len(), 2);
}

#[tokio::test]
async fn shorthand_color_collides_with_its_full_form() {
    let store = MemoryStore::new();
    let admin = session(&user(&store, "admin", UserRole::Admin).await);

    let lunch = create_tag(
        &store,
        &admin,
        TagForm {
            name: String::from("Lunch"),
            color: String::from("#abc"),
            slug: String::from("lunch"),
        },
    )
    .await
    .unwrap();
    assert_eq!(lunch.color, "#AABBCC");

    assert!(matches!(
        create_tag(
            &store,
            &admin,
            TagForm {
                name: String::from("Brunch"),
                color: String::from("#AaBbCc"),
                slug: String::from("brunch"),
            },
        )
        .await,
        Err(ServiceError::AlreadyExists(_))
    ));
}

#[tokio::test]
async fn ingredient_search_orders_byte_wise() {
    let store = MemoryStore::new();
    ingredient(&store, "apple", "g").await;
    ingredient(&store, "Zucchini", "g").await;
    ingredient(&store, "Apple", "pcs").await;

    let names: Vec<_> = search_ingredients(&store, None)
        .await
        .unwrap()
        .into_iter()
        .map(|i| i.name)
        .collect();
    assert_eq!(names, vec!["Apple", "Zucchini", "apple"]);
}
