#![allow(dead_code)]

use foodgram_sdk::{
    jwt::SessionData,
    schema::{
        Ingredient, IngredientAmount, IngredientForm, NewUser, RecipeForm, Tag, TagForm, User,
        UserRole, Uuid,
    },
    MemoryStore, Store,
};

pub async fn user(store: &MemoryStore, username: &str, role: UserRole) -> User {
    store
        .create_user(NewUser {
            email: format!("{username}@example.com"),
            username: username.to_string(),
            first_name: String::from("Test"),
            last_name: String::from("Cook"),
            password: String::new(),
            role,
        })
        .await
        .unwrap()
        .unwrap()
}

pub fn session(user: &User) -> SessionData {
    SessionData {
        user_id: user.id,
        username: user.username.to_owned(),
        role: user.role.to_owned(),
        is_admin: user.role == UserRole::Admin,
    }
}

pub async fn ingredient(store: &MemoryStore, name: &str, unit: &str) -> Ingredient {
    store
        .create_ingredient(IngredientForm {
            name: name.to_string(),
            measurement_unit: unit.to_string(),
        })
        .await
        .unwrap()
        .unwrap()
}

pub async fn tag(store: &MemoryStore, slug: &str, color: &str) -> Tag {
    store
        .create_tag(TagForm {
            name: slug.to_uppercase(),
            color: color.to_string(),
            slug: slug.to_string(),
        })
        .await
        .unwrap()
        .unwrap()
}

pub fn recipe_form(name: &str, tags: Vec<Uuid>, lines: &[(Uuid, i32)]) -> RecipeForm {
    RecipeForm {
        name: name.to_string(),
        text: String::from("Mix everything and bake."),
        cooking_time: 30,
        image: String::from("recipes/images/cake.png"),
        tags,
        ingredients: lines
            .iter()
            .map(|(id, amount)| IngredientAmount {
                id: *id,
                amount: *amount,
            })
            .collect(),
    }
}
