use crate::{
    authentication::{
        cryptography::{hash_password, verify_password},
        jwt::{generate_jwt_session, SessionData},
    },
    config::Config,
    constants::{LENGTH_EMAIL, LENGTH_TEXT_150},
    error::ServiceError,
    pagination::{PageContext, Pagination},
    schema::{NewUser, RelationKind, User, UserForm, UserProfile, UserRole, Uuid},
    store::Store,
};

use super::require_text;

fn validate_email(email: &str) -> Result<(), ServiceError> {
    require_text("email", email, LENGTH_EMAIL)?;

    match email.split_once('@') {
        Some((local, domain))
            if !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace) =>
        {
            Ok(())
        }
        _ => Err(ServiceError::validation("email", "Enter a valid email address")),
    }
}

fn validate_username(username: &str) -> Result<(), ServiceError> {
    require_text("username", username, LENGTH_TEXT_150)?;

    let valid = username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'));
    if !valid {
        return Err(ServiceError::validation(
            "username",
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters",
        ));
    }
    Ok(())
}

/// Creates a user with a hashed password.
pub async fn register_user<S: Store>(store: &S, form: UserForm) -> Result<User, ServiceError> {
    validate_email(&form.email)?;
    validate_username(&form.username)?;
    require_text("first_name", &form.first_name, LENGTH_TEXT_150)?;
    require_text("last_name", &form.last_name, LENGTH_TEXT_150)?;
    if form.password.is_empty() {
        return Err(ServiceError::validation("password", "This field may not be blank"));
    }

    let user = NewUser {
        email: form.email.trim().to_string(),
        username: form.username,
        first_name: form.first_name,
        last_name: form.last_name,
        password: hash_password(&form.password)?,
        role: UserRole::User,
    };

    let user = store.create_user(user).await?.ok_or_else(|| {
        ServiceError::AlreadyExists(String::from(
            "A user with that email or username already exists",
        ))
    })?;

    log::info!("Registered user {} ({})", user.id, user.username);
    Ok(user)
}

/// Checks credentials and issues a session token.
pub async fn login_user<S: Store>(
    store: &S,
    config: &Config,
    email: &str,
    password: &str,
) -> Result<String, ServiceError> {
    let invalid = || ServiceError::Unauthorized(String::from("Invalid credentials"));

    let Some(user) = store.find_user_by_email(email.trim()).await? else {
        log::warn!("Login attempt for unknown email");
        return Err(invalid());
    };

    if !verify_password(password, &user.password)? {
        log::warn!("Login attempt with wrong password for user {}", user.id);
        return Err(invalid());
    }

    generate_jwt_session(&user, config)
}

pub async fn set_password<S: Store>(
    store: &S,
    session: &SessionData,
    current_password: &str,
    new_password: &str,
) -> Result<(), ServiceError> {
    let user = store
        .get_user(session.user_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(String::from("User not found")))?;

    if !verify_password(current_password, &user.password)? {
        return Err(ServiceError::validation(
            "current_password",
            "Invalid password",
        ));
    }
    if new_password.is_empty() {
        return Err(ServiceError::validation("new_password", "This field may not be blank"));
    }

    store
        .update_password(user.id, &hash_password(new_password)?)
        .await?;

    log::info!("User {} changed their password", user.id);
    Ok(())
}

pub(crate) async fn is_subscribed<S: Store>(
    store: &S,
    viewer: Option<&SessionData>,
    author_id: Uuid,
) -> Result<bool, ServiceError> {
    match viewer {
        Some(viewer) => {
            store
                .relation_exists(RelationKind::Subscription, viewer.user_id, author_id)
                .await
        }
        None => Ok(false),
    }
}

pub async fn get_user_profile<S: Store>(
    store: &S,
    viewer: Option<&SessionData>,
    id: Uuid,
) -> Result<UserProfile, ServiceError> {
    let user = store
        .get_user(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(String::from("User not found")))?;

    let subscribed = is_subscribed(store, viewer, user.id).await?;
    Ok(UserProfile::from_user(user, subscribed))
}

pub async fn get_current_user<S: Store>(
    store: &S,
    session: &SessionData,
) -> Result<UserProfile, ServiceError> {
    get_user_profile(store, Some(session), session.user_id).await
}

pub async fn fetch_users<S: Store>(
    store: &S,
    viewer: Option<&SessionData>,
    pagination: Pagination,
) -> Result<PageContext<UserProfile>, ServiceError> {
    let (rows, total) = store.list_users(pagination).await?;

    let mut profiles = Vec::with_capacity(rows.len());
    for user in rows {
        let subscribed = is_subscribed(store, viewer, user.id).await?;
        profiles.push(UserProfile::from_user(user, subscribed));
    }

    Ok(PageContext::from_rows(profiles, total, pagination))
}
