use chrono::Duration;
use chrono::Local;
use hmac::{Hmac, Mac};
use jwt::SignWithKey;
use jwt::VerifyWithKey;
use serde::Deserialize;
use serde::Serialize;
use sha2::Sha256;

use crate::config::Config;
use crate::error::ServiceError;
use crate::schema::{Recipe, User, UserRole};

use super::permissions::ActionType;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JwtSessionData {
    pub user_id: i32,
    pub username: String,
    pub role: UserRole,
    iat: i64,
    exp: i64,
}

impl JwtSessionData {
    pub fn new(id: i32, username: String, role: UserRole, hours: i64) -> Self {
        let now = Local::now();
        let iat = now.timestamp();
        let exp = (now + Duration::hours(hours)).timestamp();

        Self {
            user_id: id,
            username,
            role,
            iat,
            exp,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SessionData {
    pub user_id: i32,
    pub username: String,
    pub role: UserRole,
    pub is_admin: bool,
}

impl SessionData {
    pub fn authenticate(&self, action: ActionType) -> Result<(), ServiceError> {
        if !action.authenticate(self) {
            return Err(ServiceError::Forbidden);
        }
        Ok(())
    }

    /// Object-level check: the author or an admin may change a recipe.
    pub fn authenticate_recipe(&self, recipe: &Recipe) -> Result<(), ServiceError> {
        self.authenticate(ActionType::ManageOwnRecipes)?;

        match self.authenticate(ActionType::ManageAllRecipes) {
            Ok(_) => Ok(()),
            Err(_) if recipe.author_id == self.user_id => Ok(()),
            Err(e) => Err(e),
        }
    }
}

impl From<JwtSessionData> for SessionData {
    fn from(value: JwtSessionData) -> Self {
        SessionData {
            user_id: value.user_id,
            username: value.username,
            is_admin: value.role == UserRole::Admin,
            role: value.role,
        }
    }
}

fn signing_key(secret: &str) -> Result<Hmac<Sha256>, ServiceError> {
    Hmac::new_from_slice(secret.as_bytes())
        .map_err(|e| ServiceError::Internal(format!("Invalid session key: {e}")))
}

fn sign_session(claims: &JwtSessionData, secret: &str) -> Result<String, ServiceError> {
    let key = signing_key(secret)?;

    claims
        .sign_with_key(&key)
        .map_err(|e| ServiceError::Internal(format!("Failed to sign session: {e}")))
}

pub fn generate_jwt_session(user: &User, config: &Config) -> Result<String, ServiceError> {
    let claims = JwtSessionData::new(
        user.id,
        user.username.to_owned(),
        user.role.to_owned(),
        config.session_hours,
    );

    sign_session(&claims, &config.jwt_secret)
}

pub fn verify_jwt_session(token: &str, secret: &str) -> Result<JwtSessionData, ServiceError> {
    let key = signing_key(secret)?;

    let session: JwtSessionData = token
        .verify_with_key(&key)
        .map_err(|_| ServiceError::Unauthorized(String::from("Invalid session; Invalid token")))?;

    let now = Local::now().timestamp();
    if (session.exp - now).is_negative() {
        return Err(ServiceError::Unauthorized(String::from(
            "Invalid session; Token expired",
        )));
    }

    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: 7,
            email: String::from("cook@example.com"),
            username: String::from("cook"),
            first_name: String::from("Ann"),
            last_name: String::from("Cook"),
            password: String::new(),
            role: UserRole::User,
        }
    }

    fn config() -> Config {
        Config {
            database_url: String::new(),
            max_connections: 1,
            jwt_secret: String::from("test-secret"),
            session_hours: 1,
            page_size: 6,
        }
    }

    #[test]
    fn issued_token_verifies() {
        let token = generate_jwt_session(&user(), &config()).unwrap();
        let session: SessionData = verify_jwt_session(&token, "test-secret").unwrap().into();

        assert_eq!(session.user_id, 7);
        assert_eq!(session.username, "cook");
        assert!(!session.is_admin);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = generate_jwt_session(&user(), &config()).unwrap();
        assert!(matches!(
            verify_jwt_session(&token, "other-secret"),
            Err(ServiceError::Unauthorized(_))
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let claims = JwtSessionData::new(7, String::from("cook"), UserRole::User, -1);
        let token = sign_session(&claims, "test-secret").unwrap();
        assert!(matches!(
            verify_jwt_session(&token, "test-secret"),
            Err(ServiceError::Unauthorized(info)) if info.contains("expired")
        ));
    }
}
