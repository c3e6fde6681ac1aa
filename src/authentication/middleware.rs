use std::{convert::Infallible, sync::Arc};

use warp::{reject::Rejection, Filter};

use crate::{
    config::Config,
    constants::AUTHORIZATION_SCHEME,
    error::ServiceError,
    form::{Form, FormData},
    store::Store,
};

use super::jwt::{verify_jwt_session, SessionData};

fn session_from_header(header: Option<&str>, secret: &str) -> Result<SessionData, ServiceError> {
    let header = header.ok_or_else(|| {
        ServiceError::Unauthorized(String::from(
            "Authentication credentials were not provided",
        ))
    })?;

    let token = header
        .strip_prefix(AUTHORIZATION_SCHEME)
        .map(str::trim)
        .ok_or_else(|| {
            ServiceError::Unauthorized(String::from("Invalid session; Expected a Token header"))
        })?;

    Ok(verify_jwt_session(token, secret)?.into())
}

/// Requires a valid `Authorization: Token <jwt>` header.
pub fn with_session(
    config: Arc<Config>,
) -> impl Filter<Extract = (SessionData,), Error = Rejection> + Clone {
    warp::header::optional::<String>("authorization").and_then(move |header: Option<String>| {
        let config = config.clone();
        async move {
            session_from_header(header.as_deref(), &config.jwt_secret).map_err(|e| {
                log::warn!("Rejected session: {e}");
                Rejection::from(e)
            })
        }
    })
}

/// Like `with_session`, but a missing or invalid token yields an anonymous viewer.
pub fn with_possible_session(
    config: Arc<Config>,
) -> impl Filter<Extract = (Option<SessionData>,), Error = Rejection> + Clone {
    warp::header::optional::<String>("authorization").map(move |header: Option<String>| {
        session_from_header(header.as_deref(), &config.jwt_secret).ok()
    })
}

pub fn with_store<S>(store: Arc<S>) -> impl Filter<Extract = (Arc<S>,), Error = Infallible> + Clone
where
    S: Store + 'static,
{
    warp::any().map(move || store.clone())
}

pub fn with_form() -> impl Filter<Extract = (Form,), Error = Rejection> + Clone {
    warp::query::<FormData>().map(Form::from_data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        jwt::generate_jwt_session,
        memory::MemoryStore,
        schema::{User, UserRole},
    };

    fn config() -> Arc<Config> {
        Arc::new(Config {
            database_url: String::new(),
            max_connections: 1,
            jwt_secret: String::from("middleware-secret"),
            session_hours: 1,
            page_size: 6,
        })
    }

    fn token(config: &Config) -> String {
        let user = User {
            id: 3,
            email: String::from("admin@example.com"),
            username: String::from("admin"),
            first_name: String::from("Ada"),
            last_name: String::from("Admin"),
            password: String::new(),
            role: UserRole::Admin,
        };
        generate_jwt_session(&user, config).unwrap()
    }

    #[tokio::test]
    async fn session_is_extracted_from_token_header() {
        let config = config();
        let session = warp::test::request()
            .header("authorization", format!("Token {}", token(&config)))
            .filter(&with_session(config.clone()))
            .await
            .unwrap();

        assert_eq!(session.user_id, 3);
        assert!(session.is_admin);
    }

    #[tokio::test]
    async fn missing_or_malformed_header_is_rejected() {
        let config = config();
        let missing = warp::test::request()
            .filter(&with_session(config.clone()))
            .await;
        assert!(missing.is_err());

        let bearer = warp::test::request()
            .header("authorization", format!("Bearer {}", token(&config)))
            .filter(&with_session(config.clone()))
            .await;
        assert!(bearer.is_err());
    }

    #[tokio::test]
    async fn possible_session_falls_back_to_anonymous() {
        let session = warp::test::request()
            .header("authorization", "Token garbage")
            .filter(&with_possible_session(config()))
            .await
            .unwrap();

        assert!(session.is_none());
    }

    #[tokio::test]
    async fn form_collects_repeated_query_keys() {
        let form = warp::test::request()
            .path("/recipes?tags=breakfast&tags=dinner&page=2")
            .filter(&with_form())
            .await
            .unwrap();

        assert_eq!(form.get_all("tags"), vec!["breakfast", "dinner"]);
        assert_eq!(form.get_number::<i64>("page").unwrap(), Some(2));
    }

    #[tokio::test]
    async fn store_is_shared() {
        let store = Arc::new(MemoryStore::new());
        let extracted = warp::test::request()
            .filter(&with_store(store.clone()))
            .await
            .unwrap();

        assert!(Arc::ptr_eq(&store, &extracted));
    }
}
