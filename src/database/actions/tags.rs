use crate::{
    authentication::{jwt::SessionData, permissions::ActionType},
    constants::{LENGTH_COLOR, LENGTH_TEXT_150},
    error::ServiceError,
    schema::{Tag, TagForm, Uuid},
    store::Store,
};

use super::require_text;

/// Checks a `#RRGGBB` or `#RGB` color and returns it as upper-cased `#RRGGBB`.
fn normalize_color(color: &str) -> Result<String, ServiceError> {
    let color = color.trim();
    let digits = color.strip_prefix('#').unwrap_or_default();
    let valid = color.starts_with('#')
        && (digits.len() == LENGTH_COLOR - 1 || digits.len() == 3)
        && digits.chars().all(|c| c.is_ascii_hexdigit());

    if !valid {
        return Err(ServiceError::validation(
            "color",
            "Enter a valid hex color, such as #49B64E or #4B4",
        ));
    }

    let digits = digits.to_ascii_uppercase();
    if digits.len() == 3 {
        // Shorthand doubles every digit, so #abc and #AABBCC are one color.
        return Ok(digits.chars().fold(String::from("#"), |mut full, c| {
            full.push(c);
            full.push(c);
            full
        }));
    }
    Ok(format!("#{digits}"))
}

fn validate_slug(slug: &str) -> Result<(), ServiceError> {
    require_text("slug", slug, LENGTH_TEXT_150)?;

    if !slug
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ServiceError::validation(
            "slug",
            "Enter a valid slug consisting of letters, numbers, underscores or hyphens",
        ));
    }
    Ok(())
}

pub async fn create_tag<S: Store>(
    store: &S,
    session: &SessionData,
    form: TagForm,
) -> Result<Tag, ServiceError> {
    session.authenticate(ActionType::ManageTags)?;

    require_text("name", &form.name, LENGTH_TEXT_150)?;
    validate_slug(&form.slug)?;
    let form = TagForm {
        color: normalize_color(&form.color)?,
        ..form
    };

    let tag = store.create_tag(form).await?.ok_or_else(|| {
        ServiceError::AlreadyExists(String::from(
            "A tag with that name, color or slug already exists",
        ))
    })?;

    log::info!("User {} created tag {} ({})", session.user_id, tag.id, tag.slug);
    Ok(tag)
}

pub async fn list_tags<S: Store>(store: &S) -> Result<Vec<Tag>, ServiceError> {
    store.list_tags().await
}

pub async fn get_tag<S: Store>(store: &S, id: Uuid) -> Result<Tag, ServiceError> {
    store
        .get_tag(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(String::from("Tag not found")))
}
