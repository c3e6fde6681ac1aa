pub mod ingredients;
pub mod recipes;
pub mod relations;
pub mod shopping_list;
pub mod tags;
pub mod users;

pub use ingredients::*;
pub use recipes::*;
pub use relations::*;
pub use shopping_list::*;
pub use tags::*;
pub use users::*;

use crate::error::ServiceError;

/// Rejects blank values and values longer than `max_length` characters.
pub(crate) fn require_text(field: &str, value: &str, max_length: usize) -> Result<(), ServiceError> {
    if value.trim().is_empty() {
        return Err(ServiceError::validation(field, "This field may not be blank"));
    }
    if value.chars().count() > max_length {
        return Err(ServiceError::validation(
            field,
            format!("Ensure this field has no more than {max_length} characters"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_text_counts_characters_not_bytes() {
        assert!(require_text("name", "Щи", 2).is_ok());
        assert!(require_text("name", "Щиы", 2).is_err());
        assert!(require_text("name", "   ", 10).is_err());
    }
}
