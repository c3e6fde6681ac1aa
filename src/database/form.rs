use std::str::FromStr;

use crate::{
    error::{ServiceError, TypeError},
    pagination::Pagination,
    schema::{RecipeFilter, Uuid},
};

pub type FormData = Vec<(String, String)>;

/// Query-string pairs in request order. Keys may repeat (`?tags=a&tags=b`).
#[derive(Debug, Clone, Default)]
pub struct Form {
    inner: FormData,
}

impl Form {
    pub fn from_data(data: FormData) -> Self {
        Self { inner: data }
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.inner
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn get_all(&self, key: &str) -> Vec<String> {
        self.inner
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.to_owned())
            .collect()
    }

    pub fn get_number<T>(&self, key: &str) -> Result<Option<T>, TypeError>
    where
        T: FromStr,
    {
        match self.get_str(key) {
            Some(value) => value
                .trim()
                .parse()
                .map(Some)
                .map_err(|_e| TypeError::new(key, "Expected a number")),
            None => Ok(None),
        }
    }

    pub fn get_flag(&self, key: &str) -> Result<Option<bool>, TypeError> {
        match self.get_str(key) {
            Some(value) => match value.trim().to_lowercase().as_str() {
                "1" | "true" => Ok(Some(true)),
                "0" | "false" => Ok(Some(false)),
                _ => Err(TypeError::new(key, "Expected 0, 1, true or false")),
            },
            None => Ok(None),
        }
    }

    pub fn recipe_filter(&self) -> Result<RecipeFilter, TypeError> {
        Ok(RecipeFilter {
            author: self.get_number::<Uuid>("author")?,
            tags: self.get_all("tags"),
            is_favorited: self.get_flag("is_favorited")?,
            is_in_shopping_cart: self.get_flag("is_in_shopping_cart")?,
        })
    }

    pub fn pagination(&self, default_limit: i64) -> Result<Pagination, ServiceError> {
        let page = self.get_number::<i64>("page")?;
        let limit = self.get_number::<i64>("limit")?;
        Pagination::new(page, limit, default_limit)
    }
}
