use serde::{Deserialize, Serialize};

use crate::{constants::MAX_COUNT_PER_PAGE, error::ServiceError};

/// Page-number pagination. `page` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
}

impl Pagination {
    pub fn new(
        page: Option<i64>,
        limit: Option<i64>,
        default_limit: i64,
    ) -> Result<Self, ServiceError> {
        let page = page.unwrap_or(1);
        if page < 1 {
            return Err(ServiceError::validation("page", "Page number must be 1 or greater"));
        }

        let limit = match limit {
            Some(limit) if limit >= 1 => limit.min(MAX_COUNT_PER_PAGE),
            _ => default_limit.clamp(1, MAX_COUNT_PER_PAGE),
        };

        Ok(Self { page, limit })
    }

    pub fn first(limit: i64) -> Self {
        Self {
            page: 1,
            limit: limit.clamp(1, MAX_COUNT_PER_PAGE),
        }
    }

    /// Saturates, so absurd page numbers just land past the last row.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PageContext<T> {
    pub rows: Vec<T>,
    pub total_rows: i64,
    pub page: i64,
    pub page_count: i64,
    pub next_page: Option<i64>,
    pub prev_page: Option<i64>,
}

impl<T> PageContext<T> {
    pub fn from_rows(rows: Vec<T>, total_rows: i64, pagination: Pagination) -> Self {
        if total_rows <= 0 || pagination.limit <= 0 {
            return Self::no_rows(pagination);
        }

        let page_count = (total_rows + pagination.limit - 1) / pagination.limit;
        let next_page = (pagination.page < page_count).then(|| pagination.page + 1);
        let prev_page = (pagination.page > 1).then(|| (pagination.page - 1).min(page_count));

        Self {
            rows,
            total_rows,
            page: pagination.page,
            page_count,
            next_page,
            prev_page,
        }
    }

    pub fn no_rows(pagination: Pagination) -> Self {
        Self {
            rows: vec![],
            total_rows: 0,
            page: pagination.page,
            page_count: 0,
            next_page: None,
            prev_page: None,
        }
    }
}
