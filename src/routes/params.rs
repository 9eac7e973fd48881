use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{models::BookingStatus, services::roster::RosterSort};

#[derive(Debug, Default, Clone, Deserialize, ToSchema)]
pub struct Pagination {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl Pagination {
    pub fn normalize(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * per_page;
        (page, per_page, offset)
    }
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    Desc,
}

// Pagination fields are spelled out: `serde(flatten)` breaks numeric parsing
// of query strings.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct BookingListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub status: Option<BookingStatus>,
    /// Earliest pickup, inclusive.
    pub from: Option<DateTime<Utc>>,
    /// Latest pickup, inclusive.
    pub to: Option<DateTime<Utc>>,
    pub q: Option<String>,
    pub sort_order: Option<SortOrder>,
}

impl BookingListQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct RosterQuery {
    pub sort: Option<RosterSort>,
}

#[derive(Debug, Deserialize)]
pub struct LiveQuery {
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_is_clamped() {
        let pagination = Pagination {
            page: Some(0),
            per_page: Some(500),
        };
        assert_eq!(pagination.normalize(), (1, 100, 0));

        let pagination = Pagination {
            page: Some(3),
            per_page: None,
        };
        assert_eq!(pagination.normalize(), (3, 20, 40));
    }
}
