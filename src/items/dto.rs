use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::items::repo::Item;

/// Request body for POST /api/items.
#[derive(Debug, Deserialize)]
pub struct ItemCreate {
    pub name: String,
    pub location: String,
}

/// Request body for PATCH /api/items/:id. Both fields optional; the
/// update still refreshes `updated_at` when neither is present.
#[derive(Debug, Deserialize)]
pub struct ItemUpdate {
    pub name: Option<String>,
    pub location: Option<String>,
}

/// Query parameters for GET /api/items.
#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
    pub query: Option<String>,
}

/// Query parameters for GET /api/items/search/ai.
#[derive(Debug, Deserialize)]
pub struct AiSearchParams {
    pub query: String,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

fn default_page() -> i64 {
    1
}
fn default_page_size() -> i64 {
    10
}

pub fn validate_page_params(page: i64, page_size: i64) -> Result<(), ApiError> {
    if page < 1 {
        return Err(ApiError::Validation("Page must be >= 1".into()));
    }
    if !(1..=100).contains(&page_size) {
        return Err(ApiError::Validation(
            "Page size must be between 1 and 100".into(),
        ));
    }
    Ok(())
}

/// Row offset for a 1-based page. Saturates instead of overflowing so
/// an absurdly large page number still lands past the end of the set
/// and pairs with an empty data array, never a panic or a negative
/// OFFSET.
pub fn page_offset(page: i64, page_size: i64) -> i64 {
    page.checked_sub(1)
        .and_then(|p| p.checked_mul(page_size))
        .unwrap_or(i64::MAX)
}

/// Pagination metadata covering the whole matching set, not the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: i64,
    pub page_size: i64,
    pub total_items: i64,
    pub total_pages: i64,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

impl Pagination {
    /// `total_pages` is 0 for an empty set; a page past the end is not
    /// an error, it just pairs with an empty data array.
    pub fn compute(page: i64, page_size: i64, total_items: i64) -> Self {
        let total_pages = (total_items + page_size - 1) / page_size;
        Self {
            page,
            page_size,
            total_items,
            total_pages,
            has_next_page: page < total_pages,
            has_previous_page: page > 1,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ItemPage {
    pub data: Vec<Item>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct AiMetadata {
    pub original_query: String,
    pub extracted_terms: String,
}

#[derive(Debug, Serialize)]
pub struct AiSearchPage {
    pub data: Vec<Item>,
    pub pagination: Pagination,
    pub ai_metadata: AiMetadata,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twenty_five_items_page_one() {
        let p = Pagination::compute(1, 10, 25);
        assert_eq!(p.total_pages, 3);
        assert!(p.has_next_page);
        assert!(!p.has_previous_page);
    }

    #[test]
    fn twenty_five_items_last_page() {
        let p = Pagination::compute(3, 10, 25);
        assert_eq!(p.total_pages, 3);
        assert!(!p.has_next_page);
        assert!(p.has_previous_page);
    }

    #[test]
    fn page_past_the_end_keeps_metadata() {
        let p = Pagination::compute(4, 10, 25);
        assert_eq!(p.total_pages, 3);
        assert!(!p.has_next_page);
        assert!(p.has_previous_page);
    }

    #[test]
    fn empty_set_has_zero_pages() {
        let p = Pagination::compute(1, 10, 0);
        assert_eq!(p.total_items, 0);
        assert_eq!(p.total_pages, 0);
        assert!(!p.has_next_page);
        assert!(!p.has_previous_page);
    }

    #[test]
    fn exact_multiple_of_page_size() {
        let p = Pagination::compute(2, 10, 20);
        assert_eq!(p.total_pages, 2);
        assert!(!p.has_next_page);
        assert!(p.has_previous_page);
    }

    #[test]
    fn offset_for_ordinary_pages() {
        assert_eq!(page_offset(1, 10), 0);
        assert_eq!(page_offset(3, 10), 20);
        assert_eq!(page_offset(4, 25), 75);
    }

    #[test]
    fn offset_saturates_for_huge_page_numbers() {
        assert_eq!(page_offset(i64::MAX, 100), i64::MAX);
        assert_eq!(page_offset(i64::MAX / 2, 3), i64::MAX);
        assert!(page_offset(i64::MAX, 1) >= 0);
    }

    #[test]
    fn page_bounds() {
        assert!(validate_page_params(1, 1).is_ok());
        assert!(validate_page_params(1, 100).is_ok());
        assert!(validate_page_params(0, 10).is_err());
        assert!(validate_page_params(-3, 10).is_err());
        assert!(validate_page_params(1, 0).is_err());
        assert!(validate_page_params(1, 101).is_err());
    }
}
