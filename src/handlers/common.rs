use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Pagination parameters for row listings
#[derive(Debug, Default, Deserialize, Serialize, IntoParams)]
pub struct PaginationParams {
    /// 1-based page; clamped into the available range
    pub page: Option<u64>,
    /// Rows per page; defaults to the configured page size
    pub per_page: Option<u64>,
}

/// Standard pagination response metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PaginationMeta {
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
    pub total_pages: u64,
}

impl PaginationMeta {
    /// Builds the metadata for `total` rows, moving `requested_page` into
    /// `1..=total_pages` (page 1 when there are no rows).
    pub fn clamped(requested_page: Option<u64>, per_page: u64, total: u64) -> Self {
        let per_page = per_page.max(1);
        let total_pages = total.div_ceil(per_page);
        let page = requested_page.unwrap_or(1).clamp(1, total_pages.max(1));
        Self {
            page,
            per_page,
            total,
            total_pages,
        }
    }

    /// Calculate zero-based offset for pagination
    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1) * self.per_page
    }
}
