use serde::{Deserialize, Serialize};

/// Pagination metadata returned alongside a page of rows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paging {
    pub current_page: u64,
    pub last_page: u64,
    pub count: u64,
    pub record_per_page: u64,
}

impl Paging {
    /// Rows to skip before the current page. Saturates for pages far past the end.
    pub fn offset(&self) -> u64 {
        self.current_page
            .saturating_sub(1)
            .saturating_mul(self.record_per_page)
    }

    /// True when the current page lies beyond the last one and holds no rows.
    pub fn is_past_end(&self) -> bool {
        self.current_page > self.last_page.max(1)
    }
}

/// `last_page = ceil(count / limit)`. Pages below 1 clamp to 1 and a zero limit counts as 1.
pub fn paging(page: u64, count: u64, limit: u64) -> Paging {
    let current_page = page.max(1);
    let record_per_page = limit.max(1);
    Paging {
        current_page,
        last_page: count.div_ceil(record_per_page),
        count,
        record_per_page,
    }
}
