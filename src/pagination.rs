use serde::{Deserialize, Serialize};

fn default_page() -> i64 {
    1
}
fn default_per_page() -> i64 {
    10
}

/// Common `?page=&perPage=` (or `limit`) query parameters.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(
        default = "default_per_page",
        alias = "perPage",
        alias = "limit",
        rename = "per_page"
    )]
    pub per_page: i64,
}

impl PageQuery {
    pub fn clamped(self) -> Self {
        Self {
            page: self.page.max(1),
            per_page: self.per_page.clamp(1, 100),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.per_page
    }
}

pub fn total_pages(total: i64, per_page: i64) -> i64 {
    if per_page <= 0 {
        return 0;
    }
    (total + per_page - 1) / per_page
}

/// Echoed alongside every list response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub current_page: i64,
    pub per_page: i64,
    pub total_pages: i64,
    pub total_items: i64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl PageInfo {
    pub fn new(page: &PageQuery, total: i64) -> Self {
        let total_pages = total_pages(total, page.per_page);
        Self {
            current_page: page.page,
            per_page: page.per_page,
            total_pages,
            total_items: total,
            has_next_page: page.page * page.per_page < total,
            has_prev_page: page.page > 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(1, 10), 1);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
    }

    #[test]
    fn offset_math() {
        let q = PageQuery { page: 3, per_page: 20 };
        assert_eq!(q.offset(), 40);
    }

    #[test]
    fn clamp_floors_bad_values() {
        let q = PageQuery { page: 0, per_page: 100_000 }.clamped();
        assert_eq!(q.page, 1);
        assert_eq!(q.per_page, 100);
    }

    #[test]
    fn page_info_flags() {
        let q = PageQuery { page: 2, per_page: 10 };
        let info = PageInfo::new(&q, 25);
        assert_eq!(info.total_pages, 3);
        assert!(info.has_next_page);
        assert!(info.has_prev_page);
    }
}
