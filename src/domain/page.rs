use serde::Serialize;

const DEFAULT_LIMIT: i64 = 20;
const MAX_LIMIT: i64 = 100;

/// Normalized offset pagination. Out-of-range input is clamped here so every
/// reader sees the same rules: page starts at 1, limit is capped at 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    page: i64,
    limit: i64,
}

impl PageParams {
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        let page = page.unwrap_or(1).max(1);
        let limit = limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        Self { page, limit }
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}

impl Default for PageParams {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PageInfo {
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub pages: i64,
}

/// Collection envelope: the items for one page plus the counters a client
/// needs to render pagination controls.
#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub pagination: PageInfo,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, total: i64, params: PageParams) -> Self {
        let pages = if total == 0 {
            0
        } else {
            (total + params.limit - 1) / params.limit
        };
        Self {
            items,
            pagination: PageInfo {
                total,
                page: params.page,
                limit: params.limit,
                pages,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_params_absent() {
        let params = PageParams::new(None, None);
        assert_eq!(params.page(), 1);
        assert_eq!(params.limit(), 20);
        assert_eq!(params.offset(), 0);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let params = PageParams::new(Some(0), Some(0));
        assert_eq!(params.page(), 1);
        assert_eq!(params.limit(), 1);

        let params = PageParams::new(Some(-3), Some(500));
        assert_eq!(params.page(), 1);
        assert_eq!(params.limit(), 100);
    }

    #[test]
    fn offset_follows_page_and_limit() {
        let params = PageParams::new(Some(3), Some(10));
        assert_eq!(params.offset(), 20);
    }

    #[test]
    fn pages_is_a_ceiling_division() {
        let params = PageParams::new(Some(1), Some(10));
        let page = Paginated::new(vec![1, 2, 3], 21, params);
        assert_eq!(page.pagination.pages, 3);

        let page = Paginated::new(vec![1, 2], 20, params);
        assert_eq!(page.pagination.pages, 2);
    }

    #[test]
    fn empty_collection_has_zero_pages() {
        let params = PageParams::new(None, None);
        let page: Paginated<i64> = Paginated::new(vec![], 0, params);
        assert_eq!(page.pagination.total, 0);
        assert_eq!(page.pagination.pages, 0);
    }

    #[test]
    fn past_the_end_page_keeps_the_envelope() {
        let params = PageParams::new(Some(50), Some(10));
        let page: Paginated<i64> = Paginated::new(vec![], 15, params);
        assert_eq!(page.pagination.page, 50);
        assert_eq!(page.pagination.pages, 2);
        assert!(page.items.is_empty());
    }
}
