//! Length-aware pagination envelope for list endpoints.
//!
//! Every list endpoint returns `{data, links, meta}` so clients can walk
//! pages without re-deriving offsets.

use serde::Serialize;

pub const DEFAULT_PER_PAGE: i64 = 10;
pub const MAX_PER_PAGE: i64 = 100;

#[derive(Debug, Serialize)]
pub struct PageLinks {
    pub first: String,
    pub last: String,
    pub prev: Option<String>,
    pub next: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PageMeta {
    pub current_page: i64,
    pub from: Option<i64>,
    pub last_page: i64,
    pub path: String,
    pub per_page: i64,
    pub to: Option<i64>,
    pub total: i64,
}

#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub links: PageLinks,
    pub meta: PageMeta,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, total: i64, current_page: i64, per_page: i64, path: &str) -> Self {
        let current_page = current_page.max(1);
        let per_page = per_page.max(1);
        let last_page = ((total + per_page - 1) / per_page).max(1);

        let from = if data.is_empty() {
            None
        } else {
            Some((current_page - 1) * per_page + 1)
        };
        let to = from.map(|start| start + data.len() as i64 - 1);

        let page_url = |page: i64| format!("{}?page={}", path, page);

        Self {
            links: PageLinks {
                first: page_url(1),
                last: page_url(last_page),
                prev: (current_page > 1).then(|| page_url(current_page - 1)),
                next: (current_page < last_page).then(|| page_url(current_page + 1)),
            },
            meta: PageMeta {
                current_page,
                from,
                last_page,
                path: path.to_string(),
                per_page,
                to,
                total,
            },
            data,
        }
    }
}

/// Normalize user-supplied page/per_page query values.
pub fn page_params(page: Option<i64>, per_page: Option<i64>) -> (i64, i64) {
    let page = page.unwrap_or(1).max(1);
    let per_page = per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE);
    (page, per_page)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(n: i64) -> Vec<i64> {
        (0..n).collect()
    }

    #[test]
    fn test_last_page_is_ceil_of_total_over_per_page() {
        assert_eq!(Page::new(items(10), 25, 1, 10, "/t").meta.last_page, 3);
        assert_eq!(Page::new(items(10), 30, 1, 10, "/t").meta.last_page, 3);
        assert_eq!(Page::new(items(1), 1, 1, 10, "/t").meta.last_page, 1);
        // An empty result set still reports one (empty) page.
        assert_eq!(Page::new(items(0), 0, 1, 10, "/t").meta.last_page, 1);
    }

    #[test]
    fn test_page_item_counts_sum_to_total() {
        // 23 items, page size 10: pages carry 10 + 10 + 3.
        let total = 23;
        let per_page = 10;
        let mut seen = 0;
        for page in 1..=3 {
            let on_page = (total - (page - 1) * per_page).clamp(0, per_page);
            let p = Page::new(items(on_page), total, page, per_page, "/t");
            seen += p.data.len() as i64;
            assert_eq!(p.meta.last_page, 3);
        }
        assert_eq!(seen, total);
    }

    #[test]
    fn test_final_page_carries_remainder_or_full_page() {
        let p = Page::new(items(3), 23, 3, 10, "/t");
        assert_eq!(p.data.len(), 3);
        let p = Page::new(items(10), 20, 2, 10, "/t");
        assert_eq!(p.data.len(), 10);
    }

    #[test]
    fn test_from_and_to_bounds() {
        let p = Page::new(items(10), 25, 2, 10, "/t");
        assert_eq!(p.meta.from, Some(11));
        assert_eq!(p.meta.to, Some(20));

        let p = Page::new(items(5), 25, 3, 10, "/t");
        assert_eq!(p.meta.from, Some(21));
        assert_eq!(p.meta.to, Some(25));

        let empty = Page::new(items(0), 0, 1, 10, "/t");
        assert_eq!(empty.meta.from, None);
        assert_eq!(empty.meta.to, None);
    }

    #[test]
    fn test_navigation_links() {
        let p = Page::new(items(10), 25, 2, 10, "/api/tickets");
        assert_eq!(p.links.first, "/api/tickets?page=1");
        assert_eq!(p.links.last, "/api/tickets?page=3");
        assert_eq!(p.links.prev.as_deref(), Some("/api/tickets?page=1"));
        assert_eq!(p.links.next.as_deref(), Some("/api/tickets?page=3"));

        let first = Page::new(items(10), 25, 1, 10, "/api/tickets");
        assert!(first.links.prev.is_none());
        let last = Page::new(items(5), 25, 3, 10, "/api/tickets");
        assert!(last.links.next.is_none());
    }

    #[test]
    fn test_page_params_defaults_and_clamping() {
        assert_eq!(page_params(None, None), (1, DEFAULT_PER_PAGE));
        assert_eq!(page_params(Some(0), Some(0)), (1, 1));
        assert_eq!(page_params(Some(-3), Some(1000)), (1, MAX_PER_PAGE));
        assert_eq!(page_params(Some(4), Some(25)), (4, 25));
    }
}
