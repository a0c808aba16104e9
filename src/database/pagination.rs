use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PageContext<T> {
    pub rows: Vec<T>,
    pub total_rows: i64,
    /// 1-based.
    pub page: i64,
    pub page_count: i64,
    pub next_offset: Option<i64>,
    pub prev_offset: Option<i64>,
}

impl<T> PageContext<T> {
    pub fn from_rows(rows: Vec<T>, total_rows: i64, page_size: i64, current_offset: i64) -> Self {
        let page_size = page_size.max(1);
        let current_offset = current_offset.max(0);
        let page_count = ((total_rows + page_size - 1) / page_size).max(1);

        let next_offset = current_offset + page_size;
        let next_offset = (next_offset < total_rows).then_some(next_offset);
        let prev_offset = (current_offset > 0).then(|| (current_offset - page_size).max(0));

        Self {
            rows,
            total_rows,
            page: current_offset / page_size + 1,
            page_count,
            next_offset,
            prev_offset,
        }
    }

    pub fn no_rows() -> Self {
        Self::from_rows(vec![], 0, 1, 0)
    }
}

/// Offset of a 1-based page number. Out-of-range pages clamp to the first.
pub fn page_offset(page: i64, page_size: i64) -> i64 {
    (page.max(1) - 1) * page_size
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn middle_page_links_both_ways() {
        let page = PageContext::from_rows(vec![(); 6], 13, 6, 6);

        assert_eq!(page.page, 2);
        assert_eq!(page.page_count, 3);
        assert_eq!(page.prev_offset, Some(0));
        assert_eq!(page.next_offset, Some(12));
    }

    #[test]
    fn last_page_has_no_next() {
        let page = PageContext::from_rows(vec![(); 1], 13, 6, 12);

        assert_eq!(page.page, 3);
        assert_eq!(page.next_offset, None);
        assert_eq!(page.prev_offset, Some(6));
    }

    #[test]
    fn empty_listing_is_a_single_page() {
        let page: PageContext<()> = PageContext::no_rows();

        assert_eq!(page.page_count, 1);
        assert_eq!(page.next_offset, None);
        assert_eq!(page.prev_offset, None);
        assert_eq!(page_offset(0, 6), 0);
        assert_eq!(page_offset(3, 6), 12);
    }
}
