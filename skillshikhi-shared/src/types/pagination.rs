use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct PaginationParams {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u64,
}

fn default_page() -> u64 { 1 }
fn default_per_page() -> u64 { 20 }

impl PaginationParams {
    pub fn offset(&self) -> u64 {
        (self.page.saturating_sub(1)) * self.per_page
    }

    pub fn limit(&self) -> u64 {
        self.per_page.min(100)
    }
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self { page: 1, per_page: 20 }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Paginated<T: Serialize> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
    pub total_pages: u64,
}

impl<T: Serialize> Paginated<T> {
    pub fn new(items: Vec<T>, total: u64, params: &PaginationParams) -> Self {
        let per_page = params.limit();
        let total_pages = if total == 0 { 0 } else { (total + per_page - 1) / per_page };
        Self {
            items,
            total,
            page: params.page,
            per_page,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_and_limit() {
        let params = PaginationParams { page: 3, per_page: 20 };
        assert_eq!(params.offset(), 40);
        assert_eq!(params.limit(), 20);
    }

    #[test]
    fn page_zero_does_not_underflow() {
        let params = PaginationParams { page: 0, per_page: 20 };
        assert_eq!(params.offset(), 0);
    }

    #[test]
    fn per_page_is_capped() {
        let params = PaginationParams { page: 1, per_page: 500 };
        assert_eq!(params.limit(), 100);
    }

    #[test]
    fn total_pages_rounds_up() {
        let params = PaginationParams { page: 1, per_page: 20 };
        let paginated = Paginated::new(vec![1, 2, 3], 41, &params);
        assert_eq!(paginated.total_pages, 3);

        let empty: Paginated<i32> = Paginated::new(vec![], 0, &params);
        assert_eq!(empty.total_pages, 0);
    }
}
