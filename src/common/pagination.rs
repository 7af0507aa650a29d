// src/common/pagination.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Parâmetros de paginação vindos da query string (`?page=1&pageSize=10`).
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageParams {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

/// Janela calculada para uma lista de `total` itens.
///
/// `start_index` é inclusivo e `end_index` exclusivo, prontos para fatiar
/// um `Vec` ou montar `OFFSET`/`LIMIT`. Com `total = 0` não há páginas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageWindow {
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
    pub total_pages: u32,
    pub start_index: u64,
    pub end_index: u64,
}

impl PageParams {
    pub fn window(&self, total: u64) -> PageWindow {
        let page_size = self
            .page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        let page = self.page.unwrap_or(1).max(1);

        let total_pages = total.div_ceil(page_size as u64) as u32;
        let start_index = ((page - 1) as u64 * page_size as u64).min(total);
        let end_index = (start_index + page_size as u64).min(total);

        PageWindow {
            page,
            page_size,
            total,
            total_pages,
            start_index,
            end_index,
        }
    }

    /// `(LIMIT, OFFSET)` para consultas paginadas no banco.
    pub fn limit_offset(&self) -> (i64, i64) {
        let page_size = self
            .page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE) as i64;
        let page = self.page.unwrap_or(1).max(1) as i64;
        (page_size, (page - 1) * page_size)
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: PageWindow,
}

impl<T> Page<T> {
    /// Pagina em memória uma lista já carregada.
    pub fn from_vec(items: Vec<T>, params: &PageParams) -> Self {
        let pagination = params.window(items.len() as u64);
        let items = items
            .into_iter()
            .skip(pagination.start_index as usize)
            .take((pagination.end_index - pagination.start_index) as usize)
            .collect();
        Self { items, pagination }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(page: u32, size: u32) -> PageParams {
        PageParams { page: Some(page), page_size: Some(size) }
    }

    #[test]
    fn empty_list_has_no_pages() {
        let w = params(1, 10).window(0);
        assert_eq!(w.total_pages, 0);
        assert_eq!(w.start_index, 0);
        assert_eq!(w.end_index, 0);
    }

    #[test]
    fn single_item_fits_first_page() {
        let w = params(1, 10).window(1);
        assert_eq!(w.total_pages, 1);
        assert_eq!((w.start_index, w.end_index), (0, 1));
    }

    #[test]
    fn exact_multiple_does_not_add_extra_page() {
        let w = params(2, 10).window(20);
        assert_eq!(w.total_pages, 2);
        assert_eq!((w.start_index, w.end_index), (10, 20));

        let w = params(3, 10).window(21);
        assert_eq!(w.total_pages, 3);
        assert_eq!((w.start_index, w.end_index), (20, 21));
    }

    #[test]
    fn page_past_the_end_is_empty() {
        let w = params(5, 10).window(20);
        assert_eq!(w.start_index, 20);
        assert_eq!(w.end_index, 20);
    }

    #[test]
    fn defaults_and_clamping() {
        let w = PageParams { page: Some(0), page_size: Some(1000) }.window(250);
        assert_eq!(w.page, 1);
        assert_eq!(w.page_size, MAX_PAGE_SIZE);
        assert_eq!(w.total_pages, 3);

        let p = PageParams { page: None, page_size: None };
        assert_eq!(p.limit_offset(), (10, 0));
    }

    #[test]
    fn from_vec_slices_items() {
        let page = Page::from_vec((1..=25).collect::<Vec<_>>(), &params(3, 10));
        assert_eq!(page.items, vec![21, 22, 23, 24, 25]);
        assert_eq!(page.pagination.total_pages, 3);
    }
}
