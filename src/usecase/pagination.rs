use crate::domain::entities::query::PageRequest;

pub const FIRST_PAGE: u64 = 1;

/// Offsets saturate at `u64::MAX`; such a page simply comes back empty.
pub fn to_page_request(page_number: u64, page_size: u64) -> PageRequest {
    let page_number = page_number.max(FIRST_PAGE);
    let page_size = page_size.max(1);
    PageRequest {
        offset: (page_number - 1).saturating_mul(page_size),
        limit: page_size,
    }
}

pub fn reset_to_first_page() -> u64 {
    FIRST_PAGE
}

pub fn total_pages(total_count: u64, page_size: u64) -> u64 {
    total_count.div_ceil(page_size.max(1))
}

/// Pulls a page number back inside `1..=total_pages` (page 1 when empty).
pub fn clamp_to_last_page(page_number: u64, total_pages: u64) -> u64 {
    page_number.clamp(FIRST_PAGE, total_pages.max(FIRST_PAGE))
}
