pub const MATCHES_PER_PAGE: usize = 10;

#[derive(Debug, PartialEq, Eq)]
pub struct Page<'a, T> {
  pub items: &'a [T],
  pub total_pages: usize,
}

pub fn total_pages(total_items: usize, page_size: usize) -> usize {
  if page_size == 0 {
    return 0;
  }
  total_items.div_ceil(page_size)
}

/// Slices out the 1-based `page`. Pages outside the list yield an empty slice.
pub fn paginate<T>(items: &[T], page: usize, page_size: usize) -> Page<'_, T> {
  let total_pages = total_pages(items.len(), page_size);
  if page == 0 || page > total_pages {
    return Page { items: &[], total_pages };
  }

  let start = (page - 1) * page_size;
  let end = (start + page_size).min(items.len());
  Page {
    items: &items[start .. end],
    total_pages,
  }
}

pub fn clamp_page(page: usize, total_pages: usize) -> usize {
  page.clamp(1, total_pages.max(1))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavControl {
  Previous(usize),
  Indicator { page: usize, total: usize },
  Next(usize),
}

pub fn navigation(page: usize, total_pages: usize) -> Vec<NavControl> {
  if total_pages <= 1 {
    return Vec::new();
  }

  let mut controls = Vec::with_capacity(3);
  if page > 1 {
    controls.push(NavControl::Previous(page - 1));
  }
  controls.push(NavControl::Indicator {
    page,
    total: total_pages,
  });
  if page < total_pages {
    controls.push(NavControl::Next(page + 1));
  }
  controls
}
