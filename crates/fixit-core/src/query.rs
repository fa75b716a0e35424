//! The list-query contract: filters, sorting, pagination.
//!
//! Loosely-typed query strings are coerced into these types exactly once, at
//! the transport boundary; the store only ever sees validated values. The
//! engine trusts the filters it is given — role scoping (a technician
//! listing "my work") is expressed by the caller as `assigned_to = self`.

use serde::Serialize;

use crate::request::{Status, Urgency};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

// ─── Filter ──────────────────────────────────────────────────────────────────

/// Optional, AND-combined row filters.
#[derive(Debug, Clone, Default)]
pub struct RequestFilter {
  pub status:      Option<Status>,
  pub urgency:     Option<Urgency>,
  pub category_id: Option<i64>,
  pub user_id:     Option<i64>,
  pub assigned_to: Option<i64>,
  /// Case-insensitive substring match over title or description.
  pub q:           Option<String>,
}

// ─── Sort ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
  Id,
  CreatedAt,
  Urgency,
  Status,
  CategoryId,
  AssignedTo,
}

impl SortField {
  /// Coerce a client-supplied field name. Unrecognized names fall back to
  /// `Id` rather than erroring.
  pub fn parse(s: &str) -> SortField {
    match s {
      "id" => SortField::Id,
      "created_at" => SortField::CreatedAt,
      "urgency" => SortField::Urgency,
      "status" => SortField::Status,
      "category_id" => SortField::CategoryId,
      "assigned_to" => SortField::AssignedTo,
      _ => SortField::Id,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
  Asc,
  Desc,
}

impl SortDirection {
  pub fn parse(s: &str) -> Option<SortDirection> {
    match s.to_ascii_lowercase().as_str() {
      "asc" => Some(SortDirection::Asc),
      "desc" => Some(SortDirection::Desc),
      _ => None,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
  pub field:     SortField,
  pub direction: SortDirection,
}

impl Default for Sort {
  /// Newest first.
  fn default() -> Self {
    Sort { field: SortField::CreatedAt, direction: SortDirection::Desc }
  }
}

impl Sort {
  /// Coerce raw query-string values into a sort.
  ///
  /// No field at all means the default (`created_at desc`). An explicit
  /// field sorts ascending unless a direction is given; an unparseable
  /// direction is treated as absent.
  pub fn from_params(field: Option<&str>, direction: Option<&str>) -> Sort {
    let field = match field {
      None => SortField::CreatedAt,
      Some(s) => SortField::parse(s),
    };
    let direction = direction
      .and_then(SortDirection::parse)
      .unwrap_or(match field {
        SortField::CreatedAt => SortDirection::Desc,
        _ => SortDirection::Asc,
      });
    Sort { field, direction }
  }
}

// ─── Pagination ──────────────────────────────────────────────────────────────

/// A validated page request. Construction clamps: page is 1-based with a
/// floor of 1, page size defaults to 20 and is clamped to [1, 100].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
  page:      u32,
  page_size: u32,
}

impl PageParams {
  pub fn new(page: Option<u32>, page_size: Option<u32>) -> Self {
    PageParams {
      page:      page.unwrap_or(1).max(1),
      page_size: page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
    }
  }

  pub fn page(self) -> u32 { self.page }

  pub fn page_size(self) -> u32 { self.page_size }

  pub fn offset(self) -> u64 {
    (self.page as u64 - 1) * self.page_size as u64
  }

  pub fn limit(self) -> u64 { self.page_size as u64 }
}

impl Default for PageParams {
  fn default() -> Self { PageParams::new(None, None) }
}

/// One page of results plus the size of the whole filtered set.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
  pub items:       Vec<T>,
  /// Matching rows before pagination.
  pub total:       u64,
  pub page:        u32,
  pub page_size:   u32,
  pub total_pages: u32,
}

impl<T> Page<T> {
  pub fn new(items: Vec<T>, total: u64, params: PageParams) -> Self {
    Page {
      items,
      total,
      page: params.page(),
      page_size: params.page_size(),
      total_pages: total.div_ceil(params.page_size() as u64) as u32,
    }
  }
}

// ─── Bundle ──────────────────────────────────────────────────────────────────

/// Everything [`crate::store::RequestStore::list_requests`] needs.
#[derive(Debug, Clone, Default)]
pub struct RequestQuery {
  pub filter: RequestFilter,
  pub sort:   Sort,
  pub page:   PageParams,
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn page_params_clamp() {
    let p = PageParams::new(None, None);
    assert_eq!((p.page(), p.page_size()), (1, 20));

    let p = PageParams::new(Some(0), Some(0));
    assert_eq!((p.page(), p.page_size()), (1, 1));

    let p = PageParams::new(Some(3), Some(500));
    assert_eq!((p.page(), p.page_size()), (3, 100));
    assert_eq!(p.offset(), 200);
  }

  #[test]
  fn total_pages_rounds_up() {
    let params = PageParams::new(Some(1), Some(20));
    assert_eq!(Page::<i64>::new(vec![], 45, params).total_pages, 3);
    assert_eq!(Page::<i64>::new(vec![], 40, params).total_pages, 2);
    assert_eq!(Page::<i64>::new(vec![], 0, params).total_pages, 0);
  }

  #[test]
  fn unknown_sort_field_falls_back_to_id() {
    assert_eq!(SortField::parse("no_such_column"), SortField::Id);
    assert_eq!(SortField::parse("created_at"), SortField::CreatedAt);
  }

  #[test]
  fn sort_defaults() {
    let sort = Sort::from_params(None, None);
    assert_eq!(sort, Sort { field: SortField::CreatedAt, direction: SortDirection::Desc });

    // An explicit field sorts ascending unless told otherwise.
    let sort = Sort::from_params(Some("urgency"), None);
    assert_eq!(sort, Sort { field: SortField::Urgency, direction: SortDirection::Asc });

    let sort = Sort::from_params(Some("urgency"), Some("desc"));
    assert_eq!(sort.direction, SortDirection::Desc);

    // Garbage direction is treated as absent.
    let sort = Sort::from_params(Some("id"), Some("sideways"));
    assert_eq!(sort.direction, SortDirection::Asc);
  }
}
