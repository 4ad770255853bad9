//! Offset pagination for list endpoints.

use serde::{Deserialize, Serialize};

/// A validated page request. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
  pub page:  u32,
  pub limit: u32,
}

impl PageRequest {
  pub const DEFAULT_LIMIT: u32 = 10;
  pub const MAX_LIMIT: u32 = 100;

  /// Missing or zero values fall back to page 1 and the default limit; the
  /// limit is capped at [`Self::MAX_LIMIT`].
  pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
    Self {
      page:  page.filter(|&p| p > 0).unwrap_or(1),
      limit: limit
        .filter(|&l| l > 0)
        .unwrap_or(Self::DEFAULT_LIMIT)
        .min(Self::MAX_LIMIT),
    }
  }

  pub fn offset(&self) -> u64 { u64::from(self.page - 1) * u64::from(self.limit) }
}

impl Default for PageRequest {
  fn default() -> Self { Self::new(None, None) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMetadata {
  pub page:        u32,
  pub limit:       u32,
  pub total:       u64,
  pub total_pages: u64,
}

impl PageMetadata {
  pub fn new(request: PageRequest, total: u64) -> Self {
    Self {
      page: request.page,
      limit: request.limit,
      total,
      total_pages: total.div_ceil(u64::from(request.limit)),
    }
  }
}

/// One page of rows plus the count across all pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
  pub data:     Vec<T>,
  pub metadata: PageMetadata,
}
