//! Request planning.
//!
//! Every `/search` call resolves to exactly one of three mutually exclusive
//! query shapes before any I/O happens. The selection is a pure function of
//! the request, so two identical requests always produce the same plan.

use prodfinder_core::config::{EmptyRequestPolicy, SearchConfig};
use prodfinder_core::error::{Error, Result};
use prodfinder_core::types::{Filter, SearchRequest};

/// Skip-based pagination window.
///
/// One extra row is fetched beyond the page size; its presence answers "is
/// there a next page" without a count query. Correct as long as the store's
/// skip+limit+sort combination is itself consistent between pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u32,
    pub limit: u32,
}

impl PageWindow {
    pub fn skip(&self) -> u32 {
        (self.page - 1) * self.limit
    }

    pub fn fetch_limit(&self) -> u32 {
        self.limit + 1
    }

    /// Trim a fetched batch to the page size, reporting whether the extra
    /// row was present.
    pub fn apply<T>(&self, mut rows: Vec<T>) -> (Vec<T>, bool) {
        let has_next = rows.len() > self.limit as usize;
        if has_next {
            rows.truncate(self.limit as usize);
        }
        (rows, has_next)
    }
}

/// The three query shapes. No plan ever mixes strategies: ranking is either
/// delegated entirely to the store (`Vector`) or pinned to document id
/// (`Filter`, `Listing`) so that skip-pagination stays deterministic.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryPlan {
    Vector {
        text: String,
        filter: Filter,
        window: PageWindow,
    },
    Filter {
        filter: Filter,
        window: PageWindow,
    },
    Listing {
        window: PageWindow,
    },
}

impl QueryPlan {
    pub fn window(&self) -> PageWindow {
        match self {
            Self::Vector { window, .. } | Self::Filter { window, .. } | Self::Listing { window } => {
                *window
            }
        }
    }
}

pub fn build_plan(request: &SearchRequest, config: &SearchConfig) -> Result<QueryPlan> {
    let window = validate_window(request, config)?;
    let filter = build_filter(request)?;
    let text = request
        .query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty());

    match (text, filter.is_empty()) {
        (Some(text), _) => Ok(QueryPlan::Vector {
            text: text.to_string(),
            filter,
            window,
        }),
        (None, false) => Ok(QueryPlan::Filter { filter, window }),
        (None, true) => match config.empty_request {
            EmptyRequestPolicy::Listing => Ok(QueryPlan::Listing { window }),
            EmptyRequestPolicy::Reject => Err(Error::Validation(
                "supply a query or at least one filter".to_string(),
            )),
        },
    }
}

fn validate_window(request: &SearchRequest, config: &SearchConfig) -> Result<PageWindow> {
    // serde already rejected non-numeric and negative values at the
    // extractor; zero still needs a check.
    let limit = request.limit.unwrap_or(config.default_limit);
    if limit < 1 {
        return Err(Error::Validation("limit must be at least 1".to_string()));
    }
    let page = request.page.unwrap_or(1);
    if page < 1 {
        return Err(Error::Validation("page must be at least 1".to_string()));
    }
    Ok(PageWindow { page, limit })
}

fn build_filter(request: &SearchRequest) -> Result<Filter> {
    Ok(Filter {
        category: non_empty(request.category.as_deref()),
        city: non_empty(request.city.as_deref()),
        min_price: validated_price("minPrice", request.min_price)?,
        max_price: validated_price("maxPrice", request.max_price)?,
    })
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

fn validated_price(name: &str, value: Option<f64>) -> Result<Option<f64>> {
    match value {
        Some(v) if !v.is_finite() => {
            Err(Error::Validation(format!("{name} must be a finite number")))
        }
        Some(v) if v < 0.0 => Err(Error::Validation(format!("{name} must not be negative"))),
        other => Ok(other),
    }
}
