//! Search request parameters and their validation.
//!
//! A `SearchRequest` only exists in validated form: `from_params` rejects
//! anything the store should never see (blank text, negative pages,
//! non-positive sizes, malformed prices) instead of clamping it.

use thiserror::Error;

/// Page used when the client does not send one.
pub const DEFAULT_PAGE: u32 = 0;

/// Page size used when the client does not send one.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Largest page size a client may request.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Deepest result position the store can page to (`from + size`).
pub const MAX_RESULT_WINDOW: u64 = 10_000;

/// Reasons a search request is rejected before reaching the store.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("missing or blank query parameter 'q'")]
    MissingQuery,

    #[error("invalid page '{0}': must be an integer >= 0")]
    InvalidPage(String),

    #[error("invalid size '{0}': must be an integer between 1 and 100")]
    InvalidSize(String),

    #[error("invalid {param} '{value}': must be a number")]
    InvalidPrice { param: &'static str, value: String },

    #[error("minPrice {min} is greater than maxPrice {max}")]
    InvalidPriceRange { min: f64, max: f64 },

    #[error("page {page} with size {size} is beyond the result window of 10000")]
    ResultWindowExceeded { page: u32, size: u32 },
}

/// Ordering applied to search results.
///
/// Exactly one mode is active per request; an explicit sort replaces
/// relevance ranking entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    #[default]
    Relevance,
    PriceAsc,
    PriceDesc,
    Newest,
}

impl SortMode {
    /// Parse the `sort` parameter. Absent or unrecognized values mean relevance.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("price_asc") => Self::PriceAsc,
            Some("price_desc") => Self::PriceDesc,
            Some("newest") => Self::Newest,
            _ => Self::Relevance,
        }
    }
}

/// A validated search request.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    /// Free-text query, trimmed and never blank.
    pub q: String,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub sort: SortMode,
    pub page: u32,
    pub size: u32,
}

impl SearchRequest {
    /// Create a relevance-sorted request for the first page.
    pub fn new(q: impl Into<String>) -> Self {
        Self {
            q: q.into(),
            category: None,
            brand: None,
            min_price: None,
            max_price: None,
            sort: SortMode::Relevance,
            page: DEFAULT_PAGE,
            size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    pub fn with_price_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min_price = min;
        self.max_price = max;
        self
    }

    pub fn with_sort(mut self, sort: SortMode) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_page(mut self, page: u32, size: u32) -> Self {
        self.page = page;
        self.size = size;
        self
    }

    /// Build a request from raw query-string pairs.
    ///
    /// Empty values are treated as absent. Repeated keys keep the last value.
    pub fn from_params<'a, I>(params: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut q = None;
        let mut category = None;
        let mut brand = None;
        let mut min_price = None;
        let mut max_price = None;
        let mut sort = None;
        let mut page = None;
        let mut size = None;

        for (key, value) in params {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match key {
                "q" => q = Some(value),
                "category" => category = Some(value),
                "brand" => brand = Some(value),
                "minPrice" => min_price = Some(value),
                "maxPrice" => max_price = Some(value),
                "sort" => sort = Some(value),
                "page" => page = Some(value),
                "size" => size = Some(value),
                _ => {}
            }
        }

        let q = q.ok_or(ValidationError::MissingQuery)?;
        let page = match page {
            Some(raw) => parse_page(raw)?,
            None => DEFAULT_PAGE,
        };
        let size = match size {
            Some(raw) => parse_size(raw)?,
            None => DEFAULT_PAGE_SIZE,
        };
        let min_price = min_price
            .map(|raw| parse_price("minPrice", raw))
            .transpose()?;
        let max_price = max_price
            .map(|raw| parse_price("maxPrice", raw))
            .transpose()?;

        if let (Some(min), Some(max)) = (min_price, max_price) {
            if min > max {
                return Err(ValidationError::InvalidPriceRange { min, max });
            }
        }

        let request = Self {
            q: q.to_string(),
            category: category.map(str::to_string),
            brand: brand.map(str::to_string),
            min_price,
            max_price,
            sort: SortMode::parse(sort),
            page,
            size,
        };

        if request.start() + u64::from(request.size) > MAX_RESULT_WINDOW {
            return Err(ValidationError::ResultWindowExceeded { page, size });
        }

        Ok(request)
    }

    /// Offset of the first result: `page * size`.
    pub fn start(&self) -> u64 {
        u64::from(self.page) * u64::from(self.size)
    }

    /// Number of results per page.
    pub fn rows(&self) -> u32 {
        self.size
    }

    /// Whether either price bound is present.
    pub fn has_price_range(&self) -> bool {
        self.min_price.is_some() || self.max_price.is_some()
    }
}

fn parse_page(raw: &str) -> Result<u32, ValidationError> {
    raw.parse::<u32>()
        .map_err(|_| ValidationError::InvalidPage(raw.to_string()))
}

fn parse_size(raw: &str) -> Result<u32, ValidationError> {
    match raw.parse::<u32>() {
        Ok(size) if (1..=MAX_PAGE_SIZE).contains(&size) => Ok(size),
        _ => Err(ValidationError::InvalidSize(raw.to_string())),
    }
}

fn parse_price(param: &'static str, raw: &str) -> Result<f64, ValidationError> {
    match raw.parse::<f64>() {
        Ok(price) if price.is_finite() => Ok(price),
        _ => Err(ValidationError::InvalidPrice {
            param,
            value: raw.to_string(),
        }),
    }
}
