//! Configuration types for query building.

/// Tunables for the query builder.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryConfig {
    /// Upper edge of the price facet; the last bucket is open-ended above it.
    pub price_facet_ceiling: f64,
    /// Number of equal-width price buckets.
    pub price_facet_buckets: usize,
    /// Maximum number of values returned per terms facet.
    pub facet_size: usize,
    /// Age at which the recency boost has decayed to `recency_decay`.
    pub recency_scale: String,
    /// Age below which documents receive the full recency boost.
    pub recency_offset: String,
    /// Boost remaining at `recency_offset + recency_scale`.
    pub recency_decay: f64,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            price_facet_ceiling: 1000.0,
            price_facet_buckets: 10,
            facet_size: 50,
            recency_scale: "30d".to_string(),
            recency_offset: "1d".to_string(),
            recency_decay: 0.5,
        }
    }
}

/// One bucket of the price range facet. `to` is exclusive; `None` is unbounded.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceRange {
    pub key: String,
    pub from: f64,
    pub to: Option<f64>,
}

impl QueryConfig {
    /// Create a config with a custom price facet ceiling.
    pub fn with_price_ceiling(price_facet_ceiling: f64) -> Self {
        Self {
            price_facet_ceiling,
            ..Self::default()
        }
    }

    /// The fixed price buckets, lowest first.
    pub fn price_ranges(&self) -> Vec<PriceRange> {
        let buckets = self.price_facet_buckets.max(1);
        let width = self.price_facet_ceiling / buckets as f64;

        (0..buckets)
            .map(|i| {
                let from = width * i as f64;
                if i + 1 == buckets {
                    PriceRange {
                        key: format!("{}-*", from),
                        from,
                        to: None,
                    }
                } else {
                    let to = width * (i + 1) as f64;
                    PriceRange {
                        key: format!("{}-{}", from, to),
                        from,
                        to: Some(to),
                    }
                }
            })
            .collect()
    }
}
