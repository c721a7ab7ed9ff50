//! crates/job_board_core/src/query.rs
//!
//! The listing view's browse/search intent and its URL query-parameter form.

use std::str::FromStr;

use crate::domain::{Category, FilterSet};

/// What the listing view should show.
///
/// Filters only apply while `query` is non-empty; in browse mode only
/// `list_category` matters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingQuery {
    pub query: String,
    pub filters: FilterSet,
    pub list_category: Option<Category>,
}

impl ListingQuery {
    pub fn browse(list_category: Option<Category>) -> Self {
        Self {
            list_category,
            ..Self::default()
        }
    }

    pub fn is_search(&self) -> bool {
        !self.query.trim().is_empty()
    }

    /// Parses `q`, `region`, `duration`, `category`, `budgetType`,
    /// `minBudget`, `maxBudget` and `listCategory`. Unknown keys and values
    /// that do not parse are ignored.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut parsed = ListingQuery::default();
        for (key, value) in pairs {
            let value = value.as_ref().trim();
            if value.is_empty() {
                continue;
            }
            let filters = &mut parsed.filters;
            match key.as_ref() {
                "q" => parsed.query = value.to_string(),
                "region" => filters.region = Some(value.to_string()),
                "duration" => filters.duration = parse(value),
                "category" => filters.category = parse(value),
                "budgetType" => filters.budget_type = parse(value),
                "minBudget" => filters.min_budget = parse(value),
                "maxBudget" => filters.max_budget = parse(value),
                "listCategory" => parsed.list_category = parse(value),
                _ => {}
            }
        }

        if !parsed.is_search() {
            parsed.query.clear();
            parsed.filters = FilterSet::default();
        }
        parsed
    }

    /// The query-string form. Filters are only emitted in search mode.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        let mut push = |key: &str, value: String| pairs.push((key.to_string(), value));

        if self.is_search() {
            push("q", self.query.trim().to_string());
            let f = &self.filters;
            if let Some(region) = &f.region {
                push("region", region.clone());
            }
            if let Some(duration) = f.duration {
                push("duration", duration.to_string());
            }
            if let Some(category) = f.category {
                push("category", category.to_string());
            }
            if let Some(budget_type) = f.budget_type {
                push("budgetType", budget_type.to_string());
            }
            if let Some(min) = f.min_budget {
                push("minBudget", min.to_string());
            }
            if let Some(max) = f.max_budget {
                push("maxBudget", max.to_string());
            }
        }
        if let Some(category) = self.list_category {
            push("listCategory", category.to_string());
        }
        pairs
    }
}

fn parse<T: FromStr>(value: &str) -> Option<T> {
    value.parse().ok()
}
