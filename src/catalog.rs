use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use utoipa::{IntoParams, ToSchema};

use crate::models::Service;

/// SortOrder
///
/// Orderings offered on the service listing page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Newest,
    PriceLowHigh,
    PriceHighLow,
    Rating,
    Title,
}

/// ServiceQuery
///
/// Query parameters accepted by `GET /services`. Every field is optional; an
/// empty query returns the backend listing unchanged.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ServiceQuery {
    /// Category name. `all` disables the filter.
    pub category: Option<String>,
    /// Case-insensitive text matched against title, description and category.
    pub search: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub sort: Option<SortOrder>,
}

/// apply
///
/// Filters then sorts. Sorting is stable, so ties keep the backend order.
pub fn apply(services: Vec<Service>, query: &ServiceQuery) -> Vec<Service> {
    let category = query
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case("all"));
    let search = query
        .search
        .as_deref()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());

    let mut matched: Vec<Service> = services
        .into_iter()
        .filter(|service| category.is_none_or(|c| service.category.eq_ignore_ascii_case(c)))
        .filter(|service| search.as_deref().is_none_or(|needle| matches_text(service, needle)))
        .filter(|service| query.min_price.is_none_or(|min| service.price >= min))
        .filter(|service| query.max_price.is_none_or(|max| service.price <= max))
        .collect();

    if let Some(order) = query.sort {
        matched.sort_by(|a, b| compare(a, b, order));
    }

    matched
}

fn matches_text(service: &Service, needle: &str) -> bool {
    [&service.title, &service.description, &service.category]
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
}

fn compare(a: &Service, b: &Service, order: SortOrder) -> Ordering {
    match order {
        SortOrder::PriceLowHigh => a.price.total_cmp(&b.price),
        SortOrder::PriceHighLow => b.price.total_cmp(&a.price),
        // Unrated and undated listings go last.
        SortOrder::Rating => match (a.rating, b.rating) {
            (Some(x), Some(y)) => y.total_cmp(&x),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
        SortOrder::Newest => match (a.created_at, b.created_at) {
            (Some(x), Some(y)) => y.cmp(&x),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
        SortOrder::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
    }
}
