use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::{AppError, AppResult},
    models::Product,
    money::Money,
    validation::{Validate, Violations},
};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[schema(value_type = String, example = "25.00")]
    pub price: Money,
    pub category: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub stock: i32,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl Validate for CreateProductRequest {
    fn validate(&self) -> AppResult<()> {
        let mut v = Violations::new();
        v.require_text(&self.name, "name");
        v.require_text(&self.category, "category");
        v.check(self.stock >= 0, "stock", "stock must not be negative");
        v.finish()
    }
}

/// Partial product edit. Every present field becomes one [`ProductChange`].
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    #[schema(value_type = Option<String>, example = "25.00")]
    pub price: Option<Money>,
    pub category: Option<String>,
    pub images: Option<Vec<String>>,
    pub sizes: Option<Vec<String>>,
    pub colors: Option<Vec<String>>,
    pub stock: Option<i32>,
    pub is_active: Option<bool>,
}

/// The mutations an admin may apply to a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductChange {
    Rename(String),
    Describe(String),
    Reprice(Money),
    Recategorize(String),
    SetImages(Vec<String>),
    SetSizes(Vec<String>),
    SetColors(Vec<String>),
    SetStock(i32),
    SetActive(bool),
}

impl UpdateProductRequest {
    pub fn into_changes(self) -> AppResult<Vec<ProductChange>> {
        let mut v = Violations::new();
        let mut changes = Vec::new();

        if let Some(name) = self.name {
            v.require_text(&name, "name");
            changes.push(ProductChange::Rename(name.trim().to_string()));
        }
        if let Some(description) = self.description {
            changes.push(ProductChange::Describe(description));
        }
        if let Some(price) = self.price {
            changes.push(ProductChange::Reprice(price));
        }
        if let Some(category) = self.category {
            v.require_text(&category, "category");
            changes.push(ProductChange::Recategorize(category.trim().to_string()));
        }
        if let Some(images) = self.images {
            changes.push(ProductChange::SetImages(clean_list(images)));
        }
        if let Some(sizes) = self.sizes {
            changes.push(ProductChange::SetSizes(clean_list(sizes)));
        }
        if let Some(colors) = self.colors {
            changes.push(ProductChange::SetColors(clean_list(colors)));
        }
        if let Some(stock) = self.stock {
            v.check(stock >= 0, "stock", "stock must not be negative");
            changes.push(ProductChange::SetStock(stock));
        }
        if let Some(is_active) = self.is_active {
            changes.push(ProductChange::SetActive(is_active));
        }

        v.finish()?;
        if changes.is_empty() {
            return Err(AppError::BadRequest("No product fields to update".into()));
        }
        Ok(changes)
    }
}

/// Trims entries and drops blanks, as the admin form submits comma lists.
pub fn clean_list(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .collect()
}

/// Raw catalog query string; prices are validated in [`ProductQuery::into_filter`].
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ProductQuery {
    /// Exact category match.
    pub category: Option<String>,
    /// Lowest price, inclusive.
    pub min_price: Option<String>,
    /// Highest price, inclusive.
    pub max_price: Option<String>,
    /// Substring of the product name.
    pub search: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProductFilter {
    pub category: Option<String>,
    pub min_price: Option<Money>,
    pub max_price: Option<Money>,
    pub search: Option<String>,
}

impl ProductQuery {
    pub fn into_filter(self) -> AppResult<ProductFilter> {
        let mut v = Violations::new();
        let mut parse_price = |raw: Option<String>, field: &str| -> Option<Money> {
            let raw = non_blank(raw)?;
            match raw.parse::<Money>() {
                Ok(price) => Some(price),
                Err(err) => {
                    v.push(field, err.to_string());
                    None
                }
            }
        };
        let min_price = parse_price(self.min_price, "minPrice");
        let max_price = parse_price(self.max_price, "maxPrice");
        v.finish()?;

        Ok(ProductFilter {
            category: non_blank(self.category),
            min_price,
            max_price,
            search: non_blank(self.search),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct ProductList {
    #[schema(value_type = Vec<Product>)]
    pub items: Vec<Product>,
}
