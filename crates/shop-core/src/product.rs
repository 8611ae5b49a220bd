//! # Product Catalog
//!
//! Catalog types for the storefront. The catalog is a read-side
//! collaborator of checkout: carts and orders reference products by id and
//! snapshot their prices. Catalog data is loaded from `config/catalog.toml`.

use crate::error::{ShopError, ShopResult};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Products per listing page
pub const PRODUCT_PAGE_SIZE: usize = 12;

/// A top-level category (e.g. "Electronics")
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
}

/// A subcategory within a category (e.g. "Headphones")
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubCategory {
    pub id: String,
    pub name: String,
    pub category_id: String,
}

/// A product in the catalog.
///
/// Prices are fixed-point decimal with 2 places. Once an order item has
/// snapshotted a product, later price edits never affect that order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Unique product identifier (e.g. "anc-headphones")
    pub id: String,

    /// Display name, unique case-insensitively within its subcategory
    pub name: String,

    /// Unit price (2 decimal places)
    pub price: Decimal,

    /// Units on hand
    #[serde(default)]
    pub quantity_on_hand: u32,

    /// Subcategory this product belongs to
    pub sub_category_id: String,

    /// Optional image URL (used for listings and confirmation emails)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Sort order for product listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    NameAsc,
    NameDesc,
    /// Most recently added first
    #[default]
    Newest,
}

/// Filter/sort/pagination parameters for a product listing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductQuery {
    /// Case-insensitive name substring
    pub name_contains: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    #[serde(default)]
    pub sort: ProductSort,
    /// 1-based page number
    pub page: Option<u32>,
}

/// One page of a product listing
#[derive(Debug, Clone, Serialize)]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub page: u32,
    pub total: usize,
}

/// Product catalog (loaded from config)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductCatalog {
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub sub_categories: Vec<SubCategory>,
    #[serde(default)]
    pub products: Vec<Product>,
}

impl ProductCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a product, enforcing case-insensitive name uniqueness within
    /// its subcategory.
    pub fn add(&mut self, product: Product) -> ShopResult<()> {
        let clash = self.products.iter().any(|p| {
            p.sub_category_id == product.sub_category_id
                && p.name.eq_ignore_ascii_case(&product.name)
        });
        if clash {
            return Err(ShopError::validation(
                "name",
                format!(
                    "product '{}' already exists in subcategory '{}'",
                    product.name, product.sub_category_id
                ),
            ));
        }
        self.products.push(product);
        Ok(())
    }

    /// Find a product by ID
    pub fn get(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    /// Unit price for a product id, for totals recomputation
    pub fn price_of(&self, id: &str) -> ShopResult<Decimal> {
        self.get(id)
            .map(|p| p.price)
            .ok_or_else(|| ShopError::ProductNotFound {
                product_id: id.to_string(),
            })
    }

    /// Filter, sort and paginate the catalog.
    ///
    /// Recency is catalog insertion order, newest last in the backing
    /// vector, so `Newest` walks it in reverse.
    pub fn search(&self, query: &ProductQuery) -> ProductPage {
        let needle = query.name_contains.as_deref().map(str::to_lowercase);

        let mut matched: Vec<&Product> = self
            .products
            .iter()
            .filter(|p| {
                if let Some(ref n) = needle {
                    if !p.name.to_lowercase().contains(n.as_str()) {
                        return false;
                    }
                }
                if let Some(min) = query.min_price {
                    if p.price < min {
                        return false;
                    }
                }
                if let Some(max) = query.max_price {
                    if p.price > max {
                        return false;
                    }
                }
                true
            })
            .collect();

        match query.sort {
            ProductSort::NameAsc => {
                matched.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
            }
            ProductSort::NameDesc => {
                matched.sort_by(|a, b| b.name.to_lowercase().cmp(&a.name.to_lowercase()));
            }
            ProductSort::Newest => matched.reverse(),
        }

        let total = matched.len();
        let page = query.page.unwrap_or(1).max(1);
        let start = (page as usize - 1) * PRODUCT_PAGE_SIZE;
        let products = matched
            .into_iter()
            .skip(start)
            .take(PRODUCT_PAGE_SIZE)
            .cloned()
            .collect();

        ProductPage {
            products,
            page,
            total,
        }
    }

    /// Load catalog from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }
}
