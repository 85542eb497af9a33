use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::repo::{Product, ProductFilter};
use crate::pagination::{PageInfo, PageQuery};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub brand: String,
    pub images: Vec<String>,
    pub price: f64,
    #[serde(default)]
    pub old_price: f64,
    pub category: Uuid,
    #[serde(default)]
    pub cat_name: String,
    #[serde(default)]
    pub cat_id: String,
    #[serde(default)]
    pub sub_cat_id: String,
    #[serde(default)]
    pub sub_cat_name: String,
    #[serde(default)]
    pub third_sub_cat_id: String,
    #[serde(default)]
    pub third_sub_cat_name: String,
    pub count_in_stock: i32,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub discount: f64,
    #[serde(default)]
    pub product_ram: Vec<String>,
    #[serde(default)]
    pub size: Vec<String>,
    #[serde(default = "default_weight")]
    pub product_weight: f64,
    #[serde(default = "default_location")]
    pub location: String,
}

fn default_weight() -> f64 {
    1.0
}
fn default_location() -> String {
    "All".into()
}

fn default_page() -> i64 {
    1
}
fn default_per_page() -> i64 {
    10
}

/// Listing query: pagination plus every supported filter.
/// Pagination fields are inlined because `serde(flatten)` breaks numeric
/// parsing through the query-string deserializer.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductListQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_per_page", alias = "limit")]
    pub per_page: i64,
    pub location: Option<String>,
    pub category: Option<Uuid>,
    pub cat_name: Option<String>,
    pub sub_cat_id: Option<String>,
    pub sub_cat_name: Option<String>,
    pub third_sub_cat_id: Option<String>,
    pub third_sub_cat_name: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub is_featured: Option<bool>,
    pub rating: Option<f64>,
}

impl ProductListQuery {
    pub fn page_query(&self) -> PageQuery {
        PageQuery {
            page: self.page,
            per_page: self.per_page,
        }
        .clamped()
    }

    pub fn filter(&self) -> ProductFilter {
        ProductFilter {
            location: self.location.clone(),
            category_id: self.category,
            cat_name: self.cat_name.clone(),
            sub_cat_id: self.sub_cat_id.clone(),
            sub_cat_name: self.sub_cat_name.clone(),
            third_sub_cat_id: self.third_sub_cat_id.clone(),
            third_sub_cat_name: self.third_sub_cat_name.clone(),
            min_price: self.min_price,
            max_price: self.max_price,
            is_featured: self.is_featured,
            min_rating: self.rating,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductList {
    pub products: Vec<Product>,
    pub current_page: i64,
    pub per_page: i64,
    pub total_pages: i64,
    pub total_products: i64,
}

impl ProductList {
    pub fn new(products: Vec<Product>, info: PageInfo) -> Self {
        Self {
            products,
            current_page: info.current_page,
            per_page: info.per_page,
            total_pages: info.total_pages,
            total_products: info.total_items,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCounts {
    pub total_products: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_fills_defaults() {
        let json = serde_json::json!({
            "name": "Mug",
            "images": ["https://cdn.local/store/uploads/a.jpg"],
            "price": 9.5,
            "category": Uuid::new_v4(),
            "countInStock": 3
        });
        let req: CreateProductRequest = serde_json::from_value(json).unwrap();
        assert_eq!(req.product_weight, 1.0);
        assert_eq!(req.location, "All");
        assert!(!req.is_featured);
        assert!(req.product_ram.is_empty());
    }

    #[test]
    fn list_query_maps_to_filter() {
        let q: ProductListQuery = serde_json::from_value(serde_json::json!({
            "page": 2, "perPage": 5, "location": "Berlin", "minPrice": 10.0
        }))
        .unwrap();
        let f = q.filter();
        assert_eq!(f.location.as_deref(), Some("Berlin"));
        assert_eq!(f.min_price, Some(10.0));
        assert_eq!(q.page, 2);
        assert_eq!(q.per_page, 5);
    }
}
