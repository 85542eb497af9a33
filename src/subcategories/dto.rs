use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::repo::{SubCategory, SubCategoryFilter};
use crate::pagination::{PageInfo, PageQuery};

fn default_true() -> bool {
    true
}
fn default_page() -> i64 {
    1
}
fn default_per_page() -> i64 {
    10
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubCategoryRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category_id: Uuid,
    #[serde(default)]
    pub image: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default)]
    pub meta_title: String,
    #[serde(default)]
    pub meta_description: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubCategoryListQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_per_page", alias = "limit")]
    pub per_page: i64,
    pub search: Option<String>,
    pub category: Option<Uuid>,
    #[serde(alias = "active")]
    pub is_active: Option<bool>,
}

impl SubCategoryListQuery {
    pub fn page_query(&self) -> PageQuery {
        PageQuery {
            page: self.page,
            per_page: self.per_page,
        }
        .clamped()
    }

    pub fn filter(&self) -> SubCategoryFilter {
        SubCategoryFilter {
            search: self.search.clone(),
            category_id: self.category,
            is_active: self.is_active,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubCategoryList {
    pub sub_categories: Vec<SubCategory>,
    pub current_page: i64,
    pub per_page: i64,
    pub total_pages: i64,
    pub total_items: i64,
}

impl SubCategoryList {
    pub fn new(sub_categories: Vec<SubCategory>, info: PageInfo) -> Self {
        Self {
            sub_categories,
            current_page: info.current_page,
            per_page: info.per_page,
            total_pages: info.total_pages,
            total_items: info.total_items,
        }
    }
}
