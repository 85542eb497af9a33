use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::repo::{Order, OrderFilter, OrderLine};
use crate::addresses::repo::Address;
use crate::pagination::{PageInfo, PageQuery};
use crate::users::repo::User;

fn default_payment_method() -> String {
    "COD".into()
}
fn default_page() -> i64 {
    1
}
fn default_per_page() -> i64 {
    10
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineRequest {
    pub product_id: Uuid,
    pub quantity: i32,
    #[serde(default)]
    pub selected_size: String,
    #[serde(default)]
    pub selected_color: String,
    #[serde(default)]
    pub selected_ram: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub items: Vec<OrderLineRequest>,
    pub shipping_address_id: Uuid,
    #[serde(default = "default_payment_method")]
    pub payment_method: String,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Deserialize)]
pub struct CancelOrderRequest {
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub status: String,
    pub tracking_number: Option<String>,
    pub notes: Option<String>,
    pub cancel_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderListQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_per_page", alias = "limit")]
    pub per_page: i64,
    pub status: Option<String>,
    pub search: Option<String>,
}

impl OrderListQuery {
    pub fn page_query(&self) -> PageQuery {
        PageQuery {
            page: self.page,
            per_page: self.per_page,
        }
        .clamped()
    }

    pub fn filter(&self) -> OrderFilter {
        OrderFilter {
            status: self.status.clone(),
            search: self.search.clone(),
        }
    }
}

/// Buyer snapshot embedded in order responses.
#[derive(Debug, Serialize)]
pub struct OrderUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<User> for OrderUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetails {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderLine>,
    pub user: Option<OrderUser>,
    pub shipping_address: Option<Address>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderList {
    pub orders: Vec<Order>,
    pub current_page: i64,
    pub per_page: i64,
    pub total_pages: i64,
    pub total_items: i64,
}

impl OrderList {
    pub fn new(orders: Vec<Order>, info: PageInfo) -> Self {
        Self {
            orders,
            current_page: info.current_page,
            per_page: info.per_page,
            total_pages: info.total_pages,
            total_items: info.total_items,
        }
    }
}
