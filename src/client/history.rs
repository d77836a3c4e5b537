use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::client::cart::CartItem;

pub const LOCAL_ORDER_STATUS: &str = "Processing";

/// An order as remembered on the client, independent of the server copy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalOrder {
    pub id: String,
    /// Id of the server-side order row, when checkout created one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<i32>,
    pub items: Vec<CartItem>,
    pub total: f64,
    pub date: String,
    pub status: String,
}

/// Newest first.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderHistory {
    orders: Vec<LocalOrder>,
}

impl OrderHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn orders(&self) -> &[LocalOrder] {
        &self.orders
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn add_order(&mut self, items: Vec<CartItem>, total: f64) -> &LocalOrder {
        let now = Utc::now();
        self.orders.insert(
            0,
            LocalOrder {
                id: now.timestamp_millis().to_string(),
                order_id: None,
                items,
                total,
                date: now.format("%Y-%m-%d").to_string(),
                status: LOCAL_ORDER_STATUS.to_owned(),
            },
        );
        &self.orders[0]
    }

    pub(crate) fn link_latest(&mut self, order_id: i32) {
        if let Some(latest) = self.orders.first_mut() {
            latest.order_id = Some(order_id);
        }
    }
}
