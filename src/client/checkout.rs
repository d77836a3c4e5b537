use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::json;
use thiserror::Error;
use tracing::{info, warn};

use crate::client::{cart::Cart, cart::CartItem, history::OrderHistory};
use crate::entities::order::Status;

/// Flat fee added to every order on top of the cart total.
pub const DELIVERY_FEE: f64 = 5.0;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Your cart is empty")]
    EmptyCart,
    #[error("Cart line for product {product_id} has no quantity")]
    EmptyLine { product_id: i32 },
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error {status} ({code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },
    #[error("Order {order_id} was created with {created} of {expected} items: {source}")]
    PartialCheckout {
        order_id: i32,
        created: usize,
        expected: usize,
        #[source]
        source: Box<ClientError>,
    },
    #[error("Session file error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteProduct {
    pub id: i32,
    pub name: String,
    pub price: f64,
    pub category: String,
    pub image: Option<String>,
    pub description: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteOrder {
    pub id: i32,
    pub user_id: i32,
    pub total: f64,
    pub status: Status,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteOrderItem {
    pub id: i32,
    pub order_id: i32,
    pub product_id: i32,
    pub quantity: i32,
    pub price: f64,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: String,
    #[serde(default)]
    code: Option<String>,
}

/// Talks to the storefront REST API the way the shop front end does.
#[derive(Clone, Debug)]
pub struct StorefrontClient {
    http: Client,
    base_url: String,
}

impl StorefrontClient {
    /// `base_url` is the server root, e.g. `http://127.0.0.1:3000`.
    pub fn new(base_url: impl Into<String>) -> Self {
        StorefrontClient {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_owned(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path)
    }

    pub async fn products(
        &self,
        category: Option<&str>,
        search: Option<&str>,
    ) -> Result<Vec<RemoteProduct>, ClientError> {
        let mut query: Vec<(&str, &str)> = Vec::new();
        if let Some(category) = category {
            query.push(("category", category));
        }
        if let Some(search) = search {
            query.push(("search", search));
        }
        let response = self
            .http
            .get(self.url("products"))
            .query(&query)
            .send()
            .await?;
        parse(response).await
    }

    pub async fn product(&self, id: i32) -> Result<RemoteProduct, ClientError> {
        let response = self
            .http
            .get(self.url("products"))
            .query(&[("id", id)])
            .send()
            .await?;
        parse(response).await
    }

    pub async fn create_order(&self, user_id: i32, total: f64) -> Result<RemoteOrder, ClientError> {
        let response = self
            .http
            .post(self.url("orders"))
            .json(&json!({
                "userId": user_id,
                "total": total,
                "status": Status::Pending,
            }))
            .send()
            .await?;
        parse(response).await
    }

    pub async fn create_order_item(
        &self,
        order_id: i32,
        item: &CartItem,
    ) -> Result<RemoteOrderItem, ClientError> {
        let response = self
            .http
            .post(self.url("order-items"))
            .json(&json!({
                "orderId": order_id,
                "productId": item.id,
                "quantity": item.quantity,
                "price": item.price,
            }))
            .send()
            .await?;
        parse(response).await
    }

    /// Records the cart as an order: the order row first, then one item row
    /// per line, one request at a time. Nothing is sent when a line has a
    /// zero quantity. On success the order is appended to `history` and the
    /// cart is emptied.
    ///
    /// The writes are not atomic. If an item fails, the order keeps the items
    /// created so far, nothing is rolled back, and the cart is left intact.
    pub async fn checkout(
        &self,
        user_id: i32,
        cart: &mut Cart,
        history: &mut OrderHistory,
    ) -> Result<RemoteOrder, ClientError> {
        if cart.is_empty() {
            return Err(ClientError::EmptyCart);
        }
        // Lines loaded from a session file are not checked by `Cart::add`.
        if let Some(line) = cart.items().iter().find(|line| line.quantity == 0) {
            return Err(ClientError::EmptyLine {
                product_id: line.id,
            });
        }

        let total = cart.total_price() + DELIVERY_FEE;
        let order = self.create_order(user_id, total).await?;

        let expected = cart.items().len();
        for (created, item) in cart.items().iter().enumerate() {
            if let Err(err) = self.create_order_item(order.id, item).await {
                warn!(order_id = order.id, created, expected, error = %err, "Checkout interrupted");
                return Err(ClientError::PartialCheckout {
                    order_id: order.id,
                    created,
                    expected,
                    source: Box::new(err),
                });
            }
        }

        history.add_order(cart.items().to_vec(), total);
        history.link_latest(order.id);
        cart.clear();

        info!(order_id = order.id, items = expected, total, "Order placed");
        Ok(order)
    }
}

async fn parse<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json::<T>().await?);
    }

    let text = response.text().await?;
    let (message, code) = match serde_json::from_str::<ErrorEnvelope>(&text) {
        Ok(envelope) => (envelope.error, envelope.code.unwrap_or_default()),
        Err(_) => (text, String::new()),
    };
    Err(ClientError::Api {
        status: status.as_u16(),
        code,
        message,
    })
}
