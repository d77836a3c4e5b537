//! Client side of the shop: the cart and order history a shopper keeps
//! locally, and the HTTP client that turns a cart into an order.

pub mod cart;
pub mod checkout;
pub mod history;
pub mod store;

pub use cart::{Cart, CartItem};
pub use checkout::{ClientError, StorefrontClient, DELIVERY_FEE};
pub use history::{LocalOrder, OrderHistory};
pub use store::{Session, SessionStore};
