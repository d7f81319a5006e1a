//! HTTP request handlers

pub mod branch;
pub mod health;
pub mod product;
pub mod product_request;
pub mod sale;
pub mod stock;
pub mod transfer;

pub use branch::*;
pub use health::*;
pub use product::*;
pub use product_request::*;
pub use sale::*;
pub use stock::*;
pub use transfer::*;
