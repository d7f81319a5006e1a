//! Domain models for the Branch Inventory Management System

mod branch;
mod document;
mod product;
mod product_request;
mod sale;
mod stock;
mod transfer;

pub use branch::*;
pub use document::*;
pub use product::*;
pub use product_request::*;
pub use sale::*;
pub use stock::*;
pub use transfer::*;
