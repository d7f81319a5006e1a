//! Business logic services

pub mod branch;
pub mod numbering;
pub mod product;
pub mod product_request;
pub mod sale;
pub mod stock;
pub mod transfer;

pub use branch::BranchService;
pub use product::ProductService;
pub use product_request::ProductRequestService;
pub use sale::SaleService;
pub use stock::StockService;
pub use transfer::TransferService;
