//! Domain services.
//!
//! Each service owns a shared handle to the connection pool and an event
//! sender, both injected at construction.

pub mod catalog;
pub mod inventory;
pub mod sales;

pub use catalog::CatalogService;
pub use inventory::InventoryLedger;
pub use sales::SalesRecorder;
