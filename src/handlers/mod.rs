pub mod categories;
pub mod common;
pub mod health;
pub mod inventory;
pub mod products;
pub mod sales;
