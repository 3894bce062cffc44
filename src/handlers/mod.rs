//! HTTP handlers for the Dentstock backend

pub mod health;
pub mod inventory;
pub mod stock_movements;

pub use health::*;
pub use inventory::*;
pub use stock_movements::*;
