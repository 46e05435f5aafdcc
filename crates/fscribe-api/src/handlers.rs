//! API handlers.

pub mod health;
pub mod process;
pub mod uploads;

pub use health::{health, ready};
