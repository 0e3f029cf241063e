//! Derived health statistics over logged nutrition, hydration and activity data.
//!
//! The pure aggregation core lives in [`formulas`], [`trend`], [`distribution`],
//! [`goals`] and [`rollup`]. [`store`] is the persistence boundary and [`db`]
//! its Postgres implementation.

pub mod config;
pub mod db;
pub mod distribution;
pub mod error;
pub mod formulas;
pub mod goals;
pub mod logging;
pub mod models;
pub mod report;
pub mod rollup;
pub mod store;
pub mod trend;

#[cfg(test)]
mod test_support;

pub use error::{MetricsError, MetricsResult};
