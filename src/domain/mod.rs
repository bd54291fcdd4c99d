//! Core domain types and decision logic.

pub mod config_validation;
pub mod cycle;
pub mod decision;
pub mod error;
pub mod indicator;
pub mod order;
pub mod position;
pub mod price_series;
pub mod screening;
pub mod strategy;
pub mod symbol;
pub mod trade;
pub mod universe;
