//! Core domain types and logic.

pub mod error;
pub mod variable;
pub mod optimization;
pub mod condition;
pub mod action;
pub mod risk;
pub mod strategy;
pub mod metrics;
pub mod stored_strategy;
pub mod config;
pub mod store;
