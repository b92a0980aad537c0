//! Port traits the domain depends on; adapters provide the implementations.

pub mod storage_port;
pub mod clock_port;
pub mod config_port;
pub mod backtest_port;
pub mod codegen_port;
