pub mod amount;
pub mod asset;
pub mod balances;
pub mod chain;
pub mod client;
pub mod config;
pub mod desk;
pub mod error;
pub mod exchange;
pub mod orchestrator;
pub mod route;
pub mod session;
