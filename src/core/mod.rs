pub mod capability;
pub mod config;
pub mod error;
pub mod interceptor;
pub mod pending;
pub mod pool;
pub mod proxy;
