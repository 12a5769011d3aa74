pub mod config;
pub mod datetime;
pub mod error;
pub mod model;
pub mod storage;
pub mod store;
pub mod view;
pub mod wire;
