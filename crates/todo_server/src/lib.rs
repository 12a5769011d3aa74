//! HTTP transport for the todo store.
//!
//! Exposes list/create/update/delete over `/api/todos` with an axum router
//! that holds a shared [`todo_core::store::TaskStore`].

pub mod args;
pub mod error;
pub mod routes;
pub mod server;

pub use routes::{SharedStore, create_router};
pub use server::{serve, start_server};
