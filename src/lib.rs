/*
 * Responsibility
 * - crate の公開ポイント (binary と integration test から使う)
 */
pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod services;
pub mod state;

pub use app::{build_app, build_router};
