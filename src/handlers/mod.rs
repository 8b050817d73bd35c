// handlers/mod.rs - one module per route group mounted by app.rs
pub mod auth;
pub mod fallback;
pub mod health;
pub mod products;
pub mod upload;
