// src/lib.rs
pub mod config;
pub mod dashboard;
pub mod demo;
pub mod health;
pub mod metrics;
pub mod server;
