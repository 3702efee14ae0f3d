// src/demo/mod.rs
mod prober;

pub use prober::{DemoOutcome, DemoProber};
