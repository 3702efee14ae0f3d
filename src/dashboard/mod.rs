//
// src/dashboard/mod.rs
//
mod error;
mod hub;
mod page;

pub use error::HubError;
pub use hub::Dashboard;
pub use page::{escape_html, render_detail, DashboardPage};
