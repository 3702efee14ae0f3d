pub mod builder;
pub mod handler;

pub use builder::{Bound, ServerBuilder};
pub use handler::{RequestHandler, REQUEST_ID_HEADER};
