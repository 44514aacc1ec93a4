pub mod handlers;
pub mod indexing;
