pub mod application;
pub mod interview;
pub mod job;
pub mod user;
