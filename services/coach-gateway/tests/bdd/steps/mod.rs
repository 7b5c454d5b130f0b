//! BDD step definitions for the coach gateway

pub mod backend_steps;
pub mod cache_steps;
pub mod connectivity_steps;
pub mod dispatch_steps;
pub mod error_steps;
