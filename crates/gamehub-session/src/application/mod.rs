//! Application services for the Play Session context.

pub mod controller;
pub mod query_handlers;
