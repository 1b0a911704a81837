//! Command handlers for inbox mutations

mod handler;

pub use handler::ActionHandler;
