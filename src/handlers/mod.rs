pub mod api;
pub mod poll_handlers;
