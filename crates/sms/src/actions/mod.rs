//! Message store mutations
//!
//! Mark-as-read and delete, for single messages and whole threads.

mod handler;

pub use handler::ActionHandler;
