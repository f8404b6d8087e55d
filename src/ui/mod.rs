//! Terminal UI: reducer, key bindings, worker runtime, and drawing.

pub mod app;
mod input;
pub mod render;
pub mod runtime;

pub use app::{App, Command, Msg};
pub use input::handle_key;
pub use render::render;
pub use runtime::{execute_load, Runtime};
