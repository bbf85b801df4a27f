//! Handles Command Line Interface (CLI) related functionalities.
//!
//! Includes the interactive main menu, the show/add/delete operations it
//! dispatches to, and the console abstraction used for prompts and status output.

mod commands;
mod console;

pub use commands::*;
pub use console::*;
