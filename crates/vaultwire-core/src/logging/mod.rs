//! Logging abstractions for runtime-agnostic logging
//!
//! Secret values never pass through a logger; only descriptors do.

mod traits;
mod noop;
mod console;
mod memory;

pub use traits::{Logger, LogLevel, SharedLogger};
pub use noop::NoOpLogger;
pub use console::ConsoleLogger;
pub use memory::{MemoryLogger, LogRecord};
