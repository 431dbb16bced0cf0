//! # Built-in subscribers
//!
//! - [`LogWriter`]: renders pool events through `tracing`.

mod log;

pub use log::LogWriter;
