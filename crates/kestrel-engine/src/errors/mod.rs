//! Engine error reporting.
//!
//! Errors raised while components initialize (window, GPU, textures, fonts,
//! game setup) are recorded with a category code and shown together later.
//! The runtime owns one [`ErrorLog`] and lends it to the application through
//! the frame context.

mod code;
mod report;

pub use code::ErrorCode;
pub use report::{ErrorLog, ReportedError};
