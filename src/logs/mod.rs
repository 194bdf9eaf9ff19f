// Logs module - per-service output capture and rotation

mod capture;
mod writer;

pub use capture::capture_output;
pub use writer::{LogStream, ServiceLogWriter};
