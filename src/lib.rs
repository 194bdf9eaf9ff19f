// Library exports for the apimaster supervisor

pub mod cli;
pub mod config;
pub mod discovery;
pub mod error;
pub mod logging;
pub mod logs;
pub mod pidfile;
pub mod process;
