pub mod ambient;
pub mod backend;
pub mod builder;
pub mod config;
pub mod context;
pub mod env;
pub mod exception;
pub mod file_sink;
pub mod flatten;
pub mod init;
pub mod lumberjack;
pub mod noop_sink;
pub mod record;
pub mod router;
pub mod sink;
pub mod template;

#[cfg(feature = "collector")]
pub mod collector;

pub use lumberjack::LumberJack;
