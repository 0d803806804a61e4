pub mod codec;
pub mod el;
pub mod error;
pub mod record;
pub mod service;
pub mod stage;

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
