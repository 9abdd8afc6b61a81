pub mod config;
pub mod types;

pub use config::CourtqConfig;
pub use types::*;
