pub mod config;
pub mod error;
pub mod linking;
pub mod templates;

mod parse;

pub use config::Config;
pub use error::ConfigError;
pub use linking::LinkingConfig;
