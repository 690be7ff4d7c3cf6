//! Configuration, paths, logging bootstrap and small filesystem/XML helpers
//! shared by the customs relay crates.

mod config;
mod error;
pub mod fs;
mod logging;
mod paths;
pub mod xml_json;

pub use config::{Config, Validation, DEFAULT_DATA_PATH, DEFAULT_URL};
pub use error::{CoreError, CoreResult};
pub use logging::{init_logging, parse_level};
pub use paths::Paths;
pub use xml_json::xml_to_json;
