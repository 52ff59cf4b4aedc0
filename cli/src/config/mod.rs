//! Configuration management for the sca CLI
//!
//! - `schema` - Configuration data structures
//! - `io` - Reading and writing config files
//! - `paths` - Directory path management
//!
//! ```rust
//! use sca_cli::config;
//!
//! # fn example() -> anyhow::Result<()> {
//! // Load config (returns default if file doesn't exist)
//! let config = config::load_config()?;
//! let options = config.build_options();
//! # Ok(())
//! # }
//! ```

pub mod io;
pub mod paths;
pub mod schema;

pub use io::{init_config, load_config, load_config_from, save_config_to};
pub use paths::{CONFIG_ENV, get_config_path, get_log_dir, get_sca_dir};
pub use schema::ScaConfig;
