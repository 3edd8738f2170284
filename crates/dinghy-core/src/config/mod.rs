//! Configuration for dinghy
//!
//! A configuration file selects which rules run and at which severity.
//! When no explicit path is given, the loader walks up from the directory of
//! the analyzed file until it finds one of:
//!
//! - `.dinghyrc.json`
//! - `.dinghyrc.toml`
//! - `dinghy.json`
//!
//! ## Example
//!
//! ```json
//! {
//!   "rules": {
//!     "curlUseFlagF": "off",
//!     "aptGetInstallUseY": "error"
//!   },
//!   "only": ["aptGetInstallUseY", "aptGetInstallRmAptLists"]
//! }
//! ```

mod dinghy_config;
mod loader;

pub use dinghy_config::{DinghyConfig, RuleSeverity};
pub use loader::ConfigLoader;
