#![forbid(unsafe_code)]

//! Invoices validator: checks that a Dropbox invoice tree follows the naming
//! conventions and reports violations over email and SMS.
//!
//! The pipeline is walker → rule checker → aggregator → notifier dispatch:
//!
//! 1. **Walker** pages through the recursive listing of the configured root.
//! 2. **Rule checker** skips ignored entries and validates folder and file names.
//! 3. **Aggregator** collects every violation in discovery order.
//! 4. **Notifiers** format the violation list and deliver it per channel.
//!
//! # Library usage
//!
//! ```rust,no_run
//! use invoices_validator::prelude::*;
//!
//! # fn main() -> Result<()> {
//! let config = Config::load(None)?;
//! let client = DropboxClient::new(config.storage.access_token.clone())?;
//! let report = scan(&config, &client);
//! println!("{} violations", report.violations.len());
//! # Ok(())
//! # }
//! ```

pub mod prelude;

pub mod controller;
pub mod core;
pub mod notify;
pub mod scanner;
pub mod storage;
