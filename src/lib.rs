//! A deterministic Medicare claims repricing engine.
//!
//! Given a claim consisting of one or more line items, [`orchestrator::RepricingEngine`]
//! produces Medicare-equivalent allowed amounts using the Physician Fee
//! Schedule (RBRVS), the MS-DRG grouper, and the Inpatient Prospective
//! Payment System, against a directory of normalized CMS reference data
//! loaded once at construction.
//!
//! ```no_run
//! use medicare_repricer_rs::config::EngineConfig;
//! use medicare_repricer_rs::orchestrator::RepricingEngine;
//!
//! let config = EngineConfig::new("./reference-data");
//! let engine = RepricingEngine::new(&config)?;
//! # Ok::<(), medicare_repricer_rs::error::EngineError>(())
//! ```

pub mod config;
pub mod data_store;
pub mod error;
pub mod grouper;
pub mod ipps;
pub mod locality;
pub mod orchestrator;
pub mod pfs;
pub mod types;

pub use config::EngineConfig;
pub use data_store::DataStore;
pub use error::{EngineError, EngineResult};
pub use orchestrator::RepricingEngine;
