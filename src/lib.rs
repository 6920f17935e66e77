#![warn(missing_docs, missing_debug_implementations)]

//! Check whether company names comply with registry naming rules and are
//! still available.
//!
//! This library normalizes a proposed name, evaluates it against the
//! registry's static naming rules (length, leading digit, prohibited terms,
//! legal suffix, punctuation), queries an external registry for identical or
//! overlapping registrations, and resolves the two into a single verdict. It
//! also generates alternative names and checks many names concurrently on a
//! bounded worker pool, keeping results in input order.
//!
//! Registry failures never surface as errors: they degrade the affected
//! result to "availability unknown", which is never reported as available.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use company_avail::check::Engine;
//! use company_avail::http::HttpRegistry;
//!
//! let registry = HttpRegistry::new("https://registry.example/api", Duration::from_secs(10));
//! let engine = Engine::with_registry(registry);
//! match engine.check_one("Acme Tech Private Limited") {
//!     Ok(result) if result.is_available => println!("Go ahead: {}", result.recommendation),
//!     Ok(result) => println!("{} ({}/100)", result.recommendation, result.validation.score),
//!     Err(e) => eprintln!("Error: {e}"),
//! }
//! ```

pub mod batch;
pub mod check;
pub mod config;
pub mod error;
pub mod http;
pub mod normalize;
pub mod registry;
pub mod report;
pub mod resolve;
pub mod suggest;
pub mod validation;

pub use check::{CheckResult, Engine, HealthReport};
pub use config::EngineConfig;
pub use error::{BatchError, CheckError, ConfigError, NameError, RegistryError};
pub use registry::{InMemoryRegistry, Registry, RegistryMatch, RegistryRecord};
pub use report::{BatchResult, BatchSummary};
pub use resolve::Recommendation;
pub use suggest::SuggestionSet;
pub use validation::ValidationResult;
