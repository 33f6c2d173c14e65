//! Core types and utilities for vigil.
//!
//! This crate provides the foundational pieces shared by the rest of the
//! vigil workspace:
//!
//! - **Identifiers**: the strongly-typed [`RunId`] naming a test run
//! - **Time**: the [`Clock`] abstraction used by operations that stamp
//!   wall-clock timestamps
//!
//! # Example
//!
//! ```
//! use vigil_core::{Clock, RunId, SystemClock};
//!
//! // Generate a fresh run identifier
//! let run_id = RunId::generate();
//!
//! // Parse one back from its string form
//! let parsed: RunId = run_id.to_string().parse().unwrap();
//! assert_eq!(parsed, run_id);
//!
//! // Sample the current time through the injectable clock
//! let now = SystemClock.now();
//! assert!(now.timestamp() > 0);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod clock;
pub mod ids;

pub use clock::{Clock, FixedClock, SystemClock};
pub use ids::{IdError, RunId};
