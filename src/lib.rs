// ============================================================================
// Linting
// ============================================================================

#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![warn(missing_docs)]                // Public items should be documented
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::panic)]
#![warn(clippy::print_stdout)]
#![warn(clippy::todo)]
#![warn(clippy::unimplemented)]
#![warn(clippy::unwrap_in_result)]
#![warn(clippy::redundant_clone)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

// ============================================================================
// Crate Documentation
// ============================================================================

//! # appspec codec
//!
//! A bidirectional codec between declarative application configuration
//! trees and the strongly-typed deployment specification of an app
//! platform.
//!
//! ## Overview
//!
//! Operators describe an application as a tree of named fields: services,
//! static sites, workers, jobs and functions, each with a source, env vars,
//! health checks, autoscaling, alerts, log destinations and termination
//! policies. This crate:
//!
//! - Encodes such a tree into an [`AppSpec`], failing with a path-qualified
//!   [`EncodeError`] on invalid input
//! - Decodes an [`AppSpec`] back into a tree, suitable for drift detection
//! - Treats unordered collections as sets, so reordering never produces a
//!   different spec or fingerprint
//!
//! ## Modules
//!
//! - [`config`]: Configuration trees, parsing, schema and validation
//! - [`spec`]: The typed deployment specification
//! - [`codec`]: Encoder, decoder and canonical fingerprints
//! - [`diff`]: Drift report between two specs
//! - [`cli`]: Command-line interface
//!
//! ## Example
//!
//! ```yaml
//! name: shop
//! region: ams
//! service:
//!   - name: web
//!     github:
//!       - repo: acme/web
//!         branch: main
//!     http_port: 8080
//!     termination:
//!       - grace_period_seconds: 30
//!         drain_seconds: 15
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod cli;
pub mod codec;
pub mod config;
pub mod diff;
pub mod error;
pub mod spec;

// ============================================================================
// Re-exports
// ============================================================================

pub use cli::{Cli, Commands, OutputFormatter};
pub use codec::{DecodeContext, Decoder, Encoder, SpecHasher};
pub use config::{ConfigMap, ConfigParser, ConfigValidator, ConfigValue, ExclusivePolicy};
pub use diff::{DiffEngine, DiffResult};
pub use error::{AppSpecError, EncodeError, Result};
pub use spec::{AppSpec, Component, ComponentKind};
