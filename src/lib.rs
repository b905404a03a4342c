//! epgen: parametric 3D package model and land pattern generator
//!
//! This library turns a package family tag plus a handful of dimensions into
//! a named, replayable solid construction history, and an IPC-style XML
//! package description into 2D pad, silkscreen and legend sketches.
//!
//! # Architecture
//!
//! The generator keeps two independent pipelines over one design document:
//!
//! - **Solid packages**: a dispatcher resolves the family tag to a builder;
//!   the builder registers persisted, expression-capable parameters and then
//!   either creates the full feature sequence or patches the one it built
//!   before. Structural changes (pin counts, shape switches) discard and
//!   rebuild.
//! - **Land patterns**: stateless XML-to-sketch drawing; every run fully
//!   replaces the previous footprint.
//!
//! Builds mutate the document in memory. Persisting a design and handing it
//! to an upload service is a separate, bounded-deadline export step.
//!
//! # Modules
//!
//! - [`config`] — Configuration loading and validation
//! - [`error`] — Error types
//! - [`model`] — The design document: components, sketches, features, parameters
//! - [`generator`] — Package dispatcher, builder framework and the family catalogue
//! - [`footprint`] — Land-pattern parsing and drawing
//! - [`export`] — Design snapshots and upload jobs

pub mod config;
pub mod error;
pub mod export;
pub mod footprint;
pub mod generator;
pub mod model;

pub use config::{load_config, Config};
pub use error::{ConfigError, GenerateError, GenerateResult};
pub use export::{Exporter, UploadState};
pub use footprint::FootprintGenerator;
pub use generator::{params::ParameterSet, PackageGenerator};
pub use model::{ComponentId, Design};
