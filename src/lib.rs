//! # class-preload
//!
//! Finds every class below a package on a classpath made of exploded
//! directories and jar archives, and asks an injected loader to initialize
//! each one so registration side effects run at startup.
//!
//! ## Architecture
//!
//! - **names**: dotted package name / slash path conversions
//! - **resource**: scheme-tagged resource locations (`file:`, `jar:`)
//! - **classpath**: classpath roots and resolution of a package path to locations
//! - **loader**: the `ClassLoader` capability plus registry and catalog loaders
//! - **diagnostics**: structured failures, the diagnostics sink and scan reports
//! - **dir_walk**: stack-based walk of an exploded package directory
//! - **jar_walk**: entry walk of a package inside a jar/zip archive
//! - **enumerate**: the best-effort driver that never fails its caller
//! - **cli** / **config**: command line surface and its resolution rules

pub mod classpath;
pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod dir_walk;
pub mod enumerate;
pub mod jar_walk;
pub mod loader;
pub mod names;
pub mod resource;
