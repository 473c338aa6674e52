//! # kiln - Native Library Builds & Application Packaging
//!
//! kiln drives two external build tools from one declarative `kiln.toml`:
//! a C++ compiler that turns JNI sources into a shared library, and the
//! JDK's `jpackage` that turns an application jar plus its runtime
//! dependencies into an installable bundle.
//!
//! ## Features
//!
//! - **Deterministic Command Lines**: identical config always yields a
//!   byte-identical tool invocation
//! - **Module Classification**: runtime jars are partitioned into module
//!   path and classpath by inspecting their embedded module descriptors
//! - **Clean Staging**: every packaging run starts from freshly
//!   recreated input, temp and output directories
//! - **Cross-Platform**: Linux, Windows, macOS library naming and path
//!   separators
//!
//! ## Quick Start
//!
//! ```bash
//! # Create a kiln.toml
//! kiln init
//!
//! # Build the shared library, then package the app
//! kiln native
//! kiln package
//! ```
//!
//! ## Module Organization
//!
//! - [`native`] - Shared-library builds with clang++
//! - [`package`] - Application packaging with jpackage
//! - [`config`] - Configuration parsing (`kiln.toml`)
//! - [`exec`] - Process execution and argument assembly
//! - [`staging`] - Scoped staging directories

/// Configuration file parsing (`kiln.toml`) and spec resolution.
pub mod config;

/// Process execution and argument-list assembly.
pub mod exec;

/// Native shared-library builds.
pub mod native;

/// Application packaging and runtime-jar classification.
pub mod package;

/// Staging directory lifecycle.
pub mod staging;
