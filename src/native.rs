//! Native shared-library builds.
//!
//! Turns a fully-resolved [`BuildSpec`] into a single `clang++`
//! invocation that produces one shared library. The command line is
//! assembled in a fixed, contractual order; see [`command_line`].

use crate::exec::{self, ArgList, ProcessRunner, ToolError};
use colored::*;
use serde::Deserialize;
use serde_json::json;
use std::fs;
use std::path::PathBuf;

/// Target platform for the produced shared library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Linux,
    Windows,
    #[serde(rename = "macos")]
    MacOs,
}

impl Platform {
    /// Detects the platform of the host OS.
    pub fn host() -> Self {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else {
            Platform::Linux
        }
    }

    /// Maps a library name to the platform's shared-library file name,
    /// mirroring the JVM's `System.mapLibraryName` convention.
    pub fn library_file_name(&self, name: &str) -> String {
        match self {
            Platform::Linux => format!("lib{}.so", name),
            Platform::Windows => format!("{}.dll", name),
            Platform::MacOs => format!("lib{}.dylib", name),
        }
    }
}

/// Fully-resolved inputs for one shared-library build.
///
/// Assembled once from `kiln.toml` plus environment by
/// [`crate::config::resolve_native_spec`] and never mutated afterwards.
/// The output path is derived from the library name and platform, never
/// user-set.
#[derive(Debug, Clone)]
pub struct BuildSpec {
    pub library_name: String,
    pub platform: Platform,
    pub language_standard: String,
    /// Source files in declaration order. Only `.cpp` files are passed
    /// to the compiler.
    pub sources: Vec<PathBuf>,
    pub include_dirs: Vec<PathBuf>,
    pub library_dirs: Vec<PathBuf>,
    pub libraries: Vec<String>,
    pub compiler_args: Vec<String>,
    pub linker_args: Vec<String>,
    /// Resolved compiler executable: config override, else `$CXX`, else
    /// `clang++`.
    pub compiler: PathBuf,
    pub output_dir: PathBuf,
}

impl BuildSpec {
    /// `<output_dir>/<platform-mapped library file name>`.
    pub fn output_file(&self) -> PathBuf {
        self.output_dir
            .join(self.platform.library_file_name(&self.library_name))
    }
}

fn cpp_sources(sources: &[PathBuf]) -> Vec<&PathBuf> {
    sources
        .iter()
        .filter(|p| p.extension().is_some_and(|ext| ext == "cpp"))
        .collect()
}

/// Assembles the compiler command line for `spec`.
///
/// Token order is contractual:
/// fixed flags, fused `-o` output, `-std=`, `-I` dirs, `-L` dirs, `-l`
/// libraries, `-z` linker options, raw compiler arguments, then every
/// `.cpp` source in input order. Re-running on an identical spec yields
/// a byte-identical list.
pub fn command_line(spec: &BuildSpec) -> Vec<String> {
    let mut args = ArgList::new();
    args.push_all(["-shared", "-x", "c++", "-O3", "-Wall", "-Wextra"]);
    args.push(format!("-o{}", spec.output_file().display()));
    args.push(format!("-std={}", spec.language_standard));
    for dir in &spec.include_dirs {
        args.push(format!("-I{}", dir.display()));
    }
    for dir in &spec.library_dirs {
        args.push(format!("-L{}", dir.display()));
    }
    for lib in &spec.libraries {
        args.push(format!("-l{}", lib));
    }
    for opt in &spec.linker_args {
        args.push(format!("-z{}", opt));
    }
    args.push_all(spec.compiler_args.iter().cloned());
    for src in cpp_sources(&spec.sources) {
        args.push(src.display().to_string());
    }
    args.into_vec()
}

/// Builds the shared library and returns its path.
///
/// One compiler process, one attempt. A non-zero exit surfaces as
/// [`ToolError::Invocation`] with the captured output; whatever partial
/// output the compiler left behind is not cleaned up, and the caller
/// must treat the build as failed.
pub fn build(spec: &BuildSpec, runner: &dyn ProcessRunner) -> Result<PathBuf, ToolError> {
    if spec.library_name.is_empty() {
        return Err(ToolError::Configuration(
            "library name must not be empty".to_string(),
        ));
    }
    if cpp_sources(&spec.sources).is_empty() {
        return Err(ToolError::Configuration(
            "no .cpp source files to compile".to_string(),
        ));
    }

    fs::create_dir_all(&spec.output_dir)?;

    let output_file = spec.output_file();
    let args = command_line(spec);
    let tool = spec
        .compiler
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| spec.compiler.display().to_string());

    println!(
        "   {} Compiling {}",
        "⚙".blue(),
        output_file.display().to_string().bold()
    );
    exec::run_tool(runner, &tool, &spec.compiler, &args)?;

    write_compile_commands(spec, &args)?;

    println!("{} Native library ready", "✓".green());
    Ok(output_file)
}

// One entry per compiled source, all sharing the single link command.
fn write_compile_commands(spec: &BuildSpec, args: &[String]) -> Result<(), ToolError> {
    let directory = std::env::current_dir()?;
    let command = format!("{} {}", spec.compiler.display(), args.join(" "));
    let entries: Vec<serde_json::Value> = cpp_sources(&spec.sources)
        .iter()
        .map(|src| {
            json!({
                "directory": directory.to_string_lossy(),
                "command": command,
                "file": src.to_string_lossy(),
            })
        })
        .collect();
    let json_str = serde_json::to_string_pretty(&entries).map_err(std::io::Error::other)?;
    fs::write(spec.output_dir.join("compile_commands.json"), json_str)?;
    Ok(())
}
