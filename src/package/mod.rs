//! Application packaging with the JDK's `jpackage` tool.
//!
//! Turns a fully-resolved [`PackagingSpec`] and its runtime dependency
//! partition into one `jpackage` invocation that produces an installable
//! bundle. Staging is not incremental: every run starts from freshly
//! recreated input, temp and output directories.

pub mod modules;

use crate::exec::{self, ArgList, ProcessRunner, ToolError};
use crate::staging;
use colored::*;
use modules::Classification;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Bundle format produced by jpackage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PackageType {
    #[default]
    AppImage,
    Exe,
    Msi,
    Rpm,
    Deb,
    Pkg,
    Dmg,
}

impl PackageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PackageType::AppImage => "app-image",
            PackageType::Exe => "exe",
            PackageType::Msi => "msi",
            PackageType::Rpm => "rpm",
            PackageType::Deb => "deb",
            PackageType::Pkg => "pkg",
            PackageType::Dmg => "dmg",
        }
    }
}

/// Fully-resolved inputs for one packaging run.
///
/// Assembled once from `kiln.toml` plus environment by
/// [`crate::config::resolve_packaging_spec`]; consumed exactly once by
/// [`package`] and never mutated.
#[derive(Debug, Clone)]
pub struct PackagingSpec {
    pub app_name: String,
    pub version: String,
    pub package_type: PackageType,
    pub vendor: Option<String>,
    pub copyright: Option<String>,
    pub description: Option<String>,
    pub about_url: Option<String>,
    pub icon: Option<PathBuf>,
    pub license_file: Option<PathBuf>,
    pub app_content: Vec<PathBuf>,
    pub install_dir: Option<String>,
    pub launcher_as_service: bool,
    pub application_jar: Option<PathBuf>,
    /// Runtime dependency jars, classified on each run unless an
    /// explicit partition is configured.
    pub runtime_artifacts: Vec<PathBuf>,
    pub module_path: Option<Vec<PathBuf>>,
    pub class_path: Option<Vec<PathBuf>>,
    /// Wins over the main-jar launch target when present.
    pub main_module: Option<String>,
    pub main_class: Option<String>,
    pub additional_modules: Vec<String>,
    pub jvm_args: Vec<String>,
    /// Sorted so assembly stays byte-deterministic; declaration order of
    /// system properties is irrelevant.
    pub system_properties: BTreeMap<String, String>,
    pub application_args: Vec<String>,
    pub jlink_options: Vec<String>,
    pub runtime_image: Option<PathBuf>,
    pub extra_args: Vec<String>,
    /// Resolved `java` launcher of the active runtime; jpackage is its
    /// sibling binary and is not independently configurable.
    pub java_launcher: PathBuf,
    pub output_dir: PathBuf,
    pub work_dir: PathBuf,
}

impl PackagingSpec {
    pub fn input_dir(&self) -> PathBuf {
        self.work_dir.join("input")
    }

    pub fn temp_dir(&self) -> PathBuf {
        self.work_dir.join("temp")
    }

    pub fn jpackage_executable(&self) -> PathBuf {
        let name = if cfg!(windows) { "jpackage.exe" } else { "jpackage" };
        self.java_launcher.with_file_name(name)
    }

    /// Checks that a launch target resolves, before any staging or
    /// process spawn.
    pub fn validate(&self) -> Result<(), ToolError> {
        if self.main_class.as_deref().unwrap_or("").is_empty() {
            return Err(ToolError::Configuration(
                "main-class is required".to_string(),
            ));
        }
        if self.main_module.is_none() && self.application_jar.is_none() {
            return Err(ToolError::Configuration(
                "no launch target: set main-module or an application jar".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolves the module-path/classpath partition: the configured
    /// explicit sets when present, otherwise computed by classifying the
    /// runtime artifacts.
    pub fn partition(&self) -> Classification {
        if self.module_path.is_none() && self.class_path.is_none() {
            return modules::classify(&self.runtime_artifacts);
        }
        let computed = modules::classify(&self.runtime_artifacts);
        let module_path = self.module_path.clone().unwrap_or(computed.module_path);
        let class_path = self.class_path.clone().unwrap_or(computed.class_path);
        let module_names = modules::module_names_of(&module_path);
        Classification {
            module_path,
            class_path,
            module_names,
        }
    }
}

fn join_module_path(paths: &[PathBuf]) -> String {
    let sep = if cfg!(windows) { ";" } else { ":" };
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(sep)
}

/// Assembles the jpackage command line for `spec`.
///
/// Token order is contractual and matches the tool's expectations
/// exactly; `--type` always comes last. `--module-path` and
/// `--add-modules` are emitted even when empty.
pub fn command_line(
    spec: &PackagingSpec,
    partition: &Classification,
) -> Result<Vec<String>, ToolError> {
    let mut args = ArgList::new();

    args.flag("--temp", spec.temp_dir().display().to_string());
    args.flag("--dest", spec.output_dir.display().to_string());
    args.flag("--input", spec.input_dir().display().to_string());

    args.flag("--module-path", join_module_path(&partition.module_path));

    let mut add_modules: Vec<String> = partition.module_names.clone();
    add_modules.extend(spec.additional_modules.iter().cloned());
    args.flag("--add-modules", add_modules.join(","));

    let main_class = spec
        .main_class
        .as_deref()
        .ok_or_else(|| ToolError::Configuration("main-class is required".to_string()))?;
    match &spec.main_module {
        Some(module) => args.flag("--module", format!("{}/{}", module, main_class)),
        None => {
            let jar = spec.application_jar.as_ref().ok_or_else(|| {
                ToolError::Configuration(
                    "no launch target: set main-module or an application jar".to_string(),
                )
            })?;
            let jar_name = jar
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| jar.display().to_string());
            args.flag("--main-jar", jar_name);
            args.flag("--main-class", main_class);
        }
    }

    for opt in &spec.jlink_options {
        args.flag("--jlink-options", opt.as_str());
    }
    for arg in &spec.jvm_args {
        args.flag("--java-options", arg.as_str());
    }
    for (key, value) in &spec.system_properties {
        args.flag("--java-options", format!("-D{}={}", key, value));
    }
    for arg in &spec.application_args {
        args.flag("--arguments", arg.as_str());
    }

    args.flag("--name", spec.app_name.as_str());

    if let Some(vendor) = &spec.vendor {
        args.flag("--vendor", vendor.as_str());
    }
    if let Some(copyright) = &spec.copyright {
        args.flag("--copyright", copyright.as_str());
    }
    if let Some(description) = &spec.description {
        args.flag("--description", description.as_str());
    }
    if let Some(url) = &spec.about_url {
        args.flag("--about-url", url.as_str());
    }
    if let Some(icon) = &spec.icon {
        args.flag("--icon", icon.display().to_string());
    }
    if let Some(license) = &spec.license_file {
        args.flag("--license-file", license.display().to_string());
    }

    if !spec.app_content.is_empty() {
        let joined = spec
            .app_content
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(",");
        args.flag("--app-content", joined);
    }

    if let Some(dir) = &spec.install_dir {
        args.flag("--install-dir", dir.as_str());
    }
    if spec.launcher_as_service {
        args.push("--launcher-as-service");
    }

    args.push_all(spec.extra_args.iter().cloned());

    if let Some(image) = &spec.runtime_image {
        args.flag("--runtime-image", image.display().to_string());
    }

    args.flag("--app-version", spec.version.as_str());
    args.flag("--type", spec.package_type.as_str());

    Ok(args.into_vec())
}

/// Stages inputs, runs jpackage once and returns the output directory.
///
/// Classpath artifacts are copied into the staging input directory;
/// module-path artifacts are referenced in place. A non-zero exit
/// surfaces as [`ToolError::Invocation`] with the captured output; no
/// partial-output cleanup is attempted.
pub fn package(spec: &PackagingSpec, runner: &dyn ProcessRunner) -> Result<PathBuf, ToolError> {
    spec.validate()?;

    let partition = spec.partition();
    let input_dir = spec.input_dir();

    staging::recreate_dir(&input_dir)?;
    staging::recreate_dir(&spec.temp_dir())?;
    staging::recreate_dir(&spec.output_dir)?;
    staging::copy_into(&partition.class_path, &input_dir)?;

    let args = command_line(spec, &partition)?;
    println!(
        "   {} Packaging {} ({})",
        "📦".blue(),
        spec.app_name.bold(),
        spec.package_type.as_str()
    );
    exec::run_tool(runner, "jpackage", &spec.jpackage_executable(), &args)?;

    println!("{} Bundle ready: {}", "✓".green(), spec.output_dir.display());
    Ok(spec.output_dir.clone())
}
