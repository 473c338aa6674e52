//! Configuration file parsing (`kiln.toml`) and spec resolution.
//!
//! All convention defaulting happens here, once, at spec construction:
//! host platform detection, the `$CXX` compiler fallback chain, the
//! `$JAVA_HOME` launcher lookup, directory expansion for sources and
//! dependency jars. The resolved [`BuildSpec`] and [`PackagingSpec`]
//! are immutable values by the time assembly begins.

use crate::native::{BuildSpec, Platform};
use crate::package::{PackageType, PackagingSpec};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const NATIVE_OUTPUT_DIR: &str = "build/natives";
const PACKAGE_OUTPUT_DIR: &str = "build/jpackage";
const PACKAGE_WORK_DIR: &str = "build/tmp/jpackage";

#[derive(Deserialize, Debug, Default)]
pub struct KilnConfig {
    pub package: PackageConfig,
    pub native: Option<NativeConfig>,
    pub app: Option<AppConfig>,
}

#[derive(Deserialize, Debug, Default)]
pub struct PackageConfig {
    pub name: String,
    pub version: String,
}

/// `[native]` table: one shared library per build.
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case")]
pub struct NativeConfig {
    /// Library base name; defaults to the package name.
    pub library: Option<String>,
    #[serde(default = "default_std")]
    pub std: String,
    /// Files or directories; directories are walked for `.cpp` files in
    /// sorted order.
    #[serde(default)]
    pub sources: Vec<PathBuf>,
    #[serde(default)]
    pub include_dirs: Vec<PathBuf>,
    #[serde(default)]
    pub library_dirs: Vec<PathBuf>,
    #[serde(default)]
    pub libraries: Vec<String>,
    #[serde(default)]
    pub compiler_args: Vec<String>,
    #[serde(default)]
    pub linker_args: Vec<String>,
    /// Defaults to the host platform.
    pub platform: Option<Platform>,
    /// Compiler override; `$CXX`, then `clang++`, when absent.
    pub compiler: Option<String>,
}

fn default_std() -> String {
    "c++20".to_string()
}

/// `[app]` table: one packaged bundle per run.
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case")]
pub struct AppConfig {
    /// Application display name; defaults to the package name.
    pub name: Option<String>,
    /// Bundle version; defaults to the package version.
    pub version: Option<String>,
    #[serde(rename = "type", default)]
    pub package_type: PackageType,
    pub vendor: Option<String>,
    pub copyright: Option<String>,
    pub description: Option<String>,
    pub about_url: Option<String>,
    pub icon: Option<PathBuf>,
    pub license_file: Option<PathBuf>,
    #[serde(default)]
    pub app_content: Vec<PathBuf>,
    pub install_dir: Option<String>,
    #[serde(default)]
    pub launcher_as_service: bool,
    /// Application jar; defaults to the conventional project jar under
    /// `build/libs/` when that file exists.
    pub jar: Option<PathBuf>,
    /// Runtime dependency jars: files or directories walked for `.jar`
    /// files in sorted order.
    #[serde(default)]
    pub dependencies: Vec<PathBuf>,
    /// Explicit partition overrides; classified from `dependencies`
    /// when absent.
    pub module_path: Option<Vec<PathBuf>>,
    pub class_path: Option<Vec<PathBuf>>,
    pub main_module: Option<String>,
    pub main_class: Option<String>,
    /// Extra `--add-modules` entries.
    #[serde(default)]
    pub modules: Vec<String>,
    #[serde(default)]
    pub jvm_args: Vec<String>,
    #[serde(default)]
    pub system_properties: BTreeMap<String, String>,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub jlink_options: Vec<String>,
    pub runtime_image: Option<PathBuf>,
    /// Raw jpackage arguments appended verbatim.
    #[serde(default)]
    pub jpackage_args: Vec<String>,
    /// JDK to package with; `$JAVA_HOME` when absent.
    pub java_home: Option<PathBuf>,
}

// --- Helper: Load Config ---
pub fn load_config() -> Result<KilnConfig> {
    if !Path::new("kiln.toml").exists() {
        return Err(anyhow::anyhow!(
            "kiln.toml not found in current directory.\n\n\
            💡 Tip: Run 'kiln init' to create one."
        ));
    }
    let config_str = fs::read_to_string("kiln.toml")
        .context("Failed to read kiln.toml - check file permissions")?;
    let config = toml::from_str(&config_str)
        .context("Failed to parse kiln.toml - check for syntax errors (missing quotes, brackets)")?;
    Ok(config)
}

/// Resolves the `[native]` table into an immutable [`BuildSpec`].
pub fn resolve_native_spec(config: &KilnConfig) -> Result<BuildSpec> {
    let native = config
        .native
        .as_ref()
        .context("kiln.toml has no [native] table")?;

    let library_name = native
        .library
        .clone()
        .unwrap_or_else(|| config.package.name.clone());
    let compiler = native
        .compiler
        .clone()
        .or_else(|| env::var("CXX").ok())
        .unwrap_or_else(|| "clang++".to_string());

    Ok(BuildSpec {
        library_name,
        platform: native.platform.unwrap_or_else(Platform::host),
        language_standard: native.std.clone(),
        sources: collect_files(&native.sources, "cpp"),
        include_dirs: native.include_dirs.clone(),
        library_dirs: native.library_dirs.clone(),
        libraries: native.libraries.clone(),
        compiler_args: native.compiler_args.clone(),
        linker_args: native.linker_args.clone(),
        compiler: PathBuf::from(compiler),
        output_dir: PathBuf::from(NATIVE_OUTPUT_DIR),
    })
}

/// Resolves the `[app]` table into an immutable [`PackagingSpec`].
pub fn resolve_packaging_spec(config: &KilnConfig) -> Result<PackagingSpec> {
    let app = config.app.as_ref().context("kiln.toml has no [app] table")?;

    Ok(PackagingSpec {
        app_name: app
            .name
            .clone()
            .unwrap_or_else(|| config.package.name.clone()),
        version: app
            .version
            .clone()
            .unwrap_or_else(|| config.package.version.clone()),
        package_type: app.package_type,
        vendor: app.vendor.clone(),
        copyright: app.copyright.clone(),
        description: app.description.clone(),
        about_url: app.about_url.clone(),
        icon: app.icon.clone(),
        license_file: app.license_file.clone(),
        app_content: app.app_content.clone(),
        install_dir: app.install_dir.clone(),
        launcher_as_service: app.launcher_as_service,
        application_jar: app.jar.clone().or_else(|| default_application_jar(config)),
        runtime_artifacts: collect_files(&app.dependencies, "jar"),
        module_path: app.module_path.clone(),
        class_path: app.class_path.clone(),
        main_module: app.main_module.clone(),
        main_class: app.main_class.clone(),
        additional_modules: app.modules.clone(),
        jvm_args: app.jvm_args.clone(),
        system_properties: app.system_properties.clone(),
        application_args: app.args.clone(),
        jlink_options: app.jlink_options.clone(),
        runtime_image: app.runtime_image.clone(),
        extra_args: app.jpackage_args.clone(),
        java_launcher: resolve_java_launcher(app)?,
        output_dir: PathBuf::from(PACKAGE_OUTPUT_DIR),
        work_dir: PathBuf::from(PACKAGE_WORK_DIR),
    })
}

// Conventional project jar: build/libs/<name>-<version>.jar, only when
// it actually exists.
fn default_application_jar(config: &KilnConfig) -> Option<PathBuf> {
    let jar = Path::new("build/libs").join(format!(
        "{}-{}.jar",
        config.package.name, config.package.version
    ));
    jar.exists().then_some(jar)
}

fn resolve_java_launcher(app: &AppConfig) -> Result<PathBuf> {
    let home = app
        .java_home
        .clone()
        .or_else(|| env::var_os("JAVA_HOME").map(PathBuf::from))
        .context(
            "No Java runtime configured: set java-home in [app] or the JAVA_HOME environment variable",
        )?;
    let launcher = if cfg!(windows) { "java.exe" } else { "java" };
    Ok(home.join("bin").join(launcher))
}

// Expands a mixed file/directory list: directories are walked in sorted
// order for files with the given extension, plain entries pass through
// in declaration order.
fn collect_files(entries: &[PathBuf], extension: &str) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in entries {
        if entry.is_dir() {
            for found in WalkDir::new(entry)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
            {
                let path = found.path();
                if path.extension().is_some_and(|ext| ext == extension) {
                    files.push(path.to_path_buf());
                }
            }
        } else {
            files.push(entry.clone());
        }
    }
    files
}

/// Starter configuration written by `kiln init`.
pub const STARTER_CONFIG: &str = r#"[package]
name = "myapp"
version = "0.1.0"

[native]
library = "myapp"
std = "c++20"
sources = ["native"]

[app]
main-class = "com.example.Main"
jar = "build/libs/myapp-0.1.0.jar"
dependencies = ["build/libs/deps"]
type = "app-image"
"#;
