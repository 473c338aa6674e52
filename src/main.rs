//! # kiln CLI Entry Point
//!
//! This is the main executable for the `kiln` command-line tool.
//! It parses CLI arguments using clap and routes commands to the appropriate handlers.
//!
//! ## Command Structure
//!
//! - **Build**: `native`, `package`, `clean`
//! - **Inspection**: `classify`
//! - **Project**: `init`, `completion`

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use colored::*;
use serde_json::json;
use std::fs;
use std::path::Path;

use kiln::config;
use kiln::exec::SystemRunner;
use kiln::native;
use kiln::package;

#[cfg(windows)]
#[link(name = "kernel32")]
unsafe extern "system" {
    fn SetConsoleOutputCP(wCodePageID: u32) -> i32;
    fn SetConsoleCP(wCodePageID: u32) -> i32;
}

#[cfg(windows)]
fn enable_windows_utf8_console() {
    unsafe {
        SetConsoleOutputCP(65001);
        SetConsoleCP(65001);
    }
}

#[cfg(not(windows))]
fn enable_windows_utf8_console() {}

#[derive(Parser)]
#[command(name = "kiln")]
#[command(about = "Native library builds and application packaging for JVM projects", version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile the configured sources into a shared library
    Native {
        /// Show the exact compiler command line without running it
        #[arg(long)]
        dry_run: bool,
        /// Show the assembled command line before running
        #[arg(short, long)]
        verbose: bool,
    },
    /// Package the application into an installable bundle
    Package {
        /// Show the exact jpackage command line without running it
        #[arg(long)]
        dry_run: bool,
        /// Show the assembled command line before running
        #[arg(short, long)]
        verbose: bool,
    },
    /// Show how the runtime jars split into module path and classpath
    Classify {
        /// Emit the partition as JSON
        #[arg(long)]
        json: bool,
    },
    /// Clean build artifacts
    Clean,
    /// Initialize a new kiln.toml in the current directory
    Init,
    /// Generate shell completion scripts
    Completion { shell: Shell },
}

fn main() -> Result<()> {
    enable_windows_utf8_console();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Native { dry_run, verbose } => run_native(*dry_run, *verbose),
        Commands::Package { dry_run, verbose } => run_package(*dry_run, *verbose),
        Commands::Classify { json } => run_classify(*json),
        Commands::Clean => clean(),
        Commands::Init => init(),
        Commands::Completion { shell } => {
            generate(*shell, &mut Cli::command(), "kiln", &mut std::io::stdout());
            Ok(())
        }
    }
}

fn run_native(dry_run: bool, verbose: bool) -> Result<()> {
    let config = config::load_config()?;
    let spec = config::resolve_native_spec(&config)?;

    println!(
        "{} Building {} for {:?}",
        "🔥".red(),
        spec.platform.library_file_name(&spec.library_name).bold(),
        spec.platform
    );

    if dry_run || verbose {
        let args = native::command_line(&spec);
        println!(
            "   {} {} {}",
            "→".cyan(),
            spec.compiler.display(),
            args.join(" ")
        );
    }
    if dry_run {
        println!("{} Dry run: nothing executed", "!".yellow());
        return Ok(());
    }

    let output = native::build(&spec, &SystemRunner)?;
    println!("   {}", output.display());
    Ok(())
}

fn run_package(dry_run: bool, verbose: bool) -> Result<()> {
    let config = config::load_config()?;
    let spec = config::resolve_packaging_spec(&config)?;

    if dry_run || verbose {
        spec.validate()?;
        let partition = spec.partition();
        let args = package::command_line(&spec, &partition)?;
        println!(
            "   {} {} {}",
            "→".cyan(),
            spec.jpackage_executable().display(),
            args.join(" ")
        );
    }
    if dry_run {
        println!("{} Dry run: nothing executed", "!".yellow());
        return Ok(());
    }

    let output = package::package(&spec, &SystemRunner)?;
    println!("   {}", output.display());
    Ok(())
}

fn run_classify(as_json: bool) -> Result<()> {
    let config = config::load_config()?;
    let spec = config::resolve_packaging_spec(&config)?;
    let partition = spec.partition();

    if as_json {
        let report = json!({
            "module-path": partition.module_path,
            "class-path": partition.class_path,
            "add-modules": partition.module_names,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "{} Module path ({} artifacts):",
        "🧩".blue(),
        partition.module_path.len()
    );
    for (path, name) in partition.module_path.iter().zip(&partition.module_names) {
        println!("   {} {} ({})", "+".green(), path.display(), name.cyan());
    }
    println!(
        "{} Classpath ({} artifacts):",
        "📚".blue(),
        partition.class_path.len()
    );
    for path in &partition.class_path {
        println!("   {} {}", "+".green(), path.display());
    }
    Ok(())
}

fn clean() -> Result<()> {
    use anyhow::Context;

    if Path::new("build").exists() {
        fs::remove_dir_all("build").context("Failed to remove build directory")?;
        println!("{} Build directory cleaned", "✓".green());
    } else {
        println!("{} Nothing to clean", "!".yellow());
    }
    Ok(())
}

fn init() -> Result<()> {
    if Path::new("kiln.toml").exists() {
        println!("{} kiln.toml already exists", "!".yellow());
        return Ok(());
    }
    fs::write("kiln.toml", config::STARTER_CONFIG)?;
    println!("{} Created {}", "✓".green(), "kiln.toml".cyan());
    Ok(())
}
