//! Integration tests for native-library builds.
//!
//! The compiler command line is contractual, so these tests assert the
//! literal token sequence and the execution behavior seen through a
//! recording ProcessRunner.

use kiln::exec::{ProcessOutput, ProcessRunner, ToolError};
use kiln::native::{self, BuildSpec, Platform};
use std::cell::RefCell;
use std::path::{Path, PathBuf};

/// Replays a canned exit and records every invocation.
struct RecordingRunner {
    exit_code: i32,
    stderr: &'static str,
    calls: RefCell<Vec<(PathBuf, Vec<String>)>>,
}

impl RecordingRunner {
    fn with_exit(exit_code: i32, stderr: &'static str) -> Self {
        Self {
            exit_code,
            stderr,
            calls: RefCell::new(Vec::new()),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl ProcessRunner for RecordingRunner {
    fn run(&self, executable: &Path, args: &[String]) -> Result<ProcessOutput, ToolError> {
        self.calls
            .borrow_mut()
            .push((executable.to_path_buf(), args.to_vec()));
        Ok(ProcessOutput {
            exit_code: self.exit_code,
            stdout: String::new(),
            stderr: self.stderr.to_string(),
        })
    }
}

fn demo_spec(output_dir: &Path) -> BuildSpec {
    BuildSpec {
        library_name: "demo".to_string(),
        platform: Platform::Linux,
        language_standard: "c++20".to_string(),
        sources: vec![
            PathBuf::from("native/a.cpp"),
            PathBuf::from("native/b.cpp"),
        ],
        include_dirs: vec![PathBuf::from("native/include")],
        library_dirs: vec![PathBuf::from("/opt/jdk/lib")],
        libraries: vec!["jvm".to_string()],
        compiler_args: vec!["-fPIC".to_string()],
        linker_args: vec!["noexecstack".to_string()],
        compiler: PathBuf::from("clang++"),
        output_dir: output_dir.to_path_buf(),
    }
}

#[test]
fn test_command_line_token_order() {
    let spec = demo_spec(Path::new("build/natives"));
    let args = native::command_line(&spec);
    assert_eq!(
        args,
        vec![
            "-shared",
            "-x",
            "c++",
            "-O3",
            "-Wall",
            "-Wextra",
            "-obuild/natives/libdemo.so",
            "-std=c++20",
            "-Inative/include",
            "-L/opt/jdk/lib",
            "-ljvm",
            "-znoexecstack",
            "-fPIC",
            "native/a.cpp",
            "native/b.cpp",
        ]
    );
}

#[test]
fn test_sources_trail_in_input_order() {
    let mut spec = demo_spec(Path::new("build/natives"));
    spec.sources = vec![
        PathBuf::from("z.cpp"),
        PathBuf::from("ignored.h"),
        PathBuf::from("a.cpp"),
        PathBuf::from("m.cpp"),
    ];
    let args = native::command_line(&spec);

    // Exactly the .cpp files, in declaration order, as trailing tokens
    assert_eq!(&args[args.len() - 3..], &["z.cpp", "a.cpp", "m.cpp"]);
    assert_eq!(
        args.iter().filter(|t| t.ends_with(".cpp")).count(),
        3,
        "only native-family sources may appear"
    );

    // Exactly one output flag, bound to the platform-mapped name
    let outputs: Vec<&String> = args.iter().filter(|t| t.starts_with("-o")).collect();
    assert_eq!(outputs, ["-obuild/natives/libdemo.so"]);
}

#[test]
fn test_platform_mapped_output_names() {
    let mut spec = demo_spec(Path::new("out"));
    spec.platform = Platform::Windows;
    assert!(
        native::command_line(&spec)
            .iter()
            .any(|t| t.ends_with("demo.dll"))
    );
    spec.platform = Platform::MacOs;
    assert!(
        native::command_line(&spec)
            .iter()
            .any(|t| t.ends_with("libdemo.dylib"))
    );
}

#[test]
fn test_assembly_is_deterministic() {
    let spec = demo_spec(Path::new("build/natives"));
    assert_eq!(native::command_line(&spec), native::command_line(&spec));
}

#[test]
fn test_build_runs_compiler_once() {
    let out = tempfile::tempdir().unwrap();
    let spec = demo_spec(out.path());
    let runner = RecordingRunner::with_exit(0, "");

    let artifact = native::build(&spec, &runner).unwrap();

    assert_eq!(artifact, spec.output_file());
    assert_eq!(runner.call_count(), 1);
    let calls = runner.calls.borrow();
    assert_eq!(calls[0].0, PathBuf::from("clang++"));
    assert_eq!(calls[0].1, native::command_line(&spec));
}

#[test]
fn test_build_writes_compile_commands() {
    let out = tempfile::tempdir().unwrap();
    let spec = demo_spec(out.path());
    let runner = RecordingRunner::with_exit(0, "");

    native::build(&spec, &runner).unwrap();

    let json = std::fs::read_to_string(out.path().join("compile_commands.json")).unwrap();
    let entries: Vec<serde_json::Value> = serde_json::from_str(&json).unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["file"], "native/a.cpp");
}

#[test]
fn test_nonzero_exit_surfaces_invocation_error() {
    let out = tempfile::tempdir().unwrap();
    let spec = demo_spec(out.path());
    let runner = RecordingRunner::with_exit(1, "clang++: error");

    let err = native::build(&spec, &runner).unwrap_err();
    match err {
        ToolError::Invocation {
            exit_code, stderr, ..
        } => {
            assert_eq!(exit_code, 1);
            assert_eq!(stderr, "clang++: error");
        }
        other => panic!("expected Invocation error, got {:?}", other),
    }
    assert_eq!(runner.call_count(), 1, "no retry after a failed attempt");
}

#[test]
fn test_no_cpp_sources_fails_before_spawn() {
    let out = tempfile::tempdir().unwrap();
    let mut spec = demo_spec(out.path());
    spec.sources = vec![PathBuf::from("native/header.h")];
    let runner = RecordingRunner::with_exit(0, "");

    let err = native::build(&spec, &runner).unwrap_err();
    assert!(matches!(err, ToolError::Configuration(_)));
    assert_eq!(runner.call_count(), 0);
}

#[test]
fn test_empty_library_name_fails_before_spawn() {
    let out = tempfile::tempdir().unwrap();
    let mut spec = demo_spec(out.path());
    spec.library_name = String::new();
    let runner = RecordingRunner::with_exit(0, "");

    let err = native::build(&spec, &runner).unwrap_err();
    assert!(matches!(err, ToolError::Configuration(_)));
    assert_eq!(runner.call_count(), 0);
}
