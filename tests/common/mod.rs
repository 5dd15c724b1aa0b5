//! Shared test infrastructure for integration tests.

use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

pub const HEADER: &str = "ID_Producto,Nombre_Producto,Cantidad,Precio_Unitario";

/// Temporary workspace plus a scratch directory for files to hand to `intake`.
pub struct Workspace {
    dir: TempDir,
}

/// Exit status and captured streams of one `rsmith` invocation.
pub struct Run {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl Run {
    fn from_output(output: Output) -> Self {
        Self {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }

    pub fn json(&self) -> Value {
        serde_json::from_str(&self.stdout)
            .unwrap_or_else(|err| panic!("stdout is not JSON ({err}):\n{}", self.stdout))
    }
}

impl Workspace {
    pub fn create() -> Self {
        let dir = TempDir::new().expect("create temp workspace");
        fs::create_dir_all(dir.path().join("uploads")).expect("create uploads dir");
        Self { dir }
    }

    pub fn root(&self) -> PathBuf {
        self.dir.path().join("ws")
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.root().join(rel)
    }

    /// Run `rsmith --workspace <root> <args>` with a clean environment.
    pub fn rsmith(&self, args: &[&str]) -> Run {
        let output = Command::new(env!("CARGO_BIN_EXE_rsmith"))
            .arg("--workspace")
            .arg(self.root())
            .args(args)
            .env_remove("RSMITH_WORKSPACE")
            .env_remove("RSMITH_PATTERN")
            .env_remove("RUST_LOG")
            .output()
            .expect("spawn rsmith");
        Run::from_output(output)
    }

    pub fn init_outbox(&self) {
        let run = self.rsmith(&[
            "init",
            "--sender",
            "reports@example.com",
            "--recipient",
            "boss@example.com",
            "--transport",
            "outbox",
        ]);
        assert_eq!(run.code, Some(0), "init failed: {}", run.stderr);
    }

    /// Write a file into the uploads scratch directory and return its path.
    pub fn upload(&self, name: &str, body: &str) -> PathBuf {
        let path = self.dir.path().join("uploads").join(name);
        fs::write(&path, body).expect("write upload");
        path
    }

    pub fn intake(&self, files: &[PathBuf]) -> Run {
        let mut args = vec!["intake".to_string()];
        args.extend(files.iter().map(|path| path.display().to_string()));
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        self.rsmith(&args)
    }
}

pub fn files_in(dir: &Path) -> Vec<PathBuf> {
    if !dir.is_dir() {
        return Vec::new();
    }
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .expect("read dir")
        .map(|entry| entry.expect("dir entry").path())
        .collect();
    files.sort();
    files
}
