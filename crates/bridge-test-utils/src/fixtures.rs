//! Deployment directory fixtures.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Shell used to run stub compilers.
pub const STUB_SHELL: &str = "/bin/sh";

/// A stub compiler: the program to run and its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StubCompiler {
    /// Program to execute.
    pub program: PathBuf,
    /// Arguments, the first being the script path.
    pub args: Vec<String>,
}

/// A temporary deployment directory.
///
/// Layout mirrors a real deployment: the deployment directory itself, a
/// `temp/` scratch root inside it, and optionally a compiler.
pub struct TestDeployment {
    root: TempDir,
}

impl TestDeployment {
    /// Creates an empty deployment with its scratch root in place.
    #[must_use]
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("create deployment dir");
        std::fs::create_dir(root.path().join("temp")).expect("create scratch dir");
        Self { root }
    }

    /// Returns the deployment directory.
    #[must_use]
    pub fn deploy_dir(&self) -> &Path {
        self.root.path()
    }

    /// Returns the scratch root.
    #[must_use]
    pub fn scratch_dir(&self) -> PathBuf {
        self.root.path().join("temp")
    }

    /// Returns the path where a real compiler binary would live.
    #[must_use]
    pub fn compiler_path(&self) -> PathBuf {
        self.root.path().join("compiler")
    }

    /// Writes `script` under the deployment and returns how to run it.
    #[must_use]
    pub fn install_stub(&self, script: &str) -> StubCompiler {
        let path = self.root.path().join("compiler.sh");
        std::fs::write(&path, script).expect("write stub compiler");
        StubCompiler {
            program: PathBuf::from(STUB_SHELL),
            args: vec![path.to_string_lossy().into_owned()],
        }
    }

    /// Places a non-executable file at [`compiler_path`](Self::compiler_path).
    ///
    /// Enough for presence checks; never run it.
    pub fn install_placeholder_compiler(&self) {
        std::fs::write(self.compiler_path(), b"placeholder").expect("write placeholder compiler");
    }

    /// Removes the placeholder compiler.
    pub fn remove_compiler(&self) {
        std::fs::remove_file(self.compiler_path()).expect("remove placeholder compiler");
    }

    /// Writes a file into the deployment directory.
    pub fn write_file(&self, name: &str, contents: &str) {
        std::fs::write(self.root.path().join(name), contents).expect("write deployment file");
    }
}

impl Default for TestDeployment {
    fn default() -> Self {
        Self::new()
    }
}
