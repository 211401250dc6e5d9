//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::{
    cell::RefCell,
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use shaderpack::{BackendError, CompileBackend, CompileRequest, ShaderStage, TargetLanguage};
use tempfile::TempDir;

/// What the fake backend saw for one request.
#[derive(Debug, Clone)]
pub struct Seen {
    pub input: PathBuf,
    pub source: String,
    pub shader_name: String,
    pub stage: ShaderStage,
    pub target: TargetLanguage,
    pub output: PathBuf,
}

/// In-process backend that writes `size` bytes of `target.index() + 1` for each target.
#[derive(Debug, Default)]
pub struct FakeBackend {
    pub sizes: HashMap<TargetLanguage, usize>,
    /// Return success without writing anything for this target.
    pub skip_output: Option<TargetLanguage>,
    /// Refuse to compile shaders whose name contains this string.
    pub reject: Option<String>,
    pub seen: RefCell<Vec<Seen>>,
}

impl FakeBackend {
    pub fn with_sizes(sizes: &[(TargetLanguage, usize)]) -> Self {
        Self {
            sizes: sizes.iter().copied().collect(),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.seen.borrow().len()
    }
}

impl CompileBackend for FakeBackend {
    fn compile(&self, request: &CompileRequest<'_>) -> Result<(), BackendError> {
        let source = fs::read_to_string(request.input).expect("scratch input must exist");
        self.seen.borrow_mut().push(Seen {
            input: request.input.to_path_buf(),
            source,
            shader_name: request.shader_name.to_string(),
            stage: request.stage,
            target: request.target,
            output: request.output.to_path_buf(),
        });

        if let Some(reject) = &self.reject {
            if request.shader_name.contains(reject.as_str()) {
                return Err(BackendError::MissingArtifact {
                    shader: request.shader_name.to_string(),
                    target: request.target,
                    path: request.output.to_path_buf(),
                });
            }
        }

        if self.skip_output == Some(request.target) {
            return Ok(());
        }

        let size = self.sizes.get(&request.target).copied().unwrap_or(4);
        let fill = request.target.index() as u8 + 1;
        fs::write(request.output, vec![fill; size]).unwrap();
        Ok(())
    }
}

pub fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, contents).unwrap();
    path
}

pub fn dir_is_empty_or_missing(dir: &Path) -> bool {
    match fs::read_dir(dir) {
        Ok(mut entries) => entries.next().is_none(),
        Err(_) => true,
    }
}
