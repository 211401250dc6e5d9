//! Compiles every shader under a directory.

use std::{
    io,
    path::{Path, PathBuf},
};

use log::{info, warn};
use walkdir::WalkDir;

use crate::{
    backend::CompileBackend,
    dispatcher::{CompileDispatcher, OutputMode},
    error::ShaderError,
    stage::ShaderStage,
};

/// What to do when one shader in a batch fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Return the first error.
    #[default]
    Stop,
    /// Record the error and carry on with the next shader.
    KeepGoing,
}

/// Outcome of a batch run.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Artifacts written, in compile order.
    pub compiled: Vec<PathBuf>,
    /// Shaders that failed, with their errors. Only populated under
    /// [`FailurePolicy::KeepGoing`].
    pub failed: Vec<(PathBuf, ShaderError)>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Lists every file under `dir` with a shader stage suffix, sorted by path.
///
/// Plain includable sources such as `common.glsl` are skipped.
///
/// # Errors
///
/// - [`ShaderError::Io`] if the directory cannot be walked.
pub fn find_shaders(dir: &Path) -> Result<Vec<PathBuf>, ShaderError> {
    let mut shaders = Vec::new();

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|err| ShaderError::Io {
            path: err.path().unwrap_or(dir).to_path_buf(),
            source: io::Error::from(err),
        })?;

        if entry.file_type().is_file() && ShaderStage::from_path(entry.path()).is_some() {
            shaders.push(entry.into_path());
        }
    }

    Ok(shaders)
}

/// Compiles every shader under `shader_dir` into `output_dir`, mirroring subdirectories.
///
/// # Errors
///
/// - Whatever [`find_shaders`] returns.
/// - Under [`FailurePolicy::Stop`], the first shader's error.
pub fn compile_directory<B: CompileBackend>(
    dispatcher: &CompileDispatcher<B>,
    shader_dir: &Path,
    output_dir: &Path,
    mode: OutputMode,
    policy: FailurePolicy,
) -> Result<BatchReport, ShaderError> {
    let mut report = BatchReport::default();

    for shader in find_shaders(shader_dir)? {
        let target_dir = mirrored_dir(shader_dir, &shader, output_dir);

        match dispatcher.compile_file(&shader, &target_dir, mode) {
            Ok(artifact) => report.compiled.push(artifact),
            Err(err) => match policy {
                FailurePolicy::Stop => return Err(err),
                FailurePolicy::KeepGoing => {
                    warn!("Skipping '{}': {err}", shader.display());
                    report.failed.push((shader, err));
                }
            },
        }
    }

    info!(
        "Compiled {} shader(s) from '{}', {} failed",
        report.compiled.len(),
        shader_dir.display(),
        report.failed.len()
    );
    Ok(report)
}

/// `output_dir` joined with the directory of `shader` relative to `root`.
pub fn mirrored_dir(root: &Path, shader: &Path, output_dir: &Path) -> PathBuf {
    shader
        .parent()
        .and_then(|parent| parent.strip_prefix(root).ok())
        .map_or_else(|| output_dir.to_path_buf(), |rel| output_dir.join(rel))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mirrored_dir_keeps_subdirectories() {
        let out = mirrored_dir(
            Path::new("shaders"),
            Path::new("shaders/post/blur.comp"),
            Path::new("out"),
        );
        assert_eq!(out, Path::new("out/post"));

        let out = mirrored_dir(Path::new("shaders"), Path::new("shaders/a.vert"), Path::new("out"));
        assert_eq!(out, Path::new("out"));
    }
}
