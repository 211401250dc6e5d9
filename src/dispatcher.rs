//! # Dispatcher Module
//!
//! Hands resolved shader source to a [`CompileBackend`] and places the result in an output
//! directory, either as one raw binary (`<name>.spv`) or as a packed multi-target artifact
//! (`<name>.shader`, see [`crate::header`]).
//!
//! The backend reads its input from a scratch copy of the resolved source. The scratch file
//! lives in a temporary directory that is removed when the compile returns, whether it
//! succeeded or not.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use log::info;
use tempfile::TempDir;

use crate::{
    backend::{CompileBackend, CompileRequest, ExternalCompiler},
    config::CompilerConfig,
    error::{BackendError, ShaderError},
    header::PackedShader,
    platform::{HostPlatform, TargetLanguage},
    resolver::IncludeResolver,
    stage::ShaderStage,
};

/// File suffix of packed artifacts.
pub const PACKED_SUFFIX: &str = "shader";

/// Shape of the artifact written for each shader.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputMode {
    /// One binary for the primary target.
    #[default]
    Single,
    /// Header plus one blob per configured target.
    Packed,
}

/// Compiles resolved shaders with a backend.
#[derive(Debug)]
pub struct CompileDispatcher<B = ExternalCompiler> {
    backend: B,
    targets: Vec<TargetLanguage>,
    resolver: IncludeResolver,
    scratch_dir: Option<PathBuf>,
}

impl CompileDispatcher<ExternalCompiler> {
    /// Dispatcher running the compiler configured for the host platform.
    ///
    /// # Errors
    ///
    /// - [`ShaderError::UnsupportedPlatform`]
    pub fn for_host(config: &CompilerConfig) -> Result<Self, ShaderError> {
        Ok(Self::for_platform(config, HostPlatform::current()?))
    }

    pub fn for_platform(config: &CompilerConfig, platform: HostPlatform) -> Self {
        let toolchain = config.toolchain(platform);
        Self::new(
            config,
            toolchain.targets.clone(),
            ExternalCompiler::from_toolchain(toolchain),
        )
    }
}

impl<B: CompileBackend> CompileDispatcher<B> {
    /// Dispatcher building `targets` with `backend`. The first target is the one
    /// [`compile`](Self::compile) emits; SPIR-V is used if `targets` is empty.
    pub fn new(config: &CompilerConfig, targets: Vec<TargetLanguage>, backend: B) -> Self {
        let targets = if targets.is_empty() {
            vec![TargetLanguage::SpirV]
        } else {
            targets
        };

        Self {
            backend,
            targets,
            resolver: config.resolver(),
            scratch_dir: config.scratch_dir.clone(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn targets(&self) -> &[TargetLanguage] {
        &self.targets
    }

    pub fn resolver(&self) -> &IncludeResolver {
        &self.resolver
    }

    /// Resolves, then compiles the shader at `path` into `output_dir`.
    ///
    /// The stage is checked before anything is read, and include errors abort before the
    /// backend runs, so a failing shader leaves nothing behind in `output_dir`.
    ///
    /// # Errors
    ///
    /// - [`ShaderError::UnknownStage`]
    /// - [`ShaderError::Include`]
    /// - Anything [`compile`](Self::compile) or [`compile_packed`](Self::compile_packed)
    ///   returns.
    pub fn compile_file(
        &self,
        path: &Path,
        output_dir: &Path,
        mode: OutputMode,
    ) -> Result<PathBuf, ShaderError> {
        let stage = ShaderStage::from_path(path).ok_or_else(|| ShaderError::UnknownStage {
            shader: path.display().to_string(),
        })?;

        let resolved = self.resolver.resolve_file(path)?;

        match mode {
            OutputMode::Single => self.compile(&resolved.source, stage, &resolved.name, output_dir),
            OutputMode::Packed => {
                self.compile_packed(&resolved.source, stage, &resolved.name, output_dir)
            }
        }
    }

    /// Compiles `resolved` for the primary target into `<output_dir>/<shader_name>.<suffix>`.
    ///
    /// # Errors
    ///
    /// - [`ShaderError::Io`] if the scratch file or output directory cannot be created.
    /// - [`ShaderError::Backend`]
    pub fn compile(
        &self,
        resolved: &str,
        stage: ShaderStage,
        shader_name: &str,
        output_dir: &Path,
    ) -> Result<PathBuf, ShaderError> {
        let (_scratch, input) = self.write_scratch(resolved, shader_name)?;
        create_output_dir(output_dir)?;

        let target = self.targets[0];
        let output = output_dir.join(format!("{shader_name}.{}", target.artifact_suffix()));

        self.backend.compile(&CompileRequest {
            input: &input,
            shader_name,
            stage,
            target,
            output: &output,
        })?;

        info!("Compiled [{shader_name}] to '{}'", output.display());
        Ok(output)
    }

    /// Compiles `resolved` once per configured target and writes every blob into
    /// `<output_dir>/<shader_name>.shader`.
    ///
    /// Nothing is written to `output_dir` unless every target compiled.
    ///
    /// # Errors
    ///
    /// - [`ShaderError::Io`]
    /// - [`ShaderError::Backend`], including [`BackendError::MissingArtifact`] for a target
    ///   that produced no output.
    pub fn compile_packed(
        &self,
        resolved: &str,
        stage: ShaderStage,
        shader_name: &str,
        output_dir: &Path,
    ) -> Result<PathBuf, ShaderError> {
        let (scratch, input) = self.write_scratch(resolved, shader_name)?;

        let mut packed = PackedShader::new();
        for &target in &self.targets {
            let artifact = scratch
                .path()
                .join(format!("{shader_name}.{}", target.artifact_suffix()));

            self.backend.compile(&CompileRequest {
                input: &input,
                shader_name,
                stage,
                target,
                output: &artifact,
            })?;

            let blob = fs::read(&artifact).map_err(|source| match source.kind() {
                io::ErrorKind::NotFound => BackendError::MissingArtifact {
                    shader: shader_name.to_string(),
                    target,
                    path: artifact.clone(),
                },
                _ => BackendError::Output {
                    path: artifact.clone(),
                    source,
                },
            })?;
            packed.insert(target, blob)?;
        }

        create_output_dir(output_dir)?;
        let output = output_dir.join(format!("{shader_name}.{PACKED_SUFFIX}"));
        fs::write(&output, packed.to_bytes()).map_err(|source| ShaderError::Io {
            path: output.clone(),
            source,
        })?;

        info!(
            "Packed [{shader_name}] ({} target(s)) to '{}'",
            self.targets.len(),
            output.display()
        );
        Ok(output)
    }

    /// Writes `source` to a fresh scratch directory as `<shader_name>`, minus any trailing
    /// `.glsl`, so compilers that infer the stage from the extension see `.vert`, `.frag`, etc.
    ///
    /// The returned [`TempDir`] owns the file; dropping it deletes both.
    fn write_scratch(
        &self,
        source: &str,
        shader_name: &str,
    ) -> Result<(TempDir, PathBuf), ShaderError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("shaderpack-");

        let dir = match &self.scratch_dir {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        }
        .map_err(|source| ShaderError::Io {
            path: self.scratch_dir.clone().unwrap_or_else(std::env::temp_dir),
            source,
        })?;

        let file_name = shader_name.strip_suffix(".glsl").unwrap_or(shader_name);
        let path = dir.path().join(file_name);
        fs::write(&path, source).map_err(|source| ShaderError::Io {
            path: path.clone(),
            source,
        })?;

        Ok((dir, path))
    }
}

fn create_output_dir(output_dir: &Path) -> Result<(), ShaderError> {
    fs::create_dir_all(output_dir).map_err(|source| ShaderError::Io {
        path: output_dir.to_path_buf(),
        source,
    })
}
