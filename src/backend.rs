//! # Backend Module
//!
//! The [`CompileBackend`] trait is the seam between the dispatcher and whatever actually turns
//! GLSL into a binary. [`ExternalCompiler`] runs a compiler executable as a child process and
//! blocks until it exits.

use std::{
    fs,
    path::{Path, PathBuf},
    process::Command,
};

use log::debug;

use crate::{
    config::{CompilerFlavor, Toolchain},
    error::BackendError,
    platform::TargetLanguage,
    stage::ShaderStage,
};

/// One invocation of a compile backend.
#[derive(Debug, Clone, Copy)]
pub struct CompileRequest<'a> {
    /// Resolved source on disk.
    pub input: &'a Path,
    /// Name of the original shader, for diagnostics.
    pub shader_name: &'a str,
    pub stage: ShaderStage,
    pub target: TargetLanguage,
    /// Where the artifact must be left.
    pub output: &'a Path,
}

/// Something that compiles a single source file to a single binary target.
pub trait CompileBackend {
    /// Compiles `request.input` and leaves the artifact at `request.output`.
    ///
    /// # Errors
    ///
    /// Any [`BackendError`]; in particular [`BackendError::MissingArtifact`] when the compile
    /// appears to succeed but `request.output` was not written.
    fn compile(&self, request: &CompileRequest<'_>) -> Result<(), BackendError>;
}

impl<B: CompileBackend + ?Sized> CompileBackend for &B {
    fn compile(&self, request: &CompileRequest<'_>) -> Result<(), BackendError> {
        (**self).compile(request)
    }
}

impl<B: CompileBackend + ?Sized> CompileBackend for Box<B> {
    fn compile(&self, request: &CompileRequest<'_>) -> Result<(), BackendError> {
        (**self).compile(request)
    }
}

/// Runs a compiler executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalCompiler {
    program: PathBuf,
    flavor: CompilerFlavor,
}

impl ExternalCompiler {
    pub fn new(program: impl Into<PathBuf>, flavor: CompilerFlavor) -> Self {
        Self {
            program: program.into(),
            flavor,
        }
    }

    pub fn from_toolchain(toolchain: &Toolchain) -> Self {
        Self::new(toolchain.executable.clone(), toolchain.flavor)
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Runs `command` to completion and checks its exit status.
    fn run(&self, mut command: Command, shader_name: &str) -> Result<(), BackendError> {
        debug!("Running {command:?}");

        let status = command.status().map_err(|source| BackendError::Launch {
            program: self.program.clone(),
            source,
        })?;

        if !status.success() {
            return Err(BackendError::Failed {
                program: self.program.clone(),
                shader: shader_name.to_string(),
                status,
            });
        }

        Ok(())
    }

    fn compile_glslc(&self, request: &CompileRequest<'_>) -> Result<(), BackendError> {
        if request.target != TargetLanguage::SpirV {
            return Err(BackendError::UnsupportedTarget {
                program: self.program.clone(),
                target: request.target,
            });
        }

        let mut command = Command::new(&self.program);
        command.arg(request.input).arg("-o").arg(request.output);
        self.run(command, request.shader_name)?;

        if !request.output.is_file() {
            return Err(BackendError::MissingArtifact {
                shader: request.shader_name.to_string(),
                target: request.target,
                path: request.output.to_path_buf(),
            });
        }

        Ok(())
    }

    fn compile_shader_connect(&self, request: &CompileRequest<'_>) -> Result<(), BackendError> {
        // ShaderConnect picks its own file name, so it gets a private directory to write into.
        let work_dir = tempfile::Builder::new()
            .prefix("shaderpack-")
            .tempdir()
            .map_err(|source| BackendError::Output {
                path: std::env::temp_dir(),
                source,
            })?;

        let mut command = Command::new(&self.program);
        command
            .arg(request.input)
            .arg("glsl")
            .arg(request.stage.as_str())
            .arg(work_dir.path())
            .arg(request.target.as_str());
        self.run(command, request.shader_name)?;

        let produced = work_dir
            .path()
            .join(format!("shader.{}", request.target.artifact_suffix()));
        // `work_dir` is deleted on return; name the requested output instead.
        if !produced.is_file() {
            return Err(BackendError::MissingArtifact {
                shader: request.shader_name.to_string(),
                target: request.target,
                path: request.output.to_path_buf(),
            });
        }

        fs::copy(&produced, request.output).map_err(|source| BackendError::Output {
            path: request.output.to_path_buf(),
            source,
        })?;

        Ok(())
    }
}

impl CompileBackend for ExternalCompiler {
    fn compile(&self, request: &CompileRequest<'_>) -> Result<(), BackendError> {
        match self.flavor {
            CompilerFlavor::Glslc => self.compile_glslc(request),
            CompilerFlavor::ShaderConnect => self.compile_shader_connect(request),
        }
    }
}
