//! # Error Module
//!
//! Error types for every stage of turning a shader file into a compiled artifact. Each unit of
//! work (one shader) fails with a [`ShaderError`]; the more specific enums are wrapped into it.

use std::{io, path::PathBuf, process::ExitStatus};

use thiserror::Error;

use crate::platform::TargetLanguage;

/// Failures while expanding `#include` directives.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum IncludeError {
    /// A `#include` marker was not followed by a quoted path on the same line.
    #[error("Malformed #include on line {line} of shader [{shader}]!")]
    Malformed { shader: String, line: usize },

    /// The include target does not carry an includable-source extension.
    #[error("Could not include [{include}] in shader [{shader}]: not an includable source file!")]
    UnsupportedExtension { include: String, shader: String },

    /// The include target does not exist.
    #[error("Could not include [{include}] in shader [{shader}]: file does not exist!")]
    Missing { include: String, shader: String },

    /// The shader or one of its includes exists but could not be read.
    #[error("Could not read '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Failures reported by a compile backend.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum BackendError {
    /// The compiler executable could not be started at all.
    #[error("Could not launch shader compiler '{}': {source}", .program.display())]
    Launch {
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The compiler ran but reported failure.
    #[error("Shader compiler '{}' failed on [{shader}] with {status}", .program.display())]
    Failed {
        program: PathBuf,
        shader: String,
        status: ExitStatus,
    },

    /// The compiler exited without leaving the expected artifact behind.
    #[error("No {target} artifact was produced for [{shader}] (expected '{}')", .path.display())]
    MissingArtifact {
        shader: String,
        target: TargetLanguage,
        path: PathBuf,
    },

    /// The compiler cannot emit the requested target at all.
    #[error("Shader compiler '{}' cannot produce {target} output", .program.display())]
    UnsupportedTarget {
        program: PathBuf,
        target: TargetLanguage,
    },

    /// Moving or reading back the produced artifact failed.
    #[error("Could not access compiler output '{}': {source}", .path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Terminal failure for a single shader.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ShaderError {
    #[error(transparent)]
    Include(#[from] IncludeError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Pack(#[from] PackError),

    /// No compiler backend is known for the host operating system.
    #[error("Could not determine a shader compiler for operating system '{os}'!")]
    UnsupportedPlatform { os: String },

    /// The file name does not map to a known shader stage.
    #[error(
        "Cannot compile shader [{shader}] with unknown type! Use one of .vert, .frag, .comp, \
        .geom, .tesc or .tese"
    )]
    UnknownStage { shader: String },

    /// Scratch files, output directories or artifacts could not be written.
    #[error("I/O error on '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Failures while building or parsing a packed multi-target artifact.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum PackError {
    /// The same target was supplied twice.
    #[error("Target {0} was packed more than once")]
    DuplicateTarget(TargetLanguage),

    /// The file is shorter than the fixed header.
    #[error("Packed shader is {len} bytes, shorter than its {header} byte header")]
    Truncated { len: usize, header: usize },

    /// The header's declared sizes do not add up to the blob length.
    #[error("Packed shader header declares {declared} blob bytes but {actual} follow it")]
    SizeMismatch { declared: u64, actual: u64 },
}

/// Failures while loading a [`CompilerConfig`](crate::config::CompilerConfig).
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not read config '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Could not parse config '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
