//! # ShaderPack
//!
//! Build-time helper that expands `#include` directives in GLSL shaders and hands the result to
//! an external shader compiler, producing either a single SPIR-V binary per shader or a packed
//! file holding one binary per target platform.
//!
//! The pipeline for one shader is:
//!
//! 1. [`IncludeResolver`] reads the shader and splices in every included file.
//! 2. [`CompileDispatcher`] writes the result to a scratch file and runs a [`CompileBackend`]
//!    once per target.
//! 3. The artifact lands in the output directory; the scratch file is deleted either way.

pub mod backend;
pub mod batch;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod header;
pub mod platform;
pub mod resolver;
pub mod stage;

pub use backend::{CompileBackend, CompileRequest, ExternalCompiler};
pub use batch::{BatchReport, FailurePolicy, compile_directory, find_shaders};
pub use config::{CompilerConfig, CompilerFlavor, CompilerVersion, Toolchain};
pub use dispatcher::{CompileDispatcher, OutputMode};
pub use error::{BackendError, ConfigError, IncludeError, PackError, ShaderError};
pub use header::{PackedShader, ShaderFileHeader};
pub use platform::{HostPlatform, TargetLanguage};
pub use resolver::{IncludeResolver, ResolvedShader, SeenIncludes};
pub use stage::ShaderStage;
