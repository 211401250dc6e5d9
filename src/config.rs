//! # Config Module
//!
//! [`CompilerConfig`] describes which compiler executable to run on each host platform, how to
//! call it, and which binary targets to build. It is handed to the
//! [`CompileDispatcher`](crate::dispatcher::CompileDispatcher) explicitly; nothing in the crate
//! reads global paths.
//!
//! A config can be loaded from JSON. Every field is optional:
//!
//! ```json
//! {
//!     "linux": { "executable": "tools/glslc" },
//!     "macos": {
//!         "executable": "tools/ShaderConnect-1.2.0",
//!         "flavor": "shader-connect",
//!         "targets": ["spir-v", "macos-metallib"]
//!     },
//!     "includable_extensions": ["glsl", "h"]
//! }
//! ```

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::{
    error::ConfigError,
    platform::{HostPlatform, TargetLanguage},
    resolver::{DEFAULT_INCLUDABLE_EXTENSIONS, IncludeResolver},
};

/// Command-line convention of a compiler executable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompilerFlavor {
    /// `glslc <input> -o <output>`; SPIR-V only, stage taken from the input's extension.
    #[default]
    Glslc,
    /// `ShaderConnect <input> glsl <stage> <work_dir> <target>`; writes `shader.<suffix>` into
    /// `work_dir`.
    ShaderConnect,
}

/// Version of a ShaderConnect distribution, part of its executable name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompilerVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl CompilerVersion {
    pub const SHADER_CONNECT: CompilerVersion = CompilerVersion {
        major: 1,
        minor: 2,
        patch: 0,
    };
}

/// The compiler used on one host platform.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Toolchain {
    pub executable: PathBuf,
    #[serde(default)]
    pub flavor: CompilerFlavor,
    #[serde(default = "default_targets")]
    pub targets: Vec<TargetLanguage>,
}

fn default_targets() -> Vec<TargetLanguage> {
    vec![TargetLanguage::SpirV]
}

fn default_extensions() -> Vec<String> {
    DEFAULT_INCLUDABLE_EXTENSIONS
        .iter()
        .map(|ext| ext.to_string())
        .collect()
}

/// Per-platform compiler selection plus resolver settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    pub windows: Toolchain,
    pub macos: Toolchain,
    pub linux: Toolchain,
    /// Extensions (without the dot) that `#include` may name.
    pub includable_extensions: Vec<String>,
    /// Where scratch sources are written; the OS temp directory when unset.
    pub scratch_dir: Option<PathBuf>,
}

impl Default for CompilerConfig {
    /// `glslc` looked up on `PATH`.
    fn default() -> Self {
        Self::glslc("")
    }
}

impl CompilerConfig {
    /// Single-target SPIR-V setup running `glslc` from `compiler_dir` on every platform.
    pub fn glslc(compiler_dir: impl AsRef<Path>) -> Self {
        let dir = compiler_dir.as_ref();
        let toolchain = |platform: HostPlatform| Toolchain {
            executable: dir.join(format!("glslc{}", platform.exe_suffix())),
            flavor: CompilerFlavor::Glslc,
            targets: default_targets(),
        };

        Self {
            windows: toolchain(HostPlatform::Windows),
            macos: toolchain(HostPlatform::MacOs),
            linux: toolchain(HostPlatform::Linux),
            includable_extensions: default_extensions(),
            scratch_dir: None,
        }
    }

    /// Multi-target setup for a ShaderConnect distribution laid out as
    /// `<compiler_dir>/Platform/<OS>/ShaderConnect-<version>[.exe]`.
    pub fn shader_connect(compiler_dir: impl AsRef<Path>, version: CompilerVersion) -> Self {
        let dir = compiler_dir.as_ref();
        let toolchain = |platform: HostPlatform| Toolchain {
            executable: dir.join("Platform").join(platform.dir_name()).join(format!(
                "ShaderConnect-{}.{}.{}{}",
                version.major,
                version.minor,
                version.patch,
                platform.exe_suffix()
            )),
            flavor: CompilerFlavor::ShaderConnect,
            targets: TargetLanguage::for_platform(platform),
        };

        Self {
            windows: toolchain(HostPlatform::Windows),
            macos: toolchain(HostPlatform::MacOs),
            linux: toolchain(HostPlatform::Linux),
            includable_extensions: default_extensions(),
            scratch_dir: None,
        }
    }

    /// Loads a config from a JSON file. Missing fields keep their [`Default`] values.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::Read`]
    /// - [`ConfigError::Parse`]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// The toolchain configured for `platform`.
    pub fn toolchain(&self, platform: HostPlatform) -> &Toolchain {
        match platform {
            HostPlatform::Windows => &self.windows,
            HostPlatform::MacOs => &self.macos,
            HostPlatform::Linux => &self.linux,
        }
    }

    /// Builds a resolver honoring [`includable_extensions`](Self::includable_extensions).
    pub fn resolver(&self) -> IncludeResolver {
        IncludeResolver::new(self.includable_extensions.iter().cloned())
    }
}
