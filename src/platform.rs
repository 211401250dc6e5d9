//! # Platform Module
//!
//! Host operating-system detection and the binary target languages a compiled shader can be
//! emitted as. The order of [`TargetLanguage::ALL`] is the order of the fields in
//! [`ShaderFileHeader`](crate::header::ShaderFileHeader) and of the blobs in a packed artifact.

use std::fmt;

use serde::Deserialize;

use crate::error::ShaderError;

/// Operating systems with a known shader compiler layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostPlatform {
    Windows,
    MacOs,
    Linux,
}

impl HostPlatform {
    /// Detects the platform this binary was built for.
    ///
    /// # Errors
    ///
    /// - [`ShaderError::UnsupportedPlatform`]
    pub fn current() -> Result<Self, ShaderError> {
        Self::from_os_name(std::env::consts::OS)
    }

    /// Maps an OS name as reported by [`std::env::consts::OS`] to a platform.
    ///
    /// # Errors
    ///
    /// - [`ShaderError::UnsupportedPlatform`]
    pub fn from_os_name(os: &str) -> Result<Self, ShaderError> {
        match os {
            "windows" => Ok(Self::Windows),
            "macos" => Ok(Self::MacOs),
            "linux" => Ok(Self::Linux),
            other => Err(ShaderError::UnsupportedPlatform {
                os: other.to_string(),
            }),
        }
    }

    /// Directory name used for this platform in a compiler distribution.
    pub fn dir_name(self) -> &'static str {
        match self {
            Self::Windows => "Windows",
            Self::MacOs => "macOS",
            Self::Linux => "Linux",
        }
    }

    /// Suffix appended to executable names.
    pub fn exe_suffix(self) -> &'static str {
        match self {
            Self::Windows => ".exe",
            Self::MacOs | Self::Linux => "",
        }
    }
}

/// A binary shader format produced by the compile backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TargetLanguage {
    #[serde(rename = "spir-v")]
    SpirV,
    MacosMetallib,
    IosMetallib,
    IosSimulatorMetallib,
    Dxil,
}

impl TargetLanguage {
    /// Every target, in packed-header order.
    pub const ALL: [TargetLanguage; 5] = [
        Self::SpirV,
        Self::MacosMetallib,
        Self::IosMetallib,
        Self::IosSimulatorMetallib,
        Self::Dxil,
    ];

    /// Position of this target's size field in the packed header.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Name passed to the compiler on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SpirV => "spir-v",
            Self::MacosMetallib => "macos-metallib",
            Self::IosMetallib => "ios-metallib",
            Self::IosSimulatorMetallib => "ios-simulator-metallib",
            Self::Dxil => "dxil",
        }
    }

    /// File suffix of the artifact the compiler writes for this target.
    pub fn artifact_suffix(self) -> &'static str {
        match self {
            Self::SpirV => "spv",
            Self::MacosMetallib => "macos.metallib",
            Self::IosMetallib => "ios.metallib",
            Self::IosSimulatorMetallib => "ios-simulator.metallib",
            Self::Dxil => "dxil",
        }
    }

    /// Targets a packed build emits on `platform`.
    pub fn for_platform(platform: HostPlatform) -> Vec<TargetLanguage> {
        match platform {
            HostPlatform::Windows => vec![Self::SpirV, Self::Dxil],
            HostPlatform::MacOs => vec![
                Self::SpirV,
                Self::MacosMetallib,
                Self::IosMetallib,
                Self::IosSimulatorMetallib,
            ],
            HostPlatform::Linux => vec![Self::SpirV],
        }
    }
}

impl fmt::Display for TargetLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
