//! Shader stage detection from file names.

use std::path::Path;

/// Pipeline stage a shader file compiles for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
    Compute,
    Geometry,
    TessControl,
    TessEval,
}

impl ShaderStage {
    /// Determines the stage from a file name such as `lit.frag` or `lit.frag.glsl`.
    ///
    /// Returns `None` for plain includable sources (`common.glsl`) and anything else without a
    /// stage suffix.
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        let name = name.strip_suffix(".glsl").unwrap_or(name);
        let (_, ext) = name.rsplit_once('.')?;

        match ext {
            "vert" => Some(Self::Vertex),
            "frag" => Some(Self::Fragment),
            "comp" => Some(Self::Compute),
            "geom" => Some(Self::Geometry),
            "tesc" => Some(Self::TessControl),
            "tese" => Some(Self::TessEval),
            _ => None,
        }
    }

    /// Stage hint passed to compilers that take one on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Vertex => "vertex",
            Self::Fragment => "fragment",
            Self::Compute => "compute",
            Self::Geometry => "geometry",
            Self::TessControl => "tessellation-control",
            Self::TessEval => "tessellation-evaluation",
        }
    }
}
