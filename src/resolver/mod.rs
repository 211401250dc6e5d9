//! # Resolver Module
//!
//! Expands `#include "path"` directives in GLSL source by splicing the referenced file's text in
//! place of the directive. GLSL has no include support of its own, so this runs before the
//! source is handed to a compiler.
//!
//! Expansion rules:
//!
//! - Paths are relative to the base directory of the shader being resolved, including paths
//!   that appear in nested includes.
//! - Every file is inlined at most once per compile unit. Later directives naming a file that
//!   is already inlined are removed without inserting anything.
//! - Directives inside `//` or `/* */` comments are removed from the text and never inlined,
//!   even if the file they name does not exist.
//! - An included file's `#version` line is commented out.
//! - After every substitution the buffer is scanned again from the top, so includes brought in
//!   by spliced text are picked up as well.

mod scanner;


use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

use log::debug;

pub use scanner::{Directive, INCLUDE_MARKER, Scanner};

use crate::error::IncludeError;

/// Extensions accepted for included files when none are configured.
pub const DEFAULT_INCLUDABLE_EXTENSIONS: &[&str] = &["glsl"];

const VERSION_MARKER: &str = "#version";

/// Absolute paths already inlined into one compile unit, in the order they were inlined.
#[derive(Debug, Default, Clone)]
pub struct SeenIncludes {
    set: HashSet<PathBuf>,
    order: Vec<PathBuf>,
}

impl SeenIncludes {
    /// Records `path`, returning `false` if it was already present.
    pub fn insert(&mut self, path: PathBuf) -> bool {
        if self.set.contains(&path) {
            return false;
        }
        self.set.insert(path.clone());
        self.order.push(path);
        true
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.set.contains(path)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Paths in inlining order.
    pub fn into_paths(self) -> Vec<PathBuf> {
        self.order
    }
}

/// A shader file with every include expanded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedShader {
    /// File name of the root shader, e.g. `lit.frag`.
    pub name: String,
    /// Fully expanded source.
    pub source: String,
    /// Canonical paths of every inlined file, in inlining order. Does not contain the root.
    pub includes: Vec<PathBuf>,
}

/// Expands include directives in shader source.
#[derive(Debug, Clone)]
pub struct IncludeResolver {
    includable_extensions: Vec<String>,
}

impl Default for IncludeResolver {
    fn default() -> Self {
        Self::new(DEFAULT_INCLUDABLE_EXTENSIONS.iter().copied())
    }
}

impl IncludeResolver {
    /// Creates a resolver accepting includes with any of the given extensions (without the dot).
    pub fn new<I, S>(includable_extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            includable_extensions: includable_extensions.into_iter().map(Into::into).collect(),
        }
    }

    /// Expands every include in `source`, resolving paths against `base_dir`.
    ///
    /// `shader_name` only identifies the shader in error messages.
    ///
    /// # Errors
    ///
    /// - [`IncludeError::Malformed`]
    /// - [`IncludeError::UnsupportedExtension`]
    /// - [`IncludeError::Missing`]
    /// - [`IncludeError::Read`]
    pub fn resolve(
        &self,
        source: &str,
        base_dir: &Path,
        shader_name: &str,
    ) -> Result<String, IncludeError> {
        let mut seen = SeenIncludes::default();
        self.resolve_with(source.to_owned(), base_dir, shader_name, &mut seen)
    }

    /// Reads the shader at `path` and expands it against its parent directory.
    ///
    /// The root shader counts as already inlined, so a file that includes itself, directly or
    /// through another include, does not get its own text spliced in a second time.
    ///
    /// # Errors
    ///
    /// - [`IncludeError::Read`] if the shader itself cannot be read.
    /// - Any error from [`IncludeResolver::resolve`].
    pub fn resolve_file(&self, path: &Path) -> Result<ResolvedShader, IncludeError> {
        let read_err = |source| IncludeError::Read {
            path: path.to_path_buf(),
            source,
        };

        let source = fs::read_to_string(path).map_err(read_err)?;
        let root = fs::canonicalize(path).map_err(read_err)?;
        let base_dir = root.parent().unwrap_or(Path::new(".")).to_path_buf();
        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut seen = SeenIncludes::default();
        seen.insert(root.clone());

        let source = self.resolve_with(source, &base_dir, &name, &mut seen)?;
        let includes = seen.into_paths().into_iter().filter(|p| *p != root).collect();

        Ok(ResolvedShader {
            name,
            source,
            includes,
        })
    }

    /// Expansion loop shared by [`resolve`](Self::resolve) and
    /// [`resolve_file`](Self::resolve_file).
    pub fn resolve_with(
        &self,
        mut buffer: String,
        base_dir: &Path,
        shader_name: &str,
        seen: &mut SeenIncludes,
    ) -> Result<String, IncludeError> {
        loop {
            let next = Scanner::new(&buffer).next_directive();
            let Some(directive) = next else {
                break;
            };
            let span = directive.span.clone();

            if directive.suppressed {
                debug!("Dropping commented-out '{}' in [{shader_name}]", &buffer[span.clone()]);
                buffer.replace_range(span, "");
                continue;
            }

            let Some(path) = directive.path.clone() else {
                return Err(IncludeError::Malformed {
                    shader: shader_name.to_string(),
                    line: directive.line(&buffer),
                });
            };

            let include = buffer[path].to_string();
            let absolute = self.locate(&include, base_dir, shader_name)?;

            if seen.contains(&absolute) {
                debug!("[{include}] is already part of [{shader_name}]; skipping");
                buffer.replace_range(span, "");
                continue;
            }

            let text = fs::read_to_string(&absolute).map_err(|source| IncludeError::Read {
                path: absolute.clone(),
                source,
            })?;
            debug!("Including [{include}] in [{shader_name}]");

            seen.insert(absolute);
            buffer.replace_range(span, &comment_out_version(&text));
        }

        Ok(buffer)
    }

    /// Validates an include target and returns its canonical path.
    fn locate(
        &self,
        include: &str,
        base_dir: &Path,
        shader_name: &str,
    ) -> Result<PathBuf, IncludeError> {
        let candidate = base_dir.join(include);

        let includable = candidate
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.includable_extensions.iter().any(|e| e == ext));
        if !includable {
            return Err(IncludeError::UnsupportedExtension {
                include: include.to_string(),
                shader: shader_name.to_string(),
            });
        }

        if !candidate.is_file() {
            return Err(IncludeError::Missing {
                include: include.to_string(),
                shader: shader_name.to_string(),
            });
        }

        fs::canonicalize(&candidate).map_err(|source| IncludeError::Read {
            path: candidate,
            source,
        })
    }
}

/// Comments out `#version` declarations so included text cannot redeclare the language version.
pub fn comment_out_version(text: &str) -> String {
    text.split_inclusive('\n')
        .map(|line| {
            if line.trim_start().starts_with(VERSION_MARKER) {
                line.replacen(VERSION_MARKER, "//", 1)
            } else {
                line.to_string()
            }
        })
        .collect()
}
