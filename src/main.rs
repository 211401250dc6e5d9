//! # ShaderPack Command Line
//!
//! Resolves and compiles one shader file, or every shader under a directory.
//!
//! ```text
//! shaderpack [--packed] [--keep-going] [--resolve-only] [--config <file>]
//!            [--compiler-dir <dir>] <shader-or-directory> <output-directory>
//! ```
//!
//! Log output goes through [`pretty_env_logger`] at `info` level unless `RUST_LOG` says
//! otherwise.

use std::{
    env, fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::LevelFilter;
use shaderpack::{
    CompileDispatcher, CompilerConfig, CompilerVersion, FailurePolicy, IncludeResolver,
    OutputMode, batch, compile_directory,
};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Pack every configured target into one `.shader` file per shader
    #[arg(long)]
    packed: bool,

    /// Keep compiling the rest of a directory after a shader fails
    #[arg(long)]
    keep_going: bool,

    /// Only expand includes and write the resolved source
    #[arg(long)]
    resolve_only: bool,

    /// JSON compiler config
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory holding glslc, or a ShaderConnect distribution with --packed
    #[arg(long, value_name = "DIR", conflicts_with = "config")]
    compiler_dir: Option<PathBuf>,

    /// Shader file or directory of shaders
    input: PathBuf,

    /// Output directory; resolved source goes to stdout when omitted with --resolve-only
    #[arg(required_unless_present = "resolve_only")]
    output: Option<PathBuf>,
}

fn load_config(args: &Args) -> Result<CompilerConfig> {
    if let Some(path) = &args.config {
        return Ok(CompilerConfig::from_json_file(path)?);
    }

    let dir = args.compiler_dir.clone().unwrap_or_default();
    Ok(if args.packed {
        CompilerConfig::shader_connect(dir, CompilerVersion::SHADER_CONNECT)
    } else {
        CompilerConfig::glslc(dir)
    })
}

/// Prints or writes resolved source without compiling.
fn resolve_only(resolver: &IncludeResolver, input: &Path, output: Option<&Path>) -> Result<()> {
    if input.is_file() {
        let resolved = resolver.resolve_file(input)?;
        return match output {
            Some(dir) => write_resolved(dir, input, &resolved.name, &resolved.source),
            None => {
                io::stdout().write_all(resolved.source.as_bytes())?;
                Ok(())
            }
        };
    }

    let Some(output) = output else {
        bail!("--resolve-only on a directory needs an output directory");
    };

    for shader in batch::find_shaders(input)? {
        let resolved = resolver.resolve_file(&shader)?;
        let dir = batch::mirrored_dir(input, &shader, output);
        write_resolved(&dir, &shader, &resolved.name, &resolved.source)?;
    }

    Ok(())
}

/// Writes `source` to `<dir>/<name>`, refusing to replace the shader it was resolved from.
fn write_resolved(dir: &Path, shader: &Path, name: &str, source: &str) -> Result<()> {
    let path = dir.join(name);
    if is_same_file(&path, shader) {
        bail!(
            "Refusing to overwrite shader '{}' with its resolved source",
            shader.display()
        );
    }

    fs::create_dir_all(dir).with_context(|| format!("Could not create '{}'", dir.display()))?;
    fs::write(&path, source).with_context(|| format!("Could not write '{}'", path.display()))?;
    log::info!("Resolved [{name}] to '{}'", path.display());
    Ok(())
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn run(args: Args) -> Result<()> {
    let config = load_config(&args)?;

    if args.resolve_only {
        return resolve_only(&config.resolver(), &args.input, args.output.as_deref());
    }

    let output = args
        .output
        .as_deref()
        .context("An output directory is required unless --resolve-only is given")?;
    let mode = if args.packed {
        OutputMode::Packed
    } else {
        OutputMode::Single
    };
    let dispatcher = CompileDispatcher::for_host(&config)?;

    if args.input.is_dir() {
        let policy = if args.keep_going {
            FailurePolicy::KeepGoing
        } else {
            FailurePolicy::Stop
        };
        let report = compile_directory(&dispatcher, &args.input, output, mode, policy)?;
        if !report.is_success() {
            bail!("{} shader(s) failed to compile", report.failed.len());
        }
    } else {
        dispatcher
            .compile_file(&args.input, output, mode)
            .with_context(|| format!("Could not compile '{}'", args.input.display()))?;
    }

    Ok(())
}

fn main() -> Result<()> {
    let mut logger = pretty_env_logger::formatted_builder();
    logger.filter_level(LevelFilter::Info);
    if let Ok(filters) = env::var("RUST_LOG") {
        logger.parse_filters(&filters);
    }
    logger.init();

    run(Args::parse())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{CommandFactory, error::ErrorKind};
    use tempfile::TempDir;

    fn parse(args: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("shaderpack").chain(args.iter().copied()))
    }

    #[test]
    fn command_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn parses_flags_and_paths() {
        let args = parse(&["--packed", "--keep-going", "shaders", "out"]).unwrap();
        assert!(args.packed);
        assert!(args.keep_going);
        assert!(!args.resolve_only);
        assert_eq!(args.input, PathBuf::from("shaders"));
        assert_eq!(args.output, Some(PathBuf::from("out")));
    }

    #[test]
    fn parses_valued_options() {
        let args = parse(&["--compiler-dir", "tools", "a.vert", "out"]).unwrap();
        assert_eq!(args.compiler_dir, Some(PathBuf::from("tools")));

        let args = parse(&["--config", "cfg.json", "a.vert", "out"]).unwrap();
        assert_eq!(args.config, Some(PathBuf::from("cfg.json")));
    }

    #[test]
    fn output_is_optional_only_when_resolving() {
        let err = parse(&["a.vert"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);

        let args = parse(&["--resolve-only", "a.vert"]).unwrap();
        assert_eq!(args.output, None);
    }

    #[test]
    fn rejects_bad_arguments() {
        assert!(parse(&[]).is_err());
        assert!(parse(&["--Debug", "a.vert", "out"]).is_err());
        assert!(parse(&["a.vert", "out", "extra"]).is_err());
        assert!(parse(&["--config"]).is_err());

        let err = parse(&["--config", "c.json", "--compiler-dir", "d", "a.vert", "out"])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
    }

    #[test]
    fn help_is_printed_not_parsed_as_a_path() {
        assert_eq!(parse(&["--help"]).unwrap_err().kind(), ErrorKind::DisplayHelp);
        assert_eq!(parse(&["-h"]).unwrap_err().kind(), ErrorKind::DisplayHelp);
    }

    #[test]
    fn compiler_dir_picks_layout() {
        let args = parse(&["--packed", "--compiler-dir", "sc", "a.vert", "out"]).unwrap();
        let config = load_config(&args).unwrap();
        assert_eq!(
            config.linux.executable,
            Path::new("sc/Platform/Linux/ShaderConnect-1.2.0")
        );

        let args = parse(&["a.vert", "out"]).unwrap();
        assert_eq!(load_config(&args).unwrap(), CompilerConfig::default());
    }

    #[test]
    fn resolve_only_writes_into_output_dir() {
        let shaders = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        fs::write(shaders.path().join("common.glsl"), "float value;\n").unwrap();
        let shader = shaders.path().join("a.vert");
        fs::write(&shader, "#include \"common.glsl\"\nvoid main() {}\n").unwrap();

        resolve_only(&IncludeResolver::default(), &shader, Some(out.path())).unwrap();

        let resolved = fs::read_to_string(out.path().join("a.vert")).unwrap();
        assert_eq!(resolved, "float value;\n\nvoid main() {}\n");
    }

    #[test]
    fn resolve_only_never_overwrites_its_input() {
        let shaders = TempDir::new().unwrap();
        let original = "#include \"common.glsl\"\nvoid main() {}\n";
        fs::write(shaders.path().join("common.glsl"), "float value;\n").unwrap();
        let shader = shaders.path().join("a.vert");
        fs::write(&shader, original).unwrap();

        let resolver = IncludeResolver::default();
        assert!(resolve_only(&resolver, &shader, Some(shaders.path())).is_err());
        assert!(resolve_only(&resolver, shaders.path(), Some(shaders.path())).is_err());
        assert_eq!(fs::read_to_string(&shader).unwrap(), original);
    }
}
