use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use mimalloc::MiMalloc;
use sanitizer::{
    CommentPolicy, ConfigError, EncodingError, LineBreaks, SanitizerConfig, sanitize,
    standard_policy,
};

mod logging;
mod policy;
mod report;

use policy::{PolicyError, PolicyFile, apply_tag_override};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LineBreakMode {
    Keep,
    Lf,
    Crlf,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(version, name = "tagsafe", about = "Deny-by-default HTML sanitizer")]
struct Args {
    /// input file; stdin when absent or `-`
    input: Option<PathBuf>,
    /// write the result here instead of stdout
    #[arg(short, long, value_name = "file")]
    output: Option<PathBuf>,
    /// TOML overlay applied on top of the base policy
    #[arg(long, value_name = "file")]
    policy: Option<PathBuf>,
    /// start from a policy that allows nothing
    #[arg(long)]
    empty_policy: bool,
    /// allow a tag, e.g. `--tag 'abbr=title,!lang'` (repeatable)
    #[arg(long = "tag", value_name = "NAME=RULES")]
    tags: Vec<String>,
    /// keep `<!-- -->` comments, with their content escaped
    #[arg(long)]
    keep_comments: bool,
    #[arg(long, value_enum, default_value_t = LineBreakMode::Lf)]
    line_breaks: LineBreakMode,
    /// do not collect warnings
    #[arg(long)]
    no_warnings: bool,
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,
    /// exit with status 2 when anything was discarded
    #[arg(long)]
    strict: bool,
    /// more log output on stderr (repeatable)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug)]
enum CliError {
    Io { what: String, source: io::Error },
    Policy(PolicyError),
    Config(ConfigError),
    Encoding(EncodingError),
    Json(serde_json::Error),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Io { what, source } => write!(f, "{what}: {source}"),
            CliError::Policy(err) => write!(f, "{err}"),
            CliError::Config(err) => write!(f, "invalid policy: {err}"),
            CliError::Encoding(err) => write!(f, "input rejected: {err}"),
            CliError::Json(err) => write!(f, "cannot render report: {err}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Io { source, .. } => Some(source),
            CliError::Policy(err) => Some(err),
            CliError::Config(err) => Some(err),
            CliError::Encoding(err) => Some(err),
            CliError::Json(err) => Some(err),
        }
    }
}

impl From<PolicyError> for CliError {
    fn from(err: PolicyError) -> Self {
        CliError::Policy(err)
    }
}

fn build_config(args: &Args) -> Result<SanitizerConfig, CliError> {
    let mut config = if args.empty_policy {
        SanitizerConfig::empty()
    } else {
        standard_policy().map_err(CliError::Config)?
    };
    if let Some(path) = &args.policy {
        PolicyFile::load(path)?.apply(&mut config)?;
    }
    for raw in &args.tags {
        apply_tag_override(raw, &mut config)?;
    }
    if args.keep_comments {
        config.comments = CommentPolicy::Retain;
    }
    config.line_breaks = match args.line_breaks {
        LineBreakMode::Keep => LineBreaks::Keep,
        LineBreakMode::Lf => LineBreaks::Replace("\n".to_string()),
        LineBreakMode::Crlf => LineBreaks::Replace("\r\n".to_string()),
    };
    config.collect_warnings = !args.no_warnings;
    Ok(config)
}

fn read_input(input: Option<&PathBuf>) -> Result<Vec<u8>, CliError> {
    match input {
        Some(path) if path.as_os_str() != "-" => std::fs::read(path).map_err(|source| CliError::Io {
            what: format!("cannot read {}", path.display()),
            source,
        }),
        _ => {
            let mut buf = Vec::new();
            io::stdin()
                .read_to_end(&mut buf)
                .map_err(|source| CliError::Io {
                    what: "cannot read stdin".to_string(),
                    source,
                })?;
            Ok(buf)
        }
    }
}

fn write_output(output: Option<&PathBuf>, text: &str) -> Result<(), CliError> {
    let result = match output {
        Some(path) => std::fs::write(path, text),
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(text.as_bytes()).and_then(|()| stdout.flush())
        }
    };
    result.map_err(|source| CliError::Io {
        what: match output {
            Some(path) => format!("cannot write {}", path.display()),
            None => "cannot write stdout".to_string(),
        },
        source,
    })
}

/// Returns whether any warning was raised.
fn run(args: &Args) -> Result<bool, CliError> {
    let config = build_config(args)?;
    let input = read_input(args.input.as_ref())?;
    tracing::info!(target: "tagsafe", "sanitizing {} bytes", input.len());

    let sanitized = sanitize(&input, &config).map_err(CliError::Encoding)?;
    match args.format {
        Format::Text => {
            write_output(args.output.as_ref(), &sanitized.output)?;
            for line in report::warning_lines(&sanitized.warnings) {
                eprintln!("{line}");
            }
        }
        Format::Json => {
            let mut json =
                report::to_json(&sanitized.output, &sanitized.warnings).map_err(CliError::Json)?;
            json.push('\n');
            write_output(args.output.as_ref(), &json)?;
        }
    }
    Ok(!sanitized.warnings.is_empty())
}

fn main() -> ExitCode {
    let args = Args::parse();
    if let Err(err) = logging::init(args.verbose) {
        eprintln!("tagsafe: {err}");
    }

    match run(&args) {
        Ok(true) if args.strict => ExitCode::from(2),
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("tagsafe: {err}");
            ExitCode::FAILURE
        }
    }
}
