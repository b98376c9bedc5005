//! Purpose: `impact2json` CLI entry point and command dispatch.
//! Role: Binary crate root; parses args, runs commands, emits JSON on stdout.
//! Invariants: Commands emit stable stdout formats (pretty on a TTY, compact otherwise).
//! Invariants: Non-interactive errors are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
//! Invariants: Running without a command converts the default paths.
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::{
    Args, CommandFactory, Parser, Subcommand, ValueEnum, ValueHint,
    error::ErrorKind as ClapErrorKind,
};
use clap_complete::aot::Shell;
use impact2json::api::{
    DEFAULT_INPUT, DEFAULT_OUTPUT, Error, ErrorKind, InferOptions, InferPolicy, ReadOptions,
    to_exit_code,
};
use serde_json::{Map, Value, json};
use std::error::Error as StdError;
use tracing_subscriber::EnvFilter;

mod command_dispatch;
mod report_json;

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

fn main() {
    init_tracing();
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err((err, color_mode)) => {
            emit_error(&err, color_mode);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<RunOutcome, (Error, ColorMode)> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    (
                        Error::new(ErrorKind::Io)
                            .with_message("failed to write help")
                            .with_source(io_err),
                        ColorMode::Auto,
                    )
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome::with_code(exit_code));
            }
            _ => {
                let message = clap_error_summary(&err);
                let hint = clap_error_hint(&err);
                return Err((
                    Error::new(ErrorKind::Usage)
                        .with_message(message)
                        .with_hint(hint),
                    ColorMode::Auto,
                ));
            }
        },
    };

    let color_mode = cli.color;
    let command = cli.command.unwrap_or(Command::Convert(cli.convert));

    command_dispatch::dispatch_command(command, color_mode)
        .map_err(add_not_found_hint)
        .map_err(add_parse_hint)
        .map_err(add_write_hint)
        .map_err(add_internal_hint)
        .map_err(|err| (err, color_mode))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

#[derive(Parser)]
#[command(
    name = "impact2json",
    version,
    about = "Convert impact CSV exports into the JSON array served to the front-end",
    help_template = r#"{about-with-newline}
{before-help}USAGE
  {usage}

COMMANDS
{subcommands}

OPTIONS
{options}

{after-help}
"#,
    long_about = None,
    args_conflicts_with_subcommands = true,
    before_help = r#"The first CSV row names the columns; every other row becomes one JSON object.
Without a command, `impact2json` converts data/input/impacts.csv into
public/data/impacts.json relative to the working directory. When a command
is given, its options follow the command name.
"#,
    after_help = r#"EXAMPLES
  $ impact2json                                          # default paths
  $ impact2json convert -i impacts.csv -o out/impacts.json --create-dirs
  $ impact2json convert --text-column zip                # keep leading zeros
  $ impact2json check -i data/input/impacts.csv
  $ impact2json stats

LEARN MORE
  $ impact2json <command> --help
  Logs: RUST_LOG=debug impact2json convert"#
)]
struct Cli {
    #[arg(
        long,
        global = true,
        default_value = "auto",
        value_enum,
        help = "Colorize stderr diagnostics: auto|always|never"
    )]
    color: ColorMode,

    #[command(flatten)]
    convert: ConvertArgs,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ColorMode {
    Auto,
    Always,
    Never,
}

impl ColorMode {
    fn use_color(self, is_tty: bool) -> bool {
        match self {
            ColorMode::Auto => is_tty,
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum InferPolicyCli {
    Column,
    Off,
}

impl From<InferPolicyCli> for InferPolicy {
    fn from(value: InferPolicyCli) -> Self {
        match value {
            InferPolicyCli::Column => InferPolicy::Column,
            InferPolicyCli::Off => InferPolicy::Off,
        }
    }
}

#[derive(Args, Clone, Debug)]
struct SourceArgs {
    #[arg(
        short = 'i',
        long,
        env = "IMPACT2JSON_INPUT",
        default_value = DEFAULT_INPUT,
        help = "CSV input path",
        value_hint = ValueHint::FilePath
    )]
    input: PathBuf,
    #[arg(
        long = "infer",
        default_value = "column",
        value_enum,
        help = "Type inference: column|off",
        long_help = r#"Type inference policy

  column  Each column becomes integer, float, boolean, or text, whichever
          fits every non-null cell
  off     Keep every non-null cell as text"#
    )]
    infer: InferPolicyCli,
    #[arg(
        long = "text-column",
        value_name = "NAME",
        help = "Repeatable column name that always stays text"
    )]
    text_columns: Vec<String>,
    #[arg(
        long = "null-value",
        value_name = "TOKEN",
        help = "Repeatable cell text read as null (replaces the defaults; blank is always null)"
    )]
    null_values: Vec<String>,
    #[arg(long, help = "Reject rows with fewer fields than the header")]
    strict: bool,
}

impl SourceArgs {
    fn read_options(&self) -> ReadOptions {
        let mut infer = InferOptions::default().with_policy(self.infer.into());
        for column in &self.text_columns {
            infer = infer.with_text_column(column.clone());
        }
        if !self.null_values.is_empty() {
            infer = infer.with_null_values(self.null_values.iter().cloned());
        }
        ReadOptions {
            infer,
            strict: self.strict,
        }
    }
}

#[derive(Args, Clone, Debug)]
struct ConvertArgs {
    #[command(flatten)]
    source: SourceArgs,
    #[arg(
        short = 'o',
        long,
        env = "IMPACT2JSON_OUTPUT",
        default_value = DEFAULT_OUTPUT,
        help = "JSON output path (created or overwritten)",
        value_hint = ValueHint::FilePath
    )]
    output: PathBuf,
    #[arg(long, help = "Create missing parent directories of the output")]
    create_dirs: bool,
    #[arg(long, help = "Refuse to write unless the rows have the impact shape")]
    check: bool,
}

#[derive(Subcommand)]
enum Command {
    #[command(
        about = "Convert a CSV file into a JSON array",
        long_about = r#"Convert a CSV file into a JSON array of objects.

The output is pretty-printed with two-space indentation, keeps column order
within each object and row order across the array, and writes non-ASCII text
as-is. A summary of the conversion is printed on stdout."#,
        after_help = r#"EXAMPLES
  $ impact2json convert
  $ impact2json convert -i impacts.csv -o public/data/impacts.json
  $ impact2json convert --infer off
  $ impact2json convert --null-value "" --null-value "-"
  $ impact2json convert --check --strict

NOTES
  - Short rows are padded with null (notice on stderr); use --strict to reject them
  - Rows with more fields than the header always fail
  - The output is only opened after the whole input was read"#
    )]
    Convert(ConvertArgs),
    #[command(
        about = "Check that rows have the impact shape the front-end expects",
        long_about = r#"Check that rows have the impact shape the front-end expects.

Required columns: id (number), entity, highlight, impact (strings).
Duplicate ids are reported too. Exits 5 when issues are found."#,
        after_help = r#"EXAMPLES
  $ impact2json check
  $ impact2json check -i data/input/impacts.csv"#
    )]
    Check {
        #[command(flatten)]
        source: SourceArgs,
    },
    #[command(
        about = "Summarize impacts by entity",
        after_help = r#"EXAMPLES
  $ impact2json stats"#
    )]
    Stats {
        #[command(flatten)]
        source: SourceArgs,
    },
    #[command(
        about = "Print version info as JSON",
        long_about = r#"Emit version info as JSON (stable, machine-readable)."#,
        after_help = r#"EXAMPLES
  $ impact2json version"#
    )]
    Version,
    #[command(
        arg_required_else_help = true,
        about = "Generate shell completions",
        long_about = r#"Generate shell completion scripts.

Prints a completion script for the given shell to stdout."#,
        after_help = r#"EXAMPLES
  $ impact2json completion bash > ~/.local/share/bash-completion/completions/impact2json
  $ impact2json completion zsh > ~/.zfunc/_impact2json
  $ impact2json completion fish > ~/.config/fish/completions/impact2json.fish"#
    )]
    Completion {
        #[arg(help = "Shell to generate completions for")]
        shell: Shell,
    },
}

fn add_not_found_hint(err: Error) -> Error {
    if err.kind() != ErrorKind::NotFound || err.hint().is_some() {
        return err;
    }
    err.with_hint(
        "Check the input path (paths are relative to the working directory) or pass --input.",
    )
}

fn add_parse_hint(err: Error) -> Error {
    if err.kind() != ErrorKind::Parse || err.hint().is_some() {
        return err;
    }
    err.with_hint("Check the CSV around the reported line (quoting, delimiters, encoding).")
}

fn add_write_hint(err: Error) -> Error {
    if err.hint().is_some() {
        return err;
    }
    match err.kind() {
        ErrorKind::Write => err.with_hint(
            "Check that the output directory exists and is writable, or pass --create-dirs.",
        ),
        ErrorKind::Io => err.with_hint("I/O error. Check the path, filesystem, and permissions."),
        _ => err,
    }
}

fn add_internal_hint(err: Error) -> Error {
    if err.kind() != ErrorKind::Internal || err.hint().is_some() {
        return err;
    }
    err.with_hint(
        "Unexpected internal failure. Retry with RUST_BACKTRACE=1 and share command/context if it persists.",
    )
}

fn emit_version_output() {
    if io::stdout().is_terminal() {
        println!("impact2json {}", env!("CARGO_PKG_VERSION"));
    } else {
        emit_json(json!({
            "name": "impact2json",
            "version": env!("CARGO_PKG_VERSION"),
        }));
    }
}

fn emit_json(value: Value) {
    let encoded = if io::stdout().is_terminal() {
        serde_json::to_string_pretty(&value)
    } else {
        serde_json::to_string(&value)
    };
    let json = encoded.unwrap_or_else(|_| "{\"error\":\"json encode failed\"}".to_string());
    println!("{json}");
}

#[derive(Copy, Clone, Debug)]
enum AnsiColor {
    Red,
    Yellow,
}

fn colorize_label(label: &str, enabled: bool, color: AnsiColor) -> String {
    if !enabled {
        return label.to_string();
    }
    let code = match color {
        AnsiColor::Red => "31",
        AnsiColor::Yellow => "33",
    };
    format!("\u{1b}[{code}m{label}\u{1b}[0m")
}

fn emit_error(err: &Error, color_mode: ColorMode) {
    let is_tty = io::stderr().is_terminal();
    if is_tty {
        eprintln!("{}", error_text(err, color_mode.use_color(is_tty)));
        return;
    }

    let value = error_json(err);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn notice_time_now() -> Option<String> {
    use time::format_description::well_known::Rfc3339;
    let duration = SystemTime::now().duration_since(UNIX_EPOCH).ok()?;
    let ts = time::OffsetDateTime::from_unix_timestamp_nanos(duration.as_nanos() as i128).ok()?;
    ts.format(&Rfc3339).ok()
}

fn emit_notice(notice: &Value, color_mode: ColorMode) {
    let is_tty = io::stderr().is_terminal();
    if is_tty {
        let label = colorize_label("notice:", color_mode.use_color(is_tty), AnsiColor::Yellow);
        let inner = &notice["notice"];
        eprintln!(
            "{label} {} (input: {})",
            inner["message"].as_str().unwrap_or_default(),
            inner["input"].as_str().unwrap_or_default()
        );
        return;
    }

    let json = serde_json::to_string(notice).unwrap_or_else(|_| {
        "{\"notice\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_message(err: &Error) -> String {
    if let Some(message) = err.message() {
        return message.to_string();
    }
    match err.kind() {
        ErrorKind::Internal => "internal error".to_string(),
        ErrorKind::Usage => "usage error".to_string(),
        ErrorKind::NotFound => "not found".to_string(),
        ErrorKind::Parse => "invalid csv".to_string(),
        ErrorKind::Invalid => "invalid impacts".to_string(),
        ErrorKind::Write => "write failed".to_string(),
        ErrorKind::Io => "i/o error".to_string(),
    }
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut cur = err.source();
    while let Some(source) = cur {
        causes.push(source.to_string());
        cur = source.source();
    }
    causes
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    if let Some(path) = err.path() {
        inner.insert("path".to_string(), json!(path.display().to_string()));
    }
    if let Some(line) = err.line() {
        inner.insert("line".to_string(), json!(line));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn error_text(err: &Error, use_color: bool) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "{} {}",
        colorize_label("error:", use_color, AnsiColor::Red),
        error_message(err)
    ));

    if let Some(hint) = err.hint() {
        lines.push(format!(
            "{} {hint}",
            colorize_label("hint:", use_color, AnsiColor::Yellow)
        ));
    }
    if let Some(path) = err.path() {
        lines.push(format!(
            "{} {}",
            colorize_label("path:", use_color, AnsiColor::Yellow),
            path.display()
        ));
    }
    if let Some(line) = err.line() {
        lines.push(format!(
            "{} {line}",
            colorize_label("line:", use_color, AnsiColor::Yellow)
        ));
    }

    let causes = error_causes(err);
    if let Some(cause) = causes.first() {
        lines.push(format!(
            "{} {cause}",
            colorize_label("caused by:", use_color, AnsiColor::Yellow)
        ));
    }

    lines.join("\n")
}

fn clap_error_summary(err: &clap::Error) -> String {
    for line in err.to_string().lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("error:") {
            return rest.trim().to_string();
        }
        return trimmed.to_string();
    }
    "invalid arguments".to_string()
}

fn clap_error_hint(err: &clap::Error) -> String {
    let rendered = err.to_string();
    let usage = rendered
        .lines()
        .find_map(|line| line.trim().strip_prefix("Usage: "))
        .map(str::trim);

    let Some(usage) = usage else {
        return "Try `impact2json --help`.".to_string();
    };

    let tokens: Vec<&str> = usage.split_whitespace().collect();
    let Some(pos) = tokens.iter().position(|t| *t == "impact2json") else {
        return "Try `impact2json --help`.".to_string();
    };

    let parts: Vec<&str> = tokens
        .iter()
        .skip(pos + 1)
        .take_while(|token| {
            !(token.starts_with('-') || token.starts_with('<') || token.starts_with('['))
        })
        .copied()
        .collect();

    if parts.is_empty() {
        return "Try `impact2json --help`.".to_string();
    }
    format!("Try `impact2json {} --help`.", parts.join(" "))
}
