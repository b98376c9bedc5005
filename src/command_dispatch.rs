//! Purpose: Hold top-level CLI command dispatch for `impact2json`.
//! Exports: `dispatch_command`.
//! Role: Keep `main.rs` focused on parse/bootstrap and delegate command execution.
//! Invariants: Output envelopes and exit code semantics stay stable per command.
//! Invariants: Conversion logic lives in the library; this module only wires it up.

use super::report_json::{
    convert_summary_json, impact_stats_json, padded_notice_json, validation_report_json,
};
use super::*;
use impact2json::api::{
    ConvertConfig, Dataset, check_impacts, impact_stats, load_dataset, write_dataset,
};

pub(super) fn dispatch_command(
    command: Command,
    color_mode: ColorMode,
) -> Result<RunOutcome, Error> {
    match command {
        Command::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::aot::generate(shell, &mut cmd, "impact2json", &mut io::stdout());
            Ok(RunOutcome::ok())
        }
        Command::Version => {
            emit_version_output();
            Ok(RunOutcome::ok())
        }
        Command::Convert(args) => {
            let config = ConvertConfig::new(&args.source.input, &args.output)
                .with_read(args.source.read_options())
                .with_create_dirs(args.create_dirs);
            let dataset = load_source(&config.input, &config.read, "convert", color_mode)?;
            if args.check {
                let report = check_impacts(&dataset);
                if !report.is_ok() {
                    let first = report
                        .issues
                        .first()
                        .map(|issue| issue.message.clone())
                        .unwrap_or_default();
                    return Err(Error::new(ErrorKind::Invalid)
                        .with_message(format!(
                            "{} impact issue(s); first: {first}",
                            report.issue_count
                        ))
                        .with_path(&config.input)
                        .with_hint(
                            "Run `impact2json check` to list every issue; nothing was written.",
                        ));
                }
            }
            let summary = write_dataset(&dataset, &config)?;
            emit_json(convert_summary_json(&summary));
            Ok(RunOutcome::ok())
        }
        Command::Check { source } => {
            let options = source.read_options();
            let dataset = load_source(&source.input, &options, "check", color_mode)?;
            let report = check_impacts(&dataset);
            emit_json(validation_report_json(&source.input, &report));
            let exit_code = if report.is_ok() {
                0
            } else {
                to_exit_code(ErrorKind::Invalid)
            };
            Ok(RunOutcome::with_code(exit_code))
        }
        Command::Stats { source } => {
            let options = source.read_options();
            let dataset = load_source(&source.input, &options, "stats", color_mode)?;
            let stats = impact_stats(&dataset)?;
            emit_json(impact_stats_json(&stats));
            Ok(RunOutcome::ok())
        }
    }
}

fn load_source(
    input: &Path,
    options: &ReadOptions,
    cmd: &str,
    color_mode: ColorMode,
) -> Result<Dataset, Error> {
    let dataset = load_dataset(input, options)?;
    if dataset.padded_rows() > 0 {
        let time = notice_time_now().unwrap_or_default();
        emit_notice(
            &padded_notice_json(cmd, input, dataset.padded_rows(), &time),
            color_mode,
        );
    }
    Ok(dataset)
}
