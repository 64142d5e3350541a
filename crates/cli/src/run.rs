//! `mergeguard run` / `mergeguard validate`: TOML-driven merges.

use std::io;
use std::path::{Path, PathBuf};

use mergeguard_merge::{merge, MergeError, MergeJob, MergeResult, NullSink, ReportSink};

use crate::exit_codes::{merge_exit_code, EXIT_IO};
use crate::report::ConsoleSink;
use crate::CliError;

fn io_err(msg: impl Into<String>) -> CliError {
    CliError { code: EXIT_IO, message: msg.into(), hint: None }
}

fn merge_err(err: MergeError) -> CliError {
    let hint = match &err {
        MergeError::AmbiguousColumnOverlap { .. } => {
            Some("set [output] suffixes, or drop the column from one input".to_string())
        }
        MergeError::KeyTypeMismatch { .. } => {
            Some("pin the key column type under [left.types] or [right.types]".to_string())
        }
        MergeError::NonUniqueKey { side, .. } => {
            Some(format!("declare 'm' for the {side} side if duplicate keys are expected"))
        }
        MergeError::EmptyIntersection { .. } => {
            Some("set matches_required = false under [validate] to allow disjoint keys".to_string())
        }
        MergeError::IndicatorCollision { .. } => Some("choose another [output] indicator name".to_string()),
        _ => None,
    };
    CliError { code: merge_exit_code(&err), message: err.to_string(), hint }
}

fn load_job(job_path: &Path) -> Result<MergeJob, CliError> {
    let job_str = std::fs::read_to_string(job_path)
        .map_err(|e| io_err(format!("cannot read job {}: {e}", job_path.display())))?;
    MergeJob::from_toml(&job_str).map_err(merge_err)
}

/// Stats summary written by `--json` / `--output`.
fn stats_json(job: &MergeJob, result: &MergeResult, output_file: Option<&Path>) -> serde_json::Value {
    serde_json::json!({
        "name": job.name,
        "stats": result.stats,
        "output": output_file.map(|p| p.display().to_string()),
    })
}

pub fn cmd_run(job_path: PathBuf, json_output: bool, output_file: Option<PathBuf>, quiet: bool) -> Result<(), CliError> {
    let job = load_job(&job_path)?;

    // Files resolve relative to the job file's directory
    let base_dir = job_path.parent().unwrap_or_else(|| Path::new("."));
    let left_hints = job.left.type_hints().map_err(merge_err)?;
    let right_hints = job.right.type_hints().map_err(merge_err)?;
    let left = mergeguard_io::read_table(&base_dir.join(&job.left.file), &left_hints).map_err(io_err)?;
    let right = mergeguard_io::read_table(&base_dir.join(&job.right.file), &right_hints).map_err(io_err)?;

    let mut options = job.options().map_err(merge_err)?;
    options.quiet |= quiet;

    let mut console = ConsoleSink::new(io::stderr());
    let mut silent = NullSink;
    let sink: &mut dyn ReportSink = if quiet { &mut silent } else { &mut console };
    let result = merge(&left, &right, &options, sink).map_err(merge_err)?;

    let written = match job.output.file {
        Some(ref file) => {
            let path = base_dir.join(file);
            let ext = path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase);
            match ext.as_deref() {
                Some("json") => mergeguard_io::json::export(&result.table, &path).map_err(io_err)?,
                Some("tsv") => mergeguard_io::csv::write_table_tsv(&result.table, &path).map_err(io_err)?,
                _ => mergeguard_io::write_table(&result.table, &path).map_err(io_err)?,
            }
            if !quiet {
                eprintln!("wrote {} ({} rows)", path.display(), result.table.len());
            }
            Some(path)
        }
        None => None,
    };

    let summary = stats_json(&job, &result, written.as_deref());
    let json_str = serde_json::to_string_pretty(&summary)
        .map_err(|e| io_err(format!("JSON serialization error: {e}")))?;

    if let Some(ref path) = output_file {
        std::fs::write(path, &json_str).map_err(|e| io_err(format!("cannot write output: {e}")))?;
        if !quiet {
            eprintln!("wrote {}", path.display());
        }
    }

    if json_output {
        println!("{json_str}");
    }

    Ok(())
}

pub fn cmd_validate(job_path: PathBuf) -> Result<(), CliError> {
    let job = load_job(&job_path)?;
    let options = job.options().map_err(merge_err)?;
    let keys = options
        .keys
        .on
        .as_ref()
        .map(|k| k.0.join(", "))
        .unwrap_or_else(|| {
            let side = |k: &Option<mergeguard_merge::Keys>| k.as_ref().map(|k| k.0.join(", ")).unwrap_or_default();
            format!("{} / {}", side(&options.keys.left_on), side(&options.keys.right_on))
        });
    eprintln!(
        "valid: merge '{}' ({} {}) on {}",
        job.name, options.how, options.mergetype, keys
    );
    Ok(())
}
