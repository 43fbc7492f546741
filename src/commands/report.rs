use std::fs;
use std::path::PathBuf;

use crate::config::{Config, EngineEnv};
use crate::error::AppError;
use crate::model::{ContentType, ReportKind, VulnType};
use crate::reports::plan_reports;
use crate::runner::{RunOutcome, write_output_to_file};
use crate::utils::describe_file;

pub struct ReportOptions {
    pub config: Config,
    pub image: String,
    pub reports: Vec<ReportKind>,
    pub content_types: Vec<ContentType>,
    pub vuln_type: VulnType,
}

/// Write one JSON file per selected report. Every report is attempted even
/// after a failure; the run fails afterwards if any report could not be produced.
pub fn execute_report(options: ReportOptions) -> Result<Vec<PathBuf>, AppError> {
    let output_dir = &options.config.output_dir;
    let env = EngineEnv::from_process();
    fs::create_dir_all(output_dir)?;

    let jobs =
        plan_reports(&options.image, &options.reports, &options.content_types, options.vuln_type);

    let mut written = Vec::new();
    let mut failed = Vec::new();
    for job in jobs {
        let destination = job.destination(output_dir);
        match write_output_to_file(&job.command, &env, &destination, job.ignore_exit_code)? {
            RunOutcome::Written { path, bytes } => {
                println!("Successfully generated {}.", describe_file(&path, bytes));
                written.push(path);
            }
            RunOutcome::Failed { status, output } => {
                println!(
                    "Failed to generate {} ({} report). '{}' exited with {}",
                    job.file_name, job.kind, job.command, status
                );
                if !output.trim().is_empty() {
                    println!("{}", output.trim_end());
                }
                failed.push(job.file_name);
            }
        }
    }

    if failed.is_empty() { Ok(written) } else { Err(AppError::ReportsFailed(failed)) }
}
