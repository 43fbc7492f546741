use std::time::Duration;

use anchore_ci::commands::analyze::AnalyzeOptions;
use anchore_ci::commands::report::ReportOptions;
use anchore_ci::commands::setup::SetupOptions;
use anchore_ci::commands::{execute_analyze, execute_report, execute_setup};
use anchore_ci::config::Config;
use anchore_ci::error::AppError;
use anchore_ci::logging::init_tracing;
use anchore_ci::model::{Choice, ContentType, ReportKind, VulnType, resolve_choices};
use clap::{ArgAction, CommandFactory, Parser};
use tracing::debug;

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // --help and --version are reported through clap as well.
            let code = if err.use_stderr() { 1 } else { 0 };
            let _ = err.print();
            std::process::exit(code);
        }
    };

    init_tracing(cli.verbose);

    if let Err(err) = run(cli) {
        if matches!(err, AppError::Usage(_)) {
            let _ = Cli::command().print_help();
            eprintln!();
        }
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), AppError> {
    let plan = plan(&cli)?;
    let config = Config::load()?;
    debug!("Effective configuration:\n{}", config.to_toml()?);
    let timeout = Duration::from_secs(cli.timeout);

    match plan {
        Plan::Setup => execute_setup(SetupOptions { config, timeout })?,
        Plan::Image { image, analyze, report } => {
            if analyze {
                let options =
                    AnalyzeOptions { config: config.clone(), image: image.clone(), timeout };
                execute_analyze(options)?;
            }
            if report {
                let options = ReportOptions {
                    config,
                    image,
                    reports: resolve_choices(&cli.report_types, &ReportKind::ALL),
                    content_types: resolve_choices(&cli.content_types, &ContentType::ALL),
                    vuln_type: cli.vuln_type,
                };
                execute_report(options)?;
            }
        }
    }

    Ok(())
}

#[derive(Parser)]
#[command(
    name = "anchore-ci",
    version,
    about = "Automate Anchore engine setup, image analysis and report generation in CI pipelines."
)]
struct Cli {
    /// Analyze the image with the Anchore engine.
    #[arg(short = 'a', long = "analyze", action = ArgAction::SetTrue)]
    analyze: bool,

    /// Generate reports on the analyzed image.
    #[arg(short = 'r', long = "report", action = ArgAction::SetTrue)]
    report: bool,

    /// Set up and start the Anchore engine on this container.
    #[arg(short = 's', long = "setup", action = ArgAction::SetTrue)]
    setup: bool,

    /// Image name. Required for --analyze and --report.
    #[arg(long = "image", value_name = "IMAGE")]
    image: Option<String>,

    /// Timeout in seconds for engine setup and image analysis.
    #[arg(long = "timeout", value_name = "SECONDS", default_value_t = 300)]
    timeout: u64,

    /// Content reports to generate (os, npm, gem, python, java, all). Used with --type content.
    #[arg(long = "content", value_name = "TYPE", num_args = 1.., default_value = "all")]
    content_types: Vec<Choice<ContentType>>,

    /// Report types to generate (content, vuln, details, policy, all).
    #[arg(long = "type", value_name = "KIND", num_args = 1.., default_value = "all")]
    report_types: Vec<Choice<ReportKind>>,

    /// Vulnerability report to generate (all, non-os, os).
    #[arg(long = "vuln", value_name = "TYPE", default_value = "all")]
    vuln_type: VulnType,

    /// Show debug logging on stderr.
    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,
}

enum Plan {
    Setup,
    Image { image: String, analyze: bool, report: bool },
}

fn plan(cli: &Cli) -> Result<Plan, AppError> {
    let image_action = cli.analyze || cli.report;

    if !cli.setup && !image_action && cli.image.is_none() {
        return Err(AppError::usage("Must specify at least one option."));
    }
    if cli.setup && (image_action || cli.image.is_some()) {
        return Err(AppError::usage(
            "Cannot analyze image or generate reports until engine is setup.",
        ));
    }
    if cli.setup {
        return Ok(Plan::Setup);
    }

    match &cli.image {
        None => Err(AppError::usage(
            "Cannot analyze image or generate a report without specifying an image name.",
        )),
        Some(_) if !image_action => Err(AppError::usage(
            "Must specify an action to perform on image. Please include --report or --analyze.",
        )),
        Some(image) => {
            Ok(Plan::Image { image: image.clone(), analyze: cli.analyze, report: cli.report })
        }
    }
}
