#![forbid(unsafe_code)]

mod output;

use anyhow::{Context as _, Result};
use clap::Parser;
use clap::error::ErrorKind;
use flaggate_core::rules::{self, RulesError};
use flaggate_core::{
    Classifier, ErrorCode, HookInput, PatternError, RuleSet, SessionError, SessionRecorder,
    Suggestions, TicketError,
};
use output::Report;
use std::env;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug, Default)]
#[command(
    author,
    version,
    about = "flaggate: does this ticket need a feature flag?",
    long_about = "Reads a tracker hook payload ({\"tool\": {...}, \"result\": <ticket>}) on stdin \
                  and reports whether the ticket needs a feature flag. Always exits 0.",
    after_help = "EXAMPLES:\n    # Check a fetched ticket\n    flaggate < payload.json\n\n    # Use a custom rule set\n    flaggate --rules team-rules.toml < payload.json"
)]
struct Cli {
    /// Enable verbose logging on stderr.
    #[arg(short, long)]
    verbose: bool,

    /// Rules file to use instead of `.flaggate/rules.toml`.
    #[arg(long, value_name = "PATH")]
    rules: Option<PathBuf>,
}

/// Where the rule set comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
enum RulesSource {
    /// An explicit `--rules` file.
    File(PathBuf),
    /// `.flaggate/rules.toml` under this root, if present.
    Project(PathBuf),
}

impl RulesSource {
    fn load(&self) -> Result<RuleSet> {
        match self {
            Self::File(path) => rules::load_rules_file(path),
            Self::Project(root) => rules::load_project_rules(root),
        }
    }
}

/// One hook invocation: rules to use and where to put the snapshot.
#[derive(Debug)]
struct Hook {
    rules: RulesSource,
    recorder: SessionRecorder,
}

impl Hook {
    fn new(cli: &Cli, project_root: &Path) -> Self {
        let rules = cli.rules.clone().map_or_else(
            || RulesSource::Project(project_root.to_path_buf()),
            RulesSource::File,
        );
        Self {
            rules,
            recorder: SessionRecorder::default(),
        }
    }

    /// Build the classifier, falling back to the built-in rules on any problem.
    fn classifier(&self, out: &mut dyn Write) -> io::Result<Classifier> {
        let rules = match self.rules.load() {
            Ok(rules) => rules,
            Err(err) => {
                warn!(error = %format!("{err:#}"), "falling back to default rules");
                output::render_warning(out, format!("{err:#}; using default rules"))?;
                RuleSet::default()
            }
        };

        match Classifier::new(rules) {
            Ok(classifier) => Ok(classifier),
            Err(err) => {
                warn!(error = %err, "falling back to default rules");
                output::render_warning(out, format!("{err}; using default rules"))?;
                Ok(Classifier::default())
            }
        }
    }

    /// Classify the ticket in `raw` and write the report to `out`.
    fn process(&self, raw: &str, out: &mut dyn Write) -> Result<()> {
        let input = HookInput::from_json(raw)?;
        output::render_header(out, &input.tool.name)?;

        let Some(ticket) = input.ticket()? else {
            output::render_no_ticket(out)?;
            return Ok(());
        };

        let classifier = self.classifier(out)?;
        let classification = classifier.classify(&ticket);
        debug!(
            requires_flag = classification.requires_flag(),
            reasons = classification.reasons().len(),
            "ticket classified"
        );

        let suggestions = Suggestions::for_ticket(&ticket, &classification);
        let session_error = if classification.requires_flag() {
            self.recorder.record(&input.result).err()
        } else {
            None
        };

        Report {
            ticket: &ticket,
            classification: &classification,
            suggestions: suggestions.as_ref(),
            session_error: session_error.as_ref(),
        }
        .render(out)?;

        Ok(())
    }
}

/// Map a failure to its machine code for the error line.
fn error_code(err: &anyhow::Error) -> ErrorCode {
    if let Some(err) = err.downcast_ref::<TicketError>() {
        err.code()
    } else if let Some(err) = err.downcast_ref::<RulesError>() {
        err.code()
    } else if let Some(err) = err.downcast_ref::<PatternError>() {
        err.code()
    } else if let Some(err) = err.downcast_ref::<SessionError>() {
        err.code()
    } else {
        ErrorCode::InternalUnexpected
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("FLAGGATE_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "flaggate=debug,warn"
        } else {
            "flaggate=warn"
        })
    });

    let format = env::var("FLAGGATE_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    // stdout carries the report; logs always go to stderr.
    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(io::stderr))
                .init();
        }
    }
}

/// Parse arguments without ever failing the run.
///
/// `--help` and `--version` print and stop; anything else unparseable is
/// reported and replaced by the defaults.
fn parse_cli(out: &mut dyn Write) -> Option<Cli> {
    match Cli::try_parse() {
        Ok(cli) => Some(cli),
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = err.print();
            None
        }
        Err(err) => {
            let rendered = err.to_string();
            let first_line = rendered.lines().next().unwrap_or_default();
            let _ = output::render_warning(out, format!("ignoring arguments ({first_line})"));
            Some(Cli::default())
        }
    }
}

fn run(cli: &Cli, out: &mut dyn Write) -> Result<()> {
    let project_root = env::current_dir().context("failed to resolve current directory")?;
    let hook = Hook::new(cli, &project_root);

    let mut raw = String::new();
    io::stdin()
        .read_to_string(&mut raw)
        .context("failed to read hook input from stdin")?;

    hook.process(&raw, out)
}

fn main() -> ExitCode {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let Some(cli) = parse_cli(&mut out) else {
        return ExitCode::SUCCESS;
    };
    init_tracing(cli.verbose);

    // Never fail the surrounding workflow: report and exit 0.
    if let Err(err) = run(&cli, &mut out) {
        warn!(error = %format!("{err:#}"), "feature flag check failed");
        let _ = output::render_error(&mut out, error_code(&err), &err);
    }
    let _ = out.flush();

    ExitCode::SUCCESS
}
