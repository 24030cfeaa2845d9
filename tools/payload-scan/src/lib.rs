//! CONTEXT: Payload section scanner for module files
//! INTENT: List every payload record in a module, or find one kind by GUID or name
//! DEPS: nexus-payload-image (section lookup), config (known kinds), report (output)
//! READINESS: Command-line tool; no service dependencies
//! TESTS: Config parsing; text/JSON rendering; CLI over generated ELF objects

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use nexus_payload::{Guid, PayloadError};
use nexus_payload_image::{ModuleImage, OwnedModule, PayloadSource};
use thiserror::Error;

pub mod config;
pub mod report;

pub use config::{Config, ConfigError};
pub use report::{ModuleReport, RecordEntry, Status};

#[derive(Debug, Parser)]
#[command(name = "payload-scan", version)]
#[command(about = "List or find GUID-tagged payload records in module images")]
pub struct Cli {
    /// Module files to scan
    #[arg(required = true)]
    pub modules: Vec<PathBuf>,

    /// Payload kind to find: a GUID, or a kind name from the config
    #[arg(short, long)]
    pub guid: Option<String>,

    /// Fail when one module declares the same kind twice
    #[arg(long)]
    pub strict: bool,

    /// Known payload kinds (defaults to ./payload-scan.toml when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,

    /// More diagnostics on stderr (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Log filter used when `RUST_LOG` is unset.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        }
    }
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("`{0}` is neither a GUID nor a configured kind name")]
    UnknownKind(String),
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}

/// Aggregate result of a run, mapped to the process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    NotFound,
    Failed,
}

impl Outcome {
    pub fn exit_code(self) -> ExitCode {
        match self {
            Self::Success => ExitCode::SUCCESS,
            Self::NotFound => ExitCode::from(1),
            Self::Failed => ExitCode::from(2),
        }
    }

    fn of(reports: &[ModuleReport], searching: bool) -> Self {
        if reports.iter().any(|r| r.status.is_failure()) {
            Self::Failed
        } else if searching && !reports.iter().any(|r| r.status == Status::Found) {
            Self::NotFound
        } else {
            Self::Success
        }
    }
}

/// Scans every module named on the command line and writes the report to `out`.
pub fn run(cli: &Cli, out: &mut dyn Write) -> Result<Outcome, ToolError> {
    let mut config = Config::discover(cli.config.as_deref())?;
    config.strict |= cli.strict;
    let target = match cli.guid.as_deref() {
        Some(arg) => Some(config.resolve(arg).ok_or_else(|| ToolError::UnknownKind(arg.to_owned()))?),
        None => None,
    };

    let reports: Vec<ModuleReport> =
        cli.modules.iter().map(|path| scan_path(path, target, &config)).collect();

    if cli.json {
        serde_json::to_writer_pretty(&mut *out, &reports).map_err(io::Error::from)?;
        writeln!(out)?;
    } else {
        for report in &reports {
            report.write_text(out)?;
        }
    }
    Ok(Outcome::of(&reports, target.is_some()))
}

fn scan_path(path: &Path, target: Option<Guid>, config: &Config) -> ModuleReport {
    let report = ModuleReport::new(path.to_path_buf());
    match OwnedModule::open(path) {
        Ok(module) => scan_bytes(report, module.bytes(), target, config),
        Err(err) => {
            log::warn!("{}: {err}", path.display());
            report.fail(Status::Invalid, err)
        }
    }
}

/// Scans one module's bytes; `target` selects find mode.
pub fn scan_bytes(mut report: ModuleReport, bytes: &[u8], target: Option<Guid>, config: &Config) -> ModuleReport {
    let image = match ModuleImage::parse(bytes) {
        Ok(image) => image,
        Err(err) => return report.fail(Status::Invalid, err),
    };
    report.format = Some(image.format().to_string());
    // An empty section counts as absent.
    if image.payload_section().map_or(true, <[u8]>::is_empty) {
        return report.fail(Status::SectionAbsent, PayloadError::SectionAbsent);
    }

    match target {
        Some(identity) => {
            let found = if config.strict { image.find_unique(identity) } else { image.find_record(identity) };
            match found {
                Ok(view) => report.records.push(RecordEntry::from_view(&view, config)),
                Err(err) => return fail_with(report, err),
            }
        }
        None => {
            let mut seen: Vec<Guid> = Vec::new();
            for record in image.records() {
                match record {
                    Ok(view) => {
                        if seen.contains(&view.identity()) {
                            log::warn!("{}: kind {} declared twice", report.path.display(), view.identity());
                            if config.strict {
                                let detail = format!("kind {} declared twice", view.identity());
                                report.records.push(RecordEntry::from_view(&view, config));
                                return report.fail(Status::Duplicate, detail);
                            }
                        }
                        seen.push(view.identity());
                        report.records.push(RecordEntry::from_view(&view, config));
                    }
                    // Records before the corruption stay in the report.
                    Err(err) => return report.fail(Status::Corrupt, err),
                }
            }
        }
    }
    report
}

fn fail_with(report: ModuleReport, err: nexus_payload_image::Error) -> ModuleReport {
    let status = match &err {
        nexus_payload_image::Error::Payload(PayloadError::SectionAbsent) => Status::SectionAbsent,
        nexus_payload_image::Error::Payload(PayloadError::RecordNotFound) => Status::NotFound,
        nexus_payload_image::Error::Payload(PayloadError::CorruptRecord { .. }) => Status::Corrupt,
        nexus_payload_image::Error::Payload(PayloadError::DuplicateIdentity { .. }) => Status::Duplicate,
        _ => Status::Invalid,
    };
    report.fail(status, err)
}
