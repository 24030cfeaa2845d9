// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Per-module scan results and their text rendering.

use std::io::{self, Write};
use std::path::PathBuf;

use nexus_payload::RecordView;
use serde::Serialize;

use crate::config::Config;

/// Longest label preview printed in text mode.
const PREVIEW_CHARS: usize = 48;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    /// Listing succeeded, or the requested kind was found.
    Found,
    SectionAbsent,
    NotFound,
    Corrupt,
    Duplicate,
    /// The file could not be read or is not a module.
    Invalid,
}

impl Status {
    /// Statuses that make the whole run fail.
    pub fn is_failure(self) -> bool {
        matches!(self, Self::Corrupt | Self::Duplicate | Self::Invalid)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordEntry {
    pub offset: usize,
    pub identity: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub region_length: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl RecordEntry {
    pub fn from_view(view: &RecordView<'_>, config: &Config) -> Self {
        Self {
            offset: view.offset,
            identity: view.identity().to_string(),
            kind: config.kind_name(view.identity()).map(str::to_owned),
            region_length: view.header.region_length,
            label: view.label().ok().filter(|text| !text.is_empty()).map(str::to_owned),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleReport {
    pub path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    pub status: Status,
    pub records: Vec<RecordEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ModuleReport {
    pub fn new(path: PathBuf) -> Self {
        Self { path, format: None, status: Status::Found, records: Vec::new(), detail: None }
    }

    pub fn fail(mut self, status: Status, detail: impl ToString) -> Self {
        self.status = status;
        self.detail = Some(detail.to_string());
        self
    }

    pub fn write_text(&self, out: &mut dyn Write) -> io::Result<()> {
        let path = self.path.display();
        let format = self.format.as_deref().map(|f| format!(" ({f})")).unwrap_or_default();
        match self.status {
            Status::SectionAbsent => return writeln!(out, "{path}{format}: no payload section"),
            Status::NotFound => return writeln!(out, "{path}{format}: not found"),
            Status::Found => writeln!(out, "{path}{format}: {} record(s)", self.records.len())?,
            Status::Corrupt | Status::Duplicate | Status::Invalid => {
                let detail = self.detail.as_deref().unwrap_or("error");
                writeln!(out, "{path}{format}: {detail}")?;
            }
        }
        for record in &self.records {
            write!(
                out,
                "  {:#06x}  {}  {:<16}  {:>5} bytes",
                record.offset,
                record.identity,
                record.kind.as_deref().unwrap_or("-"),
                record.region_length
            )?;
            match &record.label {
                Some(label) => writeln!(out, "  \"{}\"", preview(label))?,
                None => writeln!(out)?,
            }
        }
        Ok(())
    }
}

fn preview(label: &str) -> String {
    if label.chars().count() <= PREVIEW_CHARS {
        return label.escape_default().to_string();
    }
    let cut: String = label.chars().take(PREVIEW_CHARS).collect();
    format!("{}...", cut.escape_default())
}
