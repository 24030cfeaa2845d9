// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Known payload kinds, loaded from `payload-scan.toml`.

use std::path::{Path, PathBuf};

use nexus_payload::Guid;
use serde::Deserialize;
use thiserror::Error;

/// File picked up from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG: &str = "payload-scan.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("kind `{kind}` has an invalid guid `{value}`")]
    BadGuid { kind: String, value: String },
    #[error("kind `{0}` is declared twice")]
    DuplicateName(String),
    #[error("kinds `{first}` and `{second}` share guid {guid}")]
    SharedGuid { guid: Guid, first: String, second: String },
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    strict: bool,
    #[serde(default, rename = "kind")]
    kinds: Vec<RawKind>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawKind {
    name: String,
    guid: String,
}

/// A named payload kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Kind {
    pub name: String,
    pub guid: Guid,
}

/// Scanner settings plus the table of known kinds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// Treat a repeated identity within one module as an error.
    pub strict: bool,
    kinds: Vec<Kind>,
}

impl Config {
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(text)?;
        let mut kinds: Vec<Kind> = Vec::with_capacity(raw.kinds.len());
        for RawKind { name, guid } in raw.kinds {
            let parsed: Guid = guid
                .parse()
                .map_err(|_| ConfigError::BadGuid { kind: name.clone(), value: guid.clone() })?;
            if kinds.iter().any(|k| k.name == name) {
                return Err(ConfigError::DuplicateName(name));
            }
            // Two kinds must never share an identity.
            if let Some(existing) = kinds.iter().find(|k| k.guid == parsed) {
                return Err(ConfigError::SharedGuid {
                    guid: parsed,
                    first: existing.name.clone(),
                    second: name,
                });
            }
            kinds.push(Kind { name, guid: parsed });
        }
        Ok(Self { strict: raw.strict, kinds })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        let config = Self::parse(&text)?;
        log::debug!("loaded {} payload kinds from {}", config.kinds.len(), path.display());
        Ok(config)
    }

    /// Loads `explicit`, else [`DEFAULT_CONFIG`] if it exists, else defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG);
                if fallback.is_file() {
                    Self::load(fallback)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn kinds(&self) -> &[Kind] {
        &self.kinds
    }

    pub fn kind_name(&self, guid: Guid) -> Option<&str> {
        self.kinds.iter().find(|k| k.guid == guid).map(|k| k.name.as_str())
    }

    /// Resolves a `--guid` argument: GUID text first, then a kind name.
    pub fn resolve(&self, arg: &str) -> Option<Guid> {
        arg.parse::<Guid>()
            .ok()
            .or_else(|| self.kinds.iter().find(|k| k.name == arg).map(|k| k.guid))
    }
}
