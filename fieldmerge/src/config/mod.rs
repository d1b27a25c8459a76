//! Merge configuration.
//!
//! [`MergeConfig`] is the loose, serializable form: every field has a default,
//! paths may be missing, and it can be layered from a JSON file, environment
//! variables and command-line flags. [`MergeConfig::validate`] turns it into
//! [`MergeSettings`], the checked and immutable bundle the pipeline consumes.
//!
//! # Config file
//!
//! ```json
//! {
//!   "sourcePath": "catalog.csv",
//!   "inputPath": "updates.csv",
//!   "sourceDelimiter": ";",
//!   "inputEncoding": "windows-1252",
//!   "sourceMatchBy": 0,
//!   "sourceField": 4,
//!   "inputMatchBy": 2,
//!   "inputField": 1
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, ConfigResult};
use crate::models::Delimiter;
use crate::parser::encoding::{encoding_for_label, AUTO};
use crate::transform::merge::FieldMapping;

/// File name looked up when no `--config` is given.
pub const CONFIG_FILE_NAME: &str = "fieldmerge.json";

/// Layered, unvalidated configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct MergeConfig {
    pub source_path: Option<PathBuf>,
    pub input_path: Option<PathBuf>,
    pub output_path: Option<PathBuf>,

    pub source_delimiter: String,
    pub input_delimiter: String,
    pub output_delimiter: String,

    pub source_encoding: String,
    pub input_encoding: String,
    pub output_encoding: String,

    pub source_match_by: usize,
    pub source_field: usize,
    pub input_match_by: usize,
    pub input_field: usize,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            source_path: None,
            input_path: None,
            output_path: None,
            source_delimiter: ",".to_string(),
            input_delimiter: ",".to_string(),
            output_delimiter: ",".to_string(),
            source_encoding: "utf-8".to_string(),
            input_encoding: "utf-8".to_string(),
            output_encoding: "utf-8".to_string(),
            source_match_by: 0,
            source_field: 1,
            input_match_by: 0,
            input_field: 1,
        }
    }
}

/// Optional values that replace fields of a [`MergeConfig`].
///
/// Filled from command-line flags and environment variables.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub source_path: Option<PathBuf>,
    pub input_path: Option<PathBuf>,
    pub output_path: Option<PathBuf>,
    pub source_delimiter: Option<String>,
    pub input_delimiter: Option<String>,
    pub output_delimiter: Option<String>,
    pub source_encoding: Option<String>,
    pub input_encoding: Option<String>,
    pub output_encoding: Option<String>,
    pub source_match_by: Option<usize>,
    pub source_field: Option<usize>,
    pub input_match_by: Option<usize>,
    pub input_field: Option<usize>,
}

/// Validated settings for one merge run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeSettings {
    pub source: FileSettings,
    pub input: FileSettings,
    pub output: FileSettings,
    pub mapping: FieldMapping,
}

/// Path, delimiter and encoding label of one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSettings {
    pub path: PathBuf,
    pub delimiter: Delimiter,
    /// WHATWG label, or `auto` for source and input.
    pub encoding: String,
}

impl MergeConfig {
    /// Load a JSON config file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `explicit` if given, else the first discovered config file, else defaults.
    pub fn load(explicit: Option<&Path>) -> ConfigResult<(Self, Option<PathBuf>)> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => discover(),
        };
        match path {
            Some(path) => Ok((Self::from_file(&path)?, Some(path))),
            None => Ok((Self::default(), None)),
        }
    }

    /// Replace every field the overrides set.
    pub fn apply(&mut self, overrides: ConfigOverrides) {
        fn set<T>(slot: &mut T, value: Option<T>) {
            if let Some(value) = value {
                *slot = value;
            }
        }

        if overrides.source_path.is_some() {
            self.source_path = overrides.source_path;
        }
        if overrides.input_path.is_some() {
            self.input_path = overrides.input_path;
        }
        if overrides.output_path.is_some() {
            self.output_path = overrides.output_path;
        }
        set(&mut self.source_delimiter, overrides.source_delimiter);
        set(&mut self.input_delimiter, overrides.input_delimiter);
        set(&mut self.output_delimiter, overrides.output_delimiter);
        set(&mut self.source_encoding, overrides.source_encoding);
        set(&mut self.input_encoding, overrides.input_encoding);
        set(&mut self.output_encoding, overrides.output_encoding);
        set(&mut self.source_match_by, overrides.source_match_by);
        set(&mut self.source_field, overrides.source_field);
        set(&mut self.input_match_by, overrides.input_match_by);
        set(&mut self.input_field, overrides.input_field);
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Check every value and resolve the output path.
    pub fn validate(&self) -> ConfigResult<MergeSettings> {
        let source_path = existing_file("source", self.source_path.as_deref())?;
        let input_path = existing_file("input", self.input_path.as_deref())?;

        let output_path = match &self.output_path {
            Some(path) => path.clone(),
            None => default_output_path(&source_path),
        };
        if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.is_dir() {
                return Err(ConfigError::NotFound {
                    field: "output directory",
                    path: parent.to_path_buf(),
                });
            }
        }

        Ok(MergeSettings {
            source: FileSettings {
                path: source_path,
                delimiter: delimiter("source", &self.source_delimiter)?,
                encoding: encoding("source", &self.source_encoding, true)?,
            },
            input: FileSettings {
                path: input_path,
                delimiter: delimiter("input", &self.input_delimiter)?,
                encoding: encoding("input", &self.input_encoding, true)?,
            },
            output: FileSettings {
                path: output_path,
                delimiter: delimiter("output", &self.output_delimiter)?,
                encoding: encoding("output", &self.output_encoding, false)?,
            },
            mapping: FieldMapping {
                source_match_by: self.source_match_by,
                source_field: self.source_field,
                input_match_by: self.input_match_by,
                input_field: self.input_field,
            },
        })
    }
}

/// `fieldmerge.json` in the working directory, then next to the executable.
pub fn discover() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok().map(|dir| dir.join(CONFIG_FILE_NAME));
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(CONFIG_FILE_NAME)));

    cwd.into_iter().chain(exe_dir).find(|path| path.is_file())
}

/// `<dir>/<stem>.merged.<ext>` beside the source file.
pub fn default_output_path(source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    let name = match source.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{}.merged.{}", stem, ext),
        None => format!("{}.merged", stem),
    };
    source.with_file_name(name)
}

fn existing_file(field: &'static str, path: Option<&Path>) -> ConfigResult<PathBuf> {
    let path = path.ok_or(ConfigError::MissingPath(field))?;
    if !path.is_file() {
        return Err(ConfigError::NotFound {
            field,
            path: path.to_path_buf(),
        });
    }
    Ok(path.to_path_buf())
}

fn delimiter(field: &'static str, value: &str) -> ConfigResult<Delimiter> {
    Delimiter::new(value).map_err(|_| ConfigError::InvalidDelimiter {
        field,
        value: value.to_string(),
    })
}

fn encoding(field: &'static str, value: &str, allow_auto: bool) -> ConfigResult<String> {
    let label = value.trim();
    if allow_auto && label.eq_ignore_ascii_case(AUTO) {
        return Ok(AUTO.to_string());
    }
    let unsupported = || ConfigError::UnsupportedEncoding {
        field,
        value: value.to_string(),
    };
    let encoding = encoding_for_label(label).map_err(|_| unsupported())?;
    // no encoder exists for `replacement`
    if !allow_auto && encoding == encoding_rs::REPLACEMENT {
        return Err(unsupported());
    }
    Ok(label.to_string())
}
