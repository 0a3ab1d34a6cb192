//! Results collection over a settings tree.
//!
//! A sweep root contains one subdirectory per experimental setting (`1-1`,
//! `2-3`, ..., `base`); each holds files named `<grammar>.<div>.test.txt`
//! whose contents carry a `Perplexity:` marker. One row per file.

use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use clap::ValueEnum;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Error, Result};

/// Filename suffixes recognized as evaluation outputs.
pub const TEST_SUFFIXES: [&str; 3] = [".0.test.txt", ".1.test.txt", ".2.test.txt"];

/// Model family, selecting which settings the sweep covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModelFamily {
    Lstm,
    Transformer,
}

impl ModelFamily {
    /// The fixed list of settings run for this family.
    pub fn settings(self) -> &'static [&'static str] {
        match self {
            ModelFamily::Lstm => &[
                "1-1", "1-2", "1-3", "2-1", "2-2", "2-3", "3-1", "3-2", "4-1", "5-1", "5-2",
                "6-1", "6-2", "6-3", "7-1", "7-2", "7-3", "8-1", "8-2", "base",
            ],
            ModelFamily::Transformer => &[
                "1-1", "1-2", "1-3", "3-1", "3-2", "4-1", "12-1", "12-2", "13-1", "5-1", "5-2",
                "6-1", "6-2", "6-3", "7-1", "7-2", "7-3", "8-1", "8-2", "base",
            ],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ModelFamily::Lstm => "lstm",
            ModelFamily::Transformer => "transformer",
        }
    }
}

/// One evaluated (setting, div, grammar) cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepRecord {
    pub setting: String,
    pub div: String,
    pub grammar: String,
    pub perplexity: f64,
}

static PPL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Perplexity:\s*(?P<ppl>[0-9]+(?:\.[0-9]+)?)").unwrap());

/// Extract the perplexity from one evaluation output file.
pub fn extract_perplexity(text: &str) -> Result<f64> {
    PPL_RE
        .captures(text)
        .and_then(|caps| caps["ppl"].parse::<f64>().ok())
        .ok_or_else(|| Error::parse("no 'Perplexity:' marker found"))
}

/// Collect all evaluation results under `root` for the given family.
///
/// Missing setting directories are skipped with a notice; files whose
/// contents lack the marker are skipped with a warning. An entirely empty
/// result set is an error.
pub fn collect_results(root: &Path, family: ModelFamily) -> Result<Vec<SweepRecord>> {
    let mut records = Vec::new();

    for setting in family.settings() {
        let setting_dir = root.join(setting);
        if !setting_dir.is_dir() {
            info!("skipping missing directory: {}", setting_dir.display());
            continue;
        }

        let mut filenames: Vec<String> = fs::read_dir(&setting_dir)?
            .collect::<std::io::Result<Vec<_>>>()?
            .into_iter()
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| TEST_SUFFIXES.iter().any(|s| name.ends_with(s)))
            .collect();
        filenames.sort();

        for name in filenames {
            // <grammar>.<div>.test.txt
            let parts: Vec<&str> = name.split('.').collect();
            if parts.len() < 3 {
                warn!("unexpected file name format: {name}");
                continue;
            }
            let path = setting_dir.join(&name);
            match fs::read_to_string(&path)
                .map_err(Error::from)
                .and_then(|text| extract_perplexity(&text))
            {
                Ok(perplexity) => records.push(SweepRecord {
                    setting: (*setting).to_owned(),
                    div: parts[1].to_owned(),
                    grammar: parts[0].to_owned(),
                    perplexity,
                }),
                Err(err) => warn!("skipped {}: {err}", path.display()),
            }
        }
    }

    if records.is_empty() {
        return Err(Error::parse("no valid perplexity scores found in any files"));
    }
    Ok(records)
}

/// Write sweep records as `setting,div,grammar,perplexity` CSV.
pub fn write_results(path: &Path, records: &[SweepRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}
