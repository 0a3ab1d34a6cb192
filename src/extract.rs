//! Perplexity extraction from fairseq training and evaluation logs.
//!
//! Training logs are pipe-delimited progress lines; evaluation logs are
//! free-text with a `Perplexity:` marker. Each log file yields one
//! [`RunRecord`]. Directory scans are batch operations: a file that fails to
//! parse is reported and skipped, the batch continues.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use clap::ValueEnum;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::grammar::Formation;

/// Which kind of log a directory holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExtractMode {
    /// Fairseq training logs (`*.out`).
    Train,
    /// Fairseq eval-lm logs (`*.txt`).
    Test,
}

impl ExtractMode {
    fn suffix(self) -> &'static str {
        match self {
            ExtractMode::Train => ".out",
            ExtractMode::Test => ".txt",
        }
    }
}

/// One parsed run. Column order matches the aggregated CSV schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub formation: Formation,
    pub grammar: String,
    /// Data-split index (the part of the dataset directory before `-`).
    pub div: String,
    pub model: String,
    #[serde(rename = "ppl-10-epochs")]
    pub ppl_at_epoch_10: Option<f64>,
    pub final_ppl: f64,
    #[serde(rename = "if_finished")]
    pub finished: bool,
}

/// Trailing data-directory path on the data-loading line.
static DATA_DIR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"fairseq\.data\.data_utils.*?(?P<dir>\S+)\s*$").unwrap()
});

/// Perplexity value reported by fairseq's eval tool.
static EVAL_PPL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Perplexity:\s*(?P<ppl>[0-9]+(?:\.[0-9]+)?)").unwrap());

/// Dataset path on the eval tool's "examples from:" line.
static EXAMPLES_FROM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"examples from:\s*(?P<path>\S+)").unwrap());

/// Decompose a data-directory path into (formation, grammar, split).
///
/// The layout is `data-bin/<formation>/<grammar>/<split>-<name>/...`, so the
/// literal segments at indices 1..=3 carry the run metadata.
fn decompose_data_dir(dir: &str, min_segments: usize) -> Result<(Formation, String, String)> {
    let parts: Vec<&str> = dir.split('/').collect();
    if parts.len() < min_segments {
        return Err(Error::parse(format!(
            "data path '{dir}' has {} segments, expected at least {min_segments}",
            parts.len()
        )));
    }
    let formation: Formation = parts[1].parse()?;
    let grammar = parts[2].to_owned();
    let div = parts[3]
        .split('-')
        .next()
        .unwrap_or(parts[3])
        .to_owned();
    Ok((formation, grammar, div))
}

/// Model name embedded in a log filename, e.g. `train_lstm-42.out` -> `lstm`.
pub fn model_from_filename(filename: &str) -> String {
    filename
        .split('-')
        .next()
        .unwrap_or(filename)
        .split('_')
        .next_back()
        .unwrap_or(filename)
        .to_owned()
}

/// Parse one fairseq training log.
///
/// Only lines with at least four pipe-delimited fields are considered. Every
/// field whose tokens include `ppl` contributes its trailing numeric token;
/// the last one seen is the final perplexity. The validation line for epoch
/// 010 supplies the mid-training checkpoint value when present.
pub fn parse_train_log(text: &str, filename: &str) -> Result<RunRecord> {
    let mut ppls: Vec<f64> = Vec::new();
    let mut ppl_at_epoch_10 = None;
    let mut data_dir: Option<String> = None;
    let mut finished = false;

    for line in text.lines() {
        let fields: Vec<&str> = line.split('|').collect();
        if fields.len() <= 3 {
            continue;
        }

        let mut line_last_ppl = None;
        for field in &fields {
            let tokens: Vec<&str> = field.split_whitespace().collect();
            if tokens.iter().any(|t| *t == "ppl") {
                if let Some(value) = tokens.last().and_then(|t| t.parse::<f64>().ok()) {
                    ppls.push(value);
                    line_last_ppl = Some(value);
                }
            }
        }

        if line.contains("valid") && line.contains("epoch 010") {
            if let Some(value) = line_last_ppl {
                ppl_at_epoch_10 = Some(value);
            }
        }

        if let Some(caps) = DATA_DIR_RE.captures(line) {
            data_dir = Some(caps["dir"].to_owned());
        }

        if line.contains("done training") {
            finished = true;
        }
    }

    let final_ppl = *ppls
        .last()
        .ok_or_else(|| Error::parse("no perplexity scores found in the log file"))?;
    let data_dir =
        data_dir.ok_or_else(|| Error::parse("no data directory found in the log file"))?;
    let (formation, grammar, div) = decompose_data_dir(&data_dir, 4)?;

    Ok(RunRecord {
        formation,
        grammar,
        div,
        model: model_from_filename(filename),
        ppl_at_epoch_10,
        final_ppl,
        finished,
    })
}

/// Parse one fairseq eval-lm log.
///
/// The perplexity sits on the last line that carries both the eval-tool
/// marker and `Perplexity:`; the dataset path sits on the `examples from:`
/// line and must have at least five `/`-segments.
pub fn parse_test_log(text: &str, filename: &str) -> Result<RunRecord> {
    let ppl_line = text
        .lines()
        .rev()
        .find(|l| l.contains("fairseq_cli.eval_lm") && l.contains("Perplexity:"))
        .ok_or_else(|| Error::parse("no eval-lm perplexity line found in the log file"))?;
    let final_ppl = EVAL_PPL_RE
        .captures_iter(ppl_line)
        .last()
        .and_then(|caps| caps["ppl"].parse::<f64>().ok())
        .ok_or_else(|| Error::parse("perplexity value is not numeric"))?;

    let path_line = text
        .lines()
        .find(|l| l.contains("examples from:"))
        .ok_or_else(|| Error::parse("no 'examples from:' line found in the log file"))?;
    let caps = EXAMPLES_FROM_RE
        .captures(path_line)
        .ok_or_else(|| Error::parse("no dataset path after 'examples from:'"))?;
    let (formation, grammar, div) = decompose_data_dir(&caps["path"], 5)?;

    Ok(RunRecord {
        formation,
        grammar,
        div,
        model: model_from_filename(filename),
        ppl_at_epoch_10: None,
        final_ppl,
        finished: true,
    })
}

/// Outcome of a directory scan: parsed records plus per-file failures.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub records: Vec<RunRecord>,
    pub failures: Vec<(PathBuf, Error)>,
}

impl BatchOutcome {
    /// Report all failures through the logger.
    pub fn report_failures(&self) {
        for (path, err) in &self.failures {
            warn!("skipped {}: {err}", path.display());
        }
    }
}

/// Scan a directory of log files, one [`RunRecord`] per parsable file.
///
/// Files are visited in filename order so the output table is deterministic.
/// Failures never abort the batch.
pub fn scan_directory(dir: &Path, mode: ExtractMode) -> Result<BatchOutcome> {
    let mut filenames: Vec<PathBuf> = fs::read_dir(dir)?
        .collect::<std::io::Result<Vec<_>>>()?
        .into_iter()
        .map(|entry| entry.path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(mode.suffix()))
        })
        .collect();
    filenames.sort();

    let mut outcome = BatchOutcome::default();
    for path in filenames {
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_owned();
        debug!("parsing {}", path.display());
        let parsed = fs::read_to_string(&path)
            .map_err(Error::from)
            .and_then(|text| match mode {
                ExtractMode::Train => parse_train_log(&text, &filename),
                ExtractMode::Test => parse_test_log(&text, &filename),
            });
        match parsed {
            Ok(record) => outcome.records.push(record),
            Err(err) => outcome.failures.push((path, err)),
        }
    }
    Ok(outcome)
}

/// Write records as CSV with the fixed aggregated-run column order.
pub fn write_records(path: &Path, records: &[RunRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}
