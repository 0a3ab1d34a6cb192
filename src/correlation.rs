//! Pearson correlation between grammar-code frequency and perplexity.
//!
//! Both input tables are keyed by a marginalized grammar code (digit index 2
//! replaced by a wildcard) and pre-aggregated by mean over duplicate keys
//! before an inner join. The p-value is two-tailed, from the Student's t
//! distribution with n-2 degrees of freedom.

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};
use tracing::debug;

use crate::error::{Error, Result};
use crate::grammar::{GrammarCode, CODE_WIDTH};
use crate::typology::EXCLUDED_POSITION;

#[derive(Debug, Deserialize)]
struct PplRow {
    setting: String,
    grammar: String,
    perplexity: f64,
}

#[derive(Debug, Deserialize)]
struct FreqRow {
    grammar: String,
    frequency: f64,
}

/// One correlation run, appended as a line to the JSONL results log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationResult {
    pub correlation: f64,
    pub p_value: f64,
    pub n_samples: usize,
    pub setting: String,
}

fn check_columns(headers: &csv::StringRecord, required: &[&str], table: &str) -> Result<()> {
    for column in required {
        if !headers.iter().any(|h| h == *column) {
            return Err(Error::Schema {
                column: (*column).to_owned(),
                table: table.to_owned(),
            });
        }
    }
    Ok(())
}

/// Mean per marginalized key, in key order.
fn grouped_mean(rows: Vec<(String, f64)>) -> BTreeMap<String, f64> {
    let mut sums: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    for (key, value) in rows {
        let entry = sums.entry(key).or_insert((0.0, 0));
        entry.0 += value;
        entry.1 += 1;
    }
    sums.into_iter()
        .map(|(key, (sum, count))| (key, sum / count as f64))
        .collect()
}

fn marginalized_key(raw: &str) -> Result<String> {
    let code = GrammarCode::normalize(raw, CODE_WIDTH)?;
    Ok(code.marginalize(EXCLUDED_POSITION))
}

/// Read the perplexity table, keep only rows for `section`, and aggregate by
/// marginalized grammar key.
pub fn read_ppl_table(reader: impl Read, section: &str) -> Result<BTreeMap<String, f64>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    check_columns(
        csv_reader.headers()?,
        &["setting", "grammar", "perplexity"],
        "perplexity table",
    )?;
    let mut rows = Vec::new();
    for row in csv_reader.deserialize() {
        let row: PplRow = row?;
        if row.setting == section {
            rows.push((marginalized_key(&row.grammar)?, row.perplexity));
        }
    }
    Ok(grouped_mean(rows))
}

/// Read the frequency table and aggregate by marginalized grammar key.
pub fn read_freq_table(reader: impl Read) -> Result<BTreeMap<String, f64>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    check_columns(
        csv_reader.headers()?,
        &["grammar", "frequency"],
        "frequency table",
    )?;
    let mut rows = Vec::new();
    for row in csv_reader.deserialize() {
        let row: FreqRow = row?;
        rows.push((marginalized_key(&row.grammar)?, row.frequency));
    }
    Ok(grouped_mean(rows))
}

/// Pearson correlation coefficient of two equal-length samples.
fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;
    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        cov += (x - mean_x) * (y - mean_y);
        var_x += (x - mean_x).powi(2);
        var_y += (y - mean_y).powi(2);
    }
    (cov / (var_x * var_y).sqrt()).clamp(-1.0, 1.0)
}

/// Two-tailed p-value for a Pearson coefficient over `n` samples.
///
/// With exactly 2 samples the coefficient is always +/-1 and carries no
/// evidence, so the p-value is defined as 1. A degenerate |r| = 1 with more
/// samples gives 0.
fn p_value(r: f64, n: usize) -> f64 {
    let df = (n - 2) as f64;
    if df <= 0.0 {
        return 1.0;
    }
    let denom = 1.0 - r * r;
    if denom <= f64::EPSILON {
        return 0.0;
    }
    let t = r * (df / denom).sqrt();
    let t_dist = StudentsT::new(0.0, 1.0, df).unwrap();
    2.0 * (1.0 - t_dist.cdf(t.abs()))
}

/// Inner-join the two aggregated tables and correlate their value columns.
pub fn correlate(
    ppl: &BTreeMap<String, f64>,
    freq: &BTreeMap<String, f64>,
    setting: &str,
) -> Result<CorrelationResult> {
    let mut xs = Vec::new();
    let mut ys = Vec::new();
    for (key, &p) in ppl {
        if let Some(&f) = freq.get(key) {
            xs.push(p);
            ys.push(f);
        }
    }

    if xs.len() < 2 {
        return Err(Error::InsufficientData {
            needed: 2,
            got: xs.len(),
        });
    }
    debug!("correlating {} joined rows for setting {setting}", xs.len());

    let correlation = pearson(&xs, &ys);
    Ok(CorrelationResult {
        correlation,
        p_value: p_value(correlation, xs.len()),
        n_samples: xs.len(),
        setting: setting.to_owned(),
    })
}

/// Run the full pipeline against two CSV files.
pub fn correlate_files(ppl_file: &Path, freq_file: &Path, section: &str) -> Result<CorrelationResult> {
    let ppl = read_ppl_table(File::open(ppl_file)?, section)?;
    let freq = read_freq_table(File::open(freq_file)?)?;
    correlate(&ppl, &freq, section)
}

/// Append one result as a JSON line to the results log.
pub fn append_result(path: &Path, result: &CorrelationResult) -> Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let line = serde_json::to_string(result)
        .map_err(|e| Error::parse(format!("failed to serialize result: {e}")))?;
    writeln!(file, "{line}")?;
    Ok(())
}
