//! Typological feature database and grammar-code frequencies.
//!
//! The database is two related CSV tables in the WALS export format:
//! `codes.csv` maps (Parameter_ID, Code_ID) to a human-readable attribute
//! name, `values.csv` records which attribute each language carries for each
//! parameter. A grammar code's frequency is the fraction of catalogued
//! languages whose attributes match the code's implied choice at every
//! considered position.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::grammar::{GrammarCode, CODE_WIDTH};

/// Typological parameter governed by each code position.
pub const POSITION_PARAMETERS: [&str; CODE_WIDTH] = ["82A", "83A", "94A", "85A", "87A", "90A"];

/// Code position excluded from frequency computation (subordinator
/// placement, parameter 94A: WALS coverage is too sparse to condition on).
pub const EXCLUDED_POSITION: usize = 2;

/// Attribute label implied by (parameter, digit). Immutable lookup table;
/// an unmapped pair yields no languages.
fn attribute_label(parameter: &str, bit: u8) -> Option<&'static str> {
    match (parameter, bit) {
        ("82A", 0) => Some("SV"),
        ("82A", 1) => Some("VS"),
        ("83A", 0) => Some("OV"),
        ("83A", 1) => Some("VO"),
        ("94A", 0) => Some("Final subordinator word"),
        ("94A", 1) => Some("Initial subordinator word"),
        ("85A", 0) => Some("Postpositions"),
        ("85A", 1) => Some("Prepositions"),
        ("87A", 0) => Some("Adjective-Noun"),
        ("87A", 1) => Some("Noun-Adjective"),
        ("90A", 0) => Some("Noun-Relative clause"),
        ("90A", 1) => Some("Relative clause-Noun"),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
struct CodeRow {
    #[serde(rename = "ID")]
    id: String,
    #[serde(rename = "Parameter_ID")]
    parameter_id: String,
    #[serde(rename = "Name")]
    name: String,
}

#[derive(Debug, Deserialize)]
struct ValueRow {
    #[serde(rename = "Language_ID")]
    language_id: String,
    #[serde(rename = "Parameter_ID")]
    parameter_id: String,
    #[serde(rename = "Code_ID")]
    code_id: String,
}

/// One output row of the frequency table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyRecord {
    pub grammar: String,
    pub frequency: f64,
}

/// In-memory join of the codes/values tables.
#[derive(Debug)]
pub struct TypologyDb {
    /// (Parameter_ID, attribute label) -> languages carrying that attribute.
    languages_by_attribute: HashMap<(String, String), BTreeSet<String>>,
    /// Distinct languages with any recorded feature, excluding the
    /// globally-excluded parameter.
    n_languages: usize,
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

impl TypologyDb {
    /// Load `codes.csv` and `values.csv` from a directory.
    pub fn load(dir: &Path) -> Result<Self> {
        let codes = File::open(dir.join("codes.csv"))?;
        let values = File::open(dir.join("values.csv"))?;
        Self::from_readers(codes, values)
    }

    /// Build the database from raw CSV readers.
    pub fn from_readers(codes: impl Read, values: impl Read) -> Result<Self> {
        let mut codes_reader = csv::Reader::from_reader(codes);
        check_columns(codes_reader.headers()?, &["ID", "Parameter_ID", "Name"], "codes.csv")?;
        let mut label_by_code: HashMap<(String, String), String> = HashMap::new();
        for row in codes_reader.deserialize() {
            let row: CodeRow = row?;
            label_by_code.insert((row.parameter_id, row.id), row.name);
        }

        let mut values_reader = csv::Reader::from_reader(values);
        check_columns(
            values_reader.headers()?,
            &["Language_ID", "Parameter_ID", "Code_ID"],
            "values.csv",
        )?;
        let mut languages_by_attribute: HashMap<(String, String), BTreeSet<String>> =
            HashMap::new();
        let mut languages: HashSet<String> = HashSet::new();
        let excluded = POSITION_PARAMETERS[EXCLUDED_POSITION];
        for row in values_reader.deserialize() {
            let row: ValueRow = row?;
            if row.language_id.is_empty() {
                continue;
            }
            if row.parameter_id != excluded {
                languages.insert(row.language_id.clone());
            }
            let key = (row.parameter_id.clone(), row.code_id.clone());
            if let Some(label) = label_by_code.get(&key) {
                languages_by_attribute
                    .entry((row.parameter_id, label.clone()))
                    .or_default()
                    .insert(row.language_id);
            }
        }

        debug!(
            "typology database: {} attribute sets, {} languages",
            languages_by_attribute.len(),
            languages.len()
        );
        Ok(Self {
            languages_by_attribute,
            n_languages: languages.len(),
        })
    }

    /// Languages whose attribute for `parameter` matches the given digit.
    /// Empty when the (parameter, digit) pair is unmapped or the database
    /// has no rows for that attribute.
    pub fn languages_for(&self, parameter: &str, bit: u8) -> BTreeSet<String> {
        attribute_label(parameter, bit)
            .and_then(|label| {
                self.languages_by_attribute
                    .get(&(parameter.to_owned(), label.to_owned()))
            })
            .cloned()
            .unwrap_or_default()
    }

    /// Total languages in the denominator of every frequency.
    pub fn n_languages(&self) -> usize {
        self.n_languages
    }

    /// Fraction of catalogued languages matching `code` at every
    /// non-excluded position.
    pub fn frequency(&self, code: &GrammarCode) -> f64 {
        if self.n_languages == 0 {
            return 0.0;
        }

        let mut matching: Option<BTreeSet<String>> = None;
        for (pos, parameter) in POSITION_PARAMETERS.iter().enumerate() {
            if pos == EXCLUDED_POSITION {
                continue;
            }
            let set = self.languages_for(parameter, code.bit(pos));
            matching = Some(match matching {
                None => set,
                Some(acc) => acc.intersection(&set).cloned().collect(),
            });
        }

        let count = matching.map_or(0, |set| set.len());
        count as f64 / self.n_languages as f64
    }

    /// Frequencies for every possible code, in index order.
    pub fn frequency_table(&self) -> Vec<FrequencyRecord> {
        (0..1u32 << CODE_WIDTH)
            .map(|i| {
                let code = GrammarCode::from_index(i, CODE_WIDTH);
                let frequency = self.frequency(&code);
                FrequencyRecord {
                    grammar: code.to_string(),
                    frequency,
                }
            })
            .collect()
    }
}

/// Write the frequency table as `grammar,frequency` CSV.
pub fn write_frequency_table(path: &Path, records: &[FrequencyRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CODES: &str = "\
ID,Parameter_ID,Name
82A-1,82A,SV
82A-2,82A,VS
83A-1,83A,OV
83A-2,83A,VO
85A-1,85A,Postpositions
85A-2,85A,Prepositions
87A-1,87A,Adjective-Noun
87A-2,87A,Noun-Adjective
90A-1,90A,Noun-Relative clause
90A-2,90A,Relative clause-Noun
";

    // l1 carries every "0" attribute, l2 every "1" attribute, l3 only SV.
    const VALUES: &str = "\
ID,Language_ID,Parameter_ID,Code_ID
1,l1,82A,82A-1
2,l1,83A,83A-1
3,l1,85A,85A-1
4,l1,87A,87A-1
5,l1,90A,90A-1
6,l2,82A,82A-2
7,l2,83A,83A-2
8,l2,85A,85A-2
9,l2,87A,87A-2
10,l2,90A,90A-2
11,l3,82A,82A-1
";

    fn db() -> TypologyDb {
        TypologyDb::from_readers(CODES.as_bytes(), VALUES.as_bytes()).unwrap()
    }

    #[test]
    fn test_all_zero_code_frequency() {
        let db = db();
        assert_eq!(db.n_languages(), 3);
        let code = GrammarCode::parse("000000", CODE_WIDTH).unwrap();
        let freq = db.frequency(&code);
        assert!((0.0..=1.0).contains(&freq));
        // Only l1 matches every "0" attribute.
        assert!((freq - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_excluded_position_does_not_matter() {
        let db = db();
        let a = GrammarCode::parse("000000", CODE_WIDTH).unwrap();
        let b = GrammarCode::parse("001000", CODE_WIDTH).unwrap();
        assert_eq!(db.frequency(&a), db.frequency(&b));
    }

    #[test]
    fn test_mixed_code_has_zero_frequency() {
        let db = db();
        // No fixture language combines SV with VO.
        let code = GrammarCode::parse("010100", CODE_WIDTH).unwrap();
        assert_eq!(db.frequency(&code), 0.0);
    }

    #[test]
    fn test_frequency_table_covers_all_codes() {
        let table = db().frequency_table();
        assert_eq!(table.len(), 64);
        assert_eq!(table[0].grammar, "000000");
        assert_eq!(table[63].grammar, "111111");
        assert!(table.iter().all(|r| (0.0..=1.0).contains(&r.frequency)));
    }

    #[test]
    fn test_missing_column_is_schema_error() {
        let bad_codes = "ID,Name\nx,SV\n";
        let err = TypologyDb::from_readers(bad_codes.as_bytes(), VALUES.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Schema { .. }));
    }
}
