//! Balanced-subset selection of training data files.
//!
//! Training files are named `g<7 binary digits>-<ORDER>.txt`. The balanced
//! subset keeps one file per single-bit-set code and word order: 5 codes x 6
//! orders = 30 files, copied with their names preserved.

use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::grammar::{GrammarCode, WordOrder, FILENAME_CODE_WIDTH};

static FILENAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^g(?P<code>[01]{7})-(?P<order>SVO|SOV|VSO|VOS|OVS|OSV)\.txt$").unwrap()
});

/// Check every filename in `dir` against the naming convention.
pub fn validate_directory(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        return Err(Error::Naming {
            path: dir.to_owned(),
            reason: "input directory does not exist".to_owned(),
        });
    }
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if !FILENAME_RE.is_match(&name) {
            return Err(Error::Naming {
                path: entry.path(),
                reason: "expected g<7 binary digits>-<ORDER>.txt".to_owned(),
            });
        }
    }
    Ok(())
}

/// The pre-enumerated balanced subset of filenames.
pub fn balanced_subset() -> Vec<String> {
    let mut names = Vec::with_capacity(30);
    for i in 0..5 {
        let code = GrammarCode::from_index(1 << i, FILENAME_CODE_WIDTH);
        for order in WordOrder::ALL {
            names.push(format!("g{code}-{order}.txt"));
        }
    }
    names
}

/// Validate `input_dir` and copy the balanced subset into `output_dir`.
///
/// A subset file missing from the input directory is fatal: the balanced
/// design requires all 30 cells.
pub fn filter_data(input_dir: &Path, output_dir: &Path) -> Result<()> {
    validate_directory(input_dir)?;
    fs::create_dir_all(output_dir)?;

    for name in balanced_subset() {
        let src = input_dir.join(&name);
        let dst = output_dir.join(&name);
        debug!("copying {}", src.display());
        fs::copy(&src, &dst)?;
    }
    info!("filtered data saved to {}", output_dir.display());
    Ok(())
}
