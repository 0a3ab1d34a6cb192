//! Grammar codes, affix formations and word orders.
//!
//! A grammar code is a fixed-width binary string in which each digit selects
//! one typological choice (subject-verb order, adposition type, ...). Codes
//! travel through CSV files and filenames as plain strings, so validation
//! lives here: a code that is not binary or not the expected width is
//! malformed input and must fail instead of being silently truncated.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Width of the codes used by the frequency/correlation pipeline.
pub const CODE_WIDTH: usize = 6;

/// Width of the codes embedded in training-data filenames.
pub const FILENAME_CODE_WIDTH: usize = 7;

/// A validated fixed-width binary grammar code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GrammarCode(String);

impl GrammarCode {
    /// Parse a code, requiring exactly `width` binary digits.
    pub fn parse(s: &str, width: usize) -> Result<Self> {
        if s.len() != width {
            return Err(Error::parse(format!(
                "grammar code '{s}' has width {}, expected {width}",
                s.len()
            )));
        }
        if !s.bytes().all(|b| b == b'0' || b == b'1') {
            return Err(Error::parse(format!(
                "grammar code '{s}' contains non-binary digits"
            )));
        }
        Ok(Self(s.to_owned()))
    }

    /// Parse a code that may have lost its leading zeros in a spreadsheet
    /// round-trip: all-binary digits shorter than `width` are left-padded.
    pub fn normalize(s: &str, width: usize) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() || s.len() > width {
            return Self::parse(s, width);
        }
        if s.bytes().all(|b| b == b'0' || b == b'1') {
            Ok(Self(format!("{s:0>width$}")))
        } else {
            Self::parse(s, width)
        }
    }

    /// Render index `i` as a left-padded binary code of the given width.
    pub fn from_index(i: u32, width: usize) -> Self {
        Self(format!("{i:0width$b}"))
    }

    /// The digit at `pos` as 0 or 1.
    pub fn bit(&self, pos: usize) -> u8 {
        self.0.as_bytes()[pos] - b'0'
    }

    /// Replace the digit at `pos` with the wildcard `'x'`, producing the key
    /// used to aggregate over that position's two values. Codes agreeing
    /// everywhere except `pos` map to the same key.
    pub fn marginalize(&self, pos: usize) -> String {
        let mut out = self.0.clone();
        out.replace_range(pos..=pos, "x");
        out
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn width(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for GrammarCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Affix-placement category under which a synthetic variant was generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Formation {
    Prefix,
    Suffix,
    Infix,
}

impl Formation {
    pub const ALL: [Formation; 3] = [Formation::Prefix, Formation::Suffix, Formation::Infix];

    pub fn as_str(self) -> &'static str {
        match self {
            Formation::Prefix => "prefix",
            Formation::Suffix => "suffix",
            Formation::Infix => "infix",
        }
    }
}

impl FromStr for Formation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "prefix" => Ok(Formation::Prefix),
            "suffix" => Ok(Formation::Suffix),
            "infix" => Ok(Formation::Infix),
            other => Err(Error::parse(format!("unknown formation '{other}'"))),
        }
    }
}

impl fmt::Display for Formation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The six canonical orderings of subject, verb and object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WordOrder {
    Svo,
    Sov,
    Vso,
    Vos,
    Ovs,
    Osv,
}

impl WordOrder {
    pub const ALL: [WordOrder; 6] = [
        WordOrder::Svo,
        WordOrder::Sov,
        WordOrder::Vso,
        WordOrder::Vos,
        WordOrder::Ovs,
        WordOrder::Osv,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            WordOrder::Svo => "SVO",
            WordOrder::Sov => "SOV",
            WordOrder::Vso => "VSO",
            WordOrder::Vos => "VOS",
            WordOrder::Ovs => "OVS",
            WordOrder::Osv => "OSV",
        }
    }
}

impl FromStr for WordOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "SVO" => Ok(WordOrder::Svo),
            "SOV" => Ok(WordOrder::Sov),
            "VSO" => Ok(WordOrder::Vso),
            "VOS" => Ok(WordOrder::Vos),
            "OVS" => Ok(WordOrder::Ovs),
            "OSV" => Ok(WordOrder::Osv),
            other => Err(Error::parse(format!("unknown word order '{other}'"))),
        }
    }
}

impl fmt::Display for WordOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_code() {
        let code = GrammarCode::parse("011010", CODE_WIDTH).unwrap();
        assert_eq!(code.as_str(), "011010");
        assert_eq!(code.bit(0), 0);
        assert_eq!(code.bit(1), 1);
    }

    #[test]
    fn test_parse_rejects_wrong_width() {
        assert!(GrammarCode::parse("01101", CODE_WIDTH).is_err());
        assert!(GrammarCode::parse("0110101", CODE_WIDTH).is_err());
    }

    #[test]
    fn test_parse_rejects_non_binary() {
        assert!(GrammarCode::parse("01x010", CODE_WIDTH).is_err());
        assert!(GrammarCode::parse("012010", CODE_WIDTH).is_err());
    }

    #[test]
    fn test_normalize_restores_leading_zeros() {
        let code = GrammarCode::normalize("1010", CODE_WIDTH).unwrap();
        assert_eq!(code.as_str(), "001010");
        // Already full width stays unchanged
        let code = GrammarCode::normalize("110101", CODE_WIDTH).unwrap();
        assert_eq!(code.as_str(), "110101");
        assert!(GrammarCode::normalize("12", CODE_WIDTH).is_err());
    }

    #[test]
    fn test_from_index() {
        assert_eq!(GrammarCode::from_index(0, 6).as_str(), "000000");
        assert_eq!(GrammarCode::from_index(63, 6).as_str(), "111111");
        assert_eq!(GrammarCode::from_index(1 << 3, 7).as_str(), "0001000");
    }

    #[test]
    fn test_marginalize_same_key_when_codes_agree_elsewhere() {
        let a = GrammarCode::parse("010010", CODE_WIDTH).unwrap();
        let b = GrammarCode::parse("011010", CODE_WIDTH).unwrap();
        assert_eq!(a.marginalize(2), "01x010");
        assert_eq!(a.marginalize(2), b.marginalize(2));
    }

    #[test]
    fn test_formation_roundtrip() {
        for f in Formation::ALL {
            assert_eq!(f.as_str().parse::<Formation>().unwrap(), f);
        }
        assert!("circumfix".parse::<Formation>().is_err());
    }

    #[test]
    fn test_word_order_roundtrip() {
        for o in WordOrder::ALL {
            assert_eq!(o.as_str().parse::<WordOrder>().unwrap(), o);
        }
        assert!("VVO".parse::<WordOrder>().is_err());
    }
}
