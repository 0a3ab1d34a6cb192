// Pedantic clippy configuration for research/data-processing code:
#![allow(clippy::cast_precision_loss)] // usize→f64 intentional in statistics
#![allow(clippy::module_name_repetitions)] // CorrelationResult in correlation.rs is fine
#![allow(clippy::missing_errors_doc)] // # Errors section for every Result fn
#![allow(clippy::doc_markdown)] // backticks for every technical term is excessive
#![allow(clippy::must_use_candidate)] // #[must_use] on every pure fn is excessive

//! gramplex: perplexity extraction and correlation tooling for
//! synthetic-grammar language-modeling experiments.
//!
//! Each binary under `src/bin/` is an independent batch tool; this library
//! holds the shared logic:
//!
//! - `grammar`: fixed-width binary grammar codes, formations, word orders
//! - `extract`: fairseq training/eval log parsing into run records
//! - `sweep`: results collection over a settings directory tree
//! - `typology`: feature database join and grammar-code frequencies
//! - `correlation`: Pearson correlation between frequency and perplexity
//! - `filter`: balanced-subset selection of training data files
//! - `visualize`: deterministic scatter plots of averaged perplexities
//! - `error`: the typed failure kinds shared by all tools

pub mod correlation;
pub mod error;
pub mod extract;
pub mod filter;
pub mod grammar;
pub mod sweep;
pub mod typology;
pub mod visualize;

pub use correlation::{correlate, correlate_files, CorrelationResult};
pub use error::{Error, Result};
pub use extract::{parse_test_log, parse_train_log, scan_directory, ExtractMode, RunRecord};
pub use filter::filter_data;
pub use grammar::{Formation, GrammarCode, WordOrder, CODE_WIDTH};
pub use sweep::{collect_results, ModelFamily, SweepRecord};
pub use typology::{FrequencyRecord, TypologyDb};
