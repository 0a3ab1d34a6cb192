//! Integration tests for gramplex: each tool exercised end to end against
//! files in a temporary directory.

use std::fs;

use gramplex::correlation::{append_result, correlate_files};
use gramplex::error::Error;
use gramplex::extract::{scan_directory, write_records, ExtractMode};
use gramplex::filter::filter_data;
use gramplex::sweep::{collect_results, ModelFamily};
use gramplex::visualize::plot_sweep;
use gramplex::{CorrelationResult, SweepRecord};
use tempfile::TempDir;

/// Train-log batch: one record per parsable file, failures skipped.
#[test]
fn test_train_log_batch() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("train_lstm-1.out"),
        "a | b | train | epoch 008 | loss 5.5 | ppl 45.2\n\
         a | b | fairseq.data.data_utils | loaded data-bin/prefix/011010/0-dataset/train\n\
         a | b | done training | took 1h\n",
    )
    .unwrap();
    // No ppl anywhere: parse failure, but the batch must continue.
    fs::write(
        dir.path().join("train_lstm-2.out"),
        "a | b | c | fairseq.data.data_utils loaded data-bin/prefix/000000/1-d/train\n",
    )
    .unwrap();
    // Wrong suffix: not scanned at all.
    fs::write(dir.path().join("notes.txt"), "irrelevant").unwrap();

    let outcome = scan_directory(dir.path(), ExtractMode::Train).unwrap();
    assert_eq!(outcome.records.len(), 1);
    assert_eq!(outcome.failures.len(), 1);

    let record = &outcome.records[0];
    assert_eq!(record.grammar, "011010");
    assert_eq!(record.div, "0");
    assert_eq!(record.model, "lstm");
    assert_eq!(record.final_ppl, 45.2);
    assert!(record.finished);

    let csv_path = dir.path().join("aggregated_ppl.csv");
    write_records(&csv_path, &outcome.records).unwrap();
    let written = fs::read_to_string(&csv_path).unwrap();
    assert!(written.starts_with(
        "formation,grammar,div,model,ppl-10-epochs,final_ppl,if_finished\n"
    ));
    assert!(written.contains("prefix,011010,0,lstm,,45.2,true"));
}

/// Eval-log batch through the test mode.
#[test]
fn test_eval_log_batch() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("eval_transformer-3.txt"),
        "fairseq_cli.eval_lm | loaded 512 examples from: data-bin/suffix/110001/2-dataset/test\n\
         fairseq_cli.eval_lm | Loss (base 2): 5.49, Perplexity: 44.9\n",
    )
    .unwrap();

    let outcome = scan_directory(dir.path(), ExtractMode::Test).unwrap();
    assert_eq!(outcome.records.len(), 1);
    let record = &outcome.records[0];
    assert_eq!(record.grammar, "110001");
    assert_eq!(record.div, "2");
    assert_eq!(record.model, "transformer");
    assert_eq!(record.final_ppl, 44.9);
}

/// Correlation pipeline: CSVs in, one JSON line out per invocation.
#[test]
fn test_correlation_pipeline() {
    let dir = TempDir::new().unwrap();
    let ppl_path = dir.path().join("perplexity_scores.csv");
    let freq_path = dir.path().join("frequency.csv");
    fs::write(
        &ppl_path,
        "setting,grammar,perplexity\n\
         1-1,010010,3.0\n\
         1-1,010011,5.0\n\
         2-1,010010,99.0\n",
    )
    .unwrap();
    fs::write(
        &freq_path,
        "grammar,frequency\n010010,0.1\n010011,0.2\n",
    )
    .unwrap();

    let result = correlate_files(&ppl_path, &freq_path, "1-1").unwrap();
    assert_eq!(result.n_samples, 2);
    assert!((-1.0..=1.0).contains(&result.correlation));

    let log_path = dir.path().join("corr.jsonl");
    append_result(&log_path, &result).unwrap();
    append_result(&log_path, &result).unwrap();

    let lines: Vec<CorrelationResult> = fs::read_to_string(&log_path)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].setting, "1-1");
    assert_eq!(lines[0].n_samples, 2);
}

/// Filtering only the section leaves too little to correlate.
#[test]
fn test_correlation_insufficient_section() {
    let dir = TempDir::new().unwrap();
    let ppl_path = dir.path().join("ppl.csv");
    let freq_path = dir.path().join("freq.csv");
    fs::write(&ppl_path, "setting,grammar,perplexity\n1-1,010010,3.0\n").unwrap();
    fs::write(&freq_path, "grammar,frequency\n010010,0.1\n").unwrap();

    let err = correlate_files(&ppl_path, &freq_path, "1-1").unwrap_err();
    assert!(matches!(err, Error::InsufficientData { .. }));
}

/// Balanced-subset copy: 30 files over, others left behind.
#[test]
fn test_filter_data_copies_balanced_subset() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in");
    let output = dir.path().join("out");
    fs::create_dir(&input).unwrap();

    for i in 0..5u32 {
        for order in ["SVO", "SOV", "VSO", "VOS", "OVS", "OSV"] {
            let name = format!("g{:07b}-{order}.txt", 1 << i);
            fs::write(input.join(name), "data").unwrap();
        }
    }
    // A validly named file outside the balanced subset stays behind.
    fs::write(input.join("g0000011-SVO.txt"), "data").unwrap();

    filter_data(&input, &output).unwrap();
    assert_eq!(fs::read_dir(&output).unwrap().count(), 30);
    assert!(output.join("g0000001-SVO.txt").exists());
    assert!(!output.join("g0000011-SVO.txt").exists());
}

/// A misnamed file in the input fails validation before anything is copied.
#[test]
fn test_filter_data_rejects_bad_names() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in");
    fs::create_dir(&input).unwrap();
    fs::write(input.join("g0000001-SVO.txt"), "data").unwrap();
    fs::write(input.join("readme.md"), "not data").unwrap();

    let err = filter_data(&input, &dir.path().join("out")).unwrap_err();
    assert!(matches!(err, Error::Naming { .. }));
}

/// Sweep collection over a settings tree.
#[test]
fn test_sweep_collection() {
    let dir = TempDir::new().unwrap();
    let setting = dir.path().join("1-1");
    fs::create_dir(&setting).unwrap();
    fs::write(setting.join("001001.0.test.txt"), "Perplexity: 12.5\n").unwrap();
    fs::write(setting.join("001001.1.test.txt"), "Perplexity: 13.5\n").unwrap();
    // Marker missing: skipped, batch continues.
    fs::write(setting.join("111111.0.test.txt"), "no result\n").unwrap();

    let records = collect_results(dir.path(), ModelFamily::Lstm).unwrap();
    assert_eq!(records.len(), 2);
    assert!(records
        .iter()
        .all(|r| r.setting == "1-1" && r.grammar == "001001"));
}

/// Run plots average over divs and render a single SVG.
#[test]
fn test_plot_runs_writes_svg() {
    use gramplex::{Formation, RunRecord};
    use gramplex::visualize::plot_runs;

    let dir = TempDir::new().unwrap();
    let record = |div: &str, ppl: f64| RunRecord {
        formation: Formation::Prefix,
        grammar: "011010".to_owned(),
        div: div.to_owned(),
        model: "lstm".to_owned(),
        ppl_at_epoch_10: Some(ppl),
        final_ppl: ppl,
        finished: true,
    };
    let records = vec![record("0", 40.0), record("1", 50.0)];

    let output = dir.path().join("perplexity_plot.svg");
    plot_runs(&records, &output).unwrap();
    assert!(output.exists());
}

/// Sweep plots render one SVG per settings group.
#[test]
fn test_plot_sweep_writes_one_svg_per_group() {
    let dir = TempDir::new().unwrap();
    let mut records = Vec::new();
    for (setting, grammar, ppl) in [
        ("1-1", "000000", 10.0),
        ("1-2", "000000", 11.0),
        ("2-1", "000001", 12.0),
        ("base", "000000", 9.0),
    ] {
        records.push(SweepRecord {
            setting: setting.to_owned(),
            div: "0".to_owned(),
            grammar: grammar.to_owned(),
            perplexity: ppl,
        });
    }

    plot_sweep(&records, dir.path(), "lstm").unwrap();
    assert!(dir.path().join("lstm_perplexity_group_1.svg").exists());
    assert!(dir.path().join("lstm_perplexity_group_2.svg").exists());
}
