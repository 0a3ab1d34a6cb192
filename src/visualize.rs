//! Scatter plots of averaged perplexities per grammar code.
//!
//! The x-axis is always the lexicographically sorted list of grammar codes,
//! so repeated runs over the same table render identically. Colors cycle
//! through a fixed palette in sorted-category order; the `base` setting gets
//! a distinguished black triangle marker.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use plotters::prelude::*;
use tracing::info;

use crate::extract::RunRecord;
use crate::sweep::SweepRecord;

const PLOT_SIZE: (u32, u32) = (1400, 600);

/// Mean value per key, keys in sorted order.
fn mean_by<K: Ord>(pairs: impl IntoIterator<Item = (K, f64)>) -> BTreeMap<K, f64> {
    let mut sums: BTreeMap<K, (f64, usize)> = BTreeMap::new();
    for (key, value) in pairs {
        let entry = sums.entry(key).or_insert((0.0, 0));
        entry.0 += value;
        entry.1 += 1;
    }
    sums.into_iter()
        .map(|(key, (sum, count))| (key, sum / count as f64))
        .collect()
}

fn value_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (mut min, mut max) = (f64::INFINITY, f64::NEG_INFINITY);
    for v in values {
        min = min.min(v);
        max = max.max(v);
    }
    let pad = ((max - min) * 0.05).max(1.0);
    (min - pad, max + pad)
}

/// Scatter the mid-training perplexity per grammar, one color per model.
///
/// Rows without a recorded epoch-10 perplexity are skipped; duplicates over
/// divs are averaged.
pub fn plot_runs(records: &[RunRecord], output: &Path) -> Result<()> {
    let averaged = mean_by(records.iter().filter_map(|r| {
        let ppl = r.ppl_at_epoch_10?;
        if r.grammar.is_empty() {
            return None;
        }
        Some(((r.grammar.clone(), r.model.clone()), ppl))
    }));
    if averaged.is_empty() {
        bail!("no rows with an epoch-10 perplexity to plot");
    }

    let grammars: Vec<String> = {
        let set: std::collections::BTreeSet<_> =
            averaged.keys().map(|(g, _)| g.clone()).collect();
        set.into_iter().collect()
    };
    let models: Vec<String> = {
        let set: std::collections::BTreeSet<_> =
            averaged.keys().map(|(_, m)| m.clone()).collect();
        set.into_iter().collect()
    };
    let x_index: BTreeMap<&str, usize> = grammars
        .iter()
        .enumerate()
        .map(|(i, g)| (g.as_str(), i))
        .collect();
    let (y_min, y_max) = value_range(averaged.values().copied());

    let root = SVGBackend::new(output, PLOT_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption("Average perplexity over divs", ("sans-serif", 20))
        .margin(20)
        .x_label_area_size(80)
        .y_label_area_size(60)
        .build_cartesian_2d(-0.5..grammars.len() as f64 - 0.5, y_min..y_max)?;
    chart
        .configure_mesh()
        .x_desc("Grammar")
        .y_desc("Average perplexity (over divs)")
        .x_labels(grammars.len())
        .x_label_formatter(&|x| {
            let idx = x.round() as usize;
            grammars.get(idx).cloned().unwrap_or_default()
        })
        .x_label_style(("sans-serif", 11).into_font().transform(FontTransform::Rotate90))
        .draw()?;

    for (i, model) in models.iter().enumerate() {
        let color = Palette99::pick(i).to_rgba();
        let points: Vec<(f64, f64)> = averaged
            .iter()
            .filter(|((_, m), _)| m == model)
            .map(|((g, _), &ppl)| (x_index[g.as_str()] as f64, ppl))
            .collect();
        chart
            .draw_series(points.iter().map(|&(x, y)| Circle::new((x, y), 4, color.filled())))?
            .label(model.clone())
            .legend(move |(x, y)| Circle::new((x + 10, y), 4, color.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;
    root.present()?;
    info!("wrote {}", output.display());
    Ok(())
}

/// Numeric family of a setting, e.g. `"1"` from `"1-1"`. `base` has none.
fn setting_group(setting: &str) -> Option<&str> {
    let (group, _) = setting.split_once('-')?;
    if group.chars().all(|c| c.is_ascii_digit()) {
        Some(group)
    } else {
        None
    }
}

/// One scatter per settings group (`1-*`, `2-*`, ...), each overlaying the
/// `base` setting for reference. One SVG file per group in `output_dir`.
pub fn plot_sweep(records: &[SweepRecord], output_dir: &Path, model_name: &str) -> Result<()> {
    let averaged = mean_by(
        records
            .iter()
            .map(|r| ((r.grammar.clone(), r.setting.clone()), r.perplexity)),
    );
    if averaged.is_empty() {
        bail!("no rows to plot");
    }

    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (_, setting) in averaged.keys() {
        if let Some(group) = setting_group(setting) {
            let members = groups.entry(group.to_owned()).or_default();
            if !members.contains(setting) {
                members.push(setting.clone());
            }
        }
    }

    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("creating {}", output_dir.display()))?;

    for (group, mut settings) in groups {
        settings.sort();
        let in_scope = |setting: &str| setting == "base" || settings.iter().any(|s| s == setting);

        let grammars: Vec<String> = {
            let set: std::collections::BTreeSet<_> = averaged
                .keys()
                .filter(|(_, s)| in_scope(s))
                .map(|(g, _)| g.clone())
                .collect();
            set.into_iter().collect()
        };
        let x_index: BTreeMap<&str, usize> = grammars
            .iter()
            .enumerate()
            .map(|(i, g)| (g.as_str(), i))
            .collect();
        let (y_min, y_max) = value_range(
            averaged
                .iter()
                .filter(|((_, s), _)| in_scope(s))
                .map(|(_, &v)| v),
        );

        let output = output_dir.join(format!("{model_name}_perplexity_group_{group}.svg"));
        let root = SVGBackend::new(&output, PLOT_SIZE).into_drawing_area();
        root.fill(&WHITE)?;
        let mut chart = ChartBuilder::on(&root)
            .caption(
                format!("{model_name} perplexity by grammar, settings '{group}-*' + base"),
                ("sans-serif", 20),
            )
            .margin(20)
            .x_label_area_size(80)
            .y_label_area_size(60)
            .build_cartesian_2d(-0.5..grammars.len() as f64 - 0.5, y_min..y_max)?;
        chart
            .configure_mesh()
            .x_desc("Grammar")
            .y_desc("Average perplexity")
            .x_labels(grammars.len())
            .x_label_formatter(&|x| {
                let idx = x.round() as usize;
                grammars.get(idx).cloned().unwrap_or_default()
            })
            .x_label_style(("sans-serif", 11).into_font().transform(FontTransform::Rotate90))
            .draw()?;

        for (i, setting) in settings.iter().enumerate() {
            let color = Palette99::pick(i).to_rgba();
            let points: Vec<(f64, f64)> = averaged
                .iter()
                .filter(|((_, s), _)| s == setting)
                .map(|((g, _), &ppl)| (x_index[g.as_str()] as f64, ppl))
                .collect();
            chart
                .draw_series(points.iter().map(|&(x, y)| Circle::new((x, y), 4, color.filled())))?
                .label(setting.clone())
                .legend(move |(x, y)| Circle::new((x + 10, y), 4, color.filled()));
        }

        let base_points: Vec<(f64, f64)> = averaged
            .iter()
            .filter(|((_, s), _)| s == "base")
            .map(|((g, _), &ppl)| (x_index[g.as_str()] as f64, ppl))
            .collect();
        if !base_points.is_empty() {
            chart
                .draw_series(
                    base_points
                        .iter()
                        .map(|&(x, y)| TriangleMarker::new((x, y), 6, BLACK.filled())),
                )?
                .label("base")
                .legend(|(x, y)| TriangleMarker::new((x + 10, y), 6, BLACK.filled()));
        }

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
        root.present()?;
        info!("wrote {}", output.display());
    }

    Ok(())
}
