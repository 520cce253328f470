//! Result export — JSON manifests and CSV tapes.
//!
//! - **JSON**: the full `BacktestResult`, loadable again with `import_json`
//! - **CSV**: trade tape, equity curve, and a sweep table for external tools

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use bandlab_core::domain::TradeRecord;
use bandlab_core::engine::EquityPoint;

use crate::runner::BacktestResult;
use crate::sweep::{SweepOutcome, SweepResults};

// ─── JSON export ────────────────────────────────────────────────────

pub fn export_json(result: &BacktestResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize BacktestResult to JSON")
}

pub fn import_json(json: &str) -> Result<BacktestResult> {
    serde_json::from_str(json).context("failed to deserialize BacktestResult from JSON")
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Trade tape, one row per round trip in exit order.
pub fn export_trades_csv(trades: &[TradeRecord]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "side",
        "size",
        "entry_bar",
        "entry_timestamp",
        "entry_price",
        "exit_bar",
        "exit_timestamp",
        "exit_price",
        "exit_reason",
        "quantity",
        "gross_pnl",
        "commission",
        "net_pnl",
        "bars_held",
    ])?;

    for t in trades {
        wtr.write_record([
            format!("{:?}", t.side),
            format!("{:.4}", t.size),
            t.entry_bar.to_string(),
            t.entry_timestamp.to_string(),
            format!("{:.6}", t.entry_price),
            t.exit_bar.to_string(),
            t.exit_timestamp.to_string(),
            format!("{:.6}", t.exit_price),
            format!("{:?}", t.exit_reason),
            format!("{:.6}", t.quantity),
            format!("{:.2}", t.gross_pnl),
            format!("{:.2}", t.commission),
            format!("{:.2}", t.net_pnl),
            t.bars_held.to_string(),
        ])?;
    }

    finish(wtr)
}

/// Equity curve, one row per bar.
pub fn export_equity_csv(equity_curve: &[EquityPoint]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["bar_index", "timestamp", "equity", "side"])?;
    for (i, point) in equity_curve.iter().enumerate() {
        wtr.write_record([
            i.to_string(),
            point.timestamp.to_string(),
            format!("{:.2}", point.equity),
            format!("{:?}", point.side),
        ])?;
    }
    finish(wtr)
}

/// One row per combination in grid order: parameters, objective score,
/// and the failure message for combinations that did not run.
pub fn export_sweep_csv(results: &SweepResults) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    let names: Vec<String> = results
        .entries()
        .first()
        .map(|e| e.combination.params.iter().map(|(n, _)| n.clone()).collect())
        .unwrap_or_default();

    let mut header = vec!["index".to_string()];
    header.extend(names.iter().cloned());
    header.extend([
        results.objective.as_str().to_string(),
        "trade_count".to_string(),
        "error".to_string(),
    ]);
    wtr.write_record(&header)?;

    for entry in results.entries() {
        let mut row = vec![entry.combination.index.to_string()];
        row.extend(entry.combination.params.iter().map(|(_, v)| v.to_string()));
        match &entry.outcome {
            SweepOutcome::Completed(result) => {
                let score = results.objective.score(&result.metrics);
                row.push(score.map(|s| format!("{s:.6}")).unwrap_or_default());
                row.push(result.metrics.trade_count.to_string());
                row.push(String::new());
            }
            SweepOutcome::Failed(error) => {
                row.push(String::new());
                row.push(String::new());
                row.push(error.clone());
            }
        }
        wtr.write_record(&row)?;
    }

    finish(wtr)
}

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<String> {
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the artifact set for a single run.
///
/// Creates `run_<hash prefix>/` under `output_dir` containing
/// `manifest.json`, `trades.csv` and `equity.csv`, and returns its path.
/// Re-saving the same configuration overwrites the same directory.
pub fn save_artifacts(result: &BacktestResult, output_dir: &Path) -> Result<PathBuf> {
    let prefix: String = result.config_hash.chars().take(12).collect();
    let run_dir = output_dir.join(format!("run_{prefix}"));
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    std::fs::write(run_dir.join("manifest.json"), export_json(result)?)?;
    std::fs::write(run_dir.join("trades.csv"), export_trades_csv(&result.run.trades)?)?;
    std::fs::write(
        run_dir.join("equity.csv"),
        export_equity_csv(&result.run.equity_curve)?,
    )?;

    tracing::debug!(dir = %run_dir.display(), "saved run artifacts");
    Ok(run_dir)
}

/// Load a `BacktestResult` from an artifact directory's manifest.json.
pub fn load_artifacts(dir: &Path) -> Result<BacktestResult> {
    let manifest_path = dir.join("manifest.json");
    let json = std::fs::read_to_string(&manifest_path)
        .with_context(|| format!("failed to read {}", manifest_path.display()))?;
    import_json(&json)
}
