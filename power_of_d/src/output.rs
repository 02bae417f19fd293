//! Export of run results for external analysis.
//!
//! The snapshot log goes to CSV, one row per snapshot with a column per queue;
//! everything else in the report goes to a JSON summary.

use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::config::SimulationConfig;
use crate::statistics::{QueueSnapshot, SnapshotKind};
use crate::{SimError, SimulationReport};

#[derive(Debug, Serialize)]
struct SummaryFile<'a> {
    config: &'a SimulationConfig,
    report: &'a SimulationReport,
}

pub fn write_snapshots_csv<P: AsRef<Path>>(
    path: P,
    snapshots: &[QueueSnapshot],
) -> Result<(), SimError> {
    let mut wtr = csv::Writer::from_path(path)?;

    let width = snapshots.first().map_or(0, |s| s.lengths.len());
    let mut header = vec!["time".to_string(), "job_id".to_string(), "kind".to_string()];
    header.extend((0..width).map(|i| format!("queue_{i}")));
    wtr.write_record(&header)?;

    for snapshot in snapshots {
        let kind = match snapshot.kind {
            SnapshotKind::Decision => "decision",
            SnapshotKind::Completion => "completion",
        };
        let mut row = vec![
            snapshot.time.to_string(),
            snapshot.job_id.to_string(),
            kind.to_string(),
        ];
        row.extend(snapshot.lengths.iter().map(|len| len.to_string()));
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn write_summary_json<P: AsRef<Path>>(
    path: P,
    config: &SimulationConfig,
    report: &SimulationReport,
) -> Result<(), SimError> {
    let json = serde_json::to_string_pretty(&SummaryFile { config, report })?;
    fs::write(path, json)?;
    Ok(())
}

/// Write `snapshots_<seed>.csv` and `summary_<seed>.json` into `dir`.
pub fn write_all<P: AsRef<Path>>(
    dir: P,
    config: &SimulationConfig,
    report: &SimulationReport,
) -> Result<(), SimError> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    write_snapshots_csv(
        dir.join(format!("snapshots_{}.csv", report.seed)),
        &report.snapshots,
    )?;
    write_summary_json(
        dir.join(format!("summary_{}.json", report.seed)),
        config,
        report,
    )?;
    Ok(())
}
