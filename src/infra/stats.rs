// ============================================================
// Layer 6 — Training Statistics Store
// ============================================================
// The full per-epoch history of a training run, written as
// pretty JSON to the stats path after every epoch so a crashed
// run still leaves its history behind.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::infra::metrics::EpochMetrics;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainStats {
    pub epochs: Vec<EpochMetrics>,
}

impl TrainStats {
    pub fn push(&mut self, m: EpochMetrics) {
        self.epochs.push(m);
    }

    pub fn last(&self) -> Option<&EpochMetrics> {
        self.epochs.last()
    }

    /// Epoch with the highest test accuracy.
    pub fn best(&self) -> Option<&EpochMetrics> {
        self.epochs
            .iter()
            .max_by(|a, b| a.test_acc.total_cmp(&b.test_acc))
    }
}

pub struct StatsStore {
    path: PathBuf,
}

impl StatsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Metrics CSV kept next to the JSON, e.g. `stats.json` → `stats.csv`.
    pub fn csv_path(&self) -> PathBuf {
        self.path.with_extension("csv")
    }

    pub fn save(&self, stats: &TrainStats) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("Cannot create '{}'", dir.display()))?;
        }
        let json = serde_json::to_string_pretty(stats)?;
        fs::write(&self.path, json)
            .with_context(|| format!("Cannot write stats to '{}'", self.path.display()))?;
        tracing::debug!("Saved {} epochs of stats to '{}'", stats.epochs.len(), self.path.display());
        Ok(())
    }

    pub fn load(&self) -> Result<TrainStats> {
        let json = fs::read_to_string(&self.path)
            .with_context(|| format!("Cannot read stats from '{}'", self.path.display()))?;
        Ok(serde_json::from_str(&json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_best_epoch() {
        let mut stats = TrainStats::default();
        assert!(stats.best().is_none());
        stats.push(EpochMetrics::new(1, 2.0, 0.2, 1.9, 0.30, 0.1));
        stats.push(EpochMetrics::new(2, 1.5, 0.4, 1.4, 0.55, 0.1));
        stats.push(EpochMetrics::new(3, 1.2, 0.5, 1.5, 0.50, 0.1));
        assert_eq!(stats.best().unwrap().epoch, 2);
        assert_eq!(stats.last().unwrap().epoch, 3);
        assert_eq!(stats.epochs.len(), 3);
    }

    #[test]
    fn test_save_then_load() {
        let dir = std::env::temp_dir().join(format!("quiz_dnn_stats_{}", std::process::id()));
        let store = StatsStore::new(dir.join("run").join("stats.json"));
        let mut stats = TrainStats::default();
        stats.push(EpochMetrics::new(1, 2.0, 0.25, 1.75, 0.5, 0.01));

        store.save(&stats).unwrap();
        assert_eq!(store.load().unwrap(), stats);
        assert_eq!(store.csv_path(), dir.join("run").join("stats.csv"));

        fs::remove_dir_all(&dir).ok();
    }
}
