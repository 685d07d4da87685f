// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Appends one CSV row per training epoch:
//
//   epoch,train_loss,train_acc,test_loss,test_acc,lr
//   1,1.512300,0.441200,1.201800,0.563000,0.010000
//   2,1.044100,0.627400,0.960200,0.660100,0.010000
//
// The header is written only when the file is new, so several
// runs can share one log.

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};
use serde::{Deserialize, Serialize};

/// Results of one training epoch. Accuracies are in [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// Starts at 1
    pub epoch:      usize,
    pub train_loss: f64,
    pub train_acc:  f64,
    pub test_loss:  f64,
    pub test_acc:   f64,
    /// Learning rate in effect at the end of the epoch
    pub lr:         f64,
}

impl EpochMetrics {
    pub fn new(
        epoch:      usize,
        train_loss: f64,
        train_acc:  f64,
        test_loss:  f64,
        test_acc:   f64,
        lr:         f64,
    ) -> Self {
        Self { epoch, train_loss, train_acc, test_loss, test_acc, lr }
    }

    /// True if this epoch beat the previous best test accuracy
    pub fn is_improvement(&self, best_test_acc: f64) -> bool {
        self.test_acc > best_test_acc
    }
}

pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Open (or create) the CSV log at `csv_path`.
    pub fn new(csv_path: impl Into<PathBuf>) -> Result<Self> {
        let csv_path = csv_path.into();

        if let Some(dir) = csv_path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("Cannot create '{}'", dir.display()))?;
        }

        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)
                .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
            writeln!(f, "epoch,train_loss,train_acc,test_loss,test_acc,lr")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;

        writeln!(
            f,
            "{},{:.6},{:.6},{:.6},{:.6},{:.6}",
            m.epoch,
            m.train_loss,
            m.train_acc,
            m.test_loss,
            m.test_acc,
            m.lr,
        )?;

        tracing::debug!(
            "Logged epoch {} metrics: train_loss={:.4}, test_loss={:.4}",
            m.epoch,
            m.train_loss,
            m.test_loss,
        );

        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_improvement() {
        let m = EpochMetrics::new(2, 1.1, 0.6, 1.0, 0.65, 0.01);
        assert!(m.is_improvement(0.60));
        assert!(!m.is_improvement(0.70));
    }

    #[test]
    fn test_header_written_once() {
        let dir = std::env::temp_dir().join(format!("quiz_dnn_metrics_{}", std::process::id()));
        let path = dir.join("metrics.csv");
        fs::remove_dir_all(&dir).ok();

        let logger = MetricsLogger::new(&path).unwrap();
        logger.log(&EpochMetrics::new(1, 2.0, 0.1, 2.1, 0.1, 0.01)).unwrap();
        // reopening must not duplicate the header
        let logger = MetricsLogger::new(&path).unwrap();
        logger.log(&EpochMetrics::new(2, 1.5, 0.3, 1.6, 0.3, 0.01)).unwrap();

        let text = fs::read_to_string(logger.csv_path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "epoch,train_loss,train_acc,test_loss,test_acc,lr");
        assert!(lines[2].starts_with("2,1.500000,0.300000"));

        fs::remove_dir_all(&dir).ok();
    }
}
