// ============================================================
// Layer 5 — Learning-Rate Schedules
// ============================================================
//   Constant   lr = base
//   Step       lr = base · gamma^(step / step_size)
//   OneCycle   cosine warm-up from max/25 to max over the first
//              pct_start of total_steps, then cosine decay to
//              (max/25)/1e4
//
// The trainer advances the scheduler once per batch or once per
// epoch depending on its `batch_scheduler` flag.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

const ONE_CYCLE_DIV_FACTOR:       f64 = 25.0;
const ONE_CYCLE_FINAL_DIV_FACTOR: f64 = 1e4;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LrSchedule {
    Constant,
    Step { step_size: usize, gamma: f64 },
    OneCycle { max_lr: f64, total_steps: usize, pct_start: f64 },
}

impl LrSchedule {
    pub fn lr_at(&self, base_lr: f64, step: usize) -> f64 {
        match *self {
            LrSchedule::Constant => base_lr,
            LrSchedule::Step { step_size, gamma } => {
                let decays = step / step_size.max(1);
                base_lr * gamma.powi(decays as i32)
            }
            LrSchedule::OneCycle { max_lr, total_steps, pct_start } => {
                let initial = max_lr / ONE_CYCLE_DIV_FACTOR;
                let min_lr  = initial / ONE_CYCLE_FINAL_DIV_FACTOR;
                let total   = total_steps.max(1);
                let step    = step.min(total);
                let up      = ((pct_start.clamp(0.0, 1.0) * total as f64).round() as usize).clamp(1, total);

                if step <= up {
                    cosine(initial, max_lr, step as f64 / up as f64)
                } else {
                    let down = (total - up).max(1);
                    cosine(max_lr, min_lr, (step - up) as f64 / down as f64)
                }
            }
        }
    }
}

/// Cosine interpolation from `start` (pct = 0) to `end` (pct = 1).
fn cosine(start: f64, end: f64, pct: f64) -> f64 {
    end + (start - end) / 2.0 * (1.0 + (PI * pct).cos())
}

/// A schedule plus its position.
#[derive(Debug, Clone, PartialEq)]
pub struct LrScheduler {
    schedule: LrSchedule,
    base_lr:  f64,
    step:     usize,
}

impl LrScheduler {
    pub fn new(schedule: LrSchedule, base_lr: f64) -> Self {
        Self { schedule, base_lr, step: 0 }
    }

    pub fn current(&self) -> f64 {
        self.schedule.lr_at(self.base_lr, self.step)
    }

    /// Advance one step and return the new learning rate.
    pub fn step(&mut self) -> f64 {
        self.step += 1;
        self.current()
    }

    pub fn steps_taken(&self) -> usize {
        self.step
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn test_constant() {
        let mut s = LrScheduler::new(LrSchedule::Constant, 0.05);
        s.step();
        s.step();
        assert!(close(s.current(), 0.05));
        assert_eq!(s.steps_taken(), 2);
    }

    #[test]
    fn test_step_decay() {
        let sched = LrSchedule::Step { step_size: 2, gamma: 0.1 };
        assert!(close(sched.lr_at(1.0, 0), 1.0));
        assert!(close(sched.lr_at(1.0, 1), 1.0));
        assert!(close(sched.lr_at(1.0, 2), 0.1));
        assert!((sched.lr_at(1.0, 5) - 0.01).abs() < 1e-12);
    }

    #[test]
    fn test_one_cycle_endpoints() {
        let sched = LrSchedule::OneCycle { max_lr: 0.1, total_steps: 100, pct_start: 0.3 };
        assert!(close(sched.lr_at(0.0, 0), 0.1 / 25.0));
        assert!(close(sched.lr_at(0.0, 30), 0.1));
        assert!(close(sched.lr_at(0.0, 100), 0.1 / 25.0 / 1e4));
        // past the end it stays at the floor
        assert!(close(sched.lr_at(0.0, 500), 0.1 / 25.0 / 1e4));
    }

    #[test]
    fn test_one_cycle_rises_then_falls() {
        let sched = LrSchedule::OneCycle { max_lr: 1.0, total_steps: 10, pct_start: 0.5 };
        let lrs: Vec<f64> = (0..=10).map(|s| sched.lr_at(0.0, s)).collect();
        assert!(lrs[..=5].windows(2).all(|w| w[0] < w[1]));
        assert!(lrs[5..].windows(2).all(|w| w[0] > w[1]));
    }
}
