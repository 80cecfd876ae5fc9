//! Performance statistics collection for `--stats` output.

use std::time::{Duration, Instant};

/// Collects solver counters and phase timings.
///
/// Created when `--stats` is passed, threaded as `Option<&mut Stats>`.
/// Zero cost when `None`: no timing calls, no counter increments.
pub struct Stats {
    total_start: Instant,
    phases: Vec<(&'static str, Duration)>,
    pub points_solved: u32,
    pub points_failed: u32,
    // Root finding
    pub root_iterations: u32,
    pub residual_evaluations: u32,
    pub backtracks: u32,
    pub iterations_per_point: Vec<u32>,
    pub solve_time: Duration,
}

impl Default for Stats {
    fn default() -> Self {
        Self::new()
    }
}

impl Stats {
    pub fn new() -> Self {
        Self {
            total_start: Instant::now(),
            phases: Vec::new(),
            points_solved: 0,
            points_failed: 0,
            root_iterations: 0,
            residual_evaluations: 0,
            backtracks: 0,
            iterations_per_point: Vec::new(),
            solve_time: Duration::ZERO,
        }
    }

    /// Record a completed phase with its duration.
    pub fn add_phase(&mut self, name: &'static str, duration: Duration) {
        self.phases.push((name, duration));
    }

    /// Print the stats table to stderr.
    pub fn display(&self) {
        let total = self.total_start.elapsed();
        eprintln!();
        eprintln!("=== Keldysh Solver Stats ===");

        for (name, dur) in &self.phases {
            eprintln!("  {:<24} {:>8.3}s", name, dur.as_secs_f64());
        }

        eprintln!("  Points:                 solved={}  failed={}", self.points_solved, self.points_failed);
        if self.root_iterations > 0 || self.residual_evaluations > 0 {
            eprintln!("  Root iterations:        {}", self.root_iterations);
            eprintln!("    Residual evals:       {}", self.residual_evaluations);
            eprintln!("    Backtracks:           {}", self.backtracks);
            eprintln!("    Solve time:           {:>8.3}s", self.solve_time.as_secs_f64());
            if !self.iterations_per_point.is_empty() {
                let avg: f64 = self.iterations_per_point.iter().map(|&i| i as f64).sum::<f64>()
                    / self.iterations_per_point.len() as f64;
                let max = self.iterations_per_point.iter().copied().max().unwrap_or(0);
                eprintln!("      Iters/point avg:    {:.1}", avg);
                eprintln!("      Iters/point max:    {}", max);
            }
        }

        eprintln!("  ─────────────────────────────────");
        eprintln!("  Total:                  {:>8.3}s", total.as_secs_f64());
    }
}
