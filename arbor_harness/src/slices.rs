// Copyright 2026 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Time-slice responsiveness metrics.

use alloc::string::String;

use arbor_core::time::Duration;

/// One answered host message, fed into [`SliceTracker::observe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SliceSample {
    /// Time spent inside the renderer.
    pub duration: Duration,
    /// `true` if work was left when the slice ended.
    pub yielded: bool,
}

/// Letter grade for how well work stayed inside its time slices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum SliceGrade {
    /// Slices stay within budget.
    A,
    /// Occasional overruns.
    B,
    /// Frequent overruns.
    C,
    /// The host loop is regularly blocked.
    D,
}

impl SliceGrade {
    /// Returns a short label for reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
        }
    }
}

/// Aggregated report returned by [`SliceTracker::observe`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SliceReport {
    /// Current grade.
    pub grade: SliceGrade,
    /// Slices longer than twice the budget, per 1000 observed.
    pub overruns_per_1000: f64,
    /// Longest slice in the window, in milliseconds.
    pub longest_ms: f64,
    /// Total slices observed.
    pub total_slices: u64,
    /// Slices that ended with work left.
    pub yielded_slices: u64,
    /// Total overruns observed.
    pub overruns: u64,
}

/// Rolling slice tracker with a fixed-size duration history.
#[derive(Debug)]
pub struct SliceTracker<const N: usize> {
    budget: Duration,
    durations_ms: [f64; N],
    cursor: usize,
    total_slices: u64,
    yielded_slices: u64,
    overruns: u64,
}

impl<const N: usize> SliceTracker<N> {
    /// Creates a tracker that grades against `budget`, usually the
    /// scheduler's frame interval.
    #[must_use]
    pub const fn new(budget: Duration) -> Self {
        Self {
            budget,
            durations_ms: [0.0; N],
            cursor: 0,
            total_slices: 0,
            yielded_slices: 0,
            overruns: 0,
        }
    }

    /// The budget slices are graded against.
    #[must_use]
    pub const fn budget(&self) -> Duration {
        self.budget
    }

    /// Observes one slice and returns an updated report.
    #[must_use]
    pub fn observe(&mut self, sample: SliceSample) -> SliceReport {
        self.total_slices = self.total_slices.saturating_add(1);
        if sample.yielded {
            self.yielded_slices = self.yielded_slices.saturating_add(1);
        }
        if sample.duration.ticks() > self.budget.ticks().saturating_mul(2) {
            self.overruns = self.overruns.saturating_add(1);
        }
        self.durations_ms[self.cursor % N] = to_ms(sample.duration);
        self.cursor = (self.cursor + 1) % N;
        self.report()
    }

    /// The report as of the last observed slice.
    #[must_use]
    pub fn report(&self) -> SliceReport {
        let overrun_rate = if self.total_slices == 0 {
            0.0
        } else {
            self.overruns as f64 * 1000.0 / self.total_slices as f64
        };
        let longest_ms = self.durations_ms.iter().copied().fold(0.0, f64::max);
        SliceReport {
            grade: grade_for(longest_ms / to_ms(self.budget).max(f64::EPSILON), overrun_rate),
            overruns_per_1000: overrun_rate,
            longest_ms,
            total_slices: self.total_slices,
            yielded_slices: self.yielded_slices,
            overruns: self.overruns,
        }
    }

    /// Returns ring-buffer durations oldest→newest, in milliseconds.
    #[must_use]
    pub fn durations(&self) -> [f64; N] {
        let mut out = [0.0; N];
        let mut i = 0;
        while i < N {
            out[i] = self.durations_ms[(self.cursor + i) % N];
            i += 1;
        }
        out
    }

    /// Returns an ASCII sparkline over [`durations`](Self::durations),
    /// scaled from zero to four times the budget.
    #[must_use]
    pub fn sparkline_ascii(&self) -> String {
        const LEVELS: &[u8] = b" .:-=+*#%@";
        let max_ms = to_ms(self.budget) * 4.0;
        let mut out = String::with_capacity(N);
        for v in self.durations() {
            let t = if max_ms > 0.0 {
                v.clamp(0.0, max_ms) / max_ms
            } else {
                0.0
            };
            #[expect(
                clippy::cast_possible_truncation,
                reason = "index is clamped to ASCII level count"
            )]
            let level = (t * (LEVELS.len() as f64 - 1.0) + 0.5) as usize;
            out.push(LEVELS[level] as char);
        }
        out
    }
}

fn to_ms(d: Duration) -> f64 {
    d.ticks() as f64 / 1000.0
}

fn grade_for(longest_over_budget: f64, overruns_per_1000: f64) -> SliceGrade {
    if longest_over_budget <= 2.0 && overruns_per_1000 < 10.0 {
        SliceGrade::A
    } else if longest_over_budget <= 4.0 && overruns_per_1000 < 50.0 {
        SliceGrade::B
    } else if overruns_per_1000 < 150.0 {
        SliceGrade::C
    } else {
        SliceGrade::D
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(ms: u64, yielded: bool) -> SliceSample {
        SliceSample {
            duration: Duration::from_millis(ms),
            yielded,
        }
    }

    #[test]
    fn slices_within_budget_grade_a() {
        let mut t = SliceTracker::<8>::new(Duration::from_millis(5));
        let mut report = t.report();
        for _ in 0..20 {
            report = t.observe(sample(5, true));
        }
        assert_eq!(report.grade, SliceGrade::A);
        assert_eq!(report.yielded_slices, 20);
        assert!((report.longest_ms - 5.0).abs() < 1e-9, "{report:?}");
    }

    #[test]
    fn overrun_rate_accumulates() {
        let mut t = SliceTracker::<4>::new(Duration::from_millis(5));
        let mut report = t.report();
        for i in 0..10 {
            report = t.observe(sample(if i < 2 { 30 } else { 1 }, false));
        }
        assert_eq!(report.overruns, 2);
        assert!((report.overruns_per_1000 - 200.0).abs() < 1e-6);
        assert_eq!(report.grade, SliceGrade::D);
    }

    #[test]
    fn one_long_slice_leaves_the_window() {
        let mut t = SliceTracker::<4>::new(Duration::from_millis(5));
        let _ = t.observe(sample(15, false));
        for _ in 0..4 {
            let _ = t.observe(sample(2, true));
        }
        let report = t.report();
        assert!((report.longest_ms - 2.0).abs() < 1e-9, "{report:?}");
        assert_eq!(t.sparkline_ascii().len(), 4);
    }
}
