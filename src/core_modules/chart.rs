// THEORY:
// The `chart` module keeps the rolling window of recent scores that feeds
// the monitor's live chart. The window holds at most the last fifty scored
// ticks (five seconds at the default cadence) and evicts strictly first-in
// first-out, so the display always shows the most recent stretch of the
// session.
//
// Each point records the threshold that was in effect when it was appended,
// not a single global threshold line: moving the threshold mid-session must
// never rewrite history, only affect points appended afterwards.

use std::collections::VecDeque;

use crate::core_modules::scorer::ChangeMagnitude;

/// Maximum number of retained chart points; the oldest is evicted first.
pub const MAX_CHART_POINTS: usize = 50;

/// One plotted tick: the scored magnitude and the threshold it was compared
/// against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartPoint {
    pub magnitude: ChangeMagnitude,
    pub threshold: f64,
}

/// Fixed-capacity FIFO of the most recent chart points.
#[derive(Debug, Clone)]
pub struct RollingChart {
    points: VecDeque<ChartPoint>,
}

/// Appends a value to a bounded history window, evicting the oldest entry
/// once `capacity` is exceeded.
fn update_history<T>(history: &mut VecDeque<T>, value: T, capacity: usize) {
    history.push_back(value);
    if history.len() > capacity {
        history.pop_front();
    }
}

impl RollingChart {
    pub fn new() -> Self {
        Self {
            points: VecDeque::with_capacity(MAX_CHART_POINTS + 1),
        }
    }

    /// Appends one scored tick.
    pub fn append(&mut self, magnitude: ChangeMagnitude, threshold: f64) {
        update_history(
            &mut self.points,
            ChartPoint { magnitude, threshold },
            MAX_CHART_POINTS,
        );
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The most recently appended point.
    pub fn latest(&self) -> Option<ChartPoint> {
        self.points.back().copied()
    }

    /// Points in append order, oldest first.
    pub fn points(&self) -> impl Iterator<Item = &ChartPoint> {
        self.points.iter()
    }
}

impl Default for RollingChart {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_order_is_preserved() {
        let mut chart = RollingChart::new();
        chart.append(1.0, 30.0);
        chart.append(2.0, 30.0);
        chart.append(3.0, 30.0);
        let magnitudes: Vec<f64> = chart.points().map(|p| p.magnitude).collect();
        assert_eq!(magnitudes, vec![1.0, 2.0, 3.0]);
        assert_eq!(chart.latest().map(|p| p.magnitude), Some(3.0));
    }

    #[test]
    fn window_is_capped_at_fifty_points() {
        let mut chart = RollingChart::new();
        for i in 0..60 {
            chart.append(i as f64, 30.0);
        }
        assert_eq!(chart.len(), MAX_CHART_POINTS);
        // Points 0..=9 were evicted, oldest first.
        assert_eq!(chart.points().next().map(|p| p.magnitude), Some(10.0));
        assert_eq!(chart.latest().map(|p| p.magnitude), Some(59.0));
    }

    #[test]
    fn threshold_changes_do_not_rewrite_history() {
        let mut chart = RollingChart::new();
        chart.append(5.0, 50.0);
        chart.append(6.0, 50.0);
        chart.append(7.0, 30.0);
        let thresholds: Vec<f64> = chart.points().map(|p| p.threshold).collect();
        assert_eq!(thresholds, vec![50.0, 50.0, 30.0]);
    }
}
