//! Rolling window arithmetic
//!
//! Trailing means and percent deltas used by the daily summary.

use std::collections::VecDeque;

/// Fixed-size trailing window over the most recent values
#[derive(Debug, Clone)]
pub struct RollingWindow {
    values: VecDeque<f64>,
    window_size: usize,
}

impl RollingWindow {
    /// Create a window that keeps at most `window_size` values (minimum 1)
    pub fn new(window_size: usize) -> Self {
        let window_size = window_size.max(1);
        Self {
            values: VecDeque::with_capacity(window_size),
            window_size,
        }
    }

    /// Push a value and return the mean of the window including it
    pub fn push(&mut self, value: f64) -> f64 {
        self.values.push_back(value);
        while self.values.len() > self.window_size {
            self.values.pop_front();
        }
        // never empty after a push
        self.mean().unwrap_or(value)
    }

    /// Mean of the values currently in the window
    pub fn mean(&self) -> Option<f64> {
        mean(self.values.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.values.len() == self.window_size
    }
}

/// Arithmetic mean, `None` for an empty input
pub fn mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        return None;
    }
    Some(sum / count as f64)
}

/// Percent change of `current` relative to `previous`
pub fn percent_change(current: f64, previous: Option<f64>) -> Option<f64> {
    match previous {
        Some(prev) if prev > 0.0 => Some(((current - prev) / prev) * 100.0),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_accumulation() {
        let mut window = RollingWindow::new(7);

        // 60, 61, ..., 66 averages to 63
        let mut last = 0.0;
        for i in 0..7 {
            last = window.push(60.0 + f64::from(i));
        }

        assert!((last - 63.0).abs() < 0.001);
        assert!(window.is_full());
    }

    #[test]
    fn test_window_rolling() {
        let mut window = RollingWindow::new(3);

        // Only 80, 90, 100 stay in the window
        for i in 0..5 {
            window.push(60.0 + f64::from(i) * 10.0);
        }

        assert!((window.mean().unwrap() - 90.0).abs() < 0.001);
        assert_eq!(window.len(), 3);
    }

    #[test]
    fn test_partial_window_uses_available_values() {
        let mut window = RollingWindow::new(7);
        window.push(4.0);
        assert_eq!(window.push(8.0), 6.0);
        assert!(!window.is_full());
    }

    #[test]
    fn test_percent_change() {
        let change = percent_change(12_000.0, Some(10_000.0)).unwrap();
        assert!((change - 20.0).abs() < 1e-9);
        assert_eq!(percent_change(5.0, Some(0.0)), None);
        assert_eq!(percent_change(5.0, None), None);
    }

    #[test]
    fn test_mean_of_empty_is_none() {
        assert_eq!(mean(std::iter::empty()), None);
    }
}
