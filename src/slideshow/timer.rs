use std::time::Duration;

/// Outcome of one auto-advance tick
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Tick {
    /// Progress in percent, below 100
    Progress(f64),
    /// Duration elapsed; progress reached 100
    Fire(f64),
}

/// Counts fixed-interval ticks across a slide's display duration.
///
/// With duration `D` and interval `T` the timer fires on tick `ceil(D/T)`.
#[derive(Clone, Debug, PartialEq)]
pub struct AutoAdvance {
    step: u32,
    steps: f64,
}

impl AutoAdvance {
    /// `None` when either duration is zero
    pub fn new(duration: Duration, interval: Duration) -> Option<Self> {
        if duration.is_zero() || interval.is_zero() {
            return None;
        }
        Some(Self {
            step: 0,
            steps: duration.as_nanos() as f64 / interval.as_nanos() as f64,
        })
    }

    pub fn ticks_to_fire(&self) -> u32 {
        self.steps.ceil() as u32
    }

    pub fn tick(&mut self) -> Tick {
        self.step += 1;
        let progress = f64::from(self.step) / self.steps * 100.0;
        if f64::from(self.step) >= self.steps {
            Tick::Fire(progress)
        } else {
            Tick::Progress(progress)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(duration_ms: u64, interval_ms: u64) -> (u32, Vec<f64>) {
        let mut timer =
            AutoAdvance::new(Duration::from_millis(duration_ms), Duration::from_millis(interval_ms)).unwrap();
        let mut seen = Vec::new();
        let mut ticks = 0;
        loop {
            ticks += 1;
            match timer.tick() {
                Tick::Progress(p) => seen.push(p),
                Tick::Fire(p) => {
                    assert!(p >= 100.0);
                    return (ticks, seen);
                }
            }
        }
    }

    #[test]
    fn test_fires_after_ceil_ticks() {
        for (d, t) in [(1000, 50), (6000, 50), (1010, 50), (120, 50), (30, 50)] {
            let expected = AutoAdvance::new(Duration::from_millis(d), Duration::from_millis(t))
                .map(|timer| timer.ticks_to_fire());
            let (ticks, progress) = run(d, t);
            assert_eq!(ticks, ((d as f64) / (t as f64)).ceil() as u32, "D={} T={}", d, t);
            assert_eq!(expected, Some(ticks));
            assert!(progress.iter().all(|&p| p < 100.0));
        }
    }

    #[test]
    fn test_progress_is_linear() {
        let (_, progress) = run(200, 50);
        assert_eq!(progress, vec![25.0, 50.0, 75.0]);
    }

    #[test]
    fn test_zero_duration_never_arms() {
        assert!(AutoAdvance::new(Duration::ZERO, Duration::from_millis(50)).is_none());
    }
}
