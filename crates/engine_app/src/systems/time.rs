use std::sync::{Mutex, MutexGuard, PoisonError};

use engine_inject::Injectable;
use engine_system::{Priority, RuntimeError, System};

#[derive(Debug, Default, Clone, Copy)]
struct Clock {
    elapsed: f64,
    delta: f64,
    average: f64,
    frames: u64,
}

/// Accumulates simulated time. Runs first so later systems see this frame's
/// values.
#[derive(Debug, Default)]
pub struct TimeSystem {
    clock: Mutex<Clock>,
}

impl TimeSystem {
    fn clock(&self) -> MutexGuard<'_, Clock> {
        self.clock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seconds since the first update.
    pub fn time(&self) -> f64 {
        self.clock().elapsed
    }

    /// Delta of the most recent update.
    pub fn delta_time(&self) -> f64 {
        self.clock().delta
    }

    /// Mean frame time since the first update.
    pub fn average_frame_time(&self) -> f64 {
        self.clock().average
    }

    pub fn frame_count(&self) -> u64 {
        self.clock().frames
    }
}

impl Injectable for TimeSystem {}

impl System for TimeSystem {
    fn priority(&self) -> Option<Priority> {
        Some(Priority::High)
    }

    fn update(&self, dt: f64) -> Result<(), RuntimeError> {
        let mut clock = self.clock();
        clock.frames += 1;
        clock.elapsed += dt;
        clock.delta = dt;
        clock.average = clock.elapsed / clock.frames as f64;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulates_time() {
        let time = TimeSystem::default();
        time.update(0.5).unwrap();
        time.update(0.25).unwrap();
        assert!((time.time() - 0.75).abs() < f64::EPSILON);
        assert!((time.delta_time() - 0.25).abs() < f64::EPSILON);
        assert_eq!(time.frame_count(), 2);
    }

    #[test]
    fn test_average_is_mean_of_all_frames() {
        let time = TimeSystem::default();
        assert_eq!(time.average_frame_time(), 0.0);
        time.update(0.1).unwrap();
        assert!((time.average_frame_time() - 0.1).abs() < f64::EPSILON);
        time.update(0.3).unwrap();
        time.update(0.2).unwrap();
        assert!((time.average_frame_time() - 0.2).abs() < 1e-12);
    }
}
