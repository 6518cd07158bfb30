//! Tempo and the transport-time to cycle mapping

use crate::{ConfigError, Result};
use plaid_core::Fraction;
use std::time::Duration;

/// Beats per minute and how many beats make one cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tempo {
    bpm: f64,
    beats_per_cycle: u32,
}

impl Tempo {
    pub fn new(bpm: f64, beats_per_cycle: u32) -> Result<Self> {
        if !bpm.is_finite() || bpm <= 0.0 {
            return Err(ConfigError::InvalidTempo(format!(
                "bpm must be a positive number, got {}",
                bpm
            )));
        }
        if beats_per_cycle == 0 {
            return Err(ConfigError::InvalidTempo(
                "beats per cycle must be at least 1".to_string(),
            ));
        }
        Ok(Tempo {
            bpm,
            beats_per_cycle,
        })
    }

    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    pub fn beats_per_cycle(&self) -> u32 {
        self.beats_per_cycle
    }

    pub fn cycles_per_minute(&self) -> f64 {
        self.bpm / self.beats_per_cycle as f64
    }

    pub fn cycles_per_second(&self) -> f64 {
        self.cycles_per_minute() / 60.0
    }

    pub fn seconds_per_cycle(&self) -> f64 {
        1.0 / self.cycles_per_second()
    }
}

/// Piecewise-linear map from transport time to cycles
///
/// The clock remembers the cycle reached when the tempo last changed and
/// measures from there, so a tempo change never moves earlier cycles.
#[derive(Debug, Clone, PartialEq)]
pub struct Clock {
    tempo: Tempo,
    anchor_time: Duration,
    anchor_cycle: Fraction,
}

impl Clock {
    pub fn new(tempo: Tempo) -> Self {
        Clock {
            tempo,
            anchor_time: Duration::ZERO,
            anchor_cycle: Fraction::zero(),
        }
    }

    pub fn tempo(&self) -> Tempo {
        self.tempo
    }

    /// Cycle position at transport time `at`
    ///
    /// Times before the current anchor clamp to it.
    pub fn cycle_at(&self, at: Duration) -> Fraction {
        let elapsed = at.saturating_sub(self.anchor_time).as_secs_f64();
        self.anchor_cycle + Fraction::from_float(elapsed * self.tempo.cycles_per_second())
    }

    /// Transport time at which `cycle` is reached under the current tempo
    pub fn time_at(&self, cycle: Fraction) -> Duration {
        let cycles = (cycle - self.anchor_cycle).to_float().max(0.0);
        let offset = Duration::try_from_secs_f64(cycles * self.tempo.seconds_per_cycle())
            .unwrap_or(Duration::MAX);
        self.anchor_time.saturating_add(offset)
    }

    /// Change tempo from transport time `at` onwards
    pub fn set_tempo(&mut self, at: Duration, tempo: Tempo) {
        self.anchor_cycle = self.cycle_at(at);
        self.anchor_time = self.anchor_time.max(at);
        self.tempo = tempo;
    }

    /// Restart at cycle 0, keeping the tempo
    pub fn reset(&mut self) {
        self.anchor_time = Duration::ZERO;
        self.anchor_cycle = Fraction::zero();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: f64) -> Duration {
        Duration::from_secs_f64(s)
    }

    #[test]
    fn test_tempo_conversion() {
        let tempo = Tempo::new(140.0, 4).unwrap();
        assert_eq!(tempo.cycles_per_minute(), 35.0);
        assert!((tempo.cycles_per_second() - 35.0 / 60.0).abs() < 1e-12);

        let tempo = Tempo::new(120.0, 4).unwrap();
        assert_eq!(tempo.seconds_per_cycle(), 2.0);
    }

    #[test]
    fn test_tempo_validation() {
        assert!(Tempo::new(0.0, 4).is_err());
        assert!(Tempo::new(-120.0, 4).is_err());
        assert!(Tempo::new(f64::NAN, 4).is_err());
        assert!(Tempo::new(f64::INFINITY, 4).is_err());
        assert!(matches!(
            Tempo::new(120.0, 0),
            Err(ConfigError::InvalidTempo(_))
        ));
    }

    #[test]
    fn test_cycle_at() {
        let clock = Clock::new(Tempo::new(120.0, 4).unwrap());
        assert_eq!(clock.cycle_at(Duration::ZERO), Fraction::zero());
        assert_eq!(clock.cycle_at(secs(2.0)), Fraction::one());
        assert_eq!(clock.cycle_at(secs(3.0)), Fraction::new(3, 2));
        assert_eq!(clock.time_at(Fraction::from_int(2)), secs(4.0));
    }

    #[test]
    fn test_time_at_saturates() {
        let clock = Clock::new(Tempo::new(1.0, 4).unwrap());
        assert_eq!(clock.time_at(Fraction::from_int(i64::MAX / 2)), Duration::MAX);
    }

    #[test]
    fn test_tempo_change_keeps_earlier_cycles() {
        let mut clock = Clock::new(Tempo::new(120.0, 4).unwrap());
        clock.set_tempo(secs(4.0), Tempo::new(240.0, 4).unwrap());

        // Two cycles at the old tempo, then one cycle per second
        assert_eq!(clock.cycle_at(secs(4.0)), Fraction::from_int(2));
        assert_eq!(clock.cycle_at(secs(5.0)), Fraction::from_int(3));
        // Earlier times clamp to the anchor
        assert_eq!(clock.cycle_at(secs(1.0)), Fraction::from_int(2));
    }

    #[test]
    fn test_cycle_at_is_monotonic() {
        let mut clock = Clock::new(Tempo::new(140.0, 4).unwrap());
        clock.set_tempo(secs(3.0), Tempo::new(90.0, 3).unwrap());
        let mut last = Fraction::zero();
        for step in 0..100 {
            let now = clock.cycle_at(secs(step as f64 * 0.1));
            assert!(now >= last);
            last = now;
        }
    }

    #[test]
    fn test_reset() {
        let mut clock = Clock::new(Tempo::new(120.0, 4).unwrap());
        clock.set_tempo(secs(10.0), Tempo::new(60.0, 4).unwrap());
        clock.reset();
        assert_eq!(clock.cycle_at(secs(4.0)), Fraction::one());
    }
}
