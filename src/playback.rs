//! The playback clock: wall-clock delta plus a resume offset.

use std::time::Instant;

/// Current time is `(now - started_at) + offset` while playing and frozen at
/// `offset` while paused. The clock has a single writer (the update loop);
/// renderers only ever read it.
#[derive(Clone, Copy, Debug, Default)]
pub struct Clock {
    started_at: Option<Instant>,
    offset: f64,
}

impl Clock {
    pub fn is_playing(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn toggle(&mut self) {
        if self.is_playing() {
            self.pause();
        } else {
            self.play();
        }
    }

    pub fn play(&mut self) {
        if self.started_at.is_none() {
            self.started_at = Some(Instant::now());
        }
    }

    pub fn pause(&mut self) {
        self.offset = self.current_time();
        self.started_at = None;
    }

    pub fn stop(&mut self) {
        self.started_at = None;
        self.offset = 0.0;
    }

    pub fn current_time(&self) -> f64 {
        self.offset
            + self
                .started_at
                .map_or(0.0, |started_at| started_at.elapsed().as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_stopped_at_zero() {
        let clock = Clock::default();

        assert!(!clock.is_playing());
        assert_eq!(clock.current_time(), 0.0);
    }

    #[test]
    fn time_advances_only_while_playing() {
        let mut clock = Clock::default();

        clock.play();
        assert!(clock.is_playing());
        assert!(clock.current_time() >= 0.0);

        clock.pause();
        let frozen = clock.current_time();
        assert_eq!(clock.current_time(), frozen);
        assert_eq!(clock.current_time(), frozen);
    }

    #[test]
    fn stop_resets_the_offset() {
        let mut clock = Clock::default();

        clock.play();
        clock.pause();
        clock.stop();

        assert!(!clock.is_playing());
        assert_eq!(clock.current_time(), 0.0);
    }

    #[test]
    fn toggle_round_trips() {
        let mut clock = Clock::default();

        clock.toggle();
        assert!(clock.is_playing());
        clock.toggle();
        assert!(!clock.is_playing());
    }
}
