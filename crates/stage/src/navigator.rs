//! Page navigation state machine.
//!
//! A transition runs `Idle -> Transitioning -> Idle`. The page swap happens
//! at the visual midpoint of the transition and the machine settles later,
//! both as deadlines checked by [`Navigator::advance`]. Nothing here owns a
//! timer: the host arms one wake-up for [`Navigator::next_deadline`] and
//! calls `advance` when it fires.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub const PAGE_COUNT: usize = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavTiming {
    /// Delay from the call until the target page replaces the current one.
    #[serde(with = "millis")]
    pub swap_at: Duration,
    /// Delay from the call until the navigator accepts input again.
    #[serde(with = "millis")]
    pub settle_at: Duration,
    /// Minimum spacing between two successful input-driven navigations.
    #[serde(with = "millis")]
    pub cooldown: Duration,
    pub wheel_threshold: f64,
    pub swipe_threshold: f64,
}

impl Default for NavTiming {
    fn default() -> Self {
        Self {
            swap_at: Duration::from_millis(500),
            settle_at: Duration::from_millis(1200),
            cooldown: Duration::from_millis(1500),
            wheel_threshold: 50.0,
            swipe_threshold: 50.0,
        }
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavKey {
    ArrowDown,
    ArrowUp,
    PageDown,
    PageUp,
    Space,
    Home,
    End,
    Digit(u8),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NavInput {
    Wheel { delta_y: f64 },
    Swipe { start_y: f64, end_y: f64 },
    Key(NavKey),
    /// Click on a page indicator.
    Dot(usize),
    /// CTA or "next" button.
    Next,
    Previous,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: usize,
    pub to: usize,
    pub started_at: Duration,
    pub swapped: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Transitioning(Transition),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavEvent {
    Started { from: usize, to: usize },
    /// The target page became visible; its entrance animations restart.
    PageSwapped { page: usize },
    /// The transition finished; decorative transition elements reset.
    Settled { page: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NavError {
    #[error("a page transition is already running")]
    Transitioning,
    #[error("page {0} is already showing")]
    SamePage(usize),
    #[error("page {0} does not exist")]
    OutOfRange(usize),
    #[error("navigation is cooling down")]
    CoolingDown,
    #[error("input does not lead to another page")]
    NoMovement,
}

#[derive(Debug, Clone)]
pub struct Navigator {
    page_count: usize,
    current_page: usize,
    indicator: usize,
    phase: Phase,
    last_navigation: Option<Duration>,
    timing: NavTiming,
}

impl Navigator {
    pub fn new(page_count: usize, timing: NavTiming) -> Self {
        Self {
            page_count: page_count.max(1),
            current_page: 0,
            indicator: 0,
            phase: Phase::Idle,
            last_navigation: None,
            timing,
        }
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    /// Page whose indicator dot is lit. Moves to the target immediately.
    pub fn indicator(&self) -> usize {
        self.indicator
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_transitioning(&self) -> bool {
        matches!(self.phase, Phase::Transitioning(_))
    }

    pub fn timing(&self) -> &NavTiming {
        &self.timing
    }

    pub fn set_timing(&mut self, timing: NavTiming) {
        self.timing = timing;
    }

    fn last_page(&self) -> usize {
        self.page_count - 1
    }

    pub fn navigate_to(&mut self, target: usize, now: Duration) -> Result<NavEvent, NavError> {
        if self.is_transitioning() {
            return Err(NavError::Transitioning);
        }
        if target >= self.page_count {
            return Err(NavError::OutOfRange(target));
        }
        if target == self.current_page {
            return Err(NavError::SamePage(target));
        }

        let from = self.current_page;
        self.phase = Phase::Transitioning(Transition {
            from,
            to: target,
            started_at: now,
            swapped: false,
        });
        self.indicator = target;
        log::debug!("navigating from page {} to {}", from, target);
        Ok(NavEvent::Started { from, to: target })
    }

    /// Maps an input to a target page and navigates, applying the shared
    /// cooldown between successful navigations.
    pub fn handle(&mut self, input: NavInput, now: Duration) -> Result<NavEvent, NavError> {
        if self.is_transitioning() {
            return Err(NavError::Transitioning);
        }
        if let Some(last) = self.last_navigation
            && now.saturating_sub(last) < self.timing.cooldown
        {
            return Err(NavError::CoolingDown);
        }

        let target = self.resolve(input)?;
        let event = self.navigate_to(target, now)?;
        self.last_navigation = Some(now);
        Ok(event)
    }

    fn resolve(&self, input: NavInput) -> Result<usize, NavError> {
        let current = self.current_page;
        let forward = || {
            (current < self.last_page())
                .then_some(current + 1)
                .ok_or(NavError::NoMovement)
        };
        let backward = || current.checked_sub(1).ok_or(NavError::NoMovement);

        match input {
            NavInput::Wheel { delta_y } if delta_y > self.timing.wheel_threshold => forward(),
            NavInput::Wheel { delta_y } if delta_y < -self.timing.wheel_threshold => backward(),
            NavInput::Wheel { .. } => Err(NavError::NoMovement),
            NavInput::Swipe { start_y, end_y } => {
                let diff = start_y - end_y;
                if diff.abs() <= self.timing.swipe_threshold {
                    Err(NavError::NoMovement)
                } else if diff > 0.0 {
                    forward()
                } else {
                    backward()
                }
            }
            NavInput::Key(key) => match key {
                NavKey::ArrowDown | NavKey::PageDown | NavKey::Space => forward(),
                NavKey::ArrowUp | NavKey::PageUp => backward(),
                NavKey::Home => Ok(0),
                NavKey::End => Ok(self.last_page()),
                NavKey::Digit(0) => Err(NavError::NoMovement),
                NavKey::Digit(d) => Ok((d as usize - 1).min(self.last_page())),
            },
            NavInput::Dot(page) => Ok(page),
            NavInput::Next => forward(),
            NavInput::Previous => backward(),
        }
    }

    /// The next phase deadline of the running transition, if any.
    pub fn next_deadline(&self) -> Option<Duration> {
        match self.phase {
            Phase::Idle => None,
            Phase::Transitioning(t) if !t.swapped => Some(t.started_at + self.timing.swap_at),
            Phase::Transitioning(t) => Some(t.started_at + self.timing.settle_at),
        }
    }

    /// Fires every phase deadline that has passed by `now`, in order.
    pub fn advance(&mut self, now: Duration) -> Vec<NavEvent> {
        let mut events = Vec::new();
        let Phase::Transitioning(mut t) = self.phase else {
            return events;
        };

        if !t.swapped && now >= t.started_at + self.timing.swap_at {
            t.swapped = true;
            self.current_page = t.to;
            events.push(NavEvent::PageSwapped { page: t.to });
        }

        if t.swapped && now >= t.started_at + self.timing.settle_at {
            self.phase = Phase::Idle;
            events.push(NavEvent::Settled { page: t.to });
        } else {
            self.phase = Phase::Transitioning(t);
        }
        events
    }

    /// Completes a running transition immediately.
    pub fn finish(&mut self) -> Vec<NavEvent> {
        match self.phase {
            Phase::Idle => Vec::new(),
            Phase::Transitioning(t) => self.advance(t.started_at + self.timing.settle_at),
        }
    }

    /// Progress of the running transition in `[0, 1]`.
    pub fn transition_progress(&self, now: Duration) -> Option<f64> {
        match self.phase {
            Phase::Idle => None,
            Phase::Transitioning(t) => Some(crate::clock::progress(
                now.saturating_sub(t.started_at),
                self.timing.settle_at,
            )),
        }
    }
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new(PAGE_COUNT, NavTiming::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn settled_on(page: usize) -> Navigator {
        let mut nav = Navigator::default();
        if page != 0 {
            nav.navigate_to(page, ms(0)).unwrap();
            nav.advance(ms(1200));
        }
        nav
    }

    #[test]
    fn transition_runs_through_both_phases() {
        let mut nav = Navigator::default();
        let event = nav.navigate_to(2, ms(1000)).unwrap();
        assert_eq!(event, NavEvent::Started { from: 0, to: 2 });
        assert!(nav.is_transitioning());
        assert_eq!(nav.indicator(), 2);
        assert_eq!(nav.current_page(), 0);
        assert_eq!(nav.next_deadline(), Some(ms(1500)));

        assert!(nav.advance(ms(1499)).is_empty());
        assert_eq!(nav.advance(ms(1500)), vec![NavEvent::PageSwapped { page: 2 }]);
        assert_eq!(nav.current_page(), 2);
        assert!(nav.is_transitioning());
        assert_eq!(nav.next_deadline(), Some(ms(2200)));

        assert_eq!(nav.advance(ms(2200)), vec![NavEvent::Settled { page: 2 }]);
        assert!(!nav.is_transitioning());
        assert_eq!(nav.next_deadline(), None);
    }

    #[test]
    fn every_target_settles_after_1200ms() {
        for start in 0..PAGE_COUNT {
            for target in (0..PAGE_COUNT).filter(|&t| t != start) {
                let mut nav = settled_on(start);
                nav.navigate_to(target, ms(5000)).unwrap();
                assert!(nav.is_transitioning());
                let events = nav.advance(ms(6200));
                assert_eq!(events.len(), 2);
                assert!(!nav.is_transitioning());
                assert_eq!(nav.current_page(), target);
            }
        }
    }

    #[test]
    fn navigation_while_transitioning_is_noop() {
        let mut nav = Navigator::default();
        nav.navigate_to(1, ms(0)).unwrap();
        let deadline = nav.next_deadline();
        let phase = nav.phase();

        assert_eq!(nav.navigate_to(3, ms(100)), Err(NavError::Transitioning));
        assert_eq!(
            nav.handle(NavInput::Key(NavKey::End), ms(100)),
            Err(NavError::Transitioning)
        );
        assert_eq!(nav.next_deadline(), deadline);
        assert_eq!(nav.phase(), phase);
        assert_eq!(nav.indicator(), 1);
    }

    #[test]
    fn same_page_and_out_of_range_are_rejected() {
        let mut nav = Navigator::default();
        assert_eq!(nav.navigate_to(0, ms(0)), Err(NavError::SamePage(0)));
        assert_eq!(nav.navigate_to(4, ms(0)), Err(NavError::OutOfRange(4)));
        assert_eq!(nav.phase(), Phase::Idle);
    }

    #[test]
    fn digit_keys_jump_absolutely() {
        for start in [0, 1, 3] {
            let mut nav = settled_on(start);
            nav.handle(NavInput::Key(NavKey::Digit(3)), ms(10_000)).unwrap();
            nav.advance(ms(11_200));
            assert_eq!(nav.current_page(), 2);
        }
        let mut nav = settled_on(0);
        nav.handle(NavInput::Key(NavKey::Digit(9)), ms(10_000)).unwrap();
        nav.finish();
        assert_eq!(nav.current_page(), 3);
    }

    #[test]
    fn home_and_end_resolve_to_bounds() {
        let mut nav = settled_on(1);
        nav.handle(NavInput::Key(NavKey::End), ms(10_000)).unwrap();
        nav.finish();
        assert_eq!(nav.current_page(), 3);
        nav.handle(NavInput::Key(NavKey::Home), ms(20_000)).unwrap();
        nav.finish();
        assert_eq!(nav.current_page(), 0);
    }

    #[test]
    fn wheel_respects_threshold_and_bounds() {
        let mut nav = Navigator::default();
        assert_eq!(
            nav.handle(NavInput::Wheel { delta_y: 40.0 }, ms(0)),
            Err(NavError::NoMovement)
        );
        nav.handle(NavInput::Wheel { delta_y: 60.0 }, ms(0)).unwrap();
        nav.finish();
        assert_eq!(nav.current_page(), 1);

        let mut nav = settled_on(3);
        assert_eq!(
            nav.handle(NavInput::Wheel { delta_y: 60.0 }, ms(10_000)),
            Err(NavError::NoMovement)
        );
        assert_eq!(nav.current_page(), 3);
        assert!(!nav.is_transitioning());
    }

    #[test]
    fn cooldown_blocks_rapid_inputs() {
        let mut nav = Navigator::default();
        nav.handle(NavInput::Wheel { delta_y: 80.0 }, ms(0)).unwrap();
        nav.advance(ms(1200));
        assert_eq!(
            nav.handle(NavInput::Wheel { delta_y: 80.0 }, ms(1300)),
            Err(NavError::CoolingDown)
        );
        nav.handle(NavInput::Wheel { delta_y: 80.0 }, ms(1500)).unwrap();
        nav.finish();
        assert_eq!(nav.current_page(), 2);
    }

    #[test]
    fn rejected_input_does_not_stamp_cooldown() {
        let mut nav = Navigator::default();
        let _ = nav.handle(NavInput::Wheel { delta_y: -80.0 }, ms(0));
        assert!(nav.handle(NavInput::Wheel { delta_y: 80.0 }, ms(10)).is_ok());
    }

    #[test]
    fn swipe_direction() {
        let mut nav = Navigator::default();
        let swipe_up = NavInput::Swipe {
            start_y: 400.0,
            end_y: 300.0,
        };
        nav.handle(swipe_up, ms(0)).unwrap();
        nav.finish();
        assert_eq!(nav.current_page(), 1);

        let short = NavInput::Swipe {
            start_y: 300.0,
            end_y: 340.0,
        };
        assert_eq!(nav.handle(short, ms(5000)), Err(NavError::NoMovement));

        let swipe_down = NavInput::Swipe {
            start_y: 300.0,
            end_y: 400.0,
        };
        nav.handle(swipe_down, ms(5000)).unwrap();
        nav.finish();
        assert_eq!(nav.current_page(), 0);
    }

    #[test]
    fn next_button_never_wraps() {
        let mut nav = settled_on(3);
        assert_eq!(nav.handle(NavInput::Next, ms(10_000)), Err(NavError::NoMovement));
        let mut nav = Navigator::default();
        assert_eq!(nav.handle(NavInput::Previous, ms(0)), Err(NavError::NoMovement));
        nav.handle(NavInput::Dot(2), ms(0)).unwrap();
        nav.finish();
        assert_eq!(nav.current_page(), 2);
    }

    #[test]
    fn advance_past_both_deadlines_emits_in_order() {
        let mut nav = Navigator::default();
        nav.navigate_to(1, ms(0)).unwrap();
        assert_eq!(
            nav.advance(ms(5000)),
            vec![
                NavEvent::PageSwapped { page: 1 },
                NavEvent::Settled { page: 1 }
            ]
        );
    }

    #[test]
    fn transition_progress_tracks_time() {
        let mut nav = Navigator::default();
        assert_eq!(nav.transition_progress(ms(0)), None);
        nav.navigate_to(1, ms(0)).unwrap();
        assert_eq!(nav.transition_progress(ms(600)), Some(0.5));
    }

    #[test]
    fn timing_reads_from_millis() {
        let timing: NavTiming =
            serde_json::from_str(r#"{"swap_at": 250, "settle_at": 600}"#).unwrap();
        assert_eq!(timing.swap_at, ms(250));
        assert_eq!(timing.settle_at, ms(600));
        assert_eq!(timing.cooldown, ms(1500));
    }
}
