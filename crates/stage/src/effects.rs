//! Pointer-driven decorations. Each effect is independent and keeps no
//! state between triggers beyond what its own animation needs.

use crate::clock::{ease_out, progress};
use crate::geometry::{Point, Rect, Size};
use std::time::Duration;

pub const GLOW_LAG: Duration = Duration::from_millis(50);
pub const MAGNETIC_CTA: f64 = 0.2;
pub const MAGNETIC_DEFAULT: f64 = 0.3;
pub const TILT_FEATURE: f64 = 20.0;
pub const TILT_CONTACT: f64 = 25.0;
pub const TILT_LIFT: f64 = 10.0;
pub const RIPPLE_LIFETIME: Duration = Duration::from_millis(600);
pub const RIPPLE_SCALE: f64 = 4.0;
pub const REVEAL_THRESHOLD: f64 = 0.1;
pub const REVEAL_DURATION: Duration = Duration::from_millis(800);
pub const REVEAL_OFFSET: f64 = 30.0;
pub const TYPEWRITER_SPEED: Duration = Duration::from_millis(50);
pub const ENTRANCE_DURATION: Duration = Duration::from_millis(800);
pub const ENTRANCE_STAGGER: Duration = Duration::from_millis(100);
pub const ENTRANCE_OFFSET: f64 = 40.0;

/// Custom cursor: a dot that tracks the pointer and a glow that trails it.
#[derive(Debug, Clone, Default)]
pub struct CursorFollower {
    dot: Option<Point>,
    glow: Option<Point>,
    pending: Option<(Point, Duration)>,
    hovering: bool,
}

impl CursorFollower {
    pub fn pointer_moved(&mut self, p: Point, now: Duration) {
        self.dot = Some(p);
        self.pending = Some((p, now + GLOW_LAG));
    }

    pub fn pointer_left(&mut self) {
        self.dot = None;
        self.glow = None;
        self.pending = None;
    }

    pub fn set_hovering(&mut self, hovering: bool) {
        self.hovering = hovering;
    }

    pub fn hovering(&self) -> bool {
        self.hovering
    }

    pub fn dot(&self) -> Option<Point> {
        self.dot
    }

    /// Glow position as of `now`: the last pointer position at least
    /// [`GLOW_LAG`] old.
    pub fn glow(&mut self, now: Duration) -> Option<Point> {
        if let Some((p, due)) = self.pending
            && now >= due
        {
            self.glow = Some(p);
            self.pending = None;
        }
        self.glow
    }
}

/// Offset pulling an element towards the pointer.
pub fn magnetic_offset(pointer: Point, rect: &Rect, strength: f64) -> (f64, f64) {
    let c = rect.center();
    ((pointer.x - c.x) * strength, (pointer.y - c.y) * strength)
}

/// 3D hover tilt of a card, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Tilt {
    pub rotate_x: f64,
    pub rotate_y: f64,
    pub lift: f64,
    /// Pointer position inside the card in percent, for the highlight.
    pub highlight: (f64, f64),
}

impl Tilt {
    pub fn from_pointer(pointer: Point, rect: &Rect, divisor: f64) -> Self {
        let c = rect.center();
        let highlight = if rect.width > 0.0 && rect.height > 0.0 {
            (
                (pointer.x - rect.x) / rect.width * 100.0,
                (pointer.y - rect.y) / rect.height * 100.0,
            )
        } else {
            (50.0, 50.0)
        };
        Self {
            rotate_x: -(pointer.y - c.y) / divisor,
            rotate_y: (pointer.x - c.x) / divisor,
            lift: TILT_LIFT,
            highlight,
        }
    }

    pub fn rest() -> Self {
        Self {
            highlight: (50.0, 50.0),
            ..Default::default()
        }
    }

    /// Horizontal and vertical squash factors approximating the perspective
    /// rotation on a flat surface.
    pub fn squash(&self) -> (f64, f64) {
        (
            self.rotate_y.to_radians().cos(),
            self.rotate_x.to_radians().cos(),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ripple {
    pub center: Point,
    pub size: f64,
    pub started: Duration,
}

impl Ripple {
    pub fn spawn(click: Point, rect: &Rect, now: Duration) -> Self {
        Self {
            center: click,
            size: rect.width.max(rect.height),
            started: now,
        }
    }

    /// Current `(radius, opacity)`; `None` once the ripple has expired.
    pub fn frame(&self, now: Duration) -> Option<(f64, f64)> {
        let elapsed = now.checked_sub(self.started)?;
        if elapsed >= RIPPLE_LIFETIME {
            return None;
        }
        let t = ease_out(progress(elapsed, RIPPLE_LIFETIME));
        Some((self.size / 2.0 * RIPPLE_SCALE * t, 0.3 * (1.0 - t)))
    }
}

#[derive(Debug, Clone, Default)]
pub struct Ripples {
    active: Vec<Ripple>,
}

impl Ripples {
    pub fn spawn(&mut self, click: Point, rect: &Rect, now: Duration) {
        self.active.push(Ripple::spawn(click, rect, now));
    }

    pub fn prune(&mut self, now: Duration) {
        self.active.retain(|r| r.frame(now).is_some());
    }

    pub fn iter(&self) -> impl Iterator<Item = &Ripple> {
        self.active.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

/// Reveal-on-intersection for a set of elements, one-shot per element.
#[derive(Debug, Clone, Default)]
pub struct RevealTracker {
    revealed: Vec<Option<Duration>>,
}

impl RevealTracker {
    pub fn new(count: usize) -> Self {
        Self {
            revealed: vec![None; count],
        }
    }

    /// Reports the visible fraction of element `index`. Returns true the
    /// first time it crosses the threshold; later reports are ignored.
    pub fn observe(&mut self, index: usize, ratio: f64, now: Duration) -> bool {
        let Some(slot) = self.revealed.get_mut(index) else {
            return false;
        };
        if slot.is_some() || ratio < REVEAL_THRESHOLD {
            return false;
        }
        *slot = Some(now);
        true
    }

    pub fn is_observing(&self, index: usize) -> bool {
        matches!(self.revealed.get(index), Some(None))
    }

    /// `(opacity, vertical offset)` of element `index` at `now`.
    pub fn style(&self, index: usize, now: Duration) -> (f64, f64) {
        match self.revealed.get(index).copied().flatten() {
            None => (0.0, REVEAL_OFFSET),
            Some(at) => {
                let t = ease_out(progress(now.saturating_sub(at), REVEAL_DURATION));
                (t, REVEAL_OFFSET * (1.0 - t))
            }
        }
    }
}

/// Pointer position relative to the viewport center, in `[-1, 1]` per axis.
pub fn pointer_bias(pointer: Point, viewport: Size) -> (f64, f64) {
    let c = viewport.center();
    if c.x <= 0.0 || c.y <= 0.0 {
        return (0.0, 0.0);
    }
    ((pointer.x - c.x) / c.x, (pointer.y - c.y) / c.y)
}

/// Parallax shift for an element of the given intensity.
pub fn parallax(pointer: Point, viewport: Size, intensity: f64) -> (f64, f64) {
    let (mx, my) = pointer_bias(pointer, viewport);
    (mx * intensity * 100.0, my * intensity * 100.0)
}

/// Shift of the `index`-th gradient orb of the backdrop.
pub fn orb_shift(pointer: Point, viewport: Size, index: usize) -> (f64, f64) {
    let (mx, my) = pointer_bias(pointer, viewport);
    let speed = 0.02 + index as f64 * 0.01;
    (mx * speed * 50.0, my * speed * 50.0)
}

/// Shift of the `index`-th floating shape of the backdrop.
pub fn shape_shift(pointer: Point, viewport: Size, index: usize) -> (f64, f64) {
    let (mx, my) = pointer_bias(pointer, viewport);
    let speed = 0.03 + index as f64 * 0.01;
    (mx * speed * 30.0, my * speed * 30.0)
}

/// Types `text` one character per tick once started.
#[derive(Debug, Clone)]
pub struct TypeWriter {
    text: String,
    speed: Duration,
    starts_at: Duration,
}

impl TypeWriter {
    pub fn new(text: impl Into<String>, starts_at: Duration) -> Self {
        Self {
            text: text.into(),
            speed: TYPEWRITER_SPEED,
            starts_at,
        }
    }

    pub fn with_speed(mut self, speed: Duration) -> Self {
        self.speed = speed;
        self
    }

    pub fn visible(&self, now: Duration) -> &str {
        let Some(elapsed) = now.checked_sub(self.starts_at) else {
            return "";
        };
        let typed = if self.speed.is_zero() {
            usize::MAX
        } else {
            (elapsed.as_millis() / self.speed.as_millis()) as usize + 1
        };
        match self.text.char_indices().nth(typed) {
            Some((end, _)) => &self.text[..end],
            None => &self.text,
        }
    }

    pub fn is_done(&self, now: Duration) -> bool {
        self.visible(now).len() == self.text.len()
    }
}

/// Entrance animation of a page, restarted whenever the page is swapped in.
#[derive(Debug, Clone, Copy, Default)]
pub struct Entrance {
    started: Duration,
}

impl Entrance {
    pub fn restart(&mut self, now: Duration) {
        self.started = now;
    }

    /// `(opacity, vertical offset)` of the `index`-th animated element.
    pub fn style(&self, index: usize, now: Duration) -> (f64, f64) {
        let delay = self.started + ENTRANCE_STAGGER * index as u32;
        let t = ease_out(progress(now.saturating_sub(delay), ENTRANCE_DURATION));
        (t, ENTRANCE_OFFSET * (1.0 - t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn glow_trails_the_dot() {
        let mut cursor = CursorFollower::default();
        cursor.pointer_moved(Point::new(10.0, 20.0), ms(100));
        assert_eq!(cursor.dot(), Some(Point::new(10.0, 20.0)));
        assert_eq!(cursor.glow(ms(120)), None);
        assert_eq!(cursor.glow(ms(150)), Some(Point::new(10.0, 20.0)));
        cursor.pointer_left();
        assert_eq!(cursor.glow(ms(500)), None);
    }

    #[test]
    fn magnetic_pulls_towards_pointer() {
        let rect = Rect::new(0.0, 0.0, 100.0, 40.0);
        let (dx, dy) = magnetic_offset(Point::new(100.0, 40.0), &rect, MAGNETIC_CTA);
        assert!((dx - 10.0).abs() < 1e-9);
        assert!((dy - 4.0).abs() < 1e-9);
    }

    #[test]
    fn tilt_follows_pointer_quadrant() {
        let rect = Rect::new(0.0, 0.0, 200.0, 100.0);
        let tilt = Tilt::from_pointer(Point::new(200.0, 0.0), &rect, TILT_FEATURE);
        assert_eq!(tilt.rotate_y, 5.0);
        assert_eq!(tilt.rotate_x, 2.5);
        assert_eq!(tilt.highlight, (100.0, 0.0));
        assert_eq!(Tilt::rest().rotate_x, 0.0);
    }

    #[test]
    fn ripple_grows_fades_and_expires() {
        let mut ripples = Ripples::default();
        let rect = Rect::new(0.0, 0.0, 120.0, 40.0);
        ripples.spawn(Point::new(10.0, 10.0), &rect, ms(0));
        let ripple = *ripples.iter().next().unwrap();
        assert_eq!(ripple.size, 120.0);
        let (r0, o0) = ripple.frame(ms(0)).unwrap();
        let (r1, o1) = ripple.frame(ms(300)).unwrap();
        assert!(r1 > r0 && o1 < o0);
        assert!(ripple.frame(ms(600)).is_none());
        ripples.prune(ms(700));
        assert!(ripples.is_empty());
    }

    #[test]
    fn reveal_fires_once() {
        let mut reveal = RevealTracker::new(2);
        assert_eq!(reveal.style(0, ms(0)), (0.0, REVEAL_OFFSET));
        assert!(!reveal.observe(0, 0.05, ms(0)));
        assert!(reveal.observe(0, 0.1, ms(100)));
        assert!(!reveal.observe(0, 1.0, ms(200)));
        assert!(!reveal.is_observing(0));
        assert!(reveal.is_observing(1));
        assert_eq!(reveal.style(0, ms(900)), (1.0, 0.0));
        assert!(!reveal.observe(7, 1.0, ms(0)));
    }

    #[test]
    fn parallax_is_zero_at_center() {
        let viewport = Size::new(800.0, 600.0);
        assert_eq!(parallax(viewport.center(), viewport, 0.05), (0.0, 0.0));
        let (x, _) = parallax(Point::new(800.0, 300.0), viewport, 0.05);
        assert!((x - 5.0).abs() < 1e-9);
        let (ox, _) = orb_shift(Point::new(800.0, 300.0), viewport, 1);
        assert!((ox - 1.5).abs() < 1e-9);
    }

    #[test]
    fn typewriter_reveals_by_character() {
        let tw = TypeWriter::new("héllo", ms(1000));
        assert_eq!(tw.visible(ms(500)), "");
        assert_eq!(tw.visible(ms(1000)), "h");
        assert_eq!(tw.visible(ms(1050)), "hé");
        assert_eq!(tw.visible(ms(5000)), "héllo");
        assert!(tw.is_done(ms(5000)));
    }

    #[test]
    fn entrance_staggers_elements() {
        let mut entrance = Entrance::default();
        entrance.restart(ms(1000));
        let (first, _) = entrance.style(0, ms(1100));
        let (second, _) = entrance.style(1, ms(1100));
        assert!(first > second);
        assert_eq!(entrance.style(0, ms(5000)), (1.0, 0.0));
    }
}
