use crate::geometry::{Point, Size};
use rand::{Rng, SeedableRng, rng, rngs::StdRng};
use serde::{Deserialize, Serialize};
use strum::{EnumIter, IntoEnumIterator};

/// Particle population parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleSettings {
    pub count: usize,
    pub connection_distance: f64,
    pub pointer_radius: f64,
    pub max_speed: f64,
    pub attraction: f64,
    /// Full width of the initial per-axis velocity range, centred on zero.
    pub initial_speed: f64,
    pub min_radius: f64,
    pub max_radius: f64,
    /// Extra radius at zero pointer distance.
    pub radius_boost: f64,
    pub seed: Option<u64>,
}

impl Default for ParticleSettings {
    fn default() -> Self {
        Self {
            count: 60,
            connection_distance: 150.0,
            pointer_radius: 200.0,
            max_speed: 0.8,
            attraction: 0.0005,
            initial_speed: 0.3,
            min_radius: 2.0,
            max_radius: 5.0,
            radius_boost: 2.0,
            seed: None,
        }
    }
}

const LINK_OPACITY: f64 = 0.12;
const LINK_WIDTH: f64 = 0.5;
const LINK_POINTER_OPACITY: f64 = 0.15;
const LINK_POINTER_WIDTH: f64 = 1.0;
const POINTER_LINK_REACH: f64 = 0.8;
const POINTER_LINK_OPACITY: f64 = 0.2;
const POINTER_LINK_WIDTH: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
pub enum Tint {
    Gold,
    Navy,
}

impl Tint {
    pub fn rgb(&self) -> (u8, u8, u8) {
        match self {
            Self::Gold => (211, 158, 70),
            Self::Navy => (0, 51, 99),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Particle {
    pub pos: Point,
    pub vx: f64,
    pub vy: f64,
    pub radius: f64,
    pub base_radius: f64,
    pub tint: Tint,
}

impl Particle {
    pub fn speed(&self) -> f64 {
        self.vx.hypot(self.vy)
    }

    fn step(&mut self, bounds: Size, pointer: Option<Point>, settings: &ParticleSettings) {
        self.pos.x += self.vx;
        self.pos.y += self.vy;

        if self.pos.x < 0.0 || self.pos.x > bounds.width {
            self.vx = -self.vx;
        }
        if self.pos.y < 0.0 || self.pos.y > bounds.height {
            self.vy = -self.vy;
        }

        match pointer {
            Some(p) if self.pos.distance(p) < settings.pointer_radius => {
                let (dx, dy) = (p.x - self.pos.x, p.y - self.pos.y);
                let force = (settings.pointer_radius - dx.hypot(dy)) / settings.pointer_radius;
                self.vx += dx * force * settings.attraction;
                self.vy += dy * force * settings.attraction;
                self.radius = self.base_radius + force * settings.radius_boost;
            }
            _ => self.radius = self.base_radius,
        }

        (self.vx, self.vy) = clamp_speed(self.vx, self.vy, settings.max_speed);
    }
}

/// Rescales `(vx, vy)` so its magnitude does not exceed `max`. Direction is
/// preserved.
pub fn clamp_speed(vx: f64, vy: f64, max: f64) -> (f64, f64) {
    let speed = vx.hypot(vy);
    if speed > max && speed.is_finite() {
        (vx / speed * max, vy / speed * max)
    } else if !speed.is_finite() {
        (0.0, 0.0)
    } else {
        (vx, vy)
    }
}

/// Base opacity of a connection of length `distance`; zero at and beyond `max`.
pub fn link_opacity(distance: f64, max: f64) -> f64 {
    if max <= 0.0 {
        return 0.0;
    }
    (1.0 - distance / max).max(0.0) * LINK_OPACITY
}

/// A line between two particles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Link {
    pub from: usize,
    pub to: usize,
    pub opacity: f64,
    pub width: f64,
}

/// A line from a particle to the pointer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerLink {
    pub particle: usize,
    pub opacity: f64,
    pub width: f64,
}

/// Fixed-size particle population with proximity links and pointer attraction.
pub struct ParticleField {
    settings: ParticleSettings,
    bounds: Size,
    particles: Vec<Particle>,
    pointer: Option<Point>,
    rng: StdRng,
    running: bool,
}

impl ParticleField {
    pub fn new(settings: ParticleSettings, bounds: Size) -> Self {
        let rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => SeedableRng::seed_from_u64(rng().random()),
        };
        let mut field = Self {
            settings,
            bounds,
            particles: Vec::new(),
            pointer: Some(bounds.center()),
            rng,
            running: false,
        };
        field.populate();
        field
    }

    fn populate(&mut self) {
        let settings = &self.settings;
        let bounds = self.bounds;
        let rng = &mut self.rng;
        let tints: Vec<Tint> = Tint::iter().collect();

        let particles: Vec<Particle> = (0..settings.count)
            .map(|_| {
                let base_radius = settings.min_radius
                    + rng.random::<f64>() * (settings.max_radius - settings.min_radius);
                Particle {
                    pos: Point::new(
                        rng.random::<f64>() * bounds.width,
                        rng.random::<f64>() * bounds.height,
                    ),
                    vx: (rng.random::<f64>() - 0.5) * settings.initial_speed,
                    vy: (rng.random::<f64>() - 0.5) * settings.initial_speed,
                    radius: base_radius,
                    base_radius,
                    tint: tints[rng.random_range(0..tints.len())],
                }
            })
            .collect();
        self.particles = particles;
    }

    /// Replaces the whole population for the new bounds.
    pub fn resize(&mut self, bounds: Size) {
        self.bounds = bounds;
        self.populate();
    }

    /// Swaps settings and regenerates. Used on configuration reload.
    pub fn reconfigure(&mut self, settings: ParticleSettings) {
        if let Some(seed) = settings.seed {
            self.rng = StdRng::seed_from_u64(seed);
        }
        self.settings = settings;
        self.populate();
    }

    pub fn set_pointer(&mut self, pointer: Option<Point>) {
        self.pointer = pointer;
    }

    pub fn pointer(&self) -> Option<Point> {
        self.pointer
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn bounds(&self) -> Size {
        self.bounds
    }

    pub fn settings(&self) -> &ParticleSettings {
        &self.settings
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Advances every particle by one tick. A stopped field is left untouched.
    pub fn step(&mut self) {
        if !self.running {
            return;
        }
        let (bounds, pointer) = (self.bounds, self.pointer);
        for particle in &mut self.particles {
            particle.step(bounds, pointer, &self.settings);
        }
    }

    pub fn links(&self) -> Vec<Link> {
        let max = self.settings.connection_distance;
        let radius = self.settings.pointer_radius;
        let mut links = Vec::new();

        for (i, a) in self.particles.iter().enumerate() {
            for (j, b) in self.particles.iter().enumerate().skip(i + 1) {
                let dist = a.pos.distance(b.pos);
                if dist >= max {
                    continue;
                }

                let mut opacity = link_opacity(dist, max);
                let mut width = LINK_WIDTH;

                if let Some(p) = self.pointer {
                    let pointer_dist = a.pos.midpoint(b.pos).distance(p);
                    if pointer_dist < radius {
                        let influence = 1.0 - pointer_dist / radius;
                        opacity += influence * LINK_POINTER_OPACITY;
                        width += influence * LINK_POINTER_WIDTH;
                    }
                }

                links.push(Link {
                    from: i,
                    to: j,
                    opacity,
                    width,
                });
            }
        }
        links
    }

    pub fn pointer_links(&self) -> Vec<PointerLink> {
        let Some(p) = self.pointer else {
            return Vec::new();
        };
        let reach = self.settings.pointer_radius * POINTER_LINK_REACH;

        self.particles
            .iter()
            .enumerate()
            .filter_map(|(i, particle)| {
                let dist = particle.pos.distance(p);
                (dist < reach).then(|| PointerLink {
                    particle: i,
                    opacity: (1.0 - dist / reach) * POINTER_LINK_OPACITY,
                    width: POINTER_LINK_WIDTH,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(count: usize) -> ParticleField {
        let settings = ParticleSettings {
            count,
            seed: Some(7),
            ..Default::default()
        };
        let mut field = ParticleField::new(settings, Size::new(800.0, 600.0));
        field.start();
        field
    }

    fn place(field: &mut ParticleField, positions: &[(f64, f64)]) {
        for (particle, &(x, y)) in field.particles.iter_mut().zip(positions) {
            particle.pos = Point::new(x, y);
            particle.vx = 0.0;
            particle.vy = 0.0;
        }
    }

    #[test]
    fn population_is_fixed_and_in_bounds() {
        let field = seeded(60);
        assert_eq!(field.particles().len(), 60);
        for p in field.particles() {
            assert!((0.0..=800.0).contains(&p.pos.x));
            assert!((0.0..=600.0).contains(&p.pos.y));
            assert!((2.0..5.0).contains(&p.base_radius));
            assert!(p.vx.abs() <= 0.15 && p.vy.abs() <= 0.15);
        }
    }

    #[test]
    fn resize_regenerates_population() {
        let mut field = seeded(60);
        let before: Vec<Point> = field.particles().iter().map(|p| p.pos).collect();
        field.resize(Size::new(100.0, 100.0));
        assert_eq!(field.particles().len(), 60);
        assert!(field.particles().iter().all(|p| p.pos.x <= 100.0 && p.pos.y <= 100.0));
        let after: Vec<Point> = field.particles().iter().map(|p| p.pos).collect();
        assert_ne!(before, after);
    }

    #[test]
    fn clamp_speed_preserves_direction() {
        let cases = [(3.0, 4.0), (-10.0, 0.0), (0.0, -0.9), (100.0, -100.0)];
        for (vx, vy) in cases {
            let (cx, cy) = clamp_speed(vx, vy, 0.8);
            assert!(cx.hypot(cy) <= 0.8 + 1e-12);
            assert!(cx.hypot(cy) > 0.79);
            assert!((cx * vy - cy * vx).abs() < 1e-9, "direction changed");
        }
        assert_eq!(clamp_speed(0.1, 0.2, 0.8), (0.1, 0.2));
    }

    #[test]
    fn speed_never_exceeds_max_after_step() {
        let mut field = seeded(60);
        for (i, p) in field.particles.iter_mut().enumerate() {
            p.vx = 50.0 * (i as f64 - 30.0);
            p.vy = -7.0 * i as f64;
        }
        for _ in 0..20 {
            field.step();
            assert!(field.particles().iter().all(|p| p.speed() <= 0.8 + 1e-9));
        }
    }

    #[test]
    fn bounce_reverses_velocity_without_clamping_position() {
        let mut field = seeded(1);
        field.set_pointer(None);
        let p = &mut field.particles[0];
        p.pos = Point::new(799.9, 300.0);
        p.vx = 0.5;
        p.vy = 0.0;
        field.step();
        let p = &field.particles()[0];
        assert!(p.pos.x > 800.0);
        assert_eq!(p.vx, -0.5);
    }

    #[test]
    fn pointer_attracts_and_grows_radius() {
        let mut field = seeded(1);
        place(&mut field, &[(100.0, 100.0)]);
        field.set_pointer(Some(Point::new(200.0, 100.0)));
        field.step();
        let p = &field.particles()[0];
        assert!(p.vx > 0.0);
        assert!(p.radius > p.base_radius);

        field.set_pointer(Some(Point::new(700.0, 500.0)));
        field.step();
        let p = &field.particles()[0];
        assert_eq!(p.radius, p.base_radius);
    }

    #[test]
    fn stopped_field_does_not_move() {
        let mut field = seeded(5);
        field.stop();
        let before: Vec<Point> = field.particles().iter().map(|p| p.pos).collect();
        field.step();
        let after: Vec<Point> = field.particles().iter().map(|p| p.pos).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn distant_pairs_have_no_link() {
        let mut field = seeded(3);
        field.set_pointer(None);
        place(&mut field, &[(0.0, 0.0), (150.0, 0.0), (400.0, 400.0)]);
        assert!(field.links().is_empty());
        assert_eq!(link_opacity(150.0, 150.0), 0.0);
        assert_eq!(link_opacity(300.0, 150.0), 0.0);
    }

    #[test]
    fn near_pair_link_fades_with_distance() {
        let mut field = seeded(2);
        field.set_pointer(None);
        place(&mut field, &[(0.0, 0.0), (75.0, 0.0)]);
        let links = field.links();
        assert_eq!(links.len(), 1);
        assert!((links[0].opacity - 0.06).abs() < 1e-9);
        assert_eq!(links[0].width, 0.5);
    }

    #[test]
    fn pointer_boosts_links_near_midpoint() {
        let mut field = seeded(2);
        place(&mut field, &[(0.0, 0.0), (100.0, 0.0)]);
        field.set_pointer(Some(Point::new(50.0, 0.0)));
        let link = field.links()[0];
        assert!((link.opacity - (link_opacity(100.0, 150.0) + 0.15)).abs() < 1e-9);
        assert!((link.width - 1.5).abs() < 1e-9);
    }

    #[test]
    fn pointer_links_within_reach_only() {
        let mut field = seeded(2);
        place(&mut field, &[(0.0, 0.0), (500.0, 0.0)]);
        field.set_pointer(Some(Point::new(80.0, 0.0)));
        let links = field.pointer_links();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].particle, 0);
        assert!((links[0].opacity - 0.1).abs() < 1e-9);
    }
}
