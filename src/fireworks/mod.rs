//! Rocket-then-burst fireworks simulation.
//!
//! A single rocket climbs from the bottom centre at constant speed. At the
//! target height it is replaced by a radial burst of particles that slow down
//! under friction (no gravity, they must not fall) until the fastest one drops
//! below the settle threshold. From then on the burst is frozen in place.
//!
//! Everything here is plain data stepped one frame at a time with an injected
//! RNG, so it runs the same natively as in the browser. `controller` layers the
//! completion signal on top and `render` drives it from `requestAnimationFrame`.

use std::f64::consts::TAU;

use rand::Rng;

use crate::config::FireworksConfig;

pub mod controller;
pub mod render;

pub use controller::{CompletionLatch, Controller};

pub const PALETTE: [&str; 7] = [
    "#D946EF", "#EF4444", "#3B82F6", "#F59E0B", "#10B981", "#8B5CF6", "#EC4899",
];

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    pub color: &'static str,
    pub vx: f64,
    pub vy: f64,
    /// Reserved for fading; always 1.0 for now.
    pub alpha: f64,
    pub radius: f64,
}

impl Particle {
    pub fn speed(&self) -> f64 {
        self.vx.hypot(self.vy)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Rocket {
    pub x: f64,
    pub y: f64,
    /// Per-frame vertical velocity (negative is up).
    pub vy: f64,
    pub target_y: f64,
}

impl Rocket {
    /// Launch from bottom centre. Speed and burst height scale with the viewport.
    fn launch(viewport: Viewport, config: &FireworksConfig) -> Self {
        Self {
            x: viewport.width / 2.0,
            y: viewport.height,
            vy: -viewport.height * config.ascent_rate,
            target_y: viewport.height * config.target_fraction,
        }
    }

    fn reached_target(&self) -> bool {
        self.y <= self.target_y
    }
}

/// Animation phase. Transitions consume the previous variant and only move
/// forward: Ascending -> Exploding -> Frozen.
#[derive(Clone, Debug, PartialEq)]
pub enum Phase {
    Ascending(Rocket),
    Exploding(Vec<Particle>),
    Frozen(Vec<Particle>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PhaseKind {
    Ascending,
    Exploding,
    Frozen,
}

impl Phase {
    pub fn kind(&self) -> PhaseKind {
        match self {
            Phase::Ascending(_) => PhaseKind::Ascending,
            Phase::Exploding(_) => PhaseKind::Exploding,
            Phase::Frozen(_) => PhaseKind::Frozen,
        }
    }

    pub fn particles(&self) -> &[Particle] {
        match self {
            Phase::Ascending(_) => &[],
            Phase::Exploding(p) | Phase::Frozen(p) => p,
        }
    }
}

/// Phase change produced by a single step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    Exploded,
    Settled,
}

pub struct Simulation {
    config: FireworksConfig,
    viewport: Viewport,
    phase: Phase,
}

impl Simulation {
    pub fn new(config: FireworksConfig, viewport: Viewport) -> Self {
        let rocket = Rocket::launch(viewport, &config);
        Self { config, viewport, phase: Phase::Ascending(rocket) }
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn kind(&self) -> PhaseKind {
        self.phase.kind()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn config(&self) -> &FireworksConfig {
        &self.config
    }

    /// Fastest particle right now, 0 while the rocket is still climbing.
    pub fn max_speed(&self) -> f64 {
        self.phase.particles().iter().map(Particle::speed).fold(0.0, f64::max)
    }

    /// Advance one frame. Frozen bursts are left untouched.
    pub fn step<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<Transition> {
        match &mut self.phase {
            Phase::Ascending(rocket) => {
                rocket.y += rocket.vy;
                if !rocket.reached_target() {
                    return None;
                }
                let burst = explode(rocket.x, rocket.y, &self.config, rng);
                self.phase = Phase::Exploding(burst);
                Some(Transition::Exploded)
            }
            Phase::Exploding(particles) => {
                let max_speed = advance(particles, &self.config);
                if max_speed >= self.config.settle_threshold {
                    return None;
                }
                let settled = std::mem::take(particles);
                self.phase = Phase::Frozen(settled);
                Some(Transition::Settled)
            }
            Phase::Frozen(_) => None,
        }
    }

    /// Track a new viewport size. Only a climbing rocket is recentred; burst
    /// positions are kept as they are.
    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        if let Phase::Ascending(rocket) = &mut self.phase {
            rocket.x = viewport.width / 2.0;
        }
    }
}

/// Emit the radial burst at (x, y): particle `i` leaves at angle 2πi/N with a
/// random speed, colour and size.
pub fn explode<R: Rng + ?Sized>(x: f64, y: f64, config: &FireworksConfig, rng: &mut R) -> Vec<Particle> {
    let count = config.particle_count;
    (0..count)
        .map(|i| {
            let angle = TAU * i as f64 / count as f64;
            let speed = uniform(rng, config.min_speed, config.max_speed);
            let color = PALETTE[rng.gen_range(0..PALETTE.len())];
            Particle {
                x,
                y,
                color,
                vx: angle.cos() * speed,
                vy: angle.sin() * speed,
                alpha: 1.0,
                radius: uniform(rng, config.min_radius, config.max_radius),
            }
        })
        .collect()
}

/// Apply friction then move every particle by its slowed velocity. Returns the
/// fastest speed after friction.
pub fn advance(particles: &mut [Particle], config: &FireworksConfig) -> f64 {
    let mut max_speed: f64 = 0.0;
    for p in particles.iter_mut() {
        p.vx *= config.friction;
        p.vy *= config.friction;
        p.x += p.vx * config.slow_motion;
        p.y += p.vy * config.slow_motion;
        max_speed = max_speed.max(p.speed());
    }
    max_speed
}

// gen_range panics on an empty range; a degenerate config just pins the value.
fn uniform<R: Rng + ?Sized>(rng: &mut R, lo: f64, hi: f64) -> f64 {
    if hi > lo { rng.gen_range(lo..hi) } else { lo }
}
