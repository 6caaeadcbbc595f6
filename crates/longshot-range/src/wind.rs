//! Gusting wind field over the range.
//!
//! Each component is the curl of a simplex noise potential, scaled in
//! downrange, crossrange and time. The whole field drifts with the mean
//! wind over a sample box, so gusts travel across the range. Heights are
//! ignored.

use glam::{Vec2, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::noise::SimplexNoise;
use crate::units::{mph_to_mps, yards_to_m};

/// Step in scaled noise space for the finite differences.
const CURL_STEP: f32 = 0.01;
/// Points averaged per `advance_time` to estimate the drift.
const ADVECTION_SAMPLES: usize = 10;
/// Points used to measure a component's RMS curl magnitude.
const RMS_SAMPLES: usize = 1000;
const GATE_SLOPE: f32 = 4.0;

/// One octave of the field.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct WindComponent {
    /// Typical speed, m/s. Output is clipped at twice this.
    pub strength: f32,
    /// Spatial scales in metres; larger varies more slowly.
    pub downrange_scale: f32,
    pub crossrange_scale: f32,
    /// Time scale in seconds; larger varies more slowly.
    pub temporal_scale: f32,
    /// Below 1 the speed sits near `strength` more often (gustier), above 1 it is steadier.
    pub exponent: f32,
    /// Self-gating threshold as a fraction of `strength`. `0.0` disables the gate.
    pub gate: f32,
}

impl WindComponent {
    fn is_valid(&self) -> bool {
        [self.strength, self.downrange_scale, self.crossrange_scale, self.temporal_scale, self.exponent, self.gate]
            .iter()
            .all(|v| v.is_finite())
            && self.strength >= 0.0
            && self.downrange_scale > 0.0
            && self.crossrange_scale > 0.0
            && self.temporal_scale > 0.0
            && self.exponent > 0.0
            && self.gate >= 0.0
    }
}

/// Named wind conditions: a steady large-scale octave plus a gated gust octave.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum WindPreset {
    Dead,
    Calm,
    Moderate,
    Strong,
    ExtraStrong,
}

impl WindPreset {
    pub const ALL: [WindPreset; 5] = [
        WindPreset::Dead,
        WindPreset::Calm,
        WindPreset::Moderate,
        WindPreset::Strong,
        WindPreset::ExtraStrong,
    ];

    pub fn name(self) -> &'static str {
        match self {
            WindPreset::Dead => "dead",
            WindPreset::Calm => "calm",
            WindPreset::Moderate => "moderate",
            WindPreset::Strong => "strong",
            WindPreset::ExtraStrong => "extra strong",
        }
    }

    pub fn components(self) -> Vec<WindComponent> {
        // (base mph, gust mph, gust gate mph)
        let (base, gust, gate) = match self {
            WindPreset::Dead => (0.5, 0.25, 0.25),
            WindPreset::Calm => (1.0, 0.5, 0.5),
            WindPreset::Moderate => (3.0, 6.0, 3.0),
            WindPreset::Strong => (7.0, 10.0, 8.0),
            WindPreset::ExtraStrong => (12.0, 15.0, 10.0),
        };
        vec![
            WindComponent {
                strength: mph_to_mps(base),
                downrange_scale: yards_to_m(10_000.0),
                crossrange_scale: yards_to_m(10_000.0),
                temporal_scale: 15.0 * 60.0,
                exponent: 0.5,
                gate: 0.0,
            },
            WindComponent {
                strength: mph_to_mps(gust),
                downrange_scale: yards_to_m(1_000.0),
                crossrange_scale: yards_to_m(1_000.0),
                temporal_scale: 3.0 * 60.0,
                exponent: 0.5,
                gate: gate / gust,
            },
        ]
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct WindConfig {
    /// Mean wind added on top of the field, world space, m/s.
    pub steady: Vec3,
    pub preset: WindPreset,
    pub seed: u64,
    /// Multiplier on the drift speed of the field.
    pub advection_gain: f32,
    /// EMA factor of the drift estimate, `0.0..=1.0`.
    pub advection_alpha: f32,
}

impl Default for WindConfig {
    fn default() -> Self {
        Self {
            steady: Vec3::ZERO,
            preset: WindPreset::Moderate,
            seed: 0x5eed,
            advection_gain: 5.0,
            advection_alpha: 0.01,
        }
    }
}

#[derive(Debug, Clone)]
struct Octave {
    params: WindComponent,
    noise: SimplexNoise,
    rms: f32,
}

/// Position- and time-dependent wind.
///
/// Internally positions are `(downrange, crossrange)` metres; the public
/// API takes and returns world-space vectors.
#[derive(Debug, Clone)]
pub struct WindGenerator {
    octaves: Vec<Octave>,
    rng: StdRng,
    steady: Vec3,
    time: f32,
    sample_min: Vec2,
    sample_max: Vec2,
    advection_gain: f32,
    advection_alpha: f32,
    advection_offset: Vec2,
    advection_velocity: Vec2,
}

impl WindGenerator {
    /// Empty field: only the steady wind blows.
    pub fn new(seed: u64) -> Self {
        Self {
            octaves: Vec::new(),
            rng: StdRng::seed_from_u64(seed),
            steady: Vec3::ZERO,
            time: 0.0,
            sample_min: Vec2::new(0.0, -100.0),
            sample_max: Vec2::new(1000.0, 100.0),
            advection_gain: 1.0,
            advection_alpha: 0.01,
            advection_offset: Vec2::ZERO,
            advection_velocity: Vec2::ZERO,
        }
    }

    /// Field for a range `length` metres long and `width` metres wide.
    pub fn from_config(config: &WindConfig, length: f32, width: f32) -> Self {
        let mut wind = Self::new(config.seed);
        wind.steady = config.steady;
        wind.set_advection_gain(config.advection_gain);
        wind.set_advection_alpha(config.advection_alpha);
        wind.set_sample_area(Vec2::new(0.0, -width * 0.5), Vec2::new(length, width * 0.5));
        for c in config.preset.components() {
            wind.add_component(c);
        }
        wind
    }

    /// Adds an octave and measures its RMS curl so `strength` means the same
    /// speed at every scale. Invalid components are skipped with a warning.
    pub fn add_component(&mut self, params: WindComponent) {
        if !params.is_valid() {
            log::warn!("WindGenerator: ignoring invalid component {params:?}");
            return;
        }
        let noise = SimplexNoise::new(&mut self.rng);
        let mut octave = Octave { params, noise, rms: 0.0 };

        let mut sum_sq = 0.0;
        for _ in 0..RMS_SAMPLES {
            let p = Vec2::new(
                self.rng.gen_range(-1000.0..1000.0) * params.downrange_scale,
                self.rng.gen_range(-1000.0..1000.0) * params.crossrange_scale,
            );
            let t = self.time + self.rng.gen_range(-1000.0..1000.0) * params.temporal_scale;
            sum_sq += octave.curl(p, t).length_squared();
        }
        octave.rms = (sum_sq / RMS_SAMPLES as f32).sqrt();

        self.octaves.push(octave);
    }

    /// Downrange/crossrange box that the drift is averaged over.
    pub fn set_sample_area(&mut self, min: Vec2, max: Vec2) {
        self.sample_min = min.min(max);
        self.sample_max = min.max(max);
    }

    pub fn set_advection_gain(&mut self, gain: f32) {
        self.advection_gain = if gain.is_finite() { gain.max(0.0) } else { 0.0 };
    }

    pub fn set_advection_alpha(&mut self, alpha: f32) {
        self.advection_alpha = if alpha.is_finite() { alpha.clamp(0.0, 1.0) } else { 0.0 };
    }

    #[inline]
    pub fn time(&self) -> f32 {
        self.time
    }

    #[inline]
    pub fn component_count(&self) -> usize {
        self.octaves.len()
    }

    /// Moves the field to `now` seconds and lets it drift with the mean wind.
    ///
    /// Steps are clamped to `[0, 1]` s, so time going backwards stalls the
    /// drift without rewinding it.
    pub fn advance_time(&mut self, now: f32) {
        if !now.is_finite() {
            return;
        }
        let dt = (now - self.time).clamp(0.0, 1.0);
        self.time = now;
        if self.octaves.is_empty() {
            return;
        }

        let mut mean = Vec2::ZERO;
        for _ in 0..ADVECTION_SAMPLES {
            let u = Vec2::new(self.rng.r#gen(), self.rng.r#gen());
            mean += self.sample_range(self.sample_min + (self.sample_max - self.sample_min) * u);
        }
        mean /= ADVECTION_SAMPLES as f32;

        let a = self.advection_alpha;
        self.advection_velocity = self.advection_velocity * (1.0 - a) + mean * self.advection_gain * a;
        self.advection_offset += self.advection_velocity * dt;
    }

    /// World-space wind at `position`, m/s. `y` is always zero.
    pub fn sample(&self, position: Vec3) -> Vec3 {
        self.steady + to_world(self.sample_range(to_range(position)))
    }

    fn sample_range(&self, p: Vec2) -> Vec2 {
        let p = p - self.advection_offset;
        self.octaves.iter().map(|o| o.sample(p, self.time)).sum()
    }
}

impl Octave {
    /// Curl `(∂ψ/∂c, −∂ψ/∂d)` of the noise potential ψ, in world-space derivatives.
    fn curl(&self, p: Vec2, t: f32) -> Vec2 {
        let c = &self.params;
        let sx = p.x / c.downrange_scale;
        let sy = p.y / c.crossrange_scale;
        let st = t / c.temporal_scale;

        let n = |x: f32, y: f32| self.noise.noise3(x, y, st);
        let dx = (n(sx + CURL_STEP, sy) - n(sx - CURL_STEP, sy)) / (2.0 * CURL_STEP);
        let dy = (n(sx, sy + CURL_STEP) - n(sx, sy - CURL_STEP)) / (2.0 * CURL_STEP);

        Vec2::new(dy / c.crossrange_scale, -dx / c.downrange_scale)
    }

    fn sample(&self, p: Vec2, t: f32) -> Vec2 {
        let c = &self.params;
        let curl = self.curl(p, t);
        let magnitude = curl.length();
        if magnitude <= 0.0 || !magnitude.is_finite() {
            return Vec2::ZERO;
        }

        let normalized = magnitude / (self.rms + 1e-6);
        let mut speed = normalized.powf(c.exponent) * c.strength;
        if c.gate > 0.0 {
            let threshold = c.gate * c.strength;
            speed /= 1.0 + (-GATE_SLOPE * (speed - threshold)).exp();
        }
        speed = speed.min(2.0 * c.strength);

        curl / magnitude * speed
    }
}

/// World `(x crossrange, z upwind)` to `(downrange, crossrange)`.
#[inline]
fn to_range(p: Vec3) -> Vec2 {
    Vec2::new(-p.z, p.x)
}

#[inline]
fn to_world(v: Vec2) -> Vec3 {
    Vec3::new(v.y, 0.0, -v.x)
}
