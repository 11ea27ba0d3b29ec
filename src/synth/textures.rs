//! Procedural buffer textures
//!
//! Each texture renders a fixed-length stereo buffer once; the voice then
//! loops it. Every periodic component is aligned to a whole number of cycles
//! over the buffer so the loop point does not click.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

use super::filter::Biquad;
use super::noise::{white, BrownNoise, PinkNoise, SparseEvents};
use crate::engine::buffer::{AudioBuffer, ChannelLayout};

/// Buffer-synthesised textures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BufferAlgorithm {
    Rain,
    Ocean,
    Forest,
    Fire,
    WhiteNoise,
    PinkNoise,
    BrownNoise,
    ZenGarden,
    SingingBowl,
    TempleBell,
    Piano,
}

impl BufferAlgorithm {
    pub const ALL: [BufferAlgorithm; 11] = [
        BufferAlgorithm::Rain,
        BufferAlgorithm::Ocean,
        BufferAlgorithm::Forest,
        BufferAlgorithm::Fire,
        BufferAlgorithm::WhiteNoise,
        BufferAlgorithm::PinkNoise,
        BufferAlgorithm::BrownNoise,
        BufferAlgorithm::ZenGarden,
        BufferAlgorithm::SingingBowl,
        BufferAlgorithm::TempleBell,
        BufferAlgorithm::Piano,
    ];

    /// Strategy tag selecting this texture in a catalog
    pub fn tag(self) -> &'static str {
        match self {
            BufferAlgorithm::Rain => "rain",
            BufferAlgorithm::Ocean => "ocean",
            BufferAlgorithm::Forest => "forest",
            BufferAlgorithm::Fire => "fire",
            BufferAlgorithm::WhiteNoise => "white-noise",
            BufferAlgorithm::PinkNoise => "pink-noise",
            BufferAlgorithm::BrownNoise => "brown-noise",
            BufferAlgorithm::ZenGarden => "zen-garden",
            BufferAlgorithm::SingingBowl => "singing-bowl",
            BufferAlgorithm::TempleBell => "temple-bell",
            BufferAlgorithm::Piano => "piano",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|alg| alg.tag() == tag)
    }

    /// Length of the generated loop in seconds (always within 4..=12)
    pub fn duration_secs(self) -> f32 {
        match self {
            BufferAlgorithm::WhiteNoise => 4.0,
            BufferAlgorithm::PinkNoise | BufferAlgorithm::BrownNoise | BufferAlgorithm::Fire => {
                6.0
            }
            BufferAlgorithm::Rain => 8.0,
            BufferAlgorithm::Forest | BufferAlgorithm::ZenGarden => 10.0,
            BufferAlgorithm::Ocean
            | BufferAlgorithm::SingingBowl
            | BufferAlgorithm::TempleBell
            | BufferAlgorithm::Piano => 12.0,
        }
    }

    /// Render the texture into a fresh stereo buffer
    ///
    /// The result is not yet validated; `synth::synthesize` checks it.
    pub fn render<R: Rng + ?Sized>(self, sample_rate: u32, rng: &mut R) -> AudioBuffer {
        let frames = (self.duration_secs() * sample_rate as f32) as usize;
        let mut ctx = Texture {
            buffer: AudioBuffer::new(frames, ChannelLayout::Stereo, sample_rate),
            sample_rate,
            duration: self.duration_secs(),
        };
        match self {
            BufferAlgorithm::Rain => ctx.rain(rng),
            BufferAlgorithm::Ocean => ctx.ocean(rng),
            BufferAlgorithm::Forest => ctx.forest(rng),
            BufferAlgorithm::Fire => ctx.fire(rng),
            BufferAlgorithm::WhiteNoise => ctx.white_noise(rng),
            BufferAlgorithm::PinkNoise => ctx.pink_noise(rng),
            BufferAlgorithm::BrownNoise => ctx.brown_noise(rng),
            BufferAlgorithm::ZenGarden => ctx.zen_garden(rng),
            BufferAlgorithm::SingingBowl => ctx.singing_bowl(rng),
            BufferAlgorithm::TempleBell => ctx.temple_bell(rng),
            BufferAlgorithm::Piano => ctx.piano(rng),
        }
        ctx.buffer
    }
}

/// Mix two independent sources into decorrelated left/right channels
#[inline]
fn spread(a: f32, b: f32, weight: f32) -> (f32, f32) {
    (weight * a + (1.0 - weight) * b, (1.0 - weight) * a + weight * b)
}

/// Equal-power pan, `pan` in [-1, 1]
#[inline]
fn pan(signal: f32, pan: f32) -> (f32, f32) {
    let angle = (pan.clamp(-1.0, 1.0) + 1.0) * std::f32::consts::FRAC_PI_4;
    (angle.cos() * signal, angle.sin() * signal)
}

struct Texture {
    buffer: AudioBuffer,
    sample_rate: u32,
    duration: f32,
}

impl Texture {
    fn frames(&self) -> usize {
        self.buffer.len()
    }

    fn time(&self, frame: usize) -> f32 {
        frame as f32 / self.sample_rate as f32
    }

    /// Nearest frequency with a whole number of cycles over the buffer
    fn aligned(&self, frequency: f32) -> f32 {
        let cycles = (frequency * self.duration).round().max(1.0);
        cycles / self.duration
    }

    /// Slow modulator in [0, 1] with `cycles` full periods per loop
    fn swell(&self, frame: usize, cycles: f32) -> f32 {
        0.5 + 0.5 * (TAU * cycles * self.time(frame) / self.duration).sin()
    }

    /// Frame `lag` frames earlier, wrapping around the loop
    fn trailing(&self, frame: usize, lag: usize) -> usize {
        let frames = self.frames().max(1);
        (frame + frames - lag % frames) % frames
    }

    fn write(&mut self, frame: usize, (left, right): (f32, f32)) {
        self.buffer.samples[0][frame] = left;
        self.buffer.samples[1][frame] = right;
    }

    fn rain<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let mut hiss = Biquad::high_pass(400.0, self.sample_rate);
        let mut body = [PinkNoise::new(), PinkNoise::new()];
        let mut drops = SparseEvents::new(5e-5, 0.03, self.sample_rate);
        let mut drop_freq = 2000.0;
        let mut drop_pan = 0.0;
        let mut drop_phase = 0.0_f32;

        for i in 0..self.frames() {
            let intensity = 0.75 + 0.25 * self.swell(i, 2.0);
            let (a, b) = spread(white(rng), white(rng), 0.7);
            let hiss_l = hiss.process(a, 0) * 0.25;
            let hiss_r = hiss.process(b, 1) * 0.25;
            let body_l = body[0].next(white(rng)) * 0.3;
            let body_r = body[1].next(white(rng)) * 0.3;

            let (env, fired) = drops.next(rng);
            if fired {
                drop_freq = rng.gen_range(1500.0..3500.0);
                drop_pan = rng.gen_range(-0.8..0.8);
                drop_phase = 0.0;
            }
            drop_phase = (drop_phase + drop_freq / self.sample_rate as f32).fract();
            let (drop_l, drop_r) = pan((TAU * drop_phase).sin() * env * 0.3, drop_pan);

            self.write(
                i,
                (
                    (hiss_l + body_l) * intensity + drop_l,
                    (hiss_r + body_r) * intensity + drop_r,
                ),
            );
        }
    }

    fn ocean<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let mut rumble = [BrownNoise::default(), BrownNoise::default()];
        let mut wash = Biquad::low_pass(1200.0, self.sample_rate);

        let lag = self.sample_rate as usize / 4;
        for i in 0..self.frames() {
            // Two waves per loop, the right channel trailing slightly behind
            let wave_l = self.swell(i, 2.0).powi(2);
            let wave_r = self.swell(self.trailing(i, lag), 2.0).powi(2);
            let low_l = rumble[0].next(white(rng)) * 0.5;
            let low_r = rumble[1].next(white(rng)) * 0.5;
            let (a, b) = spread(white(rng), white(rng), 0.65);
            let foam_l = wash.process(a, 0) * 0.35;
            let foam_r = wash.process(b, 1) * 0.35;

            self.write(
                i,
                (
                    low_l * (0.4 + 0.6 * wave_l) + foam_l * wave_l,
                    low_r * (0.4 + 0.6 * wave_r) + foam_r * wave_r,
                ),
            );
        }
    }

    fn forest<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let mut wind = [PinkNoise::new(), PinkNoise::new()];
        let mut soften = Biquad::low_pass(800.0, self.sample_rate);
        let mut birds = SparseEvents::new(2e-5, 0.15, self.sample_rate);
        let mut chirp_freq = 3000.0_f32;
        let mut chirp_pan = 0.0;
        let mut chirp_phase = 0.0_f32;

        for i in 0..self.frames() {
            let gust = 0.5 + 0.3 * self.swell(i, 1.0);
            let (a, b) = spread(
                wind[0].next(white(rng)),
                wind[1].next(white(rng)),
                0.75,
            );
            let wind_l = soften.process(a, 0) * gust * 0.6;
            let wind_r = soften.process(b, 1) * gust * 0.6;

            let (env, fired) = birds.next(rng);
            if fired {
                chirp_freq = rng.gen_range(2500.0..4500.0);
                chirp_pan = rng.gen_range(-0.9..0.9);
                chirp_phase = 0.0;
            }
            // Fast vibrato gives the chirp its warble
            let age = birds.age() as f32 / self.sample_rate as f32;
            let freq = chirp_freq * (1.0 + 0.08 * (TAU * 28.0 * age).sin());
            chirp_phase = (chirp_phase + freq / self.sample_rate as f32).fract();
            let (bird_l, bird_r) = pan((TAU * chirp_phase).sin() * env * 0.25, chirp_pan);

            self.write(i, (wind_l + bird_l, wind_r + bird_r));
        }
    }

    fn fire<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let mut roar = [BrownNoise::default(), BrownNoise::default()];
        let mut warmth = Biquad::low_pass(500.0, self.sample_rate);
        let mut crackles = SparseEvents::new(1e-4, 0.008, self.sample_rate);
        let mut crackle_pan = 0.0;

        for i in 0..self.frames() {
            let flicker = 0.7 + 0.3 * self.swell(i, 3.0);
            let (a, b) = spread(
                roar[0].next(white(rng)),
                roar[1].next(white(rng)),
                0.7,
            );
            let base_l = warmth.process(a, 0) * flicker * 0.6;
            let base_r = warmth.process(b, 1) * flicker * 0.6;

            let (env, fired) = crackles.next(rng);
            if fired {
                crackle_pan = rng.gen_range(-0.7..0.7);
            }
            let (pop_l, pop_r) = pan(white(rng) * env * 0.5, crackle_pan);

            self.write(i, (base_l + pop_l, base_r + pop_r));
        }
    }

    fn white_noise<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for i in 0..self.frames() {
            let (l, r) = spread(white(rng), white(rng), 0.8);
            self.write(i, (l * 0.5, r * 0.5));
        }
    }

    fn pink_noise<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let mut pink = [PinkNoise::new(), PinkNoise::new()];
        for i in 0..self.frames() {
            let a = pink[0].next(white(rng));
            let b = pink[1].next(white(rng));
            let (l, r) = spread(a, b, 0.8);
            self.write(i, (l * 0.8, r * 0.8));
        }
        self.buffer.remove_dc();
    }

    fn brown_noise<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let mut brown = [BrownNoise::default(), BrownNoise::default()];
        for i in 0..self.frames() {
            let a = brown[0].next(white(rng));
            let b = brown[1].next(white(rng));
            self.write(i, spread(a, b, 0.75));
        }
        // Renormalize: strip any residual offset, then restore headroom
        self.buffer.remove_dc();
        self.buffer.normalize_peak(0.9);
        self.buffer.clamp();
    }

    fn zen_garden<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let mut air = [PinkNoise::new(), PinkNoise::new()];
        let mut soften = Biquad::low_pass(600.0, self.sample_rate);
        let mut drops = SparseEvents::new(1.5e-5, 0.25, self.sample_rate);
        let mut drop_freq = 1000.0_f32;
        let mut drop_pan = 0.0;
        let mut drop_phase = 0.0_f32;

        for i in 0..self.frames() {
            let breath = 0.6 + 0.4 * self.swell(i, 1.0);
            let (a, b) = spread(air[0].next(white(rng)), air[1].next(white(rng)), 0.7);
            let air_l = soften.process(a, 0) * 0.3 * breath;
            let air_r = soften.process(b, 1) * 0.3 * breath;

            let (env, fired) = drops.next(rng);
            if fired {
                drop_freq = rng.gen_range(700.0..1300.0);
                drop_pan = rng.gen_range(-0.6..0.6);
                drop_phase = 0.0;
            }
            // Pitch falls as the drop rings out
            let freq = drop_freq * (0.8 + 0.2 * env);
            drop_phase = (drop_phase + freq / self.sample_rate as f32).fract();
            let (drop_l, drop_r) = pan((TAU * drop_phase).sin() * env * 0.35, drop_pan);

            self.write(i, (air_l + drop_l, air_r + drop_r));
        }
    }

    fn singing_bowl<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        const PARTIALS: [(f32, f32); 4] = [(1.0, 1.0), (2.71, 0.5), (5.18, 0.25), (8.0, 0.12)];
        let fundamental: f32 = rng.gen_range(200.0..240.0);
        // Left/right detuning produces the slow beating of a real bowl
        let partials: Vec<(f32, f32, f32)> = PARTIALS
            .iter()
            .map(|&(ratio, amp)| {
                let left = self.aligned(fundamental * ratio);
                let right = self.aligned(fundamental * ratio + 0.25 * ratio);
                (left, right, amp)
            })
            .collect();
        let norm: f32 = PARTIALS.iter().map(|(_, amp)| amp).sum();

        for i in 0..self.frames() {
            let t = self.time(i);
            let swell = 0.6 + 0.4 * self.swell(i, 1.0);
            let (mut l, mut r) = (0.0, 0.0);
            for &(fl, fr, amp) in &partials {
                l += (TAU * fl * t).sin() * amp;
                r += (TAU * fr * t).sin() * amp;
            }
            let hush = white(rng) * 0.005;
            self.write(
                i,
                (l / norm * swell * 0.5 + hush, r / norm * swell * 0.5 - hush),
            );
        }
    }

    fn temple_bell<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        // Hum, prime, tierce, quint, nominal
        const PARTIALS: [(f32, f32); 6] = [
            (0.5, 0.6),
            (1.0, 1.0),
            (1.19, 0.5),
            (1.56, 0.35),
            (2.0, 0.3),
            (2.51, 0.15),
        ];
        let strike_base: f32 = rng.gen_range(160.0..200.0);
        let norm: f32 = PARTIALS.iter().map(|(_, amp)| amp).sum();
        let strike_at = 0.05;

        for i in 0..self.frames() {
            let t = self.time(i);
            if t < strike_at {
                continue;
            }
            let since = t - strike_at;
            let (mut l, mut r) = (0.0, 0.0);
            for (n, &(ratio, amp)) in PARTIALS.iter().enumerate() {
                // Higher partials die away faster
                let decay = (-since / (2.5 / (1.0 + n as f32 * 0.4))).exp();
                let f = strike_base * ratio;
                l += (TAU * f * since).sin() * amp * decay;
                r += (TAU * f * 1.002 * since).sin() * amp * decay;
            }
            let attack = (since / 0.004).min(1.0);
            self.write(i, (l / norm * attack * 0.7, r / norm * attack * 0.7));
        }
    }

    fn piano<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        // C major pentatonic, C4 to C5
        const SCALE: [f32; 6] = [261.63, 293.66, 329.63, 392.0, 440.0, 523.25];
        const HARMONICS: [(f32, f32); 3] = [(1.0, 1.0), (2.0, 0.4), (3.0, 0.15)];
        let spacing = 1.5;
        let notes: Vec<(f32, f32, f32)> = (0..8)
            .map(|n| {
                let freq = SCALE[rng.gen_range(0..SCALE.len())];
                let start = n as f32 * spacing + rng.gen_range(0.0..0.2);
                let note_pan = rng.gen_range(-0.5..0.5);
                (start, freq, note_pan)
            })
            .collect();

        for i in 0..self.frames() {
            let t = self.time(i);
            let (mut l, mut r) = (0.0, 0.0);
            for &(start, freq, note_pan) in &notes {
                if t < start {
                    continue;
                }
                let since = t - start;
                let env = (since / 0.005).min(1.0) * (-since / 1.2).exp();
                if env < 1e-4 {
                    continue;
                }
                // A hair of detune on the right keeps the image wide
                let tone = |detune: f32| -> f32 {
                    HARMONICS
                        .iter()
                        .map(|&(h, amp)| (TAU * freq * detune * h * since).sin() * amp)
                        .sum()
                };
                let (nl, _) = pan(tone(1.0) * env * 0.18, note_pan);
                let (_, nr) = pan(tone(1.0015) * env * 0.18, note_pan);
                l += nl;
                r += nr;
            }
            self.write(i, (l, r));
        }
    }
}
