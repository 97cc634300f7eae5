//! Device-free sample generators.
//!
//! Everything here produces mono `f32` samples from plain iterators so it can be tested
//! headless; a frontend (e.g. rodio) wraps the iterators as playable sources.

use std::f32::consts::TAU;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Triangle,
    Square,
    Saw,
}

pub fn waveform_sample(wave: Waveform, phase: f32) -> f32 {
    match wave {
        Waveform::Sine => phase.sin(),
        Waveform::Triangle => (2.0 / std::f32::consts::PI) * phase.sin().asin(),
        Waveform::Square => {
            if phase.sin() >= 0.0 {
                1.0
            } else {
                -1.0
            }
        }
        Waveform::Saw => 2.0 * (phase / TAU) - 1.0,
    }
}

/// One enveloped oscillator note.
///
/// Gain ramps linearly from 0 to `volume` over `attack`, then decays exponentially to
/// `end_gain` at `duration`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub freq_hz: f32,
    pub waveform: Waveform,
    pub duration: f32,
    pub volume: f32,
    pub end_gain: f32,
    pub attack: f32,
    pub delay: f32,
}

impl Tone {
    pub const fn new(freq_hz: f32, waveform: Waveform, duration: f32, volume: f32) -> Self {
        Self {
            freq_hz,
            waveform,
            duration,
            volume,
            end_gain: 0.01,
            attack: 0.0,
            delay: 0.0,
        }
    }

    pub const fn with_delay(mut self, delay: f32) -> Self {
        self.delay = delay;
        self
    }

    pub const fn with_attack(mut self, attack: f32) -> Self {
        self.attack = attack;
        self
    }

    pub const fn with_end_gain(mut self, end_gain: f32) -> Self {
        self.end_gain = end_gain;
        self
    }

    pub fn end_time(&self) -> f32 {
        self.delay.max(0.0) + self.duration.max(0.0)
    }

    fn gain_at(&self, t: f32) -> f32 {
        if t < 0.0 || t >= self.duration || self.volume <= 0.0 {
            return 0.0;
        }
        if self.attack > 0.0 && t < self.attack {
            return self.volume * (t / self.attack);
        }
        let decay_len = (self.duration - self.attack).max(f32::EPSILON);
        let progress = ((t - self.attack) / decay_len).clamp(0.0, 1.0);
        let floor = self.end_gain.clamp(1e-5, self.volume);
        self.volume * (floor / self.volume).powf(progress)
    }
}

/// Plays a fixed set of (possibly delayed) tones, then ends.
#[derive(Debug, Clone)]
pub struct ToneVoice {
    tones: Vec<Tone>,
    phases: Vec<f32>,
    sample_rate: u32,
    frame: u64,
    total_frames: u64,
}

impl ToneVoice {
    pub fn new(tones: impl Into<Vec<Tone>>, sample_rate: u32) -> Self {
        let tones = tones.into();
        let sample_rate = sample_rate.max(1);
        let end = tones.iter().map(Tone::end_time).fold(0.0f32, f32::max);
        Self {
            phases: vec![0.0; tones.len()],
            tones,
            sample_rate,
            frame: 0,
            total_frames: (end * sample_rate as f32).ceil() as u64,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }
}

impl Iterator for ToneVoice {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.frame >= self.total_frames {
            return None;
        }
        let t = self.frame as f32 / self.sample_rate as f32;
        let mut sample = 0.0f32;
        for (tone, phase) in self.tones.iter().zip(self.phases.iter_mut()) {
            let local = t - tone.delay;
            let gain = tone.gain_at(local);
            if gain <= 0.0 {
                continue;
            }
            sample += waveform_sample(tone.waveform, *phase) * gain;
            *phase = (*phase + TAU * tone.freq_hz / self.sample_rate as f32) % TAU;
        }
        self.frame += 1;
        Some(sample)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.total_frames.saturating_sub(self.frame) as usize;
        (left, Some(left))
    }
}

/// Targets the spring voice glides toward for a given tension.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpringTargets {
    pub pitch_hz: f32,
    pub cutoff_hz: f32,
    pub gain: f32,
}

impl SpringTargets {
    pub const INITIAL: SpringTargets = SpringTargets {
        pitch_hz: 150.0,
        cutoff_hz: 200.0,
        gain: 0.1,
    };

    pub fn from_tension(tension: f32) -> Self {
        let tension = if tension.is_finite() { tension.max(0.0) } else { 0.0 };
        Self {
            pitch_hz: 80.0 + tension * 5.0,
            cutoff_hz: 200.0 + tension * 150.0,
            gain: (0.05 + tension * 0.02).min(0.25),
        }
    }
}

const TENSION_UNSET: u32 = u32::MAX;

#[derive(Debug)]
struct SpringShared {
    tension_bits: AtomicU32,
    stopping: AtomicBool,
}

/// Control handle shared between the game thread and a playing [`SpringVoice`].
#[derive(Debug, Clone)]
pub struct SpringControl {
    shared: Arc<SpringShared>,
}

impl SpringControl {
    pub fn set_tension(&self, tension: f32) {
        self.shared
            .tension_bits
            .store(tension.to_bits(), Ordering::Relaxed);
    }

    pub fn stop(&self) {
        self.shared.stopping.store(true, Ordering::Relaxed);
    }

    pub fn is_stopping(&self) -> bool {
        self.shared.stopping.load(Ordering::Relaxed)
    }

    fn targets(&self) -> SpringTargets {
        let bits = self.shared.tension_bits.load(Ordering::Relaxed);
        if bits == TENSION_UNSET {
            SpringTargets::INITIAL
        } else {
            SpringTargets::from_tension(f32::from_bits(bits))
        }
    }
}

const GLIDE_TIME_CONSTANT: f32 = 0.1;
const STOP_TIME_CONSTANT: f32 = 0.15;
const STOP_TAIL_SECONDS: f32 = 0.2;
const FILTER_Q: f32 = 15.0;
const COEFF_REFRESH_FRAMES: u64 = 32;

#[derive(Debug, Clone, Copy, Default)]
struct Biquad {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

impl Biquad {
    fn set_lowpass(&mut self, cutoff_hz: f32, q: f32, sample_rate: f32) {
        let nyquist = sample_rate * 0.5;
        let fc = cutoff_hz.clamp(10.0, nyquist * 0.95);
        let w0 = TAU * fc / sample_rate;
        let (sin, cos) = w0.sin_cos();
        let alpha = sin / (2.0 * q.max(0.1));
        let a0 = 1.0 + alpha;
        self.b0 = (1.0 - cos) * 0.5 / a0;
        self.b1 = (1.0 - cos) / a0;
        self.b2 = self.b0;
        self.a1 = -2.0 * cos / a0;
        self.a2 = (1.0 - alpha) / a0;
    }

    fn process(&mut self, x: f32) -> f32 {
        let y = self.b0 * x + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1
            - self.a2 * self.y2;
        self.x2 = self.x1;
        self.x1 = x;
        self.y2 = self.y1;
        self.y1 = if y.is_finite() { y } else { 0.0 };
        self.y1
    }
}

/// Continuous "spring tension" synth: a saw carrier through a resonant low-pass.
///
/// Pitch, cutoff and gain glide toward [`SpringTargets`] with a 0.1 s time constant. After
/// [`SpringControl::stop`], gain falls toward silence and the voice ends 0.2 s later.
#[derive(Debug, Clone)]
pub struct SpringVoice {
    control: SpringControl,
    sample_rate: u32,
    phase: f32,
    pitch_hz: f32,
    cutoff_hz: f32,
    gain: f32,
    filter: Biquad,
    frame: u64,
    stop_frame: Option<u64>,
}

impl SpringVoice {
    pub fn new(sample_rate: u32) -> (Self, SpringControl) {
        let control = SpringControl {
            shared: Arc::new(SpringShared {
                tension_bits: AtomicU32::new(TENSION_UNSET),
                stopping: AtomicBool::new(false),
            }),
        };
        let sample_rate = sample_rate.max(1);
        let mut filter = Biquad::default();
        filter.set_lowpass(SpringTargets::INITIAL.cutoff_hz, FILTER_Q, sample_rate as f32);
        let voice = Self {
            control: control.clone(),
            sample_rate,
            phase: 0.0,
            pitch_hz: SpringTargets::INITIAL.pitch_hz,
            cutoff_hz: SpringTargets::INITIAL.cutoff_hz,
            // Start muted, fade in.
            gain: 0.0,
            filter,
            frame: 0,
            stop_frame: None,
        };
        (voice, control)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }

    pub fn pitch_hz(&self) -> f32 {
        self.pitch_hz
    }

    fn glide(current: f32, target: f32, time_constant: f32, sample_rate: f32) -> f32 {
        let k = 1.0 - (-1.0 / (time_constant * sample_rate)).exp();
        current + (target - current) * k
    }
}

impl Iterator for SpringVoice {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        let sr = self.sample_rate as f32;
        if self.stop_frame.is_none() && self.control.is_stopping() {
            self.stop_frame = Some(self.frame);
        }

        if let Some(stop) = self.stop_frame {
            let tail = (STOP_TAIL_SECONDS * sr) as u64;
            if self.frame.saturating_sub(stop) >= tail {
                return None;
            }
            self.gain = Self::glide(self.gain, 0.0, STOP_TIME_CONSTANT, sr);
        } else {
            let targets = self.control.targets();
            self.pitch_hz = Self::glide(self.pitch_hz, targets.pitch_hz, GLIDE_TIME_CONSTANT, sr);
            self.cutoff_hz = Self::glide(self.cutoff_hz, targets.cutoff_hz, GLIDE_TIME_CONSTANT, sr);
            self.gain = Self::glide(self.gain, targets.gain, GLIDE_TIME_CONSTANT, sr);
        }

        if self.frame % COEFF_REFRESH_FRAMES == 0 {
            self.filter.set_lowpass(self.cutoff_hz, FILTER_Q, sr);
        }

        let carrier = waveform_sample(Waveform::Saw, self.phase);
        self.phase = (self.phase + TAU * self.pitch_hz / sr) % TAU;
        let filtered = self.filter.process(carrier);
        self.frame += 1;
        // Resonance can overshoot; soft-limit like the music runtime does.
        Some((filtered * self.gain).tanh())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tone_voice_length_matches_longest_delayed_tone() {
        let voice = ToneVoice::new(
            vec![
                Tone::new(440.0, Waveform::Sine, 0.25, 0.1),
                Tone::new(659.0, Waveform::Sine, 0.5, 0.1).with_delay(0.25),
            ],
            1_000,
        );
        assert_eq!(voice.total_frames(), 750);
        assert_eq!(voice.count(), 750);
    }

    #[test]
    fn tone_envelope_never_exceeds_volume_and_decays() {
        let tone = Tone::new(100.0, Waveform::Square, 0.2, 0.2);
        assert!((tone.gain_at(0.0) - 0.2).abs() < 1e-6);
        assert!(tone.gain_at(0.1) < 0.2);
        assert!(tone.gain_at(0.19) < 0.02);
        assert_eq!(tone.gain_at(0.2), 0.0);

        let peak = ToneVoice::new(vec![tone], 8_000).fold(0.0f32, |m, s| m.max(s.abs()));
        assert!(peak <= 0.2 + 1e-6);
    }

    #[test]
    fn attack_ramps_from_silence() {
        let tone = Tone::new(880.0, Waveform::Sine, 0.6, 0.2).with_attack(0.01);
        assert_eq!(tone.gain_at(0.0), 0.0);
        assert!((tone.gain_at(0.005) - 0.1).abs() < 1e-4);
        assert!((tone.gain_at(0.01) - 0.2).abs() < 1e-4);
    }

    #[test]
    fn spring_targets_follow_tension_and_cap_gain() {
        let t = SpringTargets::from_tension(4.0);
        assert!((t.pitch_hz - 100.0).abs() < 1e-6);
        assert!((t.cutoff_hz - 800.0).abs() < 1e-6);
        assert!((t.gain - 0.13).abs() < 1e-6);
        assert!((SpringTargets::from_tension(1_000.0).gain - 0.25).abs() < 1e-6);
        assert_eq!(SpringTargets::from_tension(f32::NAN), SpringTargets::from_tension(0.0));
    }

    #[test]
    fn spring_voice_glides_toward_tension_pitch() {
        let (mut voice, control) = SpringVoice::new(1_000);
        control.set_tension(20.0);
        for _ in 0..1_000 {
            voice.next();
        }
        // One second is ten time constants.
        assert!((voice.pitch_hz() - 180.0).abs() < 0.1, "pitch {}", voice.pitch_hz());
        assert!(voice.gain() > 0.2);
    }

    #[test]
    fn spring_voice_ends_after_stop_tail() {
        let (mut voice, control) = SpringVoice::new(1_000);
        for _ in 0..50 {
            assert!(voice.next().is_some());
        }
        control.stop();
        let tail = voice.by_ref().count();
        assert_eq!(tail, 200);
        assert!(voice.next().is_none());
    }

    #[test]
    fn spring_voice_output_is_finite_and_bounded() {
        let (voice, control) = SpringVoice::new(44_100);
        control.set_tension(300.0);
        for s in voice.take(44_100) {
            assert!(s.is_finite());
            assert!(s.abs() <= 1.0);
        }
    }
}
