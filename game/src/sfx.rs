use std::time::Duration;

use engine::audio::{SpringControl, SpringVoice, Tone, ToneVoice, Waveform};
use rodio::{OutputStream, OutputStreamHandle, Sink, Source};
use thiserror::Error;

use crate::host::Audio;
use crate::settings::AudioSettings;

pub const SAMPLE_RATE: u32 = 44_100;

pub const GRAB_TONES: [Tone; 1] = [Tone::new(300.0, Waveform::Sine, 0.1, 0.1)];

/// Bell-like ping: 10 ms linear attack, long exponential tail.
pub const DROP_TONES: [Tone; 1] = [Tone::new(880.0, Waveform::Sine, 0.6, 0.2)
    .with_attack(0.01)
    .with_end_gain(0.001)];

/// Rising A major arpeggio.
pub const CLEAR_TONES: [Tone; 3] = [
    Tone::new(440.0, Waveform::Sine, 0.3, 0.1),
    Tone::new(554.0, Waveform::Sine, 0.3, 0.1).with_delay(0.1),
    Tone::new(659.0, Waveform::Sine, 0.4, 0.1).with_delay(0.2),
];

pub const GAME_OVER_TONES: [Tone; 2] = [
    Tone::new(300.0, Waveform::Saw, 0.5, 0.2),
    Tone::new(200.0, Waveform::Saw, 0.5, 0.2).with_delay(0.3),
];

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("no audio output device: {0}")]
    Stream(#[from] rodio::StreamError),
    #[error("audio output rejected a sink: {0}")]
    Play(#[from] rodio::PlayError),
}

/// Adapts a mono `f32` sample iterator to a rodio source.
struct MonoSource<I> {
    samples: I,
    sample_rate: u32,
}

impl<I: Iterator<Item = f32>> Iterator for MonoSource<I> {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        self.samples.next()
    }
}

impl<I: Iterator<Item = f32>> Source for MonoSource<I> {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}

/// Speaker output through rodio. Each cue plays on its own detached sink; the spring voice
/// is steered through its [`SpringControl`] while it plays.
pub struct RodioAudio {
    _stream: OutputStream,
    handle: OutputStreamHandle,
    sfx_gain: f32,
    spring_gain: f32,
    spring: Option<SpringControl>,
}

impl RodioAudio {
    pub fn new(settings: AudioSettings) -> Result<Self, AudioError> {
        let (stream, handle) = OutputStream::try_default()?;
        // Fail early on devices that refuse sinks.
        Sink::try_new(&handle)?;
        Ok(Self {
            _stream: stream,
            handle,
            sfx_gain: settings.effective_sfx_gain(),
            spring_gain: settings.effective_spring_gain(),
            spring: None,
        })
    }

    fn play<I>(&self, samples: I, sample_rate: u32, volume: f32)
    where
        I: Iterator<Item = f32> + Send + 'static,
    {
        if volume <= 0.0 {
            return;
        }
        let sink = match Sink::try_new(&self.handle) {
            Ok(sink) => sink,
            Err(err) => {
                log::warn!("dropping sound: {err}");
                return;
            }
        };
        sink.set_volume(volume);
        sink.append(MonoSource {
            samples,
            sample_rate,
        });
        sink.detach();
    }

    fn play_tones(&self, tones: &[Tone]) {
        let voice = ToneVoice::new(tones.to_vec(), SAMPLE_RATE);
        self.play(voice, SAMPLE_RATE, self.sfx_gain);
    }
}

impl Audio for RodioAudio {
    fn play_grab(&mut self) {
        self.play_tones(&GRAB_TONES);
    }

    fn play_drop(&mut self) {
        self.play_tones(&DROP_TONES);
    }

    fn play_clear(&mut self) {
        self.play_tones(&CLEAR_TONES);
    }

    fn play_game_over(&mut self) {
        self.play_tones(&GAME_OVER_TONES);
    }

    fn start_spring(&mut self) {
        if self.spring.is_some() {
            return;
        }
        let (voice, control) = SpringVoice::new(SAMPLE_RATE);
        self.play(voice, SAMPLE_RATE, self.spring_gain);
        self.spring = Some(control);
    }

    fn update_spring(&mut self, tension: f32) {
        if let Some(control) = self.spring.as_ref() {
            control.set_tension(tension);
        }
    }

    fn stop_spring(&mut self) {
        if let Some(control) = self.spring.take() {
            control.stop();
        }
    }
}
