//! Background music and the crash cue.
//!
//! Audio is best effort. Without an output device or a decodable track the
//! game runs silent; nothing here returns an error to the caller.

use std::io::Cursor;
use std::sync::Arc;

use fundsp::prelude::*;
use log::{debug, info, warn};
use rodio::buffer::SamplesBuffer;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};

const SAMPLE_RATE: u32 = 44_100;
const CRASH_SECS: f64 = 0.5;

/// Falling sawtooth, 400Hz down to 80Hz, fading out over half a second.
pub fn crash_cue(sample_rate: u32) -> Vec<f32> {
    let freq = lfo(|t: f64| 400.0 + (80.0 - 400.0) * (t / 0.4).min(1.0));
    let gain = lfo(|t: f64| 0.15 * (1.0 - (t / 0.5).min(1.0)));
    let mut cue = (freq >> saw()) * gain;
    cue.set_sample_rate(sample_rate as f64);
    let len = (sample_rate as f64 * CRASH_SECS) as usize;
    (0..len).map(|_| cue.get_mono()).collect()
}

struct Output {
    // Dropping the stream silences every sink created from it.
    _stream: OutputStream,
    handle: OutputStreamHandle,
    track: Option<Arc<[u8]>>,
    music: Option<Sink>,
}

impl Output {
    fn start_music(&mut self, muted: bool) {
        let Some(track) = self.track.clone() else {
            return;
        };
        let source = match Decoder::new(Cursor::new(track)) {
            Ok(source) => source.repeat_infinite(),
            Err(err) => {
                warn!("Music track cannot be decoded, disabling music: {err}");
                self.track = None;
                return;
            }
        };
        match Sink::try_new(&self.handle) {
            Ok(sink) => {
                sink.append(source);
                if muted {
                    sink.pause();
                }
                self.music = Some(sink);
            }
            Err(err) => warn!("Cannot open music sink: {err}"),
        }
    }

    fn play_crash(&self) {
        match Sink::try_new(&self.handle) {
            Ok(sink) => {
                sink.append(SamplesBuffer::new(1, SAMPLE_RATE, crash_cue(SAMPLE_RATE)));
                sink.detach();
            }
            Err(err) => debug!("Cannot play crash cue: {err}"),
        }
    }
}

pub struct Audio {
    output: Option<Output>,
    muted: bool,
    music_on: bool,
}

impl Audio {
    /// Silent audio that still tracks mute and music state.
    pub fn disabled(muted: bool) -> Self {
        Audio {
            output: None,
            muted,
            music_on: false,
        }
    }

    pub fn open(track: Option<Arc<[u8]>>, muted: bool) -> Self {
        match OutputStream::try_default() {
            Ok((stream, handle)) => {
                info!("Audio output opened");
                Audio {
                    output: Some(Output {
                        _stream: stream,
                        handle,
                        track,
                        music: None,
                    }),
                    muted,
                    music_on: false,
                }
            }
            Err(err) => {
                warn!("No audio output, running silent: {err}");
                Self::disabled(muted)
            }
        }
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Whether the music loop is (logically) running, muted or not.
    pub fn music_on(&self) -> bool {
        self.music_on
    }

    /// Starts the loop from the beginning if it is not already running.
    pub fn start_music(&mut self) {
        if self.music_on {
            return;
        }
        self.music_on = true;
        if let Some(out) = &mut self.output {
            out.start_music(self.muted);
        }
    }

    /// Stops the loop and rewinds it, then plays the crash cue.
    pub fn game_over(&mut self) {
        self.music_on = false;
        if let Some(out) = &mut self.output {
            if let Some(sink) = out.music.take() {
                sink.stop();
            }
            if !self.muted {
                out.play_crash();
            }
        }
    }

    pub fn toggle_mute(&mut self) -> bool {
        self.muted = !self.muted;
        if let Some(sink) = self.output.as_ref().and_then(|o| o.music.as_ref()) {
            if self.muted {
                sink.pause();
            } else {
                sink.play();
            }
        }
        info!("Audio {}", if self.muted { "muted" } else { "unmuted" });
        self.muted
    }
}

impl Drop for Audio {
    fn drop(&mut self) {
        if let Some(sink) = self.output.as_mut().and_then(|o| o.music.take()) {
            sink.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crash_cue_shape() {
        let samples = crash_cue(8_000);
        assert_eq!(samples.len(), 4_000);
        assert!(samples.iter().all(|s| s.abs() <= 0.2));
        assert!(samples[..1_000].iter().any(|s| s.abs() > 0.01));
        assert!(samples[3_990..].iter().all(|s| s.abs() < 0.01));
    }

    #[test]
    fn test_music_lifecycle_when_disabled() {
        let mut audio = Audio::disabled(false);
        assert!(!audio.music_on());
        audio.start_music();
        assert!(audio.music_on());
        audio.start_music();
        assert!(audio.music_on());
        audio.game_over();
        assert!(!audio.music_on());
        audio.start_music();
        assert!(audio.music_on());
    }

    #[test]
    fn test_mute_is_independent_of_music() {
        let mut audio = Audio::disabled(false);
        assert!(audio.toggle_mute());
        audio.start_music();
        assert!(audio.music_on());
        assert!(audio.is_muted());
        audio.game_over();
        assert!(audio.is_muted());
        assert!(!audio.toggle_mute());
    }
}
