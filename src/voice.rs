// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! Voices for polyphonic playback.
//!
//! A voice is one sounding note. It plays either a window of the bank's sample data
//! or a built-in math waveform, shaped by a volume envelope, until the sample
//! position reaches its note-end.

mod envelope;
mod pool;
pub(crate) mod wavetable;

pub use envelope::{Envelope, EnvelopePhase};
pub use pool::{Allocation, VoicePool, MAX_VOICES};

use std::f64::consts::{PI, TAU};

use serde::Deserialize;

/// Note-end value of a voice that sustains until its note-off.
pub const SUSTAINING: u64 = u64::MAX;

/// Built-in waveforms used when no bank is loaded.
#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    #[default]
    Sine,
    Sawtooth,
    Triangle,
    /// Square wave whose pulse width follows the shared LFO.
    Square,
}

impl Waveform {
    /// Returns the waveform value at `phase` (radians, 0 to 2π). `lfo` is the shared
    /// low-frequency oscillator value in -1.0 to 1.0.
    pub fn sample(self, phase: f64, lfo: f32) -> f32 {
        let ramp = (phase - PI) / PI;
        match self {
            Waveform::Sine => phase.sin() as f32,
            Waveform::Sawtooth => ramp as f32,
            Waveform::Triangle => (2.0 * ramp.abs() - 1.0) as f32,
            Waveform::Square => {
                let width = (lfo as f64 + 1.0) * 0.98;
                if phase > PI * width {
                    -1.0
                } else {
                    1.0
                }
            }
        }
    }
}

/// Wraps a math oscillator phase back into 0 to 2π.
pub(crate) fn wrap_phase(phase: f64) -> f64 {
    phase.rem_euclid(TAU)
}

/// How a sample window loops, from the `sampleModes` generator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LoopMode {
    #[default]
    NoLoop,
    /// Loops for the whole life of the voice, release included.
    Continuous,
    /// Loops until note-off, then plays out to the sample end.
    UntilRelease,
}

impl LoopMode {
    pub fn from_sample_modes(modes: u16) -> LoopMode {
        match modes & 3 {
            1 => LoopMode::Continuous,
            3 => LoopMode::UntilRelease,
            _ => LoopMode::NoLoop,
        }
    }
}

/// The part of the bank's sample data a voice plays. All offsets are absolute
/// indices into the sample data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SampleWindow {
    pub start: usize,
    pub end: usize,
    pub loop_start: usize,
    pub loop_end: usize,
    pub mode: LoopMode,
}

impl SampleWindow {
    /// Whether the window currently wraps at its loop end.
    pub fn loops(&self) -> bool {
        self.mode != LoopMode::NoLoop && self.loop_end > self.loop_start
    }

    pub fn loop_len(&self) -> usize {
        self.loop_end.saturating_sub(self.loop_start)
    }
}

/// What a voice plays.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Source {
    Sample(SampleWindow),
    Math(Waveform),
}

impl Default for Source {
    fn default() -> Self {
        Source::Math(Waveform::Sine)
    }
}

/// One slot of the voice pool.
#[derive(Clone, Copy, Debug, Default)]
pub struct Voice {
    pub(crate) note: u8,
    pub(crate) velocity: u8,
    pub(crate) channel: u8,
    /// Velocity and attenuation, linear.
    pub(crate) gain: f32,
    /// Sample offset from the window start, or radians for math waveforms.
    pub(crate) phase: f64,
    pub(crate) increment: f64,
    /// 0.0 is hard left, 1.0 hard right.
    pub(crate) pan: f32,
    pub(crate) envelope: Envelope,
    pub(crate) source: Source,
    pub(crate) exclusive_class: u16,
    pub(crate) start: u64,
    pub(crate) end: u64,
    pub(crate) sustained: bool,
}

impl Voice {
    pub fn note(&self) -> u8 {
        self.note
    }

    pub fn velocity(&self) -> u8 {
        self.velocity
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }

    pub fn increment(&self) -> f64 {
        self.increment
    }

    pub fn pan(&self) -> f32 {
        self.pan
    }

    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    pub fn exclusive_class(&self) -> u16 {
        self.exclusive_class
    }

    /// Sample position the note starts sounding at.
    pub fn start(&self) -> u64 {
        self.start
    }

    /// Sample position the voice stops at, or [`SUSTAINING`].
    pub fn end(&self) -> u64 {
        self.end
    }

    pub fn is_sustained(&self) -> bool {
        self.sustained
    }

    /// Free voices may be reused by the allocator.
    pub fn is_free(&self, now: u64) -> bool {
        self.end <= now
    }

    /// Whether the voice is still waiting for its note-off.
    pub fn is_held(&self) -> bool {
        self.end == SUSTAINING
    }

    /// Moves the voice into its release phase. A voice already releasing is never
    /// extended.
    pub fn release(&mut self, now: u64) {
        let end = now.saturating_add(self.envelope.release as u64);
        self.end = self.end.min(end);
        self.sustained = false;
        if let Source::Sample(window) = &mut self.source {
            if window.mode == LoopMode::UntilRelease {
                window.mode = LoopMode::NoLoop;
            }
        }
    }

    /// Stops the voice immediately.
    pub fn kill(&mut self, now: u64) {
        self.end = self.end.min(now);
        self.sustained = false;
    }
}
