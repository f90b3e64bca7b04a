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

//! The voice engine.
//!
//! The engine owns the channel table and the voice pool, and is the only consumer of
//! the event queue. [`Engine::render`] is meant to be called from the audio callback:
//! it never allocates, locks or blocks.

mod lfo;
mod normalize;

#[cfg(test)]
mod tests;

pub use lfo::Lfo;
pub use normalize::Normalizer;

use std::f64::consts::TAU;
use std::sync::Arc;

use midly::MidiMessage;
use tracing::{debug, info, trace, warn};

use crate::bank::{Bank, PERCUSSION_BANK};
use crate::channel::{ChannelState, ControlEffect};
use crate::config::EngineConfig;
use crate::midi::{controller, SysEx, CHANNELS};
use crate::queue::{EventConsumer, QueuedEvent};
use crate::resolver::{self, NoteRequest};
use crate::units::{note_to_frequency, timecents_to_samples, PITCH_BEND_CENTER};
use crate::voice::{
    wavetable, wrap_phase, Envelope, Source, Voice, VoicePool, MAX_VOICES, SUSTAINING,
};

/// Percussion channels after a GS reset: channel 10 only.
const GS_PERCUSSION_MASK: u16 = 1 << 9;

/// Output channels per frame.
const STEREO: usize = 2;

/// Sustain level of math waveform voices.
const MATH_SUSTAIN: f32 = 0.4;

/// Renders stereo audio from queued MIDI events.
pub struct Engine {
    config: EngineConfig,
    sample_rate: f32,
    bank: Option<Arc<Bank>>,
    channels: [ChannelState; CHANNELS],
    voices: VoicePool,
    events: EventConsumer,
    /// Absolute output sample position of the next frame.
    position: u64,
    /// Bit per channel, set when the channel plays the percussion bank.
    percussion: u16,
    lfo: Lfo,
    normalizer: Normalizer,
}

impl Engine {
    /// Creates an engine from a validated config. A bank that fails validation is
    /// dropped and the engine falls back to math waveforms.
    pub(crate) fn new(
        config: EngineConfig,
        bank: Option<Arc<Bank>>,
        events: EventConsumer,
    ) -> Engine {
        let bank = bank.filter(|bank| match bank.validate() {
            Ok(()) => true,
            Err(e) => {
                warn!(err = %e, "Bank failed validation, using math waveforms");
                false
            }
        });

        let sample_rate = config.sample_rate();
        info!(
            sample_rate,
            max_voices = MAX_VOICES,
            presets = bank.as_ref().map(|b| b.preset_count()).unwrap_or(0),
            "Voice engine ready"
        );

        Engine {
            sample_rate: sample_rate as f32,
            bank,
            channels: std::array::from_fn(|_| ChannelState::default()),
            voices: VoicePool::new(),
            events,
            position: 0,
            percussion: config.percussion_mask(),
            lfo: Lfo::new(sample_rate),
            normalizer: Normalizer::default(),
            config,
        }
    }

    /// Renders interleaved stereo frames into `out`. Events are applied at the frame
    /// their timestamp falls on. A trailing odd sample is zeroed.
    pub fn render(&mut self, out: &mut [f32]) {
        let mut frames = out.chunks_exact_mut(STEREO);
        for frame in &mut frames {
            let (left, right) = self.process_frame();
            frame[0] = left;
            frame[1] = right;
        }
        frames.into_remainder().fill(0.0);

        if self.config.normalize() {
            self.normalizer.process(out, STEREO);
        }
    }

    /// Produces one stereo frame and advances the sample position.
    fn process_frame(&mut self) -> (f32, f32) {
        let now = self.position;
        while let Some(event) = self.events.pop_due(now) {
            self.handle_event(event);
        }

        let lfo = self.lfo.next_value();
        let rate = self.sample_rate;
        let data: &[i16] = self
            .bank
            .as_ref()
            .map(|bank| bank.sample_data.as_slice())
            .unwrap_or(&[]);

        let mut left = 0.0;
        let mut right = 0.0;
        for voice in self.voices.iter_mut() {
            if voice.is_free(now) || now < voice.start {
                continue;
            }
            let channel = &self.channels[voice.channel as usize];
            let elapsed = now - voice.start;
            let remaining = voice.end - now;

            if voice.envelope.is_silent(elapsed) {
                voice.kill(now);
                continue;
            }
            let gain = voice.envelope.gain(elapsed, remaining) * voice.gain * channel.volume();

            let value = match voice.source {
                Source::Sample(window) => {
                    let end = window.end as f64;
                    if window.loops() && window.start as f64 + voice.phase >= window.loop_end as f64
                    {
                        voice.phase -= window.loop_len() as f64;
                    }
                    if window.start as f64 + voice.phase >= end {
                        voice.kill(now);
                        continue;
                    }
                    wavetable::read(data, &window, voice.phase)
                }
                Source::Math(waveform) => {
                    voice.phase = wrap_phase(voice.phase);
                    waveform.sample(voice.phase, lfo)
                }
            };
            let value = value * gain;

            voice.pan += (channel.pan() - voice.pan) / rate;
            left += value * (1.0 - voice.pan);
            right += value * voice.pan;

            voice.phase += voice.increment
                * channel.bend_multiplier() as f64
                * (channel.modulation_multiplier() * lfo + 1.0) as f64;

            if remaining <= 1 {
                voice.kill(now);
            }
        }

        self.position += 1;
        (left, right)
    }

    /// Applies one due event to the channel table and voice pool.
    fn handle_event(&mut self, event: QueuedEvent) {
        let now = self.position;
        let ch = event.channel & 0x0f;
        let channel = &mut self.channels[ch as usize];

        match event.message {
            MidiMessage::NoteOn { key, vel } if vel.as_int() == 0 => {
                let sustain = channel.sustain_held();
                self.voices.release_note(ch, key.as_int(), now, sustain);
            }
            MidiMessage::NoteOn { key, vel } => self.note_on(ch, key.as_int(), vel.as_int()),
            MidiMessage::NoteOff { key, .. } => {
                let sustain = channel.sustain_held();
                self.voices.release_note(ch, key.as_int(), now, sustain);
            }
            MidiMessage::Aftertouch { .. } => {}
            MidiMessage::Controller { controller, value } => {
                match channel.control_change(controller.as_int(), value.as_int()) {
                    ControlEffect::None => {}
                    ControlEffect::SustainReleased => {
                        self.voices.release_sustained(ch, now);
                    }
                    ControlEffect::AllNotesOff => self.voices.release_channel(ch, now),
                    ControlEffect::AllSoundsOff => self.voices.kill_channel(ch, now),
                }
            }
            MidiMessage::ProgramChange { program } => channel.program_change(program.as_int()),
            MidiMessage::ChannelAftertouch { vel } => channel.channel_pressure(vel.as_int()),
            MidiMessage::PitchBend { bend } => channel.pitch_bend(bend.0.as_int()),
        }
    }

    /// Starts a note: picks a slot, resolves the note and overwrites the slot.
    fn note_on(&mut self, channel: u8, note: u8, velocity: u8) {
        let now = self.position;
        let slot = self.voices.allocate(channel, note, now).index();

        let voice = match self.build_voice(channel, note, velocity, now) {
            Some(voice) => voice,
            None => {
                trace!(channel, note, velocity, "No zone for note, voice is silent");
                Voice::default()
            }
        };

        self.voices
            .release_exclusive(channel, voice.exclusive_class, slot, now);
        self.voices.assign(slot, voice);
    }

    fn build_voice(&self, channel: u8, note: u8, velocity: u8, now: u64) -> Option<Voice> {
        let state = &self.channels[channel as usize];
        let percussion = self.is_percussion(channel);

        let mut voice = match &self.bank {
            Some(bank) => {
                let request = NoteRequest {
                    note,
                    velocity,
                    bank: if percussion {
                        PERCUSSION_BANK
                    } else {
                        state.bank()
                    },
                    program: state.program(),
                };
                let resolved = resolver::resolve(bank, &request, self.sample_rate)?;
                Voice {
                    note,
                    velocity,
                    channel,
                    gain: resolved.gain,
                    phase: 0.0,
                    increment: resolved.increment,
                    pan: resolved.pan.unwrap_or_else(|| state.pan()),
                    envelope: resolved.envelope,
                    source: Source::Sample(resolved.window),
                    exclusive_class: resolved.exclusive_class,
                    start: now + resolved.delay,
                    end: SUSTAINING,
                    sustained: false,
                }
            }
            // Percussion has no math rendition.
            None if percussion => return None,
            None => self.math_voice(channel, note, velocity, now),
        };

        voice.increment *= state.tuning(note) as f64;
        Some(voice)
    }

    /// A built-in waveform voice for playing without a bank.
    fn math_voice(&self, channel: u8, note: u8, velocity: u8, now: u64) -> Voice {
        let rate = self.sample_rate;
        let frequency = note_to_frequency(note, 100, self.config.tuning());
        Voice {
            note,
            velocity,
            channel,
            gain: velocity as f32 / 128.0,
            phase: 0.0,
            increment: TAU * frequency as f64 / rate as f64,
            pan: self.channels[channel as usize].pan(),
            envelope: Envelope {
                attack: rate / 64.0,
                hold: timecents_to_samples(-12000, rate),
                decay: rate / 16.0,
                sustain: MATH_SUSTAIN,
                release: rate / 16.0,
            },
            source: Source::Math(self.config.fallback_waveform()),
            exclusive_class: 0,
            start: now,
            end: SUSTAINING,
            sustained: false,
        }
    }

    /// Applies a Roland GS system exclusive message. Returns whether it was understood.
    /// Like [`Engine::reset`], this is meant to be called between blocks.
    pub fn apply_sysex(&mut self, data: &[u8]) -> bool {
        let Some(message) = SysEx::parse(data) else {
            trace!(len = data.len(), "Ignoring system exclusive message");
            return false;
        };
        debug!(?message, "System exclusive");

        let now = self.position;
        match message {
            SysEx::GsReset => {
                for (ch, channel) in self.channels.iter_mut().enumerate() {
                    channel.pitch_bend(PITCH_BEND_CENTER);
                    channel.set_bend_range(crate::units::DEFAULT_BEND_RANGE);
                    channel.control_change(controller::PAN, 64);
                    if channel.control_change(controller::SUSTAIN, 0)
                        == ControlEffect::SustainReleased
                    {
                        self.voices.release_sustained(ch as u8, now);
                    }
                }
                self.percussion = GS_PERCUSSION_MASK;
            }
            SysEx::RhythmPart {
                channel,
                percussion,
            } => {
                let bit = 1 << (channel & 0x0f);
                if percussion {
                    self.percussion |= bit;
                } else {
                    self.percussion &= !bit;
                }
            }
            SysEx::ScaleTuning { channel, cents } => {
                self.channels[(channel & 0x0f) as usize].set_scale_tuning(&cents);
            }
        }
        true
    }

    /// Kills every voice, restores every channel and drops queued events. Call between
    /// blocks, for example before playing the next file.
    pub fn reset(&mut self) {
        self.voices.kill_all();
        for channel in self.channels.iter_mut() {
            channel.reset();
        }
        self.percussion = self.config.percussion_mask();
        self.events.clear();
        self.position = 0;
        self.lfo.reset();
        self.normalizer.reset();
        info!("Voice engine reset");
    }

    /// Output sample position of the next frame to render.
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn active_voices(&self) -> usize {
        self.voices.active_count(self.position)
    }

    pub fn voice(&self, index: usize) -> Option<&Voice> {
        self.voices.get(index)
    }

    pub fn channel(&self, channel: u8) -> Option<&ChannelState> {
        self.channels.get(channel as usize)
    }

    pub fn is_percussion(&self, channel: u8) -> bool {
        self.percussion & (1 << (channel & 0x0f)) != 0
    }

    /// Gain the normalizer ended the last block on.
    pub fn normalizer_gain(&self) -> f32 {
        self.normalizer.gain()
    }

    pub fn has_bank(&self) -> bool {
        self.bank.is_some()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate()
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("sample_rate", &self.sample_rate)
            .field("position", &self.position)
            .field("active_voices", &self.active_voices())
            .field("has_bank", &self.bank.is_some())
            .finish()
    }
}
