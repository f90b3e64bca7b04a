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

//! The fixed voice pool and its allocator.
//!
//! Handles voice allocation, retrigger, stealing, and note-off behavior.

use tracing::trace;

use super::Voice;

/// Polyphony of the engine.
pub const MAX_VOICES: usize = 128;

/// The slot the allocator picked for a note-on, and why.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Allocation {
    /// The same channel/note was still sounding in this slot.
    Retrigger(usize),
    /// The slot was free.
    Free(usize),
    /// Every slot was busy and this one held the oldest note.
    Stolen(usize),
}

impl Allocation {
    pub fn index(self) -> usize {
        match self {
            Allocation::Retrigger(index) | Allocation::Free(index) | Allocation::Stolen(index) => {
                index
            }
        }
    }
}

/// Manages the fixed set of voices. All storage is allocated up front.
pub struct VoicePool {
    voices: Vec<Voice>,
}

impl Default for VoicePool {
    fn default() -> Self {
        Self::new()
    }
}

impl VoicePool {
    /// Creates a pool of [`MAX_VOICES`] free voices.
    pub fn new() -> Self {
        Self {
            voices: vec![Voice::default(); MAX_VOICES],
        }
    }

    /// Picks the slot for a new note: a still-sounding voice on the same channel/note,
    /// else the first free voice, else the voice with the oldest note start.
    pub fn allocate(&self, channel: u8, note: u8, now: u64) -> Allocation {
        if let Some(index) = self
            .voices
            .iter()
            .position(|v| !v.is_free(now) && v.channel == channel && v.note == note)
        {
            return Allocation::Retrigger(index);
        }

        if let Some(index) = self.voices.iter().position(|v| v.is_free(now)) {
            return Allocation::Free(index);
        }

        let oldest = self
            .voices
            .iter()
            .enumerate()
            .min_by_key(|(_, v)| v.start)
            .map(|(index, _)| index)
            .unwrap_or(0);
        trace!(
            slot = oldest,
            channel,
            note,
            max_voices = MAX_VOICES,
            "Voice limit reached, stealing oldest"
        );
        Allocation::Stolen(oldest)
    }

    /// Overwrites a slot with a new voice.
    pub fn assign(&mut self, index: usize, voice: Voice) {
        if let Some(slot) = self.voices.get_mut(index) {
            *slot = voice;
        }
    }

    pub fn get(&self, index: usize) -> Option<&Voice> {
        self.voices.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Voice> {
        self.voices.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Voice> {
        self.voices.iter_mut()
    }

    /// Handles a note-off. Held voices on the channel/note are released, or flagged
    /// as sustained while the sustain pedal is down. Returns how many voices matched.
    pub fn release_note(&mut self, channel: u8, note: u8, now: u64, sustain_held: bool) -> usize {
        let mut matched = 0;
        for voice in self
            .voices
            .iter_mut()
            .filter(|v| v.is_held() && v.channel == channel && v.note == note)
        {
            if sustain_held {
                voice.sustained = true;
            } else {
                voice.release(now);
            }
            matched += 1;
        }
        matched
    }

    /// Releases every sustained voice on the channel (sustain pedal lifted).
    pub fn release_sustained(&mut self, channel: u8, now: u64) -> usize {
        let mut released = 0;
        for voice in self
            .voices
            .iter_mut()
            .filter(|v| v.sustained && v.channel == channel && !v.is_free(now))
        {
            voice.release(now);
            released += 1;
        }
        released
    }

    /// Forces other sounding voices of the same exclusive class on the channel into
    /// their release.
    pub fn release_exclusive(&mut self, channel: u8, class: u16, except: usize, now: u64) {
        if class == 0 {
            return;
        }
        for (index, voice) in self.voices.iter_mut().enumerate() {
            if index != except
                && !voice.is_free(now)
                && voice.channel == channel
                && voice.exclusive_class == class
            {
                voice.release(now);
            }
        }
    }

    /// Releases every sounding voice on the channel, sustained ones included.
    pub fn release_channel(&mut self, channel: u8, now: u64) {
        for voice in self
            .voices
            .iter_mut()
            .filter(|v| v.channel == channel && !v.is_free(now))
        {
            voice.release(now);
        }
    }

    /// Silences every voice on the channel at once.
    pub fn kill_channel(&mut self, channel: u8, now: u64) {
        for voice in self.voices.iter_mut().filter(|v| v.channel == channel) {
            voice.kill(now);
        }
    }

    /// Resets every slot to a free voice.
    pub fn kill_all(&mut self) {
        self.voices.fill(Voice::default());
    }

    /// Returns the number of voices that are not yet free.
    pub fn active_count(&self, now: u64) -> usize {
        self.voices.iter().filter(|v| !v.is_free(now)).count()
    }
}

impl std::fmt::Debug for VoicePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoicePool")
            .field("max_voices", &MAX_VOICES)
            .finish()
    }
}
