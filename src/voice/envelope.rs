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

/// Sustain levels at or below this are inaudible and retire the voice.
pub const SILENCE: f32 = 0.000_001;

/// Where a voice is in its attack/hold/decay/sustain sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopePhase {
    Attack,
    Hold,
    Decay,
    Sustain,
}

/// A volume envelope. Times are in output samples, sustain is a linear level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Envelope {
    pub attack: f32,
    pub hold: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
}

impl Default for Envelope {
    fn default() -> Self {
        Envelope {
            attack: 0.0,
            hold: 0.0,
            decay: 0.0,
            sustain: 1.0,
            release: 0.0,
        }
    }
}

impl Envelope {
    pub fn phase(&self, elapsed: u64) -> EnvelopePhase {
        let elapsed = elapsed as f32;
        if elapsed < self.attack {
            EnvelopePhase::Attack
        } else if elapsed < self.attack + self.hold {
            EnvelopePhase::Hold
        } else if elapsed < self.attack + self.hold + self.decay {
            EnvelopePhase::Decay
        } else {
            EnvelopePhase::Sustain
        }
    }

    /// Level before release, `elapsed` samples after the note started.
    pub fn level(&self, elapsed: u64) -> f32 {
        match self.phase(elapsed) {
            EnvelopePhase::Attack => elapsed as f32 / self.attack,
            EnvelopePhase::Hold => 1.0,
            EnvelopePhase::Decay => {
                let progress = (elapsed as f32 - (self.attack + self.hold)) / self.decay;
                1.0 - progress * (1.0 - self.sustain)
            }
            EnvelopePhase::Sustain => self.sustain,
        }
    }

    /// Cubic fade applied while fewer than `release` samples remain, whatever phase
    /// the level is in.
    pub fn release_factor(&self, remaining: u64) -> f32 {
        let remaining = remaining as f32;
        if remaining < self.release {
            let x = remaining / self.release;
            x * x * x
        } else {
            1.0
        }
    }

    pub fn gain(&self, elapsed: u64, remaining: u64) -> f32 {
        self.level(elapsed) * self.release_factor(remaining)
    }

    /// Whether a voice in its sustain phase can no longer be heard.
    pub fn is_silent(&self, elapsed: u64) -> bool {
        self.phase(elapsed) == EnvelopePhase::Sustain && self.sustain <= SILENCE
    }
}
