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
use std::f64::consts::TAU;

use crate::voice::Waveform;

/// Frequency of the shared modulation LFO (MIDI note 0), in Hz.
const LFO_FREQUENCY: f64 = 8.176;

/// The triangle LFO shared by every voice for vibrato and pulse width.
#[derive(Debug, Clone)]
pub struct Lfo {
    phase: f64,
    increment: f64,
}

impl Lfo {
    pub fn new(sample_rate: u32) -> Lfo {
        Lfo {
            phase: 0.0,
            increment: TAU * LFO_FREQUENCY / sample_rate as f64,
        }
    }

    /// Returns the current value, -1.0 to 1.0, and advances one sample.
    pub fn next_value(&mut self) -> f32 {
        let value = Waveform::Triangle.sample(self.phase, 0.0);
        self.phase += self.increment;
        if self.phase > TAU {
            self.phase -= TAU;
        }
        value
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
    }
}
