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

//! Per-channel MIDI state.

use crate::midi::controller;
use crate::units::{
    cents_to_multiplier, pitch_bend_to_multiplier, DEFAULT_BEND_RANGE, PITCH_BEND_CENTER,
};

/// Value RPN/NRPN selectors hold when nothing is selected.
const NULL_PARAMETER: u8 = 127;

/// Vibrato depth of a fully raised modulation wheel, in cents.
const MODULATION_DEPTH_CENTS: f32 = 47.0;

/// Voice pool work a controller change asks of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEffect {
    None,
    /// The sustain pedal went up: sustained voices must be released.
    SustainReleased,
    /// Held voices on the channel must be released.
    AllNotesOff,
    /// Every voice on the channel must stop at once.
    AllSoundsOff,
}

/// State of one MIDI channel.
#[derive(Debug, Clone)]
pub struct ChannelState {
    program: u8,
    controllers: [u8; 128],
    pressure: u8,
    bend: u16,
    bend_range: u8,
    bend_multiplier: f32,
    modulation_multiplier: f32,
    tuning: [f32; 12],
}

impl Default for ChannelState {
    fn default() -> Self {
        let mut state = ChannelState {
            program: 0,
            controllers: [0; 128],
            pressure: 0,
            bend: PITCH_BEND_CENTER,
            bend_range: DEFAULT_BEND_RANGE,
            bend_multiplier: 1.0,
            modulation_multiplier: 0.0,
            tuning: [1.0; 12],
        };
        state.reset();
        state
    }
}

impl ChannelState {
    /// Restores power-on state.
    pub fn reset(&mut self) {
        self.program = 0;
        self.controllers = [0; 128];
        self.controllers[controller::MAIN_VOLUME as usize] = 100;
        self.controllers[controller::PAN as usize] = 64;
        self.tuning = [1.0; 12];
        self.bend_range = DEFAULT_BEND_RANGE;
        self.reset_controllers();
    }

    /// Reset All Controllers. Program, volume, pan, bank and bend range survive.
    pub fn reset_controllers(&mut self) {
        self.controllers[controller::MODULATION as usize] = 0;
        self.controllers[controller::EXPRESSION as usize] = 127;
        self.controllers[controller::SUSTAIN as usize] = 0;
        for selector in [
            controller::NRPN_LSB,
            controller::NRPN_MSB,
            controller::RPN_LSB,
            controller::RPN_MSB,
        ] {
            self.controllers[selector as usize] = NULL_PARAMETER;
        }
        self.pressure = 0;
        self.modulation_multiplier = 0.0;
        self.pitch_bend(PITCH_BEND_CENTER);
    }

    /// Stores a controller value and returns the voice work it implies.
    pub fn control_change(&mut self, number: u8, value: u8) -> ControlEffect {
        let number = number & 0x7f;
        let value = value & 0x7f;
        self.controllers[number as usize] = value;

        match number {
            controller::MODULATION => {
                self.modulation_multiplier =
                    cents_to_multiplier(MODULATION_DEPTH_CENTS, value as u16, 127) - 1.0;
            }
            controller::DATA_ENTRY => {
                if self.controller(controller::RPN_MSB) == 0
                    && self.controller(controller::RPN_LSB) == 0
                {
                    self.set_bend_range(value);
                }
            }
            controller::NRPN_LSB | controller::NRPN_MSB => {
                self.controllers[controller::RPN_LSB as usize] = NULL_PARAMETER;
                self.controllers[controller::RPN_MSB as usize] = NULL_PARAMETER;
            }
            controller::SUSTAIN if value < 64 => return ControlEffect::SustainReleased,
            controller::ALL_SOUNDS_OFF => return ControlEffect::AllSoundsOff,
            controller::RESET_ALL_CONTROLLERS => {
                self.reset_controllers();
                return ControlEffect::SustainReleased;
            }
            controller::ALL_NOTES_OFF => return ControlEffect::AllNotesOff,
            _ => {}
        }
        ControlEffect::None
    }

    pub fn program_change(&mut self, program: u8) {
        self.program = program & 0x7f;
    }

    pub fn channel_pressure(&mut self, pressure: u8) {
        self.pressure = pressure & 0x7f;
    }

    /// Sets the raw 14-bit bend and recomputes the bend multiplier.
    pub fn pitch_bend(&mut self, bend: u16) {
        self.bend = bend & 0x3fff;
        self.bend_multiplier = pitch_bend_to_multiplier(self.bend, self.bend_range);
    }

    /// Sets the bend range in semitones and recomputes the bend multiplier.
    pub fn set_bend_range(&mut self, semitones: u8) {
        self.bend_range = semitones;
        self.bend_multiplier = pitch_bend_to_multiplier(self.bend, self.bend_range);
    }

    /// Sets the per pitch-class detune, in cents.
    pub fn set_scale_tuning(&mut self, cents: &[i8; 12]) {
        for (multiplier, cent) in self.tuning.iter_mut().zip(cents) {
            *multiplier = cents_to_multiplier(*cent as f32, 1, 1);
        }
    }

    pub fn controller(&self, number: u8) -> u8 {
        self.controllers[(number & 0x7f) as usize]
    }

    pub fn program(&self) -> u8 {
        self.program
    }

    pub fn pressure(&self) -> u8 {
        self.pressure
    }

    pub fn bend(&self) -> u16 {
        self.bend
    }

    pub fn bend_range(&self) -> u8 {
        self.bend_range
    }

    pub fn bend_multiplier(&self) -> f32 {
        self.bend_multiplier
    }

    /// Depth the shared LFO modulates pitch by, as a frequency multiplier offset.
    pub fn modulation_multiplier(&self) -> f32 {
        self.modulation_multiplier
    }

    /// Bank number from bank select MSB/LSB. Bank 128 is reserved for percussion and
    /// maps to 0 on melodic channels.
    pub fn bank(&self) -> u16 {
        let bank = ((self.controller(controller::BANK_SELECT) as u16) << 7)
            | self.controller(controller::BANK_SELECT_LSB) as u16;
        if bank == crate::bank::PERCUSSION_BANK {
            0
        } else {
            bank
        }
    }

    /// Pan target, 0.0 (left) to 1.0 (right).
    pub fn pan(&self) -> f32 {
        self.controller(controller::PAN) as f32 / 127.0
    }

    /// Main volume times expression, linear.
    pub fn volume(&self) -> f32 {
        self.controller(controller::MAIN_VOLUME) as f32 / 127.0
            * self.controller(controller::EXPRESSION) as f32
            / 127.0
    }

    pub fn sustain_held(&self) -> bool {
        self.controller(controller::SUSTAIN) >= 64
    }

    /// Frequency multiplier from the scale tuning table for a note.
    pub fn tuning(&self, note: u8) -> f32 {
        self.tuning[(note % 12) as usize]
    }
}
