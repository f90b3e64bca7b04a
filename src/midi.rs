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
use midly::{live::LiveEvent, MidiMessage};

use crate::error::EngineError;

pub mod mt32;
pub mod sysex;

pub use sysex::SysEx;

/// Number of MIDI channels.
pub const CHANNELS: usize = 16;

/// Controller numbers the engine interprets.
pub mod controller {
    pub const BANK_SELECT: u8 = 0x00;
    pub const MODULATION: u8 = 0x01;
    pub const DATA_ENTRY: u8 = 0x06;
    pub const MAIN_VOLUME: u8 = 0x07;
    pub const PAN: u8 = 0x0a;
    pub const EXPRESSION: u8 = 0x0b;
    pub const LSB: u8 = 0x20;
    pub const BANK_SELECT_LSB: u8 = BANK_SELECT + LSB;
    pub const SUSTAIN: u8 = 0x40;
    pub const NRPN_LSB: u8 = 0x62;
    pub const NRPN_MSB: u8 = 0x63;
    pub const RPN_LSB: u8 = 0x64;
    pub const RPN_MSB: u8 = 0x65;
    pub const ALL_SOUNDS_OFF: u8 = 0x78;
    pub const RESET_ALL_CONTROLLERS: u8 = 0x79;
    pub const ALL_NOTES_OFF: u8 = 0x7b;
}

/// Parses raw bytes into a channel and channel-voice message. Anything other than the
/// seven channel-voice commands is rejected.
pub fn parse_channel_message(raw: &[u8]) -> Result<(u8, MidiMessage), EngineError> {
    match LiveEvent::parse(raw)? {
        LiveEvent::Midi { channel, message } => Ok((channel.as_int(), message)),
        _ => Err(EngineError::UnsupportedCommand {
            status: raw.first().copied().unwrap_or(0),
        }),
    }
}
