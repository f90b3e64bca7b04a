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

//! Roland GS system exclusive messages.
//!
//! Only the GS "data set" messages that change synthesis state are interpreted.
//! Everything else is ignored.

const ROLAND: u8 = 0x41;
const GS_MODEL: u8 = 0x42;
const DATA_SET: u8 = 0x12;
const SYSEX_START: u8 = 0xf0;
const SYSEX_END: u8 = 0xf7;

/// A GS message the engine acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SysEx {
    /// Resets bend, bend range, pan and sustain on every channel, and puts
    /// percussion back on channel 10 only.
    GsReset,
    /// Switches a part between melodic and rhythm (percussion).
    RhythmPart { channel: u8, percussion: bool },
    /// Per pitch-class detune of a part, in cents (-64 to +63).
    ScaleTuning { channel: u8, cents: [i8; 12] },
}

impl SysEx {
    /// Interprets a system exclusive message. The leading `F0` and trailing `F7` are
    /// optional.
    pub fn parse(data: &[u8]) -> Option<SysEx> {
        let data = data.strip_prefix(&[SYSEX_START]).unwrap_or(data);
        let data = data.strip_suffix(&[SYSEX_END]).unwrap_or(data);

        // Manufacturer, device ID, model, command, three address bytes, data.
        if data.len() < 8 || data[0] != ROLAND || data[2] != GS_MODEL || data[3] != DATA_SET {
            return None;
        }
        let address = [data[4], data[5], data[6]];
        let payload = &data[7..];

        match address {
            [0x40 | 0x00, 0x00, 0x7f] => Some(SysEx::GsReset),
            [0x40, part, 0x15] if part & 0xf0 == 0x10 => Some(SysEx::RhythmPart {
                channel: part_to_channel(part),
                percussion: payload[0] != 0,
            }),
            [0x40, part, 0x40] if part & 0xf0 == 0x10 && payload.len() >= 12 => {
                let mut cents = [0i8; 12];
                for (cent, value) in cents.iter_mut().zip(payload) {
                    *cent = (*value & 0x7f) as i8 - 64;
                }
                Some(SysEx::ScaleTuning {
                    channel: part_to_channel(part),
                    cents,
                })
            }
            _ => None,
        }
    }
}

/// GS numbers parts so that part 0 is the rhythm part on channel 10, parts 1 to 9
/// are channels 1 to 9 and the rest map straight through. Returns a 0-indexed channel.
fn part_to_channel(part: u8) -> u8 {
    match part & 0x0f {
        0 => 9,
        n @ 1..=9 => n - 1,
        n => n,
    }
}
