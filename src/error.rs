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

/// Hard failures surfaced by the engine. Anything else (bank problems, notes that
/// resolve to nothing) is absorbed locally and never reaches the caller.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Event queue full ({capacity} events), playback ordering would be lost")]
    QueueFull { capacity: usize },

    #[error("Event queue consumer has been dropped")]
    QueueDisconnected,

    #[error("Unsupported MIDI command 0x{status:02x}")]
    UnsupportedCommand { status: u8 },

    #[error("Malformed MIDI data: {0}")]
    MalformedMidi(#[from] midly::Error),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Reasons a bank is rejected. The engine treats all of these as "no bank loaded".
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BankError {
    #[error("Bank is missing required chunk {0}")]
    MissingChunk(&'static str),

    #[error("{chunk} index {index} out of range (len {len})")]
    IndexOutOfRange {
        chunk: &'static str,
        index: usize,
        len: usize,
    },

    #[error("{chunk} indices decrease at record {index}")]
    NonMonotonic { chunk: &'static str, index: usize },
}
