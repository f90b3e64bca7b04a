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

//! The timestamped event queue between the scheduler and the audio callback.
//!
//! The producer half lives with the scheduler and the consumer half with the engine.
//! The queue is bounded and never blocks: a full queue is a hard error for the
//! producer, and an empty queue just means there is nothing due for the consumer.

use crossbeam_channel::{Receiver, Sender, TryRecvError, TrySendError};
use midly::{num::u14, MidiMessage, PitchBend};
use tracing::error;

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::midi::{self, mt32};

/// A channel-voice message due at an absolute output sample position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueuedEvent {
    pub timestamp: u64,
    /// 0-indexed channel.
    pub channel: u8,
    pub message: MidiMessage,
}

/// Creates the two halves of an event queue sized from a validated config.
pub(crate) fn event_queue(config: &EngineConfig) -> (EventProducer, EventConsumer) {
    let capacity = config.event_queue_capacity();
    let (sender, receiver) = crossbeam_channel::bounded(capacity);
    (
        EventProducer {
            sender,
            capacity,
            sample_rate: config.sample_rate() as u64,
            tick_rate: config.tick_rate() as u64,
            mt32: config.mt32(),
        },
        EventConsumer {
            receiver,
            pending: None,
        },
    )
}

/// The scheduler's half of the queue.
#[derive(Clone)]
pub struct EventProducer {
    sender: Sender<QueuedEvent>,
    capacity: usize,
    sample_rate: u64,
    tick_rate: u64,
    mt32: bool,
}

impl EventProducer {
    /// Queues a message for the given sample position. Note-ons with velocity 0 are
    /// queued as note-offs, and program changes are translated when MT-32 mode is on.
    pub fn enqueue(
        &self,
        timestamp: u64,
        channel: u8,
        message: MidiMessage,
    ) -> Result<(), EngineError> {
        let message = match message {
            MidiMessage::NoteOn { key, vel } if vel.as_int() == 0 => {
                MidiMessage::NoteOff { key, vel }
            }
            MidiMessage::ProgramChange { program } if self.mt32 => MidiMessage::ProgramChange {
                program: mt32::to_general_midi(program.as_int()).into(),
            },
            other => other,
        };
        let event = QueuedEvent {
            timestamp,
            channel: channel & 0x0f,
            message,
        };

        match self.sender.try_send(event) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                error!(
                    capacity = self.capacity,
                    timestamp, "Event queue overflow, stopping playback"
                );
                Err(EngineError::QueueFull {
                    capacity: self.capacity,
                })
            }
            Err(TrySendError::Disconnected(_)) => {
                error!(timestamp, "Event queue consumer is gone");
                Err(EngineError::QueueDisconnected)
            }
        }
    }

    /// Queues a message at a scheduler tick, converted to a sample position.
    pub fn enqueue_at_ticks(
        &self,
        ticks: u64,
        channel: u8,
        message: MidiMessage,
    ) -> Result<(), EngineError> {
        self.enqueue(self.ticks_to_samples(ticks), channel, message)
    }

    /// Parses raw channel-voice bytes and queues them.
    pub fn enqueue_raw(&self, timestamp: u64, raw: &[u8]) -> Result<(), EngineError> {
        let (channel, message) = midi::parse_channel_message(raw)?;
        self.enqueue(timestamp, channel, message)
    }

    pub fn note_on(
        &self,
        timestamp: u64,
        channel: u8,
        key: u8,
        vel: u8,
    ) -> Result<(), EngineError> {
        self.enqueue(
            timestamp,
            channel,
            MidiMessage::NoteOn {
                key: key.into(),
                vel: vel.into(),
            },
        )
    }

    pub fn note_off(&self, timestamp: u64, channel: u8, key: u8) -> Result<(), EngineError> {
        self.enqueue(
            timestamp,
            channel,
            MidiMessage::NoteOff {
                key: key.into(),
                vel: 0.into(),
            },
        )
    }

    pub fn control_change(
        &self,
        timestamp: u64,
        channel: u8,
        controller: u8,
        value: u8,
    ) -> Result<(), EngineError> {
        self.enqueue(
            timestamp,
            channel,
            MidiMessage::Controller {
                controller: controller.into(),
                value: value.into(),
            },
        )
    }

    pub fn program_change(
        &self,
        timestamp: u64,
        channel: u8,
        program: u8,
    ) -> Result<(), EngineError> {
        self.enqueue(
            timestamp,
            channel,
            MidiMessage::ProgramChange {
                program: program.into(),
            },
        )
    }

    /// Queues a raw 14-bit pitch bend (8192 is centre).
    pub fn pitch_bend(&self, timestamp: u64, channel: u8, bend: u16) -> Result<(), EngineError> {
        self.enqueue(
            timestamp,
            channel,
            MidiMessage::PitchBend {
                bend: PitchBend(u14::from(bend)),
            },
        )
    }

    pub fn ticks_to_samples(&self, ticks: u64) -> u64 {
        ticks * self.sample_rate / self.tick_rate
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl std::fmt::Debug for EventProducer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventProducer")
            .field("capacity", &self.capacity)
            .field("queued", &self.sender.len())
            .finish()
    }
}

/// The audio callback's half of the queue.
pub struct EventConsumer {
    receiver: Receiver<QueuedEvent>,
    /// Head of the queue, read but not yet due.
    pending: Option<QueuedEvent>,
}

impl EventConsumer {
    /// Takes the head event if its timestamp is at or before `now`. Never blocks.
    pub fn pop_due(&mut self, now: u64) -> Option<QueuedEvent> {
        if self.pending.is_none() {
            self.pending = match self.receiver.try_recv() {
                Ok(event) => Some(event),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
            };
        }
        match self.pending {
            Some(event) if event.timestamp <= now => self.pending.take(),
            _ => None,
        }
    }

    /// Drops every queued event.
    pub fn clear(&mut self) {
        self.pending = None;
        while self.receiver.try_recv().is_ok() {}
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_none() && self.receiver.is_empty()
    }
}

impl std::fmt::Debug for EventConsumer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventConsumer")
            .field("pending", &self.pending)
            .field("queued", &self.receiver.len())
            .finish()
    }
}
