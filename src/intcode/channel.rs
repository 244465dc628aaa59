//! Bounded FIFO channels connecting machines to each other and to the harness.
//!
//! A channel has a writer end and a reader end. Writers may be cloned; the stream
//! ends once every writer has been completed (or dropped) and the reader has
//! drained what was buffered. Capacity bounds how far a writer can run ahead of
//! its reader, which is what lets machines be wired into feedback cycles.
//!
//! Both ends offer a non-blocking attempt and an awaiting form. The engine always
//! tries the non-blocking form first and only suspends when it fails.

use crate::intcode::errors::IntcodeError;
use tokio::sync::mpsc::error::{TryRecvError, TrySendError};
use tokio::sync::mpsc::{self, Receiver, Sender, UnboundedReceiver, UnboundedSender};

/// Creates a channel holding at most `capacity` values (at least one).
pub fn channel(capacity: usize) -> (ChannelWriter, ChannelReader) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (
        ChannelWriter {
            tx: Some(Tx::Bounded(tx)),
        },
        ChannelReader {
            rx: Rx::Bounded(rx),
        },
    )
}

/// Creates a channel whose writer never has to wait.
pub fn unbounded() -> (ChannelWriter, ChannelReader) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        ChannelWriter {
            tx: Some(Tx::Unbounded(tx)),
        },
        ChannelReader {
            rx: Rx::Unbounded(rx),
        },
    )
}

#[derive(Clone, Debug)]
enum Tx {
    Bounded(Sender<i64>),
    Unbounded(UnboundedSender<i64>),
}

#[derive(Debug)]
enum Rx {
    Bounded(Receiver<i64>),
    Unbounded(UnboundedReceiver<i64>),
}

/// Result of a non-blocking read.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TryRead {
    /// A buffered value.
    Value(i64),
    /// Nothing buffered yet, but a writer is still live.
    Empty,
    /// Every writer completed and the buffer is drained.
    Ended,
}

/// Writer end of a channel.
#[derive(Clone, Debug)]
pub struct ChannelWriter {
    /// `None` once completed.
    tx: Option<Tx>,
}

impl ChannelWriter {
    /// Writes `value` if there is spare capacity.
    ///
    /// Returns `Ok(false)` when the channel is full. Fails with
    /// [`IntcodeError::ChannelCompleted`] if this writer was completed and with
    /// [`IntcodeError::OutputClosed`] if the reader is gone.
    pub fn try_write(&self, value: i64) -> Result<bool, IntcodeError> {
        let result = match self.tx.as_ref().ok_or(IntcodeError::ChannelCompleted)? {
            Tx::Bounded(tx) => tx.try_send(value),
            Tx::Unbounded(tx) => tx
                .send(value)
                .map_err(|err| TrySendError::Closed(err.0)),
        };
        match result {
            Ok(()) => Ok(true),
            Err(TrySendError::Full(_)) => Ok(false),
            Err(TrySendError::Closed(_)) => Err(IntcodeError::OutputClosed { ip: 0 }),
        }
    }

    /// Writes `value`, waiting for capacity if the channel is full.
    pub async fn write(&self, value: i64) -> Result<(), IntcodeError> {
        match self.tx.as_ref().ok_or(IntcodeError::ChannelCompleted)? {
            Tx::Bounded(tx) => tx
                .send(value)
                .await
                .map_err(|_| IntcodeError::OutputClosed { ip: 0 }),
            Tx::Unbounded(tx) => tx
                .send(value)
                .map_err(|_| IntcodeError::OutputClosed { ip: 0 }),
        }
    }

    /// Marks this writer complete. Later writes through it fail.
    pub fn complete(&mut self) {
        self.tx = None;
    }

    /// Whether [`complete`](Self::complete) has been called on this writer.
    pub fn is_completed(&self) -> bool {
        self.tx.is_none()
    }

    /// Whether the reader end has been dropped.
    pub fn is_closed(&self) -> bool {
        match &self.tx {
            None => true,
            Some(Tx::Bounded(tx)) => tx.is_closed(),
            Some(Tx::Unbounded(tx)) => tx.is_closed(),
        }
    }
}

/// Reader end of a channel.
#[derive(Debug)]
pub struct ChannelReader {
    rx: Rx,
}

impl ChannelReader {
    /// Takes the next buffered value without waiting.
    pub fn try_read(&mut self) -> TryRead {
        let result = match &mut self.rx {
            Rx::Bounded(rx) => rx.try_recv(),
            Rx::Unbounded(rx) => rx.try_recv(),
        };
        match result {
            Ok(value) => TryRead::Value(value),
            Err(TryRecvError::Empty) => TryRead::Empty,
            Err(TryRecvError::Disconnected) => TryRead::Ended,
        }
    }

    /// Takes the next value, waiting for one if none is buffered.
    ///
    /// Returns `None` at end of stream.
    pub async fn read(&mut self) -> Option<i64> {
        match &mut self.rx {
            Rx::Bounded(rx) => rx.recv().await,
            Rx::Unbounded(rx) => rx.recv().await,
        }
    }

    /// Takes every value buffered right now, without waiting.
    pub fn drain(&mut self) -> Vec<i64> {
        let mut values = Vec::new();
        while let TryRead::Value(value) = self.try_read() {
            values.push(value);
        }
        values
    }

    /// Reads until end of stream.
    pub async fn collect(mut self) -> Vec<i64> {
        let mut values = Vec::new();
        while let Some(value) = self.read().await {
            values.push(value);
        }
        values
    }
}
