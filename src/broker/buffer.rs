//! Bounded record buffer between producers and the broker publisher
//!
//! Producers call [`RecordBuffer::enqueue`] from any thread; it copies the
//! payload and never blocks. A single consumer awaits
//! [`RecordBuffer::dequeue`], which also returns when the buffer is closed or
//! the supplied cancellation token fires.

use bytes::Bytes;
use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError, TrySendError};
use parking_lot::RwLock;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

/// Outcome of a consumer wait
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dequeued {
    Payload(Bytes),
    /// The buffer was closed and every queued payload has been taken
    Closed,
    Cancelled,
}

pub struct RecordBuffer {
    capacity: usize,
    /// `None` once closed; dropping the sender disconnects the channel
    sender: RwLock<Option<Sender<Bytes>>>,
    receiver: Receiver<Bytes>,
    ready: Notify,
}

impl RecordBuffer {
    /// Create a buffer holding at most `capacity` payloads.
    ///
    /// A zero capacity is rejected by `BrokerConfig::validate`; here it is
    /// raised to one so the channel never degrades into a rendezvous.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, receiver) = bounded(capacity);
        Self {
            capacity,
            sender: RwLock::new(Some(sender)),
            receiver,
            ready: Notify::new(),
        }
    }

    /// Copy `payload` into the buffer.
    ///
    /// Returns `false` when the buffer is full or closed. That is a drop,
    /// not a failure: the caller must not surface it as an error.
    pub fn enqueue(&self, payload: &[u8]) -> bool {
        let guard = self.sender.read();
        let Some(sender) = guard.as_ref() else {
            return false;
        };
        match sender.try_send(Bytes::copy_from_slice(payload)) {
            Ok(()) => {
                self.ready.notify_one();
                true
            }
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => false,
        }
    }

    /// Wait for the next payload.
    ///
    /// Only one task may consume; concurrent consumers are not supported.
    /// Payloads still queued when the buffer is closed are returned before
    /// [`Dequeued::Closed`].
    pub async fn dequeue(&self, cancel: &CancellationToken) -> Dequeued {
        loop {
            match self.receiver.try_recv() {
                Ok(payload) => return Dequeued::Payload(payload),
                Err(TryRecvError::Disconnected) => return Dequeued::Closed,
                Err(TryRecvError::Empty) => {}
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Dequeued::Cancelled,
                _ = self.ready.notified() => {}
            }
        }
    }

    /// Take a payload if one is queued, without waiting
    pub fn try_dequeue(&self) -> Option<Bytes> {
        self.receiver.try_recv().ok()
    }

    /// Stop accepting payloads and wake the consumer
    pub fn close(&self) {
        if self.sender.write().take().is_some() {
            self.ready.notify_one();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.sender.read().is_none()
    }

    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.receiver.is_full()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl std::fmt::Debug for RecordBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordBuffer")
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}
