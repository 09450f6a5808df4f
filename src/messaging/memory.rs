use std::{
    collections::{HashMap, VecDeque},
    sync::atomic::{AtomicU64, Ordering},
};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::watch;

use super::{MessageHandle, MessageTransport};
use crate::{
    common::{
        TransportError,
        types::{ChannelId, MessageId},
    },
    controls::render::Payload,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Send,
    Edit,
    Delete,
}

/// One recorded transport call.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportCall {
    Send {
        channel_id: ChannelId,
        payload: Payload,
    },
    Edit {
        handle: MessageHandle,
        payload: Payload,
    },
    Delete {
        handle: MessageHandle,
    },
}

impl TransportCall {
    pub fn op(&self) -> Op {
        match self {
            Self::Send { .. } => Op::Send,
            Self::Edit { .. } => Op::Edit,
            Self::Delete { .. } => Op::Delete,
        }
    }
}

/// In-process transport that keeps published messages in memory.
///
/// Every call is recorded and takes effect before it answers, so a call held
/// in flight by [`MemoryTransport::hold`] is already visible in
/// [`MemoryTransport::calls`] and, for a send, in [`MemoryTransport::live_messages`].
pub struct MemoryTransport {
    calls: Mutex<Vec<TransportCall>>,
    live: Mutex<HashMap<MessageHandle, Payload>>,
    failures: Mutex<VecDeque<(Op, TransportError)>>,
    next_id: AtomicU64,
    held: watch::Sender<bool>,
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTransport {
    pub fn new() -> Self {
        let (held, _) = watch::channel(false);
        Self {
            calls: Mutex::new(Vec::new()),
            live: Mutex::new(HashMap::new()),
            failures: Mutex::new(VecDeque::new()),
            next_id: AtomicU64::new(1000),
            held,
        }
    }

    /// Makes every subsequent call wait (after taking effect) before
    /// answering, until [`MemoryTransport::release`].
    pub fn hold(&self) {
        self.held.send_replace(true);
    }

    pub fn release(&self) {
        self.held.send_replace(false);
    }

    /// The next call of kind `op` fails with `error`.
    pub fn fail_next(&self, op: Op, error: TransportError) {
        self.failures.lock().push_back((op, error));
    }

    pub fn calls(&self) -> Vec<TransportCall> {
        self.calls.lock().clone()
    }

    pub fn count(&self, op: Op) -> usize {
        self.calls.lock().iter().filter(|c| c.op() == op).count()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    /// Messages that have been sent and not deleted.
    pub fn live_messages(&self) -> Vec<(MessageHandle, Payload)> {
        self.live
            .lock()
            .iter()
            .map(|(h, p)| (h.clone(), p.clone()))
            .collect()
    }

    pub fn live_payload(&self, handle: &MessageHandle) -> Option<Payload> {
        self.live.lock().get(handle).cloned()
    }

    /// Removes a message behind the bot's back, as a moderator would.
    pub fn delete_externally(&self, handle: &MessageHandle) {
        self.live.lock().remove(handle);
    }

    /// Records `call` and returns the failure injected for it, if any.
    fn record(&self, call: TransportCall) -> Result<(), TransportError> {
        let op = call.op();
        self.calls.lock().push(call);

        let mut failures = self.failures.lock();
        match failures.iter().position(|(o, _)| *o == op) {
            Some(idx) => match failures.remove(idx) {
                Some((_, err)) => Err(err),
                None => Ok(()),
            },
            None => Ok(()),
        }
    }

    /// Delays the response while held. The effect of the call has already
    /// happened, as on a platform that is slow to answer.
    async fn respond<T>(&self, result: Result<T, TransportError>) -> Result<T, TransportError> {
        let mut held = self.held.subscribe();
        // The sender lives in `self`, so this only errors once we are gone.
        let _ = held.wait_for(|h| !*h).await;
        result
    }
}

#[async_trait]
impl MessageTransport for MemoryTransport {
    async fn send_message(
        &self,
        channel_id: &ChannelId,
        payload: &Payload,
    ) -> Result<MessageHandle, TransportError> {
        let result = self
            .record(TransportCall::Send {
                channel_id: channel_id.clone(),
                payload: payload.clone(),
            })
            .map(|()| {
                let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                let handle = MessageHandle::new(channel_id.clone(), MessageId(id.to_string()));
                self.live.lock().insert(handle.clone(), payload.clone());
                handle
            });
        self.respond(result).await
    }

    async fn edit_message(
        &self,
        handle: &MessageHandle,
        payload: &Payload,
    ) -> Result<(), TransportError> {
        let result = self
            .record(TransportCall::Edit {
                handle: handle.clone(),
                payload: payload.clone(),
            })
            .and_then(|()| match self.live.lock().get_mut(handle) {
                Some(existing) => {
                    *existing = payload.clone();
                    Ok(())
                }
                None => Err(TransportError::NotFound),
            });
        self.respond(result).await
    }

    async fn delete_message(&self, handle: &MessageHandle) -> Result<(), TransportError> {
        let result = self
            .record(TransportCall::Delete {
                handle: handle.clone(),
            })
            .and_then(|()| match self.live.lock().remove(handle) {
                Some(_) => Ok(()),
                None => Err(TransportError::NotFound),
            });
        self.respond(result).await
    }
}
