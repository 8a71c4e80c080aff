use std::collections::VecDeque;
use tokio::task::AbortHandle;
use crate::message::Message;

#[derive(Debug)]
struct InFlight {
    turn: u64,
    handle: Option<AbortHandle>,
}

/// Transcript plus the reply bookkeeping of the chat pipeline.
///
/// At most one reply is in flight. Sends that arrive while busy wait in
/// `queued` and are only appended once the reply before them has landed,
/// which keeps every assistant reply directly after its user message.
#[derive(Debug, Default)]
pub struct Conversation {
    transcript: Vec<Message>,
    queued: VecDeque<String>,
    in_flight: Option<InFlight>,
    next_seq: u64,
    next_turn: u64,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.transcript
    }

    pub fn snapshot(&self) -> Vec<Message> {
        self.transcript.clone()
    }

    pub fn len(&self) -> usize {
        self.transcript.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transcript.is_empty()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn queued_len(&self) -> usize {
        self.queued.len()
    }

    /// Appends `message`, stamping it with the next sequence number.
    pub fn push(&mut self, mut message: Message) -> &Message {
        self.next_seq += 1;
        message.seq = self.next_seq;
        self.transcript.push(message);
        &self.transcript[self.transcript.len() - 1]
    }

    /// Marks the pipeline busy and returns the turn id the reply must present.
    pub(crate) fn begin_turn(&mut self) -> u64 {
        self.next_turn += 1;
        let handle = self.in_flight.take().and_then(|f| f.handle);
        self.in_flight = Some(InFlight {
            turn: self.next_turn,
            handle,
        });
        self.next_turn
    }

    pub(crate) fn attach_worker(&mut self, handle: AbortHandle) {
        if let Some(in_flight) = self.in_flight.as_mut() {
            in_flight.handle = Some(handle);
        }
    }

    pub(crate) fn is_current(&self, turn: u64) -> bool {
        matches!(&self.in_flight, Some(f) if f.turn == turn)
    }

    /// Clears the busy flag once the final queued reply has landed.
    pub(crate) fn finish(&mut self) {
        self.in_flight = None;
    }

    pub(crate) fn enqueue(&mut self, text: String) {
        self.queued.push_back(text);
    }

    pub(crate) fn dequeue(&mut self) -> Option<String> {
        self.queued.pop_front()
    }

    /// Drops the transcript, the queued sends and any reply in flight.
    pub fn clear(&mut self) {
        if let Some(handle) = self.in_flight.take().and_then(|f| f.handle) {
            handle.abort();
        }
        self.queued.clear();
        self.transcript.clear();
    }
}

impl Drop for Conversation {
    fn drop(&mut self) {
        if let Some(handle) = self.in_flight.take().and_then(|f| f.handle) {
            handle.abort();
        }
    }
}
