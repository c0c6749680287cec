use std::collections::VecDeque;
use std::sync::Mutex;

use crate::error::Error;
use crate::event_message::signed_event_message::SignedEventMessage;
use crate::prefix::IdentifierPrefix;

/// Work the processing loop leaves for its caller, e.g. receipts to be
/// generated for newly accepted events.
#[derive(Debug, Clone, PartialEq)]
pub enum Cue {
    ReceiptRequired(SignedEventMessage),
    DuplicityAlarm(IdentifierPrefix),
}

pub struct Responder<I> {
    needs_response: Mutex<VecDeque<I>>,
}

impl<I> Responder<I> {
    pub fn new() -> Self {
        Self {
            needs_response: Mutex::new(VecDeque::new()),
        }
    }

    pub fn original_messages_to_respond(&self) -> Vec<I> {
        match self.needs_response.lock() {
            Ok(mut queue) => queue.drain(..).collect(),
            Err(_) => vec![],
        }
    }

    pub fn get_data_to_respond(&self) -> Option<I> {
        self.needs_response.lock().ok()?.pop_front()
    }

    pub fn append(&self, element: I) -> Result<(), Error> {
        self.needs_response
            .lock()
            .map_err(|_| Error::MutexPoisoned)?
            .push_back(element);
        Ok(())
    }
}

impl<I> Default for Responder<I> {
    fn default() -> Self {
        Self::new()
    }
}
