//! Request tickets
//!
//! Each asynchronous slot (chapter content, translation, visual, quiz) hands out a
//! ticket per request. A result may only be committed while its ticket is still the
//! latest one issued for that slot; anything older has been superseded and is dropped
//! when it arrives.

/// Identity of one issued request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

/// Issues tickets for one logical slot
#[derive(Debug, Default)]
pub struct RequestSlot {
    latest: u64,
}

impl RequestSlot {
    /// Issue a new ticket, superseding every earlier one
    pub fn issue(&mut self) -> Ticket {
        self.latest += 1;
        Ticket(self.latest)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        ticket.0 == self.latest
    }

    /// Supersede the outstanding ticket without issuing a new request
    pub fn invalidate(&mut self) {
        self.latest += 1;
    }
}

/// What happened to an arriving result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// The result was for the latest request and changed state
    Committed,
    /// A newer request (or a reset) made the result stale; it was dropped
    Superseded,
}
