//! Event dispatch.
//!
//! Collaborators implement [`EventHandler`] to react to stored records. The
//! default method bodies only log, so a handler overrides what it needs.

use tracing::{debug, error, warn};

use crate::device::Address;
use crate::interpret::{Event, EventKind, InterpretedRecord};

/// Hooks invoked after a record has been interpreted and stored.
pub trait EventHandler: Send {
    /// A new record replaced the previous one for `address`.
    fn on_data(&mut self, address: Address, record: &InterpretedRecord) {
        let _ = record;
        debug!(%address, "data updated");
    }

    /// The record carries active warning flags.
    fn on_warning(&mut self, address: Address, record: &InterpretedRecord) {
        let _ = record;
        warn!(%address, "warning flags set");
    }

    /// The record carries active error flags.
    fn on_error(&mut self, address: Address, record: &InterpretedRecord) {
        let _ = record;
        error!(%address, "error flags set");
    }
}

/// Handler using the default logging hooks.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHandler;

impl EventHandler for LoggingHandler {}

/// Delivers events to every registered handler, in registration order.
#[derive(Default)]
pub struct Dispatcher {
    handlers: Vec<Box<dyn EventHandler>>,
}

impl Dispatcher {
    /// An empty dispatcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a handler; it receives events after those already registered.
    pub fn add_handler(&mut self, handler: impl EventHandler + 'static) {
        self.handlers.push(Box::new(handler));
    }

    /// Deliver `events`, in order, for `record`.
    pub fn dispatch(&mut self, events: &[Event], record: &InterpretedRecord) {
        for event in events {
            for handler in &mut self.handlers {
                match event.kind {
                    EventKind::DataUpdated => handler.on_data(event.address, record),
                    EventKind::Warning => handler.on_warning(event.address, record),
                    EventKind::Error => handler.on_error(event.address, record),
                }
            }
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}
