//! In-process publish/subscribe registry.
//!
//! Maps an event name to an ordered list of handler closures. Publishing
//! invokes the handlers synchronously, in registration order. Handlers
//! must not subscribe from within a handler; dispatch holds the registry
//! read lock.

use std::collections::HashMap;
use std::sync::RwLock;

use tracing::trace;

type Handler = Box<dyn Fn() + Send + Sync>;

#[derive(Default)]
pub struct EventBus {
    handlers: RwLock<HashMap<String, Vec<Handler>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, event: &str, handler: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        let mut map = match self.handlers.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        map.entry(event.to_string())
            .or_default()
            .push(Box::new(handler));
    }

    /// Invoke every handler registered for `event`. Unknown events are a
    /// no-op.
    pub fn publish(&self, event: &str) {
        let map = match self.handlers.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(handlers) = map.get(event) {
            trace!(event, handlers = handlers.len(), "dispatching event");
            for handler in handlers {
                handler();
            }
        }
    }
}
