// quill/quill-core
//
// Copyright: 2026, Jonas Reinhardt <jr@quill-im.dev>
// License: Mozilla Public License v2.0 (MPL v2.0)

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

/// Identifies a connected signal handler so it can be disconnected later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SignalHandlerId(u64);

/// A synchronous, typed handler list.
///
/// Handlers run on the emitting task, in connection order, after the emitter
/// has finished mutating its own state. Handlers may connect or disconnect
/// other handlers (including themselves); the emission iterates over a
/// snapshot taken when `emit` is called.
pub struct Signal<T> {
    next_id: AtomicU64,
    handlers: Mutex<Vec<(SignalHandlerId, Arc<dyn Fn(&T) + Send + Sync>)>>,
}

impl<T> Default for Signal<T> {
    fn default() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            handlers: Mutex::new(Vec::new()),
        }
    }
}

impl<T> Signal<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect(&self, handler: impl Fn(&T) + Send + Sync + 'static) -> SignalHandlerId {
        let id = SignalHandlerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.handlers.lock().push((id, Arc::new(handler)));
        id
    }

    pub fn disconnect(&self, id: SignalHandlerId) -> bool {
        let mut handlers = self.handlers.lock();
        let len = handlers.len();
        handlers.retain(|(handler_id, _)| *handler_id != id);
        handlers.len() != len
    }

    pub fn emit(&self, event: &T) {
        let snapshot = self
            .handlers
            .lock()
            .iter()
            .map(|(_, handler)| handler.clone())
            .collect::<Vec<_>>();

        for handler in snapshot {
            handler(event);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.lock().is_empty()
    }
}

impl<T> std::fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("handlers", &self.handlers.lock().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_and_emit() {
        let signal = Signal::<u32>::new();
        let received = Arc::new(Mutex::new(Vec::new()));

        let sink = received.clone();
        signal.connect(move |value| sink.lock().push(*value));

        signal.emit(&1);
        signal.emit(&2);

        assert_eq!(*received.lock(), vec![1, 2]);
    }

    #[test]
    fn test_disconnect() {
        let signal = Signal::<u32>::new();
        let received = Arc::new(Mutex::new(Vec::new()));

        let sink = received.clone();
        let id = signal.connect(move |value| sink.lock().push(*value));

        signal.emit(&1);
        assert!(signal.disconnect(id));
        assert!(!signal.disconnect(id));
        signal.emit(&2);

        assert_eq!(*received.lock(), vec![1]);
    }

    #[test]
    fn test_handler_may_disconnect_during_emission() {
        let signal = Arc::new(Signal::<u32>::new());
        let received = Arc::new(Mutex::new(Vec::new()));

        let sink = received.clone();
        let signal_clone = signal.clone();
        let id = Arc::new(Mutex::new(None::<SignalHandlerId>));
        let id_clone = id.clone();

        *id.lock() = Some(signal.connect(move |value| {
            sink.lock().push(*value);
            if let Some(id) = id_clone.lock().take() {
                signal_clone.disconnect(id);
            }
        }));

        signal.emit(&1);
        signal.emit(&2);

        assert_eq!(*received.lock(), vec![1]);
    }
}
