//! The [`Bridge`] facade: connection lifecycle, typed sends, and
//! subscriber fan-out, all driven by a single-threaded `tick()`.

use std::sync::{Arc, Mutex, MutexGuard};

use pulsebridge_dispatch::{ActionQueue, DispatchLoop, DispatchMetrics};
use pulsebridge_events::CustomEvent;
use pulsebridge_protocol::{encode, encode_named, EventShape};
use pulsebridge_transport::{
    CloseReason, ConnState, EventSink, Frame, Transport, TransportEvent,
    WsTransport,
};
use serde_json::Value;
use tokio::runtime::{Handle, Runtime};

use crate::{BridgeConfig, BridgeError};

type OpenedFn = Box<dyn FnMut() + Send>;
type ClosedFn = Box<dyn FnMut(&CloseReason) + Send>;
type MessageFn = Box<dyn FnMut(&str) + Send>;
type ErrorFn = Box<dyn FnMut(&BridgeError) + Send>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Registered callbacks, grouped by event kind.
///
/// Shared between the bridge (registration, guard-failure reporting)
/// and the transport's event sink (lifecycle fan-out), so it lives
/// behind an `Arc`.
#[derive(Default)]
struct Subscribers {
    opened: Mutex<Vec<OpenedFn>>,
    closed: Mutex<Vec<ClosedFn>>,
    message: Mutex<Vec<MessageFn>>,
    error: Mutex<Vec<ErrorFn>>,
}

impl Subscribers {
    /// Fans a transport event out to the matching subscriber list.
    ///
    /// Runs on the dispatch thread, inside `tick()`. A panicking
    /// subscriber is caught one level up, in the dispatch loop.
    fn notify(&self, event: TransportEvent) {
        match event {
            TransportEvent::Opened => Self::run(&self.opened, |f| f()),
            TransportEvent::Message(text) => {
                Self::run(&self.message, |f| f(&text));
            }
            TransportEvent::Error(err) => {
                self.notify_error(&BridgeError::Transport(err));
            }
            TransportEvent::Closed(reason) => {
                Self::run(&self.closed, |f| f(&reason));
            }
        }
    }

    fn notify_error(&self, err: &BridgeError) {
        Self::run(&self.error, |f| f(err));
    }

    /// Invokes every callback in `list` with the lock released: the
    /// list is swapped out, run, then spliced back ahead of anything
    /// registered mid-run. The lock is never held across callback
    /// execution, so a subscriber may synchronously call back into the
    /// bridge (send, register, disconnect) without deadlocking. A
    /// nested failure during such a call finds the list swapped out
    /// and surfaces only through the `Err` return.
    fn run<F: ?Sized>(
        list: &Mutex<Vec<Box<F>>>,
        mut invoke: impl FnMut(&mut Box<F>),
    ) {
        let mut taken = std::mem::take(&mut *lock(list));
        for f in taken.iter_mut() {
            invoke(f);
        }
        let mut current = lock(list);
        taken.append(&mut *current);
        *current = taken;
    }
}

/// Client facade over the protocol, transport, and dispatch layers.
///
/// A `Bridge` pushes typed events to a remote collector over one
/// persistent connection. Sends are fire-and-forget: `send_event`
/// returns as soon as the envelope is queued on the connection, and
/// outcomes (open, close, faults, inbound messages) surface through
/// subscribers when [`tick()`](Self::tick) runs.
///
/// `tick()` is the only place subscriber callbacks execute, so a host
/// that calls it from one thread gets single-threaded callback
/// semantics regardless of what the network tasks do.
///
/// # Example
///
/// ```rust,no_run
/// use pulsebridge::{Bridge, BridgeConfig};
/// use pulsebridge_events::LevelComplete;
///
/// # fn main() -> Result<(), pulsebridge::BridgeError> {
/// let mut bridge = Bridge::new(BridgeConfig::new("ws://127.0.0.1:8765"))?;
/// bridge.on_opened(|| println!("connected"));
/// bridge.connect();
/// loop {
///     bridge.tick();
///     if bridge.is_connected() {
///         break;
///     }
/// }
/// bridge.send_event(&LevelComplete::new("Tutorial", 45.5, 1000, true))?;
/// # Ok(())
/// # }
/// ```
pub struct Bridge<T: Transport = WsTransport> {
    config: BridgeConfig,
    transport: T,
    dispatch: DispatchLoop,
    subscribers: Arc<Subscribers>,
    // Keeps the bridge-owned runtime alive for transports spawned on it.
    _runtime: Option<Runtime>,
}

impl Bridge<WsTransport> {
    /// Creates a bridge with its own internal async runtime.
    ///
    /// This is the constructor for synchronous hosts (game loops,
    /// CLIs): the runtime's threads drive the connection in the
    /// background while the host keeps calling `tick()`.
    pub fn new(config: BridgeConfig) -> Result<Self, BridgeError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()?;
        let handle = runtime.handle().clone();
        let bridge = Self::build(config, Some(runtime), |queue, sink| {
            WsTransport::new(handle, queue, sink)
        });
        if bridge.config.auto_connect {
            bridge.connect();
        }
        Ok(bridge)
    }

    /// Creates a bridge that spawns its connection tasks on an existing
    /// runtime. For hosts that are already async.
    pub fn with_handle(config: BridgeConfig, handle: Handle) -> Self {
        let bridge = Self::build(config, None, |queue, sink| {
            WsTransport::new(handle, queue, sink)
        });
        if bridge.config.auto_connect {
            bridge.connect();
        }
        bridge
    }
}

impl<T: Transport> Bridge<T> {
    /// Creates a bridge over a caller-supplied transport.
    ///
    /// The factory receives the action queue and event sink the
    /// transport must report through. Used by tests with a scripted
    /// transport, and by hosts with a non-WebSocket carrier.
    pub fn with_transport<F>(config: BridgeConfig, make: F) -> Self
    where
        F: FnOnce(ActionQueue, EventSink) -> T,
    {
        let bridge = Self::build(config, None, make);
        if bridge.config.auto_connect {
            bridge.connect();
        }
        bridge
    }

    fn build<F>(config: BridgeConfig, runtime: Option<Runtime>, make: F) -> Self
    where
        F: FnOnce(ActionQueue, EventSink) -> T,
    {
        let queue = ActionQueue::default();
        let subscribers = Arc::new(Subscribers::default());
        let sink: EventSink = {
            let subscribers = Arc::clone(&subscribers);
            Arc::new(move |event| subscribers.notify(event))
        };
        let transport = make(queue.clone(), sink);
        Self {
            config,
            transport,
            dispatch: DispatchLoop::new(queue),
            subscribers,
            _runtime: runtime,
        }
    }

    // -----------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------

    /// Starts connecting to the configured URL.
    ///
    /// Idempotent: a no-op while already connecting, open, or closing.
    /// Success or failure arrives later as an `on_opened` or `on_error`
    /// callback during `tick()`.
    pub fn connect(&self) {
        // Guarded here as well as in the transport; the facade is the
        // public entry point and must not depend on the transport's
        // internals for its documented no-op.
        let state = self.transport.state();
        if matches!(state, ConnState::Connecting | ConnState::Open) {
            tracing::debug!(%state, "connect ignored, already active");
            return;
        }
        if self.config.debug {
            tracing::debug!(url = %self.config.url, "bridge connecting");
        }
        self.transport.connect(&self.config.url);
    }

    /// Starts an orderly close.
    ///
    /// A no-op unless the connection is open. `on_closed` fires during
    /// a later `tick()` once the close handshake completes (or times
    /// out).
    pub fn disconnect(&self) {
        if self.config.debug {
            tracing::debug!("bridge disconnecting");
        }
        self.transport.close();
    }

    /// Current connection state.
    pub fn state(&self) -> ConnState {
        self.transport.state()
    }

    /// True when the connection is `Open` and sends will be accepted.
    pub fn is_connected(&self) -> bool {
        self.transport.state() == ConnState::Open
    }

    // -----------------------------------------------------------------
    // Sending
    // -----------------------------------------------------------------

    /// Encodes a typed event into its envelope and queues it for
    /// sending.
    ///
    /// The wire `type` is the event's compile-time shape name. Fails
    /// fast if the connection is not open or the payload does not
    /// serialize to a JSON object; either failure also reaches
    /// `on_error` subscribers synchronously, before this returns.
    pub fn send_event<E: EventShape>(&self, event: &E) -> Result<(), BridgeError> {
        self.guard_open()?;
        let text = encode(event).map_err(|e| self.report(e.into()))?;
        if self.config.debug {
            tracing::debug!(shape = E::SHAPE, envelope = %text, "sending event");
        }
        self.send_frame(text)
    }

    /// Sends an event outside the fixed catalog: a caller-chosen name
    /// with an arbitrary JSON payload.
    ///
    /// The payload is embedded in the envelope as-is, single-encoded.
    /// Rejects an empty name and a null payload.
    pub fn send_custom(
        &self,
        name: impl Into<String>,
        payload: Value,
    ) -> Result<(), BridgeError> {
        self.guard_open()?;
        let name = name.into();
        let text =
            encode_named(&name, payload).map_err(|e| self.report(e.into()))?;
        if self.config.debug {
            tracing::debug!(shape = %name, envelope = %text, "sending custom event");
        }
        self.send_frame(text)
    }

    /// Sends a pre-built [`CustomEvent`]. Equivalent to
    /// [`send_custom`](Self::send_custom) with its name and payload.
    pub fn send_custom_event(&self, event: CustomEvent) -> Result<(), BridgeError> {
        self.send_custom(event.name, event.payload)
    }

    /// Sends raw text on the connection, bypassing the envelope codec.
    ///
    /// The escape hatch for peers that speak something other than the
    /// `{type, payload}` format. No validation is applied.
    pub fn send_raw(&self, text: impl Into<String>) -> Result<(), BridgeError> {
        self.guard_open()?;
        self.send_frame(text.into())
    }

    fn guard_open(&self) -> Result<(), BridgeError> {
        let state = self.transport.state();
        if state != ConnState::Open {
            return Err(self.report(BridgeError::NotConnected(state)));
        }
        Ok(())
    }

    fn send_frame(&self, text: String) -> Result<(), BridgeError> {
        self.transport
            .send(Frame::Text(text))
            .map_err(|e| self.report(e.into()))
    }

    /// Reports a guard or send failure to `on_error` subscribers
    /// synchronously, then hands the error back for the `Err` return.
    fn report(&self, err: BridgeError) -> BridgeError {
        tracing::warn!(error = %err, "bridge operation failed");
        self.subscribers.notify_error(&err);
        err
    }

    // -----------------------------------------------------------------
    // Dispatch
    // -----------------------------------------------------------------

    /// Drains the pending action queue, running every queued callback
    /// on the calling thread. Returns the number of actions executed.
    ///
    /// Call this regularly (once per frame, or in a small sleep loop).
    /// Nothing reaches subscribers between ticks.
    pub fn tick(&mut self) -> usize {
        self.dispatch.tick()
    }

    /// Counters for the dispatch loop (ticks, actions, caught panics).
    pub fn metrics(&self) -> &DispatchMetrics {
        self.dispatch.metrics()
    }

    // -----------------------------------------------------------------
    // Subscriptions
    // -----------------------------------------------------------------

    /// Registers a callback for when the connection opens.
    pub fn on_opened(&self, f: impl FnMut() + Send + 'static) {
        lock(&self.subscribers.opened).push(Box::new(f));
    }

    /// Registers a callback for when the connection closes, with the
    /// reason it closed.
    pub fn on_closed(&self, f: impl FnMut(&CloseReason) + Send + 'static) {
        lock(&self.subscribers.closed).push(Box::new(f));
    }

    /// Registers a callback for inbound text from the collector.
    pub fn on_message(&self, f: impl FnMut(&str) + Send + 'static) {
        lock(&self.subscribers.message).push(Box::new(f));
    }

    /// Registers a callback for failures: transport faults reported by
    /// `tick()`, and send-guard failures reported synchronously.
    pub fn on_error(&self, f: impl FnMut(&BridgeError) + Send + 'static) {
        lock(&self.subscribers.error).push(Box::new(f));
    }

    /// The configuration this bridge was built with.
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }
}

impl<T: Transport> Drop for Bridge<T> {
    fn drop(&mut self) {
        // Best-effort close so the collector sees a clean disconnect.
        self.transport.close();
    }
}
