//! Per-instance event channels

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::error::JooplResult;
use crate::value::{Function, Value};

/// Payload of a raise: the handler argument and an optional `this`
#[derive(Debug, Clone, Default)]
pub struct RaiseArgs {
    /// Argument passed to every handler
    pub args: Value,
    /// Binding for handlers registered without their own context (`$this`)
    pub this: Option<Value>,
}

impl RaiseArgs {
    /// Payload with arguments and no `this`
    pub fn new(args: Value) -> Self {
        Self { args, this: None }
    }

    /// Set the `this` binding
    pub fn with_this(mut self, this: Value) -> Self {
        self.this = Some(this);
        self
    }
}

impl From<Value> for RaiseArgs {
    fn from(args: Value) -> Self {
        RaiseArgs::new(args)
    }
}

#[derive(Clone)]
struct Subscriber {
    handler: Function,
    context: Option<Value>,
}

struct ChannelInner {
    name: Rc<str>,
    subscribers: RefCell<Vec<Subscriber>>,
}

/// Subscriber list of one declared event on one instance
///
/// Cloning the handle shares the channel; a fresh channel is only ever made
/// by instance construction.
#[derive(Clone)]
pub struct EventChannel(Rc<ChannelInner>);

impl EventChannel {
    pub(crate) fn new(name: Rc<str>) -> Self {
        EventChannel(Rc::new(ChannelInner {
            name,
            subscribers: RefCell::new(Vec::new()),
        }))
    }

    /// Declared event name
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Append a handler, optionally with its own `this` binding
    ///
    /// The channel keeps the handler (and its context) alive for as long as
    /// the owning instance lives. Handlers that need the owning instance
    /// should hold a [`WeakInstance`](crate::instance::WeakInstance).
    pub fn add_event_listener(&self, handler: Function, context: Option<Value>) {
        self.0
            .subscribers
            .borrow_mut()
            .push(Subscriber { handler, context });
    }

    /// Wrap a closure, subscribe it and return the handle for later removal
    pub fn subscribe<F>(&self, f: F) -> Function
    where
        F: Fn(&Value, &[Value]) -> JooplResult<Value> + 'static,
    {
        let handler = Function::new(f);
        self.add_event_listener(handler.clone(), None);
        handler
    }

    /// Remove every subscription of `handler`, whatever its context
    ///
    /// Returns whether anything was removed.
    pub fn remove_event_listener(&self, handler: &Function) -> bool {
        let mut subscribers = self.0.subscribers.borrow_mut();
        let before = subscribers.len();
        subscribers.retain(|s| !s.handler.ptr_eq(handler));
        subscribers.len() != before
    }

    /// Invoke every current subscriber in subscription order
    ///
    /// The subscriber list is snapshotted first: handlers added or removed
    /// by a handler take effect from the next raise. A handler error stops
    /// the raise and is returned.
    pub fn raise(&self, payload: impl Into<RaiseArgs>) -> JooplResult<()> {
        let payload = payload.into();
        let snapshot = self.0.subscribers.borrow().clone();
        tracing::trace!(event = %self.0.name, subscribers = snapshot.len(), "raising event");

        for subscriber in &snapshot {
            let this = subscriber
                .context
                .clone()
                .or_else(|| payload.this.clone())
                .unwrap_or_default();
            subscriber
                .handler
                .call(&this, std::slice::from_ref(&payload.args))?;
        }
        Ok(())
    }

    /// Number of subscriptions
    pub fn listener_count(&self) -> usize {
        self.0.subscribers.borrow().len()
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &EventChannel) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for EventChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventChannel")
            .field("name", &self.0.name)
            .field("listeners", &self.listener_count())
            .finish()
    }
}
