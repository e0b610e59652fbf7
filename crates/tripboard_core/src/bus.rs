//! Typed publish/subscribe bus for model change notifications.
//!
//! # Responsibility
//! - Deliver every notification to every live subscriber, synchronously.
//! - Isolate handler failures from the notifier and from later handlers.
//!
//! # Invariants
//! - Delivery order equals subscription order.
//! - A `notify` issued during a dispatch is queued and delivered after the
//!   running dispatch finishes; dispatches never interleave.
//! - Dropping a `Subscription` removes its handler before the next delivery.
//! - Handler errors and panics are logged and recorded, never propagated.

use log::{debug, error};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::{Rc, Weak};

/// Scope/reason of a change; consumers pick their render granularity from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateKind {
    /// The whole collection was (re)loaded.
    Init,
    /// One item changed through a committed edit.
    Patch,
    /// One item was added.
    Added,
    /// One item was removed.
    Removed,
    /// View-local change of one item; open editors stay untouched.
    Minor,
}

impl UpdateKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Patch => "patch",
            Self::Added => "added",
            Self::Removed => "removed",
            Self::Minor => "minor",
        }
    }
}

impl Display for UpdateKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One delivered notification.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification<P> {
    pub kind: UpdateKind,
    pub payload: Option<P>,
}

/// Error type handlers may return.
pub type HandlerError = Box<dyn Error>;
pub type HandlerResult = Result<(), HandlerError>;

type Handler<P> = Rc<dyn Fn(&Notification<P>) -> HandlerResult>;

/// Stable id of one subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

/// Record of a handler that failed during dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerFailure {
    pub subscription: SubscriptionId,
    pub kind: UpdateKind,
    pub message: String,
}

struct BusState<P> {
    handlers: Vec<(SubscriptionId, Handler<P>)>,
    next_id: u64,
    dispatching: bool,
    queue: VecDeque<Notification<P>>,
    failures: Vec<HandlerFailure>,
}

impl<P> BusState<P> {
    fn is_subscribed(&self, id: SubscriptionId) -> bool {
        self.handlers.iter().any(|(candidate, _)| *candidate == id)
    }
}

/// Single-threaded notification bus.
///
/// Cloning yields another handle to the same bus.
pub struct NotificationBus<P> {
    state: Rc<RefCell<BusState<P>>>,
}

impl<P> Clone for NotificationBus<P> {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
        }
    }
}

impl<P: 'static> Default for NotificationBus<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: 'static> NotificationBus<P> {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(BusState {
                handlers: Vec::new(),
                next_id: 0,
                dispatching: false,
                queue: VecDeque::new(),
                failures: Vec::new(),
            })),
        }
    }

    /// Registers a handler for every future notification.
    ///
    /// The handler stays registered while the returned guard is alive.
    #[must_use = "dropping the subscription unsubscribes the handler"]
    pub fn subscribe(
        &self,
        handler: impl Fn(&Notification<P>) -> HandlerResult + 'static,
    ) -> Subscription {
        let id = {
            let mut state = self.state.borrow_mut();
            let id = SubscriptionId(state.next_id);
            state.next_id += 1;
            state.handlers.push((id, Rc::new(handler)));
            id
        };
        debug!("event=bus_subscribe module=bus subscription={}", id.0);

        let weak: Weak<RefCell<BusState<P>>> = Rc::downgrade(&self.state);
        Subscription {
            id,
            detach: Some(Box::new(move || {
                if let Some(state) = weak.upgrade() {
                    state
                        .borrow_mut()
                        .handlers
                        .retain(|(candidate, _)| *candidate != id);
                }
            })),
        }
    }

    /// Delivers `kind` with `payload` to every subscriber.
    ///
    /// Returns after the delivery (and any notifications queued by handlers
    /// meanwhile) completed. When called from inside a handler, the
    /// notification is queued and this call returns immediately.
    pub fn notify(&self, kind: UpdateKind, payload: Option<P>) {
        {
            let mut state = self.state.borrow_mut();
            state.queue.push_back(Notification { kind, payload });
            if state.dispatching {
                debug!("event=bus_notify module=bus status=queued kind={kind}");
                return;
            }
            state.dispatching = true;
        }

        loop {
            let next = self.state.borrow_mut().queue.pop_front();
            let Some(notification) = next else {
                break;
            };
            self.dispatch(&notification);
        }

        self.state.borrow_mut().dispatching = false;
    }

    fn dispatch(&self, notification: &Notification<P>) {
        let handlers: Vec<(SubscriptionId, Handler<P>)> = self.state.borrow().handlers.clone();
        debug!(
            "event=bus_notify module=bus status=dispatch kind={} subscribers={}",
            notification.kind,
            handlers.len()
        );

        for (id, handler) in handlers {
            if !self.state.borrow().is_subscribed(id) {
                continue;
            }
            let outcome = catch_unwind(AssertUnwindSafe(|| handler(notification)));
            let message = match outcome {
                Ok(Ok(())) => continue,
                Ok(Err(err)) => err.to_string(),
                Err(panic) => panic_message(panic.as_ref()),
            };
            error!(
                "event=bus_handler_failed module=bus status=error subscription={} kind={} error={}",
                id.0, notification.kind, message
            );
            self.state.borrow_mut().failures.push(HandlerFailure {
                subscription: id,
                kind: notification.kind,
                message,
            });
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.state.borrow().handlers.len()
    }

    /// Returns and clears recorded handler failures.
    pub fn take_failures(&self) -> Vec<HandlerFailure> {
        std::mem::take(&mut self.state.borrow_mut().failures)
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("handler panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("handler panicked: {message}")
    } else {
        "handler panicked".to_string()
    }
}

/// RAII guard of one bus registration.
pub struct Subscription {
    id: SubscriptionId,
    detach: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Removes the handler now.
    pub fn unsubscribe(mut self) {
        self.detach_now();
    }

    fn detach_now(&mut self) {
        if let Some(detach) = self.detach.take() {
            debug!("event=bus_unsubscribe module=bus subscription={}", self.id.0);
            detach();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.detach_now();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.detach.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{NotificationBus, UpdateKind};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn delivers_in_subscription_order() {
        let bus: NotificationBus<u32> = NotificationBus::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let subscriptions: Vec<_> = ["a", "b", "c"]
            .into_iter()
            .map(|name| {
                let log = Rc::clone(&log);
                bus.subscribe(move |notification| {
                    log.borrow_mut()
                        .push(format!("{name}:{:?}", notification.payload));
                    Ok(())
                })
            })
            .collect();

        bus.notify(UpdateKind::Patch, Some(7));
        assert_eq!(
            *log.borrow(),
            vec!["a:Some(7)", "b:Some(7)", "c:Some(7)"]
        );
        assert_eq!(subscriptions.len(), 3);
    }

    #[test]
    fn failing_handlers_do_not_stop_delivery() {
        let bus: NotificationBus<()> = NotificationBus::new();
        let reached = Rc::new(RefCell::new(0));

        let _err = bus.subscribe(|_| Err("boom".into()));
        let _panic = bus.subscribe(|_| panic!("handler exploded"));
        let counter = Rc::clone(&reached);
        let _ok = bus.subscribe(move |_| {
            *counter.borrow_mut() += 1;
            Ok(())
        });

        bus.notify(UpdateKind::Minor, None);

        assert_eq!(*reached.borrow(), 1);
        let failures = bus.take_failures();
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].message, "boom");
        assert!(failures[1].message.contains("handler exploded"));
        assert!(bus.take_failures().is_empty());
    }

    #[test]
    fn reentrant_notify_is_delivered_after_current_dispatch() {
        let bus: NotificationBus<u32> = NotificationBus::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let inner_bus = bus.clone();
        let first_log = Rc::clone(&log);
        let _first = bus.subscribe(move |notification| {
            first_log
                .borrow_mut()
                .push(format!("first:{}", notification.kind));
            if notification.kind == UpdateKind::Patch {
                inner_bus.notify(UpdateKind::Minor, None);
            }
            Ok(())
        });
        let second_log = Rc::clone(&log);
        let _second = bus.subscribe(move |notification| {
            second_log
                .borrow_mut()
                .push(format!("second:{}", notification.kind));
            Ok(())
        });

        bus.notify(UpdateKind::Patch, Some(1));

        assert_eq!(
            *log.borrow(),
            vec![
                "first:patch",
                "second:patch",
                "first:minor",
                "second:minor"
            ]
        );
    }

    #[test]
    fn dropping_subscription_unsubscribes() {
        let bus: NotificationBus<()> = NotificationBus::new();
        let hits = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&hits);
        let subscription = bus.subscribe(move |_| {
            *counter.borrow_mut() += 1;
            Ok(())
        });
        assert_eq!(bus.subscriber_count(), 1);

        drop(subscription);
        bus.notify(UpdateKind::Init, None);

        assert_eq!(bus.subscriber_count(), 0);
        assert_eq!(*hits.borrow(), 0);
    }

    #[test]
    fn handler_unsubscribed_mid_dispatch_is_skipped() {
        let bus: NotificationBus<()> = NotificationBus::new();
        let hits = Rc::new(RefCell::new(0));
        let victim = Rc::new(RefCell::new(None));

        let slot = Rc::clone(&victim);
        let _killer = bus.subscribe(move |_| {
            slot.borrow_mut().take();
            Ok(())
        });
        let counter = Rc::clone(&hits);
        *victim.borrow_mut() = Some(bus.subscribe(move |_| {
            *counter.borrow_mut() += 1;
            Ok(())
        }));

        bus.notify(UpdateKind::Init, None);
        assert_eq!(*hits.borrow(), 0);
    }
}
