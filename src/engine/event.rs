use std::{
    cell::RefCell,
    collections::HashMap,
    hash::Hash,
    rc::{Rc, Weak},
};

pub type SubscriptionId = u64;

type Callback<E> = Rc<RefCell<dyn FnMut(&E)>>;

struct Listeners<C, E> {
    // Monotonically increasing id starting from 1.
    next_id: SubscriptionId,
    channels: HashMap<C, Vec<(SubscriptionId, Callback<E>)>>,
}

/// Channel keyed observer registry. Cloning gives another handle to the same registry, so
/// a producer and its subscribers can each hold one.
///
/// Everything here runs on the thread dispatching input events, which is why this is
/// `Rc`/`RefCell` and not behind a lock.
pub struct EventRegistry<C, E> {
    listeners: Rc<RefCell<Listeners<C, E>>>,
}

impl<C, E> Clone for EventRegistry<C, E> {
    fn clone(&self) -> Self {
        Self {
            listeners: self.listeners.clone(),
        }
    }
}

impl<C, E> std::fmt::Debug for EventRegistry<C, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventRegistry")
            .field("channel_type", &std::any::type_name::<C>())
            .field("event_type", &std::any::type_name::<E>())
            .finish()
    }
}

impl<C, E> Default for EventRegistry<C, E>
where
    C: Copy + Eq + Hash + 'static,
    E: 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<C, E> EventRegistry<C, E>
where
    C: Copy + Eq + Hash + 'static,
    E: 'static,
{
    pub fn new() -> Self {
        Self {
            listeners: Rc::new(RefCell::new(Listeners {
                next_id: 1,
                channels: HashMap::new(),
            })),
        }
    }

    /// The callback stays registered until the returned handle is disposed or dropped.
    pub fn subscribe(&self, channel: C, callback: impl FnMut(&E) + 'static) -> Subscription {
        let mut listeners = self.listeners.borrow_mut();
        let id = listeners.next_id;
        listeners.next_id += 1;
        let callback: Callback<E> = Rc::new(RefCell::new(callback));
        listeners
            .channels
            .entry(channel)
            .or_default()
            .push((id, callback));

        let registry: Weak<RefCell<Listeners<C, E>>> = Rc::downgrade(&self.listeners);
        Subscription {
            id,
            unsubscribe: Some(Box::new(move || {
                let Some(listeners) = registry.upgrade() else {
                    return;
                };
                let mut listeners = listeners.borrow_mut();
                if let Some(callbacks) = listeners.channels.get_mut(&channel) {
                    callbacks.retain(|(callback_id, _)| *callback_id != id);
                }
            })),
        }
    }

    /// Calls every callback on `channel` in subscription order. Callbacks may subscribe or
    /// dispose subscriptions while this runs, those changes apply from the next emit.
    pub fn emit(&self, channel: C, event: &E) {
        let callbacks = {
            let listeners = self.listeners.borrow();
            match listeners.channels.get(&channel) {
                Some(callbacks) => callbacks
                    .iter()
                    .map(|(_, callback)| callback.clone())
                    .collect::<Vec<_>>(),
                None => return,
            }
        };

        for callback in callbacks {
            match callback.try_borrow_mut() {
                Ok(mut callback) => (&mut *callback)(event),
                Err(_) => log::warn!("Skipping an event callback that emitted into itself."),
            }
        }
    }

    pub fn subscriber_count(&self, channel: C) -> usize {
        self.listeners
            .borrow()
            .channels
            .get(&channel)
            .map_or(0, |callbacks| callbacks.len())
    }
}

/// Handle to a registered callback. Disposing or dropping it unsubscribes the callback.
#[must_use = "dropping a subscription unsubscribes it immediately"]
pub struct Subscription {
    id: SubscriptionId,
    unsubscribe: Option<Box<dyn FnOnce()>>,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.unsubscribe.is_some())
            .finish()
    }
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn dispose(mut self) {
        self.unsubscribe_now();
    }

    /// Keeps the callback registered for as long as the registry lives.
    pub fn detach(mut self) {
        self.unsubscribe = None;
    }

    fn unsubscribe_now(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe_now();
    }
}
