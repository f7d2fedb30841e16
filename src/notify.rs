//! Registry for USB PD event notifications.
//!
//! Notification sources publish EC events here, and every registered subscriber receives each
//! event in order. A subscriber is unregistered by dropping its [`Subscription`].
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::pubsub::{PubSubChannel, Subscriber, WaitResult};

use crate::host_cmd::{EC_HOST_EVENT_PD_MCU, host_event_mask};

/// Errors that can occur when registering with the notifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// All subscriber slots are taken.
    TooManySubscribers,
}

/// Outcome of offering a host event to the notifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NotifyResult {
    /// The event was not a USB PD event, and was ignored.
    Done,
    /// The event was published.
    Ok,
}

/// A notification, as received by a subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Notification {
    /// An event was published.
    Event(u32),
    /// The subscriber fell behind, and this many events were dropped.
    Missed(u64),
}

/// The USB PD event notifier.
///
/// Holds up to `CAP` undelivered events, for up to `SUBS` subscribers.
pub struct UsbPdNotifier<M: RawMutex, const CAP: usize, const SUBS: usize> {
    channel: PubSubChannel<M, u32, CAP, SUBS, 1>,
}

impl<M: RawMutex, const CAP: usize, const SUBS: usize> UsbPdNotifier<M, CAP, SUBS> {
    /// Create a notifier without subscribers.
    pub const fn new() -> Self {
        Self {
            channel: PubSubChannel::new(),
        }
    }

    /// Register a new subscriber.
    pub fn register(&self) -> Result<Subscription<'_, M, CAP, SUBS>, Error> {
        self.channel
            .subscriber()
            .map(|subscriber| Subscription { subscriber })
            .map_err(|_| Error::TooManySubscribers)
    }

    /// Publish an event to all subscribers.
    ///
    /// Does not wait. If a subscriber's queue is full, its oldest event is dropped.
    pub fn notify(&self, event: u32) {
        trace!("USB PD event {:#x}", event);
        self.channel.immediate_publisher().publish_immediate(event);
    }

    /// Offer a raw host event mask, and publish it if it signals a USB PD event.
    pub fn notify_host_event(&self, host_event: u32) -> NotifyResult {
        if host_event & host_event_mask(EC_HOST_EVENT_PD_MCU) != 0 {
            self.notify(host_event);
            NotifyResult::Ok
        } else {
            NotifyResult::Done
        }
    }
}

impl<M: RawMutex, const CAP: usize, const SUBS: usize> Default for UsbPdNotifier<M, CAP, SUBS> {
    fn default() -> Self {
        Self::new()
    }
}

/// A registered subscriber of a [`UsbPdNotifier`].
pub struct Subscription<'a, M: RawMutex, const CAP: usize, const SUBS: usize> {
    subscriber: Subscriber<'a, M, u32, CAP, SUBS, 1>,
}

impl<M: RawMutex, const CAP: usize, const SUBS: usize> Subscription<'_, M, CAP, SUBS> {
    /// Wait for the next notification.
    pub async fn next(&mut self) -> Notification {
        self.subscriber.next_message().await.into()
    }

    /// Take the next notification, if one is pending.
    pub fn try_next(&mut self) -> Option<Notification> {
        self.subscriber.try_next_message().map(Into::into)
    }
}

impl Notification {
    /// The number of published events that this notification stands for.
    pub fn events(&self) -> u64 {
        match self {
            Notification::Event(_) => 1,
            Notification::Missed(count) => *count,
        }
    }
}

impl From<WaitResult<u32>> for Notification {
    fn from(value: WaitResult<u32>) -> Self {
        match value {
            WaitResult::Message(event) => Notification::Event(event),
            WaitResult::Lagged(missed) => Notification::Missed(missed),
        }
    }
}
