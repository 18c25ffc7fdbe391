//! Event routing between the session worker and its subscribers.

mod bus;

pub use bus::{BusSink, Event, EventBus, Topic};
