/// System bus abstraction and the in-process reference bus.
pub mod bus;
/// Serial delivery queues backed by a shared Tokio runtime.
pub mod dispatch;
/// Common error types.
pub mod error;
/// Notification broker, observer registry, prefix decorator.
pub mod notify;

// -----------------------------------------------------------------------------
//  Frequently used public types
// -----------------------------------------------------------------------------

/// System bus: trait, token, callback type, reference implementation.
pub use bus::{BusCallback, BusToken, LocalBus, SystemBus};
/// Delivery queues: named serial queue and the process main queue.
pub use dispatch::{main_queue, DispatchQueue};
/// Dispatch errors.
pub use error::DispatchError;
/// Notification API: broker, capability trait, decorator, handle.
pub use notify::{
    default_broker, with_prefix, Notification, NotificationBroker, NotificationCenter,
    ObserverHandle, ObserverId, Observing, PrefixedCenter,
};
