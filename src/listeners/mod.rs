mod connection;
mod update;

pub use connection::{ConnectionListener, ConnectionListenerRef};
pub use update::{ListenerFn, ListenerRef, UpdateListener};
