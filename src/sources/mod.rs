mod position;
mod service;

pub use position::{PositionSource, UpdateRequest};
pub use service::{ServiceFault, ServiceSource};
