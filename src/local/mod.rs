pub mod actor;
pub mod client;
pub mod events;
pub mod producer;
pub mod relay;

pub use events::{InboundEvent, JoinRoom};
pub use relay::Relay;
