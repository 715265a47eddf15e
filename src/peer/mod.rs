//! Signaling peers and the in-process offer/answer exchange.

pub mod connection;
pub mod coordinator;
pub mod events;
pub mod pair;
pub mod signaling;
pub mod stats;

pub use connection::{Peer, PeerSetup};
pub use coordinator::{next_step, ExchangeStep};
pub use pair::PeerPair;
pub use signaling::{signaling_channel, PeerInbox, PeerLink};
pub use stats::ExchangeStats;
