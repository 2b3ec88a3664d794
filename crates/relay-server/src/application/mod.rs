//! Application layer: protocol dispatch, broadcast policy, and the expiry
//! sweeper. Everything here is I/O-free and reaches peers only through the
//! [`transport::PeerSink`] seam.

pub mod dispatcher;
pub mod relay;
pub mod sweeper;
pub mod transport;

pub use dispatcher::Dispatcher;
pub use transport::{PeerSink, SendError, TransportEvent};
