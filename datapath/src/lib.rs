//! The UDP datapath: a `Datapath` owning N `ProcessorContext`s, each
//! running a dedicated worker thread that drives one or more `Socket`s'
//! edge-triggered readiness. See spec §4.4 for the full topology.

pub mod addr;
pub mod callbacks;
pub mod cmsg;
pub mod datapath;
pub mod error;
pub mod processor;
pub mod recv;
pub mod send;
pub mod socket;
pub mod socket_ctx;
pub mod socket_handle;

pub use callbacks::DatapathCallbacks;
pub use datapath::Datapath;
pub use error::{Error, Result};
pub use recv::{OwnedRecvBlock, RecvBlock};
pub use send::SendData;
pub use socket_handle::Socket;
