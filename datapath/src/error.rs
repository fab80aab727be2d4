/// Error taxonomy for the datapath layer.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("socket option {0} failed: {1}")]
    SocketOption(&'static str, std::io::Error),

    #[error("socket creation failed: {0}")]
    Create(std::io::Error),

    #[error("bind failed: {0}")]
    Bind(std::io::Error),

    #[error("the first bound SocketContext chose port {first}, but a later one bound {got}")]
    PortMismatch { first: u16, got: u16 },

    #[error("recv block pool exhausted on the receive path (fatal for this datagram)")]
    RecvBlockExhausted,

    #[error("kernel did not deliver required ancillary data: {0}")]
    MissingAncillaryData(&'static str),

    #[error("send failed: {0}")]
    Send(std::io::Error),

    #[error("send batch of {len} buffers exceeds MaxBatchSize {max} (or is empty)")]
    BatchSize { len: usize, max: usize },

    #[error("recv failed: {0}")]
    Recv(std::io::Error),

    #[error("datapath is shutting down")]
    ShuttingDown,
}

pub type Result<T> = std::result::Result<T, Error>;
