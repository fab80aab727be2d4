/// Error taxonomy for the primitives layer (spec §7: out-of-memory and
/// CSPRNG failure are the only categories this crate can produce).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("allocation failed")]
    OutOfMemory,

    #[error("system random source failed: {0}")]
    Random(#[from] rand::Error),

    #[error("rundown already released")]
    RundownReleased,
}

pub type Result<T> = std::result::Result<T, Error>;
