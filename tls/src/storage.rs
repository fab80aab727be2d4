//! `Storage` (spec §6): an opaque persistence handle for ticket keys and
//! session tickets. Spec is explicit that persistence is an external
//! collaborator, not something the PAL implements — this trait exists
//! purely as the seam so call sites compile against a stable interface.

pub trait Storage: Send + Sync {
    fn open(&self, path: &str, name: &str) -> std::io::Result<()>;
    fn close(&self, path: &str, name: &str) -> std::io::Result<()>;
    fn read(&self, path: &str, name: &str) -> std::io::Result<Vec<u8>>;
    fn write(&self, path: &str, name: &str, data: &[u8]) -> std::io::Result<()>;
}
