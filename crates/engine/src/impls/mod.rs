mod file;
pub use file::{FileBundleSource, FileSourceError};

mod provider;
pub use provider::RpcChain;

mod refs;

mod relay;
