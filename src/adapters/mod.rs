// Adapters layer: concrete implementations for external systems (sockets, files).

pub mod storage;
pub mod tcp;

pub use storage::LocalStorage;
pub use tcp::TcpConnector;
