//! Host-process library: channel dispatch, the batched log writer, and the
//! shared metrics sampler. The binary in `main.rs` wires these onto a local
//! WebSocket server; everything here is usable from tests without a socket.

pub mod config;
pub mod dispatch;
pub mod logger;
pub mod metrics;
pub mod sampler;
pub mod state;
pub mod ws;
