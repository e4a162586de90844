//! Shared wire contract between the deskbridge host and UI processes.
//! Keep this crate minimal and stable — it defines the wire format.

pub mod channels;
pub mod frames;
pub mod types;

pub use channels::{descriptor, ChannelDescriptor, ChannelKind, CHANNELS};
pub use frames::{DecodeError, HostFrame, Request, RequestFrame};
pub use types::{
    AppInfo, CpuMetrics, LogEntry, LogLevel, LogScope, MemoryMetrics, ProcessMetrics,
};
