//! The closed set of named channels. Fixed at build time; every message on
//! the bridge names exactly one of these.

/// App info
pub const APP_GET_INFO: &str = "app:get-info";

/// Metrics subscribe/unsubscribe lifecycle
pub const METRICS_ON: &str = "metrics:on";
pub const METRICS_OFF: &str = "metrics:off";

/// Logging
pub const LOG_WRITE: &str = "log:write";

/// Commands (one-way, no reply by contract)
pub const COMMAND_SIMULATE_CPU_WORK: &str = "command:simulate-cpu-work";
pub const COMMAND_SIMULATE_MEMORY_LEAK: &str = "command:simulate-memory-leak";
pub const COMMAND_TRIGGER_ERROR: &str = "command:trigger-error";
pub const COMMAND_OPEN_LOGS_FOLDER: &str = "command:open-logs-folder";

/// Host→UI push event carrying a `ProcessMetrics` snapshot.
pub const METRICS_UPDATE: &str = "metrics-update";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    /// Caller attaches an id and awaits a response frame.
    RequestResponse,
    /// Fire-and-forget: the host never replies, even to malformed input.
    OneWay,
}

#[derive(Debug, Clone, Copy)]
pub struct ChannelDescriptor {
    pub name: &'static str,
    pub kind: ChannelKind,
}

pub const CHANNELS: &[ChannelDescriptor] = &[
    ChannelDescriptor {
        name: APP_GET_INFO,
        kind: ChannelKind::RequestResponse,
    },
    ChannelDescriptor {
        name: METRICS_ON,
        kind: ChannelKind::RequestResponse,
    },
    ChannelDescriptor {
        name: METRICS_OFF,
        kind: ChannelKind::RequestResponse,
    },
    ChannelDescriptor {
        name: LOG_WRITE,
        kind: ChannelKind::RequestResponse,
    },
    ChannelDescriptor {
        name: COMMAND_SIMULATE_CPU_WORK,
        kind: ChannelKind::OneWay,
    },
    ChannelDescriptor {
        name: COMMAND_SIMULATE_MEMORY_LEAK,
        kind: ChannelKind::OneWay,
    },
    ChannelDescriptor {
        name: COMMAND_TRIGGER_ERROR,
        kind: ChannelKind::OneWay,
    },
    ChannelDescriptor {
        name: COMMAND_OPEN_LOGS_FOLDER,
        kind: ChannelKind::OneWay,
    },
];

pub fn descriptor(name: &str) -> Option<&'static ChannelDescriptor> {
    CHANNELS.iter().find(|c| c.name == name)
}
