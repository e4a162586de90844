//! Current-process resource metrics via sysinfo, with /proc supplements on
//! Linux for the split between private/shared resident memory and for an
//! idle-wakeup rate derived from voluntary context switches. Other platforms
//! report zero for both; the snapshot shape stays identical.

use chrono::Utc;
use deskbridge_proto::{CpuMetrics, MemoryMetrics, ProcessMetrics};
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SampleError {
    #[error("could not determine current pid: {0}")]
    UnknownPid(&'static str),
    #[error("current process (pid {0}) not visible to sysinfo")]
    ProcessNotFound(Pid),
}

pub struct MetricsCollector {
    sys: System,
    pid: Pid,
    #[cfg(target_os = "linux")]
    last_switches: Option<(u64, std::time::Instant)>,
}

impl MetricsCollector {
    pub fn new() -> Result<MetricsCollector, SampleError> {
        let pid = sysinfo::get_current_pid().map_err(SampleError::UnknownPid)?;
        Ok(MetricsCollector {
            sys: System::new(),
            pid,
            #[cfg(target_os = "linux")]
            last_switches: None,
        })
    }

    /// Take one snapshot. cpu_usage needs two refreshes to mean anything, so
    /// the first tick after start reports 0%.
    pub fn collect(&mut self) -> Result<ProcessMetrics, SampleError> {
        self.sys.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[self.pid]),
            true,
            ProcessRefreshKind::nothing().with_cpu().with_memory(),
        );
        let proc = self
            .sys
            .process(self.pid)
            .ok_or(SampleError::ProcessNotFound(self.pid))?;

        let resident = proc.memory();
        let percent = proc.cpu_usage();

        let (private, shared) = self.memory_split(resident);
        let wakeups = self.idle_wakeups_per_second();

        Ok(ProcessMetrics {
            cpu: CpuMetrics {
                percent,
                idle_wakeups_per_second: wakeups,
            },
            memory: MemoryMetrics {
                private_bytes: private,
                resident_bytes: resident,
                shared_bytes: shared,
            },
            timestamp: Utc::now().timestamp_millis(),
        })
    }

    #[cfg(target_os = "linux")]
    fn memory_split(&self, resident: u64) -> (u64, u64) {
        match linux::proc_status() {
            Some(status) => {
                let shared = resident.saturating_sub(status.anon_bytes);
                (status.anon_bytes.min(resident), shared)
            }
            None => (resident, 0),
        }
    }

    #[cfg(not(target_os = "linux"))]
    fn memory_split(&self, resident: u64) -> (u64, u64) {
        (resident, 0)
    }

    #[cfg(target_os = "linux")]
    fn idle_wakeups_per_second(&mut self) -> u64 {
        let now = std::time::Instant::now();
        let Some(status) = linux::proc_status() else {
            return 0;
        };
        let rate = match self.last_switches {
            Some((prev, at)) => {
                let elapsed = now.duration_since(at).as_secs_f64();
                if elapsed > 0.0 {
                    (status.voluntary_switches.saturating_sub(prev) as f64 / elapsed) as u64
                } else {
                    0
                }
            }
            None => 0,
        };
        self.last_switches = Some((status.voluntary_switches, now));
        rate
    }

    #[cfg(not(target_os = "linux"))]
    fn idle_wakeups_per_second(&mut self) -> u64 {
        0
    }
}

#[cfg(target_os = "linux")]
mod linux {
    use std::fs;

    pub struct ProcStatus {
        /// RssAnon, i.e. resident memory not backed by a file or shared map.
        pub anon_bytes: u64,
        pub voluntary_switches: u64,
    }

    // Values in /proc/<pid>/status are "<n> kB" for memory rows and a bare
    // count for the context-switch rows.
    fn field_value(line: &str) -> Option<u64> {
        line.split_whitespace().nth(1)?.parse().ok()
    }

    pub fn proc_status() -> Option<ProcStatus> {
        let text = fs::read_to_string("/proc/self/status").ok()?;
        let mut anon_kb = None;
        let mut switches = None;
        for line in text.lines() {
            if line.starts_with("RssAnon:") {
                anon_kb = field_value(line);
            } else if line.starts_with("voluntary_ctxt_switches:") {
                switches = field_value(line);
            }
        }
        Some(ProcStatus {
            anon_bytes: anon_kb? * 1024,
            voluntary_switches: switches?,
        })
    }
}
