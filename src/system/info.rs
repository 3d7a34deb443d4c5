use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

/// Host identification printed once when the dashboard finishes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SystemInfo {
    pub system_name: String,
    pub machine_name: String,
    pub version: String,
    pub release: String,
    pub architecture: String,
    pub uptime_secs: u64,
}

impl SystemInfo {
    pub fn gather() -> Self {
        let unknown = || "unknown".to_string();
        SystemInfo {
            system_name: System::name().unwrap_or_else(unknown),
            machine_name: System::host_name().unwrap_or_else(unknown),
            version: System::os_version().unwrap_or_else(unknown),
            release: System::kernel_version().unwrap_or_else(unknown),
            architecture: std::env::consts::ARCH.to_string(),
            uptime_secs: System::uptime(),
        }
    }
}

/// Resident memory of the dashboard process itself.
pub struct SelfMemory {
    sys: System,
    pid: Option<Pid>,
}

impl Default for SelfMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl SelfMemory {
    pub fn new() -> Self {
        SelfMemory {
            sys: System::new(),
            pid: sysinfo::get_current_pid().ok(),
        }
    }

    pub fn kilobytes(&mut self) -> Option<u64> {
        let pid = self.pid?;
        self.sys.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::nothing().with_memory(),
        );
        self.sys.process(pid).map(|process| process.memory() / 1024)
    }
}
