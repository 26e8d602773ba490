//! Process resource sampling
//!
//! The driver samples CPU once per second and reports the mean over recent
//! samples with each window, next to the process's share of system memory.

use sysinfo::{CpuExt, Pid, ProcessExt, System, SystemExt};
use tracing::warn;

/// Source of CPU and memory readings, in percent
pub trait ResourceSampler: Send {
    /// Global CPU usage since the previous call
    fn cpu_percent(&mut self) -> f64;

    /// Resident memory of this process as a share of total memory
    fn memory_percent(&mut self) -> f64;
}

/// Reads the host through `sysinfo`
pub struct SystemSampler {
    sys: System,
    pid: Option<Pid>,
}

impl SystemSampler {
    pub fn new() -> Self {
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => Some(pid),
            Err(e) => {
                warn!("Process memory unavailable: {}", e);
                None
            }
        };

        let mut sys = System::new();
        // CPU usage is a delta; the first refresh only sets the baseline
        sys.refresh_cpu();
        sys.refresh_memory();

        Self { sys, pid }
    }
}

impl Default for SystemSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceSampler for SystemSampler {
    fn cpu_percent(&mut self) -> f64 {
        self.sys.refresh_cpu();
        f64::from(self.sys.global_cpu_info().cpu_usage())
    }

    fn memory_percent(&mut self) -> f64 {
        let Some(pid) = self.pid else {
            return 0.0;
        };
        self.sys.refresh_memory();
        if !self.sys.refresh_process(pid) {
            return 0.0;
        }

        let total = self.sys.total_memory();
        match self.sys.process(pid) {
            Some(process) if total > 0 => process.memory() as f64 * 100.0 / total as f64,
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_sampler_ranges() {
        let mut sampler = SystemSampler::new();
        std::thread::sleep(std::time::Duration::from_millis(250));

        let cpu = sampler.cpu_percent();
        assert!(cpu.is_finite() && cpu >= 0.0);

        let memory = sampler.memory_percent();
        assert!((0.0..=100.0).contains(&memory));
    }
}
