#[cfg(feature = "cli")]
use std::sync::Mutex;
#[cfg(feature = "cli")]
use std::time::{Duration, Instant};
#[cfg(feature = "cli")]
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

#[cfg(feature = "cli")]
#[derive(Debug, Clone)]
pub struct ResourceSnapshot {
    pub cpu_usage: f32,
    pub memory_usage_mb: u64,
    pub peak_memory_mb: u64,
    pub stage_time: Duration,
    pub elapsed_time: Duration,
}

/// 記錄每個處理階段的 CPU、記憶體與耗時
///
/// 解碼大圖時記憶體峰值最明顯，所以每個階段結束都取一次快照。
#[cfg(feature = "cli")]
pub struct ResourceMonitor {
    state: Option<Mutex<MonitorState>>,
}

#[cfg(feature = "cli")]
struct MonitorState {
    system: System,
    pid: Pid,
    started: Instant,
    last_stage: Instant,
    peak_memory_mb: u64,
}

#[cfg(feature = "cli")]
impl ResourceMonitor {
    pub fn new(enabled: bool) -> Self {
        let state = if enabled {
            sysinfo::get_current_pid().ok().map(|pid| {
                let mut system = System::new();
                system.refresh_processes_specifics(
                    ProcessesToUpdate::Some(&[pid]),
                    true,
                    ProcessRefreshKind::everything(),
                );
                let now = Instant::now();
                Mutex::new(MonitorState {
                    system,
                    pid,
                    started: now,
                    last_stage: now,
                    peak_memory_mb: 0,
                })
            })
        } else {
            None
        };

        if enabled && state.is_none() {
            tracing::warn!("Resource monitoring unavailable: cannot resolve current PID");
        }

        Self { state }
    }

    pub fn snapshot(&self) -> Option<ResourceSnapshot> {
        let mut state = self.state.as_ref()?.lock().ok()?;
        let pid = state.pid;
        state.system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::everything(),
        );

        let (cpu_usage, memory_usage_mb) = {
            let process = state.system.process(pid)?;
            (process.cpu_usage(), process.memory() / 1024 / 1024)
        };
        state.peak_memory_mb = state.peak_memory_mb.max(memory_usage_mb);

        let now = Instant::now();
        let stage_time = now.duration_since(state.last_stage);
        state.last_stage = now;

        Some(ResourceSnapshot {
            cpu_usage,
            memory_usage_mb,
            peak_memory_mb: state.peak_memory_mb,
            stage_time,
            elapsed_time: now.duration_since(state.started),
        })
    }

    pub fn log_stage(&self, stage: &str) {
        if let Some(stats) = self.snapshot() {
            tracing::info!(
                "📊 {} - CPU: {:.1}%, Memory: {}MB, Peak: {}MB, Stage: {:?}",
                stage,
                stats.cpu_usage,
                stats.memory_usage_mb,
                stats.peak_memory_mb,
                stats.stage_time
            );
        }
    }

    pub fn log_summary(&self) {
        if let Some(stats) = self.snapshot() {
            tracing::info!(
                "📊 Final Stats - Total Time: {:?}, Peak Memory: {}MB",
                stats.elapsed_time,
                stats.peak_memory_mb
            );
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.state.is_some()
    }
}

#[cfg(feature = "cli")]
impl Default for ResourceMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}

// 沒有 sysinfo 時的空實作
#[cfg(not(feature = "cli"))]
#[derive(Default)]
pub struct ResourceMonitor;

#[cfg(not(feature = "cli"))]
impl ResourceMonitor {
    pub fn new(_enabled: bool) -> Self {
        Self
    }

    pub fn log_stage(&self, _stage: &str) {}

    pub fn log_summary(&self) {}

    pub fn is_enabled(&self) -> bool {
        false
    }
}
