//! Host monitoring via the /proc filesystem.
//!
//! # Toyota Way: Visual Management (目で見る管理)
//! Make the harness's own footprint visible while it drives load.
//!
//! # Implementation
//!
//! On Linux, parses:
//! - `/proc/meminfo` - host memory total and available
//! - `/proc/self/stat` - this process's CPU time
//!
//! Other platforms report zeros.

use std::time::Instant;

use crate::error::{ObserveError, Result};

/// One monitor reading.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HostSnapshot {
    /// Process CPU usage since the previous reading, in percent.
    pub cpu_percent: f64,
    /// Host memory in use (total minus available), in bytes.
    pub mem_used_bytes: u64,
    /// Host memory total, in bytes.
    pub mem_total_bytes: u64,
}

/// Host memory figures from `/proc/meminfo`, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemInfo {
    /// `MemTotal`.
    pub total: u64,
    /// `MemAvailable`.
    pub available: u64,
}

impl MemInfo {
    /// Memory in use.
    #[must_use]
    pub const fn used(&self) -> u64 {
        self.total.saturating_sub(self.available)
    }
}

#[derive(Debug, Clone, Copy)]
struct CpuMeasurement {
    ticks: u64,
    wall_time: Instant,
}

/// Stateful monitor; CPU percentage is a delta between consecutive readings.
#[derive(Debug, Default)]
pub struct HostMonitor {
    prev_cpu: Option<CpuMeasurement>,
}

impl HostMonitor {
    /// Creates a monitor with no previous CPU measurement.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes one reading. Unreadable sources report zeros.
    pub fn sample(&mut self) -> HostSnapshot {
        #[cfg(target_os = "linux")]
        {
            self.sample_linux()
        }

        #[cfg(not(target_os = "linux"))]
        {
            HostSnapshot::default()
        }
    }

    #[cfg(target_os = "linux")]
    fn sample_linux(&mut self) -> HostSnapshot {
        let now = Instant::now();

        let memory = read_meminfo().unwrap_or_else(|e| {
            tracing::debug!(error = %e, "meminfo unavailable");
            MemInfo {
                total: 0,
                available: 0,
            }
        });

        let cpu_percent = match read_self_cpu_ticks() {
            Ok(ticks) => {
                let percent = self.cpu_percent(ticks, now);
                self.prev_cpu = Some(CpuMeasurement {
                    ticks,
                    wall_time: now,
                });
                percent
            }
            Err(e) => {
                tracing::debug!(error = %e, "process stat unavailable");
                0.0
            }
        };

        HostSnapshot {
            cpu_percent,
            mem_used_bytes: memory.used(),
            mem_total_bytes: memory.total,
        }
    }

    #[cfg(target_os = "linux")]
    fn cpu_percent(&self, ticks: u64, now: Instant) -> f64 {
        let Some(prev) = self.prev_cpu else {
            return 0.0;
        };

        let elapsed = now.duration_since(prev.wall_time).as_secs_f64();
        if elapsed < 0.001 || ticks < prev.ticks {
            return 0.0;
        }

        // SAFETY: sysconf is safe to call with _SC_CLK_TCK
        #[allow(unsafe_code)]
        let clk_tck = unsafe { libc::sysconf(libc::_SC_CLK_TCK) };
        if clk_tck <= 0 {
            return 0.0;
        }

        let cpu_seconds = (ticks - prev.ticks) as f64 / clk_tck as f64;
        (cpu_seconds / elapsed * 100.0).max(0.0)
    }
}

/// Host memory total in bytes, or 0 where unavailable.
#[must_use]
pub fn host_memory_total() -> u64 {
    #[cfg(target_os = "linux")]
    {
        read_meminfo().map_or(0, |m| m.total)
    }

    #[cfg(not(target_os = "linux"))]
    {
        0
    }
}

#[cfg(target_os = "linux")]
fn read_meminfo() -> Result<MemInfo> {
    let content = std::fs::read_to_string("/proc/meminfo")?;
    parse_meminfo(&content)
}

#[cfg(target_os = "linux")]
fn read_self_cpu_ticks() -> Result<u64> {
    let content = std::fs::read_to_string("/proc/self/stat")?;
    parse_stat_ticks(&content)
}

/// Parses `MemTotal` and `MemAvailable` out of `/proc/meminfo` content.
///
/// # Errors
/// Returns an error if either field is missing or not a number.
pub fn parse_meminfo(content: &str) -> Result<MemInfo> {
    let mut total = None;
    let mut available = None;

    for line in content.lines() {
        // Format: "MemTotal:       16384000 kB"
        let mut parts = line.split_whitespace();
        let slot = match parts.next() {
            Some("MemTotal:") => &mut total,
            Some("MemAvailable:") => &mut available,
            _ => continue,
        };
        *slot = parts
            .next()
            .and_then(|v| v.parse::<u64>().ok())
            .map(|kb| kb.saturating_mul(1024));
    }

    match (total, available) {
        (Some(total), Some(available)) => Ok(MemInfo { total, available }),
        _ => Err(ObserveError::monitor(
            "failed to parse MemTotal/MemAvailable from /proc/meminfo",
        )),
    }
}

/// Parses `utime + stime` (clock ticks) out of `/proc/<pid>/stat` content.
///
/// Format: pid (comm) state ppid ... utime stime ...
///
/// # Errors
/// Returns an error if the content is malformed.
pub fn parse_stat_ticks(content: &str) -> Result<u64> {
    // Process names may contain spaces and parentheses; split on the last ')'
    let comm_end = content
        .rfind(')')
        .ok_or_else(|| ObserveError::monitor("malformed /proc/stat: no closing paren"))?;

    let fields: Vec<&str> = content
        .get(comm_end + 1..)
        .unwrap_or_default()
        .split_whitespace()
        .collect();

    // 0: state, 11: utime, 12: stime
    let (Some(utime), Some(stime)) = (fields.get(11), fields.get(12)) else {
        return Err(ObserveError::monitor(format!(
            "malformed /proc/stat: expected 13+ fields, got {}",
            fields.len()
        )));
    };

    let utime: u64 = utime
        .parse()
        .map_err(|_| ObserveError::monitor("failed to parse utime"))?;
    let stime: u64 = stime
        .parse()
        .map_err(|_| ObserveError::monitor("failed to parse stime"))?;

    Ok(utime.saturating_add(stime))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const MEMINFO: &str = "MemTotal:       16384000 kB\n\
                           MemFree:         1024000 kB\n\
                           MemAvailable:    4096000 kB\n\
                           Buffers:          512000 kB\n";

    #[test]
    fn test_parse_meminfo() {
        let info = parse_meminfo(MEMINFO).unwrap();
        assert_eq!(info.total, 16_384_000 * 1024);
        assert_eq!(info.available, 4_096_000 * 1024);
        assert_eq!(info.used(), 12_288_000 * 1024);
    }

    #[test]
    fn test_parse_meminfo_missing_available() {
        let err = parse_meminfo("MemTotal: 100 kB\n").unwrap_err();
        assert!(err.to_string().contains("MemAvailable"));
    }

    #[test]
    fn test_parse_stat_ticks() {
        let content = "1234 (test) S 1 1234 1234 0 -1 4194304 100 0 0 0 50 25 0 0 20 0 5 0 1000 1000000 100";
        assert_eq!(parse_stat_ticks(content).unwrap(), 75);
    }

    #[test]
    fn test_parse_stat_ticks_name_with_spaces() {
        let content = "1234 (load (worker)) R 1 1234 1234 0 -1 4194304 100 0 0 0 100 50 0 0 20 0 10 0 1000";
        assert_eq!(parse_stat_ticks(content).unwrap(), 150);
    }

    #[test]
    fn test_parse_stat_malformed() {
        assert!(
            parse_stat_ticks("1234 test S 1")
                .unwrap_err()
                .to_string()
                .contains("no closing paren")
        );
        assert!(
            parse_stat_ticks("1234 (test) S 1 2 3")
                .unwrap_err()
                .to_string()
                .contains("expected 13+ fields")
        );
    }

    #[test]
    fn test_first_sample_has_zero_cpu() {
        let mut monitor = HostMonitor::new();
        let snapshot = monitor.sample();
        assert_eq!(snapshot.cpu_percent, 0.0);
        assert!(snapshot.mem_used_bytes <= snapshot.mem_total_bytes);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_linux_sample_reports_memory() {
        let mut monitor = HostMonitor::new();
        let first = monitor.sample();
        assert!(first.mem_total_bytes > 0);
        assert_eq!(host_memory_total() > 0, first.mem_total_bytes > 0);

        std::thread::sleep(std::time::Duration::from_millis(5));
        let second = monitor.sample();
        assert!(second.cpu_percent >= 0.0);
    }

    proptest! {
        #[test]
        fn prop_parsers_never_panic(content in ".{0,200}") {
            let _ = parse_stat_ticks(&content);
            let _ = parse_meminfo(&content);
        }
    }
}
