//! Kernel-log XID extractor.
//!
//! Surfaces NVRM Xid lines from the kernel ring buffer. Primary path is a
//! non-blocking read of `/dev/kmsg`; if that device is absent or
//! unreadable, falls back to invoking `dmesg`. The production container
//! is distroless, so the `dmesg` binary may simply not exist — the
//! fallback exists for the environments where it does.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use nix::errno::Errno;
use nix::fcntl::{open, OFlag};
use nix::sys::stat::Mode;
use nix::unistd::{close, read};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Read bound for `/dev/kmsg`.
pub const KMSG_READ_TIMEOUT: Duration = Duration::from_secs(5);

/// One parsed kernel ring-buffer record, retained only once it has passed
/// the `;` and `NVRM` filters.
#[derive(Debug, Clone, PartialEq)]
pub struct KmsgRecord {
    /// Kernel log priority/facility field, the number before the first comma.
    pub priority: u32,
    /// Ring-buffer sequence number.
    pub sequence: u64,
    /// Microseconds since boot.
    pub timestamp_us: u64,
    /// Message text after the `;`.
    pub message: String,
}

/// Errors this extractor can raise.
#[derive(Debug, thiserror::Error)]
pub enum KmsgError {
    /// `/dev/kmsg` exists but this process lacks the capability to read it.
    #[error("permission denied reading /dev/kmsg: requires CAP_SYSLOG (or run as root)")]
    PermissionDenied,
    /// Neither `/dev/kmsg` nor `dmesg` produced usable output.
    #[error("kernel log unavailable: {0}")]
    Unavailable(String),
    /// The `dmesg` fallback process failed to run.
    #[error("dmesg fallback failed: {0}")]
    DmesgFailed(String),
}

/// Which path actually produced the lines, purely for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KmsgSource {
    /// Read directly from `/dev/kmsg`.
    DevKmsg,
    /// Fell back to invoking the `dmesg` binary.
    Dmesg,
}

/// Read NVRM-tagged records, preferring `/dev/kmsg` and falling back to `dmesg`.
pub async fn read_nvrm_records() -> Result<(Vec<KmsgRecord>, KmsgSource), KmsgError> {
    match read_dev_kmsg().await {
        Ok(lines) => {
            debug!(count = lines.len(), "read NVRM lines from /dev/kmsg");
            Ok((filter_nvrm(&lines), KmsgSource::DevKmsg))
        }
        Err(KmsgError::PermissionDenied) => Err(KmsgError::PermissionDenied),
        Err(e) => {
            info!(reason = %e, "falling back to dmesg for kernel log access");
            let lines = run_dmesg_fallback().await?;
            Ok((filter_nvrm(&lines), KmsgSource::Dmesg))
        }
    }
}

fn filter_nvrm(lines: &[String]) -> Vec<KmsgRecord> {
    lines.iter().filter_map(|l| parse_kmsg_line(l)).filter(|r| r.message.contains("NVRM")).collect()
}

/// Parse one `/dev/kmsg`-formatted line: `priority,sequence,timestamp_us,flags;message`.
///
/// Lines with no `;` are dropped. A non-numeric priority
/// rejects the whole line.
#[must_use]
pub fn parse_kmsg_line(line: &str) -> Option<KmsgRecord> {
    let (header, message) = line.split_once(';')?;
    let mut fields = header.split(',');
    let priority: u32 = fields.next()?.trim().parse().ok()?;
    let sequence: u64 = fields.next()?.trim().parse().unwrap_or(0);
    let timestamp_us: u64 = fields.next()?.trim().parse().unwrap_or(0);
    Some(KmsgRecord { priority, sequence, timestamp_us, message: message.to_string() })
}

async fn read_dev_kmsg() -> Result<Vec<String>, KmsgError> {
    tokio::task::spawn_blocking(read_dev_kmsg_blocking)
        .await
        .map_err(|e| KmsgError::Unavailable(format!("kmsg reader thread panicked: {e}")))?
}

fn read_dev_kmsg_blocking() -> Result<Vec<String>, KmsgError> {
    let fd = match open("/dev/kmsg", OFlag::O_RDONLY | OFlag::O_NONBLOCK, Mode::empty()) {
        Ok(fd) => fd,
        Err(Errno::EACCES) => return Err(KmsgError::PermissionDenied),
        Err(e) => return Err(KmsgError::Unavailable(format!("open /dev/kmsg: {e}"))),
    };

    let deadline = Instant::now() + KMSG_READ_TIMEOUT;
    let mut lines = Vec::new();
    let mut buf = [0u8; 8192];

    loop {
        if Instant::now() >= deadline {
            break;
        }
        match read(fd, &mut buf) {
            Ok(0) => break,
            Ok(n) => {
                if let Ok(text) = std::str::from_utf8(&buf[..n]) {
                    lines.push(text.trim_end_matches('\0').to_string());
                }
            }
            // EAGAIN means "no record currently available", not an error
            //: the ring buffer is a live stream, not a file
            // with a clean EOF.
            Err(Errno::EAGAIN) => break,
            Err(e) => {
                let _ = close(fd);
                return Err(KmsgError::Unavailable(format!("read /dev/kmsg: {e}")));
            }
        }
    }

    let _ = close(fd);
    Ok(lines)
}

async fn run_dmesg_fallback() -> Result<Vec<String>, KmsgError> {
    let output = tokio::process::Command::new("dmesg")
        .args(["--level=err,warn", "--nopager"])
        .output()
        .await
        .map_err(|e| KmsgError::DmesgFailed(e.to_string()))?;

    if !output.status.success() {
        warn!(status = ?output.status, "dmesg fallback exited non-zero");
    }

    let text = String::from_utf8_lossy(&output.stdout);
    Ok(text.lines().map(str::to_string).collect())
}

// ============================================================================
// Xid parsing
// ============================================================================

static XID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Xid \(PCI:([0-9a-fA-F:.]+)\): (\d+)").expect("valid regex"));
static PID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"pid='(\d+)',\s*name=(\S+)").expect("valid regex"));

/// Severity + suggested SRE action for one Xid code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct XidCodeInfo {
    /// Human severity label.
    pub severity: &'static str,
    /// Suggested operator action.
    pub sre_action: &'static str,
}

static XID_CODE_TABLE: Lazy<HashMap<u32, XidCodeInfo>> = Lazy::new(|| {
    HashMap::from([
        (13, XidCodeInfo { severity: "warning", sre_action: "monitor; often a driver/app graphics fault" }),
        (31, XidCodeInfo { severity: "warning", sre_action: "check for a GPU memory page fault in the app" }),
        (32, XidCodeInfo { severity: "warning", sre_action: "inspect PCIe link for transient errors" }),
        (43, XidCodeInfo { severity: "warning", sre_action: "application-level GPU reset; usually benign" }),
        (48, XidCodeInfo { severity: "fatal", sre_action: "double-bit ECC error; drain workloads and reset the GPU" }),
        (63, XidCodeInfo { severity: "warning", sre_action: "row-remap pending; schedule a reset at next maintenance" }),
        (64, XidCodeInfo { severity: "fatal", sre_action: "row-remap failure; cordon the node and RMA the GPU" }),
        (79, XidCodeInfo { severity: "fatal", sre_action: "GPU has fallen off the bus; cordon the node immediately" }),
        (94, XidCodeInfo { severity: "fatal", sre_action: "contained ECC error; drain and reset the GPU" }),
        (95, XidCodeInfo { severity: "fatal", sre_action: "uncontained ECC error; cordon the node and RMA the GPU" }),
    ])
});

fn lookup_code(code: u32) -> XidCodeInfo {
    XID_CODE_TABLE.get(&code).copied().unwrap_or(XidCodeInfo {
        severity: "unknown",
        sre_action: "no entry in the code table; consult NVIDIA Xid documentation",
    })
}

/// One parsed and enriched Xid event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct XidEvent {
    /// Xid numeric code.
    pub code: u32,
    /// PCI bus id the kernel reported the event against.
    pub pci_bus_id: String,
    /// Severity from the code table.
    pub severity: &'static str,
    /// Suggested SRE action from the code table.
    pub sre_action: &'static str,
    /// Offending process id, if the kernel line carried one.
    pub pid: Option<u32>,
    /// Offending process name, if the kernel line carried one.
    pub process_name: Option<String>,
    /// Local GPU index, once matched against the live device list.
    pub gpu_index: Option<u32>,
}

/// Parse one NVRM-filtered kmsg message body into an `XidEvent`, if it
/// contains an `Xid (PCI:...): <code>` fragment.
#[must_use]
pub fn parse_xid_event(message: &str) -> Option<XidEvent> {
    let caps = XID_RE.captures(message)?;
    let pci_bus_id = caps[1].to_string();
    let code: u32 = caps[2].parse().ok()?;
    let info = lookup_code(code);

    let (pid, process_name) = match PID_RE.captures(message) {
        Some(c) => (c[1].parse().ok(), Some(c[2].to_string())),
        None => (None, None),
    };

    Some(XidEvent {
        code,
        pci_bus_id,
        severity: info.severity,
        sre_action: info.sre_action,
        pid,
        process_name,
        gpu_index: None,
    })
}

/// Match each event's PCI bus id against the live device list, filling in
/// `gpu_index`.
pub fn match_device_indices(events: &mut [XidEvent], devices: &[crate::nvml::GpuDevice]) {
    for event in events.iter_mut() {
        event.gpu_index = devices.iter().find(|d| d.pci_bus_id.eq_ignore_ascii_case(&event.pci_bus_id)).map(|d| d.index);
    }
}

/// Parse every NVRM record's message into an Xid event, dropping records
/// with no recognisable Xid fragment.
#[must_use]
pub fn extract_xid_events(records: &[KmsgRecord]) -> Vec<XidEvent> {
    records.iter().filter_map(|r| parse_xid_event(&r.message)).collect()
}
