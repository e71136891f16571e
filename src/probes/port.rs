//! Port scanning via the external nmap capability.
//!
//! nmap is invoked with `-oG -` (greppable output) and its per-port service
//! metadata is parsed back into a [`PortScanResult`]. This is the most
//! latency-dominant probe, so progress is indeterminate while the tool runs.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};

use crate::error::{ReconError, ReconResult};
use crate::record::{PortScanResult, PortService};
use crate::report::Reporter;

/// Sentinel for "let nmap pick its default top 1000 ports".
pub const TOP_PORTS_SENTINEL: &str = "top1000";

#[derive(Debug, Clone)]
pub struct PortScanOptions {
    /// Explicit port list/range, or [`TOP_PORTS_SENTINEL`].
    pub ports: String,
    /// Scan the full 1-65535 range; overrides `ports`.
    pub full: bool,
    /// Include UDP scanning (nmap needs elevated privileges for this).
    pub udp: bool,
}

impl Default for PortScanOptions {
    fn default() -> Self {
        Self {
            ports: TOP_PORTS_SENTINEL.to_string(),
            full: false,
            udp: false,
        }
    }
}

static STATUS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"Status:\s*(\w+)").unwrap());
static PORTS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"Ports:\s*([^\t]+)").unwrap());

pub async fn run_scan(
    target: &str,
    opts: &PortScanOptions,
    reporter: &dyn Reporter,
) -> ReconResult<PortScanResult> {
    reporter.announce(&format!("Starting Nmap scan on {}...", target));

    let args = build_nmap_args(target, opts);
    let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();

    reporter.begin("Nmap scanning...", None);
    let output = crate::utils::shell::execute_tool("nmap", &arg_refs).await;
    reporter.finish("");
    let output = output?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ReconError::ExternalTool {
            tool: "nmap".to_string(),
            message: format!("scan failed: {}", stderr.trim()),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    debug!("nmap greppable output:\n{}", stdout);

    let record = parse_greppable(target, &stdout)
        .ok_or_else(|| ReconError::UnreachableTarget(format!("no hosts found or {} is down", target)))?;

    info!(
        "Nmap scan of {} complete; {} protocol(s) with open ports",
        target,
        record.protocols.len()
    );
    render(&record, reporter);
    Ok(record)
}

fn build_nmap_args(target: &str, opts: &PortScanOptions) -> Vec<String> {
    let mut args = vec!["-sV".to_string()];
    if opts.udp {
        args.push("-sU".to_string());
    }
    if opts.full {
        args.push("-p".to_string());
        args.push("1-65535".to_string());
    } else if opts.ports != TOP_PORTS_SENTINEL {
        args.push("-p".to_string());
        args.push(opts.ports.clone());
    }
    args.push("-oG".to_string());
    args.push("-".to_string());
    args.push(target.to_string());
    args
}

/// Parse nmap's `-oG` output for a single-target scan.
///
/// Returns `None` when no host was reported up, which the caller treats as
/// an unreachable target rather than a tool failure.
fn parse_greppable(target: &str, output: &str) -> Option<PortScanResult> {
    let mut record = PortScanResult::new(target);
    let mut seen_up = false;

    for line in output.lines() {
        if !line.starts_with("Host:") {
            continue;
        }
        if let Some(caps) = STATUS_RE.captures(line) {
            let status = caps[1].to_ascii_lowercase();
            if status == "up" {
                seen_up = true;
            }
            record.status = Some(status);
        }
        if let Some(caps) = PORTS_RE.captures(line) {
            seen_up = true;
            if record.status.is_none() {
                record.status = Some("up".to_string());
            }
            for entry in caps[1].split(", ") {
                if let Some((proto, port, service)) = parse_port_entry(entry) {
                    record
                        .protocols
                        .entry(proto)
                        .or_default()
                        .insert(port, service);
                }
            }
        }
    }

    seen_up.then_some(record)
}

/// One greppable port entry: `port/state/proto/owner/service/rpc/version/`.
/// nmap escapes literal slashes inside fields as `|`. Only the single
/// trailing delimiter is stripped; an unidentified port has every field
/// after the protocol empty and those empties must survive the split.
fn parse_port_entry(entry: &str) -> Option<(String, u16, PortService)> {
    let entry = entry.trim();
    let entry = entry.strip_suffix('/').unwrap_or(entry);
    let fields: Vec<&str> = entry.split('/').collect();
    if fields.len() < 5 {
        return None;
    }

    let port: u16 = fields[0].trim().parse().ok()?;
    let state = fields[1].trim().to_string();
    let proto = fields[2].trim().to_string();
    let service = fields[4].trim().replace('|', "/");
    let version_info = fields.get(6).map(|v| v.replace('|', "/")).unwrap_or_default();
    let (product, version, extrainfo) = split_version_info(&version_info);

    Some((
        proto,
        port,
        PortService {
            state,
            service,
            product,
            version,
            extrainfo,
        },
    ))
}

/// Split nmap's combined version-info field into product, version, and
/// extrainfo. The trailing parenthetical is extrainfo; within the rest, the
/// version starts at the first token that leads with a digit.
fn split_version_info(info: &str) -> (String, String, String) {
    let info = info.trim();
    if info.is_empty() {
        return (String::new(), String::new(), String::new());
    }

    let (head, extra) = match info.find('(') {
        Some(i) if info.ends_with(')') => (
            info[..i].trim(),
            info[i..].trim_matches(|c| c == '(' || c == ')').trim(),
        ),
        _ => (info, ""),
    };

    let tokens: Vec<&str> = head.split_whitespace().collect();
    let split_at = tokens
        .iter()
        .position(|t| t.chars().next().is_some_and(|c| c.is_ascii_digit()))
        .unwrap_or(tokens.len());

    (
        tokens[..split_at].join(" "),
        tokens[split_at..].join(" "),
        extra.to_string(),
    )
}

fn render(record: &PortScanResult, reporter: &dyn Reporter) {
    reporter.announce(&format!("Scan results for {}:", record.host));
    if let Some(status) = &record.status {
        reporter.announce(&format!("  Status: {}", status));
    }
    for (proto, ports) in &record.protocols {
        reporter.announce(&format!("  Protocol: {}", proto));
        for (port, info) in ports {
            reporter.found(&format!(
                "Port: {}/{}\tState: {}\tService: {} {} {} {}",
                port, proto, info.state, info.service, info.product, info.version, info.extrainfo
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# Nmap 7.94 scan initiated
Host: 45.33.32.156 (scanme.nmap.org)\tStatus: Up
Host: 45.33.32.156 (scanme.nmap.org)\tPorts: 22/open/tcp//ssh//OpenSSH 6.6.1p1 Ubuntu 2ubuntu2.13 (Ubuntu Linux; protocol 2.0)/, 80/open/tcp//http//Apache httpd 2.4.7 ((Ubuntu))/, 9929/open/tcp//nping-echo//Nping echo/\tIgnored State: closed (997)
# Nmap done";

    #[test]
    fn parses_ports_with_service_metadata() {
        let record = parse_greppable("scanme.nmap.org", SAMPLE).unwrap();
        assert_eq!(record.status.as_deref(), Some("up"));

        let tcp = &record.protocols["tcp"];
        assert_eq!(tcp.len(), 3);

        let ssh = &tcp[&22];
        assert_eq!(ssh.state, "open");
        assert_eq!(ssh.service, "ssh");
        assert_eq!(ssh.product, "OpenSSH");
        assert_eq!(ssh.version, "6.6.1p1 Ubuntu 2ubuntu2.13");
        assert_eq!(ssh.extrainfo, "Ubuntu Linux; protocol 2.0");

        let http = &tcp[&80];
        assert_eq!(http.product, "Apache httpd");
        assert_eq!(http.version, "2.4.7");
        assert_eq!(http.extrainfo, "Ubuntu");
    }

    #[test]
    fn ports_are_ordered_ascending_within_protocol() {
        let record = parse_greppable("scanme.nmap.org", SAMPLE).unwrap();
        let ports: Vec<u16> = record.protocols["tcp"].keys().copied().collect();
        assert_eq!(ports, [22, 80, 9929]);
    }

    #[test]
    fn keeps_ports_with_empty_service_fields() {
        // nmap emits all-empty service/version fields for open ports it
        // cannot identify; those entries must not be dropped.
        let output = "Host: 10.0.0.5 ()\tPorts: 80/open/tcp//http//Apache httpd 2.4.7/, 4444/open/tcp/////\tIgnored State: closed (998)";
        let record = parse_greppable("10.0.0.5", output).unwrap();

        let tcp = &record.protocols["tcp"];
        let ports: Vec<u16> = tcp.keys().copied().collect();
        assert_eq!(ports, [80, 4444]);

        let unknown = &tcp[&4444];
        assert_eq!(unknown.state, "open");
        assert_eq!(unknown.service, "");
        assert_eq!(unknown.product, "");
        assert_eq!(unknown.version, "");
        assert_eq!(unknown.extrainfo, "");
    }

    #[test]
    fn down_host_yields_none() {
        let output = "Host: 10.0.0.9 ()\tStatus: Down\n# Nmap done";
        assert!(parse_greppable("10.0.0.9", output).is_none());
    }

    #[test]
    fn up_host_with_no_ports_keeps_empty_protocols() {
        let output = "Host: 10.0.0.9 ()\tStatus: Up\n# Nmap done";
        let record = parse_greppable("10.0.0.9", output).unwrap();
        assert!(record.protocols.is_empty());
    }

    #[test]
    fn version_info_without_parenthetical() {
        let (product, version, extra) = split_version_info("Nping echo");
        assert_eq!(product, "Nping echo");
        assert_eq!(version, "");
        assert_eq!(extra, "");
    }

    #[test]
    fn empty_version_info() {
        assert_eq!(
            split_version_info(""),
            (String::new(), String::new(), String::new())
        );
    }

    #[test]
    fn default_options_use_nmaps_top_ports() {
        let args = build_nmap_args("10.0.0.1", &PortScanOptions::default());
        assert_eq!(args, ["-sV", "-oG", "-", "10.0.0.1"]);
    }

    #[test]
    fn full_flag_overrides_explicit_ports() {
        let opts = PortScanOptions {
            ports: "80,443".to_string(),
            full: true,
            udp: false,
        };
        let args = build_nmap_args("10.0.0.1", &opts);
        assert_eq!(args, ["-sV", "-p", "1-65535", "-oG", "-", "10.0.0.1"]);
    }

    #[test]
    fn udp_flag_adds_udp_scan() {
        let opts = PortScanOptions {
            ports: "53".to_string(),
            full: false,
            udp: true,
        };
        let args = build_nmap_args("10.0.0.1", &opts);
        assert_eq!(args, ["-sV", "-sU", "-p", "53", "-oG", "-", "10.0.0.1"]);
    }
}
