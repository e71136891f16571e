//! DNS enumeration: record sweep, reverse lookup, and an optional
//! wordlist-driven subdomain sweep.

use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use hickory_resolver::config::{NameServerConfigGroup, ResolverConfig, ResolverOpts};
use hickory_resolver::error::{ResolveError, ResolveErrorKind};
use hickory_resolver::proto::op::ResponseCode;
use hickory_resolver::proto::rr::RecordType;
use hickory_resolver::TokioAsyncResolver;
use tracing::{debug, info};

use crate::error::{ReconError, ReconResult};
use crate::record::{DnsScanResult, SubdomainFinding};
use crate::report::Reporter;
use crate::wordlist;

const PROBE: &str = "dns";

/// Queried in this fixed order; progress totals match.
const RECORD_TYPES: [RecordType; 6] = [
    RecordType::A,
    RecordType::AAAA,
    RecordType::MX,
    RecordType::NS,
    RecordType::TXT,
    RecordType::SOA,
];

#[derive(Debug, Clone)]
pub struct DnsScanOptions {
    pub sub_brute: bool,
    pub sub_wordlist: PathBuf,
    /// Overrides the resolver's nameserver list for every sub-operation.
    pub dns_server: Option<String>,
}

/// How a failed lookup should steer the sweep.
enum LookupFailure {
    /// The name answered, but holds no records of this type.
    NoRecords,
    /// The domain does not exist; further record types cannot answer either.
    NxDomain,
    Other(String),
}

fn classify(e: &ResolveError) -> LookupFailure {
    match e.kind() {
        ResolveErrorKind::NoRecordsFound { response_code, .. } => {
            if *response_code == ResponseCode::NXDomain {
                LookupFailure::NxDomain
            } else {
                LookupFailure::NoRecords
            }
        }
        _ => LookupFailure::Other(e.to_string()),
    }
}

pub async fn run_scan(
    target: &str,
    opts: &DnsScanOptions,
    reporter: &dyn Reporter,
) -> ReconResult<DnsScanResult> {
    reporter.announce(&format!("Starting DNS enumeration on {}...", target));

    let resolver = build_resolver(opts, reporter)?;
    let mut results = DnsScanResult::new(target);

    record_sweep(target, &resolver, &mut results, reporter).await;
    reverse_lookup(target, &resolver, &mut results, reporter).await;

    if opts.sub_brute {
        results.subdomains =
            Some(subdomain_sweep(target, &opts.sub_wordlist, &resolver, reporter).await?);
    }

    info!("DNS enumeration of {} complete", target);
    Ok(results)
}

fn build_resolver(
    opts: &DnsScanOptions,
    reporter: &dyn Reporter,
) -> ReconResult<TokioAsyncResolver> {
    match &opts.dns_server {
        Some(server) => {
            let ip: IpAddr = server.parse().map_err(|_| {
                ReconError::Config(format!("invalid DNS server address: {}", server))
            })?;
            reporter.detail(&format!("Using custom DNS server: {}", server));
            let config = ResolverConfig::from_parts(
                None,
                vec![],
                NameServerConfigGroup::from_ips_clear(&[ip], 53, true),
            );
            Ok(TokioAsyncResolver::tokio(config, ResolverOpts::default()))
        }
        None => Ok(TokioAsyncResolver::tokio(
            ResolverConfig::default(),
            ResolverOpts::default(),
        )),
    }
}

/// Whether the record sweep keeps issuing queries after a type's outcome.
enum SweepAction {
    Continue,
    Abort,
}

/// Query each record type in order. No-answer is recorded as an explicit
/// empty list; NXDOMAIN aborts the remaining types of this sweep only; any
/// other error is reported per-type and the sweep continues.
async fn record_sweep(
    target: &str,
    resolver: &TokioAsyncResolver,
    results: &mut DnsScanResult,
    reporter: &dyn Reporter,
) {
    reporter.announce("Basic DNS records:");
    reporter.begin("Querying DNS records...", Some(RECORD_TYPES.len() as u64));

    for rtype in RECORD_TYPES {
        let outcome = match resolver.lookup(target, rtype).await {
            Ok(lookup) => Ok(lookup.iter().map(|rdata| rdata.to_string()).collect()),
            Err(e) => Err(classify(&e)),
        };
        match record_outcome(target, rtype, outcome, results, reporter) {
            SweepAction::Continue => reporter.advance(1),
            SweepAction::Abort => break,
        }
    }

    reporter.finish("DNS record query complete");
}

/// Fold one record type's lookup outcome into the result record and decide
/// whether the sweep goes on. A nonexistent domain cannot answer further
/// lookups, so NXDOMAIN aborts; everything else continues.
fn record_outcome(
    target: &str,
    rtype: RecordType,
    outcome: Result<Vec<String>, LookupFailure>,
    results: &mut DnsScanResult,
    reporter: &dyn Reporter,
) -> SweepAction {
    match outcome {
        Ok(values) => {
            for value in &values {
                reporter.found(&format!("{}: {}", rtype, value));
            }
            results.insert_records(&rtype.to_string(), values);
            SweepAction::Continue
        }
        Err(LookupFailure::NoRecords) => {
            reporter.note(&format!("{}: No records found.", rtype));
            results.insert_records(&rtype.to_string(), Vec::new());
            SweepAction::Continue
        }
        Err(LookupFailure::NxDomain) => {
            reporter.fail(PROBE, &format!("Domain does not exist: {}", target));
            SweepAction::Abort
        }
        Err(LookupFailure::Other(msg)) => {
            reporter.fail(PROBE, &format!("Error querying {}: {}", rtype, msg));
            SweepAction::Continue
        }
    }
}

/// Reverse lookup, attempted only when the target is literally a dotted-quad
/// IPv4 address. The check is syntactic; a hostname or IPv6 literal skips
/// this step silently.
async fn reverse_lookup(
    target: &str,
    resolver: &TokioAsyncResolver,
    results: &mut DnsScanResult,
    reporter: &dyn Reporter,
) {
    let Some(addr) = parse_dotted_quad(target) else {
        reporter.note("Skipping reverse DNS lookup as target is not a valid IPv4 address.");
        return;
    };

    reporter.announce("Performing reverse DNS lookup:");
    reporter.begin("Reverse lookup...", None);
    let outcome = resolver.reverse_lookup(IpAddr::V4(addr)).await;
    reporter.finish("");

    match outcome {
        Ok(lookup) => {
            let names: Vec<String> = lookup.iter().map(|name| name.to_string()).collect();
            for name in &names {
                reporter.found(name);
            }
            results.reverse_dns = Some(names);
        }
        Err(e) => match classify(&e) {
            LookupFailure::NoRecords | LookupFailure::NxDomain => {
                reporter.announce(&format!("No reverse DNS record found for {}.", target));
            }
            LookupFailure::Other(msg) => {
                reporter.fail(PROBE, &format!("Error during reverse DNS lookup: {}", msg));
            }
        },
    }
}

/// Resolve `{entry}.{target}` for every wordlist entry, in file order.
/// Per-entry misses and errors are verbose-only; progress advances exactly
/// once per entry.
async fn subdomain_sweep(
    target: &str,
    wordlist_path: &std::path::Path,
    resolver: &TokioAsyncResolver,
    reporter: &dyn Reporter,
) -> ReconResult<Vec<SubdomainFinding>> {
    reporter.announce(&format!(
        "Starting subdomain brute-forcing with {}...",
        wordlist_path.display()
    ));

    let entries = wordlist::load(wordlist_path)?;
    let mut findings = Vec::new();

    reporter.begin("Brute-forcing subdomains...", Some(entries.len() as u64));
    for entry in &entries {
        let full_domain = format!("{}.{}", entry, target);
        match resolver.lookup(full_domain.as_str(), RecordType::A).await {
            Ok(lookup) => {
                for rdata in lookup.iter() {
                    let ip = rdata.to_string();
                    reporter.found(&format!("Found {} -> {}", full_domain, ip));
                    findings.push(SubdomainFinding {
                        subdomain: full_domain.clone(),
                        ip,
                    });
                }
            }
            Err(e) => match classify(&e) {
                LookupFailure::NoRecords | LookupFailure::NxDomain => {
                    reporter.note(&format!("{}: No record.", full_domain));
                }
                LookupFailure::Other(msg) => {
                    debug!("Error resolving {}: {}", full_domain, msg);
                    reporter.note(&format!("Error resolving {}: {}", full_domain, msg));
                }
            },
        }
        reporter.advance(1);
    }
    reporter.finish("Subdomain brute-forcing complete");

    Ok(findings)
}

/// Syntactic dotted-quad check: four dot-separated runs of digits, each in
/// 0-255. Deliberately looser than `Ipv4Addr::from_str` (leading zeros pass),
/// and deliberately not validated against reverse-zone delegation.
fn parse_dotted_quad(s: &str) -> Option<Ipv4Addr> {
    let parts: Vec<&str> = s.split('.').collect();
    if parts.len() != 4 {
        return None;
    }

    let mut octets = [0u8; 4];
    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let value: u32 = part.parse().ok()?;
        if value > 255 {
            return None;
        }
        octets[i] = value as u8;
    }

    Some(Ipv4Addr::new(octets[0], octets[1], octets[2], octets[3]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_dotted_quads() {
        assert_eq!(
            parse_dotted_quad("93.184.216.34"),
            Some(Ipv4Addr::new(93, 184, 216, 34))
        );
        assert_eq!(parse_dotted_quad("0.0.0.0"), Some(Ipv4Addr::new(0, 0, 0, 0)));
        assert_eq!(
            parse_dotted_quad("255.255.255.255"),
            Some(Ipv4Addr::new(255, 255, 255, 255))
        );
        // The check is digit-and-range only, so leading zeros pass.
        assert_eq!(
            parse_dotted_quad("010.2.3.4"),
            Some(Ipv4Addr::new(10, 2, 3, 4))
        );
    }

    #[test]
    fn rejects_hostnames_and_malformed_addresses() {
        assert!(parse_dotted_quad("example.com").is_none());
        assert!(parse_dotted_quad("256.1.1.1").is_none());
        assert!(parse_dotted_quad("1.2.3").is_none());
        assert!(parse_dotted_quad("1.2.3.4.5").is_none());
        assert!(parse_dotted_quad("1.2.3.").is_none());
        assert!(parse_dotted_quad("1.2.3.x").is_none());
        assert!(parse_dotted_quad("-1.2.3.4").is_none());
        assert!(parse_dotted_quad("2606:2800:220:1::").is_none());
        assert!(parse_dotted_quad("").is_none());
    }

    #[test]
    fn nxdomain_aborts_remaining_types_but_keeps_completed_ones() {
        let mut results = DnsScanResult::new("gone.example");
        let reporter = crate::report::CountingReporter::new();

        let script: Vec<(RecordType, Result<Vec<String>, LookupFailure>)> = vec![
            (RecordType::A, Ok(vec!["93.184.216.34".to_string()])),
            (RecordType::AAAA, Err(LookupFailure::NoRecords)),
            (RecordType::MX, Err(LookupFailure::NxDomain)),
            // Never reached: the sweep stops at the nonexistent domain.
            (RecordType::NS, Ok(vec!["ns1.gone.example.".to_string()])),
        ];

        let mut aborted = false;
        for (rtype, outcome) in script {
            match record_outcome("gone.example", rtype, outcome, &mut results, &reporter) {
                SweepAction::Continue => reporter.advance(1),
                SweepAction::Abort => {
                    aborted = true;
                    break;
                }
            }
        }

        assert!(aborted);
        assert_eq!(*reporter.advanced.lock(), 2);
        assert_eq!(reporter.failures.lock().len(), 1);

        // Already-completed types survive, including the explicit absence.
        let keys: Vec<&String> = results.records.keys().collect();
        assert_eq!(keys, ["A", "AAAA"]);
        assert_eq!(results.records["A"][0], "93.184.216.34");
        assert_eq!(results.records["AAAA"].as_array().unwrap().len(), 0);

        // The partial record is still a valid document.
        let value = serde_json::to_value(&results).unwrap();
        assert!(value["records"].is_object());
    }

    #[test]
    fn other_lookup_errors_do_not_abort_the_sweep() {
        let mut results = DnsScanResult::new("example.com");
        let reporter = crate::report::CountingReporter::new();

        let action = record_outcome(
            "example.com",
            RecordType::TXT,
            Err(LookupFailure::Other("request timed out".to_string())),
            &mut results,
            &reporter,
        );

        assert!(matches!(action, SweepAction::Continue));
        assert_eq!(reporter.failures.lock().len(), 1);
        // A failed type is not recorded as an absence.
        assert!(!results.records.contains_key("TXT"));
    }

    #[test]
    fn custom_nameserver_is_reported_unconditionally() {
        let reporter = crate::report::CountingReporter::new();
        let opts = DnsScanOptions {
            sub_brute: false,
            sub_wordlist: PathBuf::from("wordlists/subdomains.txt"),
            dns_server: Some("9.9.9.9".to_string()),
        };
        build_resolver(&opts, &reporter).unwrap();

        let details = reporter.details.lock();
        assert!(details.iter().any(|m| m.contains("9.9.9.9")));
    }

    #[test]
    fn invalid_custom_nameserver_is_a_config_error() {
        let opts = DnsScanOptions {
            sub_brute: false,
            sub_wordlist: PathBuf::from("wordlists/subdomains.txt"),
            dns_server: Some("not-an-ip".to_string()),
        };
        let err = build_resolver(&opts, &crate::report::NullReporter).unwrap_err();
        assert!(matches!(err, ReconError::Config(_)));
    }

    #[tokio::test]
    async fn missing_subdomain_wordlist_fails_the_probe() {
        let opts = DnsScanOptions {
            sub_brute: true,
            sub_wordlist: PathBuf::from("/nonexistent/subs.txt"),
            dns_server: None,
        };
        let resolver = build_resolver(&opts, &crate::report::NullReporter).unwrap();
        let err = subdomain_sweep(
            "example.com",
            &opts.sub_wordlist,
            &resolver,
            &crate::report::NullReporter,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ReconError::WordlistNotFound { .. }));
    }
}
