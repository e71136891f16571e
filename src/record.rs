//! Result records produced by the probes.
//!
//! Each probe owns exactly one record for the duration of its run and fills
//! it in as sub-scans complete, so a record is always serializable even when
//! a scan stopped partway through. Optional fields are skipped on encode so
//! the persisted document contains exactly the keys that were populated.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Map;

/// Per-port service metadata as reported by the scan capability.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PortService {
    pub state: String,
    pub service: String,
    pub product: String,
    pub version: String,
    pub extrainfo: String,
}

/// Outcome of a port scan. Ports ascend within each protocol because the
/// inner map is keyed by port number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortScanResult {
    pub host: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub protocols: BTreeMap<String, BTreeMap<u16, PortService>>,
}

impl PortScanResult {
    pub fn new(host: &str) -> Self {
        Self {
            host: host.to_string(),
            status: None,
            protocols: BTreeMap::new(),
        }
    }
}

/// One hit from the directory brute-force sweep.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DirFinding {
    pub url: String,
    pub status_code: u16,
    pub content_length: u64,
}

/// Outcome of the web probe. `headers` keeps response order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebScanResult {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<Map<String, serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir_brute_results: Option<Vec<DirFinding>>,
}

impl WebScanResult {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            status_code: None,
            headers: None,
            content_length: None,
            title: None,
            comments: None,
            dir_brute_results: None,
        }
    }
}

/// A resolved subdomain from the brute-force sweep.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubdomainFinding {
    pub subdomain: String,
    pub ip: String,
}

/// Outcome of the DNS probe. `records` keeps query order; a record type that
/// answered with nothing is present with an empty list so absence is explicit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DnsScanResult {
    pub target: String,
    pub records: Map<String, serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reverse_dns: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subdomains: Option<Vec<SubdomainFinding>>,
}

impl DnsScanResult {
    pub fn new(target: &str) -> Self {
        Self {
            target: target.to_string(),
            records: Map::new(),
            reverse_dns: None,
            subdomains: None,
        }
    }

    pub fn insert_records(&mut self, rtype: &str, values: Vec<String>) {
        self.records.insert(
            rtype.to_string(),
            serde_json::Value::Array(values.into_iter().map(serde_json::Value::String).collect()),
        );
    }
}

/// Aggregate written by default mode: one document per run, holding only the
/// modules that produced a record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultScanResult {
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web: Option<WebScanResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ports: Option<PortScanResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns: Option<DnsScanResult>,
}

impl DefaultScanResult {
    pub fn new(target: &str) -> Self {
        Self {
            target: target.to_string(),
            web: None,
            ports: None,
            dns: None,
        }
    }
}

/// One record per module invocation, handed to the persistence sink at most
/// once. Untagged so the encoded document keeps the module's flat key layout.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ScanRecord {
    Port(PortScanResult),
    Web(WebScanResult),
    Dns(DnsScanResult),
    Default(DefaultScanResult),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dns_record_serializes_only_populated_keys() {
        let mut record = DnsScanResult::new("example.com");
        record.insert_records("A", vec!["93.184.216.34".to_string()]);
        record.insert_records("MX", vec![]);

        let value = serde_json::to_value(&record).unwrap();
        let obj = value.as_object().unwrap();
        assert!(obj.contains_key("target"));
        assert!(obj.contains_key("records"));
        assert!(!obj.contains_key("reverse_dns"));
        assert!(!obj.contains_key("subdomains"));

        let records = obj["records"].as_object().unwrap();
        assert_eq!(records["A"][0], "93.184.216.34");
        assert_eq!(records["MX"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn dns_records_keep_query_order() {
        let mut record = DnsScanResult::new("example.com");
        for rtype in ["A", "AAAA", "MX", "NS", "TXT", "SOA"] {
            record.insert_records(rtype, vec![]);
        }
        let value = serde_json::to_value(&record).unwrap();
        let keys: Vec<&String> = value["records"].as_object().unwrap().keys().collect();
        assert_eq!(keys, ["A", "AAAA", "MX", "NS", "TXT", "SOA"]);
    }

    #[test]
    fn port_record_orders_ports_ascending() {
        let mut record = PortScanResult::new("10.0.0.1");
        let tcp = record.protocols.entry("tcp".to_string()).or_default();
        for port in [443u16, 22, 8080, 80] {
            tcp.insert(
                port,
                PortService {
                    state: "open".to_string(),
                    service: "unknown".to_string(),
                    product: String::new(),
                    version: String::new(),
                    extrainfo: String::new(),
                },
            );
        }
        let ports: Vec<u16> = record.protocols["tcp"].keys().copied().collect();
        assert_eq!(ports, [22, 80, 443, 8080]);
    }

    #[test]
    fn partial_web_record_stays_serializable() {
        // A probe that failed after step 1 still yields a valid document.
        let record = WebScanResult::new("http://example.com");
        let value = serde_json::to_value(&record).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.len(), 1);
        assert_eq!(obj["url"], "http://example.com");
    }
}
