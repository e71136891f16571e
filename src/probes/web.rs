//! Web enumeration: base-URL discovery, root-document capture, and an
//! optional wordlist-driven directory sweep.

use std::path::Path;
use std::time::Duration;

use scraper::{Html, Node, Selector};
use serde_json::{Map, Value};
use tracing::{debug, info};
use url::Url;

use crate::error::{ReconError, ReconResult};
use crate::record::{DirFinding, WebScanResult};
use crate::report::Reporter;
use crate::utils::http::HttpClient;
use crate::wordlist;

const PROBE: &str = "web";

/// Per-attempt timeout while discovering the base URL.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// Timeout for the primary document fetch.
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);
/// Per-entry timeout during the directory sweep.
const SWEEP_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct WebScanOptions {
    /// Explicit URL override; when absent, http then https are tried.
    pub url: Option<String>,
    pub dir_brute: bool,
    pub wordlist: std::path::PathBuf,
}

pub async fn run_scan(
    target: &str,
    opts: &WebScanOptions,
    http: &HttpClient,
    reporter: &dyn Reporter,
) -> ReconResult<WebScanResult> {
    let base_url = match &opts.url {
        Some(url) => url.clone(),
        None => resolve_base_url(target, http, reporter).await?,
    };

    reporter.announce(&format!("Starting web scan on {}...", base_url));
    let mut results = WebScanResult::new(&base_url);

    reporter.begin("Fetching main page...", None);
    let response = http.get_with_timeout(&base_url, FETCH_TIMEOUT).await;
    reporter.finish("");
    let response = response
        .map_err(|e| ReconError::probe(PROBE, format!("failed to fetch {}: {}", base_url, e)))?;

    results.status_code = Some(response.status().as_u16());

    let mut headers = Map::new();
    for (name, value) in response.headers() {
        headers.insert(
            name.to_string(),
            Value::String(String::from_utf8_lossy(value.as_bytes()).into_owned()),
        );
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| ReconError::probe(PROBE, format!("failed to read body of {}: {}", base_url, e)))?;
    results.content_length = Some(body.len() as u64);

    reporter.announce("Main page info:");
    reporter.announce(&format!("  Status code: {}", results.status_code.unwrap_or(0)));
    reporter.announce(&format!("  Content length: {} bytes", body.len()));
    for (name, value) in &headers {
        reporter.detail(&format!("  {}: {}", name, value.as_str().unwrap_or("")));
    }
    results.headers = Some(headers);

    let text = String::from_utf8_lossy(&body);
    let (title, comments) = parse_document(&text);
    reporter.announce(&format!("  Title: {}", title));
    results.title = Some(title);
    if !comments.is_empty() {
        reporter.announce("  Found comments:");
        for comment in &comments {
            reporter.found(&format!("- {}", comment));
        }
        results.comments = Some(comments);
    }

    if opts.dir_brute {
        results.dir_brute_results =
            Some(dir_brute_sweep(&base_url, &opts.wordlist, http, reporter).await?);
    }

    info!("Web scan of {} complete", base_url);
    Ok(results)
}

/// Try `http://{target}` then `https://{target}`; the first answer with a
/// status below 400 wins. Per-attempt failures are surfaced and the next
/// scheme is tried; if neither responds, the whole probe fails.
async fn resolve_base_url(
    target: &str,
    http: &HttpClient,
    reporter: &dyn Reporter,
) -> ReconResult<String> {
    reporter.note(&format!(
        "No URL provided. Attempting to connect to http://{0} and https://{0}",
        target
    ));

    for scheme in ["http", "https"] {
        let candidate = format!("{}://{}", scheme, target);
        match http.get_with_timeout(&candidate, CONNECT_TIMEOUT).await {
            Ok(response) if response.status().as_u16() < 400 => {
                reporter.announce(&format!("Successfully connected to {}", candidate));
                return Ok(candidate);
            }
            Ok(response) => {
                reporter.note(&format!(
                    "{} answered with status {}",
                    candidate,
                    response.status()
                ));
            }
            Err(e) if e.is_timeout() => {
                reporter.fail(PROBE, &format!("Connection to {} timed out", candidate));
            }
            Err(e) if e.is_connect() => {
                reporter.fail(PROBE, &format!("Could not connect to {}", candidate));
            }
            Err(e) => {
                reporter.fail(PROBE, &format!("Error connecting to {}: {}", candidate, e));
            }
        }
    }

    Err(ReconError::UnreachableTarget(format!(
        "could not find an active web server on common HTTP/S ports for {}",
        target
    )))
}

/// Extract the page title and every HTML comment, in document order.
fn parse_document(html: &str) -> (String, Vec<String>) {
    let document = Html::parse_document(html);

    let title = Selector::parse("title")
        .ok()
        .and_then(|sel| document.select(&sel).next())
        .map(|el| el.text().collect::<String>().trim().to_string())
        .unwrap_or_else(|| "No Title".to_string());

    let comments: Vec<String> = document
        .tree
        .nodes()
        .filter_map(|node| match node.value() {
            Node::Comment(comment) => Some(comment.trim().to_string()),
            _ => None,
        })
        .collect();

    (title, comments)
}

/// Issue one GET per wordlist entry against the base URL. Anything that does
/// not answer 404 is a finding; per-entry network errors are verbose-only
/// and never abort the sweep. Progress advances exactly once per entry.
async fn dir_brute_sweep(
    base_url: &str,
    wordlist_path: &Path,
    http: &HttpClient,
    reporter: &dyn Reporter,
) -> ReconResult<Vec<DirFinding>> {
    reporter.announce(&format!(
        "Starting directory brute-forcing with {}...",
        wordlist_path.display()
    ));

    let entries = wordlist::load(wordlist_path)?;
    let base = Url::parse(base_url)
        .map_err(|e| ReconError::probe(PROBE, format!("invalid base URL {}: {}", base_url, e)))?;

    let mut findings = Vec::new();
    reporter.begin("Brute-forcing directories...", Some(entries.len() as u64));
    for entry in &entries {
        match base.join(entry) {
            Ok(test_url) => match http.get_with_timeout(test_url.as_str(), SWEEP_TIMEOUT).await {
                Ok(response) => {
                    let status = response.status().as_u16();
                    if status != 404 {
                        let content_length =
                            response.bytes().await.map(|b| b.len() as u64).unwrap_or(0);
                        reporter.found(&format!("Found {} (Status: {})", test_url, status));
                        findings.push(DirFinding {
                            url: test_url.to_string(),
                            status_code: status,
                            content_length,
                        });
                    }
                }
                Err(e) => {
                    debug!("Error accessing {}: {}", test_url, e);
                    reporter.note(&format!("Error accessing {}: {}", test_url, e));
                }
            },
            Err(e) => reporter.note(&format!("Skipping entry {:?}: {}", entry, e)),
        }
        reporter.advance(1);
    }
    reporter.finish("Directory brute-forcing complete");

    Ok(findings)
}
