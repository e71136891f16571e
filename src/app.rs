//! Orchestrator: dispatches exactly one module per invocation, or all of
//! them in default mode, against the same target.

use std::path::PathBuf;

use anyhow::Result;
use tracing::info;

use crate::error::ReconError;
use crate::output;
use crate::probes::{dns, port, web};
use crate::record::{DefaultScanResult, ScanRecord};
use crate::report::{ConsoleReporter, Reporter};
use crate::utils::http::HttpClient;

pub const DEFAULT_DIR_WORDLIST: &str = "wordlists/common.txt";
pub const DEFAULT_SUB_WORDLIST: &str = "wordlists/subdomains.txt";

/// The module selected on the command line.
pub enum Command {
    Default,
    Port(port::PortScanOptions),
    Web(web::WebScanOptions),
    Dns(dns::DnsScanOptions),
}

pub struct App {
    target: String,
    output: Option<PathBuf>,
    http: HttpClient,
    reporter: ConsoleReporter,
}

impl App {
    pub fn new(target: String, verbose: bool, output: Option<PathBuf>) -> Result<Self> {
        let http = HttpClient::new(None, None)?;
        Ok(Self {
            target,
            output,
            http,
            reporter: ConsoleReporter::new(verbose),
        })
    }

    /// Run the selected module. Probe-level failures are reported here and
    /// do not escape; only configuration errors propagate to the caller.
    pub async fn run(&self, command: Command) -> Result<()> {
        match command {
            Command::Default => self.run_defaultscan().await,
            Command::Port(opts) => self.run_portscan(&opts).await,
            Command::Web(opts) => self.run_webscan(&opts).await,
            Command::Dns(opts) => self.run_dnsenum(&opts).await,
        }
    }

    async fn run_portscan(&self, opts: &port::PortScanOptions) -> Result<()> {
        match port::run_scan(&self.target, opts, &self.reporter).await {
            Ok(record) => self.persist(&ScanRecord::Port(record)),
            Err(e) => self.report_probe_error("portscan", &e),
        }
        Ok(())
    }

    async fn run_webscan(&self, opts: &web::WebScanOptions) -> Result<()> {
        match web::run_scan(&self.target, opts, &self.http, &self.reporter).await {
            Ok(record) => self.persist(&ScanRecord::Web(record)),
            Err(e) => self.report_probe_error("webscan", &e),
        }
        Ok(())
    }

    async fn run_dnsenum(&self, opts: &dns::DnsScanOptions) -> Result<()> {
        match dns::run_scan(&self.target, opts, &self.reporter).await {
            Ok(record) => self.persist(&ScanRecord::Dns(record)),
            // A bad nameserver is operator input, not a probe outcome.
            Err(e @ ReconError::Config(_)) => return Err(e.into()),
            Err(e) => self.report_probe_error("dnsenum", &e),
        }
        Ok(())
    }

    /// Default mode: web discovery with directory sweep, port scan with
    /// defaults, DNS enumeration with subdomain sweep, in that order. A
    /// failing module never blocks the ones after it, and a missing default
    /// wordlist skips only that sweep, visibly.
    async fn run_defaultscan(&self) -> Result<()> {
        let mut record = DefaultScanResult::new(&self.target);

        let web_opts = web::WebScanOptions {
            url: None,
            dir_brute: self.sweep_enabled("directory", DEFAULT_DIR_WORDLIST),
            wordlist: PathBuf::from(DEFAULT_DIR_WORDLIST),
        };
        match web::run_scan(&self.target, &web_opts, &self.http, &self.reporter).await {
            Ok(result) => record.web = Some(result),
            Err(e) => self.report_probe_error("webscan", &e),
        }

        match port::run_scan(&self.target, &port::PortScanOptions::default(), &self.reporter).await
        {
            Ok(result) => record.ports = Some(result),
            Err(e) => self.report_probe_error("portscan", &e),
        }

        let dns_opts = dns::DnsScanOptions {
            sub_brute: self.sweep_enabled("subdomain", DEFAULT_SUB_WORDLIST),
            sub_wordlist: PathBuf::from(DEFAULT_SUB_WORDLIST),
            dns_server: None,
        };
        match dns::run_scan(&self.target, &dns_opts, &self.reporter).await {
            Ok(result) => record.dns = Some(result),
            Err(e) => self.report_probe_error("dnsenum", &e),
        }

        self.persist(&ScanRecord::Default(record));
        Ok(())
    }

    /// Default mode never runs a sweep whose wordlist is structurally
    /// missing; it announces the skip instead of failing mid-module.
    fn sweep_enabled(&self, sweep: &str, wordlist: &str) -> bool {
        let path = PathBuf::from(wordlist);
        if path.exists() {
            true
        } else {
            self.reporter
                .fail("defaultscan", &ReconError::WordlistNotFound { path });
            self.reporter
                .announce(&format!("Skipping {} brute-force step.", sweep));
            false
        }
    }

    fn persist(&self, record: &ScanRecord) {
        if let Some(path) = &self.output {
            output::save_results(path, record, &self.reporter);
        }
    }

    fn report_probe_error(&self, module: &str, error: &ReconError) {
        self.reporter.fail(module, error);
        if let ReconError::ExternalTool { tool, .. } = error {
            self.reporter.note(&format!(
                "Please ensure {} is installed and you have sufficient permissions \
                 (e.g., run with sudo for UDP scans).",
                tool
            ));
        }
        info!("{} module finished with a handled error", module);
    }
}
