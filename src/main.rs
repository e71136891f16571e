use std::path::PathBuf;
use std::process::exit;

use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::error;
use tracing_subscriber::EnvFilter;

use netrecon::app::{App, Command, DEFAULT_DIR_WORDLIST, DEFAULT_SUB_WORDLIST};
use netrecon::probes::{dns, port, web};

#[derive(Parser)]
#[command(name = "netrecon")]
#[command(about = "A command-line reconnaissance tool for CTF and pentesting")]
struct Args {
    /// Target IP address or hostname (e.g., 192.168.1.1, example.com)
    #[arg(short, long)]
    target: String,

    /// Increase output verbosity
    #[arg(short, long)]
    verbose: bool,

    /// Output results to a file (e.g., results.json, results.txt)
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    module: Module,
}

#[derive(Subcommand)]
enum Module {
    /// Run every reconnaissance module in sequence against the target
    Defaultscan,

    /// Perform a port scan on the target using Nmap
    Portscan {
        /// Ports to scan (e.g., '80,443,22' or '1-1024'). Default: common ports.
        #[arg(short, long, default_value = port::TOP_PORTS_SENTINEL)]
        ports: String,

        /// Perform a full TCP port scan (1-65535). Overrides -p.
        #[arg(long)]
        full: bool,

        /// Include UDP port scanning (requires root/sudo for Nmap)
        #[arg(long)]
        udp: bool,
    },

    /// Perform web enumeration on the target
    Webscan {
        /// Full URL for web scanning (e.g., http://example.com:8080).
        /// If not provided, common HTTP/S ports are tried.
        #[arg(short, long)]
        url: Option<String>,

        /// Perform directory and file brute-forcing
        #[arg(long)]
        dir_brute: bool,

        /// Path to a custom wordlist for directory brute-forcing
        #[arg(long, default_value = DEFAULT_DIR_WORDLIST)]
        wordlist: PathBuf,
    },

    /// Perform DNS and subdomain enumeration
    Dnsenum {
        /// Perform subdomain brute-forcing
        #[arg(long)]
        sub_brute: bool,

        /// Path to a custom wordlist for subdomain brute-forcing
        #[arg(long, default_value = DEFAULT_SUB_WORDLIST)]
        sub_wordlist: PathBuf,

        /// Custom DNS server to use (e.g., 8.8.8.8)
        #[arg(long)]
        dns_server: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            exit(code);
        }
    };

    let default_filter = if args.verbose {
        "netrecon=debug"
    } else {
        "netrecon=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .init();

    println!(
        "{}",
        format!("Starting reconnaissance on {}", args.target)
            .blue()
            .bold()
    );
    if args.verbose {
        println!("{}", "Verbose mode enabled.".dimmed());
    }

    let (banner, command) = match args.module {
        Module::Defaultscan => ("Running Default Scan Mode...", Command::Default),
        Module::Portscan { ports, full, udp } => (
            "Running Port Scan Module...",
            Command::Port(port::PortScanOptions { ports, full, udp }),
        ),
        Module::Webscan {
            url,
            dir_brute,
            wordlist,
        } => (
            "Running Web Scan Module...",
            Command::Web(web::WebScanOptions {
                url,
                dir_brute,
                wordlist,
            }),
        ),
        Module::Dnsenum {
            sub_brute,
            sub_wordlist,
            dns_server,
        } => (
            "Running DNS Enumeration Module...",
            Command::Dns(dns::DnsScanOptions {
                sub_brute,
                sub_wordlist,
                dns_server,
            }),
        ),
    };
    println!("\n{}", banner.yellow().bold());

    let app = match App::new(args.target.clone(), args.verbose, args.output) {
        Ok(app) => app,
        Err(e) => {
            error!("Failed to initialize: {}", e);
            exit(1);
        }
    };

    if let Err(e) = app.run(command).await {
        eprintln!(
            "{}",
            format!("An error occurred during module execution: {}", e)
                .red()
                .bold()
        );
        if args.verbose {
            // Full diagnostic chain, for the outermost unhandled error only.
            eprintln!("{}", format!("{:?}", e).red());
        }
        exit(1);
    }

    println!(
        "{}",
        format!("\nReconnaissance complete for {}", args.target)
            .blue()
            .bold()
    );
}
