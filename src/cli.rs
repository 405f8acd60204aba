use clap::Parser;
use std::fs;
use std::str::FromStr;

use crate::engine::{ScanConfig, ScanMode, PROBE_TIMEOUT};

#[derive(Parser, Debug)]
#[command(
    name = "bugscan",
    version,
    about = "Bug host discovery scanner",
    long_about = "bugscan classifies hostnames by their network behavior: direct HTTP \
                  response signatures, SNI handshake acceptance, or behavior through an \
                  HTTP proxy.",
    after_help = "EXAMPLES:
    bugscan hosts.txt
    bugscan hosts.txt -m ssl -d 3
    bugscan hosts.txt -m direct -p 8080 -t 16
    bugscan hosts.txt -m proxy -P proxy.example.com:8080 -M GET"
)]
pub struct Cli {
    #[arg(help = "File containing newline-separated hostnames to scan")]
    pub filename: String,

    #[arg(
        short = 'm',
        long,
        default_value = "direct",
        help = "Scan mode (direct, ssl, proxy)",
        help_heading = "SCAN MODE"
    )]
    pub mode: String,

    #[arg(
        short = 'd',
        long,
        default_value_t = 2,
        help = "Subdomain depth: trailing labels kept for the SNI probe",
        help_heading = "SCAN MODE"
    )]
    pub deep: usize,

    #[arg(
        short = 'p',
        long,
        default_value_t = 80,
        help = "Target port for direct and proxy modes",
        help_heading = "SCAN MODE"
    )]
    pub port: u16,

    #[arg(
        long = "sni-host",
        default_value = "httpbin.org",
        help = "Endpoint hosting the SNI handshake (ssl mode)",
        help_heading = "SCAN MODE"
    )]
    pub sni_host: String,

    #[arg(
        short = 'P',
        long,
        help = "HTTP proxy as host:port (required for proxy mode)",
        help_heading = "PROXY OPTIONS"
    )]
    pub proxy: Option<String>,

    #[arg(
        short = 'M',
        long,
        default_value = "HEAD",
        help = "HTTP method for proxy mode",
        help_heading = "PROXY OPTIONS"
    )]
    pub method: String,

    #[arg(
        short = 't',
        long,
        default_value_t = 8,
        help = "Worker pool size",
        help_heading = "SCAN PERFORMANCE"
    )]
    pub threads: usize,

    #[arg(
        short = 'o',
        long,
        help = "Write results to a JSON file",
        help_heading = "OUTPUT OPTIONS"
    )]
    pub output: Option<String>,

    #[arg(
        short = 'v',
        long,
        help = "Verbose (debug) logging",
        help_heading = "OUTPUT OPTIONS"
    )]
    pub verbose: bool,
}

impl Cli {
    pub fn to_config(&self) -> Result<ScanConfig, anyhow::Error> {
        let mode = ScanMode::from_str(&self.mode)?;

        // Fail here, before the engine exists: a proxy scan without a
        // proxy is a configuration error, not a usage hint.
        if mode == ScanMode::Proxy && self.proxy.is_none() {
            return Err(anyhow::anyhow!(
                "proxy mode requires --proxy <host:port>"
            ));
        }

        Ok(ScanConfig {
            mode,
            deep: self.deep,
            port: self.port,
            threads: self.threads,
            proxy: self.proxy.clone(),
            method: self.method.clone(),
            sni_host: self.sni_host.clone(),
            timeout: PROBE_TIMEOUT,
        })
    }

    /// Loads the hostname list, skipping blank lines.
    pub fn load_hostnames(&self) -> Result<Vec<String>, anyhow::Error> {
        let contents = fs::read_to_string(&self.filename)
            .map_err(|err| anyhow::anyhow!("cannot read {}: {}", self.filename, err))?;
        Ok(contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }
}
