/// # bugscan: a concurrent bug host discovery scanner.
///
/// This library classifies hostnames by their observable network behavior:
/// the signature of a direct HTTP response, whether a TLS handshake
/// advertising an arbitrary SNI value completes, or how a host behaves when
/// reached through an HTTP proxy. It performs no exploitation; results are
/// derived from response metadata only.
///
/// ## Features
///
/// - **DNS expansion**: every input hostname is expanded into the full set
///   of (address, alias) pairs that answer for it
/// - **Three probe modes**: direct HTTP, SNI handshake, HTTP proxy
/// - **Fixed worker pool**: a bounded number of concurrent workers drain
///   the hostname queue
/// - **Single-flight memoization**: identical probe keys reached through
///   different aliases hit the network exactly once per run
///
/// ## Example
///
/// ```rust,no_run
/// use bugscan::{Engine, ScanConfig, ScanMode};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = ScanConfig {
///         mode: ScanMode::Direct,
///         port: 80,
///         threads: 8,
///         ..ScanConfig::default()
///     };
///
///     let engine = Engine::new(config)?;
///     let records = engine.run(vec!["example.com".to_string()]).await?;
///
///     for record in records {
///         println!("{} {:?} {}", record.host, record.status_code, record.hostname);
///     }
///
///     Ok(())
/// }
/// ```
pub mod cache;
pub mod cli;
pub mod engine;
pub mod error;
pub mod output;
pub mod probes;
pub mod reporter;
pub mod resolver;

pub use cache::{ProbeCache, ProbeTable};
pub use cli::Cli;
pub use engine::{CancelHandle, Engine, EngineState, ScanConfig, ScanMode};
pub use error::{BugscanError, HandshakeError};
pub use output::{ScanRecord, ScanReport};
pub use reporter::Reporter;
pub use resolver::{ResolvedHost, Resolver};
