use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::time::Duration;

/// One emitted scan result, kept for export alongside the live terminal
/// output.
#[derive(Debug, Clone, Serialize)]
pub struct ScanRecord {
    pub host: String,
    pub hostname: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sni_accepted: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub scan_time: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ScanReport {
    pub mode: String,
    pub hostnames: usize,
    pub records: Vec<ScanRecord>,
    pub duration_secs: f64,
}

impl ScanReport {
    pub fn new(mode: String, hostnames: usize, records: Vec<ScanRecord>, duration: Duration) -> Self {
        ScanReport {
            mode,
            hostnames,
            records,
            duration_secs: duration.as_secs_f64(),
        }
    }

    pub fn to_json_file(&self, path: &str) -> Result<(), std::io::Error> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }

    pub fn print_summary(&self) {
        println!(
            "\n{} hostnames, {} results in {:.2}s",
            self.hostnames,
            self.records.len(),
            self.duration_secs
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_serializes_without_absent_fields() {
        let report = ScanReport::new(
            "direct".into(),
            1,
            vec![ScanRecord {
                host: "10.0.0.1".into(),
                hostname: "example.com".into(),
                status_code: Some(200),
                server: Some("Varnish".into()),
                sni_accepted: None,
                url: None,
                scan_time: Utc::now(),
            }],
            Duration::from_millis(1500),
        );

        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"status_code\":200"));
        assert!(json.contains("\"server\":\"Varnish\""));
        assert!(!json.contains("sni_accepted"));
        assert!(!json.contains("\"url\""));
    }
}
