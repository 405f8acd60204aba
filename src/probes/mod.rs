pub mod direct;
pub mod proxy;
pub mod sni;

/// Builds the probe URL for a target: `https` without an explicit port on
/// 443, plain `http` with the port spelled out everywhere else.
pub fn target_url(host: &str, port: u16) -> String {
    if port == 443 {
        format!("https://{}", host)
    } else {
        format!("http://{}:{}", host, port)
    }
}

#[cfg(test)]
mod tests {
    use super::target_url;

    #[test]
    fn https_on_443_without_port() {
        assert_eq!(target_url("example.com", 443), "https://example.com");
    }

    #[test]
    fn http_with_port_otherwise() {
        assert_eq!(target_url("example.com", 80), "http://example.com:80");
        assert_eq!(target_url("10.0.0.1", 8080), "http://10.0.0.1:8080");
    }
}
