// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for config.rs

#[cfg(test)]
mod tests {
    use super::super::*;

    #[test]
    fn test_minimal_config_gets_defaults() {
        let config = Config::parse("DatabaseURI: \"sqlite::memory:\"\n").unwrap();

        assert_eq!(config.database_uri, "sqlite::memory:");
        assert_eq!(config.address, ":8080");
        assert!(config.trusted_proxies.is_empty());
        assert!(!config.log_error_only);
        assert!(config.dns_servers.is_empty());
        assert_eq!(config.dns_port, 53);
        assert_eq!(config.dns_protocol, DnsProtocol::Udp);
        assert_eq!(config.dns_worker, 1);
        assert_eq!(config.domain_buffer, 1000);
        assert_eq!(config.blacklist_sec, 60);
        assert!(!config.tls_enabled());
    }

    #[test]
    fn test_full_config() {
        let raw = r#"
DatabaseURI: "sqlite:///var/lib/columbus/columbus.db"
Address: "127.0.0.1:8081"
TrustedProxies:
  - "10.0.0.1"
  - "2001:db8::1"
SSLCert: "/etc/columbus/cert.pem"
SSLKey: "/etc/columbus/key.pem"
LogErrorOnly: true
DNSServers:
  - "9.9.9.9"
  - "149.112.112.112"
DNSPort: 5353
DNSProtocol: "tcp"
DNSWorker: 8
DomainBuffer: 512
BlacklistSec: 120
"#;
        let config = Config::parse(raw).unwrap();

        assert_eq!(config.address, "127.0.0.1:8081");
        assert_eq!(config.trusted_proxies.len(), 2);
        assert!(config.tls_enabled());
        assert!(config.log_error_only);
        assert_eq!(config.dns_servers.len(), 2);
        assert_eq!(config.dns_port, 5353);
        assert_eq!(config.dns_protocol, DnsProtocol::Tcp);
        assert_eq!(config.dns_worker, 8);
        assert_eq!(config.domain_buffer, 512);
        assert_eq!(config.blacklist_sec, 120);
    }

    #[test]
    fn test_legacy_mongo_uri_alias() {
        let config = Config::parse("MongoURI: \"sqlite::memory:\"\n").unwrap();
        assert_eq!(config.database_uri, "sqlite::memory:");
    }

    #[test]
    fn test_missing_database_uri_rejected() {
        assert!(Config::parse("Address: \":8080\"\n").is_err());
    }

    #[test]
    fn test_empty_database_uri_rejected() {
        assert!(Config::parse("DatabaseURI: \"\"\n").is_err());
    }

    #[test]
    fn test_zero_workers_rejected() {
        let raw = "DatabaseURI: \"sqlite::memory:\"\nDNSWorker: 0\n";
        assert!(Config::parse(raw).is_err());
    }

    #[test]
    fn test_lonely_ssl_cert_rejected() {
        let raw = "DatabaseURI: \"sqlite::memory:\"\nSSLCert: \"/tmp/cert.pem\"\n";
        assert!(Config::parse(raw).is_err());
    }

    #[test]
    fn test_listen_address_expands_bare_port() {
        let config = Config::parse("DatabaseURI: \"sqlite::memory:\"\n").unwrap();
        assert_eq!(config.listen_address(), "0.0.0.0:8080");

        let raw = "DatabaseURI: \"sqlite::memory:\"\nAddress: \"127.0.0.1:9000\"\n";
        let config = Config::parse(raw).unwrap();
        assert_eq!(config.listen_address(), "127.0.0.1:9000");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("columbus.conf");
        std::fs::write(&path, "DatabaseURI: \"sqlite::memory:\"\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.database_uri, "sqlite::memory:");

        assert!(Config::load(&dir.path().join("missing.conf")).is_err());
    }
}
