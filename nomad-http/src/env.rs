//! Resolution of `NOMAD_*` environment variables.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::debug;

use crate::config::{ClientConfig, ProxySettings, DEFAULT_ADDRESS, DEFAULT_SSL_CIPHERS};
use crate::error::{Error, Result};

/// Somewhere configuration variables can be read from.
pub trait EnvSource {
    /// The value of `key`, if set.
    fn var(&self, key: &str) -> Option<String>;
}

/// The process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl EnvSource for BTreeMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl EnvSource for [(&str, &str)] {
    fn var(&self, key: &str) -> Option<String> {
        self.iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| value.to_string())
    }
}

pub(crate) fn resolve(source: &(impl EnvSource + ?Sized)) -> Result<ClientConfig> {
    let mut config = ClientConfig {
        address: source.var("NOMAD_ADDR").unwrap_or_else(|| DEFAULT_ADDRESS.to_string()),
        token: source.var("NOMAD_TOKEN"),
        timeout: seconds(source, "NOMAD_TIMEOUT")?,
        open_timeout: seconds(source, "NOMAD_OPEN_TIMEOUT")?,
        read_timeout: seconds(source, "NOMAD_READ_TIMEOUT")?,
        ssl_timeout: seconds(source, "NOMAD_SSL_TIMEOUT")?,
        ..ClientConfig::default()
    };

    if let Some(size) = parsed::<usize>(source, "NOMAD_POOL_SIZE")? {
        config.pool_size = size;
    }

    let tls = &mut config.tls;
    tls.server_name = source.var("NOMAD_TLS_SERVER_NAME");
    tls.ciphers = source
        .var("NOMAD_SSL_CIPHERS")
        .unwrap_or_else(|| DEFAULT_SSL_CIPHERS.to_string());
    tls.pem_contents = source.var("NOMAD_SSL_PEM_CONTENTS");
    tls.pem_file = source
        .var("NOMAD_SSL_CERT")
        .or_else(|| source.var("NOMAD_SSL_PEM_FILE"))
        .map(PathBuf::from);
    tls.pem_passphrase = source.var("NOMAD_SSL_CERT_PASSPHRASE");
    tls.ca_cert = source.var("NOMAD_CACERT").map(PathBuf::from);
    tls.ca_path = source.var("NOMAD_CAPATH").map(PathBuf::from);
    tls.verify = verify(source);

    if let Some(address) = source.var("NOMAD_PROXY_ADDRESS") {
        config.proxy = Some(ProxySettings {
            address,
            port: parsed::<u16>(source, "NOMAD_PROXY_PORT")?,
            username: source.var("NOMAD_PROXY_USERNAME"),
            password: source.var("NOMAD_PROXY_PASSWORD"),
        });
    }

    debug!(address = %config.address, pool_size = config.pool_size, "Resolved client configuration from environment");
    Ok(config)
}

/// `NOMAD_SKIP_VERIFY` wins whenever it is set; otherwise `NOMAD_SSL_VERIFY`
/// is true when it starts with `t` or `y`.
fn verify(source: &(impl EnvSource + ?Sized)) -> bool {
    if source.var("NOMAD_SKIP_VERIFY").is_some() {
        return false;
    }
    match source.var("NOMAD_SSL_VERIFY") {
        None => true,
        Some(value) => matches!(
            value.trim().chars().next().map(|c| c.to_ascii_lowercase()),
            Some('t' | 'y')
        ),
    }
}

fn parsed<T: FromStr>(source: &(impl EnvSource + ?Sized), key: &str) -> Result<Option<T>> {
    match source.var(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::InvalidConfig(format!("{key} has an invalid value `{raw}'"))),
    }
}

fn seconds(source: &(impl EnvSource + ?Sized), key: &str) -> Result<Option<Duration>> {
    match parsed::<f64>(source, key)? {
        None => Ok(None),
        Some(secs) => Duration::try_from_secs_f64(secs)
            .map(Some)
            .map_err(|_| Error::InvalidConfig(format!("{key} must be a non-negative number of seconds"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve_pairs(pairs: &[(&str, &str)]) -> Result<ClientConfig> {
        resolve(pairs)
    }

    #[test]
    fn test_empty_environment_uses_defaults() {
        let config = resolve_pairs(&[]).unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn test_address_and_token() {
        let config =
            resolve_pairs(&[("NOMAD_ADDR", "https://nomad:4646"), ("NOMAD_TOKEN", "secret")]).unwrap();
        assert_eq!(config.address, "https://nomad:4646");
        assert_eq!(config.token.as_deref(), Some("secret"));
    }

    #[test]
    fn test_timeouts_are_seconds() {
        let config = resolve_pairs(&[
            ("NOMAD_TIMEOUT", "30"),
            ("NOMAD_OPEN_TIMEOUT", "1.5"),
            ("NOMAD_READ_TIMEOUT", "0.01"),
        ])
        .unwrap();
        assert_eq!(config.timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.open_timeout, Some(Duration::from_millis(1500)));
        assert_eq!(config.read_timeout, Some(Duration::from_millis(10)));
        assert_eq!(config.effective_ssl_timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_invalid_numbers_are_rejected() {
        assert!(matches!(
            resolve_pairs(&[("NOMAD_POOL_SIZE", "many")]),
            Err(Error::InvalidConfig(_))
        ));
        assert!(resolve_pairs(&[("NOMAD_TIMEOUT", "-1")]).is_err());
        assert_eq!(resolve_pairs(&[("NOMAD_POOL_SIZE", "4")]).unwrap().pool_size, 4);
    }

    #[test]
    fn test_pem_file_precedence() {
        let config = resolve_pairs(&[
            ("NOMAD_SSL_PEM_FILE", "/b.pem"),
            ("NOMAD_SSL_CERT", "/a.pem"),
        ])
        .unwrap();
        assert_eq!(config.tls.pem_file, Some(PathBuf::from("/a.pem")));

        let config = resolve_pairs(&[("NOMAD_SSL_PEM_FILE", "/b.pem")]).unwrap();
        assert_eq!(config.tls.pem_file, Some(PathBuf::from("/b.pem")));
    }

    #[test]
    fn test_verify_flags() {
        assert!(verify(&[] as &[(&str, &str)]));
        assert!(!verify(&[("NOMAD_SKIP_VERIFY", "")] as &[_]));
        assert!(!verify(&[("NOMAD_SKIP_VERIFY", "0"), ("NOMAD_SSL_VERIFY", "true")] as &[_]));
        assert!(verify(&[("NOMAD_SSL_VERIFY", "Yes")] as &[_]));
        assert!(verify(&[("NOMAD_SSL_VERIFY", "t")] as &[_]));
        assert!(!verify(&[("NOMAD_SSL_VERIFY", "false")] as &[_]));
        assert!(!verify(&[("NOMAD_SSL_VERIFY", "")] as &[_]));
    }

    #[test]
    fn test_proxy() {
        let config = resolve_pairs(&[
            ("NOMAD_PROXY_ADDRESS", "proxy.internal"),
            ("NOMAD_PROXY_PORT", "3128"),
            ("NOMAD_PROXY_USERNAME", "ops"),
        ])
        .unwrap();
        let proxy = config.proxy.unwrap();
        assert_eq!(proxy.url(), "http://proxy.internal:3128");
        assert_eq!(proxy.username.as_deref(), Some("ops"));
        assert_eq!(proxy.password, None);

        assert!(resolve_pairs(&[("NOMAD_PROXY_PORT", "3128")]).unwrap().proxy.is_none());
    }

    #[test]
    fn test_maps_are_sources() {
        let mut map = HashMap::new();
        map.insert("NOMAD_CACERT".to_string(), "/etc/nomad/ca.pem".to_string());
        let config = ClientConfig::from_source(&map).unwrap();
        assert_eq!(config.tls.ca_cert, Some(PathBuf::from("/etc/nomad/ca.pem")));
    }
}
