//! TLS setup on top of rustls.
//!
//! rustls never speaks SSLv2/SSLv3, TLS 1.0/1.1, or TLS compression, so the
//! floor is fixed at TLS 1.2. The cipher string can only raise it.

use std::fs;
use std::path::Path;

use reqwest::tls::{Certificate, Identity, Version};
use reqwest::ClientBuilder;
use tracing::debug;

use crate::config::TlsSettings;
use crate::error::{Error, Result};

/// Minimum protocol version implied by a cipher string.
pub fn min_version(ciphers: &str) -> Version {
    let wants_tls13 = ciphers
        .split([':', ',', ' '])
        .any(|token| token.eq_ignore_ascii_case("TLSv1.3"));
    if wants_tls13 { Version::TLS_1_3 } else { Version::TLS_1_2 }
}

/// Apply `tls` to a client builder.
pub fn configure(mut builder: ClientBuilder, tls: &TlsSettings) -> Result<ClientBuilder> {
    builder = builder
        .use_rustls_tls()
        .min_tls_version(min_version(&tls.ciphers))
        .danger_accept_invalid_certs(!tls.verify);

    if tls.pem_passphrase.is_some() {
        return Err(Error::InvalidConfig(
            "encrypted client keys are not supported; provide an unencrypted PEM key".into(),
        ));
    }

    let identity = match (&tls.pem_contents, &tls.pem_file) {
        (Some(contents), _) => Some(contents.as_bytes().to_vec()),
        (None, Some(path)) => Some(read(path)?),
        (None, None) => None,
    };
    if let Some(pem) = identity {
        let identity = Identity::from_pem(&pem)
            .map_err(|e| Error::InvalidConfig(format!("invalid client certificate: {e}")))?;
        builder = builder.identity(identity);
    }

    if let Some(path) = &tls.ca_cert {
        for cert in certificates(path)? {
            builder = builder.add_root_certificate(cert);
        }
    }

    if let Some(dir) = &tls.ca_path {
        let entries = fs::read_dir(dir)
            .map_err(|e| Error::InvalidConfig(format!("cannot read {}: {e}", dir.display())))?;
        for entry in entries {
            let path = entry
                .map_err(|e| Error::InvalidConfig(format!("cannot read {}: {e}", dir.display())))?
                .path();
            let is_cert = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| matches!(ext, "pem" | "crt"));
            if is_cert {
                for cert in certificates(&path)? {
                    builder = builder.add_root_certificate(cert);
                }
            }
        }
    }

    debug!(verify = tls.verify, "Configured TLS");
    Ok(builder)
}

fn read(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| Error::InvalidConfig(format!("cannot read {}: {e}", path.display())))
}

fn certificates(path: &Path) -> Result<Vec<Certificate>> {
    Certificate::from_pem_bundle(&read(path)?)
        .map_err(|e| Error::InvalidConfig(format!("invalid CA certificate in {}: {e}", path.display())))
}
