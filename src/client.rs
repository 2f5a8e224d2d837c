use std::path::Path;

use anyhow::{Context, Result};
use reqwest::{Certificate, Client};
use tracing::{info, warn};

/// Builds the client used for every poll.
///
/// Without a CA path the built-in trust roots are used. With one, only the certificates found in the
/// PEM bundle are trusted. An unreadable file is an error, but a bundle without any usable PEM block
/// is not: the client is still built, it just trusts nothing.
pub fn build_client(ca_path: Option<&Path>) -> Result<Client> {
    let builder = Client::builder();
    let builder = match ca_path {
        None => builder,
        Some(path) => {
            let pem = std::fs::read(path).with_context(|| {
                format!("Failed to read CA certificate file {}", path.display())
            })?;
            let pool = load_trust_pool(&pem);
            info!(
                "Loaded {} CA certificate(s) from {}",
                pool.len(),
                path.display()
            );

            pool.into_iter()
                .fold(builder.tls_built_in_root_certs(false), |builder, cert| {
                    builder.add_root_certificate(cert)
                })
        }
    };

    builder.build().context("Failed to build HTTP client")
}

/// Parses every certificate in a PEM bundle. Malformed content yields an empty pool instead of an error.
pub fn load_trust_pool(pem: &[u8]) -> Vec<Certificate> {
    match Certificate::from_pem_bundle(pem) {
        Ok(certs) => certs,
        Err(err) => {
            warn!("Ignoring malformed CA bundle: {:#}", anyhow::Error::from(err));
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use rcgen::{BasicConstraints, CertificateParams, IsCa, KeyPair};
    use tempfile::NamedTempFile;

    use super::*;

    fn ca_pem() -> String {
        let mut params = CertificateParams::new(Vec::<String>::new()).unwrap();
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        let key = KeyPair::generate().unwrap();
        params.self_signed(&key).unwrap().pem()
    }

    fn write_temp(content: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content).unwrap();
        file
    }

    #[test]
    fn default_trust_without_path() {
        assert!(build_client(None).is_ok());
    }

    #[test]
    fn unreadable_ca_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.pem");

        let err = build_client(Some(&missing)).unwrap_err();
        assert!(err.to_string().contains("Failed to read CA certificate file"));
    }

    #[test]
    fn bundle_without_pem_blocks_is_accepted() {
        assert!(load_trust_pool(b"this is not a certificate\n").is_empty());
        assert!(load_trust_pool(b"").is_empty());

        let file = write_temp(b"this is not a certificate\n");
        assert!(build_client(Some(file.path())).is_ok());
    }

    #[test]
    fn every_certificate_in_bundle_is_loaded() {
        let bundle = format!("{}{}", ca_pem(), ca_pem());
        assert_eq!(load_trust_pool(bundle.as_bytes()).len(), 2);

        let file = write_temp(bundle.as_bytes());
        assert!(build_client(Some(file.path())).is_ok());
    }
}
