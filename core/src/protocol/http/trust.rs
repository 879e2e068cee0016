/*
 * trust.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Courier, a fluent HTTP request library.
 *
 * Courier is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Courier is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Courier.  If not, see <http://www.gnu.org/licenses/>.
 */

//! Server certificate trust for secure requests.
//!
//! `TlsOptions` combines a trust source with an optional hostname relaxation and turns
//! them into a rustls `ClientConfig`. The relaxed verifiers still check handshake
//! signatures; they only skip chain or name validation.

use std::fmt;
use std::sync::Arc;

use tokio_rustls::rustls::client::danger::{
    HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier,
};
use tokio_rustls::rustls::client::WebPkiServerVerifier;
use tokio_rustls::rustls::crypto::{verify_tls12_signature, verify_tls13_signature, CryptoProvider};
use tokio_rustls::rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use tokio_rustls::rustls::{
    CertificateError, ClientConfig, DigitallySignedStruct, Error, RootCertStore, SignatureScheme,
};

use crate::error::{RequestError, Result};
use crate::net;

/// Where server certificates are validated against.
#[derive(Clone, Default)]
pub enum Trust {
    /// Native roots, or the bundled Mozilla roots when none are available.
    #[default]
    Platform,
    /// No chain validation at all.
    AcceptAll,
    /// Caller-supplied trust anchors.
    Roots(RootCertStore),
    /// Caller-supplied verifier.
    Verifier(Arc<dyn ServerCertVerifier>),
}

impl fmt::Debug for Trust {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trust::Platform => f.write_str("Platform"),
            Trust::AcceptAll => f.write_str("AcceptAll"),
            Trust::Roots(roots) => write!(f, "Roots({} anchors)", roots.len()),
            Trust::Verifier(v) => f.debug_tuple("Verifier").field(v).finish(),
        }
    }
}

/// TLS settings of one request.
#[derive(Debug, Clone, Default)]
pub struct TlsOptions {
    pub trust: Trust,
    /// Accept certificates whose names do not match the requested host.
    pub any_host: bool,
}

impl TlsOptions {
    /// Build a client config for these options, offering only HTTP/1.1 via ALPN.
    pub fn client_config(&self) -> Result<Arc<ClientConfig>> {
        let provider = net::crypto_provider();
        let verifier: Arc<dyn ServerCertVerifier> = match &self.trust {
            Trust::Platform => webpki_verifier(net::build_root_store(), &provider)?,
            Trust::AcceptAll => Arc::new(AcceptAllVerifier::new(provider.clone())),
            Trust::Roots(roots) => {
                if roots.is_empty() {
                    return Err(RequestError::security("trust root store is empty"));
                }
                webpki_verifier(roots.clone(), &provider)?
            }
            Trust::Verifier(v) => v.clone(),
        };
        let verifier: Arc<dyn ServerCertVerifier> = if self.any_host {
            Arc::new(AnyHostVerifier::new(verifier))
        } else {
            verifier
        };
        let mut config = ClientConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()
            .map_err(|e| RequestError::security(e.to_string()))?
            .dangerous()
            .with_custom_certificate_verifier(verifier)
            .with_no_client_auth();
        config.alpn_protocols = vec![net::ALPN_HTTP1.to_vec()];
        Ok(Arc::new(config))
    }
}

fn webpki_verifier(
    roots: RootCertStore,
    provider: &Arc<CryptoProvider>,
) -> Result<Arc<dyn ServerCertVerifier>> {
    let verifier: Arc<dyn ServerCertVerifier> = WebPkiServerVerifier::builder_with_provider(Arc::new(roots), provider.clone())
        .build()
        .map_err(|e| RequestError::security(e.to_string()))?;
    Ok(verifier)
}

/// Accepts every certificate chain for every server name.
#[derive(Debug)]
pub struct AcceptAllVerifier {
    provider: Arc<CryptoProvider>,
}

impl AcceptAllVerifier {
    pub fn new(provider: Arc<CryptoProvider>) -> Self {
        Self { provider }
    }
}

impl ServerCertVerifier for AcceptAllVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, Error> {
        verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, Error> {
        verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}

/// Delegates to another verifier but ignores server name mismatches.
#[derive(Debug)]
pub struct AnyHostVerifier {
    inner: Arc<dyn ServerCertVerifier>,
}

impl AnyHostVerifier {
    pub fn new(inner: Arc<dyn ServerCertVerifier>) -> Self {
        Self { inner }
    }
}

fn is_name_mismatch(err: &Error) -> bool {
    matches!(
        err,
        Error::InvalidCertificate(
            CertificateError::NotValidForName | CertificateError::NotValidForNameContext { .. }
        )
    )
}

impl ServerCertVerifier for AnyHostVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        ocsp_response: &[u8],
        now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, Error> {
        match self
            .inner
            .verify_server_cert(end_entity, intermediates, server_name, ocsp_response, now)
        {
            Err(e) if is_name_mismatch(&e) => Ok(ServerCertVerified::assertion()),
            other => other,
        }
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, Error> {
        self.inner.verify_tls12_signature(message, cert, dss)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, Error> {
        self.inner.verify_tls13_signature(message, cert, dss)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.inner.supported_verify_schemes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Fails(Error);

    impl ServerCertVerifier for Fails {
        fn verify_server_cert(
            &self,
            _: &CertificateDer<'_>,
            _: &[CertificateDer<'_>],
            _: &ServerName<'_>,
            _: &[u8],
            _: UnixTime,
        ) -> std::result::Result<ServerCertVerified, Error> {
            Err(self.0.clone())
        }
        fn verify_tls12_signature(
            &self,
            _: &[u8],
            _: &CertificateDer<'_>,
            _: &DigitallySignedStruct,
        ) -> std::result::Result<HandshakeSignatureValid, Error> {
            Ok(HandshakeSignatureValid::assertion())
        }
        fn verify_tls13_signature(
            &self,
            _: &[u8],
            _: &CertificateDer<'_>,
            _: &DigitallySignedStruct,
        ) -> std::result::Result<HandshakeSignatureValid, Error> {
            Ok(HandshakeSignatureValid::assertion())
        }
        fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
            vec![SignatureScheme::ED25519]
        }
    }

    fn verify(v: &dyn ServerCertVerifier) -> std::result::Result<ServerCertVerified, Error> {
        let cert = CertificateDer::from(vec![0u8; 4]);
        let name = ServerName::try_from("example.com").unwrap();
        v.verify_server_cert(&cert, &[], &name, &[], UnixTime::now())
    }

    #[test]
    fn accept_all_accepts_garbage() {
        let v = AcceptAllVerifier::new(net::crypto_provider());
        assert!(verify(&v).is_ok());
        assert!(!v.supported_verify_schemes().is_empty());
    }

    #[test]
    fn any_host_forgives_only_name_mismatch() {
        let mismatch = AnyHostVerifier::new(Arc::new(Fails(Error::InvalidCertificate(
            CertificateError::NotValidForName,
        ))));
        assert!(verify(&mismatch).is_ok());

        let with_context = AnyHostVerifier::new(Arc::new(Fails(Error::InvalidCertificate(
            CertificateError::NotValidForNameContext {
                expected: ServerName::try_from("example.com").unwrap().to_owned(),
                presented: vec!["DnsName(\"other.example\")".to_string()],
            },
        ))));
        assert!(verify(&with_context).is_ok());

        let expired = AnyHostVerifier::new(Arc::new(Fails(Error::InvalidCertificate(
            CertificateError::Expired,
        ))));
        assert!(verify(&expired).is_err());
        assert_eq!(expired.supported_verify_schemes(), vec![SignatureScheme::ED25519]);
    }

    #[test]
    fn empty_roots_are_a_security_error() {
        let options = TlsOptions {
            trust: Trust::Roots(RootCertStore::empty()),
            any_host: false,
        };
        assert!(matches!(options.client_config(), Err(RequestError::Security(_))));
    }

    #[test]
    fn configs_offer_http1() {
        for trust in [Trust::Platform, Trust::AcceptAll] {
            let config = TlsOptions { trust, any_host: true }.client_config().unwrap();
            assert_eq!(config.alpn_protocols, vec![b"http/1.1".to_vec()]);
        }
    }
}
