use crate::adapters::tcp::Connector;
use crate::core::TlsSettings;
use crate::utils::error::{GelfError, Result};
use async_trait::async_trait;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{verify_tls12_signature, verify_tls13_signature, CryptoProvider};
use rustls::pki_types::{CertificateDer, PrivateKeyDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;

/// Opens TLS connections to a GELF TLS input.
pub struct TlsConnector {
    connector: tokio_rustls::TlsConnector,
}

impl TlsConnector {
    pub fn new(settings: &TlsSettings) -> Result<Self> {
        let config = client_config(settings)?;
        Ok(Self {
            connector: tokio_rustls::TlsConnector::from(Arc::new(config)),
        })
    }
}

#[async_trait]
impl Connector for TlsConnector {
    type Stream = TlsStream<TcpStream>;

    async fn connect(&self, host: &str, port: u16) -> Result<Self::Stream> {
        let server_name = ServerName::try_from(host.to_string()).map_err(|e| {
            GelfError::InvalidConfigValueError {
                field: "host".to_string(),
                value: host.to_string(),
                reason: format!("not a valid TLS server name: {}", e),
            }
        })?;
        let tcp = TcpStream::connect((host, port)).await?;
        tcp.set_nodelay(true)?;
        Ok(self.connector.connect(server_name, tcp).await?)
    }

    fn name(&self) -> &'static str {
        "tls"
    }
}

pub fn check_settings(settings: &TlsSettings) -> Result<()> {
    if settings.validate && settings.ca_certs.is_none() {
        return Err(GelfError::config("CA bundle file path must be specified"));
    }
    if settings.keyfile.is_some() && settings.certfile.is_none() {
        return Err(GelfError::config("certfile must be specified"));
    }
    Ok(())
}

pub fn client_config(settings: &TlsSettings) -> Result<ClientConfig> {
    check_settings(settings)?;

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let builder =
        ClientConfig::builder_with_provider(provider.clone()).with_safe_default_protocol_versions()?;

    let builder = if settings.validate {
        let mut roots = RootCertStore::empty();
        // check_settings 已確認 ca_certs 存在
        if let Some(ca_certs) = &settings.ca_certs {
            for cert in load_certs(ca_certs)? {
                roots.add(cert)?;
            }
        }
        builder.with_root_certificates(roots)
    } else {
        builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyServerCert { provider }))
    };

    let config = match &settings.certfile {
        Some(certfile) => {
            // 私鑰可與憑證放在同一個檔案
            let keyfile = settings.keyfile.as_deref().unwrap_or(certfile);
            builder.with_client_auth_cert(load_certs(certfile)?, load_key(keyfile)?)?
        }
        None => builder.with_no_client_auth(),
    };
    Ok(config)
}

fn load_certs(path: &str) -> Result<Vec<CertificateDer<'static>>> {
    let mut reader = BufReader::new(File::open(path)?);
    let certs = rustls_pemfile::certs(&mut reader).collect::<std::io::Result<Vec<_>>>()?;
    if certs.is_empty() {
        return Err(GelfError::InvalidConfigValueError {
            field: "certificate".to_string(),
            value: path.to_string(),
            reason: "no PEM certificates found".to_string(),
        });
    }
    Ok(certs)
}

fn load_key(path: &str) -> Result<PrivateKeyDer<'static>> {
    let mut reader = BufReader::new(File::open(path)?);
    rustls_pemfile::private_key(&mut reader)?.ok_or_else(|| GelfError::InvalidConfigValueError {
        field: "keyfile".to_string(),
        value: path.to_string(),
        reason: "no PEM private key found".to_string(),
    })
}

/// Skips certificate validation but still checks handshake signatures.
#[derive(Debug)]
struct AcceptAnyServerCert {
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for AcceptAnyServerCert {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
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
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
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
