//! Error types for the renewal trigger.
//!
//! Every step of a job run maps its failures onto one variant of
//! [`RenewalError`]. The job never recovers locally: the first error aborts
//! the run and is returned to whoever invoked it.

use thiserror::Error;

/// Result type alias using [`RenewalError`].
pub type Result<T> = std::result::Result<T, RenewalError>;

/// Errors that can occur during a renewal run.
#[derive(Debug, Error)]
pub enum RenewalError {
    /// The vault could not be reached or returned an unusable response.
    #[error("Vault unavailable: {0}")]
    VaultUnavailable(String),

    /// The vault does not hold the requested certificate.
    #[error("Certificate not found: {cert_id}")]
    CertificateNotFound {
        /// Certificate identifier that was requested.
        cert_id: String,
    },

    /// The vault refused to issue a new certificate.
    #[error("Renewal rejected for {cert_id}: {reason}")]
    RenewalRejected {
        /// Certificate identifier.
        cert_id: String,
        /// Reason reported by the vault.
        reason: String,
    },

    /// The application registration rejected the credential update.
    #[error("Registration update failed for {app_id} (status {status}): {message}")]
    RegistrationUpdateFailed {
        /// Application registration identifier.
        app_id: String,
        /// HTTP status code, or 0 when no response was received.
        status: u16,
        /// Message returned by the identity provider.
        message: String,
    },

    /// Certificate bytes could not be converted to or from Base64.
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// The vault holds a renewed certificate that the registration does not.
    ///
    /// Returned when the registration update fails after a successful
    /// renewal. The next run sees a fresh certificate and takes no action,
    /// so the certificate identified by `thumbprint` must be published
    /// manually.
    #[error(
        "Certificate {cert_id} renewed (thumbprint {thumbprint}) but registration {app_id} was not updated: {source}"
    )]
    RegistrationOutOfSync {
        /// Certificate identifier.
        cert_id: String,
        /// Application registration identifier.
        app_id: String,
        /// SHA-256 thumbprint of the renewed certificate.
        thumbprint: String,
        /// The registration failure.
        #[source]
        source: Box<RenewalError>,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Operational error outside the renewal steps (scheduler lifecycle).
    #[error("Operational error: {0}")]
    Operational(String),

    /// HTTP client construction error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RenewalError {
    /// Create a vault unavailable error with the given message.
    pub fn vault_unavailable(msg: impl Into<String>) -> Self {
        Self::VaultUnavailable(msg.into())
    }

    /// Create a certificate not found error.
    pub fn certificate_not_found(cert_id: impl Into<String>) -> Self {
        Self::CertificateNotFound {
            cert_id: cert_id.into(),
        }
    }

    /// Create a renewal rejected error.
    pub fn renewal_rejected(cert_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::RenewalRejected {
            cert_id: cert_id.into(),
            reason: reason.into(),
        }
    }

    /// Create a registration update error.
    pub fn registration_update_failed(
        app_id: impl Into<String>,
        status: u16,
        message: impl Into<String>,
    ) -> Self {
        Self::RegistrationUpdateFailed {
            app_id: app_id.into(),
            status,
            message: message.into(),
        }
    }

    /// Create an encoding error with the given message.
    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::Encoding(msg.into())
    }

    /// Create a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an operational error with the given message.
    pub fn operational(msg: impl Into<String>) -> Self {
        Self::Operational(msg.into())
    }

    /// Returns true if the vault holds a certificate that was renewed during
    /// the failed run.
    pub fn is_partial_renewal(&self) -> bool {
        matches!(self, Self::RegistrationOutOfSync { .. })
    }
}
