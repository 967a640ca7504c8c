//! Access-layer configuration loaded via OrthoConfig.
//!
//! Values layer CLI over environment (`ACCESS_*`) over configuration file.
//! Every field is optional at load time; accessors supply defaults and
//! [`AccessSettings::into_parts`] validates the combination.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use camino::Utf8PathBuf;
use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::domain::ports::{ChannelTransport, CredentialStore, CredentialStoreError};
use crate::domain::{
    AccessLayer, AccessLayerPorts, BackoffJitter, Channel, ChannelConfigError, ChannelKind,
    ChannelSet, NoJitter, ProportionalJitter, RetryPolicies, RetryPolicy, RetryRuntime,
    TokioSleeper,
};
use crate::outbound::credentials::{InMemoryCredentialStore, VaultCredentialStore};
use crate::outbound::http::ReqwestChannelTransport;

const DEFAULT_TIMEOUT_MS: u64 = 15_000;
const DEFAULT_READ_RETRIES: u32 = 2;
const DEFAULT_WRITE_RETRIES: u32 = 3;
const DEFAULT_BASE_DELAY_MS: u64 = 1_000;
const DEFAULT_CREDENTIAL_KEY: &str = "session-token";
const DEFAULT_USER_AGENT: &str = concat!("client/", env!("CARGO_PKG_VERSION"));

/// Configuration values for the access layer.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "ACCESS")]
pub struct AccessSettings {
    /// Base address of the authenticated channel.
    pub api_base_url: Option<String>,
    /// CDN-fronted base address of the public channel.
    pub public_base_url: Option<String>,
    /// Direct backend origin used for uploads.
    pub upload_base_url: Option<String>,
    /// Per-attempt deadline on the public channel, in milliseconds.
    pub public_timeout_ms: Option<u64>,
    /// Per-attempt deadline on the authenticated channel, in milliseconds.
    pub authenticated_timeout_ms: Option<u64>,
    /// Retries after the first attempt for reads.
    pub read_max_retries: Option<u32>,
    /// Retries after the first attempt for writes.
    pub write_max_retries: Option<u32>,
    /// First backoff delay, in milliseconds; doubles per retry.
    pub retry_base_delay_ms: Option<u64>,
    /// Extra random delay as a fraction of each backoff, in `[0, 1]`.
    pub retry_jitter_ratio: Option<f64>,
    /// Directory persisting the credential; in-memory when absent.
    pub credential_dir: Option<PathBuf>,
    /// Vault key holding the credential.
    pub credential_key: Option<String>,
    /// `User-Agent` sent on every request.
    pub user_agent: Option<String>,
}

/// Errors raised while turning settings into a working layer.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// `api_base_url` was not provided.
    #[error("ACCESS_API_BASE_URL must be set")]
    MissingApiBaseUrl,
    /// A URL failed to parse.
    #[error("{field} is not a valid URL ({url}): {message}")]
    InvalidUrl {
        /// Setting name.
        field: &'static str,
        /// Offending value.
        url: String,
        /// Parser message.
        message: String,
    },
    /// A URL parsed but cannot serve as a channel base.
    #[error("{field} cannot be used as a base address: {source}")]
    Channel {
        /// Setting name.
        field: &'static str,
        /// Underlying channel error.
        #[source]
        source: ChannelConfigError,
    },
    /// A timeout of zero was configured.
    #[error("{field} must be greater than zero")]
    ZeroTimeout {
        /// Setting name.
        field: &'static str,
    },
    /// The jitter ratio is outside `[0, 1]`.
    #[error("retry_jitter_ratio must be between 0 and 1, got {ratio}")]
    InvalidJitterRatio {
        /// Offending value.
        ratio: f64,
    },
    /// The credential directory is not valid UTF-8.
    #[error("credential_dir must be valid UTF-8: {path}")]
    NonUtf8Path {
        /// Offending path, lossily rendered.
        path: String,
    },
    /// The credential store could not be opened.
    #[error(transparent)]
    Credentials(#[from] CredentialStoreError),
    /// The HTTP client could not be built.
    #[error("HTTP client could not be built: {message}")]
    Transport {
        /// Builder message.
        message: String,
    },
}

/// Validated domain pieces built from [`AccessSettings`].
pub struct AccessParts {
    /// Both channels plus the upload origin.
    pub channels: ChannelSet,
    /// Read and write retry budgets.
    pub policies: RetryPolicies,
    /// Sleeper and jitter for the retry engine.
    pub runtime: RetryRuntime,
}

impl AccessSettings {
    /// Vault key holding the credential.
    pub fn credential_key(&self) -> &str {
        self.credential_key
            .as_deref()
            .unwrap_or(DEFAULT_CREDENTIAL_KEY)
    }

    /// `User-Agent` header value.
    pub fn user_agent(&self) -> &str {
        self.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT)
    }

    /// Public channel deadline.
    pub fn public_timeout(&self) -> Duration {
        Duration::from_millis(self.public_timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS))
    }

    /// Authenticated channel deadline.
    pub fn authenticated_timeout(&self) -> Duration {
        Duration::from_millis(self.authenticated_timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS))
    }

    /// Retry budgets with defaults applied.
    pub fn retry_policies(&self) -> RetryPolicies {
        let base_delay =
            Duration::from_millis(self.retry_base_delay_ms.unwrap_or(DEFAULT_BASE_DELAY_MS));
        RetryPolicies {
            reads: RetryPolicy {
                max_retries: self.read_max_retries.unwrap_or(DEFAULT_READ_RETRIES),
                base_delay,
            },
            writes: RetryPolicy {
                max_retries: self.write_max_retries.unwrap_or(DEFAULT_WRITE_RETRIES),
                base_delay,
            },
        }
    }

    /// Configured jitter ratio; `0.0` disables jitter.
    pub fn retry_jitter_ratio(&self) -> f64 {
        self.retry_jitter_ratio.unwrap_or(0.0)
    }

    /// Credential directory as a UTF-8 path, when configured.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::NonUtf8Path`] for non-UTF-8 paths.
    pub fn credential_dir(&self) -> Result<Option<Utf8PathBuf>, SettingsError> {
        self.credential_dir
            .clone()
            .map(|path| {
                Utf8PathBuf::from_path_buf(path).map_err(|path| SettingsError::NonUtf8Path {
                    path: path.to_string_lossy().into_owned(),
                })
            })
            .transpose()
    }

    /// Validate the settings and build channels, policies, and runtime.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] for missing or malformed values.
    pub fn into_parts(&self) -> Result<AccessParts, SettingsError> {
        let api = self
            .api_base_url
            .as_deref()
            .ok_or(SettingsError::MissingApiBaseUrl)?;
        let api_url = parse_url("api_base_url", api)?;
        let public_url = match self.public_base_url.as_deref() {
            Some(raw) => parse_url("public_base_url", raw)?,
            None => api_url.clone(),
        };
        let upload_url = match self.upload_base_url.as_deref() {
            Some(raw) => parse_url("upload_base_url", raw)?,
            None => api_url.clone(),
        };

        let public = build_channel(
            "public_base_url",
            ChannelKind::Public,
            public_url,
            nonzero("public_timeout_ms", self.public_timeout())?,
        )?;
        let authenticated = build_channel(
            "api_base_url",
            ChannelKind::Authenticated,
            api_url,
            nonzero("authenticated_timeout_ms", self.authenticated_timeout())?,
        )?;
        let channels = ChannelSet::new(public, authenticated, upload_url).map_err(|source| {
            SettingsError::Channel {
                field: "upload_base_url",
                source,
            }
        })?;

        Ok(AccessParts {
            channels,
            policies: self.retry_policies(),
            runtime: RetryRuntime {
                sleeper: Arc::new(TokioSleeper),
                jitter: self.jitter()?,
            },
        })
    }

    /// Open the configured credential store.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] when the vault directory cannot be used.
    pub fn credential_store(&self) -> Result<Arc<dyn CredentialStore>, SettingsError> {
        match self.credential_dir()? {
            Some(dir) => Ok(Arc::new(VaultCredentialStore::open(
                &dir,
                self.credential_key(),
            )?)),
            None => Ok(Arc::new(InMemoryCredentialStore::default())),
        }
    }

    /// Build the reqwest transport.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Transport`] when the client cannot be built.
    pub fn transport(&self) -> Result<Arc<dyn ChannelTransport>, SettingsError> {
        let transport =
            ReqwestChannelTransport::new(self.user_agent()).map_err(|error| {
                SettingsError::Transport {
                    message: error.to_string(),
                }
            })?;
        Ok(Arc::new(transport))
    }

    /// Wire a production access layer from these settings.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] when any part fails validation.
    pub fn build_layer(&self) -> Result<AccessLayer, SettingsError> {
        let parts = self.into_parts()?;
        let ports = AccessLayerPorts::new(self.credential_store()?, self.transport()?);
        Ok(AccessLayer::with_runtime(
            parts.channels,
            ports,
            parts.policies,
            parts.runtime,
        ))
    }

    fn jitter(&self) -> Result<Arc<dyn BackoffJitter>, SettingsError> {
        let ratio = self.retry_jitter_ratio();
        if !ratio.is_finite() || !(0.0..=1.0).contains(&ratio) {
            return Err(SettingsError::InvalidJitterRatio { ratio });
        }
        if ratio == 0.0 {
            Ok(Arc::new(NoJitter))
        } else {
            Ok(Arc::new(ProportionalJitter::new(ratio)))
        }
    }
}

fn parse_url(field: &'static str, raw: &str) -> Result<Url, SettingsError> {
    Url::parse(raw).map_err(|error| SettingsError::InvalidUrl {
        field,
        url: raw.to_owned(),
        message: error.to_string(),
    })
}

fn build_channel(
    field: &'static str,
    kind: ChannelKind,
    base: Url,
    timeout: Duration,
) -> Result<Channel, SettingsError> {
    Channel::new(kind, base, timeout).map_err(|source| SettingsError::Channel { field, source })
}

fn nonzero(field: &'static str, timeout: Duration) -> Result<Duration, SettingsError> {
    if timeout.is_zero() {
        return Err(SettingsError::ZeroTimeout { field });
    }
    Ok(timeout)
}

#[cfg(test)]
mod tests {
    //! Unit tests for access-layer configuration parsing.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const VARS: [&str; 12] = [
        "ACCESS_API_BASE_URL",
        "ACCESS_PUBLIC_BASE_URL",
        "ACCESS_UPLOAD_BASE_URL",
        "ACCESS_PUBLIC_TIMEOUT_MS",
        "ACCESS_AUTHENTICATED_TIMEOUT_MS",
        "ACCESS_READ_MAX_RETRIES",
        "ACCESS_WRITE_MAX_RETRIES",
        "ACCESS_RETRY_BASE_DELAY_MS",
        "ACCESS_RETRY_JITTER_RATIO",
        "ACCESS_CREDENTIAL_DIR",
        "ACCESS_CREDENTIAL_KEY",
        "ACCESS_USER_AGENT",
    ];

    fn env_with(overrides: &[(&str, &str)]) -> Vec<(&'static str, Option<String>)> {
        VARS.iter()
            .map(|name| {
                let value = overrides
                    .iter()
                    .find(|(key, _)| key == name)
                    .map(|(_, value)| (*value).to_owned());
                (*name, value)
            })
            .collect()
    }

    fn load_from_empty_args() -> AccessSettings {
        AccessSettings::load_from_iter([OsString::from("client")]).expect("config should load")
    }

    fn blank() -> AccessSettings {
        AccessSettings {
            api_base_url: None,
            public_base_url: None,
            upload_base_url: None,
            public_timeout_ms: None,
            authenticated_timeout_ms: None,
            read_max_retries: None,
            write_max_retries: None,
            retry_base_delay_ms: None,
            retry_jitter_ratio: None,
            credential_dir: None,
            credential_key: None,
            user_agent: None,
        }
    }

    fn settings(api: &str) -> AccessSettings {
        AccessSettings {
            api_base_url: Some(api.to_owned()),
            ..blank()
        }
    }

    #[rstest]
    fn default_values_are_used_when_missing() {
        let _guard = lock_env(env_with(&[("ACCESS_API_BASE_URL", "https://api.example.test/")]));

        let settings = load_from_empty_args();
        assert_eq!(settings.credential_key(), DEFAULT_CREDENTIAL_KEY);
        assert_eq!(settings.user_agent(), DEFAULT_USER_AGENT);
        assert_eq!(settings.public_timeout(), Duration::from_secs(15));
        assert_eq!(settings.retry_policies(), RetryPolicies::default());
        assert!(settings.credential_dir().expect("utf8").is_none());

        let parts = settings.into_parts().expect("parts should build");
        let expected = Url::parse("https://api.example.test/").expect("url");
        assert_eq!(parts.channels.upload_origin(), &expected);
        assert_eq!(
            parts.channels.channel(ChannelKind::Public).base_url(),
            &expected
        );
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env(env_with(&[
            ("ACCESS_API_BASE_URL", "https://api.example.test/"),
            ("ACCESS_PUBLIC_BASE_URL", "https://cdn.example.test/"),
            ("ACCESS_UPLOAD_BASE_URL", "https://origin.example.test/"),
            ("ACCESS_READ_MAX_RETRIES", "4"),
            ("ACCESS_RETRY_BASE_DELAY_MS", "250"),
            ("ACCESS_CREDENTIAL_KEY", "probe-token"),
        ]));

        let settings = load_from_empty_args();
        assert_eq!(settings.credential_key(), "probe-token");
        let policies = settings.retry_policies();
        assert_eq!(policies.reads.max_retries, 4);
        assert_eq!(policies.writes.max_retries, DEFAULT_WRITE_RETRIES);
        assert_eq!(policies.reads.base_delay, Duration::from_millis(250));

        let parts = settings.into_parts().expect("parts should build");
        assert_eq!(
            parts.channels.channel(ChannelKind::Public).base_url().as_str(),
            "https://cdn.example.test/"
        );
        assert_eq!(
            parts.channels.upload_origin().as_str(),
            "https://origin.example.test/"
        );
    }

    #[rstest]
    fn missing_api_base_url_is_rejected() {
        let error = blank()
            .into_parts()
            .err()
            .expect("missing url should fail");
        assert!(matches!(error, SettingsError::MissingApiBaseUrl));
    }

    #[rstest]
    #[case::unparseable("not a url")]
    #[case::wrong_scheme("ftp://files.example.test/")]
    fn unusable_base_urls_are_rejected(#[case] api: &str) {
        let error = settings(api).into_parts().err().expect("url should fail");
        assert!(matches!(
            error,
            SettingsError::InvalidUrl { .. } | SettingsError::Channel { .. }
        ));
    }

    #[rstest]
    #[case(-0.1)]
    #[case(1.5)]
    #[case(f64::NAN)]
    fn out_of_range_jitter_is_rejected(#[case] ratio: f64) {
        let mut settings = settings("https://api.example.test/");
        settings.retry_jitter_ratio = Some(ratio);
        let error = settings.into_parts().err().expect("ratio should fail");
        assert!(matches!(error, SettingsError::InvalidJitterRatio { .. }));
    }

    #[rstest]
    fn zero_timeout_is_rejected() {
        let mut settings = settings("https://api.example.test/");
        settings.authenticated_timeout_ms = Some(0);
        let error = settings.into_parts().err().expect("timeout should fail");
        assert!(matches!(
            error,
            SettingsError::ZeroTimeout {
                field: "authenticated_timeout_ms"
            }
        ));
    }

    #[rstest]
    fn credential_dir_selects_the_vault_store() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut settings = settings("https://api.example.test/");
        settings.credential_dir = Some(temp.path().join("vault"));
        let store = settings.credential_store().expect("store opens");
        assert!(store.get().is_none());
        assert!(temp.path().join("vault").is_dir());
    }
}
