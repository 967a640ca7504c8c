//! Channel configuration: base address, auth mode, and per-attempt timeout.

use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::domain::Method;

/// Which credential mode a channel uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    /// Never sends an `Authorization` header.
    Public,
    /// Sends `Authorization: Bearer <token>` read from the credential store at
    /// send time.
    Authenticated,
}

impl ChannelKind {
    /// Lower-case label for logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Authenticated => "authenticated",
        }
    }
}

/// Errors raised while building channel configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelConfigError {
    /// The base address cannot carry a path (e.g. `mailto:`).
    #[error("channel base address `{url}` cannot carry a request path")]
    NotABase {
        /// Offending address.
        url: String,
    },
    /// The base address is not HTTP(S).
    #[error("channel base address `{url}` must use http or https")]
    UnsupportedScheme {
        /// Offending address.
        url: String,
    },
}

/// Immutable channel configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    kind: ChannelKind,
    base_url: Url,
    timeout: Duration,
    default_headers: Vec<(String, String)>,
}

impl Channel {
    /// Build a channel, rejecting base addresses that cannot carry a path.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelConfigError`] for non-HTTP or cannot-be-a-base URLs.
    pub fn new(
        kind: ChannelKind,
        base_url: Url,
        timeout: Duration,
    ) -> Result<Self, ChannelConfigError> {
        validate_base(&base_url)?;
        Ok(Self {
            kind,
            base_url,
            timeout,
            default_headers: vec![("Accept".to_owned(), "application/json".to_owned())],
        })
    }

    /// Channel credential mode.
    pub fn kind(&self) -> ChannelKind {
        self.kind
    }

    /// Base address.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Timeout applied to each individual attempt.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Headers sent on every request.
    pub fn default_headers(&self) -> &[(String, String)] {
        &self.default_headers
    }

    /// Resolve `path` and `query` against this channel's base address.
    pub fn endpoint(&self, path: &str, query: &[(String, String)]) -> Url {
        resolve_endpoint(&self.base_url, path, query)
    }
}

/// The two process-lifetime channels plus the direct upload origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSet {
    public: Channel,
    authenticated: Channel,
    upload_origin: Url,
}

impl ChannelSet {
    /// Assemble the channel set.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelConfigError`] when the upload origin is unusable.
    pub fn new(
        public: Channel,
        authenticated: Channel,
        upload_origin: Url,
    ) -> Result<Self, ChannelConfigError> {
        validate_base(&upload_origin)?;
        Ok(Self {
            public,
            authenticated,
            upload_origin,
        })
    }

    /// Channel for the given mode.
    pub fn channel(&self, kind: ChannelKind) -> &Channel {
        match kind {
            ChannelKind::Public => &self.public,
            ChannelKind::Authenticated => &self.authenticated,
        }
    }

    /// Origin that bypasses the CDN; the only origin accepting uploads.
    pub fn upload_origin(&self) -> &Url {
        &self.upload_origin
    }

    /// Base address for a `method` request on the `kind` channel.
    ///
    /// The CDN in front of the public channel only serves reads, so public
    /// writes resolve against the direct origin. They still carry no
    /// `Authorization` header.
    pub fn base_for(&self, kind: ChannelKind, method: Method) -> &Url {
        match kind {
            ChannelKind::Public if !method.is_read() => &self.upload_origin,
            _ => self.channel(kind).base_url(),
        }
    }
}

fn validate_base(url: &Url) -> Result<(), ChannelConfigError> {
    if url.cannot_be_a_base() {
        return Err(ChannelConfigError::NotABase {
            url: url.to_string(),
        });
    }
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ChannelConfigError::UnsupportedScheme {
            url: url.to_string(),
        });
    }
    Ok(())
}

/// Resolve `path` and `query` against `base`, keeping any path prefix.
pub(crate) fn resolve_endpoint(base: &Url, path: &str, query: &[(String, String)]) -> Url {
    let mut url = base.clone();
    if let Ok(mut segments) = url.path_segments_mut() {
        segments
            .pop_if_empty()
            .extend(path.split('/').filter(|segment| !segment.is_empty()));
    }
    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query);
    }
    url
}

#[cfg(test)]
mod tests {
    //! Endpoint resolution coverage.

    use super::*;
    use rstest::rstest;

    fn channel(base: &str) -> Channel {
        let url = Url::parse(base).expect("valid url");
        Channel::new(ChannelKind::Public, url, Duration::from_secs(5)).expect("valid channel")
    }

    #[rstest]
    #[case::bare_host(
        "https://api.example.test",
        "/activities/42",
        "https://api.example.test/activities/42"
    )]
    #[case::versioned_prefix(
        "https://api.example.test/v1/",
        "/activities/42",
        "https://api.example.test/v1/activities/42"
    )]
    #[case::prefix_without_slash(
        "https://api.example.test/v1",
        "stages/7",
        "https://api.example.test/v1/stages/7"
    )]
    fn joins_paths_onto_the_base_prefix(
        #[case] base: &str,
        #[case] path: &str,
        #[case] expected: &str,
    ) {
        assert_eq!(channel(base).endpoint(path, &[]).as_str(), expected);
    }

    #[rstest]
    fn percent_encodes_path_segments_and_query_values() {
        let url = channel("https://api.example.test/").endpoint(
            "/activities/a b",
            &[("search".to_owned(), "sea & sky".to_owned())],
        );
        assert_eq!(
            url.as_str(),
            "https://api.example.test/activities/a%20b?search=sea+%26+sky"
        );
    }

    fn channel_set() -> ChannelSet {
        let url = |raw: &str| Url::parse(raw).expect("valid url");
        let public = Channel::new(
            ChannelKind::Public,
            url("https://cdn.example.test/"),
            Duration::from_secs(5),
        )
        .expect("public channel");
        let authenticated = Channel::new(
            ChannelKind::Authenticated,
            url("https://api.example.test/"),
            Duration::from_secs(5),
        )
        .expect("authenticated channel");
        ChannelSet::new(public, authenticated, url("https://origin.example.test/"))
            .expect("channel set")
    }

    #[rstest]
    #[case::public_read(ChannelKind::Public, Method::Get, "cdn.example.test")]
    #[case::public_post(ChannelKind::Public, Method::Post, "origin.example.test")]
    #[case::public_put(ChannelKind::Public, Method::Put, "origin.example.test")]
    #[case::public_delete(ChannelKind::Public, Method::Delete, "origin.example.test")]
    #[case::authenticated_read(ChannelKind::Authenticated, Method::Get, "api.example.test")]
    #[case::authenticated_write(ChannelKind::Authenticated, Method::Post, "api.example.test")]
    fn public_writes_bypass_the_cdn(
        #[case] kind: ChannelKind,
        #[case] method: Method,
        #[case] host: &str,
    ) {
        assert_eq!(channel_set().base_for(kind, method).host_str(), Some(host));
    }

    #[rstest]
    #[case::mailto("mailto:ops@example.test")]
    #[case::ftp("ftp://files.example.test/")]
    fn rejects_unusable_base_addresses(#[case] base: &str) {
        let url = Url::parse(base).expect("parseable url");
        assert!(Channel::new(ChannelKind::Public, url, Duration::from_secs(1)).is_err());
    }
}
