//! Request descriptors handed to the access layer by resource methods.
//!
//! A descriptor is channel-agnostic: it names the method, path, and body,
//! plus the two routing flags that decide which channel(s) may carry it.

use std::fmt;

use serde::Serialize;
use serde_json::Value;
use zeroize::Zeroizing;

/// HTTP method of a request descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `PATCH`
    Patch,
    /// `DELETE`
    Delete,
}

impl Method {
    /// Reads follow the public-first shape; everything else is a write.
    pub const fn is_read(self) -> bool {
        matches!(self, Self::Get)
    }

    /// Upper-case wire name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

/// One part of a multipart upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadPart {
    /// Plain text form field.
    Text {
        /// Field name.
        name: String,
        /// Field value.
        value: String,
    },
    /// Binary file field.
    File {
        /// Field name.
        name: String,
        /// File name reported to the server.
        file_name: String,
        /// MIME type of the file contents.
        content_type: String,
        /// Raw file contents.
        bytes: Vec<u8>,
    },
}

/// Multipart form body; the transport assigns the boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadForm {
    parts: Vec<UploadPart>,
}

impl UploadForm {
    /// Start an empty form.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a text field.
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(UploadPart::Text {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Append a file field.
    pub fn file(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        self.parts.push(UploadPart::File {
            name: name.into(),
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        });
        self
    }

    /// Parts in insertion order.
    pub fn parts(&self) -> &[UploadPart] {
        &self.parts
    }
}

/// Pre-encoded JSON holding a secret, wiped from memory on drop.
///
/// Every clone owns its own buffer and wipes it independently. Copies made
/// by the HTTP stack after the bytes leave this type are outside its reach.
#[derive(Clone, PartialEq, Eq)]
pub struct SensitiveJson(Zeroizing<Vec<u8>>);

impl SensitiveJson {
    /// Encode `value` straight into a wiped buffer.
    ///
    /// # Errors
    ///
    /// Returns the encoder error when `value` cannot be represented as JSON.
    pub fn encode<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        let mut buffer = Zeroizing::new(Vec::new());
        serde_json::to_writer(&mut *buffer, value)?;
        Ok(Self(buffer))
    }

    /// Encoded bytes.
    pub fn expose(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SensitiveJson {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SensitiveJson(<{} bytes redacted>)", self.0.len())
    }
}

/// Request payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    /// No body.
    #[default]
    Empty,
    /// JSON document sent with `Content-Type: application/json`.
    Json(Value),
    /// Secret-bearing JSON, also sent as `application/json`.
    SensitiveJson(SensitiveJson),
    /// Multipart form sent without a client-chosen `Content-Type`.
    Multipart(UploadForm),
}

/// Channel-agnostic description of one logical call.
///
/// # Examples
/// ```
/// use client::domain::{Method, RequestDescriptor};
/// use serde_json::json;
///
/// let login = RequestDescriptor::post("/auth/login")
///     .with_json(json!({ "email": "a@example.com" }))
///     .pure_public();
/// assert_eq!(login.method(), Method::Post);
/// assert!(login.is_pure_public());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: RequestBody,
    pure_public: bool,
    public_first: bool,
}

impl RequestDescriptor {
    /// Describe a call with an empty body.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
            pure_public: false,
            public_first: false,
        }
    }

    /// Describe a `GET`.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    /// Describe a `POST`.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    /// Describe a `PUT`.
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    /// Describe a `PATCH`.
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::Patch, path)
    }

    /// Describe a `DELETE`.
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    /// Attach a JSON body.
    pub fn with_json(mut self, body: Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    /// Attach a pre-encoded JSON body carrying a secret.
    pub fn with_sensitive_json(mut self, body: SensitiveJson) -> Self {
        self.body = RequestBody::SensitiveJson(body);
        self
    }

    /// Attach a multipart body.
    pub fn with_form(mut self, form: UploadForm) -> Self {
        self.body = RequestBody::Multipart(form);
        self
    }

    /// Append a query parameter.
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    /// Mark the endpoint as pure-public: it never escalates to the
    /// authenticated channel, even on 401.
    pub fn pure_public(mut self) -> Self {
        self.pure_public = true;
        self
    }

    /// Route a write through the public-then-escalate flow used for reads.
    pub fn public_first(mut self) -> Self {
        self.public_first = true;
        self
    }

    /// HTTP method.
    pub fn method(&self) -> Method {
        self.method
    }

    /// Path relative to the channel base address.
    pub fn path(&self) -> &str {
        self.path.as_str()
    }

    /// Query parameters in insertion order.
    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    /// Request payload.
    pub fn body(&self) -> &RequestBody {
        &self.body
    }

    /// Whether the endpoint is pure-public.
    pub fn is_pure_public(&self) -> bool {
        self.pure_public
    }

    /// Whether a write opted into the public-first flow.
    pub fn is_public_first(&self) -> bool {
        self.public_first
    }

    /// `METHOD path` label used in logs and classified errors.
    pub fn endpoint_label(&self) -> String {
        format!("{} {}", self.method.as_str(), self.path)
    }
}
