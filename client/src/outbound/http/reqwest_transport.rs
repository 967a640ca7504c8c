//! Reqwest-backed channel transport.
//!
//! This adapter owns wire details only: method and header translation, body
//! encoding, the per-attempt deadline, and mapping reqwest failures onto
//! [`TransportError`]. Status codes are returned untouched.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::multipart::{Form, Part};

use crate::domain::ports::{
    ChannelTransport, OutboundRequest, TransportError, TransportResponse,
};
use crate::domain::{Method, RequestBody, UploadForm, UploadPart};

/// Channel transport performing one reqwest exchange per call.
///
/// One client, and therefore one connection pool, serves both channels.
#[derive(Debug, Clone)]
pub struct ReqwestChannelTransport {
    client: Client,
}

impl ReqwestChannelTransport {
    /// Build a transport that identifies itself with `user_agent`.
    /// ```rust,ignore
    /// let transport = ReqwestChannelTransport::new("client/0.1.0")?;
    /// ```
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(user_agent: &str) -> Result<Self, reqwest::Error> {
        let client = Client::builder().user_agent(user_agent).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ChannelTransport for ReqwestChannelTransport {
    async fn send(&self, request: &OutboundRequest) -> Result<TransportResponse, TransportError> {
        let mut builder = self
            .client
            .request(map_method(request.method), request.url.clone())
            .timeout(request.timeout);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => {
                let bytes = serde_json::to_vec(value).map_err(|error| {
                    TransportError::invalid_request(format!("JSON body did not encode: {error}"))
                })?;
                builder.body(bytes)
            }
            RequestBody::SensitiveJson(secret) => builder.body(secret.expose().to_vec()),
            RequestBody::Multipart(form) => builder.multipart(build_form(form)?),
        };

        let response = builder.send().await.map_err(map_transport_error)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(map_transport_error)?;
        Ok(TransportResponse::new(status, body.to_vec()))
    }
}

fn map_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

fn build_form(form: &UploadForm) -> Result<Form, TransportError> {
    form.parts()
        .iter()
        .try_fold(Form::new(), |multipart, part| match part {
            UploadPart::Text { name, value } => Ok(multipart.text(name.clone(), value.clone())),
            UploadPart::File {
                name,
                file_name,
                content_type,
                bytes,
            } => {
                let file = Part::bytes(bytes.clone())
                    .file_name(file_name.clone())
                    .mime_str(content_type)
                    .map_err(|error| {
                        TransportError::invalid_request(format!(
                            "content type `{content_type}` is invalid: {error}"
                        ))
                    })?;
                Ok(multipart.part(name.clone(), file))
            }
        })
}

fn map_transport_error(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::timeout(error.to_string())
    } else if error.is_connect() {
        TransportError::connect(error.to_string())
    } else if error.is_builder() {
        TransportError::invalid_request(error.to_string())
    } else {
        TransportError::network(error.to_string())
    }
}
