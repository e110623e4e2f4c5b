//! HTTP transport
//!
//! reqwest backed [`Transport`]. Response bodies and multipart file parts
//! are streamed chunk by chunk so progress can be reported while bytes move.

use async_trait::async_trait;
use futures_util::StreamExt;
use log::{debug, info};
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, Url};

use crate::config::TransferSettings;
use crate::error::NetworkError;
use crate::transport::Transport;
use crate::transport::results::{
    FormData, Method, ProgressSender, TransportRequest, TransportResponse,
};

/// Basic-auth credentials attached to requests that ask for credentials
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: Option<String>,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: Option<String>) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }
}

/// HTTP client transport
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    credentials: Option<Credentials>,
    chunk_size: usize,
}

impl HttpTransport {
    /// Build a transport with timeouts and user agent taken from `settings`.
    pub fn new(settings: &TransferSettings) -> Result<Self, NetworkError> {
        let client = Client::builder()
            .connect_timeout(settings.connect_timeout())
            .user_agent(settings.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            credentials: None,
            chunk_size: settings.chunk_size.max(1),
        })
    }

    /// Use an existing reqwest client.
    pub fn with_client(client: Client, chunk_size: usize) -> Self {
        Self {
            client,
            credentials: None,
            chunk_size: chunk_size.max(1),
        }
    }

    /// Credentials sent when a request sets `with_credentials`.
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    fn build_form(&self, form: FormData, progress: ProgressSender) -> Result<Form, NetworkError> {
        let (fields, file) = form.into_parts();

        let mut multipart = Form::new();
        for (name, value) in fields {
            multipart = multipart.text(name, value);
        }

        if let Some(file) = file {
            let total = file.blob.len() as u64;
            let mime_type = file.blob.mime_type().to_string();
            let chunks: Vec<Vec<u8>> = file
                .blob
                .into_bytes()
                .chunks(self.chunk_size)
                .map(|chunk| chunk.to_vec())
                .collect();

            let mut sent = 0u64;
            let stream = futures_util::stream::iter(chunks).map(move |chunk| {
                sent += chunk.len() as u64;
                progress.report(sent, Some(total));
                Ok::<Vec<u8>, std::io::Error>(chunk)
            });

            let mut part =
                Part::stream_with_length(Body::wrap_stream(stream), total).file_name(file.file_name);
            if !mime_type.is_empty() {
                part = part.mime_str(&mime_type)?;
            }
            multipart = multipart.part(file.field, part);
        }

        Ok(multipart)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        request: TransportRequest,
        progress: ProgressSender,
    ) -> Result<TransportResponse, NetworkError> {
        let url =
            Url::parse(&request.url).map_err(|_| NetworkError::InvalidUrl(request.url.clone()))?;

        debug!("{} {}", request.method, url);

        let mut builder = match request.method {
            Method::Get => self.client.get(url),
            Method::Post => self.client.post(url),
        };

        if request.with_credentials {
            if let Some(credentials) = &self.credentials {
                builder = builder.basic_auth(&credentials.username, credentials.password.as_ref());
            }
        }

        if let Some(form) = request.body {
            builder = builder.multipart(self.build_form(form, progress.clone())?);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let total = response.content_length();

        let mut body = Vec::with_capacity(total.unwrap_or(0).min(16 * 1024 * 1024) as usize);
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| NetworkError::BodyRead(e.to_string()))?;
            body.extend_from_slice(&chunk);
            if request.method == Method::Get {
                progress.report(body.len() as u64, total);
            }
        }

        info!(
            "{} {} finished with status {} ({} bytes)",
            request.method,
            request.url,
            status,
            body.len()
        );

        Ok(TransportResponse::new(status, body))
    }
}
