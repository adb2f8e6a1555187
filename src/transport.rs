use crate::constants::{COMPRESS_ROUTE, FORMAT_FIELD, IMAGE_FIELD};
use crate::endpoint::ErrorBody;
use crate::error::{CompressionError, Result};
use crate::formats::TargetFormat;
use crate::upload::UploadFile;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Url};

/// Sends one file to the compression endpoint and returns the encoded bytes.
///
/// Any non-success outcome is an error; the orchestrator does not
/// distinguish between them.
#[async_trait]
pub trait CompressionTransport: Send + Sync {
    async fn compress(&self, file: &UploadFile, format: TargetFormat) -> Result<Bytes>;
}

/// `POST /api/compress` over HTTP.
///
/// No timeout is set beyond what the underlying client applies.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    endpoint: Url,
}

impl HttpTransport {
    pub fn new(server_url: &str) -> Result<Self> {
        Self::with_client(Client::new(), server_url)
    }

    pub fn with_client(client: Client, server_url: &str) -> Result<Self> {
        let endpoint = Url::parse(server_url)
            .and_then(|base| base.join(COMPRESS_ROUTE))
            .map_err(|e| CompressionError::InvalidAddress(format!("{server_url}: {e}")))?;

        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl CompressionTransport for HttpTransport {
    async fn compress(&self, file: &UploadFile, format: TargetFormat) -> Result<Bytes> {
        let part = Part::bytes(file.data().to_vec())
            .file_name(file.name().to_string())
            .mime_str(file.content_type())?;
        let form = Form::new()
            .part(IMAGE_FIELD, part)
            .text(FORMAT_FIELD, format.form_value());

        let response = self
            .client
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|b| b.error)
                .unwrap_or(body);
            return Err(CompressionError::Endpoint {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.bytes().await?)
    }
}
