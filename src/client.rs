use crate::config::ClientConfig;
use crate::error::ConverterError;
use crate::output::{decode_image, write_atomically};
use crate::request::{ConversionRequest, CropRegion, FlipDirection, OperationKind, ResizeOptions};
use crate::types::{ApiResponse, ConversionOutput, FormatInfo, ResponseData};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{multipart, StatusCode};
use std::env;
use std::path::Path;
use std::sync::Arc;
use tokio::fs;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

const API_KEY_HEADER: &str = "x-rapidapi-key";
const API_HOST_HEADER: &str = "x-rapidapi-host";

/// Longest slice of a non-JSON error body kept in a [`ConverterError::Remote`].
const MAX_ERROR_BODY_CHARS: usize = 512;

/// The main client for interacting with the Image Converter API.
///
/// It holds the shared `reqwest::Client`, the base URL and the configuration
/// for all API requests. It is cheap to clone and safe to share across tasks;
/// calls never coordinate with each other.
#[derive(Clone, Debug)]
pub struct ImageConverterClient {
    client: reqwest::Client,
    base_url: Url,
    config: Arc<ClientConfig>,
}

impl ImageConverterClient {
    /// Creates a new `ImageConverterClient` with the default configuration.
    ///
    /// It first checks the `api_key` parameter. If it's `None`, it falls back
    /// to the `RAPIDAPI_KEY` environment variable.
    ///
    /// # Errors
    ///
    /// - `ConverterError::MissingApiKey` if the API key is not provided in either way.
    /// - `ConverterError::ClientBuild` if the internal HTTP client fails to build.
    pub fn new(api_key: Option<String>) -> Result<Self, ConverterError> {
        let api_key = api_key.or_else(|| env::var("RAPIDAPI_KEY").ok());
        let Some(key) = api_key else {
            return Err(ConverterError::MissingApiKey);
        };
        Self::with_config(ClientConfig::new(key))
    }

    /// Creates a client from [`ClientConfig::from_env`].
    pub fn from_env() -> Result<Self, ConverterError> {
        Self::with_config(ClientConfig::from_env()?)
    }

    /// Creates a client that talks to `https://<config.host>/`.
    pub fn with_config(config: ClientConfig) -> Result<Self, ConverterError> {
        let base_url = config.base_url();
        Self::with_config_and_url(config, &base_url)
    }

    /// Creates a new client with a custom base URL.
    ///
    /// This is useful for testing or for going through a proxy. The
    /// `X-RapidAPI-Host` header still carries the default host.
    ///
    /// # Arguments
    ///
    /// * `api_key` - The API key for authentication.
    /// * `base_url` - The base URL for the API (e.g., for a mock server).
    pub fn new_with_url(api_key: String, base_url: &str) -> Result<Self, ConverterError> {
        Self::with_config_and_url(ClientConfig::new(api_key), base_url)
    }

    /// Creates a client from an explicit configuration and base URL.
    ///
    /// # Errors
    ///
    /// - `ConverterError::MissingApiKey` or `ConverterError::InvalidConfig` if
    ///   the configuration is unusable (blank key or host, zero timeouts).
    /// - `ConverterError::InvalidHeader` if the key or host cannot be sent as a header.
    /// - `ConverterError::UrlParseFailed` if `base_url` is invalid.
    pub fn with_config_and_url(config: ClientConfig, base_url: &str) -> Result<Self, ConverterError> {
        config.validate()?;

        let mut key = HeaderValue::from_str(&config.api_key)?;
        key.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(HeaderName::from_static(API_KEY_HEADER), key);
        headers.insert(
            HeaderName::from_static(API_HOST_HEADER),
            HeaderValue::from_str(&config.host)?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(ConverterError::ClientBuild)?;

        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            client,
            base_url,
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Converts an image to another format.
    ///
    /// # Arguments
    ///
    /// * `source` - The local image to upload.
    /// * `destination` - Where the converted image is written.
    /// * `format` - The target format identifier, e.g. `webp`.
    /// * `quality` - Encoder quality; the configured default (80) when `None`.
    ///
    /// # Returns
    ///
    /// A [`ConversionOutput`] whose `data` carries the original and converted
    /// sizes and the compression ratio.
    pub async fn convert<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        source: P,
        destination: Q,
        format: &str,
        quality: Option<u8>,
    ) -> Result<ConversionOutput, ConverterError> {
        self.execute(&ConversionRequest::convert(source, destination, format, quality))
            .await
    }

    /// Resizes an image. Dimensions left as `None` are not sent at all.
    pub async fn resize<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        source: P,
        destination: Q,
        options: ResizeOptions,
    ) -> Result<ConversionOutput, ConverterError> {
        self.execute(&ConversionRequest::resize(source, destination, options))
            .await
    }

    /// Crops `region` out of an image.
    pub async fn crop<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        source: P,
        destination: Q,
        region: CropRegion,
    ) -> Result<ConversionOutput, ConverterError> {
        self.execute(&ConversionRequest::crop(source, destination, region))
            .await
    }

    /// Rotates an image by `angle` degrees.
    pub async fn rotate<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        source: P,
        destination: Q,
        angle: i32,
    ) -> Result<ConversionOutput, ConverterError> {
        self.execute(&ConversionRequest::rotate(source, destination, angle))
            .await
    }

    pub async fn flip<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        source: P,
        destination: Q,
        direction: FlipDirection,
    ) -> Result<ConversionOutput, ConverterError> {
        self.execute(&ConversionRequest::flip(source, destination, direction))
            .await
    }

    /// Lists the identifiers of the formats the API can convert to, in the
    /// order the API returns them.
    pub async fn list_formats(&self) -> Result<Vec<String>, ConverterError> {
        let formats = self.list_formats_detailed().await?;
        Ok(formats.into_iter().map(|f| f.format).collect())
    }

    /// Like [`list_formats`](Self::list_formats), keeping every attribute the
    /// API reports per format.
    pub async fn list_formats_detailed(&self) -> Result<Vec<FormatInfo>, ConverterError> {
        let output = self.execute(&ConversionRequest::list_formats()).await?;
        output
            .data
            .formats
            .ok_or(ConverterError::IncompleteResponse {
                operation: OperationKind::ListFormats,
                field: "formats list",
            })
    }

    /// Runs any request: validates it, sends it, and for image operations
    /// writes the decoded result to the destination.
    ///
    /// # Errors
    ///
    /// - `ConverterError::InvalidRequest` if validation fails; nothing is read or sent.
    /// - `ConverterError::LocalIo` if the source cannot be read or the destination written.
    /// - `ConverterError::Transport` if the HTTP exchange fails or times out.
    /// - `ConverterError::Remote` on a non-2xx status or a body without `success: true`.
    ///
    /// The destination is left untouched whenever an error is returned.
    pub async fn execute(
        &self,
        request: &ConversionRequest,
    ) -> Result<ConversionOutput, ConverterError> {
        self.run(request, None).await
    }

    /// Like [`execute`](Self::execute), but gives up with
    /// `ConverterError::Cancelled` as soon as `cancel` fires. A cancelled call
    /// never writes the destination.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use image_converter::{CancellationToken, ConversionRequest, ImageConverterClient};
    /// # #[tokio::main]
    /// # async fn main() -> anyhow::Result<()> {
    /// # let client = ImageConverterClient::new(Some("your_api_key".to_string()))?;
    /// let cancel = CancellationToken::new();
    /// let request = ConversionRequest::convert("input.jpg", "output.webp", "webp", None);
    /// let output = client.execute_with_cancel(&request, &cancel).await?;
    /// println!("Wrote {} bytes", output.bytes_written);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn execute_with_cancel(
        &self,
        request: &ConversionRequest,
        cancel: &CancellationToken,
    ) -> Result<ConversionOutput, ConverterError> {
        self.run(request, Some(cancel)).await
    }

    async fn run(
        &self,
        request: &ConversionRequest,
        cancel: Option<&CancellationToken>,
    ) -> Result<ConversionOutput, ConverterError> {
        let operation = request.operation;
        request.validate()?;

        let cancelled = || cancel.is_some_and(|token| token.is_cancelled());
        if cancelled() {
            return Err(ConverterError::Cancelled { operation });
        }

        let response = match cancel {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => {
                    warn!(%operation, "request cancelled");
                    return Err(ConverterError::Cancelled { operation });
                }
                result = self.exchange(request) => result?,
            },
            None => self.exchange(request).await?,
        };
        let data = response
            .data
            .map(ResponseData::lenient)
            .unwrap_or_default();

        if !operation.transforms_image() {
            return Ok(ConversionOutput {
                destination: None,
                bytes_written: 0,
                data,
            });
        }

        let payload = response.image.ok_or(ConverterError::IncompleteResponse {
            operation,
            field: "image",
        })?;
        let bytes = decode_image(operation, &payload)?;

        let destination = request
            .destination
            .as_deref()
            .ok_or_else(|| ConverterError::invalid(operation, "destination path is required"))?;
        if cancelled() {
            warn!(%operation, "request cancelled before writing output");
            return Err(ConverterError::Cancelled { operation });
        }
        let bytes_written = write_atomically(operation, destination, bytes).await?;
        info!(
            %operation,
            destination = %destination.display(),
            bytes = bytes_written,
            "wrote output image"
        );

        Ok(ConversionOutput {
            destination: Some(destination.to_path_buf()),
            bytes_written,
            data,
        })
    }

    /// Sends one request and returns its body once it is known to report success.
    async fn exchange(&self, request: &ConversionRequest) -> Result<ApiResponse, ConverterError> {
        let operation = request.operation;
        let url = self
            .base_url
            .join(operation.path().trim_start_matches('/'))?;

        let mut builder = self.client.request(operation.method(), url.clone());
        if operation.transforms_image() {
            builder = builder.multipart(self.build_form(request).await?);
        }

        debug!(%operation, %url, fields = request.params.len(), "sending request");
        let transport = |source| ConverterError::Transport { operation, source };
        let response = builder.send().await.map_err(transport)?;
        let status = response.status();
        let body = response.bytes().await.map_err(transport)?;

        interpret_response(operation, status, &body)
    }

    async fn build_form(&self, request: &ConversionRequest) -> Result<multipart::Form, ConverterError> {
        let operation = request.operation;
        let source = request
            .source
            .as_deref()
            .ok_or_else(|| ConverterError::invalid(operation, "source path is required"))?;

        let bytes = fs::read(source)
            .await
            .map_err(|e| ConverterError::local_io(operation, source, e))?;

        let file_name = source
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("image")
            .to_string();
        let mime_type = mime_guess::from_path(source).first_or_octet_stream();

        let image_part = multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(mime_type.essence_str())
            .map_err(|e| ConverterError::invalid(operation, format!("unusable content type: {e}")))?;

        let mut form = multipart::Form::new().part("image", image_part);
        for (name, value) in request.form_fields(&self.config.defaults) {
            form = form.text(name, value);
        }
        Ok(form)
    }
}

/// Maps a raw HTTP response to the parsed body or a [`ConverterError`].
///
/// Anything other than a 2xx status with `success: true` is a uniform
/// `Remote` error.
fn interpret_response(
    operation: OperationKind,
    status: StatusCode,
    body: &[u8],
) -> Result<ApiResponse, ConverterError> {
    let parsed = serde_json::from_slice::<ApiResponse>(body);

    if !status.is_success() {
        let (message, code) = match &parsed {
            Ok(response) => failure_details(response),
            Err(_) => (raw_error_text(status, body), None),
        };
        warn!(%operation, status = status.as_u16(), %message, "API returned an error status");
        return Err(ConverterError::Remote {
            operation,
            status: Some(status.as_u16()),
            code,
            message,
        });
    }

    let response =
        parsed.map_err(|source| ConverterError::MalformedResponse { operation, source })?;
    if !response.success {
        let (message, code) = failure_details(&response);
        warn!(%operation, %message, "API reported failure");
        return Err(ConverterError::Remote {
            operation,
            status: Some(status.as_u16()),
            code,
            message,
        });
    }

    Ok(response)
}

fn failure_details(response: &ApiResponse) -> (String, Option<String>) {
    let message = response
        .error
        .as_ref()
        .and_then(|e| e.message())
        .or(response.message.as_deref())
        .unwrap_or("the API reported failure without a message")
        .to_string();
    let code = response.error.as_ref().and_then(|e| e.code());
    (message, code)
}

fn raw_error_text(status: StatusCode, body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        status.canonical_reason().unwrap_or("unknown error").to_string()
    } else {
        text.chars().take(MAX_ERROR_BODY_CHARS).collect()
    }
}
