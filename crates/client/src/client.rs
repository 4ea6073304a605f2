use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use blossom_protocol::constants::{
    HEADER_CONTENT_LENGTH, HEADER_CONTENT_TYPE, HEADER_SHA256, MIRROR_PATH,
};
use blossom_protocol::{BlobDescriptor, FileMetadata, MirrorRequest, UploadEndpoint};
use blossom_transfer::{ChunkStream, PhaseTracker, ProgressObserver, TransferOptions, TransferPhase};
use reqwest::Method;
use reqwest::header::{AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE, HeaderValue};
use tokio::io::AsyncRead;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::config::ClientConfig;
use crate::error::Error;
use crate::http::shared_client;
use crate::response::{Operation, check_status, validate_descriptor};

/// Client for a single Blossom server.
///
/// Cheap to clone. The underlying HTTP transport is shared process-wide, so
/// any number of clients and concurrent calls reuse the same connection pool.
#[derive(Debug, Clone)]
pub struct BlossomClient {
    base_url: String,
    options: TransferOptions,
    request_timeout: Option<Duration>,
}

impl BlossomClient {
    /// Creates a client for the server at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            options: TransferOptions::default(),
            request_timeout: None,
        }
    }

    /// Creates a client from a validated [`ClientConfig`].
    pub fn from_config(config: &ClientConfig) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self::new(config.base_url.clone())
            .with_transfer_options(config.transfer_options())
            .with_request_timeout(config.request_timeout()))
    }

    pub fn with_transfer_options(mut self, options: TransferOptions) -> Self {
        self.options = options.normalized();
        self
    }

    /// Limits each request, body included, to `timeout`.
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint_url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    fn request(&self, method: Method, path: &str) -> Result<reqwest::RequestBuilder, Error> {
        let mut builder = shared_client()?.request(method, self.endpoint_url(path));
        if let Some(timeout) = self.request_timeout {
            builder = builder.timeout(timeout);
        }
        Ok(builder)
    }

    // -----------------------------------------------------------------------
    // Precheck
    // -----------------------------------------------------------------------

    /// Asks whether `/media` would accept the described file.
    pub async fn head_media(&self, authorization: &str, metadata: &FileMetadata) -> Result<(), Error> {
        self.precheck(UploadEndpoint::Media, authorization, metadata).await
    }

    /// Asks whether `/upload` would accept the described file.
    pub async fn head_upload(&self, authorization: &str, metadata: &FileMetadata) -> Result<(), Error> {
        self.precheck(UploadEndpoint::Upload, authorization, metadata).await
    }

    /// Sends `HEAD /{endpoint}` with the file's hash, size and type.
    ///
    /// Succeeds on any 2xx; otherwise fails with [`Error::Requirement`]
    /// carrying the server's `X-Reason`.
    pub async fn precheck(
        &self,
        endpoint: UploadEndpoint,
        authorization: &str,
        metadata: &FileMetadata,
    ) -> Result<(), Error> {
        debug!(
            endpoint = %endpoint,
            sha256 = %metadata.sha256,
            size = metadata.size_in_bytes,
            "precheck"
        );

        let response = self
            .request(Method::HEAD, endpoint.path())?
            .header(AUTHORIZATION, header_value("authorization", authorization)?)
            .header(HEADER_SHA256, header_value("x-sha-256", &metadata.sha256)?)
            .header(HEADER_CONTENT_LENGTH, HeaderValue::from(metadata.size_in_bytes))
            .header(
                HEADER_CONTENT_TYPE,
                header_value("x-content-type", metadata.content_type())?,
            )
            .send()
            .await?;

        let result = check_status(
            Operation::Precheck(endpoint),
            response.status(),
            response.headers(),
        );
        if let Err(e) = &result {
            debug!(endpoint = %endpoint, error = %e, "precheck rejected");
        }
        result
    }

    // -----------------------------------------------------------------------
    // Upload
    // -----------------------------------------------------------------------

    /// Streams `source` to `/upload`; the returned size must match.
    pub async fn put_upload<R>(
        &self,
        authorization: &str,
        metadata: &FileMetadata,
        source: R,
        observer: Option<Arc<dyn ProgressObserver>>,
    ) -> Result<BlobDescriptor, Error>
    where
        R: AsyncRead + Send + Sync + Unpin + 'static,
    {
        self.upload(
            UploadEndpoint::Upload,
            authorization,
            metadata.content_type(),
            metadata,
            source,
            observer,
        )
        .await
    }

    /// Streams `source` to `/media`; the server may transform it.
    pub async fn put_media<R>(
        &self,
        authorization: &str,
        metadata: &FileMetadata,
        source: R,
        observer: Option<Arc<dyn ProgressObserver>>,
    ) -> Result<BlobDescriptor, Error>
    where
        R: AsyncRead + Send + Sync + Unpin + 'static,
    {
        self.upload(
            UploadEndpoint::Media,
            authorization,
            metadata.content_type(),
            metadata,
            source,
            observer,
        )
        .await
    }

    /// Streams exactly `metadata.size_in_bytes` bytes of `source` as the
    /// body of `PUT /{endpoint}`.
    ///
    /// `source` is moved into the request body and dropped before the call
    /// returns on every exit: end of data, a read or transport error, an
    /// early server rejection, validation, or this future being dropped.
    /// After cancellation the observer is never called again.
    pub async fn upload<R>(
        &self,
        endpoint: UploadEndpoint,
        authorization: &str,
        content_type: &str,
        metadata: &FileMetadata,
        source: R,
        observer: Option<Arc<dyn ProgressObserver>>,
    ) -> Result<BlobDescriptor, Error>
    where
        R: AsyncRead + Send + Sync + Unpin + 'static,
    {
        let total = metadata.size_in_bytes;
        let authorization = header_value("authorization", authorization)?;
        let content_type = header_value("content-type", content_type)?;

        let phase = PhaseTracker::new();
        let body = ChunkStream::new(source, total, self.options)
            .with_observer(observer)
            .with_phase(phase.clone());

        // Dropped on every exit of this call, dropped futures included; the
        // source goes with it even if the transport still holds the body.
        let _release = body.guard();

        debug!(endpoint = %endpoint, size = total, sha256 = %metadata.sha256, "upload started");
        phase.set(TransferPhase::StreamingBody);

        let result = self
            .send_upload(endpoint, authorization, content_type, total, body)
            .await;

        match &result {
            Ok(descriptor) => {
                phase.set(TransferPhase::Validated);
                debug!(
                    endpoint = %endpoint,
                    url = %descriptor.url,
                    size = descriptor.size_in_bytes,
                    "upload complete"
                );
            }
            Err(e) => {
                let reached = phase.get();
                phase.set(TransferPhase::Failed);
                error!(endpoint = %endpoint, phase = %reached, error = %e, "upload failed");
            }
        }
        result
    }

    async fn send_upload<R>(
        &self,
        endpoint: UploadEndpoint,
        authorization: HeaderValue,
        content_type: HeaderValue,
        total: u64,
        body: ChunkStream<R>,
    ) -> Result<BlobDescriptor, Error>
    where
        R: AsyncRead + Send + Sync + Unpin + 'static,
    {
        let response = self
            .request(Method::PUT, endpoint.path())?
            .header(AUTHORIZATION, authorization)
            .header(CONTENT_LENGTH, HeaderValue::from(total))
            .header(CONTENT_TYPE, content_type)
            .body(reqwest::Body::wrap_stream(body))
            .send()
            .await?;

        let expected = endpoint.checks_size().then_some(total);
        validate_descriptor(Operation::Upload(endpoint), response, expected).await
    }

    /// Hashes and uploads a local file, optionally prechecking first.
    pub async fn upload_file(
        &self,
        endpoint: UploadEndpoint,
        authorization: &str,
        path: &Path,
        precheck: bool,
        observer: Option<Arc<dyn ProgressObserver>>,
    ) -> Result<BlobDescriptor, Error> {
        let metadata = blossom_transfer::file_metadata(path).await?;

        if precheck {
            self.precheck(endpoint, authorization, &metadata).await?;
        }

        let file = tokio::fs::File::open(path).await?;
        self.upload(
            endpoint,
            authorization,
            metadata.content_type(),
            &metadata,
            file,
            observer,
        )
        .await
    }

    // -----------------------------------------------------------------------
    // Mirror
    // -----------------------------------------------------------------------

    /// Asks the server to fetch and store the blob at `source_url`.
    pub async fn put_mirror(
        &self,
        authorization: &str,
        source_url: &str,
    ) -> Result<BlobDescriptor, Error> {
        debug!(source = source_url, "mirror");

        let response = self
            .request(Method::PUT, MIRROR_PATH)?
            .header(AUTHORIZATION, header_value("authorization", authorization)?)
            .json(&MirrorRequest::new(source_url))
            .send()
            .await?;

        let result = validate_descriptor(Operation::Mirror, response, None).await;
        match &result {
            Ok(descriptor) => debug!(url = %descriptor.url, "mirror complete"),
            Err(e) => error!(source = source_url, error = %e, "mirror failed"),
        }
        result
    }
}

/// Runs `operation` until it finishes or `cancel` fires.
///
/// On cancellation the operation future is dropped, which releases any
/// upload source it owns, and [`Error::Cancelled`] is returned.
pub async fn cancellable<T, F>(cancel: &CancellationToken, operation: F) -> Result<T, Error>
where
    F: Future<Output = Result<T, Error>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled),
        result = operation => result,
    }
}

fn header_value(name: &'static str, value: &str) -> Result<HeaderValue, Error> {
    HeaderValue::from_str(value).map_err(|_| Error::InvalidHeader(name))
}
