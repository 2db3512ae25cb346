//! S3 object store backed by session credentials

use aws_sdk_s3::Client;
use aws_smithy_types::byte_stream::ByteStream;
use tracing::debug;

use crate::credentials::{CredentialProvider, SessionCredentials};
use crate::error::Result;
use crate::store::ObjectStore;
use crate::StorageError;

/// Uploads to S3 (or an S3-compatible endpoint).
///
/// A client is built per upload from freshly fetched credentials; nothing is
/// cached between calls.
#[derive(Debug, Clone)]
pub struct S3ObjectStore<C> {
    credentials: C,
    region: String,
    endpoint_url: Option<String>,
}

impl<C: CredentialProvider> S3ObjectStore<C> {
    pub fn new(credentials: C, region: impl Into<String>) -> Self {
        Self {
            credentials,
            region: region.into(),
            endpoint_url: None,
        }
    }

    /// Point at an S3-compatible endpoint (MinIO, LocalStack). Enables path-style addressing.
    pub fn with_endpoint_url(mut self, endpoint_url: impl Into<String>) -> Self {
        self.endpoint_url = Some(endpoint_url.into());
        self
    }

    async fn client(&self, creds: SessionCredentials) -> Client {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(self.region.clone()))
            .credentials_provider(aws_sdk_s3::config::Credentials::new(
                creds.access_key_id,
                creds.secret_access_key,
                creds.session_token,
                None,
                "form-session",
            ));
        if let Some(endpoint) = &self.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }
        let sdk_config = loader.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(self.endpoint_url.is_some())
            .build();
        Client::from_conf(s3_config)
    }
}

impl<C: CredentialProvider> ObjectStore for S3ObjectStore<C> {
    fn scheme(&self) -> &str {
        "s3"
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<()> {
        let creds = self.credentials.credentials().await?;
        let client = self.client(creds).await;

        let resp = client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| StorageError::PutObject(e.into_service_error().to_string()))?;

        debug!(bucket, key, etag = resp.e_tag().unwrap_or_default(), "put_object complete");
        Ok(())
    }
}
