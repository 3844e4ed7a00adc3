use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_s3::{primitives::ByteStream as AwsByteStream, Client};
use std::env;

use crate::store::{GetResult, ObjectHead, PutResult};
use crate::{collect_stream, BlobError, BlobHandle, BlobResult, BlobStore, ByteStream};

/// S3-compatible endpoint configuration
#[derive(Debug, Clone)]
pub struct S3Config {
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub endpoint_url: String,
    pub bucket: String,
}

impl S3Config {
    /// Read configuration from `S3_*` environment variables
    pub fn from_env() -> BlobResult<Self> {
        fn get_env(key: &str) -> BlobResult<String> {
            env::var(key)
                .map_err(|_| BlobError::invalid(format!("{} environment variable required", key)))
        }

        Ok(Self {
            region: get_env("S3_REGION")?,
            access_key_id: get_env("S3_ACCESS_KEY_ID")?,
            secret_access_key: get_env("S3_SECRET_ACCESS_KEY")?,
            endpoint_url: get_env("S3_ENDPOINT_URL")?,
            bucket: get_env("S3_BUCKET")?,
        })
    }
}

/// Blob store backed by any S3-compatible object store.
///
/// Objects are keyed by a store-assigned random handle; the upload name is
/// kept as object metadata only.
#[derive(Clone)]
pub struct S3CompatibleStore {
    client: Client,
    bucket: String,
}

impl S3CompatibleStore {
    pub async fn new(config: S3Config) -> Self {
        let credentials = Credentials::new(
            config.access_key_id.clone(),
            config.secret_access_key.clone(),
            None,
            None,
            "qrstory",
        );

        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .endpoint_url(config.endpoint_url.clone())
            .load()
            .await;

        let client = Client::from_conf(
            aws_sdk_s3::config::Builder::from(&aws_config)
                .force_path_style(true) // required by most non-AWS S3 implementations
                .build(),
        );

        Self {
            client,
            bucket: config.bucket,
        }
    }

    /// Convenience constructor reading `S3_*` environment variables
    pub async fn from_env() -> BlobResult<Self> {
        Ok(Self::new(S3Config::from_env()?).await)
    }

    fn map_aws_error(err: impl std::error::Error + Send + Sync + 'static) -> BlobError {
        BlobError::backend(err)
    }
}

#[async_trait]
impl BlobStore for S3CompatibleStore {
    async fn put(
        &self,
        name: &str,
        content_type: Option<&str>,
        stream: ByteStream,
    ) -> BlobResult<PutResult> {
        let data = collect_stream(stream).await?;
        let size_bytes = data.len() as u64;
        let handle = BlobHandle::random();

        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(handle.as_str())
            .metadata("name", name)
            .body(AwsByteStream::from(data));

        if let Some(ct) = content_type {
            request = request.content_type(ct);
        }

        request.send().await.map_err(Self::map_aws_error)?;

        Ok(PutResult { handle, size_bytes })
    }

    async fn get(&self, handle: &BlobHandle) -> BlobResult<GetResult> {
        let result = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(handle.as_str())
            .send()
            .await
            .map_err(|err| {
                let service_err = err.as_service_error();
                if service_err.map_or(false, |e| e.is_no_such_key()) {
                    BlobError::not_found(handle.as_str())
                } else {
                    Self::map_aws_error(err)
                }
            })?;

        let size_bytes = result.content_length.unwrap_or(0) as u64;
        let content_type = result.content_type.clone();

        // Forward chunks as they arrive; dropping the stream aborts the transfer.
        let mut body = result.body;
        let stream = async_stream::try_stream! {
            while let Some(chunk) = body
                .try_next()
                .await
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?
            {
                yield chunk;
            }
        };

        Ok(GetResult {
            stream: Box::pin(stream),
            size_bytes,
            content_type,
        })
    }

    async fn head(&self, handle: &BlobHandle) -> BlobResult<ObjectHead> {
        let result = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(handle.as_str())
            .send()
            .await
            .map_err(|err| {
                let service_err = err.as_service_error();
                if service_err.map_or(false, |e| e.is_not_found()) {
                    BlobError::not_found(handle.as_str())
                } else {
                    Self::map_aws_error(err)
                }
            })?;

        Ok(ObjectHead {
            size_bytes: result.content_length.unwrap_or(0) as u64,
            content_type: result.content_type,
        })
    }

    async fn delete(&self, handle: &BlobHandle) -> BlobResult<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(handle.as_str())
            .send()
            .await
            .map_err(Self::map_aws_error)?;
        Ok(())
    }

    async fn list(&self) -> BlobResult<Vec<BlobHandle>> {
        let mut handles = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let mut request = self.client.list_objects_v2().bucket(&self.bucket);
            if let Some(token) = continuation_token.take() {
                request = request.continuation_token(token);
            }

            let result = request.send().await.map_err(Self::map_aws_error)?;

            if let Some(objects) = result.contents {
                handles.extend(
                    objects
                        .into_iter()
                        .filter_map(|o| o.key)
                        .map(BlobHandle::from_string),
                );
            }

            match result.next_continuation_token {
                Some(token) => continuation_token = Some(token),
                None => break,
            }
        }

        Ok(handles)
    }
}
