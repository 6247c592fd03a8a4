//! Object store seam and its S3 implementation

use crate::config::DeployConfig;
use crate::error::Result;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::{
    config::{Credentials, Region},
    primitives::ByteStream,
    types::ObjectCannedAcl,
    Client,
};
use std::path::Path;

/// Per-object metadata sent with each upload
#[derive(Debug, Clone, PartialEq)]
pub struct UploadOptions {
    pub acl: ObjectCannedAcl,
    /// `None` leaves the content type to the service default
    pub content_type: Option<String>,
}

impl UploadOptions {
    /// Options for a deployed asset: authenticated-read plus the guessed content type
    pub fn for_path(path: &Path) -> Self {
        Self {
            acl: ObjectCannedAcl::AuthenticatedRead,
            content_type: crate::local::guess_content_type(path),
        }
    }
}

/// Minimal bucket operations needed for a deploy
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload the file at `path` under `key`, overwriting any existing object.
    async fn put_file(&self, key: &str, path: &Path, options: &UploadOptions) -> Result<()>;

    /// List every key in the bucket.
    async fn list_keys(&self) -> Result<Vec<String>>;

    /// Delete a single object.
    async fn delete_object(&self, key: &str) -> Result<()>;
}

/// S3 bucket handle
pub struct S3Store {
    client: Client,
    bucket: String,
}

impl S3Store {
    /// Create a store for the configured bucket.
    ///
    /// Only builds the client; no request is sent.
    pub async fn new(config: &DeployConfig) -> Result<Self> {
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "s3deploy",
        );

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials);

        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }

        let sdk_config = loader.load().await;

        // Custom endpoints (MinIO, R2, ...) rarely support virtual-hosted buckets
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.endpoint.is_some())
            .build();

        Ok(Self {
            client: Client::from_conf(s3_config),
            bucket: config.bucket.clone(),
        })
    }

    /// Get the bucket name
    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn put_file(&self, key: &str, path: &Path, options: &UploadOptions) -> Result<()> {
        let body = ByteStream::from_path(path).await?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .acl(options.acl.clone())
            .set_content_type(options.content_type.clone())
            .send()
            .await?;

        Ok(())
    }

    async fn list_keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .into_paginator()
            .send();

        while let Some(page) = pages.next().await {
            let page = page?;
            keys.extend(page.contents().iter().filter_map(|obj| obj.key().map(str::to_string)));
        }

        Ok(keys)
    }

    async fn delete_object(&self, key: &str) -> Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await?;

        Ok(())
    }
}
