//! Entity handles over an `ObjectStore`
//!
//! `Resource` is the higher-level handle: instead of calling one method per
//! request it hands out `BucketRef` and `ObjectRef` entities that carry their
//! own names. Both handles share the same underlying store, and
//! [`Resource::client`] gives the operation handle back.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::options::{BucketVersioning, CannedAcl, Grant, UploadOptions};
use crate::traits::{
    CreateBucketOutput, ObjectIdentifier, ObjectInfo, ObjectStore, ObjectVersion, PutObjectOutput,
};

/// Anything a bucket can be created through
///
/// Implemented by every `ObjectStore` (the operation handle) and by
/// [`Resource`] (the entity handle).
#[async_trait]
pub trait BucketCreator: Send + Sync {
    /// Region of the session behind this handle
    fn session_region(&self) -> Option<String>;

    /// Issue a create-bucket request constrained to `region`
    async fn create_in_region(&self, bucket: &str, region: &str) -> Result<CreateBucketOutput>;
}

#[async_trait]
impl<T: ObjectStore + ?Sized> BucketCreator for T {
    fn session_region(&self) -> Option<String> {
        self.region()
    }

    async fn create_in_region(&self, bucket: &str, region: &str) -> Result<CreateBucketOutput> {
        self.create_bucket(bucket, region).await
    }
}

/// Entity-style handle
#[derive(Clone)]
pub struct Resource {
    client: Arc<dyn ObjectStore>,
}

impl Resource {
    pub fn new(client: Arc<dyn ObjectStore>) -> Self {
        Self { client }
    }

    /// The operation handle this resource wraps
    pub fn client(&self) -> &dyn ObjectStore {
        self.client.as_ref()
    }

    pub fn bucket(&self, name: impl Into<String>) -> BucketRef {
        BucketRef {
            client: Arc::clone(&self.client),
            name: name.into(),
        }
    }

    pub fn object(&self, bucket: impl Into<String>, key: impl Into<String>) -> ObjectRef {
        ObjectRef {
            client: Arc::clone(&self.client),
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// All buckets owned by the caller
    pub async fn buckets(&self) -> Result<Vec<BucketRef>> {
        let buckets = self.client.list_buckets().await?;
        Ok(buckets.into_iter().map(|b| self.bucket(b.name)).collect())
    }
}

#[async_trait]
impl BucketCreator for Resource {
    fn session_region(&self) -> Option<String> {
        self.client.region()
    }

    async fn create_in_region(&self, bucket: &str, region: &str) -> Result<CreateBucketOutput> {
        self.bucket(bucket).create(region).await
    }
}

/// A bucket, addressed by name
#[derive(Clone)]
pub struct BucketRef {
    client: Arc<dyn ObjectStore>,
    name: String,
}

impl BucketRef {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn create(&self, region: &str) -> Result<CreateBucketOutput> {
        self.client.create_bucket(&self.name, region).await
    }

    pub async fn delete(&self) -> Result<()> {
        self.client.delete_bucket(&self.name).await
    }

    /// Current objects in the bucket
    pub async fn objects(&self) -> Result<Vec<ObjectSummary>> {
        let objects = self.client.list_objects(&self.name).await?;
        Ok(objects
            .into_iter()
            .map(|info| ObjectSummary {
                object: ObjectRef {
                    client: Arc::clone(&self.client),
                    bucket: self.name.clone(),
                    key: info.key.clone(),
                },
                info,
            })
            .collect())
    }

    /// Every version and delete marker in the bucket
    pub async fn object_versions(&self) -> Result<Vec<ObjectVersion>> {
        self.client.list_object_versions(&self.name).await
    }

    pub async fn delete_objects(
        &self,
        objects: Vec<ObjectIdentifier>,
    ) -> Result<Vec<ObjectIdentifier>> {
        self.client.delete_objects(&self.name, objects).await
    }

    pub async fn versioning(&self) -> Result<BucketVersioning> {
        self.client.get_versioning(&self.name).await
    }

    pub async fn enable_versioning(&self) -> Result<()> {
        self.client.set_versioning(&self.name, true).await
    }
}

/// Listing entry: the summary fields plus a handle to the full object
#[derive(Clone)]
pub struct ObjectSummary {
    pub info: ObjectInfo,
    pub object: ObjectRef,
}

impl ObjectSummary {
    pub fn key(&self) -> &str {
        &self.info.key
    }
}

/// An object, addressed by bucket and key
#[derive(Clone)]
pub struct ObjectRef {
    client: Arc<dyn ObjectStore>,
    bucket: String,
    key: String,
}

impl ObjectRef {
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Upload a local file as this object
    ///
    /// The content type is guessed from the file name unless `options` sets one.
    pub async fn upload_file(&self, path: &Path, options: &UploadOptions) -> Result<PutObjectOutput> {
        let data = tokio::fs::read(path).await?;
        let mut options = options.clone();
        if options.content_type.is_none() {
            options.content_type = mime_guess::from_path(path)
                .first()
                .map(|mime| mime.essence_str().to_string());
        }
        tracing::debug!(bucket = %self.bucket, key = %self.key, size = data.len(), "uploading file");
        self.client
            .put_object(&self.bucket, &self.key, data, &options)
            .await
    }

    /// Download this object into a local file, returning the byte count
    pub async fn download_file(&self, path: &Path) -> Result<usize> {
        let data = self.client.get_object(&self.bucket, &self.key).await?;
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, &data).await?;
        Ok(data.len())
    }

    /// Server-side copy of `source` into this object
    pub async fn copy_from(&self, source: &ObjectRef) -> Result<()> {
        self.client
            .copy_object(&source.bucket, &source.key, &self.bucket, &self.key)
            .await
    }

    pub async fn delete(&self) -> Result<()> {
        self.client.delete_object(&self.bucket, &self.key).await
    }

    /// Fetch the current metadata
    pub async fn load(&self) -> Result<ObjectInfo> {
        self.client.head_object(&self.bucket, &self.key).await
    }

    pub fn acl(&self) -> ObjectAcl {
        ObjectAcl {
            object: self.clone(),
        }
    }
}

/// ACL sub-resource of an object
#[derive(Clone)]
pub struct ObjectAcl {
    object: ObjectRef,
}

impl ObjectAcl {
    pub async fn grants(&self) -> Result<Vec<Grant>> {
        self.object
            .client
            .get_object_acl(&self.object.bucket, &self.object.key)
            .await
    }

    pub async fn put(&self, acl: CannedAcl) -> Result<()> {
        self.object
            .client
            .put_object_acl(&self.object.bucket, &self.object.key, acl)
            .await
    }
}
