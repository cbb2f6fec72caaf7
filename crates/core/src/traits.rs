//! ObjectStore trait definition
//!
//! This trait is the low-level "operation" handle: one method per provider
//! request. It keeps the walkthrough decoupled from the S3 SDK, so the same
//! sequence runs against `S3Client`, `MemoryStore`, or a mock.

use std::collections::BTreeMap;

use async_trait::async_trait;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::options::{BucketVersioning, CannedAcl, Grant, UploadOptions};

/// A bucket as returned by list-buckets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketInfo {
    /// Bucket name
    pub name: String,

    /// Creation timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<Timestamp>,
}

impl BucketInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            creation_date: None,
        }
    }
}

/// Raw response of a create-bucket request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateBucketOutput {
    /// Location header returned by the provider
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// Result of a single put-object request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PutObjectOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,

    /// Set only when the bucket has versioning enabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_id: Option<String>,
}

/// Metadata for an object
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectInfo {
    /// Object key
    pub key: String,

    /// Size in bytes
    pub size: i64,

    /// Last modified timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<Timestamp>,

    /// ETag (usually MD5 for single-part uploads)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,

    /// Storage class as reported by the provider (`STANDARD`, `STANDARD_IA`, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_class: Option<String>,

    /// Server-side encryption algorithm (`AES256`, `aws:kms`, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_side_encryption: Option<String>,

    /// Version id; `None` for objects written while versioning was off
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_id: Option<String>,

    /// Content type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    /// User metadata (`x-amz-meta-*`)
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl ObjectInfo {
    /// Create a new ObjectInfo for a key of the given size
    pub fn file(key: impl Into<String>, size: i64) -> Self {
        Self {
            key: key.into(),
            size,
            ..Default::default()
        }
    }
}

/// One entry of a list-object-versions response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectVersion {
    pub key: String,

    /// `"null"` for versions written before versioning was enabled
    pub version_id: String,

    pub is_latest: bool,

    pub is_delete_marker: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<Timestamp>,
}

impl ObjectVersion {
    /// Identifier addressing exactly this version in a bulk delete
    pub fn identifier(&self) -> ObjectIdentifier {
        ObjectIdentifier::versioned(&self.key, &self.version_id)
    }
}

/// Key and optional version id, as sent in a bulk delete request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectIdentifier {
    #[serde(rename = "Key")]
    pub key: String,

    #[serde(rename = "VersionId", skip_serializing_if = "Option::is_none")]
    pub version_id: Option<String>,
}

impl ObjectIdentifier {
    pub fn versioned(key: impl Into<String>, version_id: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            version_id: Some(version_id.into()),
        }
    }
}

/// Trait for S3-compatible storage operations
///
/// This trait is implemented by the S3 adapter and the in-memory store, and
/// can be mocked for testing.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Region of the active session, if one is configured
    fn region(&self) -> Option<String>;

    /// List buckets
    async fn list_buckets(&self) -> Result<Vec<BucketInfo>>;

    /// Create a bucket constrained to `region`
    async fn create_bucket(&self, bucket: &str, region: &str) -> Result<CreateBucketOutput>;

    /// Delete an empty bucket
    async fn delete_bucket(&self, bucket: &str) -> Result<()>;

    /// Upload an object
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
        options: &UploadOptions,
    ) -> Result<PutObjectOutput>;

    /// Get object content as bytes
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>>;

    /// Get object metadata
    async fn head_object(&self, bucket: &str, key: &str) -> Result<ObjectInfo>;

    /// Server-side copy
    async fn copy_object(
        &self,
        src_bucket: &str,
        src_key: &str,
        dst_bucket: &str,
        dst_key: &str,
    ) -> Result<()>;

    /// Delete the current version of an object
    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()>;

    /// Delete many objects (or object versions) in one request
    ///
    /// Returns the identifiers the provider reported as deleted.
    async fn delete_objects(
        &self,
        bucket: &str,
        objects: Vec<ObjectIdentifier>,
    ) -> Result<Vec<ObjectIdentifier>>;

    /// List every object in a bucket, following pagination
    async fn list_objects(&self, bucket: &str) -> Result<Vec<ObjectInfo>>;

    /// List every object version and delete marker in a bucket
    async fn list_object_versions(&self, bucket: &str) -> Result<Vec<ObjectVersion>>;

    /// Read the access grants of an object
    async fn get_object_acl(&self, bucket: &str, key: &str) -> Result<Vec<Grant>>;

    /// Replace the ACL of an object with a canned ACL
    async fn put_object_acl(&self, bucket: &str, key: &str, acl: CannedAcl) -> Result<()>;

    /// Read bucket versioning status
    async fn get_versioning(&self, bucket: &str) -> Result<BucketVersioning>;

    /// Enable or suspend bucket versioning
    async fn set_versioning(&self, bucket: &str, enabled: bool) -> Result<()>;
}
