//! In-process object store
//!
//! Models the parts of S3 the walkthrough touches: regions fixed at bucket
//! creation, per-key version stacks with `null` versions for writes made
//! while versioning is off, delete markers, canned ACLs, storage classes and
//! encryption flags. Selected with `backend = "memory"` and used by tests.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use jiff::Timestamp;

use crate::error::{Error, Result};
use crate::options::{BucketVersioning, CannedAcl, Grant, Grantee, StorageClass, UploadOptions};
use crate::traits::{
    BucketInfo, CreateBucketOutput, ObjectIdentifier, ObjectInfo, ObjectStore, ObjectVersion,
    PutObjectOutput,
};

/// Version id of objects written while versioning is not enabled
const NULL_VERSION: &str = "null";

const DEFAULT_OWNER_ID: &str = "75aa57f09aa0c8caeab4f8c24e99d10f8e7faeebf76c078efc7c6caea54ba06a";
const OWNER_DISPLAY_NAME: &str = "bucketwalk";

#[derive(Debug, Clone)]
struct StoredVersion {
    version_id: String,
    /// `None` marks a delete marker
    data: Option<Vec<u8>>,
    last_modified: Timestamp,
    etag: String,
    storage_class: StorageClass,
    server_side_encryption: Option<String>,
    content_type: Option<String>,
    metadata: BTreeMap<String, String>,
    acl: CannedAcl,
}

impl StoredVersion {
    fn delete_marker(version_id: String) -> Self {
        Self {
            version_id,
            data: None,
            last_modified: Timestamp::now(),
            etag: String::new(),
            storage_class: StorageClass::Standard,
            server_side_encryption: None,
            content_type: None,
            metadata: BTreeMap::new(),
            acl: CannedAcl::Private,
        }
    }

    fn is_delete_marker(&self) -> bool {
        self.data.is_none()
    }

    /// Object metadata as reported under the bucket's `versioning` state
    ///
    /// A `null` version is reported as `"null"` once the bucket has ever had
    /// versioning enabled, and as no version id before that.
    fn info(&self, key: &str, versioning: BucketVersioning) -> ObjectInfo {
        let version_id = match versioning {
            BucketVersioning::Unversioned => None,
            _ => Some(self.version_id.clone()),
        };
        ObjectInfo {
            key: key.to_string(),
            size: self.data.as_ref().map_or(0, |d| d.len() as i64),
            last_modified: Some(self.last_modified),
            etag: Some(self.etag.clone()),
            storage_class: Some(self.storage_class.as_str().to_string()),
            server_side_encryption: self.server_side_encryption.clone(),
            version_id,
            content_type: self.content_type.clone(),
            metadata: self.metadata.clone(),
        }
    }
}

#[derive(Debug)]
struct MemBucket {
    region: String,
    created: Timestamp,
    versioning: BucketVersioning,
    /// Oldest first; the last entry is the current version
    objects: BTreeMap<String, Vec<StoredVersion>>,
}

impl MemBucket {
    fn current(&self, bucket: &str, key: &str) -> Result<&StoredVersion> {
        self.objects
            .get(key)
            .and_then(|versions| versions.last())
            .filter(|v| !v.is_delete_marker())
            .ok_or_else(|| Error::NotFound(format!("{bucket}/{key}")))
    }

    fn current_mut(&mut self, bucket: &str, key: &str) -> Result<&mut StoredVersion> {
        self.objects
            .get_mut(key)
            .and_then(|versions| versions.last_mut())
            .filter(|v| !v.is_delete_marker())
            .ok_or_else(|| Error::NotFound(format!("{bucket}/{key}")))
    }

    /// Append a version, replacing the `null` version unless versioning is enabled
    fn push_version(&mut self, key: &str, mut version: StoredVersion) -> Option<String> {
        let versions = self.objects.entry(key.to_string()).or_default();
        if self.versioning == BucketVersioning::Enabled {
            version.version_id = new_version_id();
            let id = version.version_id.clone();
            versions.push(version);
            Some(id)
        } else {
            versions.retain(|v| v.version_id != NULL_VERSION);
            version.version_id = NULL_VERSION.to_string();
            versions.push(version);
            (self.versioning == BucketVersioning::Suspended).then(|| NULL_VERSION.to_string())
        }
    }

    fn delete_current(&mut self, key: &str) {
        match self.versioning {
            BucketVersioning::Unversioned => {
                self.objects.remove(key);
            }
            _ => {
                if self.objects.contains_key(key) {
                    self.push_version(key, StoredVersion::delete_marker(String::new()));
                }
            }
        }
    }

    fn delete_version(&mut self, key: &str, version_id: &str) {
        if let Some(versions) = self.objects.get_mut(key) {
            versions.retain(|v| v.version_id != version_id);
            if versions.is_empty() {
                self.objects.remove(key);
            }
        }
    }

    fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[derive(Debug, Default)]
struct State {
    buckets: BTreeMap<String, MemBucket>,
}

impl State {
    fn bucket(&self, name: &str) -> Result<&MemBucket> {
        self.buckets
            .get(name)
            .ok_or_else(|| Error::NotFound(format!("Bucket not found: {name}")))
    }

    fn bucket_mut(&mut self, name: &str) -> Result<&mut MemBucket> {
        self.buckets
            .get_mut(name)
            .ok_or_else(|| Error::NotFound(format!("Bucket not found: {name}")))
    }
}

/// In-memory `ObjectStore`
#[derive(Debug)]
pub struct MemoryStore {
    region: Option<String>,
    owner: Grantee,
    state: Mutex<State>,
}

impl MemoryStore {
    /// Create an empty store whose session region is `region`
    pub fn new(region: Option<String>) -> Self {
        Self::with_owner(region, DEFAULT_OWNER_ID)
    }

    pub fn with_owner(region: Option<String>, owner_id: impl Into<String>) -> Self {
        Self {
            region,
            owner: Grantee::CanonicalUser {
                id: owner_id.into(),
                display_name: Some(OWNER_DISPLAY_NAME.to_string()),
            },
            state: Mutex::new(State::default()),
        }
    }

    fn state(&self) -> Result<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| Error::General("memory store lock poisoned".into()))
    }

    /// Region a bucket was created in
    pub fn bucket_region(&self, bucket: &str) -> Result<String> {
        Ok(self.state()?.bucket(bucket)?.region.clone())
    }
}

fn new_version_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

fn validate_bucket_name(name: &str) -> Result<()> {
    let valid_chars = name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.');
    let valid_edges = name
        .chars()
        .next()
        .zip(name.chars().last())
        .is_some_and(|(first, last)| first.is_ascii_alphanumeric() && last.is_ascii_alphanumeric());

    if !(3..=63).contains(&name.len()) || !valid_chars || !valid_edges {
        return Err(Error::InvalidArgument(format!("Invalid bucket name: {name}")));
    }
    Ok(())
}

#[async_trait]
impl ObjectStore for MemoryStore {
    fn region(&self) -> Option<String> {
        self.region.clone()
    }

    async fn list_buckets(&self) -> Result<Vec<BucketInfo>> {
        let state = self.state()?;
        Ok(state
            .buckets
            .iter()
            .map(|(name, bucket)| BucketInfo {
                name: name.clone(),
                creation_date: Some(bucket.created),
            })
            .collect())
    }

    async fn create_bucket(&self, bucket: &str, region: &str) -> Result<CreateBucketOutput> {
        validate_bucket_name(bucket)?;
        let mut state = self.state()?;
        if state.buckets.contains_key(bucket) {
            return Err(Error::Conflict(format!("Bucket already exists: {bucket}")));
        }

        state.buckets.insert(
            bucket.to_string(),
            MemBucket {
                region: region.to_string(),
                created: Timestamp::now(),
                versioning: BucketVersioning::Unversioned,
                objects: BTreeMap::new(),
            },
        );
        tracing::debug!(bucket, region, "memory: created bucket");

        Ok(CreateBucketOutput {
            location: Some(format!("/{bucket}")),
        })
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<()> {
        let mut state = self.state()?;
        if !state.bucket(bucket)?.is_empty() {
            return Err(Error::Conflict(format!("Bucket not empty: {bucket}")));
        }
        state.buckets.remove(bucket);
        Ok(())
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
        options: &UploadOptions,
    ) -> Result<PutObjectOutput> {
        let mut state = self.state()?;
        let target = state.bucket_mut(bucket)?;

        let etag = uuid::Uuid::new_v4().simple().to_string();
        let version = StoredVersion {
            version_id: String::new(),
            data: Some(data),
            last_modified: Timestamp::now(),
            etag: etag.clone(),
            storage_class: options.storage_class.unwrap_or(StorageClass::Standard),
            server_side_encryption: options.server_side_encryption.map(|s| s.as_str().to_string()),
            content_type: options.content_type.clone(),
            metadata: BTreeMap::new(),
            acl: options.acl.unwrap_or(CannedAcl::Private),
        };
        let version_id = target.push_version(key, version);

        Ok(PutObjectOutput {
            etag: Some(etag),
            version_id,
        })
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        let state = self.state()?;
        let current = state.bucket(bucket)?.current(bucket, key)?;
        Ok(current.data.clone().unwrap_or_default())
    }

    async fn head_object(&self, bucket: &str, key: &str) -> Result<ObjectInfo> {
        let state = self.state()?;
        let target = state.bucket(bucket)?;
        Ok(target.current(bucket, key)?.info(key, target.versioning))
    }

    async fn copy_object(
        &self,
        src_bucket: &str,
        src_key: &str,
        dst_bucket: &str,
        dst_key: &str,
    ) -> Result<()> {
        let mut state = self.state()?;
        let source = state.bucket(src_bucket)?.current(src_bucket, src_key)?.clone();
        let target = state.bucket_mut(dst_bucket)?;

        let copy = StoredVersion {
            last_modified: Timestamp::now(),
            storage_class: StorageClass::Standard,
            server_side_encryption: None,
            acl: CannedAcl::Private,
            ..source
        };
        target.push_version(dst_key, copy);
        Ok(())
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        let mut state = self.state()?;
        state.bucket_mut(bucket)?.delete_current(key);
        Ok(())
    }

    async fn delete_objects(
        &self,
        bucket: &str,
        objects: Vec<ObjectIdentifier>,
    ) -> Result<Vec<ObjectIdentifier>> {
        if objects.is_empty() {
            return Err(Error::InvalidArgument(
                "delete request must name at least one object".into(),
            ));
        }

        let mut state = self.state()?;
        let target = state.bucket_mut(bucket)?;
        for object in &objects {
            match &object.version_id {
                Some(version_id) => target.delete_version(&object.key, version_id),
                None => target.delete_current(&object.key),
            }
        }
        Ok(objects)
    }

    async fn list_objects(&self, bucket: &str) -> Result<Vec<ObjectInfo>> {
        let state = self.state()?;
        let source = state.bucket(bucket)?;
        Ok(source
            .objects
            .iter()
            .filter_map(|(key, versions)| {
                versions
                    .last()
                    .filter(|v| !v.is_delete_marker())
                    .map(|v| ObjectInfo {
                        // Listings do not carry per-version details
                        version_id: None,
                        metadata: BTreeMap::new(),
                        ..v.info(key, source.versioning)
                    })
            })
            .collect())
    }

    async fn list_object_versions(&self, bucket: &str) -> Result<Vec<ObjectVersion>> {
        let state = self.state()?;
        let source = state.bucket(bucket)?;

        let mut out = Vec::new();
        for (key, versions) in &source.objects {
            let latest = versions.len().saturating_sub(1);
            for (idx, version) in versions.iter().enumerate().rev() {
                out.push(ObjectVersion {
                    key: key.clone(),
                    version_id: version.version_id.clone(),
                    is_latest: idx == latest,
                    is_delete_marker: version.is_delete_marker(),
                    last_modified: Some(version.last_modified),
                });
            }
        }
        Ok(out)
    }

    async fn get_object_acl(&self, bucket: &str, key: &str) -> Result<Vec<Grant>> {
        let state = self.state()?;
        let current = state.bucket(bucket)?.current(bucket, key)?;
        Ok(current.acl.grants(&self.owner))
    }

    async fn put_object_acl(&self, bucket: &str, key: &str, acl: CannedAcl) -> Result<()> {
        let mut state = self.state()?;
        state.bucket_mut(bucket)?.current_mut(bucket, key)?.acl = acl;
        Ok(())
    }

    async fn get_versioning(&self, bucket: &str) -> Result<BucketVersioning> {
        Ok(self.state()?.bucket(bucket)?.versioning)
    }

    async fn set_versioning(&self, bucket: &str, enabled: bool) -> Result<()> {
        let mut state = self.state()?;
        let target = state.bucket_mut(bucket)?;
        target.versioning = if enabled {
            BucketVersioning::Enabled
        } else {
            BucketVersioning::Suspended
        };
        Ok(())
    }
}
