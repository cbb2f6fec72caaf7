//! The scripted object storage walkthrough
//!
//! Runs a fixed sequence of bucket and object operations. Each step returns a
//! typed `Result`; a failed step is printed by error kind, recorded in the
//! report, and the sequence carries on with the next step. Names are derived
//! before the requests that use them, so a failed bucket creation still leaves
//! a name for later steps to (independently) fail on.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::WalkthroughSettings;
use crate::error::{Error, Result};
use crate::local;
use crate::options::{BucketVersioning, CannedAcl, Grant, ServerSideEncryption, StorageClass, UploadOptions};
use crate::resource::{BucketCreator, Resource};
use crate::traits::{CreateBucketOutput, ObjectIdentifier, ObjectVersion};

/// S3 accepts at most this many keys per delete-objects request
pub const MAX_DELETE_BATCH: usize = 1000;

/// A generated local file: `size` repetitions of `content`
#[derive(Debug, Clone, Copy)]
pub struct FileSpec {
    pub suffix: &'static str,
    pub size: usize,
    pub content: char,
}

pub const FIRST_FILE: FileSpec = FileSpec {
    suffix: "firstfile.txt",
    size: 300,
    content: 'f',
};

pub const SECOND_FILE: FileSpec = FileSpec {
    suffix: "secondfile.txt",
    size: 400,
    content: 's',
};

pub const THIRD_FILE: FileSpec = FileSpec {
    suffix: "thirdfile.txt",
    size: 300,
    content: 't',
};

/// Sink for the human-readable trace
pub trait Trace: Send + Sync {
    fn line(&self, message: &str);

    fn failure(&self, _step: Step, error: &Error) {
        self.line(&format!("exception: {}", error.kind()));
    }
}

/// Steps of the sequence, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    CreateFirstBucket,
    CreateSecondBucket,
    CreateFirstFile,
    UploadFirstFile,
    DownloadFirstFile,
    CopyToSecondBucket,
    DeleteCopy,
    CreateSecondFile,
    UploadPublicSecondFile,
    ReadPublicAcl,
    SetPrivateAcl,
    ReadPrivateAcl,
    CreateThirdFile,
    UploadEncryptedThirdFile,
    UploadInfrequentAccessThirdFile,
    EnableVersioning,
    ReuploadSecondFile,
    ReportVersionId,
    ListBucketsViaResource,
    ListBucketsViaClient,
    ListObjectKeys,
    ListObjectDetails,
    EmptyFirstBucket,
    UploadFirstFileToSecondBucket,
    EmptySecondBucket,
    DeleteFirstBucket,
    DeleteSecondBucket,
}

impl Step {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Step::CreateFirstBucket => "create_first_bucket",
            Step::CreateSecondBucket => "create_second_bucket",
            Step::CreateFirstFile => "create_first_file",
            Step::UploadFirstFile => "upload_first_file",
            Step::DownloadFirstFile => "download_first_file",
            Step::CopyToSecondBucket => "copy_to_second_bucket",
            Step::DeleteCopy => "delete_copy",
            Step::CreateSecondFile => "create_second_file",
            Step::UploadPublicSecondFile => "upload_public_second_file",
            Step::ReadPublicAcl => "read_public_acl",
            Step::SetPrivateAcl => "set_private_acl",
            Step::ReadPrivateAcl => "read_private_acl",
            Step::CreateThirdFile => "create_third_file",
            Step::UploadEncryptedThirdFile => "upload_encrypted_third_file",
            Step::UploadInfrequentAccessThirdFile => "upload_infrequent_access_third_file",
            Step::EnableVersioning => "enable_versioning",
            Step::ReuploadSecondFile => "reupload_second_file",
            Step::ReportVersionId => "report_version_id",
            Step::ListBucketsViaResource => "list_buckets_via_resource",
            Step::ListBucketsViaClient => "list_buckets_via_client",
            Step::ListObjectKeys => "list_object_keys",
            Step::ListObjectDetails => "list_object_details",
            Step::EmptyFirstBucket => "empty_first_bucket",
            Step::UploadFirstFileToSecondBucket => "upload_first_file_to_second_bucket",
            Step::EmptySecondBucket => "empty_second_bucket",
            Step::DeleteFirstBucket => "delete_first_bucket",
            Step::DeleteSecondBucket => "delete_second_bucket",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Ok,
    Failed,
}

/// What happened in one step
#[derive(Debug, Clone, Serialize)]
pub struct StepOutcome {
    pub step: Step,
    pub status: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Result of a full run
#[derive(Debug, Clone, Serialize)]
pub struct WalkthroughReport {
    pub first_bucket: String,
    pub second_bucket: String,
    pub steps: Vec<StepOutcome>,
}

impl WalkthroughReport {
    pub fn failures(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| s.status == StepStatus::Failed)
            .count()
    }

    pub fn outcome(&self, step: Step) -> Option<&StepOutcome> {
        self.steps.iter().find(|s| s.step == step)
    }
}

/// A bucket created by [`create_bucket`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedBucket {
    pub region: String,
    pub response: CreateBucketOutput,
}

/// `prefix` followed by a fresh UUID v4
pub fn create_bucket_name(prefix: &str) -> String {
    format!("{prefix}{}", uuid::Uuid::new_v4())
}

/// Create a uniquely named bucket in the session region of `handle`
///
/// The name is derived before the request and returned even when creation
/// fails.
pub async fn create_bucket<H>(prefix: &str, handle: &H) -> (String, Result<CreatedBucket>)
where
    H: BucketCreator + ?Sized,
{
    let name = create_bucket_name(prefix);
    let result = create_in_session_region(&name, handle).await;
    (name, result)
}

async fn create_in_session_region<H>(name: &str, handle: &H) -> Result<CreatedBucket>
where
    H: BucketCreator + ?Sized,
{
    let region = handle
        .session_region()
        .ok_or_else(|| Error::Config("no region configured for the session".into()))?;
    let response = handle.create_in_region(name, &region).await?;
    Ok(CreatedBucket { region, response })
}

/// Server-side copy of `key` from one bucket into another under the same key
pub async fn copy_to_bucket(resource: &Resource, from: &str, to: &str, key: &str) -> Result<()> {
    let source = resource.object(from, key);
    resource.object(to, key).copy_from(&source).await
}

/// Enable versioning on `bucket` and return the status read back
pub async fn enable_bucket_versioning(resource: &Resource, bucket: &str) -> Result<BucketVersioning> {
    let bucket = resource.bucket(bucket);
    bucket.enable_versioning().await?;
    bucket.versioning().await
}

async fn version_identifiers(resource: &Resource, bucket: &str) -> Result<Vec<ObjectIdentifier>> {
    let versions = resource.bucket(bucket).object_versions().await?;
    Ok(versions.iter().map(ObjectVersion::identifier).collect())
}

/// Sends nothing for an empty list, and at most [`MAX_DELETE_BATCH`]
/// identifiers per request.
async fn delete_identifiers(
    resource: &Resource,
    bucket: &str,
    identifiers: &[ObjectIdentifier],
) -> Result<()> {
    let bucket = resource.bucket(bucket);
    if identifiers.is_empty() {
        tracing::debug!(bucket = bucket.name(), "bucket already empty, skipping delete-objects");
        return Ok(());
    }

    for batch in identifiers.chunks(MAX_DELETE_BATCH) {
        let deleted = bucket.delete_objects(batch.to_vec()).await?;
        if deleted.len() < batch.len() {
            tracing::warn!(
                bucket = bucket.name(),
                requested = batch.len(),
                deleted = deleted.len(),
                "provider did not delete every requested version"
            );
        }
    }
    Ok(())
}

/// Delete every object version and delete marker in `bucket`
///
/// The identifier list is printed to `trace` as JSON before the delete
/// request. Returns the identifiers that were sent. An empty bucket sends no
/// request.
pub async fn delete_all_objects(
    resource: &Resource,
    bucket: &str,
    trace: &dyn Trace,
) -> Result<Vec<ObjectIdentifier>> {
    let identifiers = version_identifiers(resource, bucket).await?;
    trace.line(&serde_json::to_string(&identifiers)?);
    delete_identifiers(resource, bucket, &identifiers).await?;
    Ok(identifiers)
}

fn or_none(value: Option<&str>) -> &str {
    value.unwrap_or("None")
}

fn format_grants(grants: &[Grant]) -> String {
    let items: Vec<String> = grants.iter().map(Grant::to_string).collect();
    format!("[{}]", items.join(", "))
}

/// Drives the scripted sequence
pub struct Walkthrough<'t> {
    resource: Resource,
    settings: WalkthroughSettings,
    trace: &'t dyn Trace,
    outcomes: Vec<StepOutcome>,
}

impl<'t> Walkthrough<'t> {
    pub fn new(resource: Resource, settings: WalkthroughSettings, trace: &'t dyn Trace) -> Self {
        Self {
            resource,
            settings,
            trace,
            outcomes: Vec::new(),
        }
    }

    fn record<T>(&mut self, step: Step, result: Result<T>) -> Option<T> {
        match result {
            Ok(value) => {
                tracing::debug!(%step, "step succeeded");
                self.outcomes.push(StepOutcome {
                    step,
                    status: StepStatus::Ok,
                    error_kind: None,
                    message: None,
                    note: None,
                });
                Some(value)
            }
            Err(error) => {
                tracing::debug!(%step, %error, "step failed");
                self.trace.failure(step, &error);
                self.outcomes.push(StepOutcome {
                    step,
                    status: StepStatus::Failed,
                    error_kind: Some(error.kind()),
                    message: Some(error.to_string()),
                    note: None,
                });
                None
            }
        }
    }

    fn note_last(&mut self, note: String) {
        if let Some(outcome) = self.outcomes.last_mut() {
            outcome.note = Some(note);
        }
    }

    fn write_file(&mut self, step: Step, file: FileSpec) -> (PathBuf, String) {
        let (path, result) =
            local::create_temp_file(&self.settings.work_dir, file.size, file.suffix, &file.content);
        self.record(step, result);
        let key = local::file_key(&path).unwrap_or_default();
        (path, key)
    }

    async fn upload(&self, bucket: &str, key: &str, path: &Path, options: &UploadOptions) -> Result<()> {
        self.resource
            .object(bucket, key)
            .upload_file(path, options)
            .await
            .map(|_| ())
    }

    async fn print_grants(&self, bucket: &str, key: &str) -> Result<()> {
        let grants = self.resource.object(bucket, key).acl().grants().await?;
        self.trace.line(&format_grants(&grants));
        Ok(())
    }

    fn announce(&self, name: &str, result: Result<CreatedBucket>) -> Result<CreatedBucket> {
        let created = result?;
        self.trace.line(&format!("{name} {}", created.region));
        Ok(created)
    }

    /// Run every step and return the per-step report
    pub async fn run(mut self) -> WalkthroughReport {
        let resource = self.resource.clone();
        let download_dir = self.settings.download_dir();

        // Buckets: one through the operation handle, one through the entity handle
        let (first_bucket, result) =
            create_bucket(&self.settings.first_bucket_prefix, resource.client()).await;
        let result = self.announce(&first_bucket, result);
        self.record(Step::CreateFirstBucket, result);

        let (second_bucket, result) =
            create_bucket(&self.settings.second_bucket_prefix, &resource).await;
        let result = self.announce(&second_bucket, result);
        self.record(Step::CreateSecondBucket, result);

        // First file: upload, download, copy across and delete the copy
        let (first_path, first_key) = self.write_file(Step::CreateFirstFile, FIRST_FILE);

        let result = self
            .upload(&first_bucket, &first_key, &first_path, &UploadOptions::default())
            .await;
        self.record(Step::UploadFirstFile, result);

        let result = self
            .resource
            .object(&first_bucket, &first_key)
            .download_file(&download_dir.join(&first_key))
            .await;
        self.record(Step::DownloadFirstFile, result);

        let result = copy_to_bucket(&self.resource, &first_bucket, &second_bucket, &first_key).await;
        self.record(Step::CopyToSecondBucket, result);

        let result = self.resource.object(&second_bucket, &first_key).delete().await;
        self.record(Step::DeleteCopy, result);

        // Second file: public-read, then private
        let (second_path, second_key) = self.write_file(Step::CreateSecondFile, SECOND_FILE);

        let options = UploadOptions::default().with_acl(CannedAcl::PublicRead);
        let result = self
            .upload(&first_bucket, &second_key, &second_path, &options)
            .await;
        self.record(Step::UploadPublicSecondFile, result);

        let result = self.print_grants(&first_bucket, &second_key).await;
        self.record(Step::ReadPublicAcl, result);

        let result = self
            .resource
            .object(&first_bucket, &second_key)
            .acl()
            .put(CannedAcl::Private)
            .await;
        self.record(Step::SetPrivateAcl, result);

        let result = self.print_grants(&first_bucket, &second_key).await;
        self.record(Step::ReadPrivateAcl, result);

        // Third file: encryption, then encryption plus storage class
        let (third_path, third_key) = self.write_file(Step::CreateThirdFile, THIRD_FILE);
        let third = self.resource.object(&first_bucket, &third_key);

        let options = UploadOptions::default().with_encryption(ServerSideEncryption::Aes256);
        let result = match self.upload(&first_bucket, &third_key, &third_path, &options).await {
            Ok(()) => third.load().await.map(|info| {
                self.trace.line(or_none(info.server_side_encryption.as_deref()));
            }),
            Err(e) => Err(e),
        };
        self.record(Step::UploadEncryptedThirdFile, result);

        let options = options.with_storage_class(StorageClass::StandardIa);
        let result = match self.upload(&first_bucket, &third_key, &third_path, &options).await {
            Ok(()) => third.load().await.map(|info| {
                self.trace.line(or_none(info.storage_class.as_deref()));
            }),
            Err(e) => Err(e),
        };
        self.record(Step::UploadInfrequentAccessThirdFile, result);

        // Versioning
        let result = enable_bucket_versioning(&self.resource, &first_bucket).await;
        if let Ok(status) = &result {
            self.trace.line(&status.to_string());
        }
        self.record(Step::EnableVersioning, result);

        let result = self
            .upload(&first_bucket, &second_key, &second_path, &UploadOptions::default())
            .await;
        self.record(Step::ReuploadSecondFile, result);

        // Reports the first file's version id although the second file was
        // the one just re-uploaded. Kept for trace parity; flagged below.
        let result = self.resource.object(&first_bucket, &first_key).load().await;
        if let Ok(info) = &result {
            self.trace.line(or_none(info.version_id.as_deref()));
        }
        let reported = self.record(Step::ReportVersionId, result).is_some();
        if reported {
            tracing::warn!(
                reported = %first_key,
                reuploaded = %second_key,
                "version id printed belongs to the first file, not the re-uploaded second file"
            );
            self.note_last(format!(
                "version id is for {first_key}; {second_key} was the object re-uploaded"
            ));
        }

        // Listings
        let result = self.resource.buckets().await.map(|buckets| {
            for bucket in buckets {
                self.trace.line(bucket.name());
            }
        });
        self.record(Step::ListBucketsViaResource, result);

        let result = self.resource.client().list_buckets().await.map(|buckets| {
            for bucket in buckets {
                self.trace.line(&bucket.name);
            }
        });
        self.record(Step::ListBucketsViaClient, result);

        let first = self.resource.bucket(&first_bucket);
        let result = first.objects().await.map(|objects| {
            for object in objects {
                self.trace.line(object.key());
            }
        });
        self.record(Step::ListObjectKeys, result);

        let result = self.list_object_details(&first_bucket).await;
        self.record(Step::ListObjectDetails, result);

        // Cleanup
        let result = delete_all_objects(&self.resource, &first_bucket, self.trace).await;
        self.record(Step::EmptyFirstBucket, result);

        let result = self
            .upload(&second_bucket, &first_key, &first_path, &UploadOptions::default())
            .await;
        self.record(Step::UploadFirstFileToSecondBucket, result);

        let result = delete_all_objects(&self.resource, &second_bucket, self.trace).await;
        self.record(Step::EmptySecondBucket, result);

        let result = first.delete().await;
        self.record(Step::DeleteFirstBucket, result);

        let result = self.resource.client().delete_bucket(&second_bucket).await;
        self.record(Step::DeleteSecondBucket, result);

        WalkthroughReport {
            first_bucket,
            second_bucket,
            steps: self.outcomes,
        }
    }

    async fn list_object_details(&self, bucket: &str) -> Result<()> {
        for summary in self.resource.bucket(bucket).objects().await? {
            let full = summary.object.load().await?;
            let last_modified = summary
                .info
                .last_modified
                .map(|ts| ts.to_string())
                .unwrap_or_else(|| "None".to_string());
            self.trace.line(&format!(
                "{} {} {} {} {:?}",
                summary.key(),
                or_none(summary.info.storage_class.as_deref()),
                last_modified,
                or_none(full.version_id.as_deref()),
                full.metadata
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::traits::{MockObjectStore, ObjectStore};
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    const REGION: &str = "eu-central-1";

    #[derive(Default)]
    struct RecordingTrace {
        lines: Mutex<Vec<String>>,
    }

    impl RecordingTrace {
        fn lines(&self) -> Vec<String> {
            self.lines.lock().unwrap().clone()
        }
    }

    impl Trace for RecordingTrace {
        fn line(&self, message: &str) {
            self.lines.lock().unwrap().push(message.to_string());
        }
    }

    fn memory_resource(region: Option<&str>) -> (Resource, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new(region.map(str::to_string)));
        (Resource::new(store.clone()), store)
    }

    fn settings(work: &TempDir, downloads: &TempDir) -> WalkthroughSettings {
        WalkthroughSettings {
            first_bucket_prefix: "test-".into(),
            second_bucket_prefix: "second-".into(),
            work_dir: work.path().to_path_buf(),
            download_dir: Some(downloads.path().to_path_buf()),
        }
    }

    #[test]
    fn test_create_bucket_name() {
        let a = create_bucket_name("test-");
        let b = create_bucket_name("test-");
        assert!(a.starts_with("test-"));
        assert_eq!(a.len(), "test-".len() + 36);
        assert!(uuid::Uuid::parse_str(&a["test-".len()..]).is_ok());
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_create_bucket_uses_session_region() {
        let (resource, store) = memory_resource(Some(REGION));

        let (client_name, via_client) = create_bucket("test-", resource.client()).await;
        let (resource_name, via_resource) = create_bucket("test-", &resource).await;
        let via_client = via_client.unwrap();
        via_resource.unwrap();

        assert_eq!(via_client.region, REGION);
        assert_eq!(store.bucket_region(&client_name).unwrap(), REGION);
        assert_eq!(store.bucket_region(&resource_name).unwrap(), REGION);
        assert_eq!(via_client.response.location, Some(format!("/{client_name}")));
    }

    #[tokio::test]
    async fn test_create_bucket_without_region_fails() {
        let (resource, store) = memory_resource(None);
        let (name, result) = create_bucket("test-", &resource).await;
        assert!(name.starts_with("test-"));
        assert!(matches!(result, Err(Error::Config(_))));
        assert!(store.list_buckets().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_all_objects_on_empty_bucket() {
        let (resource, store) = memory_resource(Some(REGION));
        store.create_bucket("empty-bucket", REGION).await.unwrap();

        let trace = RecordingTrace::default();
        let sent = delete_all_objects(&resource, "empty-bucket", &trace).await.unwrap();
        assert!(sent.is_empty());
        assert_eq!(trace.lines(), vec!["[]".to_string()]);
        assert!(store.list_object_versions("empty-bucket").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_all_objects_clears_versions() {
        let (resource, store) = memory_resource(Some(REGION));
        store.create_bucket("bucket-a", REGION).await.unwrap();
        enable_bucket_versioning(&resource, "bucket-a").await.unwrap();
        for body in [b"1".to_vec(), b"2".to_vec()] {
            store
                .put_object("bucket-a", "k", body, &UploadOptions::default())
                .await
                .unwrap();
        }
        store.delete_object("bucket-a", "k").await.unwrap();

        let trace = RecordingTrace::default();
        let sent = delete_all_objects(&resource, "bucket-a", &trace).await.unwrap();
        assert_eq!(sent.len(), 3);

        // Printed before the delete request, so every version id is listed
        let printed: Vec<ObjectIdentifier> = serde_json::from_str(&trace.lines()[0]).unwrap();
        assert_eq!(printed, sent);
        assert!(store.list_object_versions("bucket-a").await.unwrap().is_empty());
        store.delete_bucket("bucket-a").await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_all_objects_batches_large_sets() {
        let (resource, store) = memory_resource(Some(REGION));
        store.create_bucket("bucket-a", REGION).await.unwrap();
        for i in 0..(MAX_DELETE_BATCH + 5) {
            store
                .put_object("bucket-a", &format!("k{i}"), Vec::new(), &UploadOptions::default())
                .await
                .unwrap();
        }

        let sent = delete_all_objects(&resource, "bucket-a", &RecordingTrace::default())
            .await
            .unwrap();
        assert_eq!(sent.len(), MAX_DELETE_BATCH + 5);
        assert!(store.list_objects("bucket-a").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_versioning_produces_distinct_versions() {
        let (resource, store) = memory_resource(Some(REGION));
        store.create_bucket("bucket-a", REGION).await.unwrap();

        let status = enable_bucket_versioning(&resource, "bucket-a").await.unwrap();
        assert_eq!(status, BucketVersioning::Enabled);

        let first = store
            .put_object("bucket-a", "k", b"one".to_vec(), &UploadOptions::default())
            .await
            .unwrap();
        let second = store
            .put_object("bucket-a", "k", b"two".to_vec(), &UploadOptions::default())
            .await
            .unwrap();
        assert_ne!(first.version_id, second.version_id);

        let versions = store.list_object_versions("bucket-a").await.unwrap();
        let ids: Vec<_> = versions.iter().map(|v| Some(v.version_id.clone())).collect();
        assert!(ids.contains(&first.version_id));
        assert!(ids.contains(&second.version_id));
    }

    #[tokio::test]
    async fn test_copy_then_delete_copy() {
        let (resource, store) = memory_resource(Some(REGION));
        store.create_bucket("bucket-a", REGION).await.unwrap();
        store.create_bucket("bucket-b", REGION).await.unwrap();
        store
            .put_object("bucket-a", "k", b"payload".to_vec(), &UploadOptions::default())
            .await
            .unwrap();

        copy_to_bucket(&resource, "bucket-a", "bucket-b", "k").await.unwrap();
        resource.object("bucket-b", "k").delete().await.unwrap();

        assert_eq!(store.get_object("bucket-a", "k").await.unwrap(), b"payload");
        assert!(matches!(
            store.head_object("bucket-b", "k").await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_copy_to_missing_bucket_fails() {
        let (resource, store) = memory_resource(Some(REGION));
        store.create_bucket("bucket-a", REGION).await.unwrap();
        store
            .put_object("bucket-a", "k", b"x".to_vec(), &UploadOptions::default())
            .await
            .unwrap();

        let err = copy_to_bucket(&resource, "bucket-a", "missing", "k")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "NotFound");
    }

    #[tokio::test]
    async fn test_bucket_file_download_delete_scenario() {
        let work = TempDir::new().unwrap();
        let (resource, store) = memory_resource(Some(REGION));

        let (name, result) = create_bucket("test-", &resource).await;
        result.unwrap();
        let suffix = &name["test-".len()..];
        assert_eq!(suffix.len(), 36);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit() || c == '-'));

        let (path, result) = local::create_temp_file(work.path(), 10, "file.txt", &'a');
        result.unwrap();
        let key = local::file_key(&path).unwrap();
        let object = resource.object(&name, &key);
        object.upload_file(&path, &UploadOptions::default()).await.unwrap();

        let target = work.path().join("downloaded");
        object.download_file(&target).await.unwrap();
        assert_eq!(std::fs::read(&target).unwrap(), std::fs::read(&path).unwrap());

        delete_all_objects(&resource, &name, &RecordingTrace::default())
            .await
            .unwrap();
        resource.bucket(&name).delete().await.unwrap();

        let names: Vec<_> = store
            .list_buckets()
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.name)
            .collect();
        assert!(!names.contains(&name));
    }

    #[tokio::test]
    async fn test_full_run_against_memory_store() {
        let work = TempDir::new().unwrap();
        let downloads = TempDir::new().unwrap();
        let (resource, store) = memory_resource(Some(REGION));
        let trace = RecordingTrace::default();

        let report = Walkthrough::new(resource, settings(&work, &downloads), &trace)
            .run()
            .await;

        assert_eq!(report.failures(), 0, "{:#?}", report.steps);
        assert_eq!(report.steps.len(), 27);
        assert!(report.first_bucket.starts_with("test-"));
        assert!(report.second_bucket.starts_with("second-"));

        let lines = trace.lines();
        assert_eq!(lines[0], format!("{} {}", report.first_bucket, REGION));
        assert_eq!(lines[1], format!("{} {}", report.second_bucket, REGION));
        assert!(lines.iter().any(|l| l.contains("READ: Group")));
        assert!(lines.contains(&"AES256".to_string()));
        assert!(lines.contains(&"STANDARD_IA".to_string()));
        assert!(lines.contains(&"Enabled".to_string()));
        assert!(!lines.iter().any(|l| l.starts_with("exception:")));

        // First file was written before versioning, so it reports the null version
        let note = report.outcome(Step::ReportVersionId).unwrap().note.as_deref();
        assert!(note.is_some_and(|n| n.contains("firstfile.txt")));
        let version_line = lines
            .iter()
            .position(|l| l == "Enabled")
            .map(|idx| &lines[idx + 1]);
        assert_eq!(version_line.map(String::as_str), Some("null"));

        // Downloaded copy matches the local file
        let downloaded: Vec<_> = std::fs::read_dir(downloads.path())
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        assert_eq!(downloaded.len(), 1);
        assert_eq!(std::fs::read_to_string(&downloaded[0]).unwrap(), "f".repeat(300));

        // Local files stay behind, remote buckets are gone
        assert_eq!(std::fs::read_dir(work.path()).unwrap().count(), 3);
        assert!(store.list_buckets().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_the_sequence() {
        let work = TempDir::new().unwrap();
        let downloads = TempDir::new().unwrap();

        let mut mock = MockObjectStore::new();
        mock.expect_region().return_const(Some(REGION.to_string()));
        mock.expect_create_bucket()
            .returning(|_, _| Err(Error::Auth("AccessDenied".into())));
        mock.expect_put_object()
            .returning(|_, _, _, _| Err(Error::NotFound("bucket".into())));
        mock.expect_get_object()
            .returning(|_, _| Err(Error::NotFound("bucket".into())));
        mock.expect_head_object()
            .returning(|_, _| Err(Error::NotFound("bucket".into())));
        mock.expect_copy_object()
            .returning(|_, _, _, _| Err(Error::NotFound("bucket".into())));
        mock.expect_delete_object()
            .returning(|_, _| Err(Error::NotFound("bucket".into())));
        mock.expect_get_object_acl()
            .returning(|_, _| Err(Error::NotFound("bucket".into())));
        mock.expect_put_object_acl()
            .returning(|_, _, _| Err(Error::NotFound("bucket".into())));
        mock.expect_set_versioning()
            .returning(|_, _| Err(Error::NotFound("bucket".into())));
        mock.expect_list_buckets()
            .returning(|| Err(Error::Network("connection reset".into())));
        mock.expect_list_objects()
            .returning(|_| Err(Error::NotFound("bucket".into())));
        mock.expect_list_object_versions()
            .returning(|_| Err(Error::NotFound("bucket".into())));
        mock.expect_delete_objects().never();
        mock.expect_delete_bucket()
            .returning(|_| Err(Error::NotFound("bucket".into())));

        let trace = RecordingTrace::default();
        let report = Walkthrough::new(
            Resource::new(Arc::new(mock)),
            settings(&work, &downloads),
            &trace,
        )
        .run()
        .await;

        assert_eq!(report.steps.len(), 27);
        // Only the three local file writes succeed
        assert_eq!(report.failures(), 24);
        for step in [Step::CreateFirstFile, Step::CreateSecondFile, Step::CreateThirdFile] {
            assert_eq!(report.outcome(step).unwrap().status, StepStatus::Ok);
        }

        let create = report.outcome(Step::CreateFirstBucket).unwrap();
        assert_eq!(create.error_kind, Some("AuthError"));
        let delete = report.outcome(Step::DeleteSecondBucket).unwrap();
        assert_eq!(delete.error_kind, Some("NotFound"));

        let lines = trace.lines();
        assert_eq!(lines[0], "exception: AuthError");
        assert!(lines.contains(&"exception: NetworkError".to_string()));
    }

    #[test]
    fn test_step_outcome_serialization() {
        let outcome = StepOutcome {
            step: Step::EmptyFirstBucket,
            status: StepStatus::Failed,
            error_kind: Some("NotFound"),
            message: Some("Not found: bucket".into()),
            note: None,
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["step"], "empty_first_bucket");
        assert_eq!(json["status"], "failed");
        assert_eq!(json["error_kind"], "NotFound");
        assert!(json.get("note").is_none());
    }
}
