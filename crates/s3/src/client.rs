//! S3 client implementation
//!
//! Wraps aws-sdk-s3 and implements the ObjectStore trait from bw-core.

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{
    BucketLocationConstraint, BucketVersioningStatus, CreateBucketConfiguration, Delete,
    ObjectCannedAcl, VersioningConfiguration,
};
use aws_smithy_types::DateTime;

use bw_core::{
    BucketInfo, BucketVersioning, CannedAcl, ConnectionConfig, CreateBucketOutput, Error, Grant,
    Grantee, ObjectIdentifier, ObjectInfo, ObjectStore, ObjectVersion, Permission,
    PutObjectOutput, Result, UploadOptions,
};

use crate::error::classify;

/// Region that rejects an explicit location constraint
const US_EAST_1: &str = "us-east-1";

/// S3 client wrapper
pub struct S3Client {
    inner: aws_sdk_s3::Client,
}

impl S3Client {
    /// Create a new S3 client from the connection settings
    ///
    /// Unset fields fall back to the SDK's default provider chain
    /// (environment, shared profile, instance metadata).
    pub async fn new(config: &ConnectionConfig) -> Result<Self> {
        config.validate()?;

        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());

        if let Some(region) = &config.region {
            loader = loader.region(aws_config::Region::new(region.clone()));
        }

        if let Some((access_key, secret_key)) = config.credentials() {
            let credentials = aws_credential_types::Credentials::new(
                access_key,
                secret_key,
                None, // session token
                None, // expiry
                "bucketwalk-static-credentials",
            );
            loader = loader.credentials_provider(credentials);
        }

        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }

        let sdk_config = loader.load().await;
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.force_path_style)
            .build();

        tracing::debug!(
            region = ?config.region,
            endpoint = ?config.endpoint,
            path_style = config.force_path_style,
            "s3 client configured"
        );

        Ok(Self {
            inner: aws_sdk_s3::Client::from_conf(s3_config),
        })
    }
}

fn timestamp(value: &DateTime) -> Option<jiff::Timestamp> {
    let nanos = i32::try_from(value.subsec_nanos()).ok()?;
    jiff::Timestamp::new(value.secs(), nanos).ok()
}

fn trim_etag(etag: &str) -> String {
    etag.trim_matches('"').to_string()
}

fn location_constraint(region: &str) -> Option<CreateBucketConfiguration> {
    (region != US_EAST_1).then(|| {
        CreateBucketConfiguration::builder()
            .location_constraint(BucketLocationConstraint::from(region))
            .build()
    })
}

fn convert_grant(grant: &aws_sdk_s3::types::Grant) -> Option<Grant> {
    let permission = grant.permission()?;
    let permission: Permission = match permission.as_str().parse() {
        Ok(permission) => permission,
        Err(_) => {
            tracing::warn!(permission = permission.as_str(), "skipping unknown grant permission");
            return None;
        }
    };

    let grantee = grant.grantee()?;
    let grantee = match grantee.uri() {
        Some(uri) => Grantee::Group {
            uri: uri.to_string(),
        },
        None => Grantee::CanonicalUser {
            id: grantee
                .id()
                .or(grantee.email_address())
                .unwrap_or_default()
                .to_string(),
            display_name: grantee.display_name().map(str::to_string),
        },
    };

    Some(Grant::new(grantee, permission))
}

#[async_trait]
impl ObjectStore for S3Client {
    fn region(&self) -> Option<String> {
        self.inner.config().region().map(|r| r.to_string())
    }

    async fn list_buckets(&self) -> Result<Vec<BucketInfo>> {
        let response = self
            .inner
            .list_buckets()
            .send()
            .await
            .map_err(|e| classify(e, "buckets"))?;

        let buckets = response
            .buckets()
            .iter()
            .map(|b| {
                let mut info = BucketInfo::new(b.name().unwrap_or_default());
                info.creation_date = b.creation_date().and_then(timestamp);
                info
            })
            .collect();

        Ok(buckets)
    }

    async fn create_bucket(&self, bucket: &str, region: &str) -> Result<CreateBucketOutput> {
        let response = self
            .inner
            .create_bucket()
            .bucket(bucket)
            .set_create_bucket_configuration(location_constraint(region))
            .send()
            .await
            .map_err(|e| classify(e, bucket))?;

        Ok(CreateBucketOutput {
            location: response.location().map(str::to_string),
        })
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<()> {
        self.inner
            .delete_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| classify(e, bucket))?;

        Ok(())
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
        options: &UploadOptions,
    ) -> Result<PutObjectOutput> {
        let mut request = self
            .inner
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(data));

        if let Some(acl) = options.acl {
            request = request.acl(ObjectCannedAcl::from(acl.as_str()));
        }

        if let Some(sse) = options.server_side_encryption {
            request = request.server_side_encryption(sse.as_str().into());
        }

        if let Some(class) = options.storage_class {
            request = request.storage_class(class.as_str().into());
        }

        if let Some(ct) = &options.content_type {
            request = request.content_type(ct);
        }

        let response = request
            .send()
            .await
            .map_err(|e| classify(e, &format!("{bucket}/{key}")))?;

        Ok(PutObjectOutput {
            etag: response.e_tag().map(trim_etag),
            version_id: response.version_id().map(str::to_string),
        })
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        let response = self
            .inner
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| classify(e, &format!("{bucket}/{key}")))?;

        let data = response
            .body
            .collect()
            .await
            .map_err(|e| Error::Network(e.to_string()))?
            .into_bytes()
            .to_vec();

        Ok(data)
    }

    async fn head_object(&self, bucket: &str, key: &str) -> Result<ObjectInfo> {
        let response = self
            .inner
            .head_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| classify(e, &format!("{bucket}/{key}")))?;

        let mut info = ObjectInfo::file(key, response.content_length().unwrap_or(0));
        info.last_modified = response.last_modified().and_then(timestamp);
        info.etag = response.e_tag().map(trim_etag);
        info.content_type = response.content_type().map(str::to_string);
        info.version_id = response.version_id().map(str::to_string);
        info.storage_class = response.storage_class().map(|sc| sc.as_str().to_string());
        info.server_side_encryption = response
            .server_side_encryption()
            .map(|sse| sse.as_str().to_string());

        if let Some(metadata) = response.metadata() {
            info.metadata = metadata
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
        }

        Ok(info)
    }

    async fn copy_object(
        &self,
        src_bucket: &str,
        src_key: &str,
        dst_bucket: &str,
        dst_key: &str,
    ) -> Result<()> {
        let copy_source = format!("{src_bucket}/{src_key}");

        self.inner
            .copy_object()
            .copy_source(&copy_source)
            .bucket(dst_bucket)
            .key(dst_key)
            .send()
            .await
            .map_err(|e| classify(e, &copy_source))?;

        Ok(())
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        self.inner
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| classify(e, &format!("{bucket}/{key}")))?;

        Ok(())
    }

    async fn delete_objects(
        &self,
        bucket: &str,
        objects: Vec<ObjectIdentifier>,
    ) -> Result<Vec<ObjectIdentifier>> {
        if objects.is_empty() {
            return Ok(vec![]);
        }

        let identifiers = objects
            .into_iter()
            .map(|o| {
                aws_sdk_s3::types::ObjectIdentifier::builder()
                    .key(o.key)
                    .set_version_id(o.version_id)
                    .build()
                    .map_err(|e| Error::General(e.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;

        let delete = Delete::builder()
            .set_objects(Some(identifiers))
            .build()
            .map_err(|e| Error::General(e.to_string()))?;

        let response = self
            .inner
            .delete_objects()
            .bucket(bucket)
            .delete(delete)
            .send()
            .await
            .map_err(|e| classify(e, bucket))?;

        let deleted = response
            .deleted()
            .iter()
            .filter_map(|d| {
                d.key().map(|key| ObjectIdentifier {
                    key: key.to_string(),
                    version_id: d.version_id().map(str::to_string),
                })
            })
            .collect();

        for failure in response.errors() {
            tracing::warn!(
                bucket,
                key = failure.key().unwrap_or_default(),
                version_id = failure.version_id().unwrap_or_default(),
                code = failure.code().unwrap_or_default(),
                "object not deleted"
            );
        }

        Ok(deleted)
    }

    async fn list_objects(&self, bucket: &str) -> Result<Vec<ObjectInfo>> {
        let mut items = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let response = self
                .inner
                .list_objects_v2()
                .bucket(bucket)
                .set_continuation_token(continuation_token.take())
                .send()
                .await
                .map_err(|e| classify(e, bucket))?;

            for object in response.contents() {
                let mut info = ObjectInfo::file(
                    object.key().unwrap_or_default(),
                    object.size().unwrap_or(0),
                );
                info.last_modified = object.last_modified().and_then(timestamp);
                info.etag = object.e_tag().map(trim_etag);
                info.storage_class = object.storage_class().map(|sc| sc.as_str().to_string());
                items.push(info);
            }

            match response.next_continuation_token() {
                Some(token) if response.is_truncated().unwrap_or(false) => {
                    continuation_token = Some(token.to_string());
                }
                _ => break,
            }
        }

        Ok(items)
    }

    async fn list_object_versions(&self, bucket: &str) -> Result<Vec<ObjectVersion>> {
        let mut versions = Vec::new();
        let mut key_marker: Option<String> = None;
        let mut version_id_marker: Option<String> = None;

        loop {
            let response = self
                .inner
                .list_object_versions()
                .bucket(bucket)
                .set_key_marker(key_marker.take())
                .set_version_id_marker(version_id_marker.take())
                .send()
                .await
                .map_err(|e| classify(e, bucket))?;

            for v in response.versions() {
                versions.push(ObjectVersion {
                    key: v.key().unwrap_or_default().to_string(),
                    version_id: v.version_id().unwrap_or("null").to_string(),
                    is_latest: v.is_latest().unwrap_or(false),
                    is_delete_marker: false,
                    last_modified: v.last_modified().and_then(timestamp),
                });
            }

            for marker in response.delete_markers() {
                versions.push(ObjectVersion {
                    key: marker.key().unwrap_or_default().to_string(),
                    version_id: marker.version_id().unwrap_or("null").to_string(),
                    is_latest: marker.is_latest().unwrap_or(false),
                    is_delete_marker: true,
                    last_modified: marker.last_modified().and_then(timestamp),
                });
            }

            if !response.is_truncated().unwrap_or(false) {
                break;
            }
            key_marker = response.next_key_marker().map(str::to_string);
            version_id_marker = response.next_version_id_marker().map(str::to_string);
            if key_marker.is_none() {
                break;
            }
        }

        Ok(versions)
    }

    async fn get_object_acl(&self, bucket: &str, key: &str) -> Result<Vec<Grant>> {
        let response = self
            .inner
            .get_object_acl()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| classify(e, &format!("{bucket}/{key}")))?;

        Ok(response.grants().iter().filter_map(convert_grant).collect())
    }

    async fn put_object_acl(&self, bucket: &str, key: &str, acl: CannedAcl) -> Result<()> {
        self.inner
            .put_object_acl()
            .bucket(bucket)
            .key(key)
            .acl(ObjectCannedAcl::from(acl.as_str()))
            .send()
            .await
            .map_err(|e| classify(e, &format!("{bucket}/{key}")))?;

        Ok(())
    }

    async fn get_versioning(&self, bucket: &str) -> Result<BucketVersioning> {
        let response = self
            .inner
            .get_bucket_versioning()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| classify(e, bucket))?;

        Ok(match response.status() {
            Some(BucketVersioningStatus::Enabled) => BucketVersioning::Enabled,
            Some(BucketVersioningStatus::Suspended) => BucketVersioning::Suspended,
            _ => BucketVersioning::Unversioned,
        })
    }

    async fn set_versioning(&self, bucket: &str, enabled: bool) -> Result<()> {
        let status = if enabled {
            BucketVersioningStatus::Enabled
        } else {
            BucketVersioningStatus::Suspended
        };

        self.inner
            .put_bucket_versioning()
            .bucket(bucket)
            .versioning_configuration(VersioningConfiguration::builder().status(status).build())
            .send()
            .await
            .map_err(|e| classify(e, bucket))?;

        Ok(())
    }
}
