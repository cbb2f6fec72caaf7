//! Per-upload options and access-control types
//!
//! Each enum round-trips through the provider's wire string, so the same
//! values are used in config files, SDK requests and trace output.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Group URI granted READ by the `public-read` canned ACL
pub const ALL_USERS_URI: &str = "http://acs.amazonaws.com/groups/global/AllUsers";

/// Canned ACL applied on upload or via put-object-acl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CannedAcl {
    Private,
    PublicRead,
}

impl CannedAcl {
    pub const fn as_str(&self) -> &'static str {
        match self {
            CannedAcl::Private => "private",
            CannedAcl::PublicRead => "public-read",
        }
    }

    /// Grants the provider materializes for this ACL on an object owned by `owner`
    pub fn grants(&self, owner: &Grantee) -> Vec<Grant> {
        let mut grants = vec![Grant::new(owner.clone(), Permission::FullControl)];
        if *self == CannedAcl::PublicRead {
            grants.push(Grant::new(
                Grantee::Group {
                    uri: ALL_USERS_URI.to_string(),
                },
                Permission::Read,
            ));
        }
        grants
    }
}

impl FromStr for CannedAcl {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "private" => Ok(CannedAcl::Private),
            "public-read" => Ok(CannedAcl::PublicRead),
            other => Err(Error::InvalidArgument(format!(
                "Invalid ACL '{other}'. Valid ACLs: private, public-read"
            ))),
        }
    }
}

impl fmt::Display for CannedAcl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Server-side encryption requested on upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServerSideEncryption {
    #[serde(rename = "AES256")]
    Aes256,
}

impl ServerSideEncryption {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ServerSideEncryption::Aes256 => "AES256",
        }
    }
}

impl FromStr for ServerSideEncryption {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "AES256" => Ok(ServerSideEncryption::Aes256),
            other => Err(Error::InvalidArgument(format!(
                "Invalid server-side encryption '{other}'. Valid values: AES256"
            ))),
        }
    }
}

impl fmt::Display for ServerSideEncryption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Storage class requested on upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StorageClass {
    Standard,
    StandardIa,
}

impl StorageClass {
    pub const fn as_str(&self) -> &'static str {
        match self {
            StorageClass::Standard => "STANDARD",
            StorageClass::StandardIa => "STANDARD_IA",
        }
    }
}

impl FromStr for StorageClass {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().replace('-', "_").as_str() {
            "STANDARD" => Ok(StorageClass::Standard),
            "STANDARD_IA" => Ok(StorageClass::StandardIa),
            other => Err(Error::InvalidArgument(format!(
                "Invalid storage class '{other}'. Valid classes: STANDARD, STANDARD_IA"
            ))),
        }
    }
}

impl fmt::Display for StorageClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options applied to a single upload
///
/// `None` leaves the choice to the provider (private, unencrypted, STANDARD
/// on S3).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadOptions {
    pub acl: Option<CannedAcl>,
    pub server_side_encryption: Option<ServerSideEncryption>,
    pub storage_class: Option<StorageClass>,
    pub content_type: Option<String>,
}

impl UploadOptions {
    pub fn with_acl(mut self, acl: CannedAcl) -> Self {
        self.acl = Some(acl);
        self
    }

    pub fn with_encryption(mut self, sse: ServerSideEncryption) -> Self {
        self.server_side_encryption = Some(sse);
        self
    }

    pub fn with_storage_class(mut self, class: StorageClass) -> Self {
        self.storage_class = Some(class);
        self
    }
}

/// ACL permission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Permission {
    FullControl,
    Read,
    Write,
    ReadAcp,
    WriteAcp,
}

impl Permission {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Permission::FullControl => "FULL_CONTROL",
            Permission::Read => "READ",
            Permission::Write => "WRITE",
            Permission::ReadAcp => "READ_ACP",
            Permission::WriteAcp => "WRITE_ACP",
        }
    }
}

impl FromStr for Permission {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "FULL_CONTROL" => Ok(Permission::FullControl),
            "READ" => Ok(Permission::Read),
            "WRITE" => Ok(Permission::Write),
            "READ_ACP" => Ok(Permission::ReadAcp),
            "WRITE_ACP" => Ok(Permission::WriteAcp),
            other => Err(Error::InvalidArgument(format!("Unknown permission '{other}'"))),
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who a grant applies to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Grantee {
    CanonicalUser {
        id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        display_name: Option<String>,
    },
    Group {
        uri: String,
    },
}

impl fmt::Display for Grantee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Grantee::CanonicalUser {
                display_name: Some(name),
                ..
            } => write!(f, "CanonicalUser {name}"),
            Grantee::CanonicalUser { id, .. } => write!(f, "CanonicalUser {id}"),
            Grantee::Group { uri } => write!(f, "Group {uri}"),
        }
    }
}

/// One access-control grant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    pub grantee: Grantee,
    pub permission: Permission,
}

impl Grant {
    pub fn new(grantee: Grantee, permission: Permission) -> Self {
        Self {
            grantee,
            permission,
        }
    }
}

impl fmt::Display for Grant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.permission, self.grantee)
    }
}

/// Versioning status of a bucket
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BucketVersioning {
    /// Versioning has never been enabled
    #[default]
    Unversioned,
    Enabled,
    Suspended,
}

impl fmt::Display for BucketVersioning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BucketVersioning::Unversioned => f.write_str("None"),
            BucketVersioning::Enabled => f.write_str("Enabled"),
            BucketVersioning::Suspended => f.write_str("Suspended"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> Grantee {
        Grantee::CanonicalUser {
            id: "abc123".into(),
            display_name: Some("owner".into()),
        }
    }

    #[test]
    fn test_canned_acl_parsing() {
        assert_eq!("public-read".parse::<CannedAcl>().unwrap(), CannedAcl::PublicRead);
        assert_eq!("PUBLIC_READ".parse::<CannedAcl>().unwrap(), CannedAcl::PublicRead);
        assert_eq!("private".parse::<CannedAcl>().unwrap(), CannedAcl::Private);
        assert!("public-read-write".parse::<CannedAcl>().is_err());
    }

    #[test]
    fn test_storage_class_parsing() {
        assert_eq!("standard_ia".parse::<StorageClass>().unwrap(), StorageClass::StandardIa);
        assert_eq!("STANDARD-IA".parse::<StorageClass>().unwrap(), StorageClass::StandardIa);
        assert_eq!(StorageClass::StandardIa.to_string(), "STANDARD_IA");
        assert!("GLACIER".parse::<StorageClass>().is_err());
    }

    #[test]
    fn test_sse_parsing() {
        assert_eq!("aes256".parse::<ServerSideEncryption>().unwrap(), ServerSideEncryption::Aes256);
        assert_eq!(ServerSideEncryption::Aes256.to_string(), "AES256");
        assert!("aws:kms".parse::<ServerSideEncryption>().is_err());
    }

    #[test]
    fn test_public_read_grants() {
        let grants = CannedAcl::PublicRead.grants(&owner());
        assert_eq!(grants.len(), 2);
        assert_eq!(grants[0].permission, Permission::FullControl);
        assert_eq!(
            grants[1],
            Grant::new(
                Grantee::Group {
                    uri: ALL_USERS_URI.into()
                },
                Permission::Read
            )
        );
    }

    #[test]
    fn test_private_grants() {
        let grants = CannedAcl::Private.grants(&owner());
        assert_eq!(grants, vec![Grant::new(owner(), Permission::FullControl)]);
    }

    #[test]
    fn test_grant_display() {
        let grant = Grant::new(owner(), Permission::FullControl);
        assert_eq!(grant.to_string(), "FULL_CONTROL: CanonicalUser owner");
    }

    #[test]
    fn test_upload_options_builder() {
        let options = UploadOptions::default()
            .with_encryption(ServerSideEncryption::Aes256)
            .with_storage_class(StorageClass::StandardIa);
        assert_eq!(options.acl, None);
        assert_eq!(options.server_side_encryption, Some(ServerSideEncryption::Aes256));
        assert_eq!(options.storage_class, Some(StorageClass::StandardIa));
    }
}
