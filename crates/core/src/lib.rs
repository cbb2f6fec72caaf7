//! bw-core: Core library for the bucketwalk object storage walkthrough
//!
//! This crate provides:
//! - Configuration management
//! - The `ObjectStore` trait (operation handle) and `Resource` entity handles
//! - Upload options and ACL types
//! - An in-memory `ObjectStore` for offline runs and tests
//! - The walkthrough orchestrator
//!
//! It does not depend on any S3 SDK; `bw-s3` provides the AWS-backed store.

pub mod config;
pub mod error;
pub mod local;
pub mod memory;
pub mod options;
pub mod resource;
pub mod traits;
pub mod walkthrough;

pub use config::{Backend, Config, ConfigManager, ConnectionConfig, WalkthroughSettings};
pub use error::{Error, Result};
pub use memory::MemoryStore;
pub use options::{
    BucketVersioning, CannedAcl, Grant, Grantee, Permission, ServerSideEncryption, StorageClass,
    UploadOptions,
};
pub use resource::{BucketCreator, BucketRef, ObjectRef, Resource};
pub use traits::{
    BucketInfo, CreateBucketOutput, ObjectIdentifier, ObjectInfo, ObjectStore, ObjectVersion,
    PutObjectOutput,
};
pub use walkthrough::{Step, StepOutcome, StepStatus, Trace, Walkthrough, WalkthroughReport};
