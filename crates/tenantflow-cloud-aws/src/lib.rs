//! AWS provider for tenantflow
//!
//! This crate implements the ResourceApi trait for AWS, letting the
//! reconciler create QuickSight, Athena and IAM resources and poll them
//! until they settle.
//!
//! # Requirements
//!
//! - `aws` CLI v2 must be installed
//! - Credentials are resolved by the CLI (profile, environment, SSO)
//!
//! # Example
//!
//! ```ignore
//! use tenantflow_cloud::{AccountContext, Reconciler, ResourceKind, ResourceRequest};
//! use tenantflow_cloud_aws::AwsResourceApi;
//!
//! let api = AwsResourceApi::new("ap-southeast-1");
//! let reconciler = Reconciler::new(api, AccountContext::new("123456789012", "ap-southeast-1"));
//!
//! let request = ResourceRequest::new(ResourceKind::DataSet, params);
//! let outcome = reconciler.create_and_wait(&request).await?;
//! ```

pub mod awscli;
pub mod error;
pub mod provider;

pub use awscli::{AwsCli, CallerIdentity};
pub use error::{AwsError, Result};
pub use provider::AwsResourceApi;
