//! SparkPost IP Pools client.
//!
//! Create, fetch, list, update and delete the IP pools of a SparkPost account.
//!
//! ```no_run
//! use serde_json::json;
//! use sparkpost_ip_pools::IpPools;
//!
//! # async fn run() -> sparkpost_ip_pools::Result<()> {
//! let pools = IpPools::new("my-api-key")?;
//! let created = pools
//!     .create(&json!({"name": "Marketing IP Pool", "fbl_signing_domain": "sparkpostmail.com"}))
//!     .await?;
//! println!("created {}", created["id"]);
//!
//! for pool in pools.list().await? {
//!     println!("{}", pool["name"]);
//! }
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]

pub mod client;
pub mod models;

pub use client::{IpPools, IpPoolsBuilder};
pub use models::{CreateIpPoolRequest, CreatedIpPool, IpPool, IpPoolIp, UpdateIpPoolRequest};

/// Convenient result alias that reuses the shared SparkPost error type.
pub type Result<T> = sparkpost_core::Result<T>;
