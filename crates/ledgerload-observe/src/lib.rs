// Iron Lotus: Allow unwrap/expect in tests for clear failure messages
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

//! # ledgerload-observe
//!
//! Host resource sampling for the ledgerload harness.
//!
//! - [`HostMonitor`] reads process CPU and host memory from /proc
//! - [`ResourceSampler`] appends one sample per tick until its guard is stopped
//!
//! ## Iron Lotus Framework
//!
//! - **Genchi Genbutsu** (現地現物): Direct observation of the host under load
//! - **Visual Management** (目で見る管理): Resource timeline alongside every run
//!
//! ## Example
//!
//! ```rust,ignore
//! use ledgerload_observe::ResourceSampler;
//!
//! let guard = ResourceSampler::new(Duration::from_secs(1), counter.clone()).start();
//! // ... drive load ...
//! let samples = guard.stop().await?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod monitor;
pub mod sampler;

pub use error::{ObserveError, Result};
pub use monitor::{HostMonitor, HostSnapshot, MemInfo, host_memory_total};
pub use sampler::{ResourceSampler, SamplerGuard};
