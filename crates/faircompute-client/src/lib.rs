//! # faircompute-client
//!
//! Client library for the FairCompute marketplace REST API.
//!
//! The crate provides [`FairClient`], a thin authenticated request helper:
//! - `{ data, version }` request envelopes
//! - Provider key and bearer token headers
//! - Status errors carrying whatever message the API returned
//! - Tagged decoding of JSON and text responses ([`ApiResponse`])
//!
//! On top of it, [`ExecutorApi`] exposes the rental endpoint.
//!
//! ## Example
//!
//! ```no_run
//! use faircompute_client::{ExecutorApi, FairClient};
//! use faircompute_common::{FairConfig, FileTokenStore, NodeOffer, RentalSelection};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = FairClient::new(FairConfig::from_env(), FileTokenStore::default_location()?)?;
//!
//! let offer = NodeOffer::builder()
//!     .gpu_name("RTX 4090")
//!     .price("$0.45/hr")
//!     .node_id("n1")
//!     .gpus(4)
//!     .cpu_cores(32)
//!     .total_cpus(32)
//!     .dram(128)
//!     .total_ram(128)
//!     .avail_gpus(4)
//!     .build();
//!
//! let request = RentalSelection::new(offer).with_gpu_quantity(2).to_request();
//! let executor = client.create_executor(&request).await?;
//! println!("Executor ID: {}", executor.executor_id);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod rental;
pub mod response;

pub use client::{API_KEY_HEADER, FairClient, RequestOptions};
pub use error::ClientError;
pub use rental::{ExecutorApi, RENT_ENDPOINT};
pub use reqwest::Method;
pub use response::ApiResponse;
