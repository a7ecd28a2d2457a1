//! # faircompute-common
//!
//! Shared types for talking to the FairCompute marketplace API.
//!
//! This crate holds everything that does not need an HTTP stack:
//! - Environment-resolved configuration (API URL, provider key, Stripe, Omnisend)
//! - The `{ data, version }` request envelope
//! - Read-only bearer token storage
//! - Rental checkout types and the quote math behind them
//!
//! ## Example
//!
//! ```
//! use faircompute_common::{Environment, FairConfig};
//!
//! let config = FairConfig::from_lookup(|name| match name {
//!     "NEXT_PUBLIC_VERCEL_ENV" => Some("production".to_string()),
//!     "NEXT_PUBLIC_PROD_FAIR_API_URL" => Some("https://api.faircompute.com".to_string()),
//!     _ => None,
//! });
//!
//! assert_eq!(config.environment(), Environment::Production);
//! assert_eq!(config.api_url(), "https://api.faircompute.com");
//! ```

/// Environment discriminator and configuration lookup.
pub mod config;
/// Request body envelope.
pub mod envelope;
/// Rental checkout: offers, selections, quotes and the rent request.
pub mod rental;
/// Client-side bearer token storage.
pub mod token;

pub use config::{Environment, FairConfig, StripeConfig};
pub use envelope::{API_VERSION, DataEnvelope, RequestEnvelope};
pub use rental::{NodeOffer, RentRequest, RentResponse, RentalQuote, RentalSelection};
pub use token::{FileTokenStore, MemoryTokenStore, TOKEN_KEY, TokenStore};
