//! Rental checkout for a single node offer.
//!
//! A [`RentalSelection`] tracks what the user picked for one [`NodeOffer`]
//! (GPU quantity, or CPU cores for CPU-only nodes) and derives a
//! [`RentalQuote`] from it. In GPU mode the CPU cores and RAM follow the GPU
//! share of the node; in CPU mode RAM follows the core share.
//!
//! ## Example
//!
//! ```
//! use faircompute_common::{NodeOffer, RentalSelection};
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
//! let quote = RentalSelection::new(offer).with_gpu_quantity(2).quote();
//! assert_eq!(quote.cpus, 16);
//! assert_eq!(quote.ram_gb, 64);
//! assert_eq!(quote.total_price, Some(0.9));
//! ```

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// GPU name the marketplace uses for CPU-only nodes.
pub const CPU_ONLY_GPU_NAME: &str = "None";

const BYTES_PER_GB: u64 = 1024 * 1024 * 1024;

/// Body of a rent request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentRequest {
    /// Node to rent from.
    pub node_id: String,
    /// CPU cores.
    pub cpus: u32,
    /// GPUs.
    pub gpus: u32,
    /// Memory in bytes.
    pub dram: u64,
    /// Disk in bytes.
    pub disk: u64,
    /// Whether the executor gets a public IP.
    pub public_ip: bool,
}

/// Result of a successful rent request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentResponse {
    /// Identifier of the executor created for the rental.
    pub executor_id: String,
}

/// A node listing as shown on the marketplace.
#[derive(Debug, Clone, PartialEq, TypedBuilder)]
pub struct NodeOffer {
    /// GPU model, or `"None"` for CPU-only nodes.
    #[builder(setter(into))]
    pub gpu_name: String,
    /// Display price per GPU, e.g. `"$0.45/hr"`.
    #[builder(setter(into))]
    pub price: String,
    /// Node identifier.
    #[builder(setter(into))]
    pub node_id: String,
    /// GPUs installed on the node.
    pub gpus: u32,
    /// CPU cores available for rent.
    pub cpu_cores: u32,
    /// CPU cores installed on the node.
    pub total_cpus: u32,
    /// RAM available for rent, in GB.
    pub dram: u64,
    /// RAM installed on the node, in GB.
    pub total_ram: u64,
    /// GPUs available for rent.
    pub avail_gpus: u32,
}

impl NodeOffer {
    /// Returns `true` when the node has no GPU to rent.
    #[must_use]
    pub fn is_cpu_only(&self) -> bool {
        self.gpu_name == CPU_ONLY_GPU_NAME
    }

    /// Numeric per-GPU price parsed from the display string.
    #[must_use]
    pub fn unit_price(&self) -> Option<f64> {
        extract_price(&self.price)
    }
}

/// Parses the first number out of a display price.
///
/// The first run of digits and dots is taken and its leading decimal number
/// parsed, so `"$1.20/hr"` yields `1.2`. A string without any digit or dot
/// yields `Some(0.0)`; a run with no leading number (such as `"."`) yields
/// `None`.
#[must_use]
pub fn extract_price(display: &str) -> Option<f64> {
    let is_numeric = |c: char| c.is_ascii_digit() || c == '.';

    let Some(start) = display.find(is_numeric) else {
        return Some(0.0);
    };
    let run = display[start..]
        .split(|c: char| !is_numeric(c))
        .next()
        .unwrap_or_default();

    let mut end = 0;
    let mut seen_dot = false;
    for (idx, c) in run.char_indices() {
        if c == '.' {
            if seen_dot {
                break;
            }
            seen_dot = true;
        }
        end = idx + c.len_utf8();
    }

    run[..end].parse().ok()
}

/// Resources and price derived from a selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RentalQuote {
    /// GPUs requested.
    pub gpus: u32,
    /// CPU cores requested.
    pub cpus: u32,
    /// RAM requested, in GB.
    pub ram_gb: u64,
    /// Total price, `None` when the offer's price could not be read.
    pub total_price: Option<f64>,
}

impl RentalQuote {
    /// Builds the rent request for `node_id`, converting RAM to bytes.
    #[must_use]
    pub fn to_request(&self, node_id: impl Into<String>) -> RentRequest {
        RentRequest {
            node_id: node_id.into(),
            cpus: self.cpus,
            gpus: self.gpus,
            dram: self.ram_gb.saturating_mul(BYTES_PER_GB),
            disk: 0,
            public_ip: false,
        }
    }

    /// Total price formatted with two decimals, or `"N/A"`.
    #[must_use]
    pub fn price_label(&self) -> String {
        self.total_price
            .map_or_else(|| "N/A".to_string(), |price| format!("${price:.2}"))
    }
}

/// User's choice for one offer.
#[derive(Debug, Clone, PartialEq)]
pub struct RentalSelection {
    offer: NodeOffer,
    gpu_quantity: u32,
    cpu_cores: u32,
}

impl RentalSelection {
    /// Starts a selection with one GPU when any is available, and no cores.
    #[must_use]
    pub fn new(offer: NodeOffer) -> Self {
        let gpu_quantity = u32::from(offer.avail_gpus > 0);
        Self {
            offer,
            gpu_quantity,
            cpu_cores: 0,
        }
    }

    /// Sets the GPU quantity, clamped to the GPUs available.
    #[must_use]
    pub fn with_gpu_quantity(mut self, quantity: u32) -> Self {
        self.gpu_quantity = quantity.min(self.offer.avail_gpus);
        self
    }

    /// Sets the CPU cores, clamped to the cores available.
    ///
    /// Only used when no GPU is selected.
    #[must_use]
    pub fn with_cpu_cores(mut self, cores: u32) -> Self {
        self.cpu_cores = cores.min(self.offer.cpu_cores);
        self
    }

    /// The offer being rented.
    #[must_use]
    pub const fn offer(&self) -> &NodeOffer {
        &self.offer
    }

    /// Selected GPU quantity.
    #[must_use]
    pub const fn gpu_quantity(&self) -> u32 {
        self.gpu_quantity
    }

    /// Selected CPU cores.
    #[must_use]
    pub const fn cpu_cores(&self) -> u32 {
        self.cpu_cores
    }

    /// Derives cores, RAM and price for the current selection.
    #[must_use]
    pub fn quote(&self) -> RentalQuote {
        let offer = &self.offer;
        let quantity = u64::from(self.gpu_quantity);

        let (cpus, ram_gb) = if self.gpu_quantity > 0 && offer.gpus > 0 {
            let gpus = u64::from(offer.gpus);
            (
                quantity * u64::from(offer.total_cpus) / gpus,
                quantity.saturating_mul(offer.total_ram) / gpus,
            )
        } else {
            let cores = u64::from(self.cpu_cores);
            let ram = if offer.total_cpus == 0 {
                0
            } else {
                cores.saturating_mul(offer.total_ram) / u64::from(offer.total_cpus)
            };
            (cores, ram)
        };

        let cpus = u32::try_from(cpus.min(u64::from(offer.cpu_cores))).unwrap_or(offer.cpu_cores);

        RentalQuote {
            gpus: self.gpu_quantity,
            cpus,
            ram_gb: ram_gb.min(offer.dram),
            total_price: offer
                .unit_price()
                .map(|price| f64::from(self.gpu_quantity) * price),
        }
    }

    /// Builds the rent request for the current selection.
    #[must_use]
    pub fn to_request(&self) -> RentRequest {
        self.quote().to_request(self.offer.node_id.clone())
    }
}
