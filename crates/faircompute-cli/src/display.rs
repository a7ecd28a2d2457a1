//! Display utilities for CLI output formatting

use colored::Colorize;
use faircompute_common::{FairConfig, RentalQuote, RentalSelection};
use secrecy::ExposeSecret;

/// Display the quote for a selection
pub fn display_quote(selection: &RentalSelection, quote: &RentalQuote) {
    let offer = selection.offer();

    println!(
        "{}  {}",
        offer.gpu_name.bold(),
        quote.price_label().bright_blue()
    );
    if !offer.is_cpu_only() {
        println!("  GPU quantity: {} of {}", quote.gpus, offer.avail_gpus);
    }
    println!("  CPU cores:    {}", quote.cpus);
    println!("  RAM:          {} GB", quote.ram_gb);
}

/// Display a successful rental
pub fn display_rented(executor_id: &str) {
    println!(
        "{}",
        format!("GPU rented successfully. Executor ID: {executor_id}").green()
    );
}

/// Display a failed rental
pub fn display_rent_error() {
    eprintln!("{}", "Error renting GPU. Please try again.".red());
}

/// Display the resolved configuration with secrets masked
pub fn display_config(config: &FairConfig) {
    println!("environment:             {}", config.environment().to_string().bold());
    println!("api url:                 {}", config.api_url());
    println!(
        "provider public key:     {}",
        mask(config.provider_pub_key().expose_secret())
    );
    println!("stripe publishable key:  {}", config.stripe_publishable_key());
    println!(
        "stripe secret key:       {}",
        mask(config.stripe_secret_key().expose_secret())
    );
    println!("stripe price id:         {}", config.stripe_price_id());
    println!(
        "omnisend api key:        {}",
        mask(config.omnisend_api_key().expose_secret())
    );
}

fn mask(secret: &str) -> colored::ColoredString {
    if secret.is_empty() {
        "(unset)".bright_black()
    } else {
        "[REDACTED]".yellow()
    }
}
