//! Rental checkout flow: quote a selection, then submit it.

use faircompute_client::{ClientError, ExecutorApi};
use faircompute_common::{RentRequest, RentResponse, RentalSelection};
use log::{debug, error};

/// What a checkout ended with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing was sent; the request that would have been.
    DryRun(RentRequest),
    /// The executor was created.
    Rented(RentResponse),
}

/// Submits the selection unless `dry_run` is set.
///
/// # Errors
///
/// Returns the client error when the rent request fails.
pub async fn checkout<A>(
    api: &A,
    selection: &RentalSelection,
    dry_run: bool,
) -> Result<Outcome, ClientError>
where
    A: ExecutorApi + ?Sized,
{
    let request = selection.to_request();
    debug!("Rent request: {request:?}");

    if dry_run {
        return Ok(Outcome::DryRun(request));
    }

    match api.create_executor(&request).await {
        Ok(executor) => Ok(Outcome::Rented(executor)),
        Err(e) => {
            error!("Renting on node {} failed: {e}", request.node_id);
            Err(e)
        }
    }
}
