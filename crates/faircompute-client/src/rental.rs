//! Executor rental endpoint.

use async_trait::async_trait;
use log::info;
use reqwest::Method;

use faircompute_common::{DataEnvelope, RentRequest, RentResponse};

use crate::client::{FairClient, RequestOptions};
use crate::error::ClientError;
use crate::response::ApiResponse;

/// Endpoint that rents resources on a node and creates an executor.
pub const RENT_ENDPOINT: &str = "/api/v1/marketplace/providers/nodes/rent";

/// Operations on marketplace executors.
#[async_trait]
pub trait ExecutorApi: Send + Sync {
    /// Rent resources on a node.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response does not carry an
    /// executor id.
    async fn create_executor(&self, request: &RentRequest) -> Result<RentResponse, ClientError>;
}

#[async_trait]
impl ExecutorApi for FairClient {
    async fn create_executor(&self, request: &RentRequest) -> Result<RentResponse, ClientError> {
        let response: ApiResponse<DataEnvelope<RentResponse>> = self
            .send(
                RENT_ENDPOINT,
                Method::POST,
                RequestOptions::authenticated(),
                Some(request),
            )
            .await?;

        let executor = response.into_data()?.into_inner();
        info!(
            "Rented {} GPU(s) and {} core(s) on node {}: executor {}",
            request.gpus, request.cpus, request.node_id, executor.executor_id
        );

        Ok(executor)
    }
}
