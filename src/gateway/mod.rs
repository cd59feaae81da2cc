//! Request gateway to the TestRail API.
//!
//! Everything the services need from the remote side goes through the
//! [`Gateway`] trait: a read and a write against an API path, both returning
//! raw JSON. Retries, pagination and rate limiting are deliberately not part
//! of the contract.

mod api_client;

pub use api_client::ApiClient;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::SyncResult;

/// Blocking-style request gateway; calls resolve strictly one at a time.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Read the resource at `path` (e.g. `get_plan/42`).
    async fn get(&self, path: &str) -> SyncResult<Value>;

    /// Mutate the resource at `path` with a JSON body (e.g. `add_suite/3`).
    async fn post(&self, path: &str, body: &Value) -> SyncResult<Value>;
}
