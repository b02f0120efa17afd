use async_trait::async_trait;
use reqwest::{Request, Response};

/// Outbound request seam shared by the Sheets source and the PostgREST store.
///
/// Auth wrappers in [`crate::fetch::auth`] layer credentials over any implementor.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}
