use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AdviceRequest {
    pub query: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdviceResponse {
    pub answer: String,
    /// True when the answer is the canned apology.
    pub fallback: bool,
}
