//! Per-method parameter records
//!
//! Decoded from the JSON `params` bytes of a transaction. Unknown fields are
//! ignored; missing or mistyped fields are an unmarshal error.

use rust_decimal::Decimal;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InitNdidParams {
    pub node_id: String,
    pub public_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegisterNodeParams {
    pub node_id: String,
    pub node_name: String,
    /// Role name, validated separately so an unknown role is `InvalidRole`
    pub role: String,
    pub public_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SetNodeActiveParams {
    pub node_id: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AddServiceParams {
    pub service_id: String,
    pub service_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SetServiceActiveParams {
    pub service_id: String,
    pub active: bool,
}

/// Shared by `ApproveService` and `RevokeService`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServiceApprovalParams {
    pub node_id: String,
    pub service_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AddErrorCodeParams {
    pub error_code: i32,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SetPriceFuncParams {
    pub func: String,
    pub price: Decimal,
}

/// Shared by the three token administration methods.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NodeTokenParams {
    pub node_id: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegisterServiceDestinationParams {
    pub service_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SetServiceDestinationActiveParams {
    pub service_id: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DataRequestParams {
    pub service_id: String,
    /// Empty means every active registered destination of the service
    #[serde(default)]
    pub as_id_list: Vec<String>,
    pub min_as: u32,
    #[serde(default)]
    pub request_params_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateRequestParams {
    pub request_id: String,
    pub min_idp: u32,
    #[serde(default)]
    pub idp_id_list: Vec<String>,
    pub request_message_hash: String,
    #[serde(default)]
    pub data_request_list: Vec<DataRequestParams>,
}

/// Shared by `CloseRequest` and `TimeOutRequest`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RequestIdParams {
    pub request_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutcomeParams {
    Signed { signature: String },
    Error { error_code: i32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateAsResponseParams {
    pub request_id: String,
    pub service_id: String,
    pub outcome: OutcomeParams,
}
