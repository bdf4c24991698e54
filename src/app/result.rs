//! Result codes and responses
//!
//! Codes are an external contract: clients key retry and error handling off
//! the numbers. New codes are appended; existing ones are never renumbered.

use std::fmt;

use serde::{Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ResultCode {
    Ok = 0,
    UnmarshalError = 1,
    UnknownMethod = 2,
    PermissionDenied = 3,
    NodeIdNotFound = 4,
    NodeIsNotActive = 5,
    InvalidSignature = 6,
    DuplicateNonce = 7,
    AppStateError = 8,
    NdidAlreadyExists = 9,
    DuplicateNodeId = 10,
    InvalidRole = 11,
    ServiceNotFound = 12,
    DuplicateServiceId = 13,
    ServiceIsNotActive = 14,
    ServiceNotApproved = 15,
    RoleIsNotAs = 16,
    ServiceDestinationNotFound = 17,
    ServiceDestinationAlreadyRegistered = 18,
    ServiceDestinationIsNotActive = 19,
    DuplicateErrorCode = 20,
    InvalidErrorCode = 21,
    InvalidPrice = 22,
    TokenAccountNotFound = 23,
    TokenNotEnough = 24,
    RequestNotFound = 25,
    DuplicateRequestId = 26,
    RequestIsClosed = 27,
    RequestIsTimedOut = 28,
    NotRequestOwner = 29,
    NodeNotInAsList = 30,
    DuplicateAsResponse = 31,
    DataRequestIsCompleted = 32,
    DataRequestCannotBeFulfilled = 33,
    MinAsGreaterThanAsList = 34,
    MinIdpGreaterThanIdpList = 35,
    ServiceIdNotFoundInRequest = 36,
    DuplicateServiceIdInRequest = 37,
    InvalidIdentifier = 38,
    NdidNotInitialized = 39,
    InvalidAmount = 40,
}

impl ResultCode {
    pub fn as_u32(self) -> u32 {
        self as u32
    }

    pub fn is_ok(self) -> bool {
        self == ResultCode::Ok
    }

    pub fn name(self) -> &'static str {
        match self {
            ResultCode::Ok => "Ok",
            ResultCode::UnmarshalError => "UnmarshalError",
            ResultCode::UnknownMethod => "UnknownMethod",
            ResultCode::PermissionDenied => "PermissionDenied",
            ResultCode::NodeIdNotFound => "NodeIdNotFound",
            ResultCode::NodeIsNotActive => "NodeIsNotActive",
            ResultCode::InvalidSignature => "InvalidSignature",
            ResultCode::DuplicateNonce => "DuplicateNonce",
            ResultCode::AppStateError => "AppStateError",
            ResultCode::NdidAlreadyExists => "NdidAlreadyExists",
            ResultCode::DuplicateNodeId => "DuplicateNodeId",
            ResultCode::InvalidRole => "InvalidRole",
            ResultCode::ServiceNotFound => "ServiceNotFound",
            ResultCode::DuplicateServiceId => "DuplicateServiceId",
            ResultCode::ServiceIsNotActive => "ServiceIsNotActive",
            ResultCode::ServiceNotApproved => "ServiceNotApproved",
            ResultCode::RoleIsNotAs => "RoleIsNotAs",
            ResultCode::ServiceDestinationNotFound => "ServiceDestinationNotFound",
            ResultCode::ServiceDestinationAlreadyRegistered => "ServiceDestinationAlreadyRegistered",
            ResultCode::ServiceDestinationIsNotActive => "ServiceDestinationIsNotActive",
            ResultCode::DuplicateErrorCode => "DuplicateErrorCode",
            ResultCode::InvalidErrorCode => "InvalidErrorCode",
            ResultCode::InvalidPrice => "InvalidPrice",
            ResultCode::TokenAccountNotFound => "TokenAccountNotFound",
            ResultCode::TokenNotEnough => "TokenNotEnough",
            ResultCode::RequestNotFound => "RequestNotFound",
            ResultCode::DuplicateRequestId => "DuplicateRequestId",
            ResultCode::RequestIsClosed => "RequestIsClosed",
            ResultCode::RequestIsTimedOut => "RequestIsTimedOut",
            ResultCode::NotRequestOwner => "NotRequestOwner",
            ResultCode::NodeNotInAsList => "NodeNotInAsList",
            ResultCode::DuplicateAsResponse => "DuplicateAsResponse",
            ResultCode::DataRequestIsCompleted => "DataRequestIsCompleted",
            ResultCode::DataRequestCannotBeFulfilled => "DataRequestCannotBeFulfilled",
            ResultCode::MinAsGreaterThanAsList => "MinAsGreaterThanAsList",
            ResultCode::MinIdpGreaterThanIdpList => "MinIdpGreaterThanIdpList",
            ResultCode::ServiceIdNotFoundInRequest => "ServiceIdNotFoundInRequest",
            ResultCode::DuplicateServiceIdInRequest => "DuplicateServiceIdInRequest",
            ResultCode::InvalidIdentifier => "InvalidIdentifier",
            ResultCode::NdidNotInitialized => "NdidNotInitialized",
            ResultCode::InvalidAmount => "InvalidAmount",
        }
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.as_u32())
    }
}

impl Serialize for ResultCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.as_u32())
    }
}

/// Outcome of `check` or `deliver`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TxResponse {
    pub code: ResultCode,
    pub message: String,
    /// Method-specific return bytes, delivery only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<u8>>,
}

impl TxResponse {
    pub fn ok(data: Option<Vec<u8>>) -> Self {
        Self {
            code: ResultCode::Ok,
            message: "success".to_string(),
            data,
        }
    }

    pub fn error(code: ResultCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.code.is_ok()
    }
}

/// Outcome of a read-only query. `value` holds JSON bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResponse {
    pub code: ResultCode,
    pub message: String,
    pub value: Vec<u8>,
}

impl QueryResponse {
    pub fn is_ok(&self) -> bool {
        self.code.is_ok()
    }

    /// Parses `value` as JSON. Empty values parse as `null`.
    pub fn json(&self) -> serde_json::Result<serde_json::Value> {
        if self.value.is_empty() {
            return Ok(serde_json::Value::Null);
        }
        serde_json::from_slice(&self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(ResultCode::Ok.as_u32(), 0);
        assert_eq!(ResultCode::AppStateError.as_u32(), 8);
        assert_eq!(ResultCode::TokenNotEnough.as_u32(), 24);
        assert_eq!(ResultCode::DataRequestIsCompleted.as_u32(), 32);
        assert_eq!(ResultCode::DataRequestCannotBeFulfilled.as_u32(), 33);
        assert_eq!(ResultCode::NdidNotInitialized.as_u32(), 39);
    }

    #[test]
    fn test_response_serializes_numeric_code() {
        let resp = TxResponse::error(ResultCode::DuplicateNonce, "nonce already used");
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["code"], 7);
        assert!(json.get("data").is_none());
    }
}
