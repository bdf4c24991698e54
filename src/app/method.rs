//! Method registry
//!
//! Dispatch is an exact string match on the method name. Each method decodes
//! its parameters into its own record inside `TxParams`, so handlers never
//! inspect untyped JSON.

use serde::de::DeserializeOwned;

use crate::model::Role;

use super::error::{TxError, TxResult};
use super::params::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    InitNdid,
    RegisterNode,
    SetNodeActive,
    AddService,
    SetServiceActive,
    ApproveService,
    RevokeService,
    AddErrorCode,
    SetPriceFunc,
    SetNodeToken,
    AddNodeToken,
    ReduceNodeToken,
    RegisterServiceDestination,
    SetServiceDestinationActive,
    CreateRequest,
    CloseRequest,
    TimeOutRequest,
    CreateAsResponse,
}

const NDID_ONLY: &[Role] = &[Role::Ndid];
const AS_ONLY: &[Role] = &[Role::As];
const RP_ONLY: &[Role] = &[Role::Rp];

impl Method {
    pub const ALL: [Method; 18] = [
        Method::InitNdid,
        Method::RegisterNode,
        Method::SetNodeActive,
        Method::AddService,
        Method::SetServiceActive,
        Method::ApproveService,
        Method::RevokeService,
        Method::AddErrorCode,
        Method::SetPriceFunc,
        Method::SetNodeToken,
        Method::AddNodeToken,
        Method::ReduceNodeToken,
        Method::RegisterServiceDestination,
        Method::SetServiceDestinationActive,
        Method::CreateRequest,
        Method::CloseRequest,
        Method::TimeOutRequest,
        Method::CreateAsResponse,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Method::InitNdid => "InitNDID",
            Method::RegisterNode => "RegisterNode",
            Method::SetNodeActive => "SetNodeActive",
            Method::AddService => "AddService",
            Method::SetServiceActive => "SetServiceActive",
            Method::ApproveService => "ApproveService",
            Method::RevokeService => "RevokeService",
            Method::AddErrorCode => "AddErrorCode",
            Method::SetPriceFunc => "SetPriceFunc",
            Method::SetNodeToken => "SetNodeToken",
            Method::AddNodeToken => "AddNodeToken",
            Method::ReduceNodeToken => "ReduceNodeToken",
            Method::RegisterServiceDestination => "RegisterServiceDestination",
            Method::SetServiceDestinationActive => "SetServiceDestinationActive",
            Method::CreateRequest => "CreateRequest",
            Method::CloseRequest => "CloseRequest",
            Method::TimeOutRequest => "TimeOutRequest",
            Method::CreateAsResponse => "CreateAsResponse",
        }
    }

    pub fn from_name(name: &str) -> Option<Method> {
        Method::ALL.iter().copied().find(|m| m.name() == name)
    }

    /// Roles allowed to call the method. `InitNDID` has none: it is the
    /// bootstrap transaction and is authorized separately.
    pub fn allowed_roles(&self) -> &'static [Role] {
        match self {
            Method::InitNdid => &[],
            Method::RegisterNode
            | Method::SetNodeActive
            | Method::AddService
            | Method::SetServiceActive
            | Method::ApproveService
            | Method::RevokeService
            | Method::AddErrorCode
            | Method::SetPriceFunc
            | Method::SetNodeToken
            | Method::AddNodeToken
            | Method::ReduceNodeToken => NDID_ONLY,
            Method::RegisterServiceDestination
            | Method::SetServiceDestinationActive
            | Method::CreateAsResponse => AS_ONLY,
            Method::CreateRequest | Method::CloseRequest | Method::TimeOutRequest => RP_ONLY,
        }
    }

    pub fn decode_params(&self, bytes: &[u8]) -> TxResult<TxParams> {
        let params = match self {
            Method::InitNdid => TxParams::InitNdid(decode(bytes)?),
            Method::RegisterNode => TxParams::RegisterNode(decode(bytes)?),
            Method::SetNodeActive => TxParams::SetNodeActive(decode(bytes)?),
            Method::AddService => TxParams::AddService(decode(bytes)?),
            Method::SetServiceActive => TxParams::SetServiceActive(decode(bytes)?),
            Method::ApproveService => TxParams::ApproveService(decode(bytes)?),
            Method::RevokeService => TxParams::RevokeService(decode(bytes)?),
            Method::AddErrorCode => TxParams::AddErrorCode(decode(bytes)?),
            Method::SetPriceFunc => TxParams::SetPriceFunc(decode(bytes)?),
            Method::SetNodeToken => TxParams::SetNodeToken(decode(bytes)?),
            Method::AddNodeToken => TxParams::AddNodeToken(decode(bytes)?),
            Method::ReduceNodeToken => TxParams::ReduceNodeToken(decode(bytes)?),
            Method::RegisterServiceDestination => {
                TxParams::RegisterServiceDestination(decode(bytes)?)
            }
            Method::SetServiceDestinationActive => {
                TxParams::SetServiceDestinationActive(decode(bytes)?)
            }
            Method::CreateRequest => TxParams::CreateRequest(decode(bytes)?),
            Method::CloseRequest => TxParams::CloseRequest(decode(bytes)?),
            Method::TimeOutRequest => TxParams::TimeOutRequest(decode(bytes)?),
            Method::CreateAsResponse => TxParams::CreateAsResponse(decode(bytes)?),
        };
        Ok(params)
    }
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> TxResult<T> {
    serde_json::from_slice(bytes).map_err(|e| TxError::Unmarshal(e.to_string()))
}

/// Decoded parameters, one variant per method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxParams {
    InitNdid(InitNdidParams),
    RegisterNode(RegisterNodeParams),
    SetNodeActive(SetNodeActiveParams),
    AddService(AddServiceParams),
    SetServiceActive(SetServiceActiveParams),
    ApproveService(ServiceApprovalParams),
    RevokeService(ServiceApprovalParams),
    AddErrorCode(AddErrorCodeParams),
    SetPriceFunc(SetPriceFuncParams),
    SetNodeToken(NodeTokenParams),
    AddNodeToken(NodeTokenParams),
    ReduceNodeToken(NodeTokenParams),
    RegisterServiceDestination(RegisterServiceDestinationParams),
    SetServiceDestinationActive(SetServiceDestinationActiveParams),
    CreateRequest(CreateRequestParams),
    CloseRequest(RequestIdParams),
    TimeOutRequest(RequestIdParams),
    CreateAsResponse(CreateAsResponseParams),
}
