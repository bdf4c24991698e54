//! Read-only queries against committed state
//!
//! Queries never touch the overlay and never feed the state hash.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::ledger::{keys, CheckpointView, Ledger};
use crate::model::{
    ApprovedService, NodeRecord, PriceFunc, Request, RequestStatus, Service, ServiceDestinations,
    SubRequestStatus, TokenAccount,
};

use super::error::{TxError, TxResult};
use super::fees;
use super::method::Method;
use super::result::ResultCode;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NodeIdQuery {
    pub node_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServiceIdQuery {
    pub service_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RequestQuery {
    pub request_id: String,
    /// Zero or negative reads the latest version
    #[serde(default)]
    pub height: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DataSignatureQuery {
    pub node_id: String,
    pub service_id: String,
    pub request_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PriceFuncQuery {
    pub func: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    GetNodeInfo(NodeIdQuery),
    GetServiceDetail(ServiceIdQuery),
    GetRequest(RequestQuery),
    GetDataSignature(DataSignatureQuery),
    GetNodeToken(NodeIdQuery),
    GetPriceFunc(PriceFuncQuery),
    GetLastCheckpoint,
}

fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> TxResult<T> {
    serde_json::from_slice(bytes).map_err(|e| TxError::Unmarshal(e.to_string()))
}

impl Query {
    pub fn parse(name: &str, params: &[u8]) -> TxResult<Query> {
        let query = match name {
            "GetNodeInfo" => Query::GetNodeInfo(decode(params)?),
            "GetServiceDetail" => Query::GetServiceDetail(decode(params)?),
            "GetRequest" => Query::GetRequest(decode(params)?),
            "GetDataSignature" => Query::GetDataSignature(decode(params)?),
            "GetNodeToken" => Query::GetNodeToken(decode(params)?),
            "GetPriceFunc" => Query::GetPriceFunc(decode(params)?),
            "GetLastCheckpoint" => Query::GetLastCheckpoint,
            other => return Err(TxError::UnknownMethod(other.to_string())),
        };
        Ok(query)
    }
}

#[derive(Serialize)]
struct DataRequestView<'a> {
    service_id: &'a str,
    status: SubRequestStatus,
    successes: usize,
    remaining_possible: usize,
}

#[derive(Serialize)]
struct RequestView<'a> {
    #[serde(flatten)]
    request: &'a Request,
    status: RequestStatus,
    data_request_status: Vec<DataRequestView<'a>>,
    /// Height of the version that was read
    version_height: u64,
}

fn not_found(code: ResultCode, what: String) -> TxError {
    TxError::application(code, format!("{} not found", what))
}

fn render<T: Serialize>(value: &T) -> TxResult<Value> {
    serde_json::to_value(value).map_err(|e| TxError::Unmarshal(format!("cannot render result: {}", e)))
}

/// Runs a query and renders the result as JSON.
pub fn execute(ledger: &Ledger, query: &Query) -> TxResult<Value> {
    const COMMITTED: bool = true;

    match query {
        Query::GetNodeInfo(q) => {
            let node = ledger
                .get_record::<NodeRecord>(&keys::node(&q.node_id), COMMITTED)?
                .ok_or_else(|| not_found(ResultCode::NodeIdNotFound, format!("node {}", q.node_id)))?;
            render(&node)
        }
        Query::GetServiceDetail(q) => {
            let service = ledger
                .get_record::<Service>(&keys::service(&q.service_id), COMMITTED)?
                .ok_or_else(|| {
                    not_found(ResultCode::ServiceNotFound, format!("service {}", q.service_id))
                })?;
            let destinations = ledger
                .get_record::<ServiceDestinations>(&keys::service_destinations(&q.service_id), COMMITTED)?
                .unwrap_or_default();
            let mut nodes = Vec::with_capacity(destinations.nodes.len());
            for d in &destinations.nodes {
                let approved = ledger
                    .get_record::<ApprovedService>(&keys::approved_service(&q.service_id, &d.node_id), COMMITTED)?
                    .map(|a| a.active)
                    .unwrap_or(false);
                nodes.push(json!({"node_id": d.node_id, "active": d.active, "approved": approved}));
            }
            Ok(json!({"service": render(&service)?, "destinations": nodes}))
        }
        Query::GetRequest(q) => {
            let key = keys::request(&q.request_id);
            let height = q.height.max(0) as u64;
            let index = ledger.version_index(&key, COMMITTED)?;
            let version_height = index.resolve(height).ok_or_else(|| {
                not_found(ResultCode::RequestNotFound, format!("request {}", q.request_id))
            })?;
            let request = ledger
                .get_versioned_record::<Request>(&key, version_height, COMMITTED)?
                .ok_or_else(|| {
                    not_found(ResultCode::RequestNotFound, format!("request {}", q.request_id))
                })?;
            let view = RequestView {
                request: &request,
                status: request.status(),
                data_request_status: request
                    .data_requests
                    .iter()
                    .map(|d| DataRequestView {
                        service_id: &d.service_id,
                        status: d.status(),
                        successes: d.successes(),
                        remaining_possible: d.remaining_possible(),
                    })
                    .collect(),
                version_height,
            };
            render(&view)
        }
        Query::GetDataSignature(q) => {
            let key = keys::data_signature(&q.node_id, &q.service_id, &q.request_id);
            let signature = ledger.get(&key, COMMITTED)?.ok_or_else(|| {
                not_found(
                    ResultCode::RequestNotFound,
                    format!("signature of {} for {} on {}", q.node_id, q.service_id, q.request_id),
                )
            })?;
            Ok(json!({"signature": String::from_utf8_lossy(&signature)}))
        }
        Query::GetNodeToken(q) => {
            let account = ledger
                .get_record::<TokenAccount>(&keys::token(&q.node_id), COMMITTED)?
                .ok_or_else(|| {
                    not_found(ResultCode::TokenAccountNotFound, format!("token account of {}", q.node_id))
                })?;
            render(&account)
        }
        Query::GetPriceFunc(q) => {
            let method = Method::from_name(&q.func).ok_or_else(|| TxError::UnknownMethod(q.func.clone()))?;
            let price = fees::price_of(ledger, method, COMMITTED)?;
            render(&PriceFunc {
                func: q.func.clone(),
                price,
            })
        }
        Query::GetLastCheckpoint => {
            let view: CheckpointView = ledger.last_checkpoint().view();
            render(&view)
        }
    }
}
