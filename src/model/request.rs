//! Identity-verification requests
//!
//! A request is created once by an RP and afterwards only grows: responses
//! are appended, flags are set. Completion of a sub-request is never stored;
//! it is derived from the response list every time it is needed.

use serde::Serialize;

use crate::codec::{Canonical, CodecError, CodecResult, Decoder, Encoder};

/// What a responder answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "error_code", rename_all = "snake_case")]
pub enum ResponseOutcome {
    /// Data was signed. The signature lives under its own key.
    Signed,
    /// Responder declined with a catalogued error code.
    Error(i32),
}

impl ResponseOutcome {
    pub fn is_error(&self) -> bool {
        matches!(self, ResponseOutcome::Error(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AsResponse {
    pub as_id: String,
    pub outcome: ResponseOutcome,
}

/// Derived state of one sub-request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubRequestStatus {
    Open,
    Completed,
    Unfulfillable,
}

/// Derived state of a whole request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Open,
    Completed,
    Unfulfillable,
    Closed,
    TimedOut,
}

/// One service-specific part of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataRequest {
    pub service_id: String,
    pub as_id_list: Vec<String>,
    pub min_as: u32,
    pub request_params_hash: String,
    pub responses: Vec<AsResponse>,
}

impl DataRequest {
    pub fn is_authorized(&self, node_id: &str) -> bool {
        self.as_id_list.iter().any(|id| id == node_id)
    }

    pub fn has_responded(&self, node_id: &str) -> bool {
        self.responses.iter().any(|r| r.as_id == node_id)
    }

    /// Non-error responses recorded so far.
    pub fn successes(&self) -> usize {
        self.responses.iter().filter(|r| !r.outcome.is_error()).count()
    }

    /// Authorized responders that have not answered yet.
    pub fn remaining_possible(&self) -> usize {
        self.as_id_list.len().saturating_sub(self.responses.len())
    }

    pub fn is_completed(&self) -> bool {
        self.successes() >= self.min_as as usize
    }

    pub fn is_unfulfillable(&self) -> bool {
        self.successes() + self.remaining_possible() < self.min_as as usize
    }

    /// A sub-request with `min_as == 0` needs no answers and is complete
    /// from the start.
    pub fn status(&self) -> SubRequestStatus {
        if self.is_completed() {
            SubRequestStatus::Completed
        } else if self.is_unfulfillable() {
            SubRequestStatus::Unfulfillable
        } else {
            SubRequestStatus::Open
        }
    }
}

/// A request as persisted under `Request:<id>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Request {
    pub request_id: String,
    pub requester_id: String,
    pub min_idp: u32,
    pub idp_id_list: Vec<String>,
    pub request_message_hash: String,
    pub data_requests: Vec<DataRequest>,
    pub closed: bool,
    pub timed_out: bool,
    pub created_height: u64,
    pub chain_id: String,
}

impl Request {
    pub fn data_request(&self, service_id: &str) -> Option<&DataRequest> {
        self.data_requests.iter().find(|d| d.service_id == service_id)
    }

    pub fn data_request_mut(&mut self, service_id: &str) -> Option<&mut DataRequest> {
        self.data_requests.iter_mut().find(|d| d.service_id == service_id)
    }

    pub fn status(&self) -> RequestStatus {
        if self.closed {
            return RequestStatus::Closed;
        }
        if self.timed_out {
            return RequestStatus::TimedOut;
        }
        let statuses: Vec<SubRequestStatus> =
            self.data_requests.iter().map(DataRequest::status).collect();
        if statuses.contains(&SubRequestStatus::Unfulfillable) {
            RequestStatus::Unfulfillable
        } else if statuses.iter().all(|s| *s == SubRequestStatus::Completed) {
            RequestStatus::Completed
        } else {
            RequestStatus::Open
        }
    }
}

const OUTCOME_SIGNED: u8 = 1;
const OUTCOME_ERROR: u8 = 2;

fn encode_strings(enc: &mut Encoder, items: &[String]) {
    enc.put_seq(items, |enc, s| enc.put_str(s));
}

fn decode_strings(dec: &mut Decoder<'_>) -> CodecResult<Vec<String>> {
    dec.get_seq(|dec| dec.get_string())
}

impl Canonical for AsResponse {
    fn encode(&self, enc: &mut Encoder) {
        enc.put_str(&self.as_id);
        match self.outcome {
            ResponseOutcome::Signed => enc.put_u8(OUTCOME_SIGNED),
            ResponseOutcome::Error(code) => {
                enc.put_u8(OUTCOME_ERROR);
                enc.put_i32(code);
            }
        }
    }

    fn decode(dec: &mut Decoder<'_>) -> CodecResult<Self> {
        let as_id = dec.get_string()?;
        let outcome = match dec.get_u8()? {
            OUTCOME_SIGNED => ResponseOutcome::Signed,
            OUTCOME_ERROR => ResponseOutcome::Error(dec.get_i32()?),
            tag => return Err(CodecError::InvalidTag { field: "outcome", tag }),
        };
        Ok(Self { as_id, outcome })
    }
}

impl Canonical for DataRequest {
    fn encode(&self, enc: &mut Encoder) {
        enc.put_str(&self.service_id);
        encode_strings(enc, &self.as_id_list);
        enc.put_u32(self.min_as);
        enc.put_str(&self.request_params_hash);
        enc.put_seq(&self.responses, |enc, r| r.encode(enc));
    }

    fn decode(dec: &mut Decoder<'_>) -> CodecResult<Self> {
        Ok(Self {
            service_id: dec.get_string()?,
            as_id_list: decode_strings(dec)?,
            min_as: dec.get_u32()?,
            request_params_hash: dec.get_string()?,
            responses: dec.get_seq(AsResponse::decode)?,
        })
    }
}

impl Canonical for Request {
    fn encode(&self, enc: &mut Encoder) {
        enc.put_str(&self.request_id);
        enc.put_str(&self.requester_id);
        enc.put_u32(self.min_idp);
        encode_strings(enc, &self.idp_id_list);
        enc.put_str(&self.request_message_hash);
        enc.put_seq(&self.data_requests, |enc, d| d.encode(enc));
        enc.put_bool(self.closed);
        enc.put_bool(self.timed_out);
        enc.put_u64(self.created_height);
        enc.put_str(&self.chain_id);
    }

    fn decode(dec: &mut Decoder<'_>) -> CodecResult<Self> {
        Ok(Self {
            request_id: dec.get_string()?,
            requester_id: dec.get_string()?,
            min_idp: dec.get_u32()?,
            idp_id_list: decode_strings(dec)?,
            request_message_hash: dec.get_string()?,
            data_requests: dec.get_seq(DataRequest::decode)?,
            closed: dec.get_bool()?,
            timed_out: dec.get_bool()?,
            created_height: dec.get_u64()?,
            chain_id: dec.get_string()?,
        })
    }
}
