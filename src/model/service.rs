//! Services, approvals and responder destinations

use serde::Serialize;

use crate::codec::{Canonical, CodecResult, Decoder, Encoder};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Service {
    pub service_id: String,
    pub service_name: String,
    pub active: bool,
}

impl Canonical for Service {
    fn encode(&self, enc: &mut Encoder) {
        enc.put_str(&self.service_id);
        enc.put_str(&self.service_name);
        enc.put_bool(self.active);
    }

    fn decode(dec: &mut Decoder<'_>) -> CodecResult<Self> {
        Ok(Self {
            service_id: dec.get_string()?,
            service_name: dec.get_string()?,
            active: dec.get_bool()?,
        })
    }
}

/// NDID approval allowing an AS node to serve a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ApprovedService {
    pub active: bool,
}

impl Canonical for ApprovedService {
    fn encode(&self, enc: &mut Encoder) {
        enc.put_bool(self.active);
    }

    fn decode(dec: &mut Decoder<'_>) -> CodecResult<Self> {
        Ok(Self {
            active: dec.get_bool()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceDestination {
    pub node_id: String,
    pub active: bool,
}

/// Responders registered for one service, in registration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ServiceDestinations {
    pub nodes: Vec<ServiceDestination>,
}

impl ServiceDestinations {
    pub fn find(&self, node_id: &str) -> Option<&ServiceDestination> {
        self.nodes.iter().find(|d| d.node_id == node_id)
    }

    pub fn find_mut(&mut self, node_id: &str) -> Option<&mut ServiceDestination> {
        self.nodes.iter_mut().find(|d| d.node_id == node_id)
    }

    /// Ids of active destinations, sorted.
    pub fn active_node_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .nodes
            .iter()
            .filter(|d| d.active)
            .map(|d| d.node_id.clone())
            .collect();
        ids.sort();
        ids
    }
}

impl Canonical for ServiceDestinations {
    fn encode(&self, enc: &mut Encoder) {
        enc.put_seq(&self.nodes, |enc, d| {
            enc.put_str(&d.node_id);
            enc.put_bool(d.active);
        });
    }

    fn decode(dec: &mut Decoder<'_>) -> CodecResult<Self> {
        let nodes = dec.get_seq(|dec| {
            Ok(ServiceDestination {
                node_id: dec.get_string()?,
                active: dec.get_bool()?,
            })
        })?;
        Ok(Self { nodes })
    }
}
