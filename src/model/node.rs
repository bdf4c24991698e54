//! Participant nodes

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::codec::{Canonical, CodecError, CodecResult, Decoder, Encoder};

/// Participant role. Serialized names are part of the external contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "NDID")]
    Ndid,
    #[serde(rename = "RP")]
    Rp,
    #[serde(rename = "IdP")]
    Idp,
    #[serde(rename = "AS")]
    As,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Ndid => "NDID",
            Role::Rp => "RP",
            Role::Idp => "IdP",
            Role::As => "AS",
        }
    }

    fn tag(&self) -> u8 {
        match self {
            Role::Ndid => 1,
            Role::Rp => 2,
            Role::Idp => 3,
            Role::As => 4,
        }
    }

    fn from_tag(tag: u8) -> CodecResult<Self> {
        match tag {
            1 => Ok(Role::Ndid),
            2 => Ok(Role::Rp),
            3 => Ok(Role::Idp),
            4 => Ok(Role::As),
            tag => Err(CodecError::InvalidTag { field: "role", tag }),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NDID" => Ok(Role::Ndid),
            "RP" => Ok(Role::Rp),
            "IdP" => Ok(Role::Idp),
            "AS" => Ok(Role::As),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// Registered node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeRecord {
    pub node_id: String,
    pub node_name: String,
    pub role: Role,
    pub public_key: String,
    pub active: bool,
}

impl Canonical for NodeRecord {
    fn encode(&self, enc: &mut Encoder) {
        enc.put_str(&self.node_id);
        enc.put_str(&self.node_name);
        enc.put_u8(self.role.tag());
        enc.put_str(&self.public_key);
        enc.put_bool(self.active);
    }

    fn decode(dec: &mut Decoder<'_>) -> CodecResult<Self> {
        Ok(Self {
            node_id: dec.get_string()?,
            node_name: dec.get_string()?,
            role: Role::from_tag(dec.get_u8()?)?,
            public_key: dec.get_string()?,
            active: dec.get_bool()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{from_canonical_bytes, to_canonical_bytes};

    #[test]
    fn test_role_names() {
        for role in [Role::Ndid, Role::Rp, Role::Idp, Role::As] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
            let json = serde_json::to_string(&role).unwrap();
            assert_eq!(json, format!("\"{}\"", role.as_str()));
        }
        assert!("idp".parse::<Role>().is_err());
    }

    #[test]
    fn test_unknown_role_tag_rejected() {
        let node = NodeRecord {
            node_id: "as1".into(),
            node_name: "Bank".into(),
            role: Role::As,
            public_key: "pk".into(),
            active: true,
        };
        let mut bytes = to_canonical_bytes(&node);
        // version byte + "as1" + "Bank"
        let role_offset = 1 + (4 + 3) + (4 + 4);
        assert_eq!(bytes[role_offset], 4);
        bytes[role_offset] = 9;

        let err = from_canonical_bytes::<NodeRecord>(&bytes).unwrap_err();
        assert_eq!(err, CodecError::InvalidTag { field: "role", tag: 9 });
    }
}
