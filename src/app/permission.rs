//! Caller authorization and signature checks

use crate::ledger::{keys, Ledger};
use crate::model::{NodeRecord, Role};

use super::error::{TxError, TxResult};
use super::method::{Method, TxParams};
use super::result::ResultCode;
use super::tx::Transaction;
use super::validation::Validation;

/// Signature predicate. The algorithm is outside this crate.
pub trait SignatureVerifier {
    fn verify(&self, public_key: &str, message: &[u8], signature: &[u8]) -> bool;
}

impl<F> SignatureVerifier for F
where
    F: Fn(&str, &[u8], &[u8]) -> bool,
{
    fn verify(&self, public_key: &str, message: &[u8], signature: &[u8]) -> bool {
        self(public_key, message, signature)
    }
}

/// Accepts every signature. Development and tests only.
#[derive(Debug, Default, Clone, Copy)]
pub struct PermissiveVerifier;

impl SignatureVerifier for PermissiveVerifier {
    fn verify(&self, _public_key: &str, _message: &[u8], _signature: &[u8]) -> bool {
        true
    }
}

/// The authorized sender of a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub node_id: String,
    pub role: Role,
    pub public_key: String,
}

impl Caller {
    pub fn is_ndid(&self) -> bool {
        self.role == Role::Ndid
    }
}

/// Resolves the caller of `tx` and checks it may call `method`.
///
/// `InitNDID` is accepted only while no NDID exists. It is authorized by its
/// own parameters: the caller must be the node being registered and signs
/// with the key it registers.
pub fn authorize(
    ledger: &Ledger,
    v: Validation,
    method: Method,
    tx: &Transaction,
    params: &TxParams,
) -> TxResult<Caller> {
    if let TxParams::InitNdid(p) = params {
        if ledger.has(&keys::master_ndid(), v.committed)? {
            return Err(TxError::permission(
                ResultCode::NdidAlreadyExists,
                "NDID is already initialized",
            ));
        }
        if tx.caller_id != p.node_id {
            return Err(TxError::permission(
                ResultCode::PermissionDenied,
                "InitNDID must be sent by the node it registers",
            ));
        }
        return Ok(Caller {
            node_id: p.node_id.clone(),
            role: Role::Ndid,
            public_key: p.public_key.clone(),
        });
    }

    if !ledger.has(&keys::master_ndid(), v.committed)? {
        return Err(TxError::permission(
            ResultCode::NdidNotInitialized,
            "NDID has not been initialized",
        ));
    }

    let node = ledger
        .get_record::<NodeRecord>(&keys::node(&tx.caller_id), v.committed)?
        .ok_or_else(|| {
            TxError::permission(
                ResultCode::NodeIdNotFound,
                format!("node {} not found", tx.caller_id),
            )
        })?;

    if !node.active {
        return Err(TxError::permission(
            ResultCode::NodeIsNotActive,
            format!("node {} is not active", node.node_id),
        ));
    }

    if !method.allowed_roles().contains(&node.role) {
        return Err(TxError::permission(
            ResultCode::PermissionDenied,
            format!("role {} may not call {}", node.role, method.name()),
        ));
    }

    Ok(Caller {
        node_id: node.node_id,
        role: node.role,
        public_key: node.public_key,
    })
}

pub fn verify_signature(
    verifier: &dyn SignatureVerifier,
    caller: &Caller,
    tx: &Transaction,
) -> TxResult<()> {
    if verifier.verify(&caller.public_key, &tx.signing_bytes(), &tx.signature) {
        Ok(())
    } else {
        Err(TxError::permission(
            ResultCode::InvalidSignature,
            format!("invalid signature from {}", caller.node_id),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::to_canonical_bytes;
    use crate::storage::MemoryBackend;
    use serde_json::json;

    fn ledger_with(nodes: &[NodeRecord]) -> Ledger {
        let mut ledger = Ledger::open(Box::new(MemoryBackend::new())).unwrap();
        ledger.put(&keys::master_ndid(), to_canonical_bytes(&"ndid1".to_string()));
        for node in nodes {
            ledger.put_record(&keys::node(&node.node_id), node);
        }
        ledger.save().unwrap();
        ledger
    }

    fn node(id: &str, role: Role, active: bool) -> NodeRecord {
        NodeRecord {
            node_id: id.into(),
            node_name: id.into(),
            role,
            public_key: format!("{}-key", id),
            active,
        }
    }

    fn authorize_tx(ledger: &Ledger, method: Method, caller: &str) -> TxResult<Caller> {
        let tx = Transaction::new(method.name(), &json!({"request_id": "r1"}), b"n".to_vec(), caller);
        let params = method.decode_params(&tx.params).unwrap();
        authorize(ledger, Validation::ADMISSION, method, &tx, &params)
    }

    #[test]
    fn test_role_gate() {
        let ledger = ledger_with(&[node("rp1", Role::Rp, true), node("as1", Role::As, true)]);

        let caller = authorize_tx(&ledger, Method::CloseRequest, "rp1").unwrap();
        assert_eq!(caller.public_key, "rp1-key");

        let err = authorize_tx(&ledger, Method::CloseRequest, "as1").unwrap_err();
        assert_eq!(err.code(), ResultCode::PermissionDenied);
    }

    #[test]
    fn test_missing_and_inactive_nodes() {
        let ledger = ledger_with(&[node("rp1", Role::Rp, false)]);

        let err = authorize_tx(&ledger, Method::CloseRequest, "rp2").unwrap_err();
        assert_eq!(err.code(), ResultCode::NodeIdNotFound);
        let err = authorize_tx(&ledger, Method::CloseRequest, "rp1").unwrap_err();
        assert_eq!(err.code(), ResultCode::NodeIsNotActive);
    }

    #[test]
    fn test_requires_initialized_ndid() {
        let ledger = Ledger::open(Box::new(MemoryBackend::new())).unwrap();
        let err = authorize_tx(&ledger, Method::CloseRequest, "rp1").unwrap_err();
        assert_eq!(err.code(), ResultCode::NdidNotInitialized);
    }

    #[test]
    fn test_second_init_ndid_rejected_at_admission() {
        let ledger = ledger_with(&[]);
        let params = json!({"node_id": "intruder", "public_key": "intruder-key"});
        let tx = Transaction::new("InitNDID", &params, b"n".to_vec(), "intruder");
        let decoded = Method::InitNdid.decode_params(&tx.params).unwrap();

        let err = authorize(&ledger, Validation::ADMISSION, Method::InitNdid, &tx, &decoded).unwrap_err();
        assert_eq!(err.code(), ResultCode::NdidAlreadyExists);
    }

    #[test]
    fn test_signature_checked_against_registered_key() {
        let caller = Caller {
            node_id: "rp1".into(),
            role: Role::Rp,
            public_key: "rp1-key".into(),
        };
        let verifier = |key: &str, _msg: &[u8], sig: &[u8]| sig == key.as_bytes();
        let tx = Transaction::new("CloseRequest", &json!({}), b"n".to_vec(), "rp1");

        let good = tx.clone().with_signature(b"rp1-key".to_vec());
        assert!(verify_signature(&verifier, &caller, &good).is_ok());

        let bad = tx.with_signature(b"other".to_vec());
        let err = verify_signature(&verifier, &caller, &bad).unwrap_err();
        assert_eq!(err.code(), ResultCode::InvalidSignature);
    }
}
