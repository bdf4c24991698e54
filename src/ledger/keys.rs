//! Ledger key layout
//!
//! Current values live at `prefix:identifier`. Versioned keys add
//! `prefix:identifier|versions` for the height index and
//! `prefix:identifier|<height>` for each snapshot. This layout is externally
//! observable; changing it requires migrating historical records.

pub const SEPARATOR: char = ':';
pub const VERSION_SEPARATOR: char = '|';
pub const VERSIONS_SUFFIX: &str = "versions";

pub const MASTER_NDID: &str = "MasterNDID";
pub const NODE: &str = "NodeID";
pub const SERVICE: &str = "Service";
pub const SERVICE_DESTINATION: &str = "ServiceDestination";
pub const APPROVED_SERVICE: &str = "ApproveKey";
pub const ERROR_CODE: &str = "ErrorCode";
pub const PRICE_FUNC: &str = "PriceFunc";
pub const TOKEN: &str = "Token";
pub const REQUEST: &str = "Request";
pub const DATA_SIGNATURE: &str = "DataSignature";
pub const NONCE: &str = "Nonce";

/// Builds `prefix:part1:part2...`.
pub fn compose(prefix: &str, parts: &[&str]) -> Vec<u8> {
    let mut key = String::from(prefix);
    for part in parts {
        key.push(SEPARATOR);
        key.push_str(part);
    }
    key.into_bytes()
}

/// Identifiers become key segments, so they may not contain either separator.
pub fn is_valid_identifier(id: &str) -> bool {
    !id.is_empty() && !id.contains(SEPARATOR) && !id.contains(VERSION_SEPARATOR)
}

/// `key|versions`
pub fn versions_key(key: &[u8]) -> Vec<u8> {
    let mut out = key.to_vec();
    out.push(VERSION_SEPARATOR as u8);
    out.extend_from_slice(VERSIONS_SUFFIX.as_bytes());
    out
}

/// `key|<height>`
pub fn version_key(key: &[u8], height: u64) -> Vec<u8> {
    let mut out = key.to_vec();
    out.push(VERSION_SEPARATOR as u8);
    out.extend_from_slice(height.to_string().as_bytes());
    out
}

pub fn master_ndid() -> Vec<u8> {
    MASTER_NDID.as_bytes().to_vec()
}

pub fn node(node_id: &str) -> Vec<u8> {
    compose(NODE, &[node_id])
}

pub fn service(service_id: &str) -> Vec<u8> {
    compose(SERVICE, &[service_id])
}

pub fn service_destinations(service_id: &str) -> Vec<u8> {
    compose(SERVICE_DESTINATION, &[service_id])
}

pub fn approved_service(service_id: &str, node_id: &str) -> Vec<u8> {
    compose(APPROVED_SERVICE, &[service_id, node_id])
}

pub fn error_code(code: i32) -> Vec<u8> {
    compose(ERROR_CODE, &[&code.to_string()])
}

pub fn price_func(method: &str) -> Vec<u8> {
    compose(PRICE_FUNC, &[method])
}

pub fn token(node_id: &str) -> Vec<u8> {
    compose(TOKEN, &[node_id])
}

pub fn request(request_id: &str) -> Vec<u8> {
    compose(REQUEST, &[request_id])
}

pub fn data_signature(node_id: &str, service_id: &str, request_id: &str) -> Vec<u8> {
    compose(DATA_SIGNATURE, &[node_id, service_id, request_id])
}

/// Nonces are raw bytes, appended after the prefix unmodified.
pub fn nonce(nonce: &[u8]) -> Vec<u8> {
    let mut key = compose(NONCE, &[]);
    key.push(SEPARATOR as u8);
    key.extend_from_slice(nonce);
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_versioned_layout() {
        let key = request("req1");
        assert_eq!(key, b"Request:req1");
        assert_eq!(versions_key(&key), b"Request:req1|versions");
        assert_eq!(version_key(&key, 12), b"Request:req1|12");
    }

    #[test]
    fn test_multi_part_keys() {
        assert_eq!(data_signature("as1", "bank", "req1"), b"DataSignature:as1:bank:req1");
        assert_eq!(approved_service("bank", "as1"), b"ApproveKey:bank:as1");
        assert_eq!(error_code(-3), b"ErrorCode:-3");
    }

    #[test]
    fn test_nonce_key_keeps_raw_bytes() {
        assert_eq!(nonce(&[0, 255]), vec![b'N', b'o', b'n', b'c', b'e', b':', 0, 255]);
    }

    #[test]
    fn test_identifier_validation() {
        assert!(is_valid_identifier("rp_1"));
        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier("a:b"));
        assert!(!is_valid_identifier("a|b"));
    }
}
