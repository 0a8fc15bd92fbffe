//! Inbound frame decoding.
//!
//! A frame is a UTF-8 JSON array of tenant metadata objects. One frame may
//! carry any number of tenants.

use crate::routing::TenantMetadata;

/// Decode one control-plane frame into the tenants it carries.
///
/// A JSON `null` payload is an empty batch.
pub fn decode_batch(frame: &[u8]) -> Result<Vec<TenantMetadata>, serde_json::Error> {
    let batch: Option<Vec<TenantMetadata>> = serde_json::from_slice(frame)?;
    Ok(batch.unwrap_or_default())
}
