//! Conversion of [`Event`]s to and from the bytes handed to the store.

use crate::error::PulseResult;
use crate::types::Event;

/// Encodes events into the structured form persisted by the store.
///
/// Keeps the stored format independent of the in-memory [`Event`] representation.
pub trait EventCodec {
    /// Encodes an event into bytes.
    fn encode(&self, event: &Event) -> PulseResult<Vec<u8>>;

    /// Decodes bytes produced by [`EventCodec::encode`].
    fn decode(&self, bytes: &[u8]) -> PulseResult<Event>;
}

/// Codec storing events as JSON documents.
///
/// The document has the fields `type`, `user`, `data` and `timestamp` (RFC 3339).
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonEventCodec;

impl EventCodec for JsonEventCodec {
    fn encode(&self, event: &Event) -> PulseResult<Vec<u8>> {
        Ok(serde_json::to_vec(event)?)
    }

    fn decode(&self, bytes: &[u8]) -> PulseResult<Event> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
