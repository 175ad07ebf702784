use bytes::{Bytes, BytesMut};

/// Out-of-band elementary stream header (typically SPS/PPS) that is
/// prepended to the first payload a session streams, and only that one.
#[derive(Debug, Default)]
pub struct EsHeaderBuffer {
    header: BytesMut,
    sent: bool,
}

impl EsHeaderBuffer {
    /// Creates an empty buffer with the latch open.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `bytes` to the header. Contents are not validated.
    pub fn append(&mut self, bytes: &[u8]) {
        self.header.extend_from_slice(bytes);
    }

    /// Header bytes registered so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.header
    }

    /// Whether a payload has already been prepared, with or without header.
    pub fn is_sent(&self) -> bool {
        self.sent
    }

    /// Returns the payload to write for `data` and closes the latch.
    ///
    /// The first call yields `header ++ data` when a header is registered;
    /// every other call hands `data` back untouched.
    pub(crate) fn prepare(&mut self, data: Bytes) -> Bytes {
        let payload = if !self.sent && !self.header.is_empty() {
            let mut joined = BytesMut::with_capacity(self.header.len() + data.len());
            joined.extend_from_slice(&self.header);
            joined.extend_from_slice(&data);
            joined.freeze()
        } else {
            data
        };
        self.sent = true;
        payload
    }
}
