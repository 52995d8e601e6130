use crate::{PduError, Result};

/// Forward-only cursor over a PDU.
pub(crate) struct PduReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> PduReader<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub(crate) fn read_u8(&mut self, field: &'static str) -> Result<u8> {
        let byte = *self.data.get(self.pos).ok_or(PduError::Truncated {
            field,
            needed: 1,
            available: 0,
        })?;
        self.pos += 1;
        Ok(byte)
    }

    pub(crate) fn take(&mut self, len: usize, field: &'static str) -> Result<&'a [u8]> {
        let rest = self.remaining();
        let slice = rest.get(..len).ok_or(PduError::Truncated {
            field,
            needed: len,
            available: rest.len(),
        })?;
        self.pos += len;
        Ok(slice)
    }

    pub(crate) fn remaining(&self) -> &'a [u8] {
        self.data.get(self.pos..).unwrap_or_default()
    }
}
