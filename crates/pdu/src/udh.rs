//! User data header (3GPP TS 23.040 §9.2.3.24).

use crate::{PduError, Result};

const IEI_CONCAT_8: u8 = 0x00;
const IEI_PORTS_8: u8 = 0x04;
const IEI_PORTS_16: u8 = 0x05;
const IEI_CONCAT_16: u8 = 0x08;

/// Concatenated short message reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConcatInfo {
    pub reference: u16,
    pub total: u8,
    pub sequence: u8,
}

impl ConcatInfo {
    /// Sequence numbers are 1-based and must not exceed the total.
    pub fn is_valid(&self) -> bool {
        self.total > 0 && self.sequence > 0 && self.sequence <= self.total
    }
}

/// Application port addressing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PortAddressing {
    pub destination: u16,
    pub origin: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InformationElement {
    Concat(ConcatInfo),
    Ports(PortAddressing),
    /// Any element this codec does not interpret, kept verbatim.
    Other { id: u8, data: Vec<u8> },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserDataHeader {
    pub elements: Vec<InformationElement>,
}

impl UserDataHeader {
    /// Parse the header body (the octets after the UDHL byte).
    pub fn parse(raw: &[u8]) -> Result<Self> {
        let mut elements = Vec::new();
        let mut rest = raw;
        while let [id, len, tail @ ..] = rest {
            let len = usize::from(*len);
            let data = tail.get(..len).ok_or_else(|| {
                PduError::InvalidHeader(format!(
                    "element {id:#04x} declares {len} bytes, {} remain",
                    tail.len()
                ))
            })?;
            elements.push(Self::element(*id, data));
            rest = &tail[len..];
        }
        if !rest.is_empty() {
            return Err(PduError::InvalidHeader(
                "dangling byte after last element".into(),
            ));
        }
        Ok(Self { elements })
    }

    fn element(id: u8, data: &[u8]) -> InformationElement {
        match (id, data) {
            (IEI_CONCAT_8, &[reference, total, sequence]) => InformationElement::Concat(ConcatInfo {
                reference: u16::from(reference),
                total,
                sequence,
            }),
            (IEI_CONCAT_16, &[hi, lo, total, sequence]) => InformationElement::Concat(ConcatInfo {
                reference: u16::from_be_bytes([hi, lo]),
                total,
                sequence,
            }),
            (IEI_PORTS_8, &[destination, origin]) => InformationElement::Ports(PortAddressing {
                destination: u16::from(destination),
                origin: u16::from(origin),
            }),
            (IEI_PORTS_16, &[d_hi, d_lo, o_hi, o_lo]) => {
                InformationElement::Ports(PortAddressing {
                    destination: u16::from_be_bytes([d_hi, d_lo]),
                    origin: u16::from_be_bytes([o_hi, o_lo]),
                })
            },
            _ => InformationElement::Other {
                id,
                data: data.to_vec(),
            },
        }
    }

    pub fn concat(&self) -> Option<ConcatInfo> {
        self.elements.iter().find_map(|element| match element {
            InformationElement::Concat(info) if info.is_valid() => Some(*info),
            _ => None,
        })
    }

    pub fn ports(&self) -> Option<PortAddressing> {
        self.elements.iter().find_map(|element| match element {
            InformationElement::Ports(ports) => Some(*ports),
            _ => None,
        })
    }
}
