//! SMS-DELIVER TPDU (3GPP TS 23.040 §9.2.2.1).

use chrono::{DateTime, FixedOffset};

use crate::{
    PduError, Result, address, alphabet,
    dcs::{Alphabet, DataCoding},
    reader::PduReader,
    timestamp,
    udh::{ConcatInfo, PortAddressing, UserDataHeader},
};

const MTI_MASK: u8 = 0x03;
const MTI_DELIVER: u8 = 0x00;
const FLAG_MORE_MESSAGES: u8 = 0x04;
const FLAG_STATUS_REPORT: u8 = 0x20;
const FLAG_HEADER: u8 = 0x40;
const FLAG_REPLY_PATH: u8 = 0x80;

/// One decoded message segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedMessage {
    /// Originating address, `+`-prefixed when international.
    pub sender: String,
    pub body: String,
    pub service_center: Option<String>,
    pub timestamp: Option<DateTime<FixedOffset>>,
    pub protocol_id: u8,
    pub coding: DataCoding,
    pub header: Option<UserDataHeader>,
    /// More segments are waiting at the service centre (TP-MMS clear).
    pub more_messages: bool,
    pub status_report_requested: bool,
    pub reply_path: bool,
}

impl DecodedMessage {
    /// A plain 7-bit message with no metadata.
    pub fn new(sender: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            body: body.into(),
            service_center: None,
            timestamp: None,
            protocol_id: 0,
            coding: DataCoding::default(),
            header: None,
            more_messages: false,
            status_report_requested: false,
            reply_path: false,
        }
    }

    pub fn concat(&self) -> Option<ConcatInfo> {
        self.header.as_ref().and_then(UserDataHeader::concat)
    }

    pub fn ports(&self) -> Option<PortAddressing> {
        self.header.as_ref().and_then(UserDataHeader::ports)
    }
}

pub(crate) fn decode(pdu: &[u8]) -> Result<DecodedMessage> {
    if pdu.is_empty() {
        return Err(PduError::Empty);
    }

    let mut reader = PduReader::new(pdu);
    let service_center = address::read_service_center(&mut reader)?;

    let first = reader.read_u8("first octet")?;
    let mti = first & MTI_MASK;
    if mti != MTI_DELIVER {
        return Err(PduError::UnsupportedMessageType(mti));
    }

    let sender = address::read_originating(&mut reader)?;
    let protocol_id = reader.read_u8("protocol identifier")?;
    let coding = DataCoding::parse(reader.read_u8("data coding scheme")?);
    let timestamp = timestamp::parse(reader.take(7, "service centre time stamp")?);
    let user_data_length = usize::from(reader.read_u8("user data length")?);

    if coding.compressed {
        return Err(PduError::CompressedText);
    }

    let (header, body) = decode_user_data(
        reader.remaining(),
        user_data_length,
        first & FLAG_HEADER != 0,
        coding.alphabet,
    )?;

    Ok(DecodedMessage {
        sender,
        body,
        service_center,
        timestamp,
        protocol_id,
        coding,
        header,
        more_messages: first & FLAG_MORE_MESSAGES == 0,
        status_report_requested: first & FLAG_STATUS_REPORT != 0,
        reply_path: first & FLAG_REPLY_PATH != 0,
    })
}

/// Split TP-UD into its optional header and decoded text. `length` is in
/// septets for 7-bit text and octets otherwise, header included.
fn decode_user_data(
    user_data: &[u8],
    length: usize,
    has_header: bool,
    charset: Alphabet,
) -> Result<(Option<UserDataHeader>, String)> {
    let (header, header_octets) = if has_header {
        let header_length = usize::from(*user_data.first().ok_or(PduError::Truncated {
            field: "user data header length",
            needed: 1,
            available: 0,
        })?);
        let raw = user_data
            .get(1..1 + header_length)
            .ok_or(PduError::Truncated {
                field: "user data header",
                needed: header_length,
                available: user_data.len() - 1,
            })?;
        (Some(UserDataHeader::parse(raw)?), header_length + 1)
    } else {
        (None, 0)
    };
    let payload = &user_data[header_octets..];

    let body = match charset {
        Alphabet::Gsm7 => {
            let header_septets = (header_octets * 8).div_ceil(7);
            let fill_bits = header_septets * 7 - header_octets * 8;
            alphabet::unpack_to_string(payload, length.saturating_sub(header_septets), fill_bits)?
        },
        Alphabet::Eight | Alphabet::Ucs2 => {
            let octets = length.checked_sub(header_octets).ok_or_else(|| {
                PduError::InvalidHeader(format!(
                    "header of {header_octets} octets exceeds user data length {length}"
                ))
            })?;
            let text = payload.get(..octets).ok_or(PduError::Truncated {
                field: "user data",
                needed: octets,
                available: payload.len(),
            })?;
            if charset == Alphabet::Ucs2 {
                let (decoded, _had_errors) =
                    encoding_rs::UTF_16BE.decode_without_bom_handling(text);
                decoded.into_owned()
            } else {
                // Octet-for-character (ISO-8859-1) so binary payloads still
                // produce a string.
                text.iter().copied().map(char::from).collect()
            }
        },
    };

    Ok((header, body))
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_pdu() {
        assert_eq!(decode(&[]), Err(PduError::Empty));
    }

    #[test]
    fn header_length_past_end() {
        let err = decode_user_data(&[0x05, 0x00, 0x03], 4, true, Alphabet::Eight).unwrap_err();
        assert!(matches!(err, PduError::Truncated {
            field: "user data header",
            ..
        }));
    }

    #[test]
    fn header_longer_than_declared_length() {
        let err =
            decode_user_data(&[0x02, 0x24, 0x00, 0x41], 2, true, Alphabet::Ucs2).unwrap_err();
        assert!(matches!(err, PduError::InvalidHeader(_)));
    }

    #[test]
    fn seven_bit_header_consumes_all_septets() {
        let (header, body) =
            decode_user_data(&[0x02, 0x24, 0x00], 3, true, Alphabet::Gsm7).unwrap();
        assert!(header.is_some());
        assert_eq!(body, "");
    }

    #[test]
    fn lone_surrogate_is_replaced() {
        let (_, body) = decode_user_data(&[0xD8, 0x3D, 0x00, 0x41], 4, false, Alphabet::Ucs2)
            .unwrap();
        assert_eq!(body, "\u{FFFD}A");
    }

    #[test]
    fn eight_bit_maps_octets_to_latin1() {
        let (_, body) = decode_user_data(&[0x41, 0xE9, 0xFF], 3, false, Alphabet::Eight).unwrap();
        assert_eq!(body, "Aéÿ");
    }
}
