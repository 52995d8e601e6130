//! TP-DCS coding groups (3GPP TS 23.038 §4).

/// Character set of the user data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Alphabet {
    /// GSM 7-bit default alphabet, septet packed.
    Gsm7,
    /// 8-bit data.
    Eight,
    /// UCS-2, big endian.
    Ucs2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageClass {
    /// Immediate display ("flash" message).
    Class0,
    /// Mobile equipment specific.
    Class1,
    /// SIM specific.
    Class2,
    /// Terminal equipment specific.
    Class3,
}

impl MessageClass {
    fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => Self::Class0,
            1 => Self::Class1,
            2 => Self::Class2,
            _ => Self::Class3,
        }
    }
}

/// Message waiting indication carried in coding groups `1100`..`1110`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageWaiting {
    pub active: bool,
    /// 0 voicemail, 1 fax, 2 e-mail, 3 other.
    pub kind: u8,
    /// `false` for the "discard message" group.
    pub store: bool,
}

/// Decoded data coding scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DataCoding {
    pub raw: u8,
    pub alphabet: Alphabet,
    pub class: Option<MessageClass>,
    pub compressed: bool,
    pub message_waiting: Option<MessageWaiting>,
}

impl Default for DataCoding {
    fn default() -> Self {
        Self::parse(0x00)
    }
}

impl DataCoding {
    pub fn parse(dcs: u8) -> Self {
        let mut coding = Self {
            raw: dcs,
            alphabet: Alphabet::Gsm7,
            class: None,
            compressed: false,
            message_waiting: None,
        };

        match dcs >> 4 {
            // General data coding, with or without automatic deletion.
            0x0..=0x7 => {
                coding.compressed = dcs & 0x20 != 0;
                coding.alphabet = match (dcs >> 2) & 0x03 {
                    0 => Alphabet::Gsm7,
                    2 => Alphabet::Ucs2,
                    // 01 is 8-bit data, 11 is reserved and read the same way.
                    _ => Alphabet::Eight,
                };
                if dcs & 0x10 != 0 {
                    coding.class = Some(MessageClass::from_bits(dcs));
                }
            },
            // Reserved coding groups.
            0x8..=0xB => {},
            group @ (0xC..=0xE) => {
                if group == 0xE {
                    coding.alphabet = Alphabet::Ucs2;
                }
                coding.message_waiting = Some(MessageWaiting {
                    active: dcs & 0x08 != 0,
                    kind: dcs & 0x03,
                    store: group != 0xC,
                });
            },
            // Data coding / message class.
            _ => {
                if dcs & 0x04 != 0 {
                    coding.alphabet = Alphabet::Eight;
                }
                coding.class = Some(MessageClass::from_bits(dcs));
            },
        }

        coding
    }
}
