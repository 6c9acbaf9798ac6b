//! Readout word classification.
//!
//! Mesytec VMMR-8/16 buffers are streams of little-endian 32-bit words.
//! The top two bits carry the word signature; the remaining payload
//! layout depends on the signature.

/// Mask selecting the two signature bits of a readout word.
pub const SIGNATURE_MASK: u32 = 0xC000_0000;
/// Signature value of a frame header word.
pub const HEADER_SIGNATURE: u32 = 0x4000_0000;
/// Signature value of a data word.
pub const DATA_SIGNATURE: u32 = 0x0000_0000;
/// Signature value of an end-of-event word.
pub const END_OF_EVENT_SIGNATURE: u32 = 0xC000_0000;

/// Mask selecting the module id of a header word.
pub const MODULE_MASK: u32 = 0x00FF_0000;
/// Right-shift that aligns the module id to bit 0.
pub const MODULE_SHIFT: u32 = 16;

/// Mask selecting the raw channel of a data word.
pub const CHANNEL_MASK: u32 = 0x001F_0000;
/// Right-shift that aligns the raw channel to bit 0.
pub const CHANNEL_SHIFT: u32 = 16;
/// Mask selecting the ADC payload of a data word.
pub const ADC_MASK: u32 = 0x0000_3FFF;

/// Mask selecting the time-of-flight stamp of an end-of-event word.
pub const TIMESTAMP_MASK: u32 = 0x3FFF_FFFF;

/// A readout word decoded into its payload fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordKind {
    /// Opens a frame and names the bus module it came from.
    Header {
        /// Module id, bits 16..=23.
        module: u8,
    },
    /// One sampled signal inside the current frame.
    Data {
        /// Raw channel, bits 16..=20.
        channel: u8,
        /// ADC amplitude, bits 0..=13.
        adc: u16,
    },
    /// Closes a frame and stamps it with a time-of-flight.
    EndOfEvent {
        /// 30-bit time-of-flight counter, bits 0..=29.
        time_of_flight: u32,
    },
    /// Signature `0b10`, carried by no known word type.
    Unknown,
}

impl WordKind {
    /// Classifies a raw 32-bit readout word.
    #[must_use]
    pub fn classify(word: u32) -> Self {
        match word & SIGNATURE_MASK {
            HEADER_SIGNATURE => Self::Header {
                module: ((word & MODULE_MASK) >> MODULE_SHIFT) as u8,
            },
            DATA_SIGNATURE => Self::Data {
                channel: ((word & CHANNEL_MASK) >> CHANNEL_SHIFT) as u8,
                adc: (word & ADC_MASK) as u16,
            },
            END_OF_EVENT_SIGNATURE => Self::EndOfEvent {
                time_of_flight: word & TIMESTAMP_MASK,
            },
            _ => Self::Unknown,
        }
    }

    /// Returns true for header words.
    #[must_use]
    pub fn is_header(&self) -> bool {
        matches!(self, Self::Header { .. })
    }

    /// Returns true for data words.
    #[must_use]
    pub fn is_data(&self) -> bool {
        matches!(self, Self::Data { .. })
    }

    /// Returns true for end-of-event words.
    #[must_use]
    pub fn is_end_of_event(&self) -> bool {
        matches!(self, Self::EndOfEvent { .. })
    }
}
