#![allow(clippy::unusual_byte_groupings)]

use super::{Pt, RtpError, Ssrc};

/// Fixed part of the RTP header.
pub(crate) const LEN_FIXED: usize = 12;

/// Max number of CSRC that fits the 4 bit CC field.
const MAX_CSRC: usize = 15;

/// Parsed header from an RTP packet.
///
/// See [RFC 3550 5.1](https://www.rfc-editor.org/rfc/rfc3550#section-5.1)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtpHeader {
    /// Always 2
    pub version: u8,
    /// Whether the RTP packet has padding to be an equal of 4 bytes.
    pub has_padding: bool,
    /// RTP packet has "RTP header extensions".
    pub has_extension: bool,
    /// For video, this marker signifies the end of a series of packets that
    /// together form a single video frame.
    /// For audio, it marks the beginning of a talkspurt, which is a burst of
    /// audio packets.
    pub marker: bool,
    /// Type of payload being carried. What this correlates to is sent in the SDP.
    pub payload_type: Pt,
    /// Sequence number increasing by 1 for each RTP packet. Wraps at 65536.
    pub sequence_number: u16,
    /// Timestamp in media time for the RTP packet. What the media time base is depends
    /// on the codec.
    pub timestamp: u32,
    /// Sender source identifier.
    pub ssrc: Ssrc,
    /// Contributing sources. At most 15.
    pub csrc: Vec<Ssrc>,
    /// "defined by profile" value of the header extension block.
    pub extension_profile: u16,
    /// Header extension body, a whole number of words. Only written if `has_extension`.
    pub extension: Vec<u8>,
}

impl RtpHeader {
    /// Length of the header in bytes, CSRC and extension block included.
    pub fn header_len(&self) -> usize {
        let ext = if self.has_extension {
            4 + self.extension.len()
        } else {
            0
        };
        LEN_FIXED + 4 * self.csrc.len() + ext
    }

    /// Tells if the second octet (marker + payload type) reads as RTCP SR (200)
    /// or RR (201). Such data has been tagged as RTP by mistake.
    ///
    /// See [RFC 5761 4](https://www.rfc-editor.org/rfc/rfc5761#section-4)
    pub fn collides_with_sr_rr(&self) -> bool {
        let b = *self.payload_type & 0b0111_1111 | if self.marker { 1 << 7 } else { 0 };
        b == 200 || b == 201
    }

    /// Write the header to the buffer.
    ///
    /// Panics if the buffer doesn't have capacity for `header_len()` bytes.
    pub fn write_to(&self, buf: &mut [u8]) -> usize {
        assert!(self.csrc.len() <= MAX_CSRC, "At most 15 CSRC");
        assert!(*self.payload_type <= 127);
        assert!(self.extension.len() % 4 == 0, "Extension is whole words");

        buf[0] = (self.version & 0b11) << 6
            | if self.has_padding { 1 << 5 } else { 0 }
            | if self.has_extension { 1 << 4 } else { 0 }
            | self.csrc.len() as u8;

        buf[1] = *self.payload_type & 0b0111_1111 | if self.marker { 1 << 7 } else { 0 };

        buf[2..4].copy_from_slice(&self.sequence_number.to_be_bytes());
        buf[4..8].copy_from_slice(&self.timestamp.to_be_bytes());
        buf[8..12].copy_from_slice(&self.ssrc.to_be_bytes());

        let mut offset = LEN_FIXED;
        for csrc in &self.csrc {
            buf[offset..offset + 4].copy_from_slice(&csrc.to_be_bytes());
            offset += 4;
        }

        if self.has_extension {
            let words = (self.extension.len() / 4) as u16;
            buf[offset..offset + 2].copy_from_slice(&self.extension_profile.to_be_bytes());
            buf[offset + 2..offset + 4].copy_from_slice(&words.to_be_bytes());
            offset += 4;
            buf[offset..offset + self.extension.len()].copy_from_slice(&self.extension);
            offset += self.extension.len();
        }

        offset
    }

    /// Parse the header from the start of an RTP packet.
    pub fn parse(buf: &[u8]) -> Result<RtpHeader, RtpError> {
        if buf.len() < LEN_FIXED {
            trace!("RTP header too short < 12: {}", buf.len());
            return Err(RtpError::ParseHeader);
        }

        let version = (buf[0] & 0b11_0_0_0000) >> 6;
        if version != 2 {
            return Err(RtpError::BadVersion(version));
        }
        let has_padding = buf[0] & 0b00_1_0_0000 > 0;
        let has_extension = buf[0] & 0b00_0_1_0000 > 0;
        let csrc_count = (buf[0] & 0b00_0_0_1111) as usize;
        let marker = buf[1] & 0b1000_0000 > 0;
        let payload_type = (buf[1] & 0b0111_1111).into();
        let sequence_number = u16::from_be_bytes([buf[2], buf[3]]);
        let timestamp = u32::from_be_bytes([buf[4], buf[5], buf[6], buf[7]]);
        let ssrc = u32::from_be_bytes([buf[8], buf[9], buf[10], buf[11]]).into();

        let buf = &buf[LEN_FIXED..];

        let csrc_len = 4 * csrc_count;
        if buf.len() < csrc_len {
            trace!("RTP header invalid, not enough csrc");
            return Err(RtpError::ParseHeader);
        }

        let csrc = buf[..csrc_len]
            .chunks_exact(4)
            .map(|c| u32::from_be_bytes([c[0], c[1], c[2], c[3]]).into())
            .collect();

        let buf = &buf[csrc_len..];

        let (extension_profile, extension) = if has_extension {
            if buf.len() < 4 {
                trace!("RTP bad header extension");
                return Err(RtpError::ParseHeader);
            }
            let profile = u16::from_be_bytes([buf[0], buf[1]]);
            let ext_len = u16::from_be_bytes([buf[2], buf[3]]) as usize * 4;

            let buf = &buf[4..];
            if buf.len() < ext_len {
                trace!("RTP ext len larger than header {} > {}", ext_len, buf.len());
                return Err(RtpError::ParseHeader);
            }

            (profile, buf[..ext_len].to_vec())
        } else {
            (0, vec![])
        };

        Ok(RtpHeader {
            version,
            has_padding,
            has_extension,
            marker,
            payload_type,
            sequence_number,
            timestamp,
            ssrc,
            csrc,
            extension_profile,
            extension,
        })
    }

    /// Number of padding bytes at the end of the packet, as told by its last octet.
    ///
    /// `None` if the padding bit isn't set, or the count doesn't fit the payload.
    pub fn padding_len(&self, packet: &[u8]) -> Option<usize> {
        if !self.has_padding {
            return None;
        }
        let pad = *packet.last()? as usize;
        let payload_len = packet.len().checked_sub(self.header_len())?;
        if pad == 0 || pad > payload_len {
            return None;
        }
        Some(pad)
    }
}

impl Default for RtpHeader {
    fn default() -> Self {
        Self {
            version: 2,
            has_padding: false,
            has_extension: false,
            marker: false,
            payload_type: 96.into(),
            sequence_number: 0,
            timestamp: 0,
            ssrc: 0.into(),
            csrc: vec![],
            extension_profile: 0,
            extension: vec![],
        }
    }
}
