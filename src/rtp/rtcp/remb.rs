use super::{FeedbackMessageType, PayloadType, RtcpHeader, RtcpPacket, RtcpType, Ssrc};

/// Bytes after the header up to the list of SSRC feedback.
const REMB_OFFSET: usize = 16;

/// Largest mantissa that fits the 18 bit field.
const MANTISSA_MAX: u64 = (1 << 18) - 1;

/// Largest exponent that fits the 6 bit field.
const EXP_MAX: u32 = 63;

/// Num SSRC is 8 bits, targets beyond this are not written.
const MAX_SSRCS: usize = u8::MAX as usize;

const UNIQUE_IDENTIFIER: [u8; 4] = [b'R', b'E', b'M', b'B'];

/*
    0                   1                   2                   3
    0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    |V=2|P| FMT=15  |   PT=206      |             length            |
    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    |                  SSRC of packet sender                        |
    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    |                  SSRC of media source                         |
    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    |  Unique identifier 'R' 'E' 'M' 'B'                            |
    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    |  Num SSRC     | BR Exp    |  BR Mantissa                      |
    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    |   SSRC feedback                                               |
    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    |  ...                                                          |
*/

/// Receiver Estimated Maximum Bitrate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Remb {
    /// SSRC of sender
    pub sender_ssrc: Ssrc,

    /// SSRC of source, in Remb always 0
    pub ssrc: Ssrc,

    /// Estimated maximum bitrate in bits per second.
    ///
    /// On the wire this is mantissa * 2^exp, so values above 2^18 lose
    /// precision in the low bits.
    pub bitrate: u64,

    /// SSRC entries which this packet applies to
    pub ssrcs: Vec<Ssrc>,
}

impl Remb {
    /// REMB for a bitrate that applies to the given targets.
    pub fn new(sender_ssrc: Ssrc, bitrate: u64, ssrcs: Vec<Ssrc>) -> Self {
        Remb {
            sender_ssrc,
            ssrc: 0.into(),
            bitrate,
            ssrcs,
        }
    }

    /// Targets that make it onto the wire.
    fn written_ssrcs(&self) -> &[Ssrc] {
        if self.ssrcs.len() > MAX_SSRCS {
            debug!("REMB with {} targets, writing {}", self.ssrcs.len(), MAX_SSRCS);
        }
        &self.ssrcs[..self.ssrcs.len().min(MAX_SSRCS)]
    }
}

/// Pack number of SSRC, exponent and mantissa into the 32 bit field.
///
/// The exponent is the smallest that makes the mantissa fit 18 bits.
pub fn pack_bitrate(num_ssrc: u8, bitrate: u64) -> u32 {
    let mut exp: u32 = 0;
    let mut mantissa = bitrate;

    while mantissa > MANTISSA_MAX {
        mantissa >>= 1;
        exp += 1;
    }

    (num_ssrc as u32) << 24 | exp << 18 | mantissa as u32
}

/// Unpack the 32 bit field into (number of SSRC, bitrate).
///
/// Saturates at `u64::MAX` for exponents that don't fit.
pub fn unpack_bitrate(v: u32) -> (u8, u64) {
    let num_ssrc = (v >> 24) as u8;
    let exp = (v >> 18) & EXP_MAX;
    let mantissa = (v & MANTISSA_MAX as u32) as u64;

    let bitrate = u64::try_from((mantissa as u128) << exp).unwrap_or(u64::MAX);

    (num_ssrc, bitrate)
}

impl RtcpPacket for Remb {
    fn header(&self) -> RtcpHeader {
        RtcpHeader {
            rtcp_type: RtcpType::PayloadSpecificFeedback,
            feedback_message_type: FeedbackMessageType::PayloadFeedback(
                PayloadType::ApplicationLayer,
            ),
            words_less_one: (self.length_words() - 1) as u16,
        }
    }

    fn length_words(&self) -> usize {
        // header
        // remb
        // ssrcs
        1 + REMB_OFFSET / 4 + self.ssrcs.len().min(MAX_SSRCS)
    }

    fn write_to(&self, buf: &mut [u8]) -> usize {
        let ssrcs = self.written_ssrcs();
        let packed = pack_bitrate(ssrcs.len() as u8, self.bitrate);

        self.header().write_to(&mut buf[..4]);
        buf[4..8].copy_from_slice(&self.sender_ssrc.to_be_bytes());
        buf[8..12].copy_from_slice(&[0; 4]);
        buf[12..16].copy_from_slice(&UNIQUE_IDENTIFIER);
        buf[16..20].copy_from_slice(&packed.to_be_bytes());

        // Write the SSRCs at the very end.
        for (index, ssrc) in ssrcs.iter().enumerate() {
            let begin = 4 + REMB_OFFSET + index * 4;
            buf[begin..begin + 4].copy_from_slice(&ssrc.to_be_bytes());
        }

        4 + REMB_OFFSET + ssrcs.len() * 4
    }
}

impl<'a> TryFrom<&'a [u8]> for Remb {
    type Error = &'static str;

    fn try_from(buf: &'a [u8]) -> Result<Self, Self::Error> {
        if buf.len() < REMB_OFFSET {
            return Err("Remb less than 16 bytes");
        }

        let sender_ssrc = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]).into();
        let media_ssrc = u32::from_be_bytes([buf[4], buf[5], buf[6], buf[7]]);
        if media_ssrc != 0 {
            return Err("Ssrc must be zero");
        }

        if buf[8..12] != UNIQUE_IDENTIFIER {
            return Err("Missing remb identifier");
        }

        let packed = u32::from_be_bytes([buf[12], buf[13], buf[14], buf[15]]);
        let (num_ssrc, bitrate) = unpack_bitrate(packed);

        let buf = &buf[REMB_OFFSET..];
        if buf.len() < num_ssrc as usize * 4 {
            return Err("Remb SSRC count larger than buffer");
        }

        let ssrcs = buf
            .chunks_exact(4)
            .take(num_ssrc as usize)
            .map(|c| u32::from_be_bytes([c[0], c[1], c[2], c[3]]).into())
            .collect();

        Ok(Remb {
            sender_ssrc,
            ssrc: 0.into(),
            bitrate,
            ssrcs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receiver_estimated_maximum_bitrate_marshal() {
        let input = Remb::new(1.into(), 8927168, vec![1215622422.into()]);

        let expected = [
            143, 206, 0, 5, 0, 0, 0, 1, 0, 0, 0, 0, 82, 69, 77, 66, 1, 26, 32, 223, 72, 116, 237,
            22,
        ];

        let mut output = [0; 1500];
        let len = input.write_to(&mut output);
        assert_eq!(expected, output[0..len]);
    }

    #[test]
    fn test_receiver_estimated_maximum_bitrate_unmarshal() {
        // Real data sent by Chrome while watching a 6Mb/s stream
        let input = [
            143, 206, 0, 5, 0, 0, 0, 1, 0, 0, 0, 0, 82, 69, 77, 66, 1, 26, 32, 223, 72, 116, 237,
            22,
        ];

        // mantissa = []byte{26 & 3, 32, 223} = []byte{2, 32, 223} = 139487
        // exp = 26 >> 2 = 6
        // bitrate = 139487 * 2^6 = 139487 * 64 = 8927168 = 8.9 Mb/s
        let expected = Remb::new(1.into(), 8927168, vec![1215622422.into()]);

        let packet = Remb::try_from(&input[4..]).unwrap();
        assert_eq!(expected, packet);
    }

    #[test]
    fn test_receiver_estimated_maximum_bitrate_truncate() {
        let mut packet = Remb::new(1.into(), 8927168, vec![1215622422.into()]);

        // If we subtract the bitrate by 1, we'll round down a lower mantissa
        packet.bitrate -= 1;

        let mut output = [0; 1500];
        let output_len = packet.write_to(&mut output);
        let expected = [
            143, 206, 0, 5, 0, 0, 0, 1, 0, 0, 0, 0, 82, 69, 77, 66, 1, 26, 32, 222, 72, 116, 237,
            22,
        ];
        assert_eq!(expected, output[0..output_len]);

        // Which if we actually unmarshal again, we'll find that it's actually decreased by 63 (which is exp)
        let packet = Remb::try_from(&output[4..output_len]).unwrap();
        assert_eq!(8927104, packet.bitrate);
    }

    #[test]
    fn bitrate_within_one_exponent_step() {
        for bitrate in [0, 1, 262_143, 262_144, 500_000, 5_000_000, u32::MAX as u64] {
            let packed = pack_bitrate(1, bitrate);
            let exp = (packed >> 18) & 63;
            let (n, decoded) = unpack_bitrate(packed);

            assert_eq!(n, 1);
            assert!(decoded <= bitrate);
            assert!(bitrate - decoded < 1_u64 << exp, "{bitrate} -> {decoded}");

            // Relative error at most 2^-18 (mantissa holds 18 significant bits).
            assert!((bitrate - decoded) as f64 <= bitrate as f64 / (1 << 17) as f64);
        }

        // Exact below 2^18.
        assert_eq!(unpack_bitrate(pack_bitrate(0, 262_143)).1, 262_143);
    }

    #[test]
    fn unpack_saturates() {
        // mantissa = 262143, exp = 63
        let (_, bitrate) = unpack_bitrate(0x00ff_ffff);
        assert_eq!(bitrate, u64::MAX);
    }

    #[test]
    fn targets_capped_at_255() {
        let ssrcs: Vec<Ssrc> = (0..256).map(Ssrc::from).collect();
        let packet = Remb::new(1.into(), 500_000, ssrcs.clone());

        assert_eq!(packet.length_words(), 1 + 4 + 255);

        let mut output = [0; 1500];
        let len = packet.write_to(&mut output);
        assert_eq!(len, packet.length_words() * 4);

        let header = RtcpHeader::try_from(&output[..4]).unwrap();
        assert_eq!(header.length_bytes(), len);

        let parsed = Remb::try_from(&output[4..len]).unwrap();
        assert_eq!(parsed.ssrcs, ssrcs[..255]);
    }

    #[test]
    fn reject_bad_remb() {
        let mut buf = [0, 0, 0, 1, 0, 0, 0, 0, b'R', b'E', b'M', b'B', 1, 0, 0, 0];
        // Says one SSRC, has none.
        assert!(Remb::try_from(&buf[..]).is_err());

        buf[12] = 0;
        buf[8] = b'X';
        assert!(Remb::try_from(&buf[..]).is_err());
    }
}
