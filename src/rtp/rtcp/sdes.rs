use std::str::from_utf8;

use super::list::private::WordSized;
use super::{pad_bytes_to_word, ReportList, RtcpHeader, RtcpPacket};
use super::{FeedbackMessageType, RtcpType, Ssrc};

/// Longest text an SDES item can hold, the length is one octet.
pub const MAX_ITEM_LEN: usize = 255;

/// Multiple source descriptions (SDES).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptions {
    /// The descriptions.
    pub reports: ReportList<Sdes>,
}

/// A single source description (SDES) chunk.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sdes {
    pub ssrc: Ssrc,
    pub values: ReportList<(SdesType, String)>,
}

/// Types of SDES values.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum SdesType {
    /// End of SDES list
    END = 0,
    /// Canonical name.
    CNAME = 1,
    /// User name
    NAME = 2,
    /// User's electronic mail address
    EMAIL = 3,
    /// User's phone number
    PHONE = 4,
    /// Geographic user location
    LOC = 5,
    /// Name of application or tool
    TOOL = 6,
    /// Notice about the source
    NOTE = 7,
    /// Private extensions
    PRIV = 8,
    /// Who knows
    Unknown,
}

impl Sdes {
    /// A chunk holding just a CNAME.
    pub fn cname(ssrc: Ssrc, cname: &str) -> Self {
        Sdes {
            ssrc,
            values: (SdesType::CNAME, cname.to_string()).into(),
        }
    }

    fn write_to(&self, buf: &mut [u8]) -> usize {
        buf[..4].copy_from_slice(&self.ssrc.to_be_bytes());
        let mut tot = 4;

        let mut buf = &mut buf[4..];
        for (t, v) in &self.values {
            let bytes = v.as_bytes();
            let len = bytes.len().min(MAX_ITEM_LEN);

            buf[0] = *t as u8;
            buf[1] = len as u8;

            buf = &mut buf[2..];
            buf[..len].copy_from_slice(&bytes[..len]);

            buf = &mut buf[len..];
            tot += 2 + len;
        }

        // One END octet, then null octets up to the word boundary.
        let padded = pad_bytes_to_word(tot + 1);
        for b in &mut buf[..padded - tot] {
            *b = SdesType::END as u8;
        }

        padded
    }
}

impl WordSized for Sdes {
    fn word_size(&self) -> usize {
        let item_sizes: Vec<usize> = self.values.iter().map(|(_, s)| s.len()).collect();
        chunk_size(&item_sizes) / 4
    }
}

/// Byte size of one SDES chunk holding items with the given text lengths.
pub(crate) fn chunk_size(item_sizes: &[usize]) -> usize {
    let byte_size = 4
        + item_sizes
            .iter()
            // 2 here for 2 byte encoding of type + length
            .map(|&s| 2 + s.min(MAX_ITEM_LEN))
            .sum::<usize>()
        + 1; // 1 here for the end byte

    pad_bytes_to_word(byte_size)
}

impl RtcpPacket for Descriptions {
    fn header(&self) -> RtcpHeader {
        RtcpHeader {
            rtcp_type: RtcpType::SourceDescription,
            feedback_message_type: FeedbackMessageType::SourceCount(self.reports.len() as u8),
            words_less_one: (self.length_words() - 1) as u16,
        }
    }

    fn length_words(&self) -> usize {
        // * header: 1
        // * size-per-item * items
        1 + self.reports.iter().map(|r| r.word_size()).sum::<usize>()
    }

    fn write_to(&self, buf: &mut [u8]) -> usize {
        self.header().write_to(buf);

        let mut buf = &mut buf[4..];
        let mut tot = 4;

        for r in &self.reports {
            let n = r.write_to(buf);
            buf = &mut buf[n..];
            tot += n;
        }

        tot
    }
}

impl From<u8> for SdesType {
    fn from(v: u8) -> Self {
        use SdesType::*;
        match v {
            0 => END,
            1 => CNAME,
            2 => NAME,
            3 => EMAIL,
            4 => PHONE,
            5 => LOC,
            6 => TOOL,
            7 => NOTE,
            8 => PRIV,
            _ => Unknown,
        }
    }
}

impl<'a> TryFrom<(usize, &'a [u8])> for Descriptions {
    type Error = &'static str;

    fn try_from((count, buf): (usize, &'a [u8])) -> Result<Self, Self::Error> {
        let mut reports = ReportList::new();

        let mut buf = buf;

        for _ in 0..count {
            let (report, len) = Sdes::parse(buf)?;
            buf = buf.get(len..).unwrap_or_default();

            reports.push(report);
        }

        Ok(Descriptions { reports })
    }
}

impl<'a> TryFrom<&'a [u8]> for Sdes {
    type Error = &'static str;

    fn try_from(buf: &'a [u8]) -> Result<Self, Self::Error> {
        Sdes::parse(buf).map(|(sdes, _)| sdes)
    }
}

impl Sdes {
    /// Parse one chunk, returning it with the number of bytes it occupies,
    /// padding included. Skipped items still count.
    fn parse(buf: &[u8]) -> Result<(Sdes, usize), &'static str> {
        if buf.len() < 8 {
            return Err("Less than 8 bytes for Sdes");
        }

        let ssrc = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]).into();
        let mut values = ReportList::new();

        let total = buf.len();
        let mut buf = &buf[4..];

        loop {
            // The list of items in each chunk is terminated by one or more null
            // octets, the first of which is the END item type. No length octet
            // follows it.
            let Some(&t) = buf.first() else {
                return Err("Sdes chunk not terminated");
            };

            let stype: SdesType = t.into();
            if matches!(stype, SdesType::END) {
                buf = &buf[1..];
                break;
            }

            if buf.len() < 2 {
                return Err("Less than 2 bytes for next Sdes value");
            }

            let len = buf[1] as usize;

            if buf.len() < 2 + len {
                return Err("Not enough buf.len() for Sdes value");
            }
            buf = &buf[2..];

            if let Ok(value) = from_utf8(&buf[..len]) {
                values.push((stype, value.to_string()));
            } else {
                trace!("Skip SDES value that is not utf-8");
            }

            buf = &buf[len..];
        }

        let consumed = pad_bytes_to_word(total - buf.len());

        Ok((Sdes { ssrc, values }, consumed))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn computed_and_write_to_equal() {
        let mut buf = vec![0; 1500];

        for i in 1usize..=300 {
            let sdes = Sdes::cname(1.into(), &"a".repeat(i));
            assert_eq!(sdes.write_to(&mut buf), sdes.word_size() * 4);
        }
    }

    #[test]
    fn cname_write_read() {
        let d = Descriptions {
            reports: Sdes::cname(0x1234.into(), "abc123").into(),
        };

        let mut buf = vec![0; 50];
        let n = d.write_to(&mut buf);
        buf.truncate(n);

        // 4 header + 4 ssrc + 2 + 6 text + 1 end -> 17, padded to 20.
        assert_eq!(n, 20);
        assert_eq!(
            buf,
            [
                0x81, 202, 0, 4, //
                0, 0, 0x12, 0x34, //
                1, 6, b'a', b'b', b'c', b'1', b'2', b'3', //
                0, 0, 0, 0,
            ]
        );

        let d2 = Descriptions::try_from((1_usize, &buf[4..])).unwrap();
        assert_eq!(d, d2);
    }

    #[test]
    fn skipped_item_keeps_chunk_alignment() {
        let buf = [
            0, 0, 0, 1, //
            2, 2, 0xff, 0xfe, // NAME, not utf-8
            1, 1, b'a', 0, // CNAME "a", END
            0, 0, 0, 2, //
            1, 1, b'b', 0, // CNAME "b", END
        ];

        let d = Descriptions::try_from((2_usize, &buf[..])).unwrap();

        assert_eq!(d.reports.len(), 2);
        assert_eq!(d.reports[0], Sdes::cname(1.into(), "a"));
        assert_eq!(d.reports[1], Sdes::cname(2.into(), "b"));
    }

    #[test]
    fn unterminated_chunk() {
        let buf = [0, 0, 0, 1, 1, 2, b'h', b'i'];
        assert!(Sdes::try_from(&buf[..]).is_err());
    }
}
