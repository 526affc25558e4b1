use std::time::{Duration, SystemTime};

// RTCP "wallclock" is NTP time, which starts at 1900-01-01.
//
// https://tools.ietf.org/html/rfc868
//
// 365 days * 70 years + 17 leap year days
// (365 * 70 + 17) * 86400 = 2208988800
const SECS_1900: u64 = 2_208_988_800;

const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Convert a time since UNIX epoch to a 64 bit NTP timestamp.
///
/// The upper 32 bits are whole seconds since 1900-01-01, the lower 32 bits the
/// fraction of a second. Seconds wrap modulo 2^32 (NTP era rollover in 2036).
pub fn encode_ntp(since_epoch: Duration) -> u64 {
    let secs = (since_epoch.as_secs() + SECS_1900) as u32 as u64;
    let frac = ((since_epoch.subsec_nanos() as u64) << 32) / NANOS_PER_SEC;

    secs << 32 | frac
}

/// Convert a 64 bit NTP timestamp back to a time since UNIX epoch.
///
/// Timestamps before 1970 saturate to zero.
pub fn decode_ntp(v: u64) -> Duration {
    let secs_ntp = v >> 32;
    let frac = v & 0xffff_ffff;

    // Round to nearest nanosecond.
    let nanos = (frac * NANOS_PER_SEC + (1 << 31)) >> 32;

    let Some(secs) = secs_ntp.checked_sub(SECS_1900) else {
        return Duration::ZERO;
    };

    Duration::new(secs, 0) + Duration::from_nanos(nanos)
}

/// The current wallclock as NTP timestamp.
pub fn ntp_now() -> u64 {
    let since_epoch = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default();

    encode_ntp(since_epoch)
}

/// The middle 32 bits of an NTP timestamp, 16 bits seconds and 16 bits fraction.
///
/// This is the form used for LSR in reception reports.
pub fn ntp_middle_32(v: u64) -> u32 {
    (v >> 16) as u32
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn epoch_is_secs_1900() {
        assert_eq!(encode_ntp(Duration::ZERO), SECS_1900 << 32);
        assert_eq!(decode_ntp(SECS_1900 << 32), Duration::ZERO);
    }

    #[test]
    fn half_second() {
        let ntp = encode_ntp(Duration::from_millis(1500));
        assert_eq!(ntp >> 32, SECS_1900 + 1);
        assert_eq!(ntp & 0xffff_ffff, 0x8000_0000);
        assert_eq!(decode_ntp(ntp), Duration::from_millis(1500));
    }

    #[test]
    fn round_trip_within_a_nanosecond() {
        for nanos in [0, 1, 233, 999_999_999, 123_456_789, 500_000_001] {
            let d = Duration::new(1_700_000_000, nanos);
            let d2 = decode_ntp(encode_ntp(d));

            let diff = if d > d2 { d - d2 } else { d2 - d };
            assert!(diff <= Duration::from_nanos(1), "{d:?} {d2:?}");
        }
    }

    #[test]
    fn before_1970_saturates() {
        assert_eq!(decode_ntp(0), Duration::ZERO);
        assert_eq!(decode_ntp(1 << 32), Duration::ZERO);
    }

    #[test]
    fn middle_32() {
        assert_eq!(ntp_middle_32(0x1122_3344_5566_7788), 0x3344_5566);
    }

    #[test]
    fn now_is_after_2020() {
        // 2020-01-01 in NTP seconds.
        assert!(ntp_now() >> 32 > 3_786_825_600);
    }
}
