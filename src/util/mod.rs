mod ntp;
pub use ntp::{decode_ntp, encode_ntp, ntp_middle_32, ntp_now};

mod callback;
pub use callback::{SinkFn, SyncCallback};
