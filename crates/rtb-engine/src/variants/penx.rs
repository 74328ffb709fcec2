//! Digimon PenX battle.
//!
//! The host scans with a 3-packet exchange (7 result segments when the
//! toy answers everything) and sends the toy's words at indices 0, 2, 4
//! as `X2-…-@4^3^F9`. The guest replays that, collects 9 segments, and
//! answers `X1-…` from its toy's words at 0, 2, 4, 6, which the host
//! replays in turn.

use rtb_protocol::ResultSegment;

use crate::strategy::hex_at;
use crate::{Exchange, HostTiming, Scan};

/// PenX battle, scanning side.
#[derive(Debug, Clone, Copy, Default)]
pub struct PenXHost;

impl PenXHost {
    pub const SCAN: &'static str = "X2-0069-2169-8009";
    pub const TIMING: HostTiming = HostTiming::from_secs(0, 7, 3, 3);
}

impl Exchange for PenXHost {
    fn message(&self, result: &[ResultSegment]) -> String {
        format!(
            "X2-{}-{}-{}-@4^3^F9",
            hex_at(result, 0),
            hex_at(result, 2),
            hex_at(result, 4),
        )
    }

    fn matched(&self, rom: &str) -> bool {
        rom.starts_with("X1-")
    }

    fn comm_successful(&self, result: &[ResultSegment]) -> bool {
        result.len() == 8
    }
}

impl Scan for PenXHost {
    fn scan_command(&self) -> &str {
        Self::SCAN
    }

    fn scan_successful(&self, result: &[ResultSegment]) -> bool {
        result.len() == 7 && result[6].data.is_some()
    }

    fn timing(&self) -> HostTiming {
        Self::TIMING
    }
}

/// PenX battle, answering side.
#[derive(Debug, Clone, Copy, Default)]
pub struct PenXGuest;

impl Exchange for PenXGuest {
    fn message(&self, result: &[ResultSegment]) -> String {
        format!(
            "X1-{}-{}-{}-{}",
            hex_at(result, 0),
            hex_at(result, 2),
            hex_at(result, 4),
            hex_at(result, 6),
        )
    }

    fn matched(&self, rom: &str) -> bool {
        rom.starts_with("X2-")
    }

    fn comm_successful(&self, result: &[ResultSegment]) -> bool {
        result.len() == 9
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: u16) -> Vec<ResultSegment> {
        (0..n)
            .map(|i| {
                if i % 2 == 0 {
                    ResultSegment::received((0x1000 + i).to_be_bytes())
                } else {
                    ResultSegment::sent((0x2000 + i).to_be_bytes())
                }
            })
            .collect()
    }

    #[test]
    fn test_host_scan_successful() {
        assert!(PenXHost.scan_successful(&words(7)));
        assert!(!PenXHost.scan_successful(&words(6)));

        let mut timed_out = words(7);
        timed_out[6] = ResultSegment::timeout();
        assert!(!PenXHost.scan_successful(&timed_out));
    }

    #[test]
    fn test_host_message_uses_even_words() {
        assert_eq!(PenXHost.message(&words(7)), "X2-1000-1002-1004-@4^3^F9");
    }

    #[test]
    fn test_guest_message_uses_even_words() {
        assert_eq!(PenXGuest.message(&words(9)), "X1-1000-1002-1004-1006");
    }

    #[test]
    fn test_matched_prefixes() {
        assert!(PenXHost.matched("X1-0000-0000-0000-0000"));
        assert!(!PenXHost.matched("X2-0000"));
        assert!(PenXGuest.matched("X2-0000-0000-0000-@4^3^F9"));
        assert!(!PenXGuest.matched("LT1-00"));
    }

    #[test]
    fn test_comm_successful_counts() {
        assert!(PenXHost.comm_successful(&words(8)));
        assert!(!PenXHost.comm_successful(&words(9)));
        assert!(PenXGuest.comm_successful(&words(9)));
        assert!(!PenXGuest.comm_successful(&words(8)));
    }
}
