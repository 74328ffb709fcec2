//! Digirom commands and their execution results.
//!
//! A digirom is one physical interaction with a toy: a signal type
//! (`V`, `X`, `LT`, …), a turn (who speaks first), and an ordered list of
//! packets. Command strings look like this:
//!
//! ```text
//! X2-0069-2169-8009          PenX scan, toy speaks first
//! LT2                        Legendz listen-only scan
//! LT1-0A0B…-AA590003         Legendz replay of a received payload
//! X2-0012-3456-789A-@4^3^F9  packet with bit operators
//! ```
//!
//! Executing the digirom against hardware is someone else's job; the
//! executor fills [`Digirom::result`] with one [`ResultSegment`] per
//! packet that was sent or received.

use std::fmt;

use crate::CommandError;

/// Which way a packet travelled during execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Sent,
    Received,
}

/// One entry of an execution result.
///
/// `data` is `None` when the transceiver expected a packet and got
/// nothing (a timeout); the segment is still recorded so indices stay
/// aligned with the packet exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultSegment {
    pub direction: Direction,
    pub data: Option<Vec<u8>>,
}

impl ResultSegment {
    /// A packet the toy sent to us.
    pub fn received(data: impl Into<Vec<u8>>) -> Self {
        Self {
            direction: Direction::Received,
            data: Some(data.into()),
        }
    }

    /// A packet we sent to the toy.
    pub fn sent(data: impl Into<Vec<u8>>) -> Self {
        Self {
            direction: Direction::Sent,
            data: Some(data.into()),
        }
    }

    /// Expected a packet, got nothing.
    pub fn timeout() -> Self {
        Self {
            direction: Direction::Received,
            data: None,
        }
    }

    /// Upper-case hex of the data, empty for a timeout.
    pub fn hex(&self) -> String {
        self.data.as_deref().map(hex::encode_upper).unwrap_or_default()
    }
}

impl fmt::Display for ResultSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.direction {
            Direction::Sent => 's',
            Direction::Received => 'r',
        };
        match &self.data {
            Some(_) => write!(f, "{tag}:{}", self.hex()),
            None => write!(f, "t"),
        }
    }
}

/// One dash-separated packet of a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    /// Plain hex: the exact bytes to send.
    Bytes(Vec<u8>),
    /// Hex mixed with operators (`@`, `^`, `+`, `_`); resolved by the
    /// transceiver against the bytes it receives, opaque here.
    Pattern(String),
}

impl Packet {
    /// The bytes of a plain packet.
    pub fn data(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) => Some(b),
            Self::Pattern(_) => None,
        }
    }

    /// Mutable bytes of a plain packet.
    pub fn data_mut(&mut self) -> Option<&mut Vec<u8>> {
        match self {
            Self::Bytes(b) => Some(b),
            Self::Pattern(_) => None,
        }
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bytes(b) => f.write_str(&hex::encode_upper(b)),
            Self::Pattern(p) => f.write_str(p),
        }
    }
}

/// A parsed, executable command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digirom {
    signal_type: String,
    turn: u8,
    packets: Vec<Packet>,
    /// Filled in by the executor. Empty until the digirom has run.
    pub result: Vec<ResultSegment>,
}

impl Digirom {
    pub fn new(signal_type: impl Into<String>, turn: u8, packets: Vec<Packet>) -> Self {
        Self {
            signal_type: signal_type.into(),
            turn,
            packets,
            result: Vec::new(),
        }
    }

    pub fn signal_type(&self) -> &str {
        &self.signal_type
    }

    pub fn turn(&self) -> u8 {
        self.turn
    }

    pub fn packets(&self) -> &[Packet] {
        &self.packets
    }

    pub fn packets_mut(&mut self) -> &mut [Packet] {
        &mut self.packets
    }

    /// Number of packets (not result segments).
    pub fn len(&self) -> usize {
        self.packets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }

    /// The execution result as published on the output feed, e.g.
    /// `"s:FC03 r:FD02"`. Empty when the toy did not answer.
    pub fn result_text(&self) -> String {
        self.result
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for Digirom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.signal_type, self.turn)?;
        for packet in &self.packets {
            write!(f, "-{packet}")?;
        }
        Ok(())
    }
}

/// Parses a command string into a [`Digirom`].
///
/// Case-insensitive; output is normalised to upper case.
///
/// # Errors
/// Returns a [`CommandError`] naming the part of the string that failed.
pub fn parse_command(command: &str) -> Result<Digirom, CommandError> {
    let command = command.trim().to_ascii_uppercase();
    if command.is_empty() {
        return Err(CommandError::Empty);
    }

    let mut parts = command.split('-');
    // `split` always yields at least one item.
    let head = parts.next().unwrap_or_default();

    let signal_len = head
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(head.len());
    if signal_len == 0 {
        return Err(CommandError::MissingSignalType(command.clone()));
    }
    let (signal_type, turn_str) = head.split_at(signal_len);
    let turn = match turn_str {
        "0" => 0,
        "1" => 1,
        "2" => 2,
        _ => return Err(CommandError::BadTurn(command.clone())),
    };

    let packets = parts
        .map(|text| parse_packet(&command, text))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Digirom::new(signal_type, turn, packets))
}

fn parse_packet(command: &str, text: &str) -> Result<Packet, CommandError> {
    let bad = || CommandError::BadPacket {
        command: command.to_string(),
        packet: text.to_string(),
    };

    if text.is_empty() {
        return Err(bad());
    }
    if text.chars().all(|c| c.is_ascii_hexdigit()) {
        return hex::decode(text)
            .map(Packet::Bytes)
            .map_err(|_| CommandError::OddHex {
                command: command.to_string(),
                packet: text.to_string(),
            });
    }
    let allowed = |c: char| c.is_ascii_hexdigit() || matches!(c, '@' | '^' | '+' | '_');
    if text.chars().all(allowed) {
        Ok(Packet::Pattern(text.to_string()))
    } else {
        Err(bad())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scan_without_packets() {
        let rom = parse_command("LT2").unwrap();
        assert_eq!(rom.signal_type(), "LT");
        assert_eq!(rom.turn(), 2);
        assert!(rom.is_empty());
    }

    #[test]
    fn test_parse_plain_packets_as_bytes() {
        let rom = parse_command("X2-0069-2169-8009").unwrap();
        assert_eq!(rom.signal_type(), "X");
        assert_eq!(rom.len(), 3);
        assert_eq!(rom.packets()[0], Packet::Bytes(vec![0x00, 0x69]));
        assert_eq!(rom.packets()[2].data(), Some(&[0x80, 0x09][..]));
    }

    #[test]
    fn test_parse_operator_packet_as_pattern() {
        let rom = parse_command("x2-0012-@4^3^f9").unwrap();
        assert_eq!(rom.packets()[1], Packet::Pattern("@4^3^F9".into()));
        assert_eq!(rom.packets()[1].data(), None);
    }

    #[test]
    fn test_display_normalises_case() {
        let rom = parse_command("lt1-0a0b-aa590003").unwrap();
        assert_eq!(rom.to_string(), "LT1-0A0B-AA590003");
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert_eq!(parse_command("  "), Err(CommandError::Empty));
        assert!(matches!(
            parse_command("12-34"),
            Err(CommandError::MissingSignalType(_))
        ));
        assert!(matches!(parse_command("V3-0000"), Err(CommandError::BadTurn(_))));
        assert!(matches!(parse_command("V"), Err(CommandError::BadTurn(_))));
        assert!(matches!(
            parse_command("V1--0000"),
            Err(CommandError::BadPacket { .. })
        ));
        assert!(matches!(
            parse_command("V1-ZZ"),
            Err(CommandError::BadPacket { .. })
        ));
        assert!(matches!(
            parse_command("V1-123"),
            Err(CommandError::OddHex { .. })
        ));
    }

    #[test]
    fn test_result_segment_display() {
        assert_eq!(ResultSegment::received([0x12, 0xAB]).to_string(), "r:12AB");
        assert_eq!(ResultSegment::sent([0x01]).to_string(), "s:01");
        assert_eq!(ResultSegment::timeout().to_string(), "t");
        assert_eq!(ResultSegment::timeout().hex(), "");
    }

    #[test]
    fn test_result_text_joins_segments() {
        let mut rom = parse_command("V1-FC03").unwrap();
        assert_eq!(rom.result_text(), "");

        rom.result = vec![
            ResultSegment::sent([0xFC, 0x03]),
            ResultSegment::received([0xFD, 0x02]),
        ];
        assert_eq!(rom.result_text(), "s:FC03 r:FD02");
    }
}
