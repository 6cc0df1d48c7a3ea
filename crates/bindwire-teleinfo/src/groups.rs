//! Information group tokenizer.
//!
//! ```text
//! STX  LF LABEL SP VALUE SP CHECKSUM CR  ...  ETX
//! ```
//!
//! The checksum covers `LABEL SP VALUE` and may itself be a space, so a
//! group is split from the right.

use crate::config::ParseConfig;
use crate::error::{Result, TeleinfoError};

/// Start of frame.
pub const STX: char = '\u{02}';
/// End of frame.
pub const ETX: char = '\u{03}';
/// Frame interrupted by the meter.
pub const EOT: char = '\u{04}';

const GROUP_START: char = '\n';
const GROUP_END: char = '\r';
const SEPARATOR: u8 = b' ';

/// Checksum character of a group body (`LABEL SP VALUE`).
pub fn group_checksum(body: &str) -> char {
    let sum: u32 = body.bytes().map(u32::from).sum();
    char::from(((sum & 0x3F) + 0x20) as u8)
}

/// Label/value pairs of one frame, in wire order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Groups {
    entries: Vec<(String, String)>,
}

impl Groups {
    /// Create an empty group list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a group. Labels must be unique within a frame.
    pub fn push(&mut self, label: impl Into<String>, value: impl Into<String>) -> Result<()> {
        let label = label.into();
        if self.contains(&label) {
            return Err(TeleinfoError::DuplicateLabel(label));
        }
        self.entries.push((label, value.into()));
        Ok(())
    }

    /// Raw value of a label, if present.
    pub fn get(&self, label: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, label: &str) -> bool {
        self.entries.iter().any(|(l, _)| l == label)
    }

    /// Iterate over `(label, value)` pairs in wire order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(l, v)| (l.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render the groups as a complete STX..ETX frame with checksums.
    pub fn encode(&self) -> String {
        let mut out = String::new();
        out.push(STX);
        for (label, value) in &self.entries {
            let body = format!("{label} {value}");
            out.push(GROUP_START);
            out.push_str(&body);
            out.push(char::from(SEPARATOR));
            out.push(group_checksum(&body));
            out.push(GROUP_END);
        }
        out.push(ETX);
        out
    }
}

/// Split a raw frame into its information groups.
pub fn parse_groups(raw: &str, config: &ParseConfig) -> Result<Groups> {
    if raw.contains(EOT) {
        return Err(TeleinfoError::Framing("frame interrupted (EOT)"));
    }

    let body = frame_body(raw, config.require_delimiters)?;
    let mut groups = Groups::new();
    for line in body
        .split([GROUP_START, GROUP_END])
        .filter(|line| !line.is_empty())
    {
        let (label, value) = parse_group(line, config.verify_checksums)?;
        groups.push(label, value)?;
    }
    Ok(groups)
}

fn frame_body(raw: &str, require_delimiters: bool) -> Result<&str> {
    match raw.find(STX) {
        Some(start) => {
            let rest = &raw[start + STX.len_utf8()..];
            match rest.find(ETX) {
                Some(end) => Ok(&rest[..end]),
                None => Err(TeleinfoError::Framing("missing ETX")),
            }
        }
        None if require_delimiters => Err(TeleinfoError::Framing("missing STX")),
        None => match raw.find(ETX) {
            Some(end) => Ok(&raw[..end]),
            None => Ok(raw),
        },
    }
}

fn parse_group(line: &str, verify: bool) -> Result<(&str, &str)> {
    let malformed = |reason| TeleinfoError::Decode {
        line: line.to_string(),
        reason,
    };

    // Shortest group is "L  C": the value may be empty.
    let &[.., separator, checksum] = line.as_bytes() else {
        return Err(malformed("group too short"));
    };
    if !checksum.is_ascii() {
        return Err(malformed("non-ASCII checksum"));
    }
    if separator != SEPARATOR {
        return Err(malformed("missing checksum separator"));
    }

    let body = &line[..line.len() - 2];
    let Some((label, value)) = body.split_once(char::from(SEPARATOR)) else {
        return Err(malformed("missing value separator"));
    };
    if label.is_empty() {
        return Err(malformed("empty label"));
    }

    if verify {
        let expected = group_checksum(body);
        let actual = char::from(checksum);
        if expected != actual {
            return Err(TeleinfoError::Checksum {
                label: label.to_string(),
                expected,
                actual,
            });
        }
    }

    Ok((label, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_known_groups() {
        assert_eq!(group_checksum("ADCO 031762120856"), '@');
        assert_eq!(group_checksum("ISOUSC 30"), '9');
        assert_eq!(group_checksum("PTEC HP.."), ' ');
    }

    #[test]
    fn parses_delimited_frame() {
        let raw = "\u{02}\nADCO 031762120856 @\r\nISOUSC 30 9\r\u{03}";
        let groups = parse_groups(raw, &ParseConfig::default()).unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups.get("ADCO"), Some("031762120856"));
        assert_eq!(groups.get("ISOUSC"), Some("30"));
        assert!(groups.get("PAPP").is_none());
    }

    #[test]
    fn space_checksum_is_not_trimmed_away() {
        let raw = "\nPTEC HP..  \r";
        let groups = parse_groups(raw, &ParseConfig::default()).unwrap();
        assert_eq!(groups.get("PTEC"), Some("HP.."));
    }

    #[test]
    fn undelimited_frame_accepted_by_default() {
        let groups = parse_groups("ISOUSC 30 9", &ParseConfig::default()).unwrap();
        assert_eq!(groups.get("ISOUSC"), Some("30"));
    }

    #[test]
    fn missing_stx_rejected_when_required() {
        let cfg = ParseConfig {
            require_delimiters: true,
            ..ParseConfig::default()
        };
        let err = parse_groups("\nISOUSC 30 9\r", &cfg).unwrap_err();
        assert!(matches!(err, TeleinfoError::Framing("missing STX")));
    }

    #[test]
    fn missing_etx_rejected() {
        let err = parse_groups("\u{02}\nISOUSC 30 9\r", &ParseConfig::default()).unwrap_err();
        assert!(matches!(err, TeleinfoError::Framing("missing ETX")));
    }

    #[test]
    fn eot_interrupts_frame() {
        let err = parse_groups("\u{02}\nISOUSC 30 9\r\u{04}", &ParseConfig::default())
            .unwrap_err();
        assert!(matches!(err, TeleinfoError::Framing(_)));
    }

    #[test]
    fn bad_checksum_rejected() {
        let err = parse_groups("\nISOUSC 30 8\r", &ParseConfig::default()).unwrap_err();
        match err {
            TeleinfoError::Checksum {
                label,
                expected,
                actual,
            } => {
                assert_eq!(label, "ISOUSC");
                assert_eq!(expected, '9');
                assert_eq!(actual, '8');
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn bad_checksum_ignored_when_not_verifying() {
        let cfg = ParseConfig {
            verify_checksums: false,
            ..ParseConfig::default()
        };
        let groups = parse_groups("\nISOUSC 30 8\r", &cfg).unwrap();
        assert_eq!(groups.get("ISOUSC"), Some("30"));
    }

    #[test]
    fn malformed_groups_rejected() {
        for line in [
            "\nA\r",
            "\nAB\r",
            "\nA C\r",
            "\nISOUSC30 9\r",
            "\nISOUSC 30-9\r",
            "\n 30 9\r",
            "\n  A\r",
        ] {
            let err = parse_groups(line, &ParseConfig::default()).unwrap_err();
            assert!(
                matches!(err, TeleinfoError::Decode { .. }),
                "{line:?} gave {err}"
            );
        }
    }

    #[test]
    fn empty_value_with_short_label_accepted() {
        let groups = parse_groups("\nA  A\r", &ParseConfig::default()).unwrap();
        assert_eq!(groups.get("A"), Some(""));
    }

    #[test]
    fn encoded_empty_values_parse_back() {
        let mut groups = Groups::new();
        groups.push("A", "").unwrap();
        groups.push("MOTDETAT", "").unwrap();
        groups.push("B", "1").unwrap();

        let text = groups.encode();
        assert!(text.contains("\nA  A\r"));

        let parsed = parse_groups(&text, &ParseConfig::default()).unwrap();
        assert_eq!(parsed, groups);
    }

    #[test]
    fn duplicate_label_rejected() {
        let err = parse_groups("\nISOUSC 30 9\r\nISOUSC 30 9\r", &ParseConfig::default())
            .unwrap_err();
        assert!(matches!(err, TeleinfoError::DuplicateLabel(ref l) if l == "ISOUSC"));
    }

    #[test]
    fn encode_then_parse_preserves_order() {
        let mut groups = Groups::new();
        groups.push("ADCO", "031762120856").unwrap();
        groups.push("PTEC", "HP..").unwrap();
        groups.push("PAPP", "00750").unwrap();

        let text = groups.encode();
        assert!(text.starts_with(STX));
        assert!(text.ends_with(ETX));
        assert!(text.contains("\nPAPP 00750 -\r"));

        let parsed = parse_groups(&text, &ParseConfig::default()).unwrap();
        assert_eq!(parsed, groups);
    }
}
