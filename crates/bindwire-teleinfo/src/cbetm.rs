//! CBETM three-phase meter frames.
//!
//! The meter sends a long frame in normal operation and a short frame
//! when a phase exceeds its subscribed current. Only the long frame
//! carries `ISOUSC`, which is what selects the variant.

use serde::Serialize;

use crate::config::ParseConfig;
use crate::error::{Result, TeleinfoError};
use crate::grammar::{FieldKind, FieldSpec, Grammar, Record, Value};
use crate::groups::{parse_groups, Groups};

pub const ADCO: &str = "ADCO";
pub const OPTARIF: &str = "OPTARIF";
pub const ISOUSC: &str = "ISOUSC";
pub const BASE: &str = "BASE";
pub const HCHC: &str = "HCHC";
pub const HCHP: &str = "HCHP";
pub const PTEC: &str = "PTEC";
pub const IINST1: &str = "IINST1";
pub const IINST2: &str = "IINST2";
pub const IINST3: &str = "IINST3";
pub const IMAX1: &str = "IMAX1";
pub const IMAX2: &str = "IMAX2";
pub const IMAX3: &str = "IMAX3";
pub const PMAX: &str = "PMAX";
pub const PAPP: &str = "PAPP";
pub const HHPHC: &str = "HHPHC";
pub const MOTDETAT: &str = "MOTDETAT";
pub const PPOT: &str = "PPOT";
pub const ADIR1: &str = "ADIR1";
pub const ADIR2: &str = "ADIR2";
pub const ADIR3: &str = "ADIR3";

const PTEC_TOKENS: &[&str] = &["TH..", "HC..", "HP..", "HN..", "PM.."];

/// Long frame, in wire order.
pub static LONG_GRAMMAR: Grammar = Grammar {
    name: "CBETM long",
    fields: &[
        FieldSpec::required(ADCO, FieldKind::Text, 0),
        FieldSpec::optional(OPTARIF, FieldKind::Text, 0),
        FieldSpec::required(ISOUSC, FieldKind::Integer, 2),
        FieldSpec::optional(BASE, FieldKind::Integer, 9),
        FieldSpec::optional(HCHC, FieldKind::Integer, 9),
        FieldSpec::optional(HCHP, FieldKind::Integer, 9),
        FieldSpec::required(PTEC, FieldKind::Enumerated(PTEC_TOKENS), 0),
        FieldSpec::required(IINST1, FieldKind::Integer, 3),
        FieldSpec::required(IINST2, FieldKind::Integer, 3),
        FieldSpec::required(IINST3, FieldKind::Integer, 3),
        FieldSpec::optional(IMAX1, FieldKind::Integer, 3),
        FieldSpec::optional(IMAX2, FieldKind::Integer, 3),
        FieldSpec::optional(IMAX3, FieldKind::Integer, 3),
        FieldSpec::required(PMAX, FieldKind::Integer, 5),
        FieldSpec::required(PAPP, FieldKind::Integer, 5),
        FieldSpec::optional(HHPHC, FieldKind::Text, 0),
        FieldSpec::optional(MOTDETAT, FieldKind::Text, 0),
        FieldSpec::required(PPOT, FieldKind::Text, 0),
    ],
};

/// Short (overcurrent) frame, in wire order.
pub static SHORT_GRAMMAR: Grammar = Grammar {
    name: "CBETM short",
    fields: &[
        FieldSpec::optional(ADIR1, FieldKind::Integer, 3),
        FieldSpec::optional(ADIR2, FieldKind::Integer, 3),
        FieldSpec::optional(ADIR3, FieldKind::Integer, 3),
        FieldSpec::required(ADCO, FieldKind::Text, 0),
        FieldSpec::required(IINST1, FieldKind::Integer, 3),
        FieldSpec::required(IINST2, FieldKind::Integer, 3),
        FieldSpec::required(IINST3, FieldKind::Integer, 3),
    ],
};

/// Every label either variant can carry. [`CbetmFrame::fields`] reports all of them.
pub const ALL_LABELS: &[&str] = &[
    ADCO, IINST1, IINST2, IINST3, OPTARIF, ISOUSC, BASE, HCHC, HCHP, PTEC, IMAX1, IMAX2, IMAX3,
    PMAX, PAPP, HHPHC, MOTDETAT, PPOT, ADIR1, ADIR2, ADIR3,
];

/// Current tariff period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Ptec {
    /// All hours (base option).
    Th,
    /// Off-peak.
    Hc,
    /// Peak.
    Hp,
    /// Normal hours (EJP option).
    Hn,
    /// Mobile peak hours (EJP option).
    Pm,
}

impl Ptec {
    pub fn token(self) -> &'static str {
        match self {
            Ptec::Th => "TH..",
            Ptec::Hc => "HC..",
            Ptec::Hp => "HP..",
            Ptec::Hn => "HN..",
            Ptec::Pm => "PM..",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "TH.." => Some(Ptec::Th),
            "HC.." => Some(Ptec::Hc),
            "HP.." => Some(Ptec::Hp),
            "HN.." => Some(Ptec::Hn),
            "PM.." => Some(Ptec::Pm),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Ptec::Th => "TH",
            Ptec::Hc => "HC",
            Ptec::Hp => "HP",
            Ptec::Hn => "HN",
            Ptec::Pm => "PM",
        }
    }
}

/// Long frame fields. Currents in A, powers in W (PMAX) / VA (PAPP), indexes in Wh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CbetmLong {
    pub adco: String,
    pub optarif: Option<String>,
    pub isousc: u32,
    pub base: Option<u32>,
    pub hchc: Option<u32>,
    pub hchp: Option<u32>,
    pub ptec: Ptec,
    pub iinst1: u32,
    pub iinst2: u32,
    pub iinst3: u32,
    pub imax1: Option<u32>,
    pub imax2: Option<u32>,
    pub imax3: Option<u32>,
    pub pmax: u32,
    pub papp: u32,
    pub hhphc: Option<String>,
    pub motdetat: Option<String>,
    pub ppot: String,
}

/// Short frame fields. `adirN` is the overcurrent warning for phase N.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CbetmShort {
    pub adir1: Option<u32>,
    pub adir2: Option<u32>,
    pub adir3: Option<u32>,
    pub adco: String,
    pub iinst1: u32,
    pub iinst2: u32,
    pub iinst3: u32,
}

/// A decoded CBETM frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "frame_type", rename_all = "UPPERCASE")]
pub enum CbetmFrame {
    Long(CbetmLong),
    Short(CbetmShort),
}

/// Parse a CBETM frame with the default [`ParseConfig`].
pub fn parse_frame(raw: &str) -> Result<CbetmFrame> {
    parse_frame_with_config(raw, &ParseConfig::default())
}

/// Parse a CBETM frame.
pub fn parse_frame_with_config(raw: &str, config: &ParseConfig) -> Result<CbetmFrame> {
    let groups = parse_groups(raw, config)?;
    CbetmFrame::from_groups(&groups)
}

impl CbetmFrame {
    /// Pick the grammar matching the labels present in `groups`.
    pub fn grammar_for(groups: &Groups) -> &'static Grammar {
        if groups.contains(ISOUSC) {
            &LONG_GRAMMAR
        } else {
            &SHORT_GRAMMAR
        }
    }

    pub fn from_groups(groups: &Groups) -> Result<Self> {
        let grammar = Self::grammar_for(groups);
        let record = grammar.apply(groups)?;
        let fields = RecordReader { record: &record };

        if std::ptr::eq(grammar, &LONG_GRAMMAR) {
            Ok(CbetmFrame::Long(CbetmLong {
                adco: fields.text(ADCO)?,
                optarif: fields.optional_text(OPTARIF)?,
                isousc: fields.integer(ISOUSC)?,
                base: fields.optional_integer(BASE)?,
                hchc: fields.optional_integer(HCHC)?,
                hchp: fields.optional_integer(HCHP)?,
                ptec: fields.ptec(PTEC)?,
                iinst1: fields.integer(IINST1)?,
                iinst2: fields.integer(IINST2)?,
                iinst3: fields.integer(IINST3)?,
                imax1: fields.optional_integer(IMAX1)?,
                imax2: fields.optional_integer(IMAX2)?,
                imax3: fields.optional_integer(IMAX3)?,
                pmax: fields.integer(PMAX)?,
                papp: fields.integer(PAPP)?,
                hhphc: fields.optional_text(HHPHC)?,
                motdetat: fields.optional_text(MOTDETAT)?,
                ppot: fields.text(PPOT)?,
            }))
        } else {
            Ok(CbetmFrame::Short(CbetmShort {
                adir1: fields.optional_integer(ADIR1)?,
                adir2: fields.optional_integer(ADIR2)?,
                adir3: fields.optional_integer(ADIR3)?,
                adco: fields.text(ADCO)?,
                iinst1: fields.integer(IINST1)?,
                iinst2: fields.integer(IINST2)?,
                iinst3: fields.integer(IINST3)?,
            }))
        }
    }

    /// `"LONG"` or `"SHORT"`.
    pub fn frame_type(&self) -> &'static str {
        match self {
            CbetmFrame::Long(_) => "LONG",
            CbetmFrame::Short(_) => "SHORT",
        }
    }

    pub fn grammar(&self) -> &'static Grammar {
        match self {
            CbetmFrame::Long(_) => &LONG_GRAMMAR,
            CbetmFrame::Short(_) => &SHORT_GRAMMAR,
        }
    }

    pub fn adco(&self) -> &str {
        match self {
            CbetmFrame::Long(long) => &long.adco,
            CbetmFrame::Short(short) => &short.adco,
        }
    }

    /// Instantaneous current per phase.
    pub fn iinst(&self) -> [u32; 3] {
        match self {
            CbetmFrame::Long(l) => [l.iinst1, l.iinst2, l.iinst3],
            CbetmFrame::Short(s) => [s.iinst1, s.iinst2, s.iinst3],
        }
    }

    /// The frame as a grammar record.
    pub fn to_record(&self) -> Record {
        match self {
            CbetmFrame::Long(l) => LONG_GRAMMAR.record(|key| match key {
                ADCO => Some(Value::Text(l.adco.clone())),
                OPTARIF => l.optarif.clone().map(Value::Text),
                ISOUSC => Some(integer(l.isousc)),
                BASE => l.base.map(integer),
                HCHC => l.hchc.map(integer),
                HCHP => l.hchp.map(integer),
                PTEC => Some(Value::Enum(l.ptec.token())),
                IINST1 => Some(integer(l.iinst1)),
                IINST2 => Some(integer(l.iinst2)),
                IINST3 => Some(integer(l.iinst3)),
                IMAX1 => l.imax1.map(integer),
                IMAX2 => l.imax2.map(integer),
                IMAX3 => l.imax3.map(integer),
                PMAX => Some(integer(l.pmax)),
                PAPP => Some(integer(l.papp)),
                HHPHC => l.hhphc.clone().map(Value::Text),
                MOTDETAT => l.motdetat.clone().map(Value::Text),
                PPOT => Some(Value::Text(l.ppot.clone())),
                _ => None,
            }),
            CbetmFrame::Short(s) => SHORT_GRAMMAR.record(|key| match key {
                ADIR1 => s.adir1.map(integer),
                ADIR2 => s.adir2.map(integer),
                ADIR3 => s.adir3.map(integer),
                ADCO => Some(Value::Text(s.adco.clone())),
                IINST1 => Some(integer(s.iinst1)),
                IINST2 => Some(integer(s.iinst2)),
                IINST3 => Some(integer(s.iinst3)),
                _ => None,
            }),
        }
    }

    /// Every label of both variants, in [`ALL_LABELS`] order.
    ///
    /// Labels belonging to the other variant are always `None`.
    pub fn fields(&self) -> Vec<(&'static str, Option<Value>)> {
        let record = self.to_record();
        ALL_LABELS
            .iter()
            .map(|&label| (label, record.value(label).cloned()))
            .collect()
    }

    /// Wire text of the frame, STX to ETX, with group checksums.
    pub fn encode(&self) -> String {
        self.to_record().to_groups().encode()
    }
}

fn integer(value: u32) -> Value {
    Value::Integer(i64::from(value))
}

struct RecordReader<'a> {
    record: &'a Record,
}

impl RecordReader<'_> {
    fn required(&self, key: &'static str) -> Result<&Value> {
        self.record
            .value(key)
            .ok_or(TeleinfoError::MissingField {
                key,
                grammar: self.record.grammar,
            })
    }

    fn mismatch(&self, key: &'static str, expected: &'static str) -> TeleinfoError {
        TeleinfoError::FieldType {
            key,
            expected,
            raw: self
                .record
                .get(key)
                .and_then(|field| field.raw.clone())
                .unwrap_or_default(),
        }
    }

    fn text(&self, key: &'static str) -> Result<String> {
        self.required(key)?
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| self.mismatch(key, "text"))
    }

    fn optional_text(&self, key: &'static str) -> Result<Option<String>> {
        match self.record.value(key) {
            Some(_) => self.text(key).map(Some),
            None => Ok(None),
        }
    }

    fn integer(&self, key: &'static str) -> Result<u32> {
        self.required(key)?
            .as_integer()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| self.mismatch(key, "32-bit unsigned integer"))
    }

    fn optional_integer(&self, key: &'static str) -> Result<Option<u32>> {
        match self.record.value(key) {
            Some(_) => self.integer(key).map(Some),
            None => Ok(None),
        }
    }

    fn ptec(&self, key: &'static str) -> Result<Ptec> {
        self.required(key)?
            .as_str()
            .and_then(Ptec::from_token)
            .ok_or_else(|| self.mismatch(key, "tariff period"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LONG_FRAME: &str = "\u{02}\
        \nADCO 031762120856 @\r\
        \nOPTARIF HC.. <\r\
        \nISOUSC 30 9\r\
        \nHCHC 001234567 \"\r\
        \nHCHP 007654321 /\r\
        \nPTEC HP..  \r\
        \nIINST1 001 I\r\
        \nIINST2 002 K\r\
        \nIINST3 003 M\r\
        \nIMAX1 060 6\r\
        \nIMAX2 060 7\r\
        \nPMAX 05000 +\r\
        \nPAPP 00750 -\r\
        \nHHPHC A ,\r\
        \nMOTDETAT 000000 B\r\
        \nPPOT 00 #\r\
        \u{03}";

    const SHORT_FRAME: &str = "\u{02}\
        \nADIR1 044 )\r\
        \nADCO 031762120856 @\r\
        \nIINST1 044 P\r\
        \nIINST2 002 K\r\
        \nIINST3 003 M\r\
        \u{03}";

    fn sample_long() -> CbetmLong {
        CbetmLong {
            adco: "031762120856".to_string(),
            optarif: Some("HC..".to_string()),
            isousc: 30,
            base: None,
            hchc: Some(1_234_567),
            hchp: Some(7_654_321),
            ptec: Ptec::Hp,
            iinst1: 1,
            iinst2: 2,
            iinst3: 3,
            imax1: Some(60),
            imax2: Some(60),
            imax3: None,
            pmax: 5000,
            papp: 750,
            hhphc: Some("A".to_string()),
            motdetat: Some("000000".to_string()),
            ppot: "00".to_string(),
        }
    }

    #[test]
    fn parses_long_frame() {
        let frame = parse_frame(LONG_FRAME).unwrap();
        assert_eq!(frame.frame_type(), "LONG");
        assert_eq!(frame, CbetmFrame::Long(sample_long()));
    }

    #[test]
    fn parses_short_frame() {
        let frame = parse_frame(SHORT_FRAME).unwrap();
        assert_eq!(frame.frame_type(), "SHORT");
        assert_eq!(
            frame,
            CbetmFrame::Short(CbetmShort {
                adir1: Some(44),
                adir2: None,
                adir3: None,
                adco: "031762120856".to_string(),
                iinst1: 44,
                iinst2: 2,
                iinst3: 3,
            })
        );
        assert_eq!(frame.iinst(), [44, 2, 3]);
    }

    #[test]
    fn absent_optional_current_is_not_zero() {
        let CbetmFrame::Long(long) = parse_frame(LONG_FRAME).unwrap() else {
            panic!("expected long frame");
        };
        assert_eq!(long.imax3, None);
        assert_eq!(long.base, None);
        assert_eq!(long.ppot, "00");
    }

    #[test]
    fn short_frame_never_reports_long_fields() {
        let frame = parse_frame(SHORT_FRAME).unwrap();
        let fields = frame.fields();
        assert_eq!(fields.len(), ALL_LABELS.len());
        for (label, value) in &fields {
            let in_short = SHORT_GRAMMAR.spec(label).is_some();
            if !in_short {
                assert!(value.is_none(), "{label} should be unset");
            }
        }
        assert_eq!(
            fields.iter().find(|(l, _)| *l == ADIR1).unwrap().1,
            Some(Value::Integer(44))
        );
        assert_eq!(fields.iter().find(|(l, _)| *l == ADIR2).unwrap().1, None);
    }

    #[test]
    fn long_frame_never_reports_short_fields() {
        let frame = parse_frame(LONG_FRAME).unwrap();
        for (label, value) in frame.fields() {
            if [ADIR1, ADIR2, ADIR3].contains(&label) {
                assert!(value.is_none());
            }
        }
    }

    #[test]
    fn long_variant_ignores_stray_short_labels() {
        let mut groups = Groups::new();
        for (label, value) in [
            (ADCO, "031762120856"),
            (ISOUSC, "30"),
            (PTEC, "TH.."),
            (IINST1, "001"),
            (IINST2, "002"),
            (IINST3, "003"),
            (PMAX, "05000"),
            (PAPP, "00750"),
            (PPOT, "00"),
            (ADIR1, "044"),
        ] {
            groups.push(label, value).unwrap();
        }

        let frame = CbetmFrame::from_groups(&groups).unwrap();
        assert_eq!(frame.frame_type(), "LONG");
        let adir1 = frame.fields().into_iter().find(|(l, _)| *l == ADIR1);
        assert_eq!(adir1, Some((ADIR1, None)));
    }

    #[test]
    fn roundtrip_long_and_short() {
        let long = CbetmFrame::Long(sample_long());
        assert_eq!(parse_frame(&long.encode()).unwrap(), long);

        let short = CbetmFrame::Short(CbetmShort {
            adir1: None,
            adir2: Some(0),
            adir3: Some(61),
            adco: "021861348497".to_string(),
            iinst1: 12,
            iinst2: 0,
            iinst3: 61,
        });
        assert_eq!(parse_frame(&short.encode()).unwrap(), short);
    }

    #[test]
    fn encode_reproduces_wire_frame() {
        let frame = parse_frame(LONG_FRAME).unwrap();
        assert_eq!(frame.encode(), LONG_FRAME);
        let frame = parse_frame(SHORT_FRAME).unwrap();
        assert_eq!(frame.encode(), SHORT_FRAME);
    }

    #[test]
    fn missing_required_long_field() {
        let raw = "\nADCO 031762120856 @\r\nISOUSC 30 9\r";
        let err = parse_frame(raw).unwrap_err();
        assert!(matches!(
            err,
            TeleinfoError::MissingField {
                key: PTEC,
                grammar: "CBETM long"
            }
        ));
    }

    #[test]
    fn bad_ptec_is_field_type_error() {
        let frame = CbetmFrame::Long(sample_long());
        let text = frame.encode().replace("PTEC HP..  ", "PTEC XX.. #");
        let cfg = ParseConfig {
            verify_checksums: false,
            ..ParseConfig::default()
        };
        let err = parse_frame_with_config(&text, &cfg).unwrap_err();
        match err {
            TeleinfoError::FieldType { key, raw, .. } => {
                assert_eq!(key, PTEC);
                assert_eq!(raw, "XX..");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn non_numeric_current_is_field_type_error() {
        let raw = "\nADCO 031762120856 @\r\nIINST1 0x1 #\r\nIINST2 002 K\r\nIINST3 003 M\r";
        let cfg = ParseConfig {
            verify_checksums: false,
            ..ParseConfig::default()
        };
        let err = parse_frame_with_config(raw, &cfg).unwrap_err();
        assert!(matches!(err, TeleinfoError::FieldType { key: IINST1, .. }));
    }

    #[test]
    fn serializes_with_frame_type_tag() {
        let frame = parse_frame(SHORT_FRAME).unwrap();
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["frame_type"], "SHORT");
        assert_eq!(json["adir1"], 44);
        assert!(json["adir2"].is_null());
    }

    #[test]
    fn ptec_tokens_roundtrip() {
        for ptec in [Ptec::Th, Ptec::Hc, Ptec::Hp, Ptec::Hn, Ptec::Pm] {
            assert_eq!(Ptec::from_token(ptec.token()), Some(ptec));
            assert!(PTEC_TOKENS.contains(&ptec.token()));
        }
        assert_eq!(Ptec::from_token("HP"), None);
    }
}
