//! Transaction documents and their JSON serialization.

use crate::error::{Result, SignetError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Stream payloads keyed by stream ID. Payloads are opaque to the signer.
pub type StreamMap = Map<String, Value>;

/// Raw signature bytes keyed by stream ID.
pub type SignatureMap = BTreeMap<String, Vec<u8>>;

/// A ledger transaction document.
///
/// Only [`Transaction::body`] is signed. Fields this crate does not know
/// about are kept in `extra` and written back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Free-form territoriality tag.
    #[serde(
        rename = "$territoriality",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub territoriality: Option<String>,

    /// The signed transaction body.
    #[serde(rename = "$tx")]
    pub body: TxBody,

    #[serde(rename = "$selfsign", default, skip_serializing_if = "Option::is_none")]
    pub self_sign: Option<bool>,

    /// Signatures over the body, keyed by input stream ID.
    #[serde(rename = "$sigs", default, with = "signature_encoding")]
    pub signatures: SignatureMap,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The body of a transaction, i.e. the part covered by signatures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TxBody {
    #[serde(rename = "$namespace")]
    pub namespace: String,

    #[serde(rename = "$contract")]
    pub contract: String,

    #[serde(rename = "$entry", default, skip_serializing_if = "Option::is_none")]
    pub entry: Option<String>,

    /// Input streams. Signatures are keyed by these stream IDs.
    #[serde(rename = "$i")]
    pub inputs: StreamMap,

    /// Output streams.
    #[serde(rename = "$o", default, skip_serializing_if = "Option::is_none")]
    pub outputs: Option<StreamMap>,

    /// Read-only references.
    #[serde(rename = "$r", default, skip_serializing_if = "Option::is_none")]
    pub read_only: Option<StreamMap>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Transaction {
    /// Parse a transaction from JSON bytes.
    ///
    /// A missing or `null` `$sigs` yields an empty signature map.
    pub fn parse(json: &[u8]) -> Result<Self> {
        let tx: Self = serde_json::from_slice(json).map_err(SignetError::from_tx_json)?;
        tx.validate()?;
        Ok(tx)
    }

    /// Load a transaction from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read(path)?;
        Self::parse(&content)
    }

    fn validate(&self) -> Result<()> {
        if self.body.inputs.is_empty() {
            return Err(SignetError::TxSchema(
                "`$tx.$i` must contain at least one input stream".to_string(),
            ));
        }
        Ok(())
    }

    /// Compact JSON of the body, the exact bytes that get digested and signed.
    ///
    /// The bytes match what the ledger's Go tooling produces for the same
    /// body: HTML-sensitive characters and line separators are `\u`-escaped,
    /// every number is written as a float64, and an empty `$entry`, `$o` or
    /// `$r` is left out.
    pub fn body_bytes(&self) -> Result<Vec<u8>> {
        let mut body = self.body.clone();
        if body.entry.as_deref() == Some("") {
            body.entry = None;
        }
        if body.outputs.as_ref().is_some_and(Map::is_empty) {
            body.outputs = None;
        }
        if body.read_only.as_ref().is_some_and(Map::is_empty) {
            body.read_only = None;
        }

        let mut out = Vec::new();
        let mut serializer =
            serde_json::Serializer::with_formatter(&mut out, signing_format::GoCompatFormatter);
        body.serialize(&mut serializer)
            .map_err(SignetError::Serialize)?;
        Ok(out)
    }

    /// Serialize the whole document to compact JSON.
    pub fn to_compact(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(SignetError::Serialize)
    }

    /// Serialize the whole document to JSON indented by two spaces.
    pub fn to_indented(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(SignetError::Serialize)
    }

    /// Save the document as indented JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.to_indented()?)?;
        Ok(())
    }

    /// Input stream IDs in lexicographic order.
    pub fn input_stream_ids(&self) -> Vec<String> {
        sorted_keys(&self.body.inputs)
    }

    /// Output stream IDs in lexicographic order.
    pub fn output_stream_ids(&self) -> Vec<String> {
        self.body.outputs.as_ref().map(sorted_keys).unwrap_or_default()
    }
}

fn sorted_keys(streams: &StreamMap) -> Vec<String> {
    let mut ids: Vec<String> = streams.keys().cloned().collect();
    ids.sort();
    ids
}

/// JSON output byte-compatible with Go's `encoding/json` marshaller.
mod signing_format {
    use serde_json::ser::Formatter;
    use std::io::{self, Write};

    pub struct GoCompatFormatter;

    impl Formatter for GoCompatFormatter {
        fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
        where
            W: ?Sized + Write,
        {
            let bytes = fragment.as_bytes();
            let mut start = 0;
            for (index, c) in fragment.char_indices() {
                let escaped = match c {
                    '<' => "\\u003c",
                    '>' => "\\u003e",
                    '&' => "\\u0026",
                    '\u{2028}' => "\\u2028",
                    '\u{2029}' => "\\u2029",
                    _ => continue,
                };
                writer.write_all(&bytes[start..index])?;
                writer.write_all(escaped.as_bytes())?;
                start = index + c.len_utf8();
            }
            writer.write_all(&bytes[start..])
        }

        fn write_i64<W>(&mut self, writer: &mut W, value: i64) -> io::Result<()>
        where
            W: ?Sized + Write,
        {
            self.write_f64(writer, value as f64)
        }

        fn write_u64<W>(&mut self, writer: &mut W, value: u64) -> io::Result<()>
        where
            W: ?Sized + Write,
        {
            self.write_f64(writer, value as f64)
        }

        fn write_f64<W>(&mut self, writer: &mut W, value: f64) -> io::Result<()>
        where
            W: ?Sized + Write,
        {
            writer.write_all(format_float(value).as_bytes())
        }
    }

    /// Shortest round-trip digits, in exponent form outside `[1e-6, 1e21)`
    /// with an explicitly signed exponent.
    pub fn format_float(value: f64) -> String {
        let abs = value.abs();
        if abs == 0.0 || (1e-6..1e21).contains(&abs) {
            return format!("{}", value);
        }

        let formatted = format!("{:e}", value);
        match formatted.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => {
                format!("{}e+{}", mantissa, exponent)
            }
            _ => formatted,
        }
    }
}

/// `$sigs` holds raw bytes in memory and base64 strings on the wire.
mod signature_encoding {
    use super::SignatureMap;
    use base64::Engine;
    use serde::de::Error;
    use serde::ser::SerializeMap;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::collections::BTreeMap;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Encoded {
        Base64(String),
        Bytes(Vec<u8>),
    }

    pub fn serialize<S: Serializer>(sigs: &SignatureMap, serializer: S) -> Result<S::Ok, S::Error> {
        let engine = base64::engine::general_purpose::STANDARD;

        let mut map = serializer.serialize_map(Some(sigs.len()))?;
        for (stream_id, signature) in sigs {
            map.serialize_entry(stream_id, &engine.encode(signature))?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SignatureMap, D::Error> {
        let engine = base64::engine::general_purpose::STANDARD;

        let raw: Option<BTreeMap<String, Encoded>> = Option::deserialize(deserializer)?;
        raw.unwrap_or_default()
            .into_iter()
            .map(|(stream_id, encoded)| {
                let signature = match encoded {
                    Encoded::Base64(s) => engine.decode(s).map_err(|e| {
                        D::Error::custom(format!("signature for stream {}: {}", stream_id, e))
                    })?,
                    Encoded::Bytes(bytes) => bytes,
                };
                Ok((stream_id, signature))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const HAPPY_PATH: &str = r#"{"$tx":{"$namespace":"ns","$contract":"c","$i":{"stream_A":{"amount":10}},"$o":{"stream_B":{}}},"$sigs":{}}"#;

    #[test]
    fn test_parse_known_fields() {
        let tx = Transaction::parse(HAPPY_PATH.as_bytes()).unwrap();

        assert_eq!(tx.body.namespace, "ns");
        assert_eq!(tx.body.contract, "c");
        assert_eq!(tx.body.entry, None);
        assert_eq!(tx.body.inputs.get("stream_A"), Some(&json!({"amount": 10})));
        assert_eq!(tx.output_stream_ids(), vec!["stream_B".to_string()]);
        assert!(tx.signatures.is_empty());
        assert!(tx.extra.is_empty());
    }

    #[test]
    fn test_compact_roundtrip_preserves_unknown_fields() {
        let raw = r#"{"$territoriality":"eu","$tx":{"$namespace":"ns","$contract":"c","$entry":"main","$i":{"a":[1,2]},"$r":{"ref":null},"custom":42},"$selfsign":true,"$sigs":{"a":"AQID"},"note":"keep me"}"#;
        let tx = Transaction::parse(raw.as_bytes()).unwrap();

        assert_eq!(tx.body.extra.get("custom"), Some(&json!(42)));
        assert_eq!(tx.extra.get("note"), Some(&json!("keep me")));
        assert_eq!(tx.signatures.get("a"), Some(&vec![1u8, 2, 3]));

        let restored = Transaction::parse(&tx.to_compact().unwrap()).unwrap();
        assert_eq!(restored, tx);
        assert_eq!(tx.to_compact().unwrap(), raw.as_bytes());
    }

    #[test]
    fn test_missing_or_null_sigs_is_empty() {
        let missing = r#"{"$tx":{"$namespace":"ns","$contract":"c","$i":{"a":{}}}}"#;
        let null = r#"{"$tx":{"$namespace":"ns","$contract":"c","$i":{"a":{}}},"$sigs":null}"#;

        assert!(Transaction::parse(missing.as_bytes()).unwrap().signatures.is_empty());
        assert!(Transaction::parse(null.as_bytes()).unwrap().signatures.is_empty());
    }

    #[test]
    fn test_signatures_accept_byte_arrays() {
        let raw = r#"{"$tx":{"$namespace":"ns","$contract":"c","$i":{"a":{}}},"$sigs":{"a":[1,2,3]}}"#;
        let tx = Transaction::parse(raw.as_bytes()).unwrap();

        assert_eq!(tx.signatures.get("a"), Some(&vec![1u8, 2, 3]));

        let out: Value = serde_json::from_slice(&tx.to_compact().unwrap()).unwrap();
        assert_eq!(out["$sigs"]["a"], json!("AQID"));
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        assert!(matches!(
            Transaction::parse(b"{\"$tx\": {"),
            Err(SignetError::TxParse(_))
        ));
        assert!(matches!(
            Transaction::parse(b"not json"),
            Err(SignetError::TxParse(_))
        ));
    }

    #[test]
    fn test_missing_required_fields_are_schema_errors() {
        let cases = [
            r#"{"$sigs":{}}"#,
            r#"{"$tx":{"$contract":"c","$i":{"a":{}}}}"#,
            r#"{"$tx":{"$namespace":"ns","$i":{"a":{}}}}"#,
            r#"{"$tx":{"$namespace":"ns","$contract":"c"}}"#,
            r#"{"$tx":{"$namespace":"ns","$contract":"c","$i":{}}}"#,
        ];

        for case in cases {
            assert!(
                matches!(Transaction::parse(case.as_bytes()), Err(SignetError::TxSchema(_))),
                "expected schema error for {}",
                case
            );
        }
    }

    #[test]
    fn test_invalid_base64_signature_is_schema_error() {
        let raw = r#"{"$tx":{"$namespace":"ns","$contract":"c","$i":{"a":{}}},"$sigs":{"a":"***"}}"#;

        assert!(matches!(
            Transaction::parse(raw.as_bytes()),
            Err(SignetError::TxSchema(_))
        ));
    }

    #[test]
    fn test_body_bytes_cover_only_the_body() {
        let tx = Transaction::parse(HAPPY_PATH.as_bytes()).unwrap();

        assert_eq!(
            tx.body_bytes().unwrap(),
            br#"{"$namespace":"ns","$contract":"c","$i":{"stream_A":{"amount":10}},"$o":{"stream_B":{}}}"#
        );
    }

    #[test]
    fn test_body_bytes_escape_like_go() {
        let raw = r#"{"$tx":{"$namespace":"a<b&c>d","$contract":"c","$i":{"s":{"sep":"x\u2028y\u2029z","v":1.0,"n":10,"int":9007199254740993,"tiny":1e-7,"huge":1e22,"neg":-2.5}}}}"#;
        let tx = Transaction::parse(raw.as_bytes()).unwrap();

        assert_eq!(
            String::from_utf8(tx.body_bytes().unwrap()).unwrap(),
            r#"{"$namespace":"a\u003cb\u0026c\u003ed","$contract":"c","$i":{"s":{"huge":1e+22,"int":9007199254740992,"n":10,"neg":-2.5,"sep":"x\u2028y\u2029z","tiny":1e-7,"v":1}}}"#
        );
    }

    #[test]
    fn test_body_bytes_omit_empty_optionals() {
        let raw = r#"{"$tx":{"$namespace":"ns","$contract":"c","$entry":"","$i":{"a":{}},"$o":{},"$r":{}}}"#;
        let tx = Transaction::parse(raw.as_bytes()).unwrap();

        assert_eq!(
            tx.body_bytes().unwrap(),
            br#"{"$namespace":"ns","$contract":"c","$i":{"a":{}}}"#
        );
        assert_eq!(tx.body.entry.as_deref(), Some(""));
        assert!(tx.to_compact().unwrap().ends_with(br#""$o":{},"$r":{}},"$sigs":{}}"#));
    }

    #[test]
    fn test_float_formatting() {
        use signing_format::format_float;

        assert_eq!(format_float(0.0), "0");
        assert_eq!(format_float(1.0), "1");
        assert_eq!(format_float(0.1), "0.1");
        assert_eq!(format_float(0.000001), "0.000001");
        assert_eq!(format_float(1e20), "100000000000000000000");
        assert_eq!(format_float(1e21), "1e+21");
        assert_eq!(format_float(-1.5e-9), "-1.5e-9");
    }

    #[test]
    fn test_indented_field_order() {
        let raw = r#"{"$sigs":{},"$selfsign":false,"$tx":{"$i":{"a":{}},"$contract":"c","$namespace":"ns"},"$territoriality":"eu"}"#;
        let indented = Transaction::parse(raw.as_bytes()).unwrap().to_indented().unwrap();

        let positions: Vec<usize> = ["$territoriality", "$tx", "$selfsign", "$sigs"]
            .iter()
            .map(|field| indented.find(&format!("\"{}\"", field)).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(indented.contains("\n  \"$tx\": {\n    \"$namespace\": \"ns\""));
    }

    #[test]
    fn test_input_stream_ids_are_sorted() {
        let raw = r#"{"$tx":{"$namespace":"ns","$contract":"c","$i":{"stream_B":{},"stream_A":{}}}}"#;
        let tx = Transaction::parse(raw.as_bytes()).unwrap();

        assert_eq!(tx.input_stream_ids(), vec!["stream_A", "stream_B"]);
        assert!(tx.output_stream_ids().is_empty());
    }
}
