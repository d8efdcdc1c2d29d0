//! Content-derived record identity
//!
//! Provides [`RecordId`], a strongly-typed 16-hex-character fingerprint, and
//! [`fingerprint`], the pure function that derives it from a record's
//! rendered fields.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use sha1::{Digest, Sha1};

use crate::error::RecordError;

/// Number of hex characters kept from the digest.
pub const ID_LEN: usize = 16;

/// Separator placed between rendered fields before hashing.
pub const FIELD_DELIMITER: char = '|';

/// Token used for any field that is missing or not a number.
pub const MISSING_TOKEN: &str = "nan";

/// A 16-character lowercase hex fingerprint (truncated SHA-1)
///
/// Two records with the same formatted date and the same three numbers
/// (to six decimals) share an id. The id is a primary key within one
/// collection, not a stable handle across edits.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecordId(String);

impl RecordId {
    /// Borrow the hex string
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Build from the first [`ID_LEN`] hex chars of a full digest
    fn from_digest(digest: &[u8]) -> Self {
        let mut hex = hex::encode(digest);
        hex.truncate(ID_LEN);
        Self(hex)
    }
}

impl Display for RecordId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RecordId {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.len() != ID_LEN {
            return Err(RecordError::InvalidIdLength {
                expected: ID_LEN,
                actual: s.len(),
            });
        }
        // Reuse the hex decoder for alphabet validation
        hex::decode(s)?;
        Ok(Self(s.to_ascii_lowercase()))
    }
}

impl TryFrom<String> for RecordId {
    type Error = RecordError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RecordId> for String {
    fn from(id: RecordId) -> Self {
        id.0
    }
}

impl AsRef<str> for RecordId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Render a number the way it enters the fingerprint
///
/// Fixed six decimals; missing and `NaN` become [`MISSING_TOKEN`].
#[must_use]
pub fn render_number(value: Option<f64>) -> String {
    match value {
        None => MISSING_TOKEN.to_string(),
        Some(v) if v.is_nan() => MISSING_TOKEN.to_string(),
        Some(v) if v.is_infinite() => {
            if v > 0.0 {
                "inf".to_string()
            } else {
                "-inf".to_string()
            }
        }
        Some(v) => format!("{v:.6}"),
    }
}

/// Derive the id of a record
///
/// `date_str` must already be in `dd/mm/YYYY` form; it is hashed verbatim.
/// Total and deterministic: never fails.
#[must_use]
pub fn fingerprint(
    date_str: &str,
    level: Option<f64>,
    rainfall: Option<f64>,
    extraction: Option<f64>,
) -> RecordId {
    let base = fingerprint_base(date_str, level, rainfall, extraction);
    RecordId::from_digest(&Sha1::digest(base.as_bytes()))
}

/// The delimited string that [`fingerprint`] hashes
#[must_use]
pub fn fingerprint_base(
    date_str: &str,
    level: Option<f64>,
    rainfall: Option<f64>,
    extraction: Option<f64>,
) -> String {
    let d = FIELD_DELIMITER;
    format!(
        "{date_str}{d}{}{d}{}{d}{}",
        render_number(level),
        render_number(rainfall),
        render_number(extraction)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_matches_known_digest() {
        let id = fingerprint("03/04/2024", Some(5.03), Some(12.0), Some(300.0));
        assert_eq!(id.as_str(), "5fee6c2346a79467");
    }

    #[test]
    fn fingerprint_base_uses_six_decimals() {
        let base = fingerprint_base("03/04/2024", Some(5.03), Some(12.0), Some(300.0));
        assert_eq!(base, "03/04/2024|5.030000|12.000000|300.000000");
    }

    #[test]
    fn missing_fields_render_as_nan() {
        let base = fingerprint_base("nan", None, Some(f64::NAN), None);
        assert_eq!(base, "nan|nan|nan|nan");
        assert_eq!(fingerprint("nan", None, None, None).as_str(), "c05e5d16010642a7");
    }

    #[test]
    fn infinities_render_signed() {
        assert_eq!(render_number(Some(f64::INFINITY)), "inf");
        assert_eq!(render_number(Some(f64::NEG_INFINITY)), "-inf");
    }

    #[test]
    fn differences_below_precision_collapse() {
        let a = fingerprint("01/01/2024", Some(1.0), Some(0.0), Some(0.0));
        let b = fingerprint("01/01/2024", Some(1.000_000_1), Some(0.0), Some(0.0));
        assert_eq!(a, b);
    }

    #[test]
    fn record_id_parse_validates() {
        assert!("5fee6c2346a79467".parse::<RecordId>().is_ok());
        assert!(matches!(
            "abc".parse::<RecordId>(),
            Err(RecordError::InvalidIdLength { expected: 16, actual: 3 })
        ));
        assert!("zzzzzzzzzzzzzzzz".parse::<RecordId>().is_err());
    }

    #[test]
    fn record_id_parse_lowercases() {
        let id: RecordId = "5FEE6C2346A79467".parse().unwrap();
        assert_eq!(id.as_str(), "5fee6c2346a79467");
    }
}
