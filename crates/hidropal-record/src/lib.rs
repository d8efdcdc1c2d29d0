//! HidroPal Records
//!
//! Typed well measurements with content-derived identity.
//!
//! # Core Concepts
//!
//! - [`Measurement`]: one observation (date, level, rainfall, extraction)
//! - [`RecordId`]: 16-hex-char fingerprint of a record's rendered fields
//! - [`fingerprint`]: the pure identity function
//! - [`normalize`] / [`ensure_ids`]: tolerant canonicalisation and
//!   keep-first deduplication
//! - [`decode_measurements`] / [`encode_table`]: the persisted flat-file layout
//!
//! # Example
//!
//! ```rust
//! use hidropal_record::{fingerprint, parse_date, format_date};
//!
//! let day = parse_date("03/04/2024").unwrap();
//! let id = fingerprint(&format_date(day), Some(5.03), Some(12.0), Some(300.0));
//! assert_eq!(id.as_str(), "5fee6c2346a79467");
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
mod date;
mod error;
mod id;
mod measurement;
mod normalize;
mod table;

// Re-exports
pub use date::{format_date, format_date_str, parse_date, DATE_OUT_FMT};
pub use error::RecordError;
pub use id::{
    fingerprint, fingerprint_base, render_number, RecordId, FIELD_DELIMITER, ID_LEN, MISSING_TOKEN,
};
pub use measurement::{compare_by_date, sort_by_date, Measurement};
pub use normalize::{coerce_number, ensure_ids, normalize, Column, RawRow};
pub use table::{decode_measurements, decode_table, encode_table};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod integration_tests {
    use super::*;

    #[test]
    fn persisted_table_reloads_to_same_rows() {
        let input = "Fecha,Nivel,Lluvia,Extraccion\n\
                     03/04/2024,5.03,12,300\n\
                     2024-04-04,4.9,,\n\
                     sometime,abc,1,2\n";
        let first = decode_measurements(input.as_bytes()).unwrap();
        let bytes = encode_table(&first).unwrap();
        let second = decode_measurements(&bytes).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn id_round_trips_through_text() {
        let m = Measurement::new(parse_date("03/04/2024"), Some(5.03), Some(12.0), Some(300.0));
        let parsed: RecordId = m.id.to_string().parse().unwrap();
        assert_eq!(parsed, m.id);
    }
}
