/*!
MRT stream parsing: record framing, TABLE_DUMP_V2 decoding, and the
iterator glue that ties them together.
*/
pub mod bgp;
pub mod mrt;
pub mod utils;

pub use self::utils::ReadUtils;
pub use mrt::{chunk_mrt_record, parse_common_header, parse_mrt_body, parse_mrt_record};

use crate::error::ParserError;
use crate::io::{get_cached_reader, get_reader};
use crate::models::MrtRecord;
use log::{error, warn};
use std::io::Read;

/// Streaming MRT parser over any byte source.
///
/// Local paths and HTTP(S) URLs are both accepted, with transparent gzip
/// and bzip2 decompression based on the file extension.
///
/// ```no_run
/// use asndb::MrtParser;
///
/// let parser = MrtParser::new("rib.20240101.0000.gz").unwrap();
/// for record in parser.into_record_iter() {
///     println!("{:?}", record.common_header);
/// }
/// ```
pub struct MrtParser<R> {
    reader: R,
}

impl MrtParser<Box<dyn Read + Send>> {
    /// Open a local file or remote URL.
    pub fn new(path: &str) -> Result<Self, ParserError> {
        let reader = get_reader(path)?;
        Ok(MrtParser { reader })
    }

    /// Open a local file or remote URL, keeping downloaded archives in
    /// `cache_dir` so an interrupted run can resume without re-downloading.
    pub fn new_cached(path: &str, cache_dir: &str) -> Result<Self, ParserError> {
        let reader = get_cached_reader(path, cache_dir)?;
        Ok(MrtParser { reader })
    }
}

impl<R: Read> MrtParser<R> {
    /// Wrap an already opened byte stream.
    pub fn from_reader(reader: R) -> Self {
        MrtParser { reader }
    }

    /// Decode the next relevant record.
    ///
    /// Returns `Ok(None)` at a clean end of stream. Malformed records are
    /// skipped with a warning, and records of unhandled types are skipped
    /// silently; only framing errors are returned, and those end the
    /// stream.
    pub fn next_record(&mut self) -> Result<Option<MrtRecord>, ParserError> {
        loop {
            match parse_mrt_record(&mut self.reader) {
                Ok(Some(record)) => return Ok(Some(record)),
                Ok(None) => continue,
                Err(ParserError::EofExpected) => return Ok(None),
                Err(
                    e @ (ParserError::TruncatedRecord(_)
                    | ParserError::IoError(_)
                    | ParserError::OneIoError(_)),
                ) => return Err(e),
                Err(e) => {
                    warn!("skipping malformed record: {}", e);
                    continue;
                }
            }
        }
    }

    pub fn into_record_iter(self) -> RecordIterator<R> {
        RecordIterator { parser: self }
    }
}

impl<R: Read> IntoIterator for MrtParser<R> {
    type Item = MrtRecord;
    type IntoIter = RecordIterator<R>;

    fn into_iter(self) -> Self::IntoIter {
        self.into_record_iter()
    }
}

/// Iterator over decoded records that logs and stops on framing errors.
/// Use [MrtParser::next_record] directly to observe those errors instead.
pub struct RecordIterator<R> {
    parser: MrtParser<R>,
}

impl<R: Read> Iterator for RecordIterator<R> {
    type Item = MrtRecord;

    fn next(&mut self) -> Option<MrtRecord> {
        match self.parser.next_record() {
            Ok(record) => record,
            Err(e) => {
                error!("stopping after stream error: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MrtMessage, TableDumpV2Type};
    use bytes::{BufMut, BytesMut};

    fn rib_v4_record(prefix_bits: &[u8], prefix_len: u8, paths: &[&[u32]]) -> BytesMut {
        let mut payload = BytesMut::new();
        payload.put_u32(0);
        payload.put_u8(prefix_len);
        payload.put_slice(prefix_bits);
        payload.put_u16(paths.len() as u16);
        for path in paths {
            let mut value = BytesMut::new();
            value.put_u8(2);
            value.put_u8(path.len() as u8);
            for asn in *path {
                value.put_u32(*asn);
            }
            payload.put_u16(0);
            payload.put_u32(0);
            payload.put_u16((value.len() + 3) as u16);
            payload.put_u8(0x40);
            payload.put_u8(2);
            payload.put_u8(value.len() as u8);
            payload.extend_from_slice(&value);
        }

        let mut bytes = BytesMut::new();
        bytes.put_u32(1_600_000_000);
        bytes.put_u16(13);
        bytes.put_u16(2);
        bytes.put_u32(payload.len() as u32);
        bytes.extend_from_slice(&payload);
        bytes
    }

    #[test]
    fn test_record_iteration() {
        let mut stream = BytesMut::new();
        stream.extend_from_slice(&rib_v4_record(&[192, 0, 2], 24, &[&[65001]]));
        stream.extend_from_slice(&rib_v4_record(&[10], 8, &[&[65002]]));

        let data = stream.freeze();
        let parser = MrtParser::from_reader(data.as_ref());
        let records: Vec<_> = parser.into_record_iter().collect();
        assert_eq!(records.len(), 2);
        for record in &records {
            match &record.message {
                MrtMessage::RibEntries(e) => {
                    assert_eq!(e.rib_type, TableDumpV2Type::RibIpv4Unicast)
                }
                other => panic!("unexpected message: {:?}", other),
            }
        }
    }

    #[test]
    fn test_truncated_stream_surfaces_error() {
        let mut stream = BytesMut::new();
        stream.extend_from_slice(&rib_v4_record(&[192, 0, 2], 24, &[&[65001]]));
        let full = rib_v4_record(&[10], 8, &[&[65002]]);
        stream.extend_from_slice(&full[..full.len() - 2]);

        let data = stream.freeze();
        let mut parser = MrtParser::from_reader(data.as_ref());
        assert!(parser.next_record().unwrap().is_some());
        let err = parser.next_record().unwrap_err();
        assert!(matches!(err, ParserError::TruncatedRecord(_)));
    }

    #[test]
    fn test_empty_stream() {
        let mut parser = MrtParser::from_reader(&[][..]);
        assert!(parser.next_record().unwrap().is_none());
    }
}
