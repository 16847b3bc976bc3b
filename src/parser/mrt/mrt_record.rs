use crate::error::ParserError;
use crate::models::{CommonHeader, EntryType, MrtMessage, MrtRecord};
use crate::parser::mrt::mrt_header::parse_common_header;
use crate::parser::mrt::table_dump_v2::parse_table_dump_v2_message;
use bytes::Bytes;
use std::io::Read;

/// Upper bound on a single MRT message, protecting against absurd
/// allocations from corrupt length fields.
const MAX_MRT_MESSAGE_LEN: u32 = 16 * 1024 * 1024;

/// A framed but not yet interpreted MRT record.
#[derive(Debug, Clone)]
pub struct RawMrtRecord {
    pub common_header: CommonHeader,
    pub message_bytes: Bytes,
}

/// Read one record frame: the common header plus exactly `length` payload
/// bytes. A short payload read fails with `TruncatedRecord`, which callers
/// treat as fatal for the stream.
pub fn chunk_mrt_record(input: &mut impl Read) -> Result<RawMrtRecord, ParserError> {
    let common_header = parse_common_header(input)?;

    if common_header.length > MAX_MRT_MESSAGE_LEN {
        return Err(ParserError::TruncatedRecord(format!(
            "record length {} exceeds the {} byte limit",
            common_header.length, MAX_MRT_MESSAGE_LEN
        )));
    }

    let mut buffer = vec![0u8; common_header.length as usize];
    if let Err(e) = input.read_exact(&mut buffer) {
        return Err(ParserError::TruncatedRecord(format!(
            "stream ended inside a {} byte record payload: {}",
            common_header.length, e
        )));
    }

    Ok(RawMrtRecord {
        common_header,
        message_bytes: Bytes::from(buffer),
    })
}

/// Interpret a framed record.
///
/// Returns `Ok(None)` for types and subtypes outside TABLE_DUMP_V2
/// {PEER_INDEX_TABLE, RIB_IPV4_UNICAST, RIB_IPV6_UNICAST}; those records are
/// skipped without error. A malformed payload fails only this record.
pub fn parse_mrt_body(
    header: &CommonHeader,
    data: Bytes,
) -> Result<Option<MrtMessage>, ParserError> {
    match EntryType::try_from(header.entry_type) {
        Ok(EntryType::TABLE_DUMP_V2) => parse_table_dump_v2_message(header.entry_subtype, data),
        _ => Ok(None),
    }
}

/// Frame and decode the next MRT record from a stream.
pub fn parse_mrt_record(input: &mut impl Read) -> Result<Option<MrtRecord>, ParserError> {
    let raw = chunk_mrt_record(input)?;
    let message = parse_mrt_body(&raw.common_header, raw.message_bytes)?;
    Ok(message.map(|message| MrtRecord {
        common_header: raw.common_header,
        message,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::{Buf, BufMut, Bytes, BytesMut};

    fn frame(entry_type: u16, subtype: u16, payload: &[u8]) -> BytesMut {
        let mut bytes = BytesMut::new();
        bytes.put_u32(0); // timestamp
        bytes.put_u16(entry_type);
        bytes.put_u16(subtype);
        bytes.put_u32(payload.len() as u32);
        bytes.put_slice(payload);
        bytes
    }

    #[test]
    fn test_chunk_record() {
        let data = frame(13, 2, &[1, 2, 3]).freeze();
        let raw = chunk_mrt_record(&mut data.reader()).unwrap();
        assert_eq!(raw.common_header.entry_type, 13);
        assert_eq!(raw.common_header.entry_subtype, 2);
        assert_eq!(raw.message_bytes.as_ref(), &[1, 2, 3]);
    }

    #[test]
    fn test_short_payload_is_truncation() {
        let mut data = frame(13, 2, &[1, 2, 3]);
        data.truncate(13); // header plus one payload byte
        let err = chunk_mrt_record(&mut data.freeze().reader()).unwrap_err();
        assert!(matches!(err, ParserError::TruncatedRecord(_)));
    }

    #[test]
    fn test_unknown_types_skipped() {
        // BGP4MP record: framed fine, decoded to nothing
        let data = frame(16, 4, &[0; 8]).freeze();
        let record = parse_mrt_record(&mut data.reader()).unwrap();
        assert!(record.is_none());

        // unassigned type value
        let data = frame(99, 0, &[0; 4]).freeze();
        let record = parse_mrt_record(&mut data.reader()).unwrap();
        assert!(record.is_none());

        // TABLE_DUMP_V2 with multicast subtype
        let data = frame(13, 3, &[0; 4]).freeze();
        let record = parse_mrt_record(&mut data.reader()).unwrap();
        assert!(record.is_none());
    }

    #[test]
    fn test_oversized_length_rejected() {
        let mut bytes = BytesMut::new();
        bytes.put_u32(0);
        bytes.put_u16(13);
        bytes.put_u16(2);
        bytes.put_u32(MAX_MRT_MESSAGE_LEN + 1);
        let err = chunk_mrt_record(&mut bytes.freeze().reader()).unwrap_err();
        assert!(matches!(err, ParserError::TruncatedRecord(_)));
    }

    #[test]
    fn test_eof_at_boundary() {
        let err = chunk_mrt_record(&mut Bytes::new().reader()).unwrap_err();
        assert!(matches!(err, ParserError::EofExpected));
    }
}
