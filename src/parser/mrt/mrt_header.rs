use crate::error::ParserError;
use crate::models::CommonHeader;
use std::io::{ErrorKind, Read};

pub const MRT_HEADER_LENGTH: usize = 12;

/// Read and parse the 12-byte MRT common header.
///
/// Zero bytes available at the header boundary is a clean end of stream
/// (`EofExpected`); a partially read header means the stream was cut inside
/// a record and fails with `TruncatedRecord`.
pub fn parse_common_header<T: Read>(input: &mut T) -> Result<CommonHeader, ParserError> {
    let mut buffer = [0u8; MRT_HEADER_LENGTH];
    let mut filled = 0;
    while filled < MRT_HEADER_LENGTH {
        match input.read(&mut buffer[filled..]) {
            Ok(0) => {
                return if filled == 0 {
                    Err(ParserError::EofExpected)
                } else {
                    Err(ParserError::TruncatedRecord(format!(
                        "stream ended {} bytes into a record header",
                        filled
                    )))
                };
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(ParserError::IoError(e)),
        }
    }

    Ok(CommonHeader {
        timestamp: u32::from_be_bytes(buffer[0..4].try_into().unwrap()),
        entry_type: u16::from_be_bytes(buffer[4..6].try_into().unwrap()),
        entry_subtype: u16::from_be_bytes(buffer[6..8].try_into().unwrap()),
        length: u32::from_be_bytes(buffer[8..12].try_into().unwrap()),
    })
}
