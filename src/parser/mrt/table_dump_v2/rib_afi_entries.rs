use crate::error::ParserError;
use crate::models::{Afi, RibEntries, RibEntry, TableDumpV2Type};
use crate::parser::bgp::parse_attributes;
use crate::parser::ReadUtils;
use bytes::Bytes;
use ipnet::{IpNet, Ipv4Net, Ipv6Net};
use log::warn;
use std::net::{Ipv4Addr, Ipv6Addr};

fn afi_from_rib_type(rib_type: TableDumpV2Type) -> Result<Afi, ParserError> {
    match rib_type {
        TableDumpV2Type::RibIpv4Unicast => Ok(Afi::Ipv4),
        TableDumpV2Type::RibIpv6Unicast => Ok(Afi::Ipv6),
        _ => Err(ParserError::ParseError(format!(
            "wrong RIB type for parsing: {:?}",
            rib_type
        ))),
    }
}

/// Read the NLRI-encoded prefix of a RIB record: a bit length followed by
/// only the significant leading bytes. The address is padded with zeros and
/// truncated to the prefix length, so the result is canonical.
fn read_rib_prefix(data: &mut Bytes, afi: Afi) -> Result<IpNet, ParserError> {
    let bit_len = data.read_u8()?;
    let byte_len = (bit_len as usize + 7) / 8;

    let net = match afi {
        Afi::Ipv4 => {
            let mut buffer = [0u8; 4];
            let take = byte_len.min(4);
            data.require_n_remaining(take, "IPv4 prefix")?;
            buffer[..take].copy_from_slice(&data.read_n_bytes(take)?);
            IpNet::V4(Ipv4Net::new(Ipv4Addr::from(buffer), bit_len)?.trunc())
        }
        Afi::Ipv6 => {
            let mut buffer = [0u8; 16];
            let take = byte_len.min(16);
            data.require_n_remaining(take, "IPv6 prefix")?;
            buffer[..take].copy_from_slice(&data.read_n_bytes(take)?);
            IpNet::V6(Ipv6Net::new(Ipv6Addr::from(buffer), bit_len)?.trunc())
        }
    };
    Ok(net)
}

/// RIB AFI-specific entries
///
/// <https://tools.ietf.org/html/rfc6396#section-4.3>
pub fn parse_rib_afi_entries(
    data: &mut Bytes,
    rib_type: TableDumpV2Type,
) -> Result<RibEntries, ParserError> {
    let afi = afi_from_rib_type(rib_type)?;

    let sequence_number = data.read_u32()?;
    let prefix = read_rib_prefix(data, afi)?;
    let entry_count = data.read_u16()?;

    let mut rib_entries = Vec::with_capacity(entry_count as usize);
    for _i in 0..entry_count {
        let entry = match parse_rib_entry(data) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("early break due to error {}", e);
                break;
            }
        };
        rib_entries.push(entry);
    }

    Ok(RibEntries {
        rib_type,
        sequence_number,
        prefix,
        rib_entries,
    })
}

/// RIB entry: one peer's attributes for the record's prefix.
///
/// <https://datatracker.ietf.org/doc/html/rfc6396#section-4.3.4>
/// ```text
///         0                   1                   2                   3
///         0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
///        +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///        |         Peer Index            |
///        +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///        |                         Originated Time                       |
///        +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///        |      Attribute Length         |
///        +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///        |                    BGP Attributes... (variable)
///        +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
fn parse_rib_entry(input: &mut Bytes) -> Result<RibEntry, ParserError> {
    input.require_n_remaining(8, "RIB entry")?;
    let peer_index = input.read_u16()?;
    let originated_time = input.read_u32()?;
    let attribute_length = input.read_u16()? as usize;

    let attr_data = input.read_n_bytes(attribute_length)?;
    let attributes = parse_attributes(attr_data);

    Ok(RibEntry {
        peer_index,
        originated_time,
        attributes,
    })
}
