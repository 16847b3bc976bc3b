mod peer_index_table;
mod rib_afi_entries;

pub use peer_index_table::parse_peer_index_table;
pub use rib_afi_entries::parse_rib_afi_entries;

use crate::error::ParserError;
use crate::models::{MrtMessage, TableDumpV2Type};
use bytes::Bytes;

/// Dispatch a TABLE_DUMP_V2 payload on its subtype.
///
/// Peer index tables and IPv4/IPv6 unicast RIB entries are decoded; all
/// other subtypes (multicast, add-path, generic, geo) yield `Ok(None)` and
/// are skipped by the caller.
pub fn parse_table_dump_v2_message(
    subtype: u16,
    mut data: Bytes,
) -> Result<Option<MrtMessage>, ParserError> {
    let subtype = match TableDumpV2Type::try_from(subtype) {
        Ok(t) => t,
        Err(_) => return Ok(None),
    };

    match subtype {
        TableDumpV2Type::PeerIndexTable => {
            let table = parse_peer_index_table(&mut data)?;
            Ok(Some(MrtMessage::PeerIndexTable(table)))
        }
        TableDumpV2Type::RibIpv4Unicast | TableDumpV2Type::RibIpv6Unicast => {
            let entries = parse_rib_afi_entries(&mut data, subtype)?;
            Ok(Some(MrtMessage::RibEntries(entries)))
        }
        _ => Ok(None),
    }
}
