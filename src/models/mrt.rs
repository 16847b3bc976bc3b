//! MRT record model (RFC 6396).
use crate::models::{Asn, Attributes};
use bitflags::bitflags;
use ipnet::IpNet;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::net::{IpAddr, Ipv4Addr};

/// MRT record types.
///
/// <https://www.iana.org/assignments/mrt/mrt.xhtml#type-codes>
#[allow(non_camel_case_types)]
#[derive(Debug, TryFromPrimitive, IntoPrimitive, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum EntryType {
    OSPFv2 = 11,
    TABLE_DUMP = 12,
    TABLE_DUMP_V2 = 13,
    BGP4MP = 16,
    BGP4MP_ET = 17,
    ISIS = 32,
    ISIS_ET = 33,
    OSPFv3 = 48,
    OSPFv3_ET = 49,
}

/// TableDump version 2 subtypes.
///
/// <https://www.iana.org/assignments/mrt/mrt.xhtml#subtype-codes>
#[derive(Debug, TryFromPrimitive, IntoPrimitive, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum TableDumpV2Type {
    PeerIndexTable = 1,
    RibIpv4Unicast = 2,
    RibIpv4Multicast = 3,
    RibIpv6Unicast = 4,
    RibIpv6Multicast = 5,
    RibGeneric = 6,
    GeoPeerTable = 7,
    RibIpv4UnicastAddPath = 8,
    RibIpv4MulticastAddPath = 9,
    RibIpv6UnicastAddPath = 10,
    RibIpv6MulticastAddPath = 11,
    RibGenericAddPath = 12,
}

/// MRT common header.
///
/// A MRT record is constructed as the following:
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                           Timestamp                           |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |             Type              |            Subtype            |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                             Length                            |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                      Message... (variable)
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
///
/// The type and subtype are kept as raw values so that records of unknown
/// types can still be framed (and skipped) by their length field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommonHeader {
    pub timestamp: u32,
    pub entry_type: u16,
    pub entry_subtype: u16,
    pub length: u32,
}

/// A fully decoded MRT record: common header plus interpreted message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MrtRecord {
    pub common_header: CommonHeader,
    pub message: MrtMessage,
}

/// The closed set of messages this decoder produces. Records of any other
/// type or subtype are skipped before reaching this enum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MrtMessage {
    PeerIndexTable(PeerIndexTable),
    RibEntries(RibEntries),
}

bitflags! {
    /// Peer type flags within a PEER_INDEX_TABLE entry.
    #[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
    pub struct PeerType: u8 {
        const ADDRESS_FAMILY_IPV6 = 0x1;
        const AS_SIZE_32BIT = 0x2;
    }
}

/// One peer of the collector, as listed in the PEER_INDEX_TABLE.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Peer {
    pub peer_type: PeerType,
    pub peer_bgp_id: Ipv4Addr,
    pub peer_ip: IpAddr,
    pub peer_asn: Asn,
}

/// Peer index table (RFC 6396 Section 4.3.1).
///
/// Decoded for structural correctness; route aggregation does not consult
/// the peer list, so only the summary fields are retained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerIndexTable {
    pub collector_bgp_id: Ipv4Addr,
    pub view_name: String,
    pub peers: Vec<Peer>,
}

/// RIB entries for a single prefix (RFC 6396 Section 4.3.2).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RibEntries {
    pub rib_type: TableDumpV2Type,
    pub sequence_number: u32,
    /// Canonical network: address truncated to the prefix length.
    pub prefix: IpNet,
    pub rib_entries: Vec<RibEntry>,
}

/// A single peer's view of a prefix (RFC 6396 Section 4.3.4).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RibEntry {
    pub peer_index: u16,
    pub originated_time: u32,
    pub attributes: Attributes,
}
