use crate::error::ParserError;
use crate::models::{Afi, Asn, Peer, PeerIndexTable, PeerType};
use crate::parser::ReadUtils;
use bytes::Bytes;
use std::net::Ipv4Addr;

/// Peer index table
///
/// RFC: <https://www.rfc-editor.org/rfc/rfc6396#section-4.3.1>
pub fn parse_peer_index_table(data: &mut Bytes) -> Result<PeerIndexTable, ParserError> {
    let collector_bgp_id = Ipv4Addr::from(data.read_u32()?);

    let view_name_length = data.read_u16()?;
    let view_name = String::from_utf8(data.read_n_bytes(view_name_length as usize)?.to_vec())
        .unwrap_or_default();

    let peer_count = data.read_u16()?;
    let mut peers = Vec::with_capacity(peer_count as usize);
    for _index in 0..peer_count {
        let peer_type = PeerType::from_bits_retain(data.read_u8()?);
        let afi = match peer_type.contains(PeerType::ADDRESS_FAMILY_IPV6) {
            true => Afi::Ipv6,
            false => Afi::Ipv4,
        };

        let peer_bgp_id = Ipv4Addr::from(data.read_u32()?);
        let peer_ip = data.read_address(afi)?;
        let peer_asn = match peer_type.contains(PeerType::AS_SIZE_32BIT) {
            true => Asn::new(data.read_u32()?),
            false => Asn::new(data.read_u16()? as u32),
        };
        peers.push(Peer {
            peer_type,
            peer_bgp_id,
            peer_ip,
            peer_asn,
        });
    }

    Ok(PeerIndexTable {
        collector_bgp_id,
        view_name,
        peers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::{BufMut, BytesMut};
    use std::net::IpAddr;

    fn build_table(view_name: &str, peers: &[(u8, [u8; 4], Vec<u8>, Vec<u8>)]) -> Bytes {
        let mut bytes = BytesMut::new();
        bytes.put_u32(u32::from(Ipv4Addr::new(192, 0, 2, 255)));
        bytes.put_u16(view_name.len() as u16);
        bytes.put_slice(view_name.as_bytes());
        bytes.put_u16(peers.len() as u16);
        for (peer_type, bgp_id, ip, asn) in peers {
            bytes.put_u8(*peer_type);
            bytes.put_slice(bgp_id);
            bytes.put_slice(ip);
            bytes.put_slice(asn);
        }
        bytes.freeze()
    }

    #[test]
    fn test_parse_peer_index_table() {
        let mut data = build_table(
            "test-view",
            &[
                // IPv4 peer, 16-bit ASN
                (0x00, [10, 0, 0, 1], vec![10, 0, 0, 2], vec![0xfd, 0xe9]),
                // IPv4 peer, 32-bit ASN
                (
                    0x02,
                    [10, 0, 0, 3],
                    vec![10, 0, 0, 4],
                    vec![0x00, 0x03, 0x0d, 0x41],
                ),
                // IPv6 peer, 32-bit ASN
                (
                    0x03,
                    [10, 0, 0, 5],
                    vec![
                        0x20, 0x01, 0x0d, 0xb8, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1,
                    ],
                    vec![0x00, 0x00, 0xfd, 0xea],
                ),
            ],
        );

        let table = parse_peer_index_table(&mut data).unwrap();
        assert_eq!(table.collector_bgp_id, Ipv4Addr::new(192, 0, 2, 255));
        assert_eq!(table.view_name, "test-view");
        assert_eq!(table.peers.len(), 3);

        assert_eq!(table.peers[0].peer_asn, Asn::new(65001));
        assert_eq!(table.peers[1].peer_asn, Asn::new(200001));
        assert_eq!(
            table.peers[2].peer_ip,
            "2001:db8::1".parse::<IpAddr>().unwrap()
        );
        assert_eq!(table.peers[2].peer_asn, Asn::new(65002));
    }

    #[test]
    fn test_empty_view_name() {
        let mut data = build_table("", &[]);
        let table = parse_peer_index_table(&mut data).unwrap();
        assert_eq!(table.view_name, "");
        assert!(table.peers.is_empty());
    }

    #[test]
    fn test_truncated_peer_entry() {
        let full = build_table(
            "",
            &[(0x02, [10, 0, 0, 3], vec![10, 0, 0, 4], vec![0, 3, 13, 65])],
        );
        let mut data = full.slice(..full.len() - 2);
        let err = parse_peer_index_table(&mut data).unwrap_err();
        assert!(matches!(err, ParserError::InsufficientData { .. }));
    }
}
