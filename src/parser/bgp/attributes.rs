use crate::models::{AsPath, Asn, AttrFlags, AttrType, Attributes, Origin};
use bytes::{Buf, Bytes};
use log::{debug, warn};
use std::net::{IpAddr, Ipv4Addr};

/// Parse a RIB entry's BGP attribute block.
///
/// The block is a sequence of TLVs; `data` covers exactly the attribute
/// bytes of one entry. Attribute parsing never fails the record: a TLV that
/// would read past the end of the block terminates the walk and whatever was
/// parsed so far is kept (RFC 7606 treat-as-withdraw is overkill for RIB
/// snapshots, where a damaged entry simply contributes nothing).
pub fn parse_attributes(mut data: Bytes) -> Attributes {
    let mut attributes = Attributes::default();

    // each attribute is at least 3 bytes: flag(1) + type(1) + length(1)
    while data.remaining() >= 3 {
        let flags = AttrFlags::from_bits_retain(data.get_u8());
        let attr_type = data.get_u8();
        let attr_length = match flags.contains(AttrFlags::EXTENDED) {
            false => data.get_u8() as usize,
            true => {
                if data.remaining() < 2 {
                    warn!("attribute block ended inside an extended length field");
                    break;
                }
                data.get_u16() as usize
            }
        };

        if data.remaining() < attr_length {
            warn!(
                "not enough bytes: input bytes left - {}, want to read - {}; skipping",
                data.remaining(),
                attr_length
            );
            break;
        }

        let mut attr_data = data.split_to(attr_length);

        match AttrType::from(attr_type) {
            AttrType::Origin => {
                if let Some(value) = attr_data.first() {
                    attributes.origin = Origin::try_from(*value).ok();
                }
            }
            AttrType::AsPath => {
                attributes.as_path = Some(parse_as_path(attr_data));
            }
            AttrType::NextHop => {
                if attr_data.remaining() >= 4 {
                    attributes.next_hop = Some(IpAddr::V4(Ipv4Addr::from(attr_data.get_u32())));
                }
            }
            AttrType::Unknown(t) => {
                debug!("skipping attribute type {} of {} bytes", t, attr_length);
            }
        }
    }

    attributes
}

/// Parse an AS_PATH attribute value into a flattened path.
///
/// Segments are `type (1) | count (1) | count x 4-byte ASN`; TABLE_DUMP_V2
/// mandates 4-byte AS numbers throughout (RFC 6396 Section 4.3.4). AS_SET
/// and AS_SEQUENCE members are flattened in order of appearance, so the
/// origin is always the last AS of the last segment. A segment cut short by
/// the end of the value keeps the ASes read up to that point.
pub fn parse_as_path(mut data: Bytes) -> AsPath {
    let mut asns: Vec<Asn> = Vec::with_capacity(8);
    while data.remaining() >= 2 {
        let _segment_type = data.get_u8();
        let count = data.get_u8();
        for _ in 0..count {
            if data.remaining() < 4 {
                warn!("AS path segment cut short; keeping {} ASes", asns.len());
                return AsPath::new(asns);
            }
            asns.push(Asn::new(data.get_u32()));
        }
    }
    AsPath::new(asns)
}
