use crate::models::Asn;
use bitflags::bitflags;
use std::fmt::{Display, Formatter};
use std::net::IpAddr;

bitflags! {
    /// BGP path attribute flags (RFC 4271 Section 4.3).
    #[derive(Debug, Copy, Clone, Eq, PartialEq)]
    pub struct AttrFlags: u8 {
        const OPTIONAL = 0x80;
        const TRANSITIVE = 0x40;
        const PARTIAL = 0x20;
        /// Length field is 2 bytes instead of 1.
        const EXTENDED = 0x10;
    }
}

/// BGP path attribute type codes. Only the attributes that matter for
/// prefix-to-origin mapping are modeled; everything else is skipped over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrType {
    Origin,
    AsPath,
    NextHop,
    Unknown(u8),
}

impl From<u8> for AttrType {
    fn from(value: u8) -> Self {
        match value {
            1 => AttrType::Origin,
            2 => AttrType::AsPath,
            3 => AttrType::NextHop,
            v => AttrType::Unknown(v),
        }
    }
}

/// BGP ORIGIN attribute values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Igp,
    Egp,
    Incomplete,
}

impl TryFrom<u8> for Origin {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Origin::Igp),
            1 => Ok(Origin::Egp),
            2 => Ok(Origin::Incomplete),
            v => Err(v),
        }
    }
}

/// A flattened AS path.
///
/// AS_SET and AS_SEQUENCE segments are concatenated in order of appearance;
/// the origin AS is the last element of the flattened list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AsPath {
    asns: Vec<Asn>,
}

impl AsPath {
    pub fn new(asns: Vec<Asn>) -> Self {
        AsPath { asns }
    }

    pub fn len(&self) -> usize {
        self.asns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.asns.is_empty()
    }

    /// The AS that originated the route, i.e. the last AS on the path.
    pub fn origin(&self) -> Option<Asn> {
        self.asns.last().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Asn> {
        self.asns.iter()
    }
}

impl From<Vec<u32>> for AsPath {
    fn from(asns: Vec<u32>) -> Self {
        AsPath {
            asns: asns.into_iter().map(Asn::from).collect(),
        }
    }
}

impl Display for AsPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for asn in &self.asns {
            if !first {
                write!(f, " ")?;
            }
            write!(f, "{}", asn)?;
            first = false;
        }
        Ok(())
    }
}

/// The decoded subset of a RIB entry's BGP attributes.
///
/// ORIGIN and NEXT_HOP are recorded but do not participate in route
/// selection; only the AS path does.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Attributes {
    pub origin: Option<Origin>,
    pub as_path: Option<AsPath>,
    pub next_hop: Option<IpAddr>,
}

impl Attributes {
    /// Origin ASN of this route, if the AS path is present and non-empty.
    pub fn origin_asn(&self) -> Option<Asn> {
        self.as_path.as_ref().and_then(AsPath::origin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_path_origin() {
        let path = AsPath::from(vec![65001, 65002, 15169]);
        assert_eq!(path.len(), 3);
        assert_eq!(path.origin(), Some(Asn::new(15169)));
        assert_eq!(path.to_string(), "65001 65002 15169");

        let empty = AsPath::default();
        assert!(empty.is_empty());
        assert_eq!(empty.origin(), None);
    }

    #[test]
    fn test_attr_type_from_u8() {
        assert_eq!(AttrType::from(1), AttrType::Origin);
        assert_eq!(AttrType::from(2), AttrType::AsPath);
        assert_eq!(AttrType::from(3), AttrType::NextHop);
        assert_eq!(AttrType::from(8), AttrType::Unknown(8));
    }

    #[test]
    fn test_origin_asn() {
        let attrs = Attributes {
            as_path: Some(AsPath::from(vec![64500])),
            ..Default::default()
        };
        assert_eq!(attrs.origin_asn(), Some(Asn::new(64500)));
        assert_eq!(Attributes::default().origin_asn(), None);
    }
}
