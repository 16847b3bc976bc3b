//! MaxMind DB serialization: binary search tree, data section, metadata.
//!
//! The on-disk layout follows the [MaxMind DB file format, v2.0][spec]:
//! a bit trie of fixed-size node records, a 16-byte separator, the encoded
//! data section, and a metadata map introduced by the MaxMind.com marker.
//! Databases produced here are readable by the `maxminddb` crate.
//!
//! [spec]: https://maxmind.github.io/MaxMind-DB/
use crate::mmdb::data::{encode_value, Value};
use bytes::BytesMut;
use ipnet::IpNet;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};
use std::{error::Error, fmt, io, io::Write};

const METADATA_MARKER: &[u8] = b"\xab\xcd\xefMaxMind.com";
const DATA_SECTION_SEPARATOR_LEN: usize = 16;

#[derive(Debug)]
pub enum MmdbError {
    Io(io::Error),
    /// The network cannot be represented in the search tree (zero-length
    /// prefix). Counted and skipped by the emitter, never fatal.
    InvalidNetwork(String),
    /// Tree plus data grew past what the record size can address.
    RecordOverflow(String),
}

impl Error for MmdbError {}

impl Display for MmdbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            MmdbError::Io(e) => write!(f, "Error: {}", e),
            MmdbError::InvalidNetwork(s) => write!(f, "Error: invalid network: {}", s),
            MmdbError::RecordOverflow(s) => write!(f, "Error: {}", s),
        }
    }
}

impl From<io::Error> for MmdbError {
    fn from(e: io::Error) -> Self {
        MmdbError::Io(e)
    }
}

#[derive(Debug, Clone, Default)]
enum Record {
    #[default]
    Empty,
    Node(Box<Node>),
    /// Offset of an encoded value within the data section.
    Data(u32),
}

#[derive(Debug, Clone, Default)]
struct Node {
    left: Record,
    right: Record,
}

/// Builder for a MaxMind DB file.
///
/// Networks are inserted into an in-memory bit trie along with their
/// encoded record values; `write_to` serializes the trie, data section,
/// and metadata in one pass.
///
/// The search tree always spans 128 bits (`ip_version` 6); IPv4 networks
/// are placed at the IPv4-mapped `::/96` position, which is where readers
/// look for them.
pub struct MmdbWriter {
    database_type: String,
    description: Vec<(String, String)>,
    languages: Vec<String>,
    record_size: u16,
    root: Node,
    data: BytesMut,
}

impl MmdbWriter {
    pub fn new(database_type: impl Into<String>) -> Self {
        MmdbWriter {
            database_type: database_type.into(),
            description: vec![],
            languages: vec!["en".to_string()],
            record_size: 28,
            root: Node::default(),
            data: BytesMut::new(),
        }
    }

    /// Add a description in the given language (shown by `mmdblookup` and
    /// friends; "en" at minimum is conventional).
    pub fn description(mut self, language: impl Into<String>, text: impl Into<String>) -> Self {
        self.description.push((language.into(), text.into()));
        self
    }

    /// Record size in bits: 24, 28, or 32. Defaults to 28, which addresses
    /// up to 256 MiB of tree and data.
    pub fn record_size(mut self, bits: u16) -> Result<Self, MmdbError> {
        match bits {
            24 | 28 | 32 => {
                self.record_size = bits;
                Ok(self)
            }
            _ => Err(MmdbError::RecordOverflow(format!(
                "unsupported record size: {}",
                bits
            ))),
        }
    }

    /// Insert a network with its record value.
    ///
    /// A more specific network inserted under a covering one shadows it for
    /// the addresses it spans; a covering network inserted later fills only
    /// the gaps, so insertion order between nested networks does not matter.
    pub fn insert(&mut self, network: &IpNet, value: &Value) -> Result<(), MmdbError> {
        let (bits, depth) = network_bits(network);
        if depth == 0 {
            return Err(MmdbError::InvalidNetwork(format!(
                "zero-length prefix {} cannot be inserted",
                network
            )));
        }

        let offset = self.data.len() as u32;
        encode_value(&mut self.data, value);
        insert_at(&mut self.root, &bits, 0, depth, offset);
        Ok(())
    }

    /// Serialize the database. Returns the number of bytes written.
    pub fn write_to<W: Write>(self, mut output: W) -> Result<u64, MmdbError> {
        let mut arena: Vec<FlatNode> = Vec::new();
        flatten(&self.root, &mut arena);
        let node_count = arena.len() as u32;

        let max_record_value = node_count as u64 + DATA_SECTION_SEPARATOR_LEN as u64 + self.data.len() as u64;
        if max_record_value >= 1u64 << self.record_size {
            return Err(MmdbError::RecordOverflow(format!(
                "{} nodes and {} data bytes exceed the {}-bit record size",
                node_count,
                self.data.len(),
                self.record_size
            )));
        }

        let mut written: u64 = 0;
        let mut tree = Vec::with_capacity(arena.len() * (self.record_size as usize / 4));
        for node in &arena {
            let left = node.left.value(node_count);
            let right = node.right.value(node_count);
            match self.record_size {
                24 => {
                    tree.extend_from_slice(&left.to_be_bytes()[1..]);
                    tree.extend_from_slice(&right.to_be_bytes()[1..]);
                }
                28 => {
                    tree.extend_from_slice(&left.to_be_bytes()[1..]);
                    tree.push((((left >> 24) as u8) << 4) | ((right >> 24) as u8));
                    tree.extend_from_slice(&right.to_be_bytes()[1..]);
                }
                32 => {
                    tree.extend_from_slice(&left.to_be_bytes());
                    tree.extend_from_slice(&right.to_be_bytes());
                }
                _ => unreachable!("record size is validated on construction"),
            }
        }
        output.write_all(&tree)?;
        written += tree.len() as u64;

        output.write_all(&[0u8; DATA_SECTION_SEPARATOR_LEN])?;
        written += DATA_SECTION_SEPARATOR_LEN as u64;

        output.write_all(&self.data)?;
        written += self.data.len() as u64;

        output.write_all(METADATA_MARKER)?;
        written += METADATA_MARKER.len() as u64;

        let mut metadata = BytesMut::new();
        encode_value(&mut metadata, &self.metadata(node_count));
        output.write_all(&metadata)?;
        written += metadata.len() as u64;

        output.flush()?;
        Ok(written)
    }

    fn metadata(&self, node_count: u32) -> Value {
        let build_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();

        Value::Map(vec![
            (
                "binary_format_major_version".to_string(),
                Value::Uint16(2),
            ),
            (
                "binary_format_minor_version".to_string(),
                Value::Uint16(0),
            ),
            ("build_epoch".to_string(), Value::Uint64(build_epoch)),
            (
                "database_type".to_string(),
                Value::String(self.database_type.clone()),
            ),
            (
                "description".to_string(),
                Value::Map(
                    self.description
                        .iter()
                        .map(|(lang, text)| (lang.clone(), Value::String(text.clone())))
                        .collect(),
                ),
            ),
            ("ip_version".to_string(), Value::Uint16(6)),
            (
                "languages".to_string(),
                Value::Array(
                    self.languages
                        .iter()
                        .map(|l| Value::String(l.clone()))
                        .collect(),
                ),
            ),
            ("node_count".to_string(), Value::Uint32(node_count)),
            ("record_size".to_string(), Value::Uint16(self.record_size)),
        ])
    }
}

/// The 128-bit search key and depth for a network. IPv4 networks live under
/// the IPv4-mapped position `::/96`.
fn network_bits(network: &IpNet) -> ([u8; 16], usize) {
    match network {
        IpNet::V4(v4) => {
            let mut bits = [0u8; 16];
            bits[12..].copy_from_slice(&v4.addr().octets());
            (bits, 96 + v4.prefix_len() as usize)
        }
        IpNet::V6(v6) => (v6.addr().octets(), v6.prefix_len() as usize),
    }
}

fn bit_at(bits: &[u8; 16], index: usize) -> usize {
    ((bits[index >> 3] >> (7 - (index & 7))) & 1) as usize
}

fn insert_at(node: &mut Node, bits: &[u8; 16], depth: usize, target: usize, data: u32) {
    let slot = match bit_at(bits, depth) {
        0 => &mut node.left,
        _ => &mut node.right,
    };

    if depth + 1 == target {
        set_record(slot, data);
        return;
    }

    match slot {
        Record::Node(child) => insert_at(child, bits, depth + 1, target, data),
        Record::Empty => {
            let mut child = Box::<Node>::default();
            insert_at(&mut child, bits, depth + 1, target, data);
            *slot = Record::Node(child);
        }
        Record::Data(existing) => {
            // split the covering leaf: its value applies to both halves
            // until the more specific network overrides its own
            let existing = *existing;
            let mut child = Box::new(Node {
                left: Record::Data(existing),
                right: Record::Data(existing),
            });
            insert_at(&mut child, bits, depth + 1, target, data);
            *slot = Record::Node(child);
        }
    }
}

fn set_record(slot: &mut Record, data: u32) {
    match slot {
        Record::Empty | Record::Data(_) => *slot = Record::Data(data),
        // a covering network arriving after its more specifics: only the
        // yet-uncovered gaps take the new value
        Record::Node(child) => fill_empty(child, data),
    }
}

fn fill_empty(node: &mut Node, data: u32) {
    for slot in [&mut node.left, &mut node.right] {
        match slot {
            Record::Empty => *slot = Record::Data(data),
            Record::Node(child) => fill_empty(child, data),
            Record::Data(_) => {}
        }
    }
}

struct FlatNode {
    left: FlatRecord,
    right: FlatRecord,
}

#[derive(Clone, Copy)]
enum FlatRecord {
    Empty,
    Node(u32),
    Data(u32),
}

impl FlatRecord {
    /// On-disk record value: node index, `node_count` for "no data", or
    /// `node_count + 16 + offset` pointing into the data section.
    fn value(self, node_count: u32) -> u32 {
        match self {
            FlatRecord::Empty => node_count,
            FlatRecord::Node(index) => index,
            FlatRecord::Data(offset) => node_count + DATA_SECTION_SEPARATOR_LEN as u32 + offset,
        }
    }
}

fn flatten(node: &Node, arena: &mut Vec<FlatNode>) -> u32 {
    let index = arena.len() as u32;
    arena.push(FlatNode {
        left: FlatRecord::Empty,
        right: FlatRecord::Empty,
    });
    let left = flatten_record(&node.left, arena);
    let right = flatten_record(&node.right, arena);
    arena[index as usize].left = left;
    arena[index as usize].right = right;
    index
}

fn flatten_record(record: &Record, arena: &mut Vec<FlatNode>) -> FlatRecord {
    match record {
        Record::Empty => FlatRecord::Empty,
        Record::Node(child) => FlatRecord::Node(flatten(child, arena)),
        Record::Data(offset) => FlatRecord::Data(*offset),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asn_value(asn: u32) -> Value {
        Value::Map(vec![("asn".to_string(), Value::Uint32(asn))])
    }

    #[test]
    fn test_empty_database_has_single_node() {
        let writer = MmdbWriter::new("test");
        let mut buffer = Vec::new();
        let written = writer.write_to(&mut buffer).unwrap();
        assert_eq!(written, buffer.len() as u64);
        // one 7-byte node, both records pointing at node_count (1)
        assert_eq!(&buffer[..7], &[0, 0, 1, 0, 0, 0, 1]);
    }

    #[test]
    fn test_zero_length_prefix_rejected() {
        let mut writer = MmdbWriter::new("test");
        let err = writer
            .insert(&"0.0.0.0/0".parse().unwrap(), &asn_value(7))
            .unwrap_err();
        assert!(matches!(err, MmdbError::InvalidNetwork(_)));
    }

    #[test]
    fn test_v4_network_sits_under_mapped_position() {
        let (bits, depth) = network_bits(&"8.8.8.0/24".parse().unwrap());
        assert_eq!(depth, 96 + 24);
        assert_eq!(&bits[..12], &[0u8; 12]);
        assert_eq!(&bits[12..], &[8, 8, 8, 0]);
    }

    #[test]
    fn test_record_size_validation() {
        assert!(MmdbWriter::new("test").record_size(28).is_ok());
        assert!(MmdbWriter::new("test").record_size(26).is_err());
    }

    #[test]
    fn test_nested_networks_either_order() {
        for order in [[0usize, 1], [1, 0]] {
            let nets: [(IpNet, u32); 2] = [
                ("10.0.0.0/8".parse().unwrap(), 1),
                ("10.1.0.0/16".parse().unwrap(), 2),
            ];
            let mut writer = MmdbWriter::new("test");
            for i in order {
                writer.insert(&nets[i].0, &asn_value(nets[i].1)).unwrap();
            }
            // walk to 10.1.2.3: must hit the /16 leaf, not the /8
            let (bits, _) = network_bits(&"10.1.2.3/32".parse().unwrap());
            let mut node = &writer.root;
            let mut found = None;
            for depth in 0..128 {
                let slot = match bit_at(&bits, depth) {
                    0 => &node.left,
                    _ => &node.right,
                };
                match slot {
                    Record::Node(child) => node = child.as_ref(),
                    Record::Data(offset) => {
                        found = Some(*offset);
                        break;
                    }
                    Record::Empty => break,
                }
            }
            // offsets are insertion-ordered; the /16 record must win
            let sixteen_offset = match order[0] {
                0 => writer.data.len() as u32 / 2, // inserted second
                _ => 0,                            // inserted first
            };
            assert_eq!(found, Some(sixteen_offset));
        }
    }
}
