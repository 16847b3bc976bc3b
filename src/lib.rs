/*!
`asndb` builds IP-to-ASN lookup databases from BGP routing table dumps.

It streams MRT TABLE_DUMP_V2 snapshots (RFC 6396) as published by route
collectors, selects the best origin for every announced prefix by shortest
AS path, and writes the result as a MaxMind DB file that maps any IPv4 or
IPv6 address to the ASN originating its longest-matching prefix.

# Example

Convert a local RIB dump and query the result:

```no_run
use asndb::Converter;
use std::path::Path;

let mut converter = Converter::new();
converter.process_file("latest-bview.gz").unwrap();
let stats = converter.write_mmdb(Path::new("asn.mmdb")).unwrap();
println!("{} prefixes", stats.inserted);
```

Inputs may be plain or gzip/bzip2-compressed, local paths or HTTP(S) URLs.
Malformed records inside a dump are skipped; a truncated dump keeps every
route observed before the cut.

The lower layers are usable on their own: [MrtParser] iterates decoded
records, [RouteTable] aggregates them, and [mmdb::MmdbWriter] serializes
arbitrary network-to-record tables.
*/
pub mod converter;
pub mod error;
pub(crate) mod io;
pub mod mmdb;
pub mod models;
pub mod parser;
pub mod rib;

pub use converter::Converter;
pub use error::ParserError;
pub use mmdb::AsnRecord;
pub use models::{MrtMessage, MrtRecord};
pub use parser::{MrtParser, RecordIterator};
pub use rib::{PrefixOrigin, RouteTable};
