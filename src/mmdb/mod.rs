/*!
MaxMind DB emission: turns the aggregated route table into an `ASN-DB`
database file that any MMDB reader can query.
*/
mod data;
mod writer;

pub use data::Value;
pub use writer::{MmdbError, MmdbWriter};

use crate::rib::RouteTable;
use log::{info, warn};
use serde::Deserialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

pub const DATABASE_TYPE: &str = "ASN-DB";
pub const DESCRIPTION_EN: &str = "ASN database generated from BGP RIB data";
pub const RECORD_SIZE: u16 = 28;

const PROGRESS_INTERVAL: usize = 10_000;

/// The per-network record stored in the database, in the shape expected by
/// `maxminddb` lookups.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AsnRecord {
    pub asn: u32,
    pub organization: String,
    pub network: String,
}

/// Counts reported by a database emission.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmitStats {
    pub inserted: usize,
    pub skipped: usize,
    pub bytes_written: u64,
}

/// Write the aggregate table to `output` as a MaxMind DB file.
///
/// Individual networks rejected by the writer are counted and skipped;
/// only output I/O failures are fatal. The emitter is the one place that
/// touches the output file.
pub fn write_database(table: &RouteTable, output: &Path) -> Result<EmitStats, MmdbError> {
    let mut writer = MmdbWriter::new(DATABASE_TYPE)
        .description("en", DESCRIPTION_EN)
        .record_size(RECORD_SIZE)?;

    let mut stats = EmitStats::default();
    for (prefix, origin) in table.iter() {
        let network = prefix.to_string();
        let record = Value::Map(vec![
            ("asn".to_string(), Value::Uint32(origin.asn.into())),
            (
                "organization".to_string(),
                Value::String(format!("AS{}", origin.asn)),
            ),
            ("network".to_string(), Value::String(network)),
        ]);

        match writer.insert(prefix, &record) {
            Ok(()) => {
                stats.inserted += 1;
                if stats.inserted % PROGRESS_INTERVAL == 0 {
                    info!("inserted {} records", stats.inserted);
                }
            }
            Err(MmdbError::InvalidNetwork(e)) => {
                warn!("skipping {}: {}", prefix, e);
                stats.skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }

    let file = File::create(output)?;
    stats.bytes_written = writer.write_to(BufWriter::new(file))?;
    info!(
        "wrote {} records ({} bytes) to {}",
        stats.inserted,
        stats.bytes_written,
        output.display()
    );
    Ok(stats)
}
