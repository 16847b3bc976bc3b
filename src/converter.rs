/*!
End-to-end conversion: drain MRT inputs into the route table, then emit
the MMDB file.
*/
use crate::error::ParserError;
use crate::mmdb::{self, EmitStats, MmdbError};
use crate::models::MrtMessage;
use crate::parser::MrtParser;
use crate::rib::RouteTable;
use log::{info, warn};
use std::io::Read;
use std::path::Path;

const PROGRESS_INTERVAL: usize = 10_000;

/// Accumulates routes from any number of MRT inputs and writes the final
/// lookup database.
///
/// Inputs are drained sequentially; the table grows across all of them.
/// A stream that fails mid-way keeps everything observed up to the failure.
pub struct Converter {
    table: RouteTable,
    mem_advisory_mb: Option<u64>,
    cache_dir: Option<String>,
    advisory_logged: bool,
}

impl Default for Converter {
    fn default() -> Self {
        Self::new()
    }
}

impl Converter {
    pub fn new() -> Self {
        Converter {
            table: RouteTable::new(),
            mem_advisory_mb: None,
            cache_dir: None,
            advisory_logged: false,
        }
    }

    /// Soft memory advisory in MB. Purely diagnostic: the converter warns
    /// when the estimated table working set crosses it, nothing more.
    pub fn with_memory_advisory_mb(mut self, limit_mb: u64) -> Self {
        self.mem_advisory_mb = Some(limit_mb);
        self
    }

    /// Cache downloaded archives under this directory (see
    /// [MrtParser::new_cached]).
    pub fn with_cache_dir(mut self, cache_dir: impl Into<String>) -> Self {
        self.cache_dir = Some(cache_dir.into());
        self
    }

    /// Process one input file or URL to completion.
    pub fn process_file(&mut self, path: &str) -> Result<(), ParserError> {
        info!("processing {}", path);
        let parser = match &self.cache_dir {
            Some(dir) => MrtParser::new_cached(path, dir)?,
            None => MrtParser::new(path)?,
        };
        self.process(parser)
    }

    /// Process an already opened MRT stream to completion.
    pub fn process_reader<R: Read>(&mut self, reader: R) -> Result<(), ParserError> {
        self.process(MrtParser::from_reader(reader))
    }

    fn process<R: Read>(&mut self, mut parser: MrtParser<R>) -> Result<(), ParserError> {
        let mut progress = self.table.len() / PROGRESS_INTERVAL;
        loop {
            let record = match parser.next_record()? {
                Some(record) => record,
                None => return Ok(()),
            };
            match record.message {
                MrtMessage::PeerIndexTable(table) => {
                    info!(
                        "peer index table: collector {}, {} peers",
                        table.collector_bgp_id,
                        table.peers.len()
                    );
                }
                MrtMessage::RibEntries(entries) => {
                    self.table.observe(&entries);
                    let current = self.table.len() / PROGRESS_INTERVAL;
                    if current > progress {
                        progress = current;
                        info!("aggregated {} prefixes", self.table.len());
                        self.check_memory_advisory();
                    }
                }
            }
        }
    }

    fn check_memory_advisory(&mut self) {
        let Some(limit_mb) = self.mem_advisory_mb else {
            return;
        };
        let estimated_mb = self.table.estimated_memory_bytes() / (1024 * 1024);
        if estimated_mb > limit_mb && !self.advisory_logged {
            warn!(
                "estimated table working set {} MB exceeds the {} MB advisory",
                estimated_mb, limit_mb
            );
            self.advisory_logged = true;
        }
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// Emit the accumulated table as a MaxMind DB file.
    pub fn write_mmdb(&self, output: &Path) -> Result<EmitStats, MmdbError> {
        mmdb::write_database(&self.table, output)
    }
}
