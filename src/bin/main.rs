use asndb::mmdb::AsnRecord;
use asndb::Converter;
use clap::{Parser, Subcommand};
use maxminddb::MaxMindDBError;
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Instant;

/// RIPE RIS collectors queried by the `ripe` input sentinel. Decommissioned
/// collectors (rrc02, rrc08, rrc09, rrc17) are left out.
const DEFAULT_RRC_COLLECTORS: &[&str] = &[
    "rrc00", "rrc01", "rrc03", "rrc04", "rrc05", "rrc06", "rrc07", "rrc10", "rrc11", "rrc12",
    "rrc13", "rrc14", "rrc15", "rrc16", "rrc18", "rrc19", "rrc20", "rrc21", "rrc22", "rrc23",
];

/// Build and query IP-to-ASN MaxMind databases from MRT RIB dumps.
#[derive(Parser)]
#[clap(name = "asndb", version)]
struct Opts {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert one or more MRT RIB dumps into an MMDB file
    Convert {
        /// Comma-separated MRT file paths or URLs, or "ripe" to download
        /// the latest bview from the default RIPE RIS collectors
        #[clap(short, long, default_value = "ripe")]
        input: String,

        /// Output MMDB file
        #[clap(short, long, default_value = "asn.mmdb")]
        output: PathBuf,

        /// Soft memory advisory in MB (diagnostic only)
        #[clap(long, default_value_t = 2048)]
        mem: u64,

        /// Cache directory for downloaded archives
        #[clap(short, long, default_value = ".")]
        cache_dir: PathBuf,
    },
    /// Look up an IP address in an existing MMDB file
    Lookup {
        /// MMDB file to query
        #[clap(short, long, default_value = "asn.mmdb")]
        mmdb: PathBuf,

        /// IP address to look up
        ip: IpAddr,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let opts: Opts = Opts::parse();
    match opts.command {
        Command::Convert {
            input,
            output,
            mem,
            cache_dir,
        } => convert(&input, &output, mem, &cache_dir),
        Command::Lookup { mmdb, ip } => lookup(&mmdb, ip),
    }
}

fn expand_inputs(input: &str) -> Vec<String> {
    if input == "ripe" {
        return DEFAULT_RRC_COLLECTORS
            .iter()
            .map(|rrc| format!("http://data.ris.ripe.net/{}/latest-bview.gz", rrc))
            .collect();
    }
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn convert(input: &str, output: &PathBuf, mem: u64, cache_dir: &PathBuf) {
    let inputs = expand_inputs(input);
    if inputs.is_empty() {
        eprintln!("no input files or URLs provided");
        std::process::exit(1);
    }

    let start = Instant::now();
    let mut converter = Converter::new()
        .with_memory_advisory_mb(mem)
        .with_cache_dir(cache_dir.to_string_lossy());

    for path in &inputs {
        if let Err(e) = converter.process_file(path) {
            log::warn!("failed to process {}: {}", path, e);
        }
    }

    let stats = match converter.write_mmdb(output) {
        Ok(stats) => stats,
        Err(e) => {
            eprintln!("failed to write {}: {}", output.display(), e);
            std::process::exit(1);
        }
    };

    log::info!(
        "conversion completed in {:.1?}: {} prefixes, {} skipped",
        start.elapsed(),
        stats.inserted,
        stats.skipped
    );
    log::info!(
        "estimated table memory: {:.2} MB",
        converter.table().estimated_memory_bytes() as f64 / 1024.0 / 1024.0
    );
    log::info!(
        "output file size: {:.2} MB",
        stats.bytes_written as f64 / 1024.0 / 1024.0
    );
}

fn lookup(mmdb: &PathBuf, ip: IpAddr) {
    let reader = match maxminddb::Reader::open_readfile(mmdb) {
        Ok(reader) => reader,
        Err(e) => {
            eprintln!("failed to open {}: {}", mmdb.display(), e);
            std::process::exit(1);
        }
    };

    match reader.lookup::<AsnRecord>(ip) {
        Ok(record) => println!(
            "IP: {} | ASN: {} | Organization: {} | Network: {}",
            ip, record.asn, record.organization, record.network
        ),
        Err(MaxMindDBError::AddressNotFoundError(_)) => {
            println!("IP: {} | no data found", ip);
        }
        Err(e) => {
            eprintln!("lookup failed for {}: {}", ip, e);
            std::process::exit(1);
        }
    }
}
