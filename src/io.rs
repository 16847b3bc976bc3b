/*!
Input acquisition: local files, HTTP(S) downloads, and transparent
decompression, all through `oneio`.
*/
use crate::error::ParserError;
use log::info;
use std::fs;
use std::io::Read;
use std::path::Path;

pub(crate) fn get_reader(path: &str) -> Result<Box<dyn Read + Send>, ParserError> {
    Ok(oneio::get_reader(path)?)
}

/// Open `path`, caching remote downloads under `cache_dir`.
///
/// The archive is stored under a name derived from the URL, and an existing
/// cache file is reused as-is, so a conversion interrupted mid-way resumes
/// without re-downloading finished inputs. Local paths pass straight
/// through.
pub(crate) fn get_cached_reader(
    path: &str,
    cache_dir: &str,
) -> Result<Box<dyn Read + Send>, ParserError> {
    if !is_remote(path) {
        return get_reader(path);
    }

    fs::create_dir_all(cache_dir)?;
    let cache_path = Path::new(cache_dir).join(cache_file_name(path));
    let cache_path = cache_path.to_string_lossy().into_owned();

    if Path::new(&cache_path).exists() {
        info!("using cached copy of {} at {}", path, cache_path);
    } else {
        info!("downloading {} to {}", path, cache_path);
        if let Err(e) = oneio::download(path, &cache_path, None) {
            // drop any partial file so the next run starts clean
            let _ = fs::remove_file(&cache_path);
            return Err(ParserError::from(e));
        }
    }

    get_reader(&cache_path)
}

fn is_remote(path: &str) -> bool {
    path.starts_with("http://") || path.starts_with("https://") || path.starts_with("ftp://")
}

/// Cache file name for a remote URL: a short URL digest plus the original
/// base name, keeping same-named archives from different collectors apart.
fn cache_file_name(url: &str) -> String {
    let base = url.rsplit('/').next().filter(|s| !s.is_empty());
    format!("{}-{}", crc32(url), base.unwrap_or("download"))
}

/// A CRC32 implementation that converts a string to a hex string.
///
/// CRC32 is a checksum algorithm that is used to verify the integrity of
/// data. It is short in length and sufficient for generating unique file
/// names based on remote URLs.
fn crc32(input: &str) -> String {
    let input_bytes = input.as_bytes();
    let mut table = [0u32; 256];
    let polynomial = 0xedb88320u32;

    for i in 0..256 {
        let mut crc = i as u32;
        for _ in 0..8 {
            if crc & 1 == 1 {
                crc = (crc >> 1) ^ polynomial;
            } else {
                crc >>= 1;
            }
        }
        table[i as usize] = crc;
    }

    let mut crc = !0u32;
    for byte in input_bytes.iter() {
        let index = ((crc ^ (*byte as u32)) & 0xff) as usize;
        crc = (crc >> 8) ^ table[index];
    }

    format!("{:08x}", !crc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_file_name() {
        let a = cache_file_name("http://data.ris.ripe.net/rrc00/latest-bview.gz");
        let b = cache_file_name("http://data.ris.ripe.net/rrc01/latest-bview.gz");
        assert!(a.ends_with("-latest-bview.gz"));
        assert!(b.ends_with("-latest-bview.gz"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_is_remote() {
        assert!(is_remote("http://example.com/rib.gz"));
        assert!(is_remote("https://example.com/rib.gz"));
        assert!(!is_remote("/var/tmp/rib.gz"));
        assert!(!is_remote("rib.gz"));
    }

    #[test]
    fn test_crc32_known_value() {
        // standard CRC-32 ("check" value of the catalogued algorithm)
        assert_eq!(crc32("123456789"), "cbf43926");
    }
}
