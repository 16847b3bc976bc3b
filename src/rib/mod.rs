/*!
Route aggregation: merges RIB entries from any number of collectors into a
single prefix-to-origin table using shortest-AS-path selection.
*/
use crate::models::{Asn, RibEntries};
use ipnet::IpNet;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Pre-sizing hint: a global IPv4 + IPv6 view is on the order of 1.2M
/// prefixes; doubling that avoids rehashing during a full import.
pub const EXPECTED_PREFIX_COUNT: usize = 2_000_000;

/// The selected origin for one prefix, along with the AS path length that
/// justified the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrefixOrigin {
    pub asn: Asn,
    pub path_len: usize,
}

/// In-memory prefix-to-origin table.
///
/// Keys are canonical networks (address truncated to the prefix length),
/// so equal prefixes from different collectors always collide into one
/// entry. Selection prefers the shortest AS path seen so far; on ties the
/// first observation wins, which keeps aggregation order-insensitive except
/// between equal-length paths (whose origins agree in practice).
pub struct RouteTable {
    routes: HashMap<IpNet, PrefixOrigin>,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteTable {
    pub fn new() -> Self {
        RouteTable {
            routes: HashMap::with_capacity(EXPECTED_PREFIX_COUNT),
        }
    }

    /// Feed one decoded RIB record into the table.
    ///
    /// Sub-entries without a usable origin (empty AS path or AS0) and the
    /// default routes `0.0.0.0/0` / `::/0` contribute nothing. Observation
    /// never fails; malformed entries were already filtered by the decoder.
    pub fn observe(&mut self, entries: &RibEntries) {
        if entries.prefix.prefix_len() == 0 {
            return;
        }

        for entry in &entries.rib_entries {
            let Some(path) = entry.attributes.as_path.as_ref() else {
                continue;
            };
            let Some(origin) = path.origin() else {
                continue;
            };
            if origin.is_reserved() {
                continue;
            }

            match self.routes.entry(entries.prefix) {
                Entry::Vacant(vacant) => {
                    vacant.insert(PrefixOrigin {
                        asn: origin,
                        path_len: path.len(),
                    });
                }
                Entry::Occupied(mut occupied) => {
                    // strict less-than: equal-length paths never replace
                    if path.len() < occupied.get().path_len {
                        occupied.insert(PrefixOrigin {
                            asn: origin,
                            path_len: path.len(),
                        });
                    }
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn get(&self, prefix: &IpNet) -> Option<&PrefixOrigin> {
        self.routes.get(prefix)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&IpNet, &PrefixOrigin)> {
        self.routes.iter()
    }

    /// Rough working-set estimate in bytes, used for the memory advisory.
    pub fn estimated_memory_bytes(&self) -> u64 {
        // key (IpNet, 24 bytes), value (16 bytes), plus hash table slack
        (self.routes.capacity() as u64) * 48
    }
}
