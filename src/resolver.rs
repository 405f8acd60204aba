use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::proto::rr::RData;
use hickory_resolver::TokioAsyncResolver;
use log::debug;
use std::net::IpAddr;

/// One network address paired with the DNS name that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedHost {
    pub address: String,
    pub hostname: String,
}

/// Expands input hostnames into the set of (address, hostname) pairs that
/// answer for them.
///
/// Resolution fails soft: any DNS error yields an empty set rather than an
/// error, so a dead hostname simply produces no scan targets.
#[derive(Clone)]
pub struct Resolver {
    resolver: TokioAsyncResolver,
}

impl Resolver {
    pub fn new() -> Self {
        Resolver {
            resolver: TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default()),
        }
    }

    /// Resolves `hostname` and pairs every alias in its CNAME chain with an
    /// address, finishing with the canonical name paired to the last address.
    ///
    /// Aliases beyond the address list collapse onto the final address.
    /// IP literals skip DNS and yield their single canonical pair.
    pub async fn resolve(&self, hostname: &str) -> Vec<ResolvedHost> {
        if let Ok(ip) = hostname.parse::<IpAddr>() {
            return vec![ResolvedHost {
                address: ip.to_string(),
                hostname: hostname.to_string(),
            }];
        }

        let lookup = match self.resolver.lookup_ip(hostname).await {
            Ok(lookup) => lookup,
            Err(err) => {
                debug!("DNS lookup for {} failed: {}", hostname, err);
                return Vec::new();
            }
        };

        let addresses: Vec<IpAddr> = lookup.iter().collect();

        // The alias list mirrors the CNAME chain: each record's owner name is
        // an alias, the final record's target is the canonical name. Hosts
        // without a CNAME have no aliases and are their own canonical name.
        let mut aliases = Vec::new();
        let mut canonical = hostname.trim_end_matches('.').to_string();
        for record in lookup.as_lookup().record_iter() {
            if let Some(RData::CNAME(target)) = record.data() {
                aliases.push(record.name().to_utf8().trim_end_matches('.').to_string());
                canonical = target.0.to_utf8().trim_end_matches('.').to_string();
            }
        }

        pair_aliases(&addresses, &aliases, &canonical)
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Pairs `aliases[i]` with `addresses[i]`, falling back to the last address
/// for overflow aliases, then appends the `(last address, canonical)` pair.
/// Zero addresses means nothing can be paired at all.
fn pair_aliases(addresses: &[IpAddr], aliases: &[String], canonical: &str) -> Vec<ResolvedHost> {
    let Some(last) = addresses.last() else {
        return Vec::new();
    };

    let mut pairs = Vec::with_capacity(aliases.len() + 1);
    for (i, alias) in aliases.iter().enumerate() {
        let address = nth_or_last(addresses, i).unwrap_or(last);
        pairs.push(ResolvedHost {
            address: address.to_string(),
            hostname: alias.clone(),
        });
    }
    pairs.push(ResolvedHost {
        address: last.to_string(),
        hostname: canonical.to_string(),
    });
    pairs
}

/// Bounds-checked accessor: the element at `index`, or the last element when
/// the index is out of range. `None` only for an empty slice.
fn nth_or_last<T>(items: &[T], index: usize) -> Option<&T> {
    items.get(index).or_else(|| items.last())
}
