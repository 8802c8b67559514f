use crate::cache::{CacheEntry, ResolveCache};
use crate::transport::{QueryTransport, ResolutionOutcome};
use dns_wire::{RData, ResourceRecord, Type};
use std::net::Ipv4Addr;
use tracing::{debug, info, instrument, warn};

/// How many CNAME targets a single resolution follows before giving up
/// on the chain as pathological.
const MAX_ALIAS_HOPS: usize = 8;

/// Everything one resolution produced: the ordered trace of servers
/// asked, the terminal outcome, and the last alias target followed.
#[derive(Debug)]
pub struct Resolution {
    pub path: Vec<String>,
    pub outcome: Resolved,
    pub alias: Option<String>,
}

/// The terminal state of a resolution.
#[derive(Debug, PartialEq)]
pub enum Resolved {
    /// The name resolved to these A records.
    Addresses(Vec<ResourceRecord>),

    /// An authoritative server answered NXDOMAIN.
    NonExistent,

    /// Some hop went completely unanswered, so nothing authoritative was
    /// learned either way.
    Incomplete,
}

/// What one delegation walk for a single name ended with.
enum Walk {
    Answered(Vec<ResourceRecord>),
    Alias(String),
    NonExistent,
    Incomplete,
}

/// Walks the delegation hierarchy down from a root server, one query at
/// a time, and remembers terminal outcomes in its cache.
pub struct Resolver {
    transport: QueryTransport,
    cache: ResolveCache,
    root: Ipv4Addr,
}

impl Resolver {
    pub fn new(transport: QueryTransport, root: Ipv4Addr) -> Self {
        Self {
            transport,
            cache: ResolveCache::new(),
            root,
        }
    }

    pub fn cache(&self) -> &ResolveCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut ResolveCache {
        &mut self.cache
    }

    /// Resolves `domain`, following aliases as they appear. Never fails:
    /// servers that do not answer are skipped, and an unreachable
    /// hierarchy yields [`Resolved::Incomplete`].
    #[instrument(skip(self))]
    pub fn resolve(&mut self, domain: &str) -> Resolution {
        let mut path = Vec::new();
        let mut alias = None;
        let mut chain = vec![domain.to_string()];
        let mut target = domain.to_string();

        for _ in 0..=MAX_ALIAS_HOPS {
            if let Some(entry) = self.cache.lookup(&target) {
                let entry = entry.clone();
                path.push(format!("cache: queried for {}", target));
                // Aliases that funneled into this target share its
                // terminal state.
                for name in chain.iter().filter(|name| name.as_str() != target) {
                    self.cache.store(name, entry.clone());
                }
                let outcome = match entry {
                    CacheEntry::Records(records) => Resolved::Addresses(records),
                    CacheEntry::NonExistent => Resolved::NonExistent,
                };
                return Resolution { path, outcome, alias };
            }

            match self.walk(&target, &mut path) {
                Walk::Answered(records) => {
                    for name in &chain {
                        self.cache.store(name, CacheEntry::Records(records.clone()));
                    }
                    return Resolution {
                        path,
                        outcome: Resolved::Addresses(records),
                        alias,
                    };
                }
                Walk::NonExistent => {
                    for name in &chain {
                        self.cache.store(name, CacheEntry::NonExistent);
                    }
                    return Resolution {
                        path,
                        outcome: Resolved::NonExistent,
                        alias,
                    };
                }
                Walk::Incomplete => {
                    return Resolution {
                        path,
                        outcome: Resolved::Incomplete,
                        alias,
                    };
                }
                Walk::Alias(next) => {
                    let next = next.trim_end_matches('.').to_string();
                    info!("{} is an alias for {}", target, next);
                    alias = Some(next.clone());
                    chain.push(next.clone());
                    target = next;
                }
            }
        }

        warn!(
            "alias chain for {} exceeded {} hops, giving up",
            domain, MAX_ALIAS_HOPS
        );
        Resolution {
            path,
            outcome: Resolved::Incomplete,
            alias,
        }
    }

    /// One label-by-label walk for a single name. Ends early on an alias
    /// or an authoritative "does not exist"; an exhausted frontier ends
    /// the walk inconclusively.
    fn walk(&mut self, name: &str, path: &mut Vec<String>) -> Walk {
        let mut frontier: Vec<ResourceRecord> = Vec::new();

        for (hop, qname) in query_sequence(name).iter().enumerate() {
            // The root is asked for the name servers of the top label.
            // Every later hop is asked for addresses and answers with
            // either the glue for the next delegation or the records
            // themselves.
            let (candidates, q_type) = if hop == 0 {
                (vec![("root server".to_string(), self.root)], Type::NS)
            } else {
                let servers = frontier
                    .iter()
                    .filter_map(|rr| match rr.data {
                        RData::A(addr) => Some((rr.name.clone(), addr)),
                        _ => None,
                    })
                    .collect();
                (servers, Type::A)
            };

            let mut advanced = false;
            for (server, addr) in candidates {
                let outcome = self.transport.exchange(addr, qname, q_type);
                path.push(format!("{} ({}) <-- queried for {}", server, addr, qname));

                match outcome {
                    ResolutionOutcome::NoResponse => continue,
                    ResolutionOutcome::NameError => return Walk::NonExistent,
                    ResolutionOutcome::Answer(records) => {
                        if records.is_empty() {
                            debug!("{} had nothing usable for {}", server, qname);
                            continue;
                        }
                        if let [only] = records.as_slice() {
                            if let RData::CNAME(cname_target) = &only.data {
                                return Walk::Alias(cname_target.clone());
                            }
                        }
                        debug!("delegation for {} now {} server(s)", qname, records.len());
                        frontier = records;
                        advanced = true;
                        break;
                    }
                }
            }

            if !advanced {
                debug!("no server answered for {}", qname);
                return Walk::Incomplete;
            }
        }

        Walk::Answered(frontier)
    }
}

/// Builds the progressively-qualified names queried while walking down
/// from the top-level label: `www.gvsu.net` gives `net`, `gvsu.net`,
/// `www.gvsu.net`.
fn query_sequence(domain: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut suffix = String::new();
    for label in domain.rsplit('.') {
        if suffix.is_empty() {
            suffix = label.to_string();
        } else {
            suffix = format!("{}.{}", label, suffix);
        }
        names.push(suffix.clone());
    }
    names
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::testutil::{self, Reply, ZoneServer};
    use std::time::Duration;

    fn resolver_for(server: &ZoneServer) -> Resolver {
        let transport = QueryTransport::new(Duration::from_millis(250), server.port).unwrap();
        Resolver::new(transport, server.addr)
    }

    /// root -> .com -> example.com, all served by one scripted zone
    /// server with glue pointing back at localhost.
    fn example_com_script() -> Vec<((String, Type), Reply)> {
        vec![
            (
                ("com".to_string(), Type::NS),
                Reply::Records {
                    answers: vec![],
                    authorities: vec![testutil::ns("com", "a.gtld-servers.net")],
                    additionals: vec![testutil::a("a.gtld-servers.net", [127, 0, 0, 1])],
                },
            ),
            (
                ("example.com".to_string(), Type::A),
                Reply::Records {
                    answers: vec![],
                    authorities: vec![testutil::ns("example.com", "ns1.example.com")],
                    additionals: vec![testutil::a("ns1.example.com", [127, 0, 0, 1])],
                },
            ),
            (
                ("www.example.com".to_string(), Type::A),
                Reply::Records {
                    answers: vec![testutil::a("www.example.com", [93, 184, 216, 34])],
                    authorities: vec![],
                    additionals: vec![],
                },
            ),
        ]
    }

    #[test]
    fn test_query_sequence() {
        assert_eq!(
            query_sequence("www.gvsu.net"),
            vec!["net".to_string(), "gvsu.net".to_string(), "www.gvsu.net".to_string()]
        );
        assert_eq!(query_sequence("com"), vec!["com".to_string()]);
    }

    #[test]
    fn test_walks_delegation_to_terminal_address() {
        testutil::setup();
        let server = ZoneServer::spawn(example_com_script());
        let mut resolver = resolver_for(&server);

        let resolution = resolver.resolve("www.example.com");

        assert_eq!(resolution.path.len(), 3);
        assert_eq!(
            resolution.path[0],
            format!("root server ({}) <-- queried for com", server.addr)
        );
        assert_eq!(
            resolution.path[1],
            format!("a.gtld-servers.net ({}) <-- queried for example.com", server.addr)
        );
        assert_eq!(
            resolution.path[2],
            format!("ns1.example.com ({}) <-- queried for www.example.com", server.addr)
        );
        assert_eq!(
            resolution.outcome,
            Resolved::Addresses(vec![testutil::a("www.example.com", [93, 184, 216, 34])])
        );
        assert_eq!(resolution.alias, None);
        assert!(resolver.cache().lookup("www.example.com").is_some());
    }

    #[test]
    fn test_second_resolution_is_served_from_cache() {
        testutil::setup();
        let server = ZoneServer::spawn(example_com_script());
        let mut resolver = resolver_for(&server);

        let first = resolver.resolve("www.example.com");
        let queries_after_first = server.query_count();

        let second = resolver.resolve("www.example.com");

        // No network I/O on the second call.
        assert_eq!(server.query_count(), queries_after_first);
        assert_eq!(second.path, vec!["cache: queried for www.example.com".to_string()]);
        assert_eq!(second.outcome, first.outcome);
    }

    #[test]
    fn test_nxdomain_stops_the_walk() {
        testutil::setup();
        let server = ZoneServer::spawn(vec![
            (
                ("com".to_string(), Type::NS),
                Reply::Records {
                    answers: vec![],
                    authorities: vec![testutil::ns("com", "a.gtld-servers.net")],
                    additionals: vec![testutil::a("a.gtld-servers.net", [127, 0, 0, 1])],
                },
            ),
            (("nope.com".to_string(), Type::A), Reply::Nxdomain),
        ]);
        let mut resolver = resolver_for(&server);

        let resolution = resolver.resolve("www.nope.com");

        assert_eq!(resolution.outcome, Resolved::NonExistent);
        // The walk stopped at the second hop - www.nope.com was never
        // queried.
        assert_eq!(resolution.path.len(), 2);
        assert_eq!(server.query_count(), 2);
        assert_eq!(
            resolver.cache().lookup("www.nope.com"),
            Some(&CacheEntry::NonExistent)
        );
    }

    #[test]
    fn test_alias_is_chased_to_the_canonical_name() {
        testutil::setup();
        let mut script = example_com_script();
        // www.example.com is an alias instead of an address.
        script[2] = (
            ("www.example.com".to_string(), Type::A),
            Reply::Records {
                answers: vec![testutil::cname("www.example.com", "canonical.example.net")],
                authorities: vec![],
                additionals: vec![],
            },
        );
        script.extend(vec![
            (
                ("net".to_string(), Type::NS),
                Reply::Records {
                    answers: vec![],
                    authorities: vec![testutil::ns("net", "x.gtld-servers.net")],
                    additionals: vec![testutil::a("x.gtld-servers.net", [127, 0, 0, 1])],
                },
            ),
            (
                ("example.net".to_string(), Type::A),
                Reply::Records {
                    answers: vec![],
                    authorities: vec![testutil::ns("example.net", "ns1.example.net")],
                    additionals: vec![testutil::a("ns1.example.net", [127, 0, 0, 1])],
                },
            ),
            (
                ("canonical.example.net".to_string(), Type::A),
                Reply::Records {
                    answers: vec![testutil::a("canonical.example.net", [93, 184, 216, 34])],
                    authorities: vec![],
                    additionals: vec![],
                },
            ),
        ]);
        let server = ZoneServer::spawn(script);
        let mut resolver = resolver_for(&server);

        let resolution = resolver.resolve("www.example.com");

        assert_eq!(resolution.alias, Some("canonical.example.net".to_string()));
        assert_eq!(
            resolution.outcome,
            Resolved::Addresses(vec![testutil::a("canonical.example.net", [93, 184, 216, 34])])
        );
        // Two full walks: three hops for the alias, three for the target.
        assert_eq!(resolution.path.len(), 6);

        // Both the alias and the canonical name are now cached, so either
        // resolves with no further network I/O.
        let queries = server.query_count();
        let direct = resolver.resolve("canonical.example.net");
        assert_eq!(server.query_count(), queries);
        assert_eq!(direct.path, vec!["cache: queried for canonical.example.net".to_string()]);
        let again = resolver.resolve("www.example.com");
        assert_eq!(server.query_count(), queries);
        assert_eq!(again.outcome, resolution.outcome);
    }

    #[test]
    fn test_unresponsive_frontier_ends_inconclusively() {
        testutil::setup();
        let server = ZoneServer::spawn(vec![
            (
                ("com".to_string(), Type::NS),
                Reply::Records {
                    answers: vec![],
                    authorities: vec![
                        testutil::ns("com", "a.gtld-servers.net"),
                        testutil::ns("com", "b.gtld-servers.net"),
                    ],
                    additionals: vec![
                        testutil::a("a.gtld-servers.net", [127, 0, 0, 1]),
                        testutil::a("b.gtld-servers.net", [127, 0, 0, 1]),
                    ],
                },
            ),
            (("example.com".to_string(), Type::A), Reply::Silent),
        ]);
        let mut resolver = resolver_for(&server);

        let resolution = resolver.resolve("www.example.com");

        // Both candidates were tried before giving up, and the failure is
        // not the NXDOMAIN sentinel.
        assert_eq!(resolution.path.len(), 3);
        assert_eq!(resolution.outcome, Resolved::Incomplete);
        assert!(resolver.cache().lookup("www.example.com").is_none());
    }

    #[test]
    fn test_mismatched_transaction_id_ends_inconclusively() {
        testutil::setup();
        let server = ZoneServer::spawn(vec![(("com".to_string(), Type::NS), Reply::WrongId)]);
        let mut resolver = resolver_for(&server);

        let resolution = resolver.resolve("com");

        assert_eq!(resolution.outcome, Resolved::Incomplete);
        assert_eq!(resolution.path.len(), 1);
    }

    #[test]
    fn test_alias_loop_is_bounded() {
        testutil::setup();
        let server = ZoneServer::spawn(vec![
            (
                ("com".to_string(), Type::NS),
                Reply::Records {
                    answers: vec![],
                    authorities: vec![testutil::ns("com", "a.gtld-servers.net")],
                    additionals: vec![testutil::a("a.gtld-servers.net", [127, 0, 0, 1])],
                },
            ),
            (
                ("a.com".to_string(), Type::A),
                Reply::Records {
                    answers: vec![testutil::cname("a.com", "b.com")],
                    authorities: vec![],
                    additionals: vec![],
                },
            ),
            (
                ("b.com".to_string(), Type::A),
                Reply::Records {
                    answers: vec![testutil::cname("b.com", "a.com")],
                    authorities: vec![],
                    additionals: vec![],
                },
            ),
        ]);
        let mut resolver = resolver_for(&server);

        let resolution = resolver.resolve("a.com");

        // The chase terminates instead of ping-ponging forever.
        assert_eq!(resolution.outcome, Resolved::Incomplete);
        assert!(resolution.alias.is_some());
    }
}
