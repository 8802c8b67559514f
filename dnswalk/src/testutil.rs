//! A scripted in-process zone server: enough of a DNS server to drive
//! the resolver end to end over real datagrams on localhost.

use dns_wire::{Message, MessageBuilder, Question, RCode, RData, ResourceRecord, Type};
use std::collections::HashMap;
use std::net::{Ipv4Addr, UdpSocket};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use std::thread;
use std::time::Duration;

static INIT: Once = Once::new();

pub fn setup() {
    INIT.call_once(|| {
        tracing_subscriber::fmt::init();
    });
}

/// What the server does when a scripted (name, qtype) question arrives.
/// Questions outside the script are ignored, which looks like a dead
/// server to the transport.
pub enum Reply {
    /// Respond NoError with these sections.
    Records {
        answers: Vec<ResourceRecord>,
        authorities: Vec<ResourceRecord>,
        additionals: Vec<ResourceRecord>,
    },

    /// Respond NXDOMAIN.
    Nxdomain,

    /// Never respond.
    Silent,

    /// Respond plausibly but under the wrong transaction id.
    WrongId,
}

pub struct ZoneServer {
    pub addr: Ipv4Addr,
    pub port: u16,
    queries: Arc<AtomicUsize>,
}

impl ZoneServer {
    /// Binds an ephemeral localhost port and serves the script from a
    /// background thread until no query arrives for a second.
    pub fn spawn(script: Vec<((String, Type), Reply)>) -> Self {
        let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
        socket
            .set_read_timeout(Some(Duration::from_secs(1)))
            .unwrap();
        let port = socket.local_addr().unwrap().port();
        let queries = Arc::new(AtomicUsize::new(0));

        let counter = queries.clone();
        let script: HashMap<(String, Type), Reply> = script.into_iter().collect();
        thread::spawn(move || {
            let mut buf = [0u8; 8192];
            while let Ok((len, from)) = socket.recv_from(&mut buf) {
                counter.fetch_add(1, Ordering::SeqCst);

                let query = Message::from_bytes(&buf[..len]).unwrap();
                let question = &query.questions[0];
                let key = (question.q_name.clone(), question.q_type);
                let Some(reply) = script.get(&key) else {
                    continue;
                };

                let id = match reply {
                    Reply::Silent => continue,
                    Reply::WrongId => query.header.id.wrapping_add(1),
                    _ => query.header.id,
                };
                let mut builder = MessageBuilder::new()
                    .id(id)
                    .response(true)
                    .question(Question::new(&key.0, key.1));
                match reply {
                    Reply::Records {
                        answers,
                        authorities,
                        additionals,
                    } => {
                        for rr in answers {
                            builder = builder.answer(rr.clone());
                        }
                        for rr in authorities {
                            builder = builder.authority(rr.clone());
                        }
                        for rr in additionals {
                            builder = builder.additional(rr.clone());
                        }
                    }
                    Reply::Nxdomain => {
                        builder = builder.rcode(RCode::NameError);
                    }
                    Reply::WrongId => {
                        builder = builder.answer(a(&key.0, [192, 0, 2, 99]));
                    }
                    Reply::Silent => unreachable!(),
                }

                let message = builder.build();
                let mut out = Vec::with_capacity(512);
                let len = message.to_bytes(&mut out).unwrap();
                socket.send_to(&out[..len], from).unwrap();
            }
        });

        Self {
            addr: Ipv4Addr::LOCALHOST,
            port,
            queries,
        }
    }

    /// Datagrams received so far, including ignored ones.
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

pub fn a(name: &str, octets: [u8; 4]) -> ResourceRecord {
    ResourceRecord::new(name, RData::A(Ipv4Addr::from(octets))).with_ttl(300)
}

pub fn ns(zone: &str, host: &str) -> ResourceRecord {
    ResourceRecord::new(zone, RData::NS(host.to_string())).with_ttl(300)
}

pub fn cname(name: &str, target: &str) -> ResourceRecord {
    ResourceRecord::new(name, RData::CNAME(target.to_string())).with_ttl(300)
}
