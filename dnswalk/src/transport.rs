use bytes::BytesMut;
use dns_wire::{encode_question, Message, RCode, RData, ResourceRecord, Type};
use std::io;
use std::net::{Ipv4Addr, UdpSocket};
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// The most a reply datagram is expected to carry.
const MAX_DATAGRAM: usize = 8192;

/// The outcome of one query to one server.
#[derive(Debug, PartialEq)]
pub enum ResolutionOutcome {
    /// Usable records: the first answer-section A or CNAME record, or
    /// the additional-section A glue for a delegation.
    Answer(Vec<ResourceRecord>),

    /// The server answered NXDOMAIN: the name does not exist.
    NameError,

    /// Timeout, transaction mismatch, unusable reply, or a transport
    /// error. Recoverable - the resolver moves on to the next candidate.
    NoResponse,
}

/// One blocking UDP socket reused for every query of a session. The
/// transport sends exactly one datagram and waits once; retrying across
/// servers is the resolver's job.
#[derive(Debug)]
pub struct QueryTransport {
    socket: UdpSocket,
    port: u16,
}

impl QueryTransport {
    /// Binds an ephemeral local socket. `port` is the destination port
    /// for every query - 53 against the real hierarchy.
    pub fn new(timeout: Duration, port: u16) -> io::Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.set_read_timeout(Some(timeout))?;
        Ok(Self { socket, port })
    }

    /// Sends one query for `name` to `server` and classifies the reply.
    #[instrument(skip(self))]
    pub fn exchange(&self, server: Ipv4Addr, name: &str, q_type: Type) -> ResolutionOutcome {
        let (id, query) = match encode_question(name, q_type) {
            Ok(built) => built,
            Err(e) => {
                warn!("could not encode query for {}: {}", name, e);
                return ResolutionOutcome::NoResponse;
            }
        };

        if let Err(e) = self.socket.send_to(&query, (server, self.port)) {
            warn!("send to {} failed: {}", server, e);
            return ResolutionOutcome::NoResponse;
        }

        let mut buf = BytesMut::zeroed(MAX_DATAGRAM);
        let len = match self.socket.recv_from(&mut buf) {
            Ok((len, _)) => len,
            Err(e) => {
                debug!("no reply from {}: {}", server, e);
                return ResolutionOutcome::NoResponse;
            }
        };

        let reply = match Message::from_bytes(&buf[..len]) {
            Ok(message) => message,
            Err(e) => {
                warn!("discarding malformed reply from {}: {}", server, e);
                return ResolutionOutcome::NoResponse;
            }
        };

        if reply.header.id != id {
            warn!(
                "unmatched transaction from {}: sent {}, got {}",
                server, id, reply.header.id
            );
            return ResolutionOutcome::NoResponse;
        }

        match &reply.header.rcode {
            RCode::NoError => {}
            RCode::NameError => {
                debug!("{} does not exist according to {}", name, server);
                return ResolutionOutcome::NameError;
            }
            rcode => {
                warn!("query for {} failed at {}: {:?}", name, server, rcode);
                return ResolutionOutcome::NoResponse;
            }
        }

        // A direct answer wins outright. Only the first A or CNAME is
        // surfaced, even when the section holds several.
        for rr in reply.answers {
            if matches!(rr.data, RData::A(_) | RData::CNAME(_)) {
                return ResolutionOutcome::Answer(vec![rr]);
            }
        }

        // Otherwise treat the reply as a referral: collect the A glue
        // for the name servers listed in the authority section.
        let glue = reply
            .additionals
            .into_iter()
            .filter(|rr| matches!(rr.data, RData::A(_)))
            .collect();
        ResolutionOutcome::Answer(glue)
    }
}
