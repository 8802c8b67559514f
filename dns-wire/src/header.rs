use crate::{Message, Result, WireError};
use tracing::{instrument, trace};

/// The DNS message header as per RFC1035 §4.1.1. The z bit and the
/// RFC2535 ad/cd bits are skipped on decode and written as zero.
#[derive(Debug, Default, PartialEq)]
pub struct Header {
    /// RFC1035 - A 16 bit identifier assigned by the program that
    /// generates any kind of query. This identifier is copied into the
    /// corresponding reply and can be used by the requester to match up
    /// replies to outstanding queries.
    pub id: u16,

    /// Whether this message is a query (false) or a response (true).
    pub qr: bool,

    /// The kind of query in this message.
    pub opcode: OpCode,

    /// Authoritative Answer - the responding name server is an authority
    /// for the domain name in the question section.
    pub aa: bool,

    /// TrunCation - the message was cut to fit the transmission channel.
    pub tc: bool,

    /// Recursion Desired - directs the name server to pursue the query
    /// recursively. An iterative resolver always leaves this clear.
    pub rd: bool,

    /// Recursion Available - set in responses by servers willing to
    /// recurse.
    pub ra: bool,

    /// Response code.
    pub rcode: RCode,
}

impl Header {
    #[instrument(skip(buf))]
    pub(crate) fn to_bytes(&self, message: &Message, buf: &mut Vec<u8>) -> Result<usize> {
        buf.extend_from_slice(&self.id.to_be_bytes());

        let mut val = 0u8;
        if self.qr {
            val |= 1 << 7;
        }
        val |= self.opcode.as_u8()? << 3;
        if self.aa {
            val |= 1 << 2;
        }
        if self.tc {
            val |= 1 << 1;
        }
        if self.rd {
            val |= 1;
        }
        buf.push(val);

        val = 0;
        if self.ra {
            val |= 1 << 7;
        }
        val |= self.rcode.as_u8();
        buf.push(val);

        buf.extend_from_slice(&(message.questions.len() as u16).to_be_bytes());
        buf.extend_from_slice(&(message.answers.len() as u16).to_be_bytes());
        buf.extend_from_slice(&(message.authorities.len() as u16).to_be_bytes());
        buf.extend_from_slice(&(message.additionals.len() as u16).to_be_bytes());

        trace!("Wrote 12 bytes");

        Ok(12)
    }
}

/// A four bit field that specifies the kind of query in this message.
#[derive(Debug, Default, PartialEq)]
pub enum OpCode {
    /// A standard query.
    #[default]
    Query,

    /// An inverse query.
    IQuery,

    /// A server status request.
    Status,

    /// An unknown OpCode (contained within).
    Unknown(u8),
}

impl OpCode {
    pub(crate) fn as_u8(&self) -> Result<u8> {
        match self {
            OpCode::Query => Ok(0),
            OpCode::IQuery => Ok(1),
            OpCode::Status => Ok(2),
            OpCode::Unknown(opcode) if *opcode > 0xf => Err(WireError::ReservedOpCode),
            OpCode::Unknown(opcode) => Ok(*opcode),
        }
    }

    pub(crate) fn from_u8(val: u8) -> Self {
        match val {
            0 => OpCode::Query,
            1 => OpCode::IQuery,
            2 => OpCode::Status,
            n => OpCode::Unknown(n),
        }
    }
}

/// Response code - set as part of responses. [`RCode::NameError`] is
/// NXDOMAIN: the queried name does not exist in the zone.
#[derive(Debug, Default, PartialEq)]
pub enum RCode {
    /// No error condition.
    #[default]
    NoError,

    /// The name server was unable to interpret the query.
    FormatError,

    /// The name server was unable to process this query due to a problem
    /// with the name server.
    ServerFailure,

    /// Meaningful only for responses from an authoritative name server:
    /// the domain name referenced in the query does not exist.
    NameError,

    /// The name server does not support the requested kind of query.
    NotImplemented,

    /// The name server refuses to perform the specified operation for
    /// policy reasons.
    Refused,

    /// The response code was unknown (contained within).
    Unknown(u8),
}

impl RCode {
    pub(crate) fn as_u8(&self) -> u8 {
        match self {
            RCode::NoError => 0,
            RCode::FormatError => 1,
            RCode::ServerFailure => 2,
            RCode::NameError => 3,
            RCode::NotImplemented => 4,
            RCode::Refused => 5,
            RCode::Unknown(i) => *i,
        }
    }

    pub(crate) fn from_u8(val: u8) -> Self {
        match val {
            0 => RCode::NoError,
            1 => RCode::FormatError,
            2 => RCode::ServerFailure,
            3 => RCode::NameError,
            4 => RCode::NotImplemented,
            5 => RCode::Refused,
            n => RCode::Unknown(n),
        }
    }
}
