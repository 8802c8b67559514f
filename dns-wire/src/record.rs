use crate::{encode_name, Class, Result, Type};
use std::fmt;
use std::net::Ipv4Addr;
use tracing::{instrument, trace};

/// The answer, authority and additional sections all share the same
/// format: a variable number of [`ResourceRecord`]s, RFC1035 §4.1.3.
#[derive(Clone, Debug, PartialEq)]
pub struct ResourceRecord {
    /// The domain name to which this resource record pertains.
    pub name: String,

    /// The type and typed payload of the resource record.
    pub data: RData,

    /// The class of the data in the `data` field.
    pub class: Class,

    /// Seconds the record may be cached before it should be discarded.
    /// Zero means the record is for the transaction in progress only.
    pub ttl: u32,
}

impl ResourceRecord {
    pub fn new(name: &str, data: RData) -> Self {
        Self {
            name: name.to_string(),
            data,
            class: Class::IN,
            ttl: 0,
        }
    }

    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = ttl;
        self
    }

    #[instrument(skip(buf))]
    pub(crate) fn to_bytes(&self, buf: &mut Vec<u8>) -> Result<usize> {
        // Compression is never emitted; names are written in full.
        let mut byte_count = encode_name(&self.name, buf)?;

        buf.extend_from_slice(&u16::from(self.data.r_type()).to_be_bytes());
        byte_count += 2;
        byte_count += self.class.to_bytes(buf);
        buf.extend_from_slice(&self.ttl.to_be_bytes());
        byte_count += 4;

        // The rdata length is only known once the payload is rendered, so
        // it goes through a scratch buffer.
        let mut rdata: Vec<u8> = Vec::with_capacity(255);
        let rdlength = self.data.to_bytes(&mut rdata)?;
        buf.extend_from_slice(&(rdlength as u16).to_be_bytes());
        buf.extend(rdata);
        byte_count += 2 + rdlength;

        trace!("Wrote {} bytes", byte_count);

        Ok(byte_count)
    }
}

/// The typed payload of a [`ResourceRecord`]. The shape follows the
/// record type: an A record always carries an address, NS and CNAME
/// always carry a host name.
#[derive(Clone, Debug, PartialEq)]
pub enum RData {
    /// RFC1035 - (1) a host address.
    A(Ipv4Addr),

    /// RFC1035 - (2) the host name of an authoritative name server.
    NS(String),

    /// RFC1035 - (5) the canonical name for an alias.
    CNAME(String),

    /// Any other type: the rfc1035 type code and the undecoded payload.
    Raw(u16, Vec<u8>),
}

impl RData {
    pub(crate) fn r_type(&self) -> Type {
        match self {
            RData::A(_) => Type::A,
            RData::NS(_) => Type::NS,
            RData::CNAME(_) => Type::CNAME,
            RData::Raw(code, _) => Type::Unknown(*code),
        }
    }

    #[instrument(skip(buf))]
    fn to_bytes(&self, buf: &mut Vec<u8>) -> Result<usize> {
        trace!("Writing {}", self);

        match self {
            RData::A(v4) => {
                buf.extend_from_slice(&v4.octets());
                Ok(4)
            }
            RData::NS(host) => encode_name(host, buf),
            RData::CNAME(host) => encode_name(host, buf),
            RData::Raw(_, bytes) => {
                buf.extend_from_slice(bytes);
                Ok(bytes.len())
            }
        }
    }
}

impl fmt::Display for RData {
    fn fmt(&self, f: &mut fmt::Formatter) -> std::result::Result<(), fmt::Error> {
        match self {
            Self::A(v4) => write!(f, "A({})", v4),
            Self::NS(host) => write!(f, "NS({})", host),
            Self::CNAME(host) => write!(f, "CNAME({})", host),
            Self::Raw(code, bytes) => write!(f, "Raw({}: {} bytes)", code, bytes.len()),
        }
    }
}
