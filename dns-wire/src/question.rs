use crate::{encode_name, Result};
use std::fmt;
use tracing::{instrument, trace};

/// The question section carries the parameters of the query - what is
/// being asked, RFC1035 §4.1.2.
#[derive(Debug, PartialEq)]
pub struct Question {
    /// The domain name being asked about, as a dotted string.
    pub q_name: String,

    /// A two octet code which specifies the type of the query.
    pub q_type: Type,

    /// A two octet code that specifies the class of the query.
    pub q_class: Class,
}

impl Question {
    pub fn new(name: &str, q_type: Type) -> Self {
        Self {
            q_name: name.to_string(),
            q_type,
            q_class: Class::IN,
        }
    }

    #[instrument(skip(buf))]
    pub(crate) fn to_bytes(&self, buf: &mut Vec<u8>) -> Result<usize> {
        let mut byte_count = encode_name(&self.q_name, buf)?;
        byte_count += self.q_type.to_bytes(buf);
        byte_count += self.q_class.to_bytes(buf);

        trace!("Wrote {} bytes", byte_count);

        Ok(byte_count)
    }
}

/// The record types the resolver interprets. Everything else is carried
/// opaquely under [`Type::Unknown`] with its raw type code.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Type {
    /// RFC1035 - (1) a host address.
    #[default]
    A,

    /// RFC1035 - (2) an authoritative name server.
    NS,

    /// RFC1035 - (5) the canonical name for an alias.
    CNAME,

    /// Any other type - the code is contained within.
    Unknown(u16),
}

impl Type {
    fn to_bytes(&self, buf: &mut Vec<u8>) -> usize {
        buf.extend_from_slice(&u16::from(*self).to_be_bytes());
        2
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> std::result::Result<(), fmt::Error> {
        match self {
            Self::A => write!(f, "A"),
            Self::NS => write!(f, "NS"),
            Self::CNAME => write!(f, "CNAME"),
            Self::Unknown(i) => write!(f, "TYPE{}", i),
        }
    }
}

impl From<Type> for u16 {
    fn from(t: Type) -> u16 {
        match t {
            Type::A => 1,
            Type::NS => 2,
            Type::CNAME => 5,
            Type::Unknown(i) => i,
        }
    }
}

impl From<u16> for Type {
    fn from(val: u16) -> Self {
        match val {
            1 => Type::A,
            2 => Type::NS,
            5 => Type::CNAME,
            _ => Type::Unknown(val),
        }
    }
}

/// The class of a record - IN for everything this resolver touches. OPT
/// pseudo-records reuse the field for the sender's UDP payload size,
/// which lands here as [`Class::Unknown`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Class {
    /// RFC1035 - (1) the Internet.
    #[default]
    IN,

    /// Any other class - the value is contained within.
    Unknown(u16),
}

impl Class {
    pub(crate) fn to_bytes(&self, buf: &mut Vec<u8>) -> usize {
        let val = match self {
            Class::IN => 1u16,
            Class::Unknown(i) => *i,
        };
        buf.extend_from_slice(&val.to_be_bytes());
        2
    }
}

impl From<u16> for Class {
    fn from(val: u16) -> Self {
        match val {
            1 => Class::IN,
            _ => Class::Unknown(val),
        }
    }
}
