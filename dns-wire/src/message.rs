use crate::{parser, Header, Question, ResourceRecord, Result};
use std::fmt;
use tracing::{instrument, trace};

/// A complete DNS message: the header plus the question, answer,
/// authority and additional sections, RFC1035 §4.1.
#[derive(Debug, PartialEq)]
pub struct Message {
    pub header: Header,
    pub questions: Vec<Question>,
    pub answers: Vec<ResourceRecord>,
    pub authorities: Vec<ResourceRecord>,
    pub additionals: Vec<ResourceRecord>,
}

impl Message {
    /// Reads the buffer and parses the DNS message from it.
    ///
    /// This includes dereferencing rfc1035 message compression pointers
    /// and collapsing names into dotted strings. Malformed or truncated
    /// input fails with [`crate::WireError`] - it is never treated as an
    /// empty message.
    #[instrument(skip(input))]
    pub fn from_bytes(input: &[u8]) -> Result<Message> {
        let (_, message) = parser::read_message(input)?;

        trace!("Read input as: {}", message);

        Ok(message)
    }

    /// Serializes the message to bytes into the provided buffer,
    /// returning the number of bytes written.
    #[instrument(skip(buf))]
    pub fn to_bytes(&self, buf: &mut Vec<u8>) -> Result<usize> {
        let mut byte_count = self.header.to_bytes(self, buf)?;
        for q in self.questions.iter() {
            byte_count += q.to_bytes(buf)?;
        }
        for rr in self.answers.iter() {
            byte_count += rr.to_bytes(buf)?;
        }
        for rr in self.authorities.iter() {
            byte_count += rr.to_bytes(buf)?;
        }
        for rr in self.additionals.iter() {
            byte_count += rr.to_bytes(buf)?;
        }

        trace!("Wrote {} bytes", byte_count);

        Ok(byte_count)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> std::result::Result<(), fmt::Error> {
        write!(f, "Message(id:{}) - ", self.header.id)?;
        write!(f, "Query [")?;
        for (i, q) in self.questions.iter().enumerate() {
            if i != 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}({})", q.q_name, q.q_type)?;
        }
        write!(f, "]")?;
        if self.header.qr {
            write!(f, " - Response [")?;
            for (i, rr) in self.answers.iter().enumerate() {
                if i != 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{} => {}", rr.name, rr.data)?;
            }
            write!(f, "]")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use crate::test::setup;

    #[test]
    fn test_to_bytes_from_bytes() {
        setup();

        use crate::{Message, MessageBuilder, OpCode, Question, RCode, RData, ResourceRecord, Type};
        use std::net::Ipv4Addr;

        let message = MessageBuilder::new()
            .id(1234)
            .response(true)
            .authoritative(true)
            .opcode(OpCode::Status)
            .rcode(RCode::ServerFailure)
            .question(Question::new("www.example.com", Type::A))
            .answer(
                ResourceRecord::new("www.example.com", RData::A(Ipv4Addr::new(93, 184, 216, 34)))
                    .with_ttl(5678),
            )
            .answer(
                ResourceRecord::new("www.example.com", RData::A(Ipv4Addr::new(93, 184, 216, 35)))
                    .with_ttl(5678),
            )
            .build();

        let mut buf = Vec::new();
        let message_len = message.to_bytes(&mut buf).unwrap();
        let message2 = Message::from_bytes(&buf[0..message_len]).unwrap();

        assert_eq!(message, message2);
    }

    #[test]
    fn test_referral_round_trip() {
        setup();

        use crate::{Message, MessageBuilder, Question, RData, ResourceRecord, Type};
        use std::net::Ipv4Addr;

        let message = MessageBuilder::new()
            .id(4242)
            .response(true)
            .question(Question::new("example.com", Type::A))
            .authority(
                ResourceRecord::new("example.com", RData::NS("ns1.example.com".to_string()))
                    .with_ttl(172800),
            )
            .additional(
                ResourceRecord::new("ns1.example.com", RData::A(Ipv4Addr::new(192, 0, 2, 1)))
                    .with_ttl(172800),
            )
            .build();

        let mut buf = Vec::with_capacity(1024);
        let len = message.to_bytes(&mut buf).unwrap();
        let message2 = Message::from_bytes(&buf[0..len]).unwrap();

        assert_eq!(message, message2);
    }
}
