mod builder;
mod error;
mod header;
mod message;
mod parser;
mod question;
mod record;

use tracing::instrument;

pub use builder::MessageBuilder;
pub use error::WireError;
pub use header::{Header, OpCode, RCode};
pub use message::Message;
pub use question::{Class, Question, Type};
pub use record::{RData, ResourceRecord};

type Result<T> = std::result::Result<T, WireError>;

/// Builds a one-question query for `name` with the recursion-desired bit
/// cleared, the way an iterative resolver asks. The fresh transaction id
/// is returned alongside the bytes so the caller can match the reply.
pub fn encode_question(name: &str, q_type: Type) -> Result<(u16, Vec<u8>)> {
    let id = rand::random::<u16>();
    let message = MessageBuilder::new()
        .id(id)
        .question(Question::new(name, q_type))
        .build();
    let mut buf = Vec::with_capacity(64);
    message.to_bytes(&mut buf)?;
    Ok((id, buf))
}

/// Writes `s` as length-prefixed labels followed by the root terminator,
/// returning the number of bytes written.
#[instrument(skip(buf))]
pub(crate) fn encode_name(s: &str, buf: &mut Vec<u8>) -> Result<usize> {
    let mut byte_count = 0;
    for label in s.split('.') {
        if label.len() > 63 {
            return Err(WireError::LabelTooLong(label.len(), label.to_string()));
        }
        buf.push(label.len() as u8);
        buf.extend_from_slice(label.as_bytes());
        byte_count += 1 + label.len();
    }
    buf.push(0);
    byte_count += 1;
    Ok(byte_count)
}

#[cfg(test)]
mod test {
    use std::sync::Once;

    static INIT: Once = Once::new();

    pub fn setup() {
        INIT.call_once(|| {
            tracing_subscriber::fmt::init();
        });
    }

    #[test]
    fn test_encode_question() {
        setup();

        use crate::{encode_question, Message, Type};

        let (id, bytes) = encode_question("www.example.com", Type::NS).unwrap();
        let message = Message::from_bytes(&bytes).unwrap();

        assert_eq!(message.header.id, id);
        assert!(!message.header.qr);
        assert!(!message.header.rd);
        assert_eq!(message.questions.len(), 1);
        assert_eq!(message.questions[0].q_name, "www.example.com");
        assert_eq!(message.questions[0].q_type, Type::NS);
        assert_eq!(message.answers.len(), 0);
        assert_eq!(message.authorities.len(), 0);
        assert_eq!(message.additionals.len(), 0);
    }
}
