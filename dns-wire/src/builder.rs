use crate::{Header, Message, OpCode, Question, RCode, ResourceRecord};

/// Fluent construction of a [`Message`] - queries in the resolver,
/// fabricated responses in tests. Header flags default to zero.
#[derive(Debug, Default)]
pub struct MessageBuilder {
    id: u16,
    qr: bool,
    opcode: OpCode,
    aa: bool,
    rd: bool,
    ra: bool,
    rcode: RCode,
    questions: Vec<Question>,
    answers: Vec<ResourceRecord>,
    authorities: Vec<ResourceRecord>,
    additionals: Vec<ResourceRecord>,
}

impl MessageBuilder {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn build(self) -> Message {
        Message {
            header: Header {
                id: self.id,
                qr: self.qr,
                opcode: self.opcode,
                aa: self.aa,
                tc: false,
                rd: self.rd,
                ra: self.ra,
                rcode: self.rcode,
            },
            questions: self.questions,
            answers: self.answers,
            authorities: self.authorities,
            additionals: self.additionals,
        }
    }

    pub fn id(mut self, id: u16) -> Self {
        self.id = id;
        self
    }

    pub fn response(mut self, qr: bool) -> Self {
        self.qr = qr;
        self
    }

    pub fn opcode(mut self, opcode: OpCode) -> Self {
        self.opcode = opcode;
        self
    }

    pub fn authoritative(mut self, aa: bool) -> Self {
        self.aa = aa;
        self
    }

    pub fn recursion_desired(mut self, rd: bool) -> Self {
        self.rd = rd;
        self
    }

    pub fn recursion_available(mut self, ra: bool) -> Self {
        self.ra = ra;
        self
    }

    pub fn rcode(mut self, rcode: RCode) -> Self {
        self.rcode = rcode;
        self
    }

    pub fn question(mut self, question: Question) -> Self {
        self.questions.push(question);
        self
    }

    pub fn answer(mut self, answer: ResourceRecord) -> Self {
        self.answers.push(answer);
        self
    }

    pub fn authority(mut self, ns: ResourceRecord) -> Self {
        self.authorities.push(ns);
        self
    }

    pub fn additional(mut self, ar: ResourceRecord) -> Self {
        self.additionals.push(ar);
        self
    }
}
