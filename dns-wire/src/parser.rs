use crate::error::WireError;
use crate::{Class, Header, Message, OpCode, Question, RCode, RData, ResourceRecord, Result, Type};
use nom::bits::complete::take as take_bits;
use nom::bytes::complete::take as take_bytes;
use nom::combinator::map_res;
use nom::IResult;
use std::collections::HashSet;
use std::net::Ipv4Addr;
use tracing::{instrument, trace, warn};

/// Header fields plus the section counts that drive the rest of the
/// parse.
#[derive(Debug)]
struct RawHeader {
    header: Header,
    qd_count: u16,
    an_count: u16,
    ns_count: u16,
    ar_count: u16,
}

#[derive(Debug)]
struct RawQuestion {
    q_name: Vec<Label>,
    q_type: Type,
    q_class: Class,
}

#[derive(Debug)]
struct RawRecord {
    name: Vec<Label>,
    r_type: Type,
    class: Class,
    ttl: u32,
    rdata: Vec<u8>,
}

/// One step of a wire-format name: a literal label, an unexpanded
/// compression pointer, or a pointer already expanded to the labels it
/// referenced.
#[derive(Clone, Debug)]
enum Label {
    Text(String),
    Pointer(u16),
    Expanded(Vec<Label>),
}

impl From<RawQuestion> for Question {
    fn from(raw: RawQuestion) -> Self {
        Question {
            q_name: name_to_string(&raw.q_name),
            q_type: raw.q_type,
            q_class: raw.q_class,
        }
    }
}

/// Decodes the typed rdata payload. This takes the whole message because
/// names inside rdata may point back into earlier sections.
#[instrument(skip(message))]
fn decode_record(message: &[u8], raw: RawRecord) -> Result<ResourceRecord> {
    let data = match raw.r_type {
        Type::A if raw.rdata.len() == 4 => RData::A(Ipv4Addr::new(
            raw.rdata[0],
            raw.rdata[1],
            raw.rdata[2],
            raw.rdata[3],
        )),
        Type::A => {
            return Err(WireError::Malformed(format!(
                "A record rdata of {} bytes",
                raw.rdata.len()
            )))
        }
        Type::NS => RData::NS(expand_rdata_name(message, &raw.rdata)?),
        Type::CNAME => RData::CNAME(expand_rdata_name(message, &raw.rdata)?),
        r_type => RData::Raw(r_type.into(), raw.rdata),
    };

    trace!("Parsed rdata as {}", data);

    Ok(ResourceRecord {
        name: name_to_string(&raw.name),
        data,
        class: raw.class,
        ttl: raw.ttl,
    })
}

/// Reads a name out of rdata and expands its pointers against the whole
/// message.
fn expand_rdata_name(message: &[u8], rdata: &[u8]) -> Result<String> {
    let (_, mut labels) = read_name(rdata)?;
    expand_pointers(message, &mut labels, &mut HashSet::new())?;
    Ok(name_to_string(&labels))
}

#[instrument(skip(input))]
fn read_u16(input: &[u8]) -> IResult<&[u8], u16> {
    nom::combinator::map(take_bytes(2usize), |b: &[u8]| u16::from_be_bytes([b[0], b[1]]))(input)
}

#[instrument(skip(input))]
fn read_u32(input: &[u8]) -> IResult<&[u8], u32> {
    nom::combinator::map(take_bytes(4usize), |b: &[u8]| {
        u32::from_be_bytes([b[0], b[1], b[2], b[3]])
    })(input)
}

#[instrument(skip(input))]
fn read_header(input: &[u8]) -> IResult<&[u8], RawHeader> {
    use nom::bits::bits;
    use nom::combinator::map;

    map_res(take_bytes(12usize), |input| -> Result<RawHeader> {
        trace!("reading header");
        let (input, id) = read_u16(input)?;

        let (input, (qr, opcode, aa, tc, rd, ra, rcode)) =
            bits::<_, _, nom::error::Error<_>, nom::error::Error<_>, _>(|i| {
                let is_one = |b: u8| b == 1;
                let (i, qr) = map(take_bits(1usize), is_one)(i)?;
                let (i, opcode) = map(take_bits(4usize), OpCode::from_u8)(i)?;
                let (i, aa) = map(take_bits(1usize), is_one)(i)?;
                let (i, tc) = map(take_bits(1usize), is_one)(i)?;
                let (i, rd) = map(take_bits(1usize), is_one)(i)?;
                let (i, ra) = map(take_bits(1usize), is_one)(i)?;
                // z and the rfc2535 ad/cd bits - skipped, not enforced.
                let (i, _): (_, u8) = take_bits(3usize)(i)?;
                let (i, rcode) = map(take_bits(4usize), RCode::from_u8)(i)?;
                Ok((i, (qr, opcode, aa, tc, rd, ra, rcode)))
            })(input)?;

        let (input, qd_count) = read_u16(input)?;
        let (input, an_count) = read_u16(input)?;
        let (input, ns_count) = read_u16(input)?;
        let (_, ar_count) = read_u16(input)?;

        Ok(RawHeader {
            header: Header {
                id,
                qr,
                opcode,
                aa,
                tc,
                rd,
                ra,
                rcode,
            },
            qd_count,
            an_count,
            ns_count,
            ar_count,
        })
    })(input)
}

/// Reads one wire-format name: length-prefixed labels until the root
/// terminator, or a compression pointer, which always ends the name.
#[instrument(skip(input))]
fn read_name(input: &[u8]) -> IResult<&[u8], Vec<Label>> {
    use nom::bits::bits;

    /// Either the length of the next label or the offset the rest of the
    /// name lives at.
    enum LabelHead {
        Offset(u16),
        Length(u8),
    }

    let mut labels = Vec::new();
    let mut input = input;

    loop {
        let (i, head) = bits::<_, _, nom::error::Error<_>, nom::error::Error<_>, _>(|i| {
            let (i, flags): (_, u8) = take_bits(2usize)(i)?;
            if flags == 0b11 {
                let (i, offset): (_, u16) = take_bits(14usize)(i)?;
                trace!("Name pointer at offset: {}", offset);
                Ok((i, LabelHead::Offset(offset)))
            } else {
                let (i, low): (_, u8) = take_bits(6usize)(i)?;
                Ok((i, LabelHead::Length(flags << 6 | low)))
            }
        })(input)?;

        match head {
            LabelHead::Offset(offset) => {
                labels.push(Label::Pointer(offset));
                input = i;
                break;
            }
            LabelHead::Length(0) => {
                input = i;
                break;
            }
            LabelHead::Length(len) => {
                let (i, label) = map_res(take_bytes(len), |bytes| -> Result<Label> {
                    Ok(Label::Text(std::str::from_utf8(bytes)?.to_string()))
                })(i)?;
                labels.push(label);
                input = i;
            }
        }
    }
    Ok((input, labels))
}

#[instrument(skip(input))]
fn read_question(input: &[u8]) -> IResult<&[u8], RawQuestion> {
    trace!("reading question");
    let (input, q_name) = read_name(input)?;
    let (input, q_type) = read_u16(input)?;
    let (input, q_class) = read_u16(input)?;

    Ok((
        input,
        RawQuestion {
            q_name,
            q_type: Type::from(q_type),
            q_class: Class::from(q_class),
        },
    ))
}

#[instrument(skip(input))]
fn read_record(input: &[u8]) -> IResult<&[u8], RawRecord> {
    trace!("reading resource record");
    let (input, name) = read_name(input)?;
    let (input, r_type) = read_u16(input)?;
    let (input, class) = read_u16(input)?;
    let (input, ttl) = read_u32(input)?;
    let (input, rdlength) = read_u16(input)?;

    trace!("Found rdata of length: {}", rdlength);

    let (input, rdata) = take_bytes(rdlength)(input)?;
    Ok((
        input,
        RawRecord {
            name,
            r_type: Type::from(r_type),
            class: Class::from(class),
            ttl,
            rdata: Vec::from(rdata),
        },
    ))
}

#[instrument(skip(input))]
pub(crate) fn read_message(input: &[u8]) -> IResult<&[u8], Message> {
    trace!("reading message");
    map_res(take_bytes(input.len()), parse_sections)(input)
}

#[instrument(skip(input))]
fn parse_sections(input: &[u8]) -> Result<Message> {
    let message_bytes = input;
    let (mut input, raw_header) = read_header(input)?;

    let mut questions = Vec::new();
    for _ in 0..raw_header.qd_count {
        let (i, question) = read_question(input)?;
        input = i;
        questions.push(question);
    }

    let mut answers = Vec::new();
    for _ in 0..raw_header.an_count {
        let (i, record) = read_record(input)?;
        input = i;
        answers.push(record);
    }

    let mut authorities = Vec::new();
    for _ in 0..raw_header.ns_count {
        let (i, record) = read_record(input)?;
        input = i;
        authorities.push(record);
    }

    let mut additionals = Vec::new();
    for _ in 0..raw_header.ar_count {
        let (i, record) = read_record(input)?;
        input = i;
        additionals.push(record);
    }

    trace!("expanding name pointers");

    for q in questions.iter_mut() {
        expand_pointers(message_bytes, &mut q.q_name, &mut HashSet::new())?;
    }
    for record in answers
        .iter_mut()
        .chain(authorities.iter_mut())
        .chain(additionals.iter_mut())
    {
        expand_pointers(message_bytes, &mut record.name, &mut HashSet::new())?;
    }

    Ok(Message {
        header: raw_header.header,
        questions: questions.into_iter().map(Question::from).collect(),
        answers: answers
            .into_iter()
            .map(|raw| decode_record(message_bytes, raw))
            .collect::<Result<Vec<_>>>()?,
        authorities: authorities
            .into_iter()
            .map(|raw| decode_record(message_bytes, raw))
            .collect::<Result<Vec<_>>>()?,
        additionals: additionals
            .into_iter()
            .map(|raw| decode_record(message_bytes, raw))
            .collect::<Result<Vec<_>>>()?,
    })
}

/// Expands every [`Label::Pointer`] against the whole message. `seen`
/// tracks offsets already followed so a pointer loop fails instead of
/// spinning forever.
#[instrument(skip(message))]
fn expand_pointers(
    message: &[u8],
    labels: &mut Vec<Label>,
    seen: &mut HashSet<u16>,
) -> Result<()> {
    for label in labels.iter_mut() {
        if let Label::Pointer(offset) = label {
            if !seen.insert(*offset) {
                return Err(WireError::PointerLoop(*offset));
            }
            if *offset as usize >= message.len() {
                return Err(WireError::Malformed(format!(
                    "name pointer past end of message: {}",
                    offset
                )));
            }
            let (_, mut referenced) = read_name(&message[*offset as usize..])?;
            expand_pointers(message, &mut referenced, seen)?;

            *label = Label::Expanded(referenced);
        }
    }
    Ok(())
}

/// Collapses an expanded label sequence into a dotted name without the
/// trailing root dot.
fn name_to_string(labels: &[Label]) -> String {
    let mut name = String::new();
    for label in labels {
        match label {
            Label::Text(part) => {
                name.push_str(part);
                name.push('.');
            }
            Label::Expanded(inner) => {
                name.push_str(&name_to_string(inner));
            }
            Label::Pointer(offset) => {
                // Unreachable once expand_pointers has run.
                warn!("unexpanded name pointer at offset {} survived parsing", offset);
            }
        }
    }
    if name.ends_with('.') {
        name.pop();
    }
    name
}
