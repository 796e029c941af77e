//! Portable encode/decode for query trees (§4.1, §6).

use super::ast::{CombineOp, Leaf, MatchOp, Operand, Query, QueryKind};
use crate::{
    error::{QviewError, Result},
    value::{Value, ValueTag},
};

const MAGIC: u32 = 0x5147_4631; // "QGF1"
const VERSION: u8 = 1;

const TAG_LEAF: u8 = 0;
const TAG_AND: u8 = 1;
const TAG_OR: u8 = 2;

const LEAF_KIND_LINK_NAME: u8 = 0;
const LEAF_KIND_ATTR_NAME: u8 = 1;
const LEAF_KIND_ATTR_VALUE: u8 = 2;
const LEAF_KIND_DATA_ELEMENT: u8 = 3;

const OP_EQ: u8 = 0;
const OP_NE: u8 = 1;
const OP_LT: u8 = 2;
const OP_GT: u8 = 3;
const OP_LE: u8 = 4;
const OP_GE: u8 = 5;

const NAME_TYPE_TAG: u16 = 0;

/// Encode `query`'s pre-order tree into `buf` and return the number of
/// bytes written. With `buf = None`, performs a dry run and returns the
/// required size without allocating an output (§4.1 `encode`).
///
/// # Errors
/// Returns [`QviewError::ViewWriteFailed`]-shaped failures never occur
/// here; this always succeeds for a well-formed tree.
pub fn encode(query: &Query, buf: Option<&mut Vec<u8>>) -> Result<usize> {
    let mut scratch = Vec::new();
    write_header(&mut scratch);
    write_node(query, &mut scratch);

    let len = scratch.len();
    if let Some(buf) = buf {
        buf.clear();
        buf.extend_from_slice(&scratch);
    }
    Ok(len)
}

fn write_header(buf: &mut Vec<u8>) {
    buf.extend_from_slice(&MAGIC.to_le_bytes());
    buf.push(VERSION);
}

fn write_node(query: &Query, buf: &mut Vec<u8>) {
    match query {
        Query::Leaf(leaf) => {
            buf.push(TAG_LEAF);
            write_leaf(leaf, buf);
        }
        Query::Combine { op, left, right } => {
            buf.push(match op {
                CombineOp::And => TAG_AND,
                CombineOp::Or => TAG_OR,
            });
            write_node(left, buf);
            write_node(right, buf);
        }
    }
}

fn write_leaf(leaf: &Leaf, buf: &mut Vec<u8>) {
    buf.push(leaf_kind_tag(leaf.kind));
    buf.push(match_op_tag(leaf.op));
    match &leaf.operand {
        Operand::Name(name) => {
            buf.extend_from_slice(&NAME_TYPE_TAG.to_le_bytes());
            buf.extend_from_slice(&(name.len() as u32).to_le_bytes());
            buf.extend_from_slice(name.as_bytes());
        }
        Operand::Scalar(value) => {
            buf.extend_from_slice(&value.tag().to_u16().to_le_bytes());
            let bytes = value.to_bytes();
            buf.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
            buf.extend_from_slice(&bytes);
        }
    }
}

const fn leaf_kind_tag(kind: QueryKind) -> u8 {
    match kind {
        QueryKind::LinkName => LEAF_KIND_LINK_NAME,
        QueryKind::AttrName => LEAF_KIND_ATTR_NAME,
        QueryKind::AttrValue => LEAF_KIND_ATTR_VALUE,
        QueryKind::DataElement | QueryKind::Misc => LEAF_KIND_DATA_ELEMENT,
    }
}

const fn match_op_tag(op: MatchOp) -> u8 {
    match op {
        MatchOp::Equal => OP_EQ,
        MatchOp::NotEqual => OP_NE,
        MatchOp::Less => OP_LT,
        MatchOp::Greater => OP_GT,
        MatchOp::LessEq => OP_LE,
        MatchOp::GreaterEq => OP_GE,
    }
}

/// Decode a query tree from its encoded form (§4.1 `decode`).
///
/// # Errors
/// Returns [`QviewError::CorruptQuery`] on any magic/version/shape
/// mismatch, or [`QviewError::InvalidQuery`] if a decoded leaf fails the
/// same `(kind, op, operand)` validation `make_leaf` performs.
pub fn decode(bytes: &[u8]) -> Result<Query> {
    let mut cursor = Cursor::new(bytes);
    let magic = cursor.read_u32()?;
    if magic != MAGIC {
        return Err(QviewError::CorruptQuery(format!(
            "bad magic: {magic:#010x}"
        )));
    }
    let version = cursor.read_u8()?;
    if version != VERSION {
        return Err(QviewError::CorruptQuery(format!(
            "unsupported version: {version}"
        )));
    }
    let query = read_node(&mut cursor)?;
    if !cursor.is_exhausted() {
        return Err(QviewError::CorruptQuery(
            "trailing bytes after query tree".to_string(),
        ));
    }
    Ok(query)
}

fn read_node(cursor: &mut Cursor<'_>) -> Result<Query> {
    match cursor.read_u8()? {
        TAG_LEAF => read_leaf(cursor),
        TAG_AND => {
            let left = read_node(cursor)?;
            let right = read_node(cursor)?;
            Ok(Query::combine(CombineOp::And, left, right))
        }
        TAG_OR => {
            let left = read_node(cursor)?;
            let right = read_node(cursor)?;
            Ok(Query::combine(CombineOp::Or, left, right))
        }
        other => Err(QviewError::CorruptQuery(format!(
            "unknown node tag: {other}"
        ))),
    }
}

fn read_leaf(cursor: &mut Cursor<'_>) -> Result<Query> {
    let kind = match cursor.read_u8()? {
        LEAF_KIND_LINK_NAME => QueryKind::LinkName,
        LEAF_KIND_ATTR_NAME => QueryKind::AttrName,
        LEAF_KIND_ATTR_VALUE => QueryKind::AttrValue,
        LEAF_KIND_DATA_ELEMENT => QueryKind::DataElement,
        other => return Err(QviewError::CorruptQuery(format!("unknown leaf kind: {other}"))),
    };
    let op = match cursor.read_u8()? {
        OP_EQ => MatchOp::Equal,
        OP_NE => MatchOp::NotEqual,
        OP_LT => MatchOp::Less,
        OP_GT => MatchOp::Greater,
        OP_LE => MatchOp::LessEq,
        OP_GE => MatchOp::GreaterEq,
        other => return Err(QviewError::CorruptQuery(format!("unknown match op: {other}"))),
    };
    let type_tag = cursor.read_u16()?;
    let len = cursor.read_u32()? as usize;
    let bytes = cursor.read_bytes(len)?;

    let operand = if type_tag == NAME_TYPE_TAG {
        let name = String::from_utf8(bytes.to_vec())
            .map_err(|_| QviewError::CorruptQuery("operand is not valid UTF-8".to_string()))?;
        Operand::Name(name)
    } else {
        let tag = ValueTag::from_u16(type_tag)
            .ok_or_else(|| QviewError::CorruptQuery(format!("unknown type tag: {type_tag}")))?;
        let value = Value::from_bytes(tag, bytes)
            .ok_or_else(|| QviewError::CorruptQuery("malformed scalar operand".to_string()))?;
        Operand::Scalar(value)
    };

    Query::make_leaf(kind, op, operand)
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    const fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn is_exhausted(&self) -> bool {
        self.pos == self.bytes.len()
    }

    fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.bytes.len())
            .ok_or_else(|| QviewError::CorruptQuery("buffer underrun".to_string()))?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    fn read_u16(&mut self) -> Result<u16> {
        let b = self.read_bytes(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn read_u32(&mut self) -> Result<u32> {
        let b = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }
}
