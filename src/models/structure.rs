//! Structural nodes produced by the chatsync scanner.
//!
//! These mirror the on-disk layout one-to-one. They carry no validation logic of their own; the
//! scanner checks each header right after decoding it.

use chrono::{DateTime, Utc};

use crate::parsers::diagnostics::Diagnostics;

/// Magic bytes every chatsync file starts with
pub const FILE_SIGNATURE: [u8; 5] = *b"sCdB\x07";

/// Every record starts with this byte
pub const RECORD_SIGNATURE: u8 = b'A';

/// Block type carrying the message log
pub const MESSAGE_BLOCK_TYPE: u32 = 6;

/// Block type holding a flat array of 4 x u32 entries
pub const ENTRY_BLOCK_TYPE: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
    pub signature: [u8; 5],
    pub timestamp: u32,
    pub data_size: u32,
    pub padding: [u8; 19],
}

impl FileHeader {
    pub const SIZE: usize = 32;

    pub fn from_bytes(raw: &[u8; Self::SIZE]) -> Self {
        let mut signature = [0u8; 5];
        signature.copy_from_slice(&raw[0..5]);
        let mut padding = [0u8; 19];
        padding.copy_from_slice(&raw[13..32]);
        Self {
            signature,
            timestamp: le_u32(&raw[5..9]),
            data_size: le_u32(&raw[9..13]),
            padding,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockHeader {
    pub data_size: u32,
    /// Meaning unknown
    pub unknown: u32,
    pub block_type: u32,
    pub padding: [u8; 4],
}

impl BlockHeader {
    pub const SIZE: usize = 16;

    pub fn from_bytes(raw: &[u8; Self::SIZE]) -> Self {
        let mut padding = [0u8; 4];
        padding.copy_from_slice(&raw[12..16]);
        Self {
            data_size: le_u32(&raw[0..4]),
            unknown: le_u32(&raw[4..8]),
            block_type: le_u32(&raw[8..12]),
            padding,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHeader {
    pub id: u32,
    pub unknown_1: u32,
    pub timestamp: u32,
    pub unknown_2: u32,
    pub data_size: u32,
}

impl MessageHeader {
    pub const SIZE: usize = 20;

    pub fn from_bytes(raw: &[u8; Self::SIZE]) -> Self {
        Self {
            id: le_u32(&raw[0..4]),
            unknown_1: le_u32(&raw[4..8]),
            timestamp: le_u32(&raw[8..12]),
            unknown_2: le_u32(&raw[12..16]),
            data_size: le_u32(&raw[16..20]),
        }
    }
}

/// One 16-byte entry of a type 5 block. Not decoded further.
pub type BlockEntry = [u32; 4];

/// Payload of a block, shaped by its type code
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockData {
    Records(Vec<Record>),
    Messages(Vec<Message>),
    Entries(Vec<BlockEntry>),
}

impl BlockData {
    pub fn len(&self) -> usize {
        match self {
            BlockData::Records(records) => records.len(),
            BlockData::Messages(messages) => messages.len(),
            BlockData::Entries(entries) => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn records(&self) -> Option<&[Record]> {
        match self {
            BlockData::Records(records) => Some(records),
            _ => None,
        }
    }

    pub fn messages(&self) -> Option<&[Message]> {
        match self {
            BlockData::Messages(messages) => Some(messages),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub header: BlockHeader,
    pub data: BlockData,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub header: MessageHeader,
    pub records: Vec<Record>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Count byte as stored; the fields list is bounded by size, not by this value
    pub count: u8,
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    Int,
    Type1,
    String,
    Blob,
    EndOfRecord,
    Type6,
}

impl FieldType {
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(FieldType::Int),
            1 => Some(FieldType::Type1),
            3 => Some(FieldType::String),
            4 => Some(FieldType::Blob),
            5 => Some(FieldType::EndOfRecord),
            6 => Some(FieldType::Type6),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldValue {
    Int(u64),
    /// Raw bytes: the 8-byte payload of a Type1 field or the contents of a Blob
    Bytes(Vec<u8>),
    /// Null-terminated string without its terminator; charset left to the reader
    String(Vec<u8>),
    IntList(Vec<u64>),
    None,
}

impl FieldValue {
    /// Byte view of string-like values
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            FieldValue::Bytes(bytes) | FieldValue::String(bytes) => Some(bytes),
            FieldValue::Int(_) | FieldValue::IntList(_) | FieldValue::None => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub field_type: FieldType,
    pub code: u64,
    pub value: FieldValue,
}

impl Field {
    pub fn is_end_of_record(&self) -> bool {
        self.field_type == FieldType::EndOfRecord
    }
}

/// Complete structural view of one chatsync file
#[derive(Debug, Clone)]
pub struct ScanResult {
    /// Name used in diagnostics, usually the file path
    pub source: String,
    pub header: FileHeader,
    pub timestamp: DateTime<Utc>,
    pub blocks: Vec<Block>,
    pub diagnostics: Diagnostics,
}

impl ScanResult {
    pub fn warning_count(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn blocks_of_type(&self, block_type: u32) -> impl Iterator<Item = &Block> {
        self.blocks.iter().filter(move |b| b.header.block_type == block_type)
    }
}

/// Convert epoch seconds as stored on disk into a UTC timestamp
pub fn epoch_seconds(secs: u32) -> DateTime<Utc> {
    DateTime::from_timestamp(i64::from(secs), 0).unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

fn le_u32(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(bytes);
    u32::from_le_bytes(buf)
}
