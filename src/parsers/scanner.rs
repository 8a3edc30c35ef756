//! Structural scanner for chatsync files.
//!
//! The format is a tree of size-prefixed containers:
//!
//! ```text
//! file header (32 bytes)
//! └── blocks                    bounded by FileHeader::data_size
//!     ├── type 6: messages      bounded by BlockHeader::data_size
//!     │   └── records           bounded by MessageHeader::data_size
//!     │       └── fields        bounded by the remaining budget, or an end-of-record field
//!     ├── type 5: 16-byte entries
//!     └── other:  records
//! ```
//!
//! Declared sizes are not always consistent with what the items actually occupy. Sequences keep
//! reading until their budget is used up and record a warning when they overshoot, instead of
//! failing. Structural violations that make the rest of the stream meaningless (bad signatures,
//! unknown tags, truncation) are fatal.

use std::io::Read;

use super::diagnostics::{Diagnostics, ScanWarning, WarningKind};
use super::error::ChatSyncError;
use super::primitives::ByteReader;
use crate::models::structure::{
    Block, BlockData, BlockEntry, BlockHeader, ENTRY_BLOCK_TYPE, FILE_SIGNATURE, Field, FieldType,
    FieldValue, FileHeader, MESSAGE_BLOCK_TYPE, Message, MessageHeader, RECORD_SIGNATURE, Record,
    ScanResult, epoch_seconds,
};

/// Number of blocks a well-formed file contains, one of each type
const EXPECTED_BLOCK_COUNT: usize = 6;

/// Upper bounds on the work done for a single file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanLimits {
    pub max_blocks: usize,
    /// Maximum items in any one sequence (messages, records, fields, block 5 entries)
    pub max_items: usize,
}

impl Default for ScanLimits {
    fn default() -> Self {
        Self { max_blocks: 64, max_items: 1_000_000 }
    }
}

/// Anything that is wrong with a header but does not stop the scan
pub type HeaderIssues = Vec<(WarningKind, &'static str)>;

/// Check a decoded file header: a wrong signature is fatal, nonzero padding is not
pub fn validate_file_header(header: &FileHeader) -> Result<HeaderIssues, ChatSyncError> {
    if header.signature != FILE_SIGNATURE {
        return Err(ChatSyncError::InvalidSignature { found: header.signature });
    }
    let mut issues = Vec::new();
    if header.padding.iter().any(|&b| b != 0) {
        issues.push((WarningKind::HeaderPadding, "Header padding not all zeroes"));
    }
    Ok(issues)
}

/// Check a decoded block header; `index` is 1-based
pub fn validate_block_header(
    header: &BlockHeader,
    index: usize,
) -> Result<HeaderIssues, ChatSyncError> {
    let mut issues = Vec::new();
    if header.padding.iter().any(|&b| b != 0) {
        issues.push((WarningKind::BlockPadding, "Block header padding not all zeroes"));
    }
    if !(1..=6).contains(&header.block_type) {
        return Err(ChatSyncError::InvalidBlockType { index, block_type: header.block_type });
    }
    Ok(issues)
}

pub struct ChatSyncScanner<R> {
    reader: ByteReader<R>,
    source: String,
    limits: ScanLimits,
    diagnostics: Diagnostics,
    blocks_seen: usize,
    current_block: Option<usize>,
}

impl<R: Read> ChatSyncScanner<R> {
    /// `source` names the input in warnings, typically the file path
    pub fn new(input: R, source: impl Into<String>) -> Self {
        Self {
            reader: ByteReader::new(input),
            source: source.into(),
            limits: ScanLimits::default(),
            diagnostics: Diagnostics::new(),
            blocks_seen: 0,
            current_block: None,
        }
    }

    pub fn with_limits(mut self, limits: ScanLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Scan the whole input into a structural tree
    pub fn scan(mut self) -> Result<ScanResult, ChatSyncError> {
        let header = FileHeader::from_bytes(&self.reader.read_array("FileHeader")?);
        for (kind, message) in validate_file_header(&header)? {
            self.warn(kind, message.to_string());
        }

        let (_, blocks) = self.scan_sequence(
            "blocks",
            i64::from(header.data_size),
            self.limits.max_blocks,
            Self::scan_block,
            |_| false,
        )?;
        self.current_block = None;
        self.validate_blocks(&blocks)?;

        Ok(ScanResult {
            source: self.source,
            timestamp: epoch_seconds(header.timestamp),
            header,
            blocks,
            diagnostics: self.diagnostics,
        })
    }

    fn validate_blocks(&mut self, blocks: &[Block]) -> Result<(), ChatSyncError> {
        if blocks.len() != EXPECTED_BLOCK_COUNT {
            self.warn(
                WarningKind::BlockCount,
                format!("Incorrect number of blocks ({}) read", blocks.len()),
            );
        } else {
            let mut types: Vec<u32> = blocks.iter().map(|b| b.header.block_type).collect();
            types.sort_unstable();
            if types != [1, 2, 3, 4, 5, 6] {
                self.warn(WarningKind::BlockTypes, "Not all blocks 1..6 are present".to_string());
            }
        }

        let message_blocks =
            blocks.iter().filter(|b| b.header.block_type == MESSAGE_BLOCK_TYPE).count();
        if message_blocks != 1 {
            return Err(ChatSyncError::MessageBlockCount(message_blocks));
        }
        Ok(())
    }

    /// Scan items until `nbytes` is used up or `stop_at` matches the last item.
    ///
    /// Returns the bytes consumed (which may exceed `nbytes`) and the items. Overshooting the
    /// budget is recorded as a warning.
    fn scan_sequence<T, F, S>(
        &mut self,
        what: &'static str,
        nbytes: i64,
        limit: usize,
        mut scan_item: F,
        stop_at: S,
    ) -> Result<(i64, Vec<T>), ChatSyncError>
    where
        F: FnMut(&mut Self, i64) -> Result<(i64, T), ChatSyncError>,
        S: Fn(&T) -> bool,
    {
        let mut items = Vec::new();
        let mut remaining = nbytes;
        while remaining > 0 {
            if items.len() >= limit {
                return Err(ChatSyncError::LimitExceeded { what, limit });
            }
            let (size, item) = scan_item(self, remaining)?;
            remaining -= size;
            let stop = stop_at(&item);
            items.push(item);
            if stop {
                break;
            }
        }
        if remaining < 0 {
            self.warn(
                WarningKind::SizeMismatch,
                format!(
                    "Invalid data size detected while scanning {}: declared {} bytes, consumed {}",
                    what,
                    nbytes,
                    nbytes - remaining
                ),
            );
        }
        Ok((nbytes - remaining, items))
    }

    fn scan_block(&mut self, _nbytes: i64) -> Result<(i64, Block), ChatSyncError> {
        self.blocks_seen += 1;
        let index = self.blocks_seen;
        self.current_block = Some(index);

        let header = BlockHeader::from_bytes(&self.reader.read_array("BlockHeader")?);
        for (kind, message) in validate_block_header(&header, index)? {
            self.warn(kind, message.to_string());
        }

        let (data_size, data) = match header.block_type {
            MESSAGE_BLOCK_TYPE => {
                let (size, messages) = self.scan_sequence(
                    "messages",
                    i64::from(header.data_size),
                    self.limits.max_items,
                    Self::scan_message,
                    |_| false,
                )?;
                (size, BlockData::Messages(messages))
            }
            ENTRY_BLOCK_TYPE => self.scan_entries(&header)?,
            _ => {
                let (size, records) = self.scan_sequence(
                    "records",
                    i64::from(header.data_size),
                    self.limits.max_items,
                    Self::scan_record,
                    |_| false,
                )?;
                (size, BlockData::Records(records))
            }
        };

        Ok((BlockHeader::SIZE as i64 + data_size, Block { header, data }))
    }

    /// Type 5 payload: `data_size / 16` entries of four u32
    fn scan_entries(&mut self, header: &BlockHeader) -> Result<(i64, BlockData), ChatSyncError> {
        let count = (header.data_size / 16) as usize;
        if count > self.limits.max_items {
            return Err(ChatSyncError::LimitExceeded {
                what: "block 5 entries",
                limit: self.limits.max_items,
            });
        }

        let mut entries = Vec::new();
        for _ in 0..count {
            let raw: [u8; 16] = self.reader.read_array("block 5 entry")?;
            let mut entry: BlockEntry = [0; 4];
            for (value, chunk) in entry.iter_mut().zip(raw.chunks_exact(4)) {
                *value = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            }
            entries.push(entry);
        }

        let trailing = header.data_size % 16;
        if trailing != 0 {
            self.reader.skip(u64::from(trailing), "block 5 trailing bytes")?;
            self.warn(
                WarningKind::TrailingBytes,
                format!("Skipped {} trailing bytes after block 5 entries", trailing),
            );
        }

        Ok((i64::from(header.data_size), BlockData::Entries(entries)))
    }

    fn scan_message(&mut self, _nbytes: i64) -> Result<(i64, Message), ChatSyncError> {
        let header = MessageHeader::from_bytes(&self.reader.read_array("MessageHeader")?);
        let (records_size, records) = self.scan_sequence(
            "message records",
            i64::from(header.data_size),
            self.limits.max_items,
            Self::scan_record,
            |_| false,
        )?;
        Ok((MessageHeader::SIZE as i64 + records_size, Message { header, records }))
    }

    fn scan_record(&mut self, nbytes: i64) -> Result<(i64, Record), ChatSyncError> {
        let signature = self.reader.read_u8("record signature")?;
        if signature != RECORD_SIGNATURE {
            return Err(ChatSyncError::InvalidRecordSignature { found: signature });
        }
        let count = self.reader.read_u8("record field count")?;
        if count == 0 {
            return Ok((2, Record { count, fields: Vec::new() }));
        }

        let (size, fields) = self.scan_sequence(
            "record fields",
            nbytes - 2,
            self.limits.max_items,
            Self::scan_field,
            Field::is_end_of_record,
        )?;
        Ok((size + 2, Record { count, fields }))
    }

    fn scan_field(&mut self, _nbytes: i64) -> Result<(i64, Field), ChatSyncError> {
        let tag = self.reader.read_u8("field tag")?;
        let field_type = FieldType::from_tag(tag).ok_or(ChatSyncError::UnknownFieldType(tag))?;

        let (code_size, code, value_size, value) = match field_type {
            FieldType::Int => {
                let (code_size, code) = self.reader.read_7bit_int()?;
                let (value_size, value) = self.reader.read_7bit_int()?;
                (code_size, code, value_size, FieldValue::Int(value))
            }
            FieldType::Type1 => {
                let (code_size, code) = self.reader.read_7bit_int()?;
                let raw: [u8; 8] = self.reader.read_array("Type1 field value")?;
                (code_size, code, raw.len(), FieldValue::Bytes(raw.to_vec()))
            }
            FieldType::String => {
                let (code_size, code) = self.reader.read_7bit_int()?;
                let (value_size, value) = self.reader.read_cstring()?;
                (code_size, code, value_size, FieldValue::String(value))
            }
            FieldType::Blob => {
                let (code_size, code) = self.reader.read_7bit_int()?;
                let (value_size, value) = self.reader.read_blob()?;
                (code_size, code, value_size, FieldValue::Bytes(value))
            }
            FieldType::EndOfRecord => {
                let (code_size, code) = self.reader.read_7bit_int()?;
                (code_size, code, 0, FieldValue::None)
            }
            FieldType::Type6 => {
                // Code is a single raw byte here (observed as 0x08), followed by a value count
                let code = self.reader.read_u8("Type6 field code")?;
                let (count_size, count) = self.reader.read_7bit_int()?;
                let mut values = Vec::new();
                let mut values_size = 0;
                for _ in 0..count {
                    if values.len() >= self.limits.max_items {
                        return Err(ChatSyncError::LimitExceeded {
                            what: "Type6 values",
                            limit: self.limits.max_items,
                        });
                    }
                    let (size, value) = self.reader.read_7bit_int()?;
                    values_size += size;
                    values.push(value);
                }
                (count_size, u64::from(code), 1 + values_size, FieldValue::IntList(values))
            }
        };

        let size = 1 + code_size + value_size;
        Ok((size as i64, Field { field_type, code, value }))
    }

    fn warn(&mut self, kind: WarningKind, message: String) {
        self.diagnostics.push(ScanWarning {
            kind,
            source: self.source.clone(),
            block: self.current_block,
            offset: self.reader.position(),
            message,
        });
    }
}
