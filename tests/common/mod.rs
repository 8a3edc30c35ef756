//! Shared test utilities for integration tests
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Encode a 7-bit chunked integer, low bits first
pub fn varint(mut value: u64) -> Vec<u8> {
    let mut out = Vec::new();
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return out;
        }
        out.push(byte | 0x80);
    }
}

/// Blob payload carrying plain message text
pub fn text_blob(text: &str) -> Vec<u8> {
    let mut out = vec![0x01, 0x03, 0x02];
    out.extend_from_slice(text.as_bytes());
    out.push(0x00);
    out.push(0x7f);
    out
}

/// Blob payload carrying edited message text
pub fn edited_blob(text: &str) -> Vec<u8> {
    let mut out = vec![0x03, 0x22];
    out.extend_from_slice(text.as_bytes());
    out.push(0x00);
    out
}

/// Builder for one record: `'A'`, field count, fields, and an end-of-record field
#[derive(Clone, Default)]
pub struct RecordBuilder {
    fields: Vec<Vec<u8>>,
}

impl RecordBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn int(mut self, code: u64, value: u64) -> Self {
        let mut field = vec![0];
        field.extend(varint(code));
        field.extend(varint(value));
        self.fields.push(field);
        self
    }

    pub fn type1(mut self, code: u64, value: [u8; 8]) -> Self {
        let mut field = vec![1];
        field.extend(varint(code));
        field.extend_from_slice(&value);
        self.fields.push(field);
        self
    }

    pub fn string(mut self, code: u64, value: &str) -> Self {
        let mut field = vec![3];
        field.extend(varint(code));
        field.extend_from_slice(value.as_bytes());
        field.push(0);
        self.fields.push(field);
        self
    }

    pub fn blob(mut self, code: u64, value: &[u8]) -> Self {
        let mut field = vec![4];
        field.extend(varint(code));
        field.extend(varint(value.len() as u64));
        field.extend_from_slice(value);
        self.fields.push(field);
        self
    }

    pub fn type6(mut self, code: u8, values: &[u64]) -> Self {
        let mut field = vec![6, code];
        field.extend(varint(values.len() as u64));
        for value in values {
            field.extend(varint(*value));
        }
        self.fields.push(field);
        self
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = vec![b'A', (self.fields.len() + 1) as u8];
        for field in &self.fields {
            out.extend_from_slice(field);
        }
        out.extend_from_slice(&[5, 0]);
        out
    }
}

/// Builder for one message of the type 6 block
#[derive(Clone)]
pub struct MessageBuilder {
    id: u32,
    timestamp: u32,
    records: Vec<RecordBuilder>,
    data_size: Option<u32>,
}

impl MessageBuilder {
    pub fn new(id: u32, timestamp: u32) -> Self {
        Self { id, timestamp, records: Vec::new(), data_size: None }
    }

    /// A message in the usual shape: a header record and a record of (kind, author, text blob)
    pub fn text(id: u32, timestamp: u32, author: u64, blob: &[u8]) -> Self {
        Self::new(id, timestamp)
            .record(RecordBuilder::new().int(0, u64::from(id)))
            .record(RecordBuilder::new().int(1, 2).int(2, author).blob(3, blob))
    }

    pub fn record(mut self, record: RecordBuilder) -> Self {
        self.records.push(record);
        self
    }

    /// Declare a data size instead of the real length of the records
    pub fn declared_size(mut self, data_size: u32) -> Self {
        self.data_size = Some(data_size);
        self
    }

    pub fn encode(&self) -> Vec<u8> {
        let records: Vec<u8> = self.records.iter().flat_map(|r| r.encode()).collect();
        let data_size = self.data_size.unwrap_or(records.len() as u32);

        let mut out = Vec::new();
        for value in [self.id, 0, self.timestamp, 0, data_size] {
            out.extend_from_slice(&value.to_le_bytes());
        }
        out.extend(records);
        out
    }
}

/// Builder for one block: header plus payload
#[derive(Clone)]
pub struct BlockBuilder {
    block_type: u32,
    payload: Vec<u8>,
    data_size: Option<u32>,
}

impl BlockBuilder {
    pub fn records(block_type: u32, records: &[RecordBuilder]) -> Self {
        let payload = records.iter().flat_map(|r| r.encode()).collect();
        Self { block_type, payload, data_size: None }
    }

    pub fn messages(messages: &[MessageBuilder]) -> Self {
        let payload = messages.iter().flat_map(|m| m.encode()).collect();
        Self { block_type: 6, payload, data_size: None }
    }

    pub fn entries(entries: &[[u32; 4]]) -> Self {
        let payload =
            entries.iter().flat_map(|entry| entry.iter().flat_map(|v| v.to_le_bytes())).collect();
        Self { block_type: 5, payload, data_size: None }
    }

    pub fn raw(block_type: u32, payload: &[u8]) -> Self {
        Self { block_type, payload: payload.to_vec(), data_size: None }
    }

    pub fn empty(block_type: u32) -> Self {
        Self::raw(block_type, &[])
    }

    pub fn declared_size(mut self, data_size: u32) -> Self {
        self.data_size = Some(data_size);
        self
    }

    pub fn encode(&self) -> Vec<u8> {
        let data_size = self.data_size.unwrap_or(self.payload.len() as u32);
        let mut out = Vec::new();
        out.extend_from_slice(&data_size.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&self.block_type.to_le_bytes());
        out.extend_from_slice(&[0u8; 4]);
        out.extend_from_slice(&self.payload);
        out
    }
}

/// Builder for a whole chatsync file
///
/// By default the file has the usual six blocks, typed 1, 2, 6, 3, 4, 5, so the message log is
/// the third block. The participant list lives in the first record of the first block.
pub struct ChatSyncFileBuilder {
    timestamp: u32,
    participants: String,
    messages: Vec<MessageBuilder>,
    blocks: Option<Vec<BlockBuilder>>,
    signature: [u8; 5],
}

impl ChatSyncFileBuilder {
    pub fn new() -> Self {
        Self {
            timestamp: 1_400_000_000,
            participants: "#alice/$bob;9f3c21".to_string(),
            messages: Vec::new(),
            blocks: None,
            signature: *b"sCdB\x07",
        }
    }

    pub fn timestamp(mut self, timestamp: u32) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn participants(mut self, participants: &str) -> Self {
        self.participants = participants.to_string();
        self
    }

    pub fn message(mut self, message: MessageBuilder) -> Self {
        self.messages.push(message);
        self
    }

    /// Replace the default block layout entirely
    pub fn blocks(mut self, blocks: Vec<BlockBuilder>) -> Self {
        self.blocks = Some(blocks);
        self
    }

    pub fn signature(mut self, signature: [u8; 5]) -> Self {
        self.signature = signature;
        self
    }

    pub fn participant_block(&self) -> BlockBuilder {
        BlockBuilder::records(1, &[RecordBuilder::new().string(0, &self.participants)])
    }

    pub fn default_blocks(&self) -> Vec<BlockBuilder> {
        vec![
            self.participant_block(),
            BlockBuilder::records(2, &[RecordBuilder::new().int(0, 7).type6(0x08, &[1, 300])]),
            BlockBuilder::messages(&self.messages),
            BlockBuilder::empty(3),
            BlockBuilder::records(4, &[RecordBuilder::new().type1(0, [1, 2, 3, 4, 5, 6, 7, 8])]),
            BlockBuilder::entries(&[[1, 2, 3, 4]]),
        ]
    }

    pub fn build(&self) -> Vec<u8> {
        let blocks = self.blocks.clone().unwrap_or_else(|| self.default_blocks());
        let body: Vec<u8> = blocks.iter().flat_map(|b| b.encode()).collect();

        let mut out = self.signature.to_vec();
        out.extend_from_slice(&self.timestamp.to_le_bytes());
        out.extend_from_slice(&(body.len() as u32).to_le_bytes());
        out.extend_from_slice(&[0u8; 19]);
        out.extend(body);
        out
    }
}

impl Default for ChatSyncFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A conversation between alice (author 100) and bob (author 200)
pub fn sample_conversation() -> ChatSyncFileBuilder {
    ChatSyncFileBuilder::new()
        .message(MessageBuilder::text(1, 1_400_000_010, 100, &text_blob("hi")))
        .message(MessageBuilder::text(2, 1_400_000_020, 200, &text_blob("hello alice")))
        .message(MessageBuilder::text(3, 1_400_000_030, 100, &edited_blob("how are you?")))
}

/// Builder for test chatsync directory structures (`<dir>/<xx>/<name>.dat`)
pub struct ChatSyncDirBuilder {
    temp_dir: TempDir,
}

impl ChatSyncDirBuilder {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        Self { temp_dir }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Write raw bytes to `relative`, creating parent directories
    pub fn with_file(self, relative: &str, bytes: &[u8]) -> Self {
        let path = self.temp_dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create chatsync subdir");
        }
        fs::write(path, bytes).expect("Failed to write chatsync file");
        self
    }

    pub fn file_path(&self, relative: &str) -> PathBuf {
        self.temp_dir.path().join(relative)
    }

    pub fn build(self) -> TempDir {
        self.temp_dir
    }
}

impl Default for ChatSyncDirBuilder {
    fn default() -> Self {
        Self::new()
    }
}
