//! Recover the conversation from a scanned chatsync file.
//!
//! The semantics below were worked out empirically and rely on fixed positions:
//!
//! - block 0, record 0, field 0 holds the participant list, e.g. `#alice/$bob;a1b2c3`
//! - each message's second record holds the author ID in field 1 and a text blob in field 2
//! - the blob marks plain text with `03 02` and edited text with `03 22`, terminated by `00`
//!
//! A message that does not follow this shape is skipped. One whose text cannot be recovered
//! is counted in [`ChatLog::errors`].

use std::str;

use super::error::{ChatSyncError, MessageTextError};
use crate::models::structure::{
    FieldValue, MESSAGE_BLOCK_TYPE, Message, ScanResult, epoch_seconds,
};
use crate::models::{ChatLog, ConversationMessage};

const PLAIN_TEXT_MARKER: [u8; 2] = [0x03, 0x02];
const EDITED_TEXT_MARKER: [u8; 2] = [0x03, 0x22];

/// Index of the block the message log is read from in the usual block layout
const MESSAGE_BLOCK_INDEX: usize = 2;

/// Build the chat log for a scanned file
///
/// # Errors
///
/// Returns an error if the participant list cannot be read from the first block, or if no
/// block carries messages. Per-message problems never fail the parse.
pub fn parse_conversation(scan: &ScanResult) -> Result<ChatLog, ChatSyncError> {
    let mut log = ChatLog {
        source: scan.source.clone(),
        timestamp: scan.timestamp,
        is_empty: false,
        participants: None,
        conversation: Vec::new(),
        errors: 0,
        warnings: scan.diagnostics.warnings().to_vec(),
    };

    let Some(first_block) = scan.blocks.first() else {
        log.is_empty = true;
        return Ok(log);
    };
    if first_block.data.is_empty() {
        log.is_empty = true;
        return Ok(log);
    }
    let records = first_block
        .data
        .records()
        .ok_or(ChatSyncError::UnexpectedLayout("first block does not hold records"))?;
    let Some(participant_field) = records[0].fields.first() else {
        log.is_empty = true;
        return Ok(log);
    };

    let [first, second] = parse_participants(&participant_field.value)?;
    log.participants = Some([first.clone(), second.clone()]);

    let messages = message_log(scan)?;
    let Some(reference_id) = messages.iter().find_map(|m| {
        m.records.get(1).filter(|r| r.fields.len() > 1).map(|r| &r.fields[1].value)
    }) else {
        log.is_empty = true;
        return Ok(log);
    };

    for message in messages {
        let Some(record) = message.records.get(1) else {
            continue;
        };
        if record.fields.len() < 3 {
            continue;
        }

        match extract_message_text(&record.fields[2].value) {
            Ok((text, is_edit)) => {
                let author = if &record.fields[1].value == reference_id { &first } else { &second };
                log.conversation.push(ConversationMessage {
                    id: message.header.id,
                    timestamp: epoch_seconds(message.header.timestamp),
                    author: author.clone(),
                    text,
                    is_edit,
                });
            }
            Err(_) => log.errors += 1,
        }
    }

    Ok(log)
}

/// Split a participant list such as `#alice/$bob;suffix` into `["alice", "bob"]`
pub fn parse_participants(value: &FieldValue) -> Result<[String; 2], ChatSyncError> {
    let FieldValue::String(raw) = value else {
        return Err(ChatSyncError::UnexpectedLayout("participant field is not a string"));
    };

    let list = raw.split(|&b| b == b';').next().unwrap_or_default();
    let names: Vec<&[u8]> = list.split(|&b| b == b'/').collect();
    let [first, second] = names.as_slice() else {
        let text = String::from_utf8_lossy(raw).into_owned();
        return Err(ChatSyncError::MalformedParticipants(text));
    };

    // The first byte of each name is a marker, not part of the name
    let strip =
        |name: &[u8]| String::from_utf8_lossy(name.get(1..).unwrap_or_default()).into_owned();
    Ok([strip(*first), strip(*second)])
}

/// Pull the text out of a message blob. Returns the text and whether it is an edit.
pub fn extract_message_text(value: &FieldValue) -> Result<(String, bool), MessageTextError> {
    let blob = value.as_bytes().ok_or(MessageTextError::NotBytes)?;

    let (raw, is_edit) = match marked_text(blob, &PLAIN_TEXT_MARKER) {
        Some(raw) => (raw, false),
        None => {
            let raw =
                marked_text(blob, &EDITED_TEXT_MARKER).ok_or(MessageTextError::MissingMarker)?;
            (raw, true)
        }
    };

    Ok((str::from_utf8(raw)?.to_string(), is_edit))
}

/// Bytes between `marker` and the next 0x00. None unless both are present.
fn marked_text<'a>(blob: &'a [u8], marker: &[u8; 2]) -> Option<&'a [u8]> {
    let start = blob.windows(marker.len()).position(|w| w == marker)?;
    let text_start = start + marker.len();
    let len = blob[text_start..].iter().position(|&b| b == 0)?;
    Some(&blob[text_start..text_start + len])
}

/// The block holding the message log: block 2 when it carries messages, else the type 6 block
fn message_log(scan: &ScanResult) -> Result<&[Message], ChatSyncError> {
    scan.blocks
        .get(MESSAGE_BLOCK_INDEX)
        .and_then(|b| b.data.messages())
        .or_else(|| scan.blocks_of_type(MESSAGE_BLOCK_TYPE).find_map(|b| b.data.messages()))
        .ok_or(ChatSyncError::UnexpectedLayout("no block holds messages"))
}
