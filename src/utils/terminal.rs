//! Terminal output sanitization
//!
//! Message text comes straight out of binary blobs written by another program. Before it is
//! printed, escape sequences and control characters are removed so a message cannot move the
//! cursor, recolor the terminal or ring the bell.

/// Remove ANSI escape sequences and control characters, keeping newlines and tabs
///
/// # Examples
///
/// ```
/// use chatsync_reader::utils::terminal::sanitize_for_terminal;
///
/// assert_eq!(sanitize_for_terminal("\x1b[1mbold\x1b[0m\x07"), "bold");
/// ```
pub fn sanitize_for_terminal(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '\x1b' {
            match chars.peek() {
                // CSI: ESC [ params final-byte
                Some('[') => {
                    chars.next();
                    for next_ch in chars.by_ref() {
                        if ('\x40'..='\x7e').contains(&next_ch) {
                            break;
                        }
                    }
                }
                // OSC: ESC ] ... terminated by BEL or ESC \
                Some(']') => {
                    chars.next();
                    while let Some(next_ch) = chars.next() {
                        if next_ch == '\x07' {
                            break;
                        }
                        if next_ch == '\x1b' && chars.peek() == Some(&'\\') {
                            chars.next();
                            break;
                        }
                    }
                }
                // Two-character escape
                Some(_) => {
                    chars.next();
                }
                None => {}
            }
            continue;
        }

        if ch == '\r' {
            continue;
        }
        if ch.is_control() && ch != '\n' && ch != '\t' {
            continue;
        }

        result.push(ch);
    }

    result
}
