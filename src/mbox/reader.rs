//! Mailbox file splitting
//!
//! Messages are separated by lines starting with `From `. Body lines that
//! themselves start with `From ` are stored escaped as `>From ` (or `>>From `
//! when already quoted once); one level of escaping is removed here.

/// Splits raw mailbox bytes into individual messages
///
/// Separator lines are dropped. Blocks that contain only whitespace, such as a
/// blank preamble before the first separator, are not returned.
pub fn split_messages(content: &[u8]) -> Vec<Vec<u8>> {
    let mut messages = Vec::new();
    let mut current = Vec::new();

    for line in content.split_inclusive(|&b| b == b'\n') {
        if line.starts_with(b"From ") {
            push_message(&mut messages, std::mem::take(&mut current));
            continue;
        }
        current.extend_from_slice(unescape_from_line(line));
    }
    push_message(&mut messages, current);

    messages
}

fn push_message(messages: &mut Vec<Vec<u8>>, message: Vec<u8>) {
    if !message.iter().all(u8::is_ascii_whitespace) {
        messages.push(message);
    }
}

fn unescape_from_line(line: &[u8]) -> &[u8] {
    let quotes = line.iter().take_while(|&&b| b == b'>').count();
    if quotes > 0 && line[quotes..].starts_with(b"From ") {
        &line[1..]
    } else {
        line
    }
}
