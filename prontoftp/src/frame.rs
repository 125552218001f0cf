//! # Frame
//!
//! Reassembles the control-channel text stream into complete FTP replies.
//! Replies may be split or coalesced arbitrarily by the transport, so parsing
//! happens on accumulated text and an unfinished tail is carried over to the
//! next read.

use crate::types::Response;

/// Outcome of parsing a block of control-channel text: the complete replies it
/// contained, plus the trailing part that still waits for more input (an open
/// multi-line group).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Framed {
    pub replies: Vec<Response>,
    pub rest: String,
}

/// Splits control-channel text into complete replies.
///
/// A line starting with `ddd ` (or a bare `ddd`) is a complete single-line
/// reply. A line starting with `ddd-` opens a multi-line group, closed by the
/// next line that carries the *same* code followed by a space or end of line;
/// lines in between belong to the group body whatever they look like, even
/// when they resemble the opener of another group. CRLF is normalized to LF
/// and blank lines are discarded. An unclosed group is returned as `rest`
/// with a trailing LF, ready to be prepended to the next block.
pub fn parse(text: &str) -> Framed {
    let lines = text
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.trim().is_empty());

    let mut replies: Vec<Response> = Vec::new();
    let mut open: Option<u32> = None;
    let mut body: Vec<&str> = Vec::new();

    for line in lines {
        match open {
            None => match reply_prefix(line) {
                Some((code, true)) => {
                    open = Some(code);
                    body.push(line);
                }
                Some((code, false)) => replies.push(Response::new(code, line)),
                None => {
                    trace!("Ignoring stray control line: {line}");
                }
            },
            Some(code) => {
                body.push(line);
                if closes_group(line, code) {
                    replies.push(Response::new(code, body.join("\n")));
                    open = None;
                    body.clear();
                }
            }
        }
    }

    let rest = match open {
        Some(_) => {
            let mut rest = body.join("\n");
            rest.push('\n');
            rest
        }
        None => String::new(),
    };

    Framed { replies, rest }
}

/// Carries framing state across socket reads.
///
/// Only newline-terminated lines are handed to [`parse`]; the unterminated
/// tail of a read stays buffered. This is what makes the emitted reply
/// sequence independent of how the transport happened to chunk the stream,
/// and what makes it safe to cancel a pending read: no partially framed
/// reply is ever lost or emitted early.
#[derive(Debug, Default)]
pub struct Framer {
    buffer: String,
}

impl Framer {
    /// Appends a chunk of decoded control text and returns every reply that
    /// is now complete.
    pub fn feed(&mut self, chunk: &str) -> Vec<Response> {
        self.buffer.push_str(chunk);
        let cut = match self.buffer.rfind('\n') {
            Some(idx) => idx + 1,
            None => 0,
        };
        let tail = self.buffer.split_off(cut);
        let Framed { replies, rest } = parse(&self.buffer);
        self.buffer = rest;
        self.buffer.push_str(&tail);
        replies
    }
}

/// Reads the `ddd` prefix of a reply line. Returns the code and whether the
/// line opens a multi-line group (`ddd-`); `None` if the line is not a reply
/// boundary at all.
fn reply_prefix(line: &str) -> Option<(u32, bool)> {
    let bytes = line.as_bytes();
    if bytes.len() < 3 || !bytes[..3].iter().all(u8::is_ascii_digit) {
        return None;
    }
    let code = (bytes[0] - b'0') as u32 * 100
        + (bytes[1] - b'0') as u32 * 10
        + (bytes[2] - b'0') as u32;
    match bytes.get(3) {
        None | Some(b' ') => Some((code, false)),
        Some(b'-') => Some((code, true)),
        Some(_) => None,
    }
}

fn closes_group(line: &str, code: u32) -> bool {
    matches!(reply_prefix(line), Some((c, false)) if c == code)
}

#[cfg(test)]
mod test {

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn should_parse_single_line_reply() {
        let framed = parse("200 A");
        assert_eq!(framed.replies, vec![Response::new(200, "200 A")]);
        assert_eq!(framed.rest.as_str(), "");
    }

    #[test]
    fn should_parse_bare_code_reply() {
        let framed = parse("200\r\n");
        assert_eq!(framed.replies, vec![Response::new(200, "200")]);
        assert_eq!(framed.rest.as_str(), "");
    }

    #[test]
    fn should_parse_multiline_reply_normalizing_crlf() {
        let framed = parse("150-A\r\nB\r\n150 C");
        assert_eq!(framed.replies, vec![Response::new(150, "150-A\nB\n150 C")]);
        assert_eq!(framed.rest.as_str(), "");
    }

    #[test]
    fn should_swallow_nonmatching_opener_inside_group() {
        let framed = parse("150-A\r\n160-B\r\n150 C");
        assert_eq!(
            framed.replies,
            vec![Response::new(150, "150-A\n160-B\n150 C")]
        );
        assert_eq!(framed.rest.as_str(), "");
    }

    #[test]
    fn should_return_unclosed_group_as_rest() {
        let framed = parse("150-A\r\nB\r\n");
        assert_eq!(framed.replies, vec![]);
        assert_eq!(framed.rest.as_str(), "150-A\nB\n");
        // completing the group later yields the identical single message
        let completed = parse(&format!("{}150 C\r\n", framed.rest));
        assert_eq!(
            completed.replies,
            vec![Response::new(150, "150-A\nB\n150 C")]
        );
        assert_eq!(completed.rest.as_str(), "");
    }

    #[test]
    fn should_parse_several_replies_in_one_block() {
        let framed = parse("220 ready\r\n331 need password\r\n230 logged in\r\n");
        assert_eq!(
            framed.replies,
            vec![
                Response::new(220, "220 ready"),
                Response::new(331, "331 need password"),
                Response::new(230, "230 logged in"),
            ]
        );
    }

    #[test]
    fn should_drop_blank_and_stray_lines() {
        let framed = parse("\r\nnoise without code\r\n200 ok\r\n   \r\n");
        assert_eq!(framed.replies, vec![Response::new(200, "200 ok")]);
        assert_eq!(framed.rest.as_str(), "");
    }

    #[test]
    fn should_not_mistake_longer_numbers_for_replies() {
        let framed = parse("2000 surprising\r\n200 ok\r\n");
        assert_eq!(framed.replies, vec![Response::new(200, "200 ok")]);
    }

    #[test]
    fn framer_should_emit_same_replies_for_any_chunking() {
        let stream =
            "220-welcome\r\nto the server\r\n220 ok\r\n331 user ok\r\n230 logged in\r\n150-A\r\n160-B\r\n150 C\r\n";
        let expected = {
            let mut framer = Framer::default();
            framer.feed(stream)
        };
        assert_eq!(expected.len(), 4);
        for split in 0..=stream.len() {
            let mut framer = Framer::default();
            let mut replies = framer.feed(&stream[..split]);
            replies.extend(framer.feed(&stream[split..]));
            assert_eq!(replies, expected, "diverged when split at byte {split}");
        }
    }

    #[test]
    fn framer_should_hold_back_unterminated_line() {
        let mut framer = Framer::default();
        assert_eq!(framer.feed("200"), vec![]);
        assert_eq!(framer.feed(" A\r"), vec![]);
        assert_eq!(framer.feed("\n"), vec![Response::new(200, "200 A")]);
    }

    #[test]
    fn framer_should_carry_group_across_feeds() {
        let mut framer = Framer::default();
        assert_eq!(framer.feed("150-A\r\nB\r\n"), vec![]);
        assert_eq!(
            framer.feed("150 C\r\n226 done\r\n"),
            vec![
                Response::new(150, "150-A\nB\n150 C"),
                Response::new(226, "226 done"),
            ]
        );
    }
}
