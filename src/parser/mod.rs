//! The single-pass, byte-driven parser and dispatcher.
//!
//! One incoming byte is processed to completion before the next is accepted.
//! The machine walks through the phases below; any recoverable error queues an
//! SCPI error code and drops the rest of the line.
//!
//! ```text
//! COMMAND --':'-> COMMAND (push path level)
//!         --ws--> ARG --quote--> ARG_STRING --quote--> ARG
//!                     --'#'----> ARG_BLOB_PREAMBLE --> ARG_BLOB_BODY/_DISCARD
//!                     --';' '\n'-> dispatch           --> TRAILING_WHITE_NOCB
//! any error --> DISCARD_LINE --'\n'--> COMMAND
//! ```
//!
//! A `;` dispatches and keeps the parent path (one level up) so siblings can
//! chain (`SYST:ERR:NEXT?; COUNT?`); a `\n` dispatches and resets to the root;
//! a leading `:` resets a kept path.

pub(crate) mod convert;
pub mod mnemonic;

use arrayvec::ArrayVec;

use crate::command::{matches, ArgType, ArgValue, Mnemonic, Slot};
use crate::error::codes;
use crate::{Device, Interface, CHARBUF_LEN, MAX_LEVEL_COUNT, MAX_MNEMONIC_LEN, MAX_PARAM_COUNT};

use mnemonic::{is_header_char, is_program_whitespace};

/// Largest possible header path (4 levels and 3 colons), used for error detail.
type HeaderText = ArrayVec<u8, { MAX_LEVEL_COUNT * (MAX_MNEMONIC_LEN + 1) }>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    /// Accumulating a header token.
    Command,
    /// Accumulating a textual argument.
    Arg,
    /// Inside a quoted string literal.
    ArgString,
    /// Inside the `#<d><nnn…>` length preamble.
    ArgBlobPreamble,
    /// Reading declared-length binary payload, delivering chunks.
    ArgBlobBody,
    /// Same length bookkeeping as the body, but without callbacks.
    ArgBlobDiscard,
    /// Zero-argument command waits for its terminator.
    TrailingWhite,
    /// As above, but the callback already ran (blob commands).
    TrailingWhiteNocb,
    /// After an error: swallow everything up to the end of the line.
    DiscardLine,
}

/// Mutable parser state, embedded in [`Interface`].
pub(crate) struct ParserState {
    phase: Phase,
    /// Token or blob chunk in progress.
    charbuf: ArrayVec<u8, CHARBUF_LEN>,
    /// Path levels confirmed by colons so far.
    path: ArrayVec<Mnemonic, MAX_LEVEL_COUNT>,
    /// Path was carried over from a semicolon.
    kept: bool,
    /// No descriptor can match the path anymore; kept only for error reporting.
    unmatched: bool,
    resolved: Option<Slot>,
    arg_i: usize,
    /// Current argument already converted (quoted strings finish early).
    arg_done: bool,
    args: [ArgValue; MAX_PARAM_COUNT],
    quote: u8,
    escaped: bool,
    /// Number of length digits announced by `#<d>`; 0 until seen.
    blob_digits: u8,
    blob_digits_read: u8,
    blob_len: u32,
    blob_received: u32,
}

impl ParserState {
    pub(crate) fn new() -> Self {
        ParserState {
            phase: Phase::Command,
            charbuf: ArrayVec::new(),
            path: ArrayVec::new(),
            kept: false,
            unmatched: false,
            resolved: None,
            arg_i: 0,
            arg_done: false,
            args: Default::default(),
            quote: 0,
            escaped: false,
            blob_digits: 0,
            blob_digits_read: 0,
            blob_len: 0,
            blob_received: 0,
        }
    }

    /// Back to the startup state; runs at every line end.
    fn reset(&mut self) {
        *self = ParserState::new();
    }

    /// Semicolon reset: drop everything except the parent path.
    fn reset_keep(&mut self) {
        let path = core::mem::take(&mut self.path);
        self.reset();
        self.path = path;
        self.kept = true;
    }
}

impl<D: Device> Interface<D> {
    /// Process one byte from the controller.
    pub fn accept(&mut self, byte: u8) {
        match self.state.phase {
            Phase::Command => self.accept_command(byte),
            Phase::Arg => self.accept_arg(byte),
            Phase::ArgString => self.accept_string(byte),
            Phase::ArgBlobPreamble => self.accept_blob_preamble(byte),
            Phase::ArgBlobBody => self.accept_blob_body(byte),
            Phase::ArgBlobDiscard => self.accept_blob_discard(byte),
            Phase::TrailingWhite => self.accept_trailing(byte, true),
            Phase::TrailingWhiteNocb => self.accept_trailing(byte, false),
            Phase::DiscardLine => {
                if byte == b'\r' || byte == b'\n' {
                    self.state.reset();
                }
            }
        }
    }

    /// Transition `ARG_BLOB_BODY` → `ARG_BLOB_DISCARD`: the rest of the declared
    /// payload is consumed without invoking the chunk callback.
    pub fn discard_blob(&mut self) {
        if self.state.phase == Phase::ArgBlobBody {
            self.state.charbuf.clear();
            self.state.phase = Phase::ArgBlobDiscard;
        }
    }

    /* COMMAND phase */

    fn accept_command(&mut self, c: u8) {
        if is_header_char(c) {
            if self.state.charbuf.len() >= MAX_MNEMONIC_LEN {
                self.raise_discard(codes::MNEMONIC_TOO_LONG, b"");
            } else {
                let _ = self.state.charbuf.try_push(c);
            }
            return;
        }
        if is_program_whitespace(c) {
            if !self.state.charbuf.is_empty() {
                self.end_header_space();
            }
            return;
        }
        match c {
            b':' => self.end_header_colon(),
            b';' => self.end_header_terminator(false),
            b'\n' => self.end_header_terminator(true),
            _ => self.raise_discard(codes::INVALID_CHARACTER, b""),
        }
    }

    /// Colon inside a header: either the leading path reset or a level boundary.
    fn end_header_colon(&mut self) {
        if self.state.charbuf.is_empty() {
            if self.state.path.is_empty() || self.state.kept {
                // leading colon: back to the command root
                self.state.path.clear();
                self.state.kept = false;
                self.state.unmatched = false;
            } else {
                self.raise_discard(codes::SYNTAX_ERROR, b"");
            }
            return;
        }
        // Validate that some command can still match the deeper path. On failure
        // the level is remembered anyway so the eventual Undefined header error
        // can report the complete offender.
        if !self.state.unmatched && !self.find_partial() {
            self.state.unmatched = true;
        }
        let mut level = Mnemonic::new();
        let _ = level.try_extend_from_slice(&self.state.charbuf);
        if self.state.path.try_push(level).is_err() {
            self.state.unmatched = true;
        }
        self.state.charbuf.clear();
    }

    /// Whitespace after a non-empty header token: resolve it, arguments follow.
    fn end_header_space(&mut self) {
        match self.find_exact() {
            Some(slot) => {
                self.state.resolved = Some(slot);
                self.state.charbuf.clear();
                self.state.phase = if self.command(slot).params.is_empty() {
                    Phase::TrailingWhite
                } else {
                    Phase::Arg
                };
            }
            None => {
                let header = self.full_header();
                self.raise_discard(codes::UNDEFINED_HEADER, &header);
            }
        }
    }

    /// `;` or `\n` directly after a header.
    fn end_header_terminator(&mut self, newline: bool) {
        if self.state.charbuf.is_empty() {
            if self.state.path.is_empty() || self.state.kept {
                // blank line or stray separator: accepted silently
                if newline {
                    self.state.reset();
                }
            } else {
                // a path was started but never finished, e.g. "SYST:\n"
                self.raise(codes::SYNTAX_ERROR, b"", newline);
            }
            return;
        }
        match self.find_exact() {
            Some(slot) => {
                if self.command(slot).params.is_empty() {
                    self.dispatch(slot, newline);
                } else {
                    self.raise(codes::MISSING_PARAMETER, b"", newline);
                }
            }
            None => {
                let header = self.full_header();
                self.raise(codes::UNDEFINED_HEADER, &header, newline);
            }
        }
    }

    /* ARG phase */

    fn accept_arg(&mut self, c: u8) {
        match c {
            b',' => return self.end_argument(Terminator::Comma),
            b';' => return self.end_argument(Terminator::Semicolon),
            b'\n' => return self.end_argument(Terminator::Newline),
            _ => {}
        }
        if is_program_whitespace(c) {
            if self.state.charbuf.is_empty() || self.state.arg_done {
                return;
            }
            // interior whitespace is kept and trimmed at conversion
            if self.state.charbuf.try_push(c).is_err() {
                self.raise_discard(codes::TOO_MUCH_DATA, b"");
            }
            return;
        }
        if self.state.arg_done {
            // a finished string may only be followed by a separator
            self.raise_discard(codes::INVALID_SEPARATOR, b"");
            return;
        }
        if self.state.charbuf.is_empty() {
            match self.expected_type() {
                Some(ArgType::String) if c == b'\'' || c == b'"' => {
                    self.state.quote = c;
                    self.state.escaped = false;
                    self.state.phase = Phase::ArgString;
                    return;
                }
                Some(ArgType::Blob) if c == b'#' => {
                    self.state.blob_digits = 0;
                    self.state.blob_digits_read = 0;
                    self.state.blob_len = 0;
                    self.state.blob_received = 0;
                    self.state.phase = Phase::ArgBlobPreamble;
                    return;
                }
                _ => {}
            }
        }
        if self.state.charbuf.try_push(c).is_err() {
            self.raise_discard(codes::TOO_MUCH_DATA, b"");
        }
    }

    /// Separator after an argument: convert, then advance or dispatch.
    fn end_argument(&mut self, terminator: Terminator) {
        let newline = terminator == Terminator::Newline;
        let slot = match self.state.resolved {
            Some(slot) => slot,
            None => {
                self.raise(codes::SYNTAX_ERROR, b"", newline);
                return;
            }
        };
        if !self.state.arg_done {
            let ty = match self.command(slot).params.get(self.state.arg_i) {
                Some(&ty) => ty,
                None => {
                    self.raise(codes::PARAMETER_NOT_ALLOWED, b"", newline);
                    return;
                }
            };
            match convert::convert(ty, &self.state.charbuf) {
                Ok(value) => self.state.args[self.state.arg_i] = value,
                Err(code) => {
                    self.raise(code, b"", newline);
                    return;
                }
            }
        }
        self.state.arg_done = false;
        self.state.charbuf.clear();
        match terminator {
            Terminator::Comma => {
                self.state.arg_i += 1;
                if self.state.arg_i >= self.command(slot).params.len() {
                    self.raise_discard(codes::PARAMETER_NOT_ALLOWED, b"");
                }
            }
            Terminator::Semicolon | Terminator::Newline => {
                if self.state.arg_i + 1 < self.command(slot).params.len() {
                    self.raise(codes::MISSING_PARAMETER, b"", newline);
                } else {
                    self.dispatch(slot, newline);
                }
            }
        }
    }

    /* ARG_STRING phase */

    fn accept_string(&mut self, c: u8) {
        if self.state.escaped {
            self.state.escaped = false;
            self.push_string_byte(c);
            return;
        }
        match c {
            b'\\' => self.state.escaped = true,
            b'\n' => {
                // END inside a string literal
                self.raise(codes::INVALID_STRING_DATA, b"", true);
            }
            c if c == self.state.quote => {
                let mut text = crate::command::CharData::new();
                let _ = text.try_extend_from_slice(&self.state.charbuf);
                self.state.args[self.state.arg_i] = ArgValue::String(text);
                self.state.arg_done = true;
                self.state.charbuf.clear();
                self.state.phase = Phase::Arg;
            }
            _ => self.push_string_byte(c),
        }
    }

    fn push_string_byte(&mut self, c: u8) {
        if self.state.charbuf.len() >= crate::MAX_STRING_LEN {
            self.raise_discard(codes::STRING_DATA_ERROR, b"");
        } else {
            let _ = self.state.charbuf.try_push(c);
        }
    }

    /* Blob phases */

    fn accept_blob_preamble(&mut self, c: u8) {
        if !c.is_ascii_digit() {
            // the payload length is unknowable from here on, so realignment at
            // the next newline is the best available recovery
            scpi_warn!("scpi: malformed block preamble, discarding line");
            self.raise_discard(codes::INVALID_BLOCK_DATA, b"");
            return;
        }
        let digit = c - b'0';
        if self.state.blob_digits == 0 {
            if digit == 0 {
                self.raise_discard(codes::INVALID_BLOCK_DATA, b"");
            } else {
                self.state.blob_digits = digit;
            }
            return;
        }
        self.state.blob_len = self.state.blob_len * 10 + u32::from(digit);
        self.state.blob_digits_read += 1;
        if self.state.blob_digits_read == self.state.blob_digits {
            self.begin_blob_body();
        }
    }

    /// Preamble complete: the command callback fires now, with the declared
    /// length in the blob slot; payload bytes follow through the chunk callback.
    fn begin_blob_body(&mut self) {
        let slot = match self.state.resolved {
            Some(slot) => slot,
            None => {
                self.raise_discard(codes::SYNTAX_ERROR, b"");
                return;
            }
        };
        self.state.args[self.state.arg_i] = ArgValue::BlobLen(self.state.blob_len);
        let handler = self.command(slot).handler;
        let args = core::mem::take(&mut self.state.args);
        handler(self, &args);

        self.state.charbuf.clear();
        let has_chunks =
            self.command(slot).blob_handler.is_some() && self.command(slot).blob_chunk > 0;
        self.state.phase = if self.state.blob_len == 0 {
            Phase::TrailingWhiteNocb
        } else if has_chunks {
            Phase::ArgBlobBody
        } else {
            Phase::ArgBlobDiscard
        };
    }

    fn accept_blob_body(&mut self, c: u8) {
        let slot = match self.state.resolved {
            Some(slot) => slot,
            None => return,
        };
        let _ = self.state.charbuf.try_push(c);
        self.state.blob_received += 1;

        let (chunk, handler) = {
            let cmd = self.command(slot);
            (cmd.blob_chunk.clamp(1, CHARBUF_LEN), cmd.blob_handler)
        };
        let complete = self.state.blob_received == self.state.blob_len;
        if self.state.charbuf.len() >= chunk || complete {
            let data = core::mem::take(&mut self.state.charbuf);
            if let Some(handler) = handler {
                handler(self, &data);
            }
        }
        if complete {
            self.state.phase = Phase::TrailingWhiteNocb;
        }
    }

    fn accept_blob_discard(&mut self, _c: u8) {
        self.state.blob_received += 1;
        if self.state.blob_received >= self.state.blob_len {
            self.state.phase = Phase::TrailingWhiteNocb;
        }
    }

    /* Trailing states */

    fn accept_trailing(&mut self, c: u8, run_handler: bool) {
        match c {
            b';' | b'\n' => {
                let newline = c == b'\n';
                match self.state.resolved {
                    Some(slot) if run_handler => self.dispatch(slot, newline),
                    _ => {
                        if newline {
                            self.state.reset();
                        } else {
                            self.state.reset_keep();
                        }
                    }
                }
            }
            c if is_program_whitespace(c) => {}
            _ => self.raise_discard(codes::INVALID_CHARACTER, b""),
        }
    }

    /* Dispatch and shared plumbing */

    /// Run the resolved command's callback, then reset: fully on a newline,
    /// keeping the parent path on a semicolon.
    fn dispatch(&mut self, slot: Slot, newline: bool) {
        let handler = self.command(slot).handler;
        let args = core::mem::take(&mut self.state.args);
        handler(self, &args);
        if newline {
            self.state.reset();
        } else {
            self.state.reset_keep();
        }
    }

    fn find_exact(&self) -> Option<Slot> {
        if self.state.unmatched {
            return None;
        }
        let path = &self.state.path;
        let last = &self.state.charbuf;
        self.commands
            .iter()
            .position(|cmd| matches(cmd, path, last, true))
            .map(Slot::User)
            .or_else(|| {
                self.builtins
                    .iter()
                    .position(|cmd| matches(cmd, path, last, true))
                    .map(Slot::Builtin)
            })
    }

    fn find_partial(&self) -> bool {
        let path = &self.state.path;
        let last = &self.state.charbuf;
        self.commands
            .iter()
            .chain(self.builtins.iter())
            .any(|cmd| matches(cmd, path, last, false))
    }

    fn expected_type(&self) -> Option<ArgType> {
        let slot = self.state.resolved?;
        self.command(slot).params.get(self.state.arg_i).copied()
    }

    /// The accumulated header, colon-joined, for error detail text.
    fn full_header(&self) -> HeaderText {
        let mut header = HeaderText::new();
        for level in &self.state.path {
            if !header.is_empty() {
                let _ = header.try_push(b':');
            }
            let _ = header.try_extend_from_slice(level);
        }
        if !self.state.charbuf.is_empty() {
            if !header.is_empty() {
                let _ = header.try_push(b':');
            }
            let _ = header.try_extend_from_slice(&self.state.charbuf);
        }
        header
    }

    /// Queue an error. When the offending byte is the line terminator itself the
    /// machine resets immediately; otherwise the rest of the line is dropped.
    fn raise(&mut self, code: i16, extra: &[u8], at_newline: bool) {
        self.push_error_extra(code, extra);
        if at_newline {
            self.state.reset();
        } else {
            self.state.phase = Phase::DiscardLine;
        }
    }

    fn raise_discard(&mut self, code: i16, extra: &[u8]) {
        self.raise(code, extra, false);
    }
}

#[derive(PartialEq, Eq, Clone, Copy)]
enum Terminator {
    Comma,
    Semicolon,
    Newline,
}
