//! Command descriptors, argument types/values and dictionary lookup.
//!
//! The dictionary is a flat ordered table scanned front to back: the user table
//! first, then the built-in table, first match wins. This is what makes
//! shadowing a built-in command possible and keeps lookup trivially predictable.

use arrayvec::ArrayVec;

use crate::parser::mnemonic::mnemonic_compare;
use crate::{Interface, MAX_MNEMONIC_LEN, MAX_STRING_LEN};

/// One level of a command path, e.g. `SYSTem` out of `SYSTem:ERRor?`.
pub(crate) type Mnemonic = ArrayVec<u8, MAX_MNEMONIC_LEN>;

/// Bounded text payload of a string or character-data argument.
pub type CharData = ArrayVec<u8, MAX_STRING_LEN>;

/// Parameter type tag of a [`Command`] descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgType {
    /// Decimal number with optional fraction, exponent and SI multiplier suffix.
    Float,
    /// Signed base-10 integer with optional SI multiplier suffix (`k M G m u n p`).
    Int,
    /// `0`, `1`, `ON` or `OFF` (case-insensitive).
    Bool,
    /// Unquoted `[A-Za-z0-9_]+` word.
    Chardata,
    /// `'…'` or `"…"` literal; `\` escapes the active quote.
    String,
    /// Definite-length binary block `#<d><len><bytes>`. Must be the last parameter.
    Blob,
}

/// A converted argument as handed to a command handler.
///
/// Handlers index the slice by parameter position; slots that were not filled
/// (or hold a different type than the accessor asks for) read as zero.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ArgValue {
    #[default]
    None,
    Float(f32),
    Int(i32),
    Bool(bool),
    Chardata(CharData),
    String(CharData),
    /// Declared payload length of a binary block. The payload itself is streamed
    /// through the descriptor's chunk callback.
    BlobLen(u32),
}

impl ArgValue {
    pub fn as_int(&self) -> i32 {
        match self {
            ArgValue::Int(v) => *v,
            _ => 0,
        }
    }

    pub fn as_float(&self) -> f32 {
        match self {
            ArgValue::Float(v) => *v,
            _ => 0.0,
        }
    }

    pub fn as_bool(&self) -> bool {
        match self {
            ArgValue::Bool(v) => *v,
            _ => false,
        }
    }

    /// Text of a string or character-data argument, empty otherwise.
    pub fn as_str(&self) -> &[u8] {
        match self {
            ArgValue::Chardata(s) | ArgValue::String(s) => s,
            _ => &[],
        }
    }

    pub fn blob_len(&self) -> u32 {
        match self {
            ArgValue::BlobLen(v) => *v,
            _ => 0,
        }
    }
}

/// Command callback, invoked once the whole command line (or the blob preamble)
/// has been parsed.
pub type Handler<D> = fn(&mut Interface<D>, &[ArgValue]);

/// Binary-chunk callback, invoked with consecutive slices of a blob payload.
pub type BlobHandler<D> = fn(&mut Interface<D>, &[u8]);

/// An immutable command descriptor.
///
/// `levels` holds 1..4 short-form patterns: uppercase letters are mandatory,
/// trailing lowercase letters optional, a `?` suffix marks a query and a leading
/// `*` a common command, e.g. `&[b"SYSTem", b"ERRor?"]`.
pub struct Command<D: 'static> {
    /// Header patterns, outermost level first.
    pub levels: &'static [&'static [u8]],
    /// Parameter types, in order. A [`ArgType::Blob`] must come last.
    pub params: &'static [ArgType],
    /// Invoked when the command is completed. For blob commands this fires as
    /// soon as the length preamble is read, before any payload byte.
    pub handler: Handler<D>,
    /// Payload bytes delivered per chunk-callback invocation (blob commands only).
    pub blob_chunk: usize,
    /// Chunk callback; the final chunk may be short.
    pub blob_handler: Option<BlobHandler<D>>,
}

impl<D> Command<D> {
    pub const fn new(
        levels: &'static [&'static [u8]],
        params: &'static [ArgType],
        handler: Handler<D>,
    ) -> Self {
        Command {
            levels,
            params,
            handler,
            blob_chunk: 0,
            blob_handler: None,
        }
    }

    pub const fn with_blob(
        levels: &'static [&'static [u8]],
        params: &'static [ArgType],
        handler: Handler<D>,
        blob_chunk: usize,
        blob_handler: BlobHandler<D>,
    ) -> Self {
        Command {
            levels,
            params,
            handler,
            blob_chunk,
            blob_handler: Some(blob_handler),
        }
    }
}

/// Location of a resolved descriptor in one of the two tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Slot {
    User(usize),
    Builtin(usize),
}

/// Match a descriptor against the collected path plus the token in progress.
///
/// With `exact` the descriptor must have exactly `path.len() + 1` levels; without
/// it, strictly more; this is the prefix check that validates an internal colon. The
/// length requirement keeps a shorter descriptor from matching a longer input.
pub(crate) fn matches<D>(cmd: &Command<D>, path: &[Mnemonic], last: &[u8], exact: bool) -> bool {
    let depth = path.len() + 1;
    if exact {
        if cmd.levels.len() != depth {
            return false;
        }
    } else if cmd.levels.len() <= depth {
        return false;
    }
    path.iter()
        .zip(cmd.levels)
        .all(|(token, pattern)| mnemonic_compare(pattern, token))
        && mnemonic_compare(cmd.levels[depth - 1], last)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Dummy;
    crate::tests::fixture_device!(Dummy);

    fn nop(_iface: &mut Interface<Dummy>, _args: &[ArgValue]) {}

    fn mnemonic(s: &[u8]) -> Mnemonic {
        let mut m = Mnemonic::new();
        m.try_extend_from_slice(s).unwrap();
        m
    }

    #[test]
    fn exact_requires_equal_depth() {
        let cmd: Command<Dummy> = Command::new(&[b"SYSTem", b"ERRor?"], &[], nop);
        assert!(matches(&cmd, &[mnemonic(b"SYST")], b"ERR?", true));
        assert!(!matches(&cmd, &[], b"SYST", true));
        assert!(matches(&cmd, &[], b"SYST", false));
    }

    #[test]
    fn partial_requires_greater_depth() {
        let cmd: Command<Dummy> = Command::new(&[b"SYSTem", b"ERRor?"], &[], nop);
        // a full-depth path is no longer a prefix
        assert!(!matches(&cmd, &[mnemonic(b"SYST")], b"ERR?", false));
    }

    #[test]
    fn undefined_slots_read_as_zero() {
        let v = ArgValue::None;
        assert_eq!(v.as_int(), 0);
        assert_eq!(v.as_float(), 0.0);
        assert!(!v.as_bool());
        assert_eq!(v.as_str(), b"");
        assert_eq!(v.blob_len(), 0);
    }
}
