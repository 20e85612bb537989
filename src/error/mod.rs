//! The SCPI error/event subsystem: code taxonomy, message resolution and the
//! bounded error queue.
//!
//! Codes are plain signed integers. Their class (and through it the SESR bit an
//! error fires) is derived by range check, exactly as chapter 21.8 of the SCPI
//! standard lays the tables out:
//!
//! | Range | Class | SESR bit |
//! |---|---|---|
//! | -199..-100 | Command error | 5 |
//! | -299..-200 | Execution error | 4 |
//! | -399..-300, positive | Device-specific error | 3 |
//! | -499..-400 | Query error | 2 |
//!
//! Entries are stored pre-formatted as `<code>,"<message>[;<detail>]"`: the
//! detail part (for example the offending header) only exists at the moment the
//! error fires, and the queue owns its text outright.

mod queue;

use arrayvec::ArrayVec;

pub use queue::{ErrorQueue, ERROR_QUEUE_DEPTH};

/// Capacity of one formatted queue entry.
pub const ERROR_TEXT_LEN: usize = 128;

/// One formatted error-queue entry, `<code>,"<message>[;<detail>]"`.
pub type ErrorEntry = ArrayVec<u8, ERROR_TEXT_LEN>;

pub(crate) const UNKNOWN_ERROR: &[u8] = b"Unknown error";

/// Well-known SCPI error codes. The parser only ever raises a handful of these;
/// the rest are here for instrument code.
pub mod codes {
    pub const NO_ERROR: i16 = 0;

    // Command errors [-199, -100]
    pub const COMMAND_ERROR: i16 = -100;
    pub const INVALID_CHARACTER: i16 = -101;
    pub const SYNTAX_ERROR: i16 = -102;
    pub const INVALID_SEPARATOR: i16 = -103;
    pub const DATA_TYPE_ERROR: i16 = -104;
    pub const PARAMETER_NOT_ALLOWED: i16 = -108;
    pub const MISSING_PARAMETER: i16 = -109;
    pub const MNEMONIC_TOO_LONG: i16 = -112;
    pub const UNDEFINED_HEADER: i16 = -113;
    pub const NUMERIC_DATA_ERROR: i16 = -120;
    pub const INVALID_CHARACTER_IN_NUMBER: i16 = -121;
    pub const INVALID_CHARACTER_DATA: i16 = -141;
    pub const CHARACTER_DATA_TOO_LONG: i16 = -144;
    pub const STRING_DATA_ERROR: i16 = -150;
    pub const INVALID_STRING_DATA: i16 = -151;
    pub const BLOCK_DATA_ERROR: i16 = -160;
    pub const INVALID_BLOCK_DATA: i16 = -161;

    // Execution errors [-299, -200]
    pub const EXECUTION_ERROR: i16 = -200;
    pub const DATA_OUT_OF_RANGE: i16 = -222;
    pub const TOO_MUCH_DATA: i16 = -223;
    pub const ILLEGAL_PARAMETER_VALUE: i16 = -224;

    // Device-specific errors [-399, -300]
    pub const DEVICE_SPECIFIC_ERROR: i16 = -300;
    pub const SELF_TEST_FAILED: i16 = -330;
    pub const QUEUE_OVERFLOW: i16 = -350;

    // Query errors [-499, -400]
    pub const QUERY_ERROR: i16 = -400;
}

/// The standard error/event table of SCPI-1999 chapter 21.8.
static STANDARD_TABLE: &[(i16, &[u8])] = &[
    (0, b"No error"),
    // Command errors
    (-100, b"Command error"),
    (-101, b"Invalid character"),
    (-102, b"Syntax error"),
    (-103, b"Invalid separator"),
    (-104, b"Data type error"),
    (-105, b"GET not allowed"),
    (-108, b"Parameter not allowed"),
    (-109, b"Missing parameter"),
    (-110, b"Command header error"),
    (-111, b"Header separator error"),
    (-112, b"Program mnemonic too long"),
    (-113, b"Undefined header"),
    (-114, b"Header suffix out of range"),
    (-115, b"Unexpected number of parameters"),
    (-120, b"Numeric data error"),
    (-121, b"Invalid character in number"),
    (-123, b"Exponent too large"),
    (-124, b"Too many digits"),
    (-128, b"Numeric data not allowed"),
    (-130, b"Suffix error"),
    (-131, b"Invalid suffix"),
    (-134, b"Suffix too long"),
    (-138, b"Suffix not allowed"),
    (-140, b"Character data error"),
    (-141, b"Invalid character data"),
    (-144, b"Character data too long"),
    (-148, b"Character data not allowed"),
    (-150, b"String data error"),
    (-151, b"Invalid string data"),
    (-158, b"String data not allowed"),
    (-160, b"Block data error"),
    (-161, b"Invalid block data"),
    (-168, b"Block data not allowed"),
    (-170, b"Expression error"),
    (-171, b"Invalid expression"),
    (-178, b"Expression data not allowed"),
    (-180, b"Macro error"),
    (-181, b"Invalid outside macro definition"),
    (-183, b"Invalid inside macro definition"),
    (-184, b"Macro parameter error"),
    // Execution errors
    (-200, b"Execution error"),
    (-201, b"Invalid while in local"),
    (-202, b"Settings lost due to rtl"),
    (-203, b"Command protected"),
    (-210, b"Trigger error"),
    (-211, b"Trigger ignored"),
    (-212, b"Arm ignored"),
    (-213, b"Init ignored"),
    (-214, b"Trigger deadlock"),
    (-215, b"Arm deadlock"),
    (-220, b"Parameter error"),
    (-221, b"Settings conflict"),
    (-222, b"Data out of range"),
    (-223, b"Too much data"),
    (-224, b"Illegal parameter value"),
    (-225, b"Out of memory"),
    (-226, b"Lists not same length"),
    (-230, b"Data corrupt or stale"),
    (-231, b"Data questionable"),
    (-232, b"Invalid format"),
    (-233, b"Invalid version"),
    (-240, b"Hardware error"),
    (-241, b"Hardware missing"),
    (-250, b"Mass storage error"),
    (-251, b"Missing mass storage"),
    (-252, b"Missing media"),
    (-253, b"Corrupt media"),
    (-254, b"Media full"),
    (-255, b"Directory full"),
    (-256, b"File name not found"),
    (-257, b"File name error"),
    (-258, b"Media protected"),
    (-260, b"Expression error"),
    (-261, b"Math error in expression"),
    (-270, b"Macro error"),
    (-271, b"Macro syntax error"),
    (-272, b"Macro execution error"),
    (-273, b"Illegal macro label"),
    (-274, b"Macro parameter error"),
    (-275, b"Macro definition too long"),
    (-276, b"Macro recursion error"),
    (-277, b"Macro redefinition not allowed"),
    (-278, b"Macro header not found"),
    (-280, b"Program error"),
    (-281, b"Cannot create program"),
    (-282, b"Illegal program name"),
    (-283, b"Illegal variable name"),
    (-284, b"Program currently running"),
    (-285, b"Program syntax error"),
    (-286, b"Program runtime error"),
    (-290, b"Memory use error"),
    (-291, b"Out of memory"),
    (-292, b"Referenced name does not exist"),
    (-293, b"Referenced name already exists"),
    (-294, b"Incompatible type"),
    // Device-specific errors
    (-300, b"Device-specific error"),
    (-310, b"System error"),
    (-311, b"Memory error"),
    (-312, b"PUD memory lost"),
    (-313, b"Calibration memory lost"),
    (-314, b"Save/recall memory lost"),
    (-315, b"Configuration memory lost"),
    (-320, b"Storage fault"),
    (-321, b"Out of memory"),
    (-330, b"Self-test failed"),
    (-340, b"Calibration failed"),
    (-350, b"Queue overflow"),
    (-360, b"Communication error"),
    (-361, b"Parity error in program message"),
    (-362, b"Framing error in program message"),
    (-363, b"Input buffer overrun"),
    (-365, b"Time out error"),
    // Query errors
    (-400, b"Query error"),
    (-410, b"Query INTERRUPTED"),
    (-420, b"Query UNTERMINATED"),
    (-430, b"Query DEADLOCKED"),
    (-440, b"Query UNTERMINATED after indefinite response"),
    // IEEE 488.2 events
    (-500, b"Power on"),
    (-600, b"User request"),
    (-700, b"Request control"),
    (-800, b"Operation complete"),
];

/// Look up a code in the standard table.
pub fn standard_message(code: i16) -> Option<&'static [u8]> {
    STANDARD_TABLE
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, msg)| *msg)
}

/// Resolve a code to the entry that will actually be stored.
///
/// Non-positive codes fall back toward zero: first to the nearest multiple of
/// ten present in the standard table, then to the nearest multiple of a hundred
/// (`-427` resolves to `-420,"Query UNTERMINATED"`). Positive codes are
/// device-defined and looked up in the user table without fallback.
pub fn resolve(code: i16, user: &[(i16, &'static [u8])]) -> (i16, &'static [u8]) {
    if code > 0 {
        return match user.iter().find(|(c, _)| *c == code) {
            Some(&(_, msg)) => (code, msg),
            None => (code, UNKNOWN_ERROR),
        };
    }
    if let Some(msg) = standard_message(code) {
        return (code, msg);
    }
    let tens = code / 10 * 10;
    if let Some(msg) = standard_message(tens) {
        return (tens, msg);
    }
    let hundreds = code / 100 * 100;
    if let Some(msg) = standard_message(hundreds) {
        return (hundreds, msg);
    }
    (code, UNKNOWN_ERROR)
}

/// SESR bitmask fired by an error of this code.
pub fn esr_mask(code: i16) -> u8 {
    match code {
        -99..=0 => 0,
        -199..=-100 => 0x20, // command error, bit 5
        -299..=-200 => 0x10, // execution error, bit 4
        -399..=-300 => 0x08, // device-specific error, bit 3
        -499..=-400 => 0x04, // query error, bit 2
        -599..=-500 => 0x80, // power on, bit 7
        -699..=-600 => 0x40, // user request, bit 6
        -799..=-700 => 0x02, // request control, bit 1
        -899..=-800 => 0x01, // operation complete, bit 0
        _ => 0x08,           // positive codes are device-specific
    }
}

/// Format a queue entry. Detail text that does not fit is truncated; the closing
/// quote always lands.
pub(crate) fn format_entry(code: i16, message: &[u8], extra: &[u8]) -> ErrorEntry {
    let mut entry = ErrorEntry::new();
    let mut buf = [0u8; 8];
    let code_str = lexical_core::write(code, &mut buf);
    let _ = entry.try_extend_from_slice(code_str);
    let _ = entry.try_push(b',');
    let _ = entry.try_push(b'"');
    let _ = entry.try_extend_from_slice(message);
    if !extra.is_empty() {
        let _ = entry.try_push(b';');
        let room = entry.capacity() - entry.len() - 1;
        let n = extra.len().min(room);
        let _ = entry.try_extend_from_slice(&extra[..n]);
    }
    let _ = entry.try_push(b'"');
    entry
}

/// The entry reported when the queue is empty.
pub(crate) fn no_error_entry() -> ErrorEntry {
    format_entry(codes::NO_ERROR, b"No error", b"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_rounds_toward_zero() {
        assert_eq!(resolve(-427, &[]), (-420, &b"Query UNTERMINATED"[..]));
        assert_eq!(resolve(-109, &[]), (-109, &b"Missing parameter"[..]));
        // -455 has no tens entry, falls through to the class generic
        assert_eq!(resolve(-455, &[]), (-400, &b"Query error"[..]));
        assert_eq!(resolve(-107, &[]), (-100, &b"Command error"[..]));
    }

    #[test]
    fn positive_codes_use_user_table_without_fallback() {
        static USER: &[(i16, &[u8])] = &[(10, b"Custom error")];
        assert_eq!(resolve(10, USER), (10, &b"Custom error"[..]));
        assert_eq!(resolve(17, USER), (17, UNKNOWN_ERROR));
    }

    #[test]
    fn entry_formatting() {
        let entry = format_entry(-113, b"Undefined header", b"FOO:BAR:BAZ");
        assert_eq!(&entry[..], b"-113,\"Undefined header;FOO:BAR:BAZ\"");
        let entry = format_entry(0, b"No error", b"");
        assert_eq!(&entry[..], b"0,\"No error\"");
    }

    #[test]
    fn esr_mask_by_class() {
        assert_eq!(esr_mask(codes::UNDEFINED_HEADER), 0x20);
        assert_eq!(esr_mask(codes::EXECUTION_ERROR), 0x10);
        assert_eq!(esr_mask(codes::QUEUE_OVERFLOW), 0x08);
        assert_eq!(esr_mask(codes::QUERY_ERROR), 0x04);
        assert_eq!(esr_mask(42), 0x08);
        assert_eq!(esr_mask(codes::NO_ERROR), 0);
    }
}
