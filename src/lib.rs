#![cfg_attr(not(feature = "std"), no_std)]

//! This crate implements the byte-stream side of the SCPI-1999 / IEEE 488.2 protocol
//! used to control measurement instruments over serial, TCP or GPIB-class transports.
//!
//! * [SCPI-1999](http://www.ivifoundation.org/docs/scpi-99.pdf)
//! * [IEEE 488.2](http://dx.doi.org/10.1109/IEEESTD.2004.95390)
//!
//! It does not require the std library (ie it's `no_std` compatible) or a system
//! allocator; every buffer is statically bounded.
//!
//! # Scope
//! The crate does not implement any transport layer. Controller bytes are pushed in
//! through [`Interface::accept`]/[`Interface::accept_buffer`] and response bytes come
//! back out through [`Device::write_byte`]. One byte is processed to completion before
//! the next is accepted; there are no suspension points.
//!
//! Besides parsing and dispatch, the crate maintains the SCPI status model: the
//! QUEStionable, OPERation, Standard Event and Status Byte registers with their enable
//! masks, the bounded error/event queue, and the service-request callout. The
//! IEEE 488.2 common commands and the mandatory `SYSTem`/`STATus` subtrees are built
//! in; instrument commands are supplied as a flat table of [`Command`] records.
//!
//! # Features
#![doc = document_features::document_features!()]
//!
//! # Getting started
//! Implement [`Device`] for your instrument, declare a command table and feed bytes:
//!
//! ```
//! use scpi_stream::prelude::*;
//!
//! struct Dds {
//!     frequency: i32,
//! }
//!
//! impl Device for Dds {
//!     fn write_byte(&mut self, _b: u8) { /* hand off to UART/socket */ }
//!
//!     fn identify(&self) -> &[u8] {
//!         b"FEL CVUT,DDS1,0,0.1"
//!     }
//! }
//!
//! fn set_frequency(iface: &mut Interface<Dds>, args: &[ArgValue]) {
//!     iface.device.frequency = args[0].as_int();
//! }
//!
//! static COMMANDS: &[Command<Dds>] = &[
//!     Command::new(&[b"FREQuency"], &[ArgType::Int], set_frequency),
//! ];
//!
//! let mut iface = Interface::new(Dds { frequency: 0 }, COMMANDS);
//! iface.accept_buffer(b"FREQ 50k\n");
//! assert_eq!(iface.device.frequency, 50_000);
//! ```
//!
//! # Character coding
//! SCPI is strictly ASCII; anything outside the identifier/number classes raises an
//! error into the queue (exception: string and arbitrary block payloads, which are
//! passed through verbatim).
//!
//! # Error handling
//! Parse and execution failures never abort: they are queued as
//! `<code>,"<message>[;<detail>]"` entries readable via `SYSTem:ERRor?`, the parser
//! resynchronises at the next newline, and subsequent lines are unaffected.
//!
//! # Limitations
//! * Overlapping commands are not supported; commands execute sequentially.
//! * The interface object is single-threaded. Callers feeding bytes from several
//!   threads must serialise externally, and command handlers must not feed bytes
//!   back into the parser.

#[cfg(feature = "log")]
macro_rules! scpi_debug {
    ($($arg:tt)*) => { ::log::debug!($($arg)*) };
}
#[cfg(not(feature = "log"))]
macro_rules! scpi_debug {
    ($($arg:tt)*) => {{}};
}

#[cfg(feature = "log")]
macro_rules! scpi_warn {
    ($($arg:tt)*) => { ::log::warn!($($arg)*) };
}
#[cfg(not(feature = "log"))]
macro_rules! scpi_warn {
    ($($arg:tt)*) => {{}};
}

mod builtins;
pub mod command;
pub mod error;
pub mod parser;
pub mod status;

use arrayvec::ArrayVec;

use command::{Command, Slot};
use error::{ErrorEntry, ErrorQueue};
use parser::ParserState;
use status::StatusRegisters;

pub use command::{ArgType, ArgValue};

/// Prelude containing the most useful stuff
pub mod prelude {
    pub use crate::{
        command::{ArgType, ArgValue, Command},
        error::codes,
        Device, Interface,
    };
}

/// Longest accepted program mnemonic, in characters (IEEE 488.2 says 12; a few
/// real-world instruments exceed that, so the classic relaxed limit is kept).
pub const MAX_MNEMONIC_LEN: usize = 16;
/// Maximum command depth (colon-separated levels).
pub const MAX_LEVEL_COUNT: usize = 4;
/// Maximum number of parameters per command.
pub const MAX_PARAM_COUNT: usize = 4;
/// Longest accepted string or character-data parameter, in bytes.
pub const MAX_STRING_LEN: usize = 64;
/// Capacity of the working character buffer (token in progress, blob chunk).
pub(crate) const CHARBUF_LEN: usize = 256;

/// Response line terminator used unless overridden with [`Interface::with_eol`].
pub const DEFAULT_LINE_TERMINATOR: &[u8] = b"\r\n";

/// The instrument behind the parser.
///
/// The two required methods connect the parser to the outside world; the rest are
/// optional hooks with no-op defaults, taking the place of the weak symbols a C
/// firmware would use.
pub trait Device: 'static {
    /// Send one response byte to the controller (may be buffered downstream).
    fn write_byte(&mut self, b: u8);

    /// Identification string sent in response to `*IDN?`, conventionally
    /// `manufacturer,model,serial,firmware`.
    fn identify(&self) -> &[u8];

    /// `*CLS` hook: clear non-SCPI device state.
    fn cls(&mut self) {}

    /// `*RST` hook: reset the device. SCPI state (registers, error queue) is
    /// deliberately left alone.
    fn rst(&mut self) {}

    /// `*TST?` hook: run a self test and return its result code, `0` meaning pass.
    fn tst(&mut self) -> i32 {
        0
    }

    /// Called on a 0→1 transition of the RQS bit, i.e. when an enabled status
    /// condition requests service. An actual instrument would assert SRQ here.
    fn service_request(&mut self) {}

    /// Called whenever an error has been queued, with the code actually stored
    /// (after fallback resolution and overflow substitution).
    fn error_added(&mut self, _code: i16) {}
}

/// The controller-facing endpoint: parser state, error queue, status registers and
/// command tables, bundled with the device they drive.
///
/// This is the one process-wide state record of the protocol; instantiate it once at
/// startup and keep it for the process lifetime. Command handlers receive `&mut
/// Interface` and may emit responses, raise errors and touch the device, but must
/// not feed bytes back into [`Interface::accept`].
pub struct Interface<D: 'static> {
    /// Device under control, reachable from command handlers.
    pub device: D,
    pub(crate) commands: &'static [Command<D>],
    pub(crate) builtins: [Command<D>; builtins::BUILTIN_COUNT],
    pub(crate) user_errors: &'static [(i16, &'static [u8])],
    pub(crate) eol: &'static [u8],
    pub(crate) state: ParserState,
    pub(crate) errors: ErrorQueue,
    pub(crate) status: StatusRegisters,
}

impl<D: Device> Interface<D> {
    /// Create an interface for `device` with the given instrument command table.
    ///
    /// The user table is searched before the built-in table, so an instrument may
    /// shadow a built-in command by redefining its header.
    pub fn new(device: D, commands: &'static [Command<D>]) -> Self {
        Interface {
            device,
            commands,
            builtins: builtins::table(),
            user_errors: &[],
            eol: DEFAULT_LINE_TERMINATOR,
            state: ParserState::new(),
            errors: ErrorQueue::new(),
            status: StatusRegisters::new(),
        }
    }

    /// Attach a table of positive device-specific error codes and their messages.
    pub fn with_user_errors(mut self, table: &'static [(i16, &'static [u8])]) -> Self {
        self.user_errors = table;
        self
    }

    /// Override the response line terminator (default `"\r\n"`).
    pub fn with_eol(mut self, eol: &'static [u8]) -> Self {
        self.eol = eol;
        self
    }

    /// Feed a whole buffer to the parser. Equivalent to calling
    /// [`Interface::accept`] for each byte in order.
    pub fn accept_buffer(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.accept(b);
        }
    }

    /* Outbound side */

    /// Send raw bytes to the controller, without a line terminator.
    pub fn send_raw(&mut self, s: &[u8]) {
        for &b in s {
            self.device.write_byte(b);
        }
    }

    /// Send a response line: the bytes followed by the configured terminator.
    pub fn send_string(&mut self, s: &[u8]) {
        self.send_raw(s);
        self.send_eol();
    }

    pub(crate) fn send_eol(&mut self) {
        let eol = self.eol;
        self.send_raw(eol);
    }

    pub(crate) fn send_number_raw<N: lexical_core::ToLexical>(&mut self, n: N) {
        // 16 bytes covers every integer type routed through here
        let mut buf = [0u8; 16];
        let s = lexical_core::write(n, &mut buf);
        self.send_raw(s);
    }

    pub(crate) fn send_number_line<N: lexical_core::ToLexical>(&mut self, n: N) {
        self.send_number_raw(n);
        self.send_eol();
    }

    /* Error queue */

    /// Queue an error by code. Negative codes resolve against the standard SCPI
    /// table (with the toward-zero fallback to the nearest tens/hundreds entry),
    /// positive codes against the user table.
    pub fn push_error(&mut self, code: i16) {
        self.push_error_extra(code, b"");
    }

    /// Queue an error with additional detail text, stored as
    /// `<code>,"<message>;<extra>"`.
    pub fn push_error_extra(&mut self, code: i16, extra: &[u8]) {
        let (code, message) = error::resolve(code, self.user_errors);
        let entry = error::format_entry(code, message, extra);
        let stored = self.errors.push(code, entry);
        self.status.sesr.0 |= error::esr_mask(stored);
        scpi_debug!("scpi: queued error {}", stored);
        self.update_status();
        self.device.error_added(stored);
    }

    /// Number of errors waiting in the queue.
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Pop the oldest error entry, or `0,"No error"` if the queue is empty.
    pub fn pop_error(&mut self) -> ErrorEntry {
        match self.errors.pop() {
            Some(entry) => {
                self.update_status();
                entry
            }
            None => error::no_error_entry(),
        }
    }

    /// Read the oldest error entry without removing it.
    pub fn peek_error(&self) -> ErrorEntry {
        match self.errors.front() {
            Some(entry) => entry.clone(),
            None => error::no_error_entry(),
        }
    }

    /// Drop all queued errors.
    pub fn clear_errors(&mut self) {
        self.errors.clear();
        self.update_status();
    }

    /* Status registers */

    /// Current register state.
    pub fn status(&self) -> &StatusRegisters {
        &self.status
    }

    /// Set bits in the QUEStionable event register.
    pub fn raise_questionable(&mut self, mask: u16) {
        self.status.questionable.0 |= mask;
        self.update_status();
    }

    /// Clear bits in the QUEStionable event register.
    pub fn clear_questionable(&mut self, mask: u16) {
        self.status.questionable.0 &= !mask;
        self.update_status();
    }

    /// Set bits in the OPERation event register.
    pub fn raise_operation(&mut self, mask: u16) {
        self.status.operation.0 |= mask;
        self.update_status();
    }

    /// Clear bits in the OPERation event register.
    pub fn clear_operation(&mut self, mask: u16) {
        self.status.operation.0 &= !mask;
        self.update_status();
    }

    /// Reflect "message available" in STB bit 4.
    pub fn set_mav(&mut self, mav: bool) {
        self.status.mav = mav;
        self.update_status();
    }

    /// Recompute the STB summary bits and fire the service-request hook on a
    /// 0→1 transition of RQS. Runs after every register or queue mutation.
    pub(crate) fn update_status(&mut self) {
        let pending = !self.errors.is_empty();
        if self.status.update(pending) {
            scpi_debug!("scpi: service request");
            self.device.service_request();
        }
    }

    pub(crate) fn command(&self, slot: Slot) -> &Command<D> {
        match slot {
            Slot::User(i) => &self.commands[i],
            Slot::Builtin(i) => &self.builtins[i],
        }
    }

    pub(crate) fn idn_copy(&self) -> ArrayVec<u8, 72> {
        let mut idn = ArrayVec::new();
        let src = self.device.identify();
        let n = src.len().min(idn.capacity());
        let _ = idn.try_extend_from_slice(&src[..n]);
        idn
    }
}
