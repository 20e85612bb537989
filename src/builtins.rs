//! The built-in command set: IEEE 488.2 mandatory common commands plus the
//! `SYSTem:ERRor`, `SYSTem:VERSion` and `STATus` subtrees required by SCPI-1999.
//!
//! | Mnemonic | Name                                 | 488.2 Section |
//! |----------|--------------------------------------|---------------|
//! | *CLS     | Clear Status Command                 | 10.3          |
//! | *ESE     | Standard Event Status Enable Command | 10.10         |
//! | *ESE?    | Standard Event Status Enable Query   | 10.11         |
//! | *ESR?    | Standard Event Status Register Query | 10.12         |
//! | *IDN?    | Identification Query                 | 10.14         |
//! | *OPC     | Operation Complete Command           | 10.18         |
//! | *OPC?    | Operation Complete Query             | 10.19         |
//! | *RST     | Reset Command                        | 10.32         |
//! | *SRE     | Service Request Enable Command       | 10.34         |
//! | *SRE?    | Service Request Enable Query         | 10.35         |
//! | *STB?    | Read Status Byte Query               | 10.36         |
//! | *TST?    | Self-Test Query                      | 10.38         |
//! | *WAI     | Wait-To-Continue                     | 10.39         |
//!
//! The user command table is searched first, so any of these can be shadowed by
//! an instrument that needs different behaviour.

use crate::command::{ArgType, ArgValue, Command};
use crate::status::{EventStatus, Questionable};
use crate::{Device, Interface};

pub(crate) const BUILTIN_COUNT: usize = 33;

/// Build the table. It cannot be a `static`: the descriptors are generic over
/// the device type, so each interface owns its own (tiny) copy.
pub(crate) fn table<D: Device>() -> [Command<D>; BUILTIN_COUNT] {
    [
        // ---- Common commands ----
        Command::new(&[b"*CLS"], &[], cls),
        Command::new(&[b"*ESE"], &[ArgType::Int], ese),
        Command::new(&[b"*ESE?"], &[], ese_query),
        Command::new(&[b"*ESR?"], &[], esr_query),
        Command::new(&[b"*IDN?"], &[], idn_query),
        Command::new(&[b"*OPC"], &[], opc),
        Command::new(&[b"*OPC?"], &[], opc_query),
        Command::new(&[b"*RST"], &[], rst),
        Command::new(&[b"*SRE"], &[ArgType::Int], sre),
        Command::new(&[b"*SRE?"], &[], sre_query),
        Command::new(&[b"*STB?"], &[], stb_query),
        Command::new(&[b"*TST?"], &[], tst_query),
        Command::new(&[b"*WAI"], &[], wai),
        // ---- SYSTem ----
        Command::new(&[b"SYSTem", b"ERRor?"], &[], error_next_query),
        Command::new(&[b"SYSTem", b"ERRor", b"NEXT?"], &[], error_next_query),
        Command::new(&[b"SYSTem", b"ERRor", b"ALL?"], &[], error_all_query),
        Command::new(&[b"SYSTem", b"ERRor", b"CLEar"], &[], error_clear),
        Command::new(&[b"SYSTem", b"ERRor", b"COUNt?"], &[], error_count_query),
        Command::new(&[b"SYSTem", b"ERRor", b"CODE?"], &[], error_code_next_query),
        Command::new(
            &[b"SYSTem", b"ERRor", b"CODE", b"NEXT?"],
            &[],
            error_code_next_query,
        ),
        Command::new(
            &[b"SYSTem", b"ERRor", b"CODE", b"ALL?"],
            &[],
            error_code_all_query,
        ),
        Command::new(&[b"SYSTem", b"VERSion?"], &[], version_query),
        // ---- STATus:OPERation ----
        Command::new(&[b"STATus", b"OPERation?"], &[], operation_event_query),
        Command::new(
            &[b"STATus", b"OPERation", b"EVENt?"],
            &[],
            operation_event_query,
        ),
        Command::new(
            &[b"STATus", b"OPERation", b"CONDition?"],
            &[],
            operation_condition_query,
        ),
        Command::new(
            &[b"STATus", b"OPERation", b"ENABle"],
            &[ArgType::Int],
            operation_enable,
        ),
        Command::new(
            &[b"STATus", b"OPERation", b"ENABle?"],
            &[],
            operation_enable_query,
        ),
        // ---- STATus:QUEStionable ----
        Command::new(
            &[b"STATus", b"QUEStionable?"],
            &[],
            questionable_event_query,
        ),
        Command::new(
            &[b"STATus", b"QUEStionable", b"EVENt?"],
            &[],
            questionable_event_query,
        ),
        Command::new(
            &[b"STATus", b"QUEStionable", b"CONDition?"],
            &[],
            questionable_condition_query,
        ),
        Command::new(
            &[b"STATus", b"QUEStionable", b"ENABle"],
            &[ArgType::Int],
            questionable_enable,
        ),
        Command::new(
            &[b"STATus", b"QUEStionable", b"ENABle?"],
            &[],
            questionable_enable_query,
        ),
        // ---- STATus:PRESet ----
        Command::new(&[b"STATus", b"PRESet"], &[], status_preset),
    ]
}

///> *CLS clears the event registers and the error/event queue, then lets the
///> device clear its own status. Enable masks are deliberately untouched.
fn cls<D: Device>(iface: &mut Interface<D>, _args: &[ArgValue]) {
    iface.status.sesr.0 = 0;
    iface.status.operation.0 = 0;
    iface.status.questionable.0 = 0;
    iface.errors.clear();
    iface.device.cls();
    iface.update_status();
}

fn ese<D: Device>(iface: &mut Interface<D>, args: &[ArgValue]) {
    iface.status.ese.0 = args[0].as_int() as u8;
    iface.update_status();
}

fn ese_query<D: Device>(iface: &mut Interface<D>, _args: &[ArgValue]) {
    let value = iface.status.ese.raw();
    iface.send_number_line(value);
}

///> Reading the Standard Event Status Register clears it.
fn esr_query<D: Device>(iface: &mut Interface<D>, _args: &[ArgValue]) {
    let value = iface.status.sesr.raw();
    iface.status.sesr.0 = 0;
    iface.send_number_line(value);
    iface.update_status();
}

fn idn_query<D: Device>(iface: &mut Interface<D>, _args: &[ArgValue]) {
    let idn = iface.idn_copy();
    iface.send_string(&idn);
}

/// No overlapping commands here, so operation is complete the moment `*OPC`
/// executes.
fn opc<D: Device>(iface: &mut Interface<D>, _args: &[ArgValue]) {
    iface.status.sesr.set(EventStatus::OPERATION_COMPLETE, true);
    iface.update_status();
}

fn opc_query<D: Device>(iface: &mut Interface<D>, _args: &[ArgValue]) {
    iface.send_string(b"1");
}

/// `*RST` resets the device only; SCPI state is not part of the reset.
fn rst<D: Device>(iface: &mut Interface<D>, _args: &[ArgValue]) {
    iface.device.rst();
}

fn sre<D: Device>(iface: &mut Interface<D>, args: &[ArgValue]) {
    iface.status.sre.0 = args[0].as_int() as u8;
    iface.update_status();
}

fn sre_query<D: Device>(iface: &mut Interface<D>, _args: &[ArgValue]) {
    let value = iface.status.sre.raw();
    iface.send_number_line(value);
}

///> *STB? reads the summary without clearing anything; RQS stays as-is.
fn stb_query<D: Device>(iface: &mut Interface<D>, _args: &[ArgValue]) {
    let value = iface.status.stb.raw();
    iface.send_number_line(value);
}

fn tst_query<D: Device>(iface: &mut Interface<D>, _args: &[ArgValue]) {
    let result = iface.device.tst();
    iface.send_number_line(result);
}

fn wai<D: Device>(_iface: &mut Interface<D>, _args: &[ArgValue]) {
    // sequential execution model: nothing is ever pending
}

fn error_next_query<D: Device>(iface: &mut Interface<D>, _args: &[ArgValue]) {
    let entry = iface.pop_error();
    iface.send_string(&entry);
}

/// Drain the queue as one comma-separated response line.
fn error_all_query<D: Device>(iface: &mut Interface<D>, _args: &[ArgValue]) {
    let mut first = true;
    while iface.error_count() > 0 {
        let entry = iface.pop_error();
        if !first {
            iface.send_raw(b",");
        }
        iface.send_raw(&entry);
        first = false;
    }
    iface.send_eol();
}

fn error_clear<D: Device>(iface: &mut Interface<D>, _args: &[ArgValue]) {
    iface.clear_errors();
}

fn error_count_query<D: Device>(iface: &mut Interface<D>, _args: &[ArgValue]) {
    let count = iface.error_count();
    iface.send_number_line(count);
}

fn error_code_next_query<D: Device>(iface: &mut Interface<D>, _args: &[ArgValue]) {
    let entry = iface.pop_error();
    iface.send_string(code_of(&entry));
}

fn error_code_all_query<D: Device>(iface: &mut Interface<D>, _args: &[ArgValue]) {
    let mut first = true;
    while iface.error_count() > 0 {
        let entry = iface.pop_error();
        if !first {
            iface.send_raw(b",");
        }
        let code = code_of(&entry);
        iface.send_raw(code);
        first = false;
    }
    iface.send_eol();
}

/// Numeric prefix of a formatted entry, up to the first comma.
fn code_of(entry: &[u8]) -> &[u8] {
    match entry.iter().position(|&b| b == b',') {
        Some(i) => &entry[..i],
        None => entry,
    }
}

fn version_query<D: Device>(iface: &mut Interface<D>, _args: &[ArgValue]) {
    iface.send_string(b"1999.0");
}

///> EVENt? reads and clears; CONDition? reads and keeps.
fn operation_event_query<D: Device>(iface: &mut Interface<D>, _args: &[ArgValue]) {
    let value = iface.status.operation.raw();
    iface.status.operation.0 = 0;
    iface.send_number_line(value);
    iface.update_status();
}

fn operation_condition_query<D: Device>(iface: &mut Interface<D>, _args: &[ArgValue]) {
    let value = iface.status.operation.raw();
    iface.send_number_line(value);
}

fn operation_enable<D: Device>(iface: &mut Interface<D>, args: &[ArgValue]) {
    iface.status.operation_enable.0 = args[0].as_int() as u16;
    iface.update_status();
}

fn operation_enable_query<D: Device>(iface: &mut Interface<D>, _args: &[ArgValue]) {
    let value = iface.status.operation_enable.raw();
    iface.send_number_line(value);
}

fn questionable_event_query<D: Device>(iface: &mut Interface<D>, _args: &[ArgValue]) {
    let value = iface.status.questionable.raw();
    iface.status.questionable = Questionable(0);
    iface.send_number_line(value);
    iface.update_status();
}

fn questionable_condition_query<D: Device>(iface: &mut Interface<D>, _args: &[ArgValue]) {
    let value = iface.status.questionable.raw();
    iface.send_number_line(value);
}

fn questionable_enable<D: Device>(iface: &mut Interface<D>, args: &[ArgValue]) {
    iface.status.questionable_enable.0 = args[0].as_int() as u16;
    iface.update_status();
}

fn questionable_enable_query<D: Device>(iface: &mut Interface<D>, _args: &[ArgValue]) {
    let value = iface.status.questionable_enable.raw();
    iface.send_number_line(value);
}

///> PRESet zeroes the QUEStionable and OPERation enables so device-dependent
///> events stop reaching the Status Byte until re-enabled.
fn status_preset<D: Device>(iface: &mut Interface<D>, _args: &[ArgValue]) {
    iface.status.questionable_enable.0 = 0;
    iface.status.operation_enable.0 = 0;
    iface.update_status();
}
