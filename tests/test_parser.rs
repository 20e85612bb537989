//! End-to-end tests of the byte-driven parser and dispatcher.

use scpi_stream::prelude::*;

mod util;
use util::run;

#[test]
fn idn_query() {
    let iface = run(b"*IDN?\n");
    assert_eq!(iface.device.output, b"FEL CVUT,DDS1,0,0.1\r\n");
    assert_eq!(iface.error_count(), 0);
}

#[test]
fn undefined_header_reports_full_path() {
    let mut iface = run(b"FOO:BAR:BAZ\n");
    assert!(iface.device.calls.is_empty());
    assert_eq!(iface.error_count(), 1);
    assert_eq!(
        &iface.pop_error()[..],
        b"-113,\"Undefined header;FOO:BAR:BAZ\""
    );
}

#[test]
fn semicolon_keeps_parent_path() {
    let mut iface = util::interface();
    iface.accept_buffer(b"FOO:BAR:BAZ\n");
    iface.device.output.clear();
    iface.accept_buffer(b"SYST:ERR:NEXT?; COUNT?; NEXT?\n");
    assert_eq!(
        iface.device.output,
        b"-113,\"Undefined header;FOO:BAR:BAZ\"\r\n0\r\n0,\"No error\"\r\n".to_vec()
    );
}

#[test]
fn blob_streams_in_chunks() {
    let iface = run(b"DATA:BLOB #216abcdefghijklmnop\n");
    assert_eq!(iface.error_count(), 0);
    assert_eq!(iface.device.calls.len(), 1);
    let (name, args) = &iface.device.calls[0];
    assert_eq!(*name, "DATA:BLOB");
    assert_eq!(args[0].blob_len(), 16);
    assert_eq!(
        iface.device.chunks,
        vec![b"abcd".to_vec(), b"efgh".to_vec(), b"ijkl".to_vec(), b"mnop".to_vec()]
    );
}

#[test]
fn blob_final_chunk_may_be_short() {
    let iface = run(b"DATA:BLOB #15abcde\n");
    assert_eq!(iface.device.chunks, vec![b"abcd".to_vec(), b"e".to_vec()]);
    assert_eq!(iface.error_count(), 0);
}

#[test]
fn discard_blob_suppresses_chunk_callbacks() {
    let mut iface = util::interface();
    iface.accept_buffer(b"DATA:BLOB #208abcd");
    iface.discard_blob();
    iface.accept_buffer(b"efgh\n");
    assert_eq!(iface.device.chunks, vec![b"abcd".to_vec()]);
    assert_eq!(iface.device.calls.len(), 1);
    assert_eq!(iface.error_count(), 0);
    // the line terminator resynchronised the parser
    iface.accept_buffer(b"*IDN?\n");
    assert!(iface.device.output.ends_with(b"FEL CVUT,DDS1,0,0.1\r\n"));
}

#[test]
fn typed_arguments() {
    let iface = run(b"APPLY:SINE 50, 1.0, 2.17\n");
    let (name, args) = &iface.device.calls[0];
    assert_eq!(*name, "APPL:SIN");
    assert_eq!(args[0], ArgValue::Int(50));
    assert_eq!(args[1], ArgValue::Float(1.0));
    assert_eq!(args[2], ArgValue::Float(2.17));
}

#[test]
fn string_escapes_and_bool() {
    let iface = run(b"DISP:TEXT 'ban\\'ana', OFF\n");
    let (_, args) = &iface.device.calls[0];
    assert_eq!(args[0].as_str(), b"ban'ana");
    assert_eq!(args[1], ArgValue::Bool(false));
    assert_eq!(iface.error_count(), 0);
}

#[test]
fn double_quoted_string() {
    let iface = run(b"DISP:TEXT \"it's\", 1\n");
    let (_, args) = &iface.device.calls[0];
    assert_eq!(args[0].as_str(), b"it's");
    assert_eq!(args[1], ArgValue::Bool(true));
}

#[test]
fn unterminated_string_is_an_error() {
    let mut iface = run(b"DISP:TEXT 'abc\n");
    assert!(iface.device.calls.is_empty());
    assert!(iface.pop_error().starts_with(b"-151,"));
}

#[test]
fn chardata_argument() {
    let iface = run(b"CHARD FOOBAR123_MOO_abcdef_HELLO, 12\n");
    let (_, args) = &iface.device.calls[0];
    assert_eq!(args[0].as_str(), b"FOOBAR123_MOO_abcdef_HELLO");
    assert_eq!(args[1], ArgValue::Int(12));
}

#[test]
fn integer_multiplier_suffixes() {
    let iface = run(b"FREQ 50k\n");
    assert_eq!(iface.device.frequency, 50_000);
    let iface = run(b"FREQ 2M\n");
    assert_eq!(iface.device.frequency, 2_000_000);
}

#[test]
fn compound_line_with_path_reset() {
    let iface = run(b"FREQ 50;:*IDN?\n");
    assert_eq!(iface.device.frequency, 50);
    assert_eq!(iface.device.output, b"FEL CVUT,DDS1,0,0.1\r\n");
    assert_eq!(iface.error_count(), 0);
}

#[test]
fn sibling_commands_share_subtree() {
    let mut iface = run(b"STAT:QUES:ENAB 6;ENAB?\n");
    assert_eq!(iface.device.output, b"6\r\n");
    assert_eq!(iface.error_count(), 0);
    // without the leading colon a common command does not resolve mid-path
    iface = run(b"STAT:QUES:ENAB 6;*IDN?\n");
    assert!(iface.device.output.is_empty());
    assert_eq!(iface.error_count(), 1);
}

#[test]
fn crlf_line_terminator() {
    let iface = run(b"FREQ 50\r\nFREQ 60\r\n");
    assert_eq!(iface.device.frequency, 60);
    assert_eq!(iface.device.calls.len(), 2);
    assert_eq!(iface.error_count(), 0);
}

#[test]
fn blank_lines_are_silently_accepted() {
    let iface = run(b"\n  \r\n\t\n");
    assert!(iface.device.calls.is_empty());
    assert_eq!(iface.error_count(), 0);
}

#[test]
fn missing_parameter() {
    let mut iface = run(b"FREQ\n");
    assert!(iface.device.calls.is_empty());
    assert!(iface.pop_error().starts_with(b"-109,"));
    let mut iface = run(b"APPLY:SINE 50, 1.0\n");
    assert!(iface.device.calls.is_empty());
    assert!(iface.pop_error().starts_with(b"-109,"));
}

#[test]
fn excess_parameter() {
    let mut iface = run(b"FREQ 50, 60\n");
    assert!(iface.pop_error().starts_with(b"-108,"));
}

#[test]
fn bad_number_recovers_on_next_line() {
    let mut iface = util::interface();
    iface.accept_buffer(b"FREQ 5x0\nFREQ 60\n");
    assert_eq!(iface.device.frequency, 60);
    assert!(iface.pop_error().starts_with(b"-121,"));
    assert_eq!(iface.error_count(), 0);
}

#[test]
fn mnemonic_too_long() {
    let mut iface = run(b"ABCDEFGHIJKLMNOPQ\n");
    assert!(iface.pop_error().starts_with(b"-112,"));
}

#[test]
fn invalid_character_after_zero_arg_command() {
    let mut iface = run(b"*WAI x\n");
    assert!(iface.pop_error().starts_with(b"-101,"));
    assert_eq!(iface.error_count(), 0);
}

#[test]
fn unfinished_path_is_a_syntax_error() {
    // "SYST:" opens a path and never finishes it
    let mut iface = run(b"SYST:\n");
    assert!(iface.pop_error().starts_with(b"-102,"));
}

#[test]
fn double_colon_is_a_syntax_error() {
    let mut iface = run(b"SYST::ERR?\n");
    assert!(iface.pop_error().starts_with(b"-102,"));
    assert_eq!(iface.error_count(), 0);
}

#[test]
fn whitespace_collapses_between_header_and_arguments() {
    let iface = run(b"FREQ \t   50\n");
    assert_eq!(iface.device.frequency, 50);
    assert_eq!(iface.error_count(), 0);
}

#[test]
fn byte_at_a_time_equals_buffered() {
    let input: &[u8] = b"*IDN?\nFOO:BAR:BAZ\nAPPLY:SINE 50, 1.0, 2.17\n\
        DATA:BLOB #15abcde\nSYST:ERR:NEXT?; COUNT?\nDISP:TEXT 'hi', ON\n";

    let buffered = run(input);

    let mut bytewise = util::interface();
    for &b in input {
        bytewise.accept(b);
    }

    assert_eq!(bytewise.device.output, buffered.device.output);
    assert_eq!(bytewise.device.calls, buffered.device.calls);
    assert_eq!(bytewise.device.chunks, buffered.device.chunks);
    assert_eq!(bytewise.error_count(), buffered.error_count());
    assert_eq!(bytewise.status().stb.raw(), buffered.status().stb.raw());
    assert_eq!(bytewise.status().sesr.raw(), buffered.status().sesr.raw());
}

#[test]
fn user_table_shadows_builtins() {
    fn my_idn(iface: &mut Interface<util::TestDevice>, _args: &[ArgValue]) {
        iface.send_string(b"shadowed");
    }
    static SHADOW: &[Command<util::TestDevice>] = &[Command::new(&[b"*IDN?"], &[], my_idn)];

    let mut iface = Interface::new(util::TestDevice::new(), SHADOW);
    iface.accept_buffer(b"*IDN?\n");
    assert_eq!(iface.device.output, b"shadowed\r\n");
}
