//! Shared test fixture: an instrument that records everything the parser does
//! to it. The command set mirrors a small DDS function generator.

use scpi_stream::prelude::*;
use scpi_stream::Interface;

pub struct TestDevice {
    /// Bytes emitted through the outbound sink.
    pub output: Vec<u8>,
    /// Command handler invocations, with the argument array as delivered.
    pub calls: Vec<(&'static str, Vec<ArgValue>)>,
    /// Blob chunk deliveries.
    pub chunks: Vec<Vec<u8>>,
    pub srq_count: usize,
    pub added_codes: Vec<i16>,
    pub cls_calls: usize,
    pub rst_calls: usize,
    pub frequency: i32,
}

impl TestDevice {
    pub fn new() -> Self {
        TestDevice {
            output: Vec::new(),
            calls: Vec::new(),
            chunks: Vec::new(),
            srq_count: 0,
            added_codes: Vec::new(),
            cls_calls: 0,
            rst_calls: 0,
            frequency: 0,
        }
    }
}

impl Device for TestDevice {
    fn write_byte(&mut self, b: u8) {
        self.output.push(b);
    }

    fn identify(&self) -> &[u8] {
        b"FEL CVUT,DDS1,0,0.1"
    }

    fn cls(&mut self) {
        self.cls_calls += 1;
    }

    fn rst(&mut self) {
        self.rst_calls += 1;
    }

    fn tst(&mut self) -> i32 {
        0
    }

    fn service_request(&mut self) {
        self.srq_count += 1;
    }

    fn error_added(&mut self, code: i16) {
        self.added_codes.push(code);
    }
}

fn record(iface: &mut Interface<TestDevice>, name: &'static str, args: &[ArgValue]) {
    iface.device.calls.push((name, args.to_vec()));
}

fn cb_appl_sin(iface: &mut Interface<TestDevice>, args: &[ArgValue]) {
    record(iface, "APPL:SIN", args);
}

fn cb_appl_tri(iface: &mut Interface<TestDevice>, args: &[ArgValue]) {
    record(iface, "APPL:TRI", args);
}

fn cb_freq(iface: &mut Interface<TestDevice>, args: &[ArgValue]) {
    iface.device.frequency = args[0].as_int();
    record(iface, "FREQ", args);
}

fn cb_disp_text(iface: &mut Interface<TestDevice>, args: &[ArgValue]) {
    record(iface, "DISP:TEXT", args);
}

fn cb_data_blob(iface: &mut Interface<TestDevice>, args: &[ArgValue]) {
    record(iface, "DATA:BLOB", args);
}

fn cb_data_blob_chunk(iface: &mut Interface<TestDevice>, bytes: &[u8]) {
    iface.device.chunks.push(bytes.to_vec());
}

fn cb_user_error(iface: &mut Interface<TestDevice>, args: &[ArgValue]) {
    record(iface, "USERERROR", args);
    iface.push_error_extra(10, b"Custom error message...");
}

fn cb_chard(iface: &mut Interface<TestDevice>, args: &[ArgValue]) {
    record(iface, "CHARD", args);
}

pub static COMMANDS: &[Command<TestDevice>] = &[
    Command::new(
        &[b"APPLy", b"SINe"],
        &[ArgType::Int, ArgType::Float, ArgType::Float],
        cb_appl_sin,
    ),
    Command::new(
        &[b"APPLy", b"TRIangle"],
        &[ArgType::Int, ArgType::Float, ArgType::Float],
        cb_appl_tri,
    ),
    Command::new(&[b"FREQuency"], &[ArgType::Int], cb_freq),
    Command::new(
        &[b"DISPlay", b"TEXT"],
        &[ArgType::String, ArgType::Bool],
        cb_disp_text,
    ),
    Command::with_blob(
        &[b"DATA", b"BLOB"],
        &[ArgType::Blob],
        cb_data_blob,
        4,
        cb_data_blob_chunk,
    ),
    Command::new(&[b"USeRERRor"], &[], cb_user_error),
    Command::new(
        &[b"CHARData"],
        &[ArgType::Chardata, ArgType::Int],
        cb_chard,
    ),
];

pub static USER_ERRORS: &[(i16, &[u8])] = &[(10, b"Custom error")];

pub fn interface() -> Interface<TestDevice> {
    Interface::new(TestDevice::new(), COMMANDS).with_user_errors(USER_ERRORS)
}

/// Feed a complete byte stream through a fresh interface.
pub fn run(input: &[u8]) -> Interface<TestDevice> {
    let mut iface = interface();
    iface.accept_buffer(input);
    iface
}
