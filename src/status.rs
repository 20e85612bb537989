//! The IEEE 488.2 / SCPI status-reporting structures: QUEStionable, OPERation,
//! the Standard Event Status Register and the Status Byte, each with its enable
//! mask.
//!
//! Every register is a thin newtype over its raw integer so instrument code can
//! use either the named bit masks or the wire-level value; the Status Byte bit
//! positions are fixed by IEEE 488.2 and observable through `*STB?`.

macro_rules! status_register {
    ($(#[$meta:meta])* $name:ident: $raw:ty {
        $($(#[$bit_meta:meta])* $bit:ident = $pos:expr,)+
    }) => {
        $(#[$meta])*
        #[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
        pub struct $name(pub $raw);

        impl $name {
            $(
                $(#[$bit_meta])*
                pub const $bit: $raw = 1 << $pos;
            )+

            /// Raw integer view, bit positions as on the wire.
            pub fn raw(self) -> $raw {
                self.0
            }

            /// True if any bit under `mask` is set.
            pub fn get(self, mask: $raw) -> bool {
                self.0 & mask != 0
            }

            /// Set or clear the bits under `mask`.
            pub fn set(&mut self, mask: $raw, value: bool) {
                if value {
                    self.0 |= mask;
                } else {
                    self.0 &= !mask;
                }
            }
        }
    };
}

status_register! {
    /// QUEStionable-data summary register.
    Questionable: u16 {
        VOLTAGE = 0,
        CURRENT = 1,
        TIME = 2,
        POWER = 3,
        TEMPERATURE = 4,
        FREQUENCY = 5,
        PHASE = 6,
        MODULATION = 7,
        CALIBRATION = 8,
        /// Instrument summary.
        INSTRUMENT_SUMMARY = 13,
        COMMAND_WARNING = 14,
    }
}

status_register! {
    /// OPERation status summary register.
    Operation: u16 {
        CALIBRATING = 0,
        SETTLING = 1,
        RANGING = 2,
        SWEEPING = 3,
        MEASURING = 4,
        WAITING_FOR_TRIGGER = 5,
        WAITING_FOR_ARM = 6,
        CORRECTING = 7,
        /// Instrument summary.
        INSTRUMENT_SUMMARY = 13,
        PROGRAM_RUNNING = 14,
    }
}

status_register! {
    /// Standard Event Status Register (read by `*ESR?`, enabled by `*ESE`).
    EventStatus: u8 {
        /// Only meaningful for instruments with overlapping commands.
        OPERATION_COMPLETE = 0,
        /// GPIB only.
        REQUEST_CONTROL = 1,
        QUERY_ERROR = 2,
        DEVICE_ERROR = 3,
        EXECUTION_ERROR = 4,
        COMMAND_ERROR = 5,
        USER_REQUEST = 6,
        POWER_ON = 7,
    }
}

status_register! {
    /// Status Byte; bit positions per IEEE 488.2 11.2.
    StatusByte: u8 {
        /// Error/event queue non-empty.
        ERROR_QUEUE = 2,
        QUESTIONABLE = 3,
        /// Message available.
        MAV = 4,
        /// SESR summary.
        EVENT_SUMMARY = 5,
        /// Request service.
        RQS = 6,
        OPERATION = 7,
    }
}

/// The full register set plus enable masks, owned by the interface and updated
/// by a propagation pass after every mutation.
pub struct StatusRegisters {
    pub questionable: Questionable,
    pub questionable_enable: Questionable,
    pub operation: Operation,
    pub operation_enable: Operation,
    pub sesr: EventStatus,
    /// SESR enable mask (`*ESE`).
    pub ese: EventStatus,
    pub stb: StatusByte,
    /// Service-request enable mask over the Status Byte (`*SRE`).
    pub sre: StatusByte,
    pub(crate) mav: bool,
}

impl StatusRegisters {
    /// Power-on state: everything zero except SESR.POWER_ON, with the
    /// QUEStionable and OPERation enables wide open.
    pub(crate) fn new() -> Self {
        StatusRegisters {
            questionable: Questionable(0),
            questionable_enable: Questionable(0xFFFF),
            operation: Operation(0),
            operation_enable: Operation(0xFFFF),
            sesr: EventStatus(EventStatus::POWER_ON),
            ese: EventStatus(0),
            stb: StatusByte(0),
            sre: StatusByte(0),
            mav: false,
        }
    }

    /// Recompute the STB summary bits and RQS; returns true on a 0→1 transition
    /// of RQS, which is when the service-request hook must fire.
    pub(crate) fn update(&mut self, error_queue_nonempty: bool) -> bool {
        let was_requesting = self.stb.get(StatusByte::RQS);

        self.stb.set(StatusByte::ERROR_QUEUE, error_queue_nonempty);
        self.stb.set(
            StatusByte::QUESTIONABLE,
            self.questionable.0 & self.questionable_enable.0 != 0,
        );
        self.stb.set(
            StatusByte::OPERATION,
            self.operation.0 & self.operation_enable.0 != 0,
        );
        self.stb
            .set(StatusByte::EVENT_SUMMARY, self.sesr.0 & self.ese.0 != 0);
        self.stb.set(StatusByte::MAV, self.mav);

        // RQS is derived from the other bits; it never feeds itself
        self.stb.set(StatusByte::RQS, false);
        let requesting = self.stb.0 & self.sre.0 != 0;
        self.stb.set(StatusByte::RQS, requesting);

        requesting && !was_requesting
    }
}
