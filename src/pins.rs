//! MCP23S17 pin assignments for the relay board.
//!
//! Single source of truth: the state translation and the simulated
//! expander reference this module rather than hard-coding bit positions.
//!
//! ```text
//! GPA (bank A, byte 0)          GPB (bank B, byte 1)
//!   A0  relay 1      OUT          B0  relay 3      OUT
//!   A1  sensor-a 1   IN           B1  sensor-a 3   IN
//!   A2  sensor-b 1   IN           B2  sensor-b 3   IN
//!   A3  n/c          OUT          B3..B7 n/c       OUT
//!   A4  relay 2      OUT
//!   A5  sensor-a 2   IN
//!   A6  sensor-b 2   IN
//!   A7  n/c          OUT
//! ```

// ---------------------------------------------------------------------------
// Register configuration
// ---------------------------------------------------------------------------

/// IODIR values for banks A and B (1 = input, 0 = output).
pub const IODIR: [u8; 2] = [0x66, 0x06];

/// Power-on output levels: every relay released.
pub const DEFAULT_LEVELS: [u8; 2] = [0x00, 0x00];

// ---------------------------------------------------------------------------
// Per-channel bit positions
// ---------------------------------------------------------------------------

/// Expander bank holding a channel's pins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bank {
    A,
    B,
}

impl Bank {
    /// Byte index of this bank in a bulk read/write.
    pub const fn index(self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
        }
    }
}

/// Bit positions of one relay channel within its bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelPins {
    pub bank: Bank,
    /// Relay output (active HIGH).
    pub relay_bit: u8,
    /// First sensor input (active LOW).
    pub sensor_a_bit: u8,
    /// Second sensor input (active LOW).
    pub sensor_b_bit: u8,
}

/// Channel 1..3 pin maps, indexed by `channel - 1`.
pub const CHANNEL_PINS: [ChannelPins; 3] = [
    ChannelPins { bank: Bank::A, relay_bit: 0, sensor_a_bit: 1, sensor_b_bit: 2 },
    ChannelPins { bank: Bank::A, relay_bit: 4, sensor_a_bit: 5, sensor_b_bit: 6 },
    ChannelPins { bank: Bank::B, relay_bit: 0, sensor_a_bit: 1, sensor_b_bit: 2 },
];
