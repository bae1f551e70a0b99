//! Logical thermostat state and its translation from raw expander bytes.
//!
//! [`ThermState`] is the only shape the outside world sees.  The raw bank
//! bytes ([`RawPins`]) stay inside the crate: they are produced by the
//! expander port and consumed by the store and actuator only.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::pins::{CHANNEL_PINS, ChannelPins};

// ───────────────────────────────────────────────────────────────
// Channels
// ───────────────────────────────────────────────────────────────

/// One of the three relay channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    One,
    Two,
    Three,
}

impl Channel {
    /// Actuation order.
    pub const ALL: [Channel; 3] = [Channel::One, Channel::Two, Channel::Three];

    /// 1-based channel number.
    pub const fn number(self) -> u8 {
        match self {
            Self::One => 1,
            Self::Two => 2,
            Self::Three => 3,
        }
    }

    /// Channel from its 1-based number.
    pub const fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Self::One),
            2 => Some(Self::Two),
            3 => Some(Self::Three),
            _ => None,
        }
    }

    pub(crate) const fn pins(self) -> ChannelPins {
        CHANNEL_PINS[self.number() as usize - 1]
    }
}

/// The two sensor inputs paired with each relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sensor {
    A,
    B,
}

/// View of a single channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChannelState {
    pub relay: bool,
    pub sensor_a: bool,
    pub sensor_b: bool,
}

// ───────────────────────────────────────────────────────────────
// ThermState
// ───────────────────────────────────────────────────────────────

/// Complete snapshot of relay outputs and sensor inputs.
///
/// Serialized with the field names the HTTP transport has always used
/// (`rel1`, `sens01`, ...).  Missing fields read as `false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ThermState {
    #[serde(rename = "rel1")]
    pub relay_1: bool,
    #[serde(rename = "sens01")]
    pub sensor_a_1: bool,
    #[serde(rename = "sens11")]
    pub sensor_b_1: bool,
    #[serde(rename = "rel2")]
    pub relay_2: bool,
    #[serde(rename = "sens02")]
    pub sensor_a_2: bool,
    #[serde(rename = "sens12")]
    pub sensor_b_2: bool,
    #[serde(rename = "rel3")]
    pub relay_3: bool,
    #[serde(rename = "sens03")]
    pub sensor_a_3: bool,
    #[serde(rename = "sens13")]
    pub sensor_b_3: bool,
}

/// Failsafe target: every relay released.
pub const SAFE_STATE: ThermState = ThermState {
    relay_1: false,
    sensor_a_1: false,
    sensor_b_1: false,
    relay_2: false,
    sensor_a_2: false,
    sensor_b_2: false,
    relay_3: false,
    sensor_a_3: false,
    sensor_b_3: false,
};

impl ThermState {
    pub const fn relay(&self, ch: Channel) -> bool {
        match ch {
            Channel::One => self.relay_1,
            Channel::Two => self.relay_2,
            Channel::Three => self.relay_3,
        }
    }

    /// Copy of `self` with one relay changed.
    #[must_use]
    pub const fn with_relay(mut self, ch: Channel, on: bool) -> Self {
        match ch {
            Channel::One => self.relay_1 = on,
            Channel::Two => self.relay_2 = on,
            Channel::Three => self.relay_3 = on,
        }
        self
    }

    pub const fn channel(&self, ch: Channel) -> ChannelState {
        match ch {
            Channel::One => ChannelState {
                relay: self.relay_1,
                sensor_a: self.sensor_a_1,
                sensor_b: self.sensor_b_1,
            },
            Channel::Two => ChannelState {
                relay: self.relay_2,
                sensor_a: self.sensor_a_2,
                sensor_b: self.sensor_b_2,
            },
            Channel::Three => ChannelState {
                relay: self.relay_3,
                sensor_a: self.sensor_a_3,
                sensor_b: self.sensor_b_3,
            },
        }
    }

    /// True when every relay is released (sensor fields are ignored).
    pub const fn relays_off(&self) -> bool {
        !self.relay_1 && !self.relay_2 && !self.relay_3
    }
}

impl fmt::Display for ThermState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for ch in Channel::ALL {
            let c = self.channel(ch);
            let n = ch.number();
            writeln!(
                f,
                "{n}: rel{n}={}\tsens0{n}={}\tsens1{n}={}",
                c.relay, c.sensor_a, c.sensor_b
            )?;
        }
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// RawPins (crate-private)
// ───────────────────────────────────────────────────────────────

/// Bank A/B bytes as last read from or written to the expander.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RawPins([u8; 2]);

impl RawPins {
    pub(crate) const fn from_banks(banks: [u8; 2]) -> Self {
        Self(banks)
    }

    pub(crate) const fn banks(self) -> [u8; 2] {
        self.0
    }

    const fn bit(self, pins: ChannelPins, bit: u8) -> bool {
        (self.0[pins.bank.index()] >> bit) & 1 != 0
    }

    pub(crate) const fn relay(self, ch: Channel) -> bool {
        let pins = ch.pins();
        self.bit(pins, pins.relay_bit)
    }

    /// Copy with exactly one relay bit merged in; every other bit untouched.
    #[must_use]
    pub(crate) const fn with_relay(mut self, ch: Channel, on: bool) -> Self {
        let pins = ch.pins();
        let idx = pins.bank.index();
        let mask = 1u8 << pins.relay_bit;
        self.0[idx] = if on { self.0[idx] | mask } else { self.0[idx] & !mask };
        self
    }

    /// Translate to logical state.  Sensor lines are active-low.
    pub(crate) const fn to_state(self) -> ThermState {
        let c1 = CHANNEL_PINS[0];
        let c2 = CHANNEL_PINS[1];
        let c3 = CHANNEL_PINS[2];
        ThermState {
            relay_1: self.bit(c1, c1.relay_bit),
            sensor_a_1: !self.bit(c1, c1.sensor_a_bit),
            sensor_b_1: !self.bit(c1, c1.sensor_b_bit),
            relay_2: self.bit(c2, c2.relay_bit),
            sensor_a_2: !self.bit(c2, c2.sensor_a_bit),
            sensor_b_2: !self.bit(c2, c2.sensor_b_bit),
            relay_3: self.bit(c3, c3.relay_bit),
            sensor_a_3: !self.bit(c3, c3.sensor_a_bit),
            sensor_b_3: !self.bit(c3, c3.sensor_b_bit),
        }
    }
}
