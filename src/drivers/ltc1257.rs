//! LTC1257 12-bit serial DAC, bit-banged over three GPIOs.
//!
//! ## Protocol
//!
//! ```text
//!        ┌─┐ ┌─┐ ┌─┐       ┌─┐
//! SCK  ──┘ └─┘ └─┘ └─ ··· ─┘ └──────────
//! DIN   b11 b10  b9   ···  b0
//! LOAD ─────────────────────────┐ ┌─────
//!                               └─┘
//! ```
//!
//! Data is shifted in MSB first and sampled on the rising edge of SCK.
//! Pulling LOAD low and releasing it copies the shift register to the
//! output; LOAD idles high.  The output is 0 – 2.048 V (0.5 mV/LSB).
//!
//! The shift register has no framing: a transfer interrupted half-way
//! by something else toggling these pins cannot be recovered, so the
//! caller keeps writes out of interrupt context.

use embedded_hal::digital::{OutputPin, PinState};

use crate::app::ports::AnalogOutput;

/// Width of the DAC shift register.
pub const DAC_BITS: u32 = 12;

/// Largest code the DAC accepts.
pub const DAC_MAX_CODE: u16 = (1 << DAC_BITS) - 1;

/// Bit-banged LTC1257 driver.
pub struct Ltc1257<DIN, SCK, LOAD> {
    din: DIN,
    sck: SCK,
    load: LOAD,
    /// Last code latched onto the output.
    code: u16,
}

impl<DIN, SCK, LOAD, E> Ltc1257<DIN, SCK, LOAD>
where
    DIN: OutputPin<Error = E>,
    SCK: OutputPin<Error = E>,
    LOAD: OutputPin<Error = E>,
{
    /// Take ownership of the three lines and drive them to idle.
    pub fn new(din: DIN, sck: SCK, load: LOAD) -> Result<Self, E> {
        let mut dac = Self {
            din,
            sck,
            load,
            code: 0,
        };
        dac.initialize()?;
        Ok(dac)
    }

    /// Idle levels: clock low, data low, load high (latch closed).
    pub fn initialize(&mut self) -> Result<(), E> {
        self.din.set_low()?;
        self.sck.set_low()?;
        self.load.set_high()
    }

    /// Shift `code` (masked to 12 bits) out and latch it.
    pub fn write(&mut self, code: u16) -> Result<(), E> {
        let code = code & DAC_MAX_CODE;

        for bit in (0..DAC_BITS).rev() {
            self.sck.set_low()?;
            self.din.set_state(PinState::from(code & (1 << bit) != 0))?;
            self.sck.set_high()?;
        }
        self.sck.set_low()?;

        self.load.set_low()?;
        self.load.set_high()?;

        self.code = code;
        Ok(())
    }

    /// The code most recently latched by [`write`](Self::write).
    pub fn last_code(&self) -> u16 {
        self.code
    }

    /// Give the pins back.
    pub fn release(self) -> (DIN, SCK, LOAD) {
        (self.din, self.sck, self.load)
    }
}

impl<DIN, SCK, LOAD, E> AnalogOutput for Ltc1257<DIN, SCK, LOAD>
where
    DIN: OutputPin<Error = E>,
    SCK: OutputPin<Error = E>,
    LOAD: OutputPin<Error = E>,
{
    type Error = E;

    fn write_code(&mut self, code: u16) -> Result<(), E> {
        self.write(code)
    }
}
