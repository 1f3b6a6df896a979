//! Acquisition: from device bytes (or the demo generator) to waveform frames
//!
//! ```text
//! bytes ─► LineFramer ─► lines ─► decode ─┬─► Waveform ─► SampleScaler ─► WaveformFrame
//!                                         └─► Frequency / Voltage measurements
//! DemoSignalGenerator::tick ───────────────────────────────────────────► WaveformFrame
//! ```
//!
//! - [`framer`] - Bounded line reassembly with overflow resynchronisation
//! - [`protocol`] - `DATA:`/`FREQ:`/`VOLT:` decoding and host commands
//! - [`scaler`] - ADC code to voltage conversion
//! - [`demo`] - Deterministic synthetic frame source

pub mod demo;
pub mod framer;
pub mod protocol;
pub mod scaler;

pub use demo::DemoSignalGenerator;
pub use framer::{CarryBuffer, Framed, LineFramer, RawLine, DEFAULT_CARRY_CAPACITY};
pub use protocol::{decode, DecodeError, DeviceCommand, ProtocolMessage};
pub use scaler::{scale, SampleScaler, DEFAULT_CODE_MAX};
