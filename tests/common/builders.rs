//! Test data builders for configs and wire traffic

use scopevis_rs::acquisition::protocol::{encode_frequency, encode_voltage, encode_waveform};
use scopevis_rs::config::AppConfig;
use scopevis_rs::types::{TriggerMode, TriggerSlope, VoltageReading};

/// Builder for creating test configurations
pub struct ConfigBuilder {
    config: AppConfig,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
        }
    }

    pub fn frame_len(mut self, frame_len: usize) -> Self {
        self.config.acquisition.frame_len = frame_len;
        self
    }

    pub fn carry_capacity(mut self, capacity: usize) -> Self {
        self.config.acquisition.carry_capacity = capacity;
        self
    }

    pub fn trigger(mut self, mode: TriggerMode, slope: TriggerSlope) -> Self {
        self.config.trigger.mode = mode;
        self.config.trigger.slope = slope;
        self
    }

    pub fn request_every(mut self, n: u32) -> Self {
        self.config.measurement.request_every = n;
        self
    }

    pub fn tick_ms(mut self, ms: u64) -> Self {
        self.config.demo.tick_ms = ms;
        self
    }

    pub fn build(self) -> AppConfig {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A terminated `DATA:` line
pub fn data_line(codes: &[i32]) -> String {
    format!("{}\n", encode_waveform(codes))
}

pub fn freq_line(hz: f64) -> String {
    format!("{}\n", encode_frequency(hz))
}

pub fn volt_line(values: [f64; 4]) -> String {
    format!("{}\n", encode_voltage(&VoltageReading::new(values)))
}

/// Codes that stay below mid-scale: no rising edge at 2.5 V
pub fn flat_low(len: usize) -> Vec<i32> {
    vec![100; len]
}

/// Codes stepping from low to high half way through: one rising edge at 2.5 V
pub fn rising_step(len: usize) -> Vec<i32> {
    (0..len).map(|i| if i < len / 2 { 100 } else { 900 }).collect()
}

/// Split `bytes` into chunks cycling through `sizes`
pub fn chunked<'a>(bytes: &'a [u8], sizes: &[usize]) -> Vec<&'a [u8]> {
    let mut out = Vec::new();
    let mut rest = bytes;
    let mut i = 0;
    while !rest.is_empty() {
        let n = sizes[i % sizes.len()].max(1).min(rest.len());
        let (head, tail) = rest.split_at(n);
        out.push(head);
        rest = tail;
        i += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunked_preserves_bytes() {
        let data = b"DATA:1,2,3\nFREQ:50.00\n";
        let chunks = chunked(data, &[3, 1, 7]);
        assert_eq!(chunks.concat(), data.to_vec());
        assert_eq!(chunks[0], b"DAT");
    }
}
