//! Color tokens for new shapes.

use serde::{Deserialize, Serialize};

/// Where the controller takes the color of a newly drawn shape from.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorSource {
    /// A fresh random `#rrggbb` token per shape.
    #[default]
    Random,
    /// Always the same token.
    Fixed(String),
}

impl ColorSource {
    pub fn next_color(&self) -> String {
        match self {
            ColorSource::Random => random_color(),
            ColorSource::Fixed(color) => color.clone(),
        }
    }
}

/// Generate a random `#rrggbb` color.
///
/// Uses a counter + hash approach so it needs no entropy crate. The counter
/// is offset by a per-process seed taken from the clock, so separate runs
/// produce different sequences.
pub fn random_color() -> String {
    use std::sync::atomic::{AtomicU32, Ordering};

    static COLOR_COUNTER: AtomicU32 = AtomicU32::new(1);

    let counter = COLOR_COUNTER.fetch_add(1, Ordering::Relaxed);
    color_from(counter, process_seed())
}

fn process_seed() -> u32 {
    use std::sync::OnceLock;

    static SEED: OnceLock<u32> = OnceLock::new();
    *SEED.get_or_init(clock_seed)
}

#[cfg(not(target_arch = "wasm32"))]
fn clock_seed() -> u32 {
    use std::time::{SystemTime, UNIX_EPOCH};

    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos() ^ (d.as_secs() as u32))
        .unwrap_or(0)
}

// No usable clock in the browser sandbox without web bindings.
#[cfg(target_arch = "wasm32")]
fn clock_seed() -> u32 {
    0
}

fn color_from(counter: u32, seed: u32) -> String {
    // splitmix32-style mixing
    let mut x = counter.wrapping_add(seed).wrapping_mul(0x9E3779B9);
    x ^= x >> 16;
    x = x.wrapping_mul(0x85EBCA6B);
    x ^= x >> 13;
    x = x.wrapping_mul(0xC2B2AE35);
    x ^= x >> 16;

    format!("#{:06x}", x & 0x00FF_FFFF)
}
