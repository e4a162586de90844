//! Local failure simulations. These run in the UI process; the host only
//! hears about them over the command channels.

use std::hint::black_box;
use std::time::{Duration, Instant};

/// Busy-spin for `dur`; returns the number of loop iterations.
pub fn cpu_spin(dur: Duration) -> u64 {
    let end = Instant::now() + dur;
    let mut n: u64 = 0;
    let mut acc: f64 = 0.0;
    while Instant::now() < end {
        acc += (n as f64).sqrt();
        n = n.wrapping_add(1);
    }
    black_box(acc);
    n
}

/// Grow an allocation by `chunk_bytes` per step for `steps` steps, touching
/// every page, and return the total bytes held before release.
pub fn leak_growth(chunk_bytes: usize, steps: usize) -> usize {
    let mut held: Vec<Vec<u8>> = Vec::with_capacity(steps);
    for _ in 0..steps {
        held.push(vec![0xAB; chunk_bytes]);
    }
    let total = held.iter().map(Vec::len).sum();
    black_box(&held);
    total
}

/// An operation that always fails; callers catch and log the error instead
/// of letting it take the process down.
pub fn failing_operation() -> anyhow::Result<()> {
    anyhow::bail!("simulated failure requested from the UI")
}
