//! Latency smoothing for resolver servers.
//!
//! `new = α·sample + (1 − α)·old` with α = 0.3, in integer tenths so the
//! result rounds half up exactly. A sample whose weighted share alone exceeds
//! the old value (`α·sample > old`) is treated as an outlier and dropped.

/// α expressed in tenths.
const ALPHA_TENTHS: u64 = 3;

/// Next RTT estimate for a server whose current estimate is `old`.
///
/// An unmeasured server takes the sample as is.
pub fn ewma(old: Option<u32>, sample: u32) -> u32 {
    let Some(old) = old else {
        return sample;
    };
    let (old_w, sample_w) = (u64::from(old), u64::from(sample));
    if sample_w * ALPHA_TENTHS > old_w * 10 {
        return old;
    }
    let smoothed = (sample_w * ALPHA_TENTHS + old_w * (10 - ALPHA_TENTHS) + 5) / 10;
    u32::try_from(smoothed).unwrap_or(u32::MAX)
}
