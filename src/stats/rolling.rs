//! Rolling and day-over-day transforms aligned to the input index.
//!
//! Both functions return one slot per input value; slots where the quantity is
//! undefined are `None` rather than a partial or approximated number.

/// Simple moving average over `window` observations.
///
/// Slot `i` is `Some(mean(values[i + 1 - window ..= i]))` when `i >= window - 1`,
/// otherwise `None`. A window of 0 yields no defined values.
pub fn moving_average(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if window == 0 || values.len() < window {
        return out;
    }

    let n = window as f64;
    for (offset, w) in values.windows(window).enumerate() {
        out[offset + window - 1] = Some(w.iter().sum::<f64>() / n);
    }
    out
}

/// Close-to-close simple returns (`c[i] / c[i-1] - 1`).
///
/// The first slot is always `None`; so is any slot whose previous value is 0.
pub fn daily_returns(closes: &[f64]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(closes.len());
    if closes.is_empty() {
        return out;
    }
    out.push(None);
    for pair in closes.windows(2) {
        let (prev, cur) = (pair[0], pair[1]);
        out.push((prev != 0.0).then(|| cur / prev - 1.0));
    }
    out
}
