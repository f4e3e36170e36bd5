use crate::{DataPoint, TickcacheError};

/// Check that paired ask and bid series line up point for point.
///
/// Lengths must match, then the boundary timestamps, then every timestamp in
/// between. The first mismatch is reported.
///
/// # Errors
/// Returns `TickcacheError::Incoherent` describing the first mismatch.
pub fn ensure_coherent(ask: &[DataPoint], bid: &[DataPoint]) -> Result<(), TickcacheError> {
    let err = |detail: String| TickcacheError::incoherent(ask.len(), bid.len(), detail);
    if ask.len() != bid.len() {
        return Err(err("length mismatch".into()));
    }
    let (Some(a_first), Some(b_first)) = (ask.first(), bid.first()) else {
        return Ok(());
    };
    if a_first.timestamp() != b_first.timestamp() {
        return Err(err(format!(
            "first timestamp differs: ask={} bid={}",
            a_first.timestamp(),
            b_first.timestamp()
        )));
    }
    if let (Some(a_last), Some(b_last)) = (ask.last(), bid.last())
        && a_last.timestamp() != b_last.timestamp()
    {
        return Err(err(format!(
            "last timestamp differs: ask={} bid={}",
            a_last.timestamp(),
            b_last.timestamp()
        )));
    }
    if let Some((i, (a, b))) = ask
        .iter()
        .zip(bid)
        .enumerate()
        .find(|(_, (a, b))| a.timestamp() != b.timestamp())
    {
        return Err(err(format!(
            "timestamp differs at index {i}: ask={} bid={}",
            a.timestamp(),
            b.timestamp()
        )));
    }
    Ok(())
}
