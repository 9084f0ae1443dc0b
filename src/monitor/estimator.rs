//! Fee rate at first sighting.

use bitcoin::Amount;

/// sat/vB from a wallet fee (BTC, negative for sends) and the raw tx hex.
///
/// Evaluated as `|fee| * 1e8 / hex_len * 2` in that order so results match
/// the rates the operators' existing logs were produced with. Returns `None`
/// for an empty or odd-length hex string.
pub fn estimate_fee_rate(fee_btc: f64, raw_hex: &str) -> Option<f64> {
    let hex_len = raw_hex.len();
    if hex_len == 0 || hex_len % 2 != 0 || !fee_btc.is_finite() {
        return None;
    }
    let sats_per_btc = Amount::ONE_BTC.to_sat() as f64;
    Some(fee_btc.abs() * sats_per_btc / hex_len as f64 * 2.0)
}

/// Serialized size in bytes of a hex-encoded transaction.
pub fn tx_size(raw_hex: &str) -> usize {
    raw_hex.len() / 2
}
