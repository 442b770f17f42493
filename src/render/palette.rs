// Diverging blue-white-red palette for the correlation heatmap.
//
// Anchors follow the classic "coolwarm" map: deep blue at -1, light grey at
// 0, deep red at +1, linearly interpolated in RGB between them.

const COOL: (f64, f64, f64) = (59.0, 76.0, 192.0);
const NEUTRAL: (f64, f64, f64) = (221.0, 221.0, 221.0);
const WARM: (f64, f64, f64) = (180.0, 4.0, 38.0);

/// Colour for a value in [-1, 1], centred on 0.  Out-of-range input is clamped.
pub fn coolwarm(value: f64) -> (u8, u8, u8) {
    let v = if value.is_finite() { value.clamp(-1.0, 1.0) } else { 0.0 };
    let (from, to, t) = if v < 0.0 {
        (NEUTRAL, COOL, -v)
    } else {
        (NEUTRAL, WARM, v)
    };
    (lerp(from.0, to.0, t), lerp(from.1, to.1, t), lerp(from.2, to.2, t))
}

/// `true` when a cell is saturated enough to need white annotation text.
pub fn needs_light_text(value: f64) -> bool {
    value.abs() > 0.6
}

fn lerp(a: f64, b: f64, t: f64) -> u8 {
    (a + (b - a) * t).round().clamp(0.0, 255.0) as u8
}
