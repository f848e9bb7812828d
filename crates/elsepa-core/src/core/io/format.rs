//! Number formatting in the layout Fortran list-directed input expects.

/// Scientific notation with a signed, at least two-digit exponent: `1.0000e+02`.
pub fn format_scientific(value: f64, precision: usize) -> String {
    let raw = format!("{:.*e}", precision, value);
    match raw.split_once('e') {
        Some((mantissa, exponent)) => {
            let exp: i32 = exponent.parse().unwrap_or(0);
            let sign = if exp < 0 { '-' } else { '+' };
            format!("{}e{}{:02}", mantissa, sign, exp.abs())
        }
        None => raw,
    }
}

/// Reserves a leading column for the sign, so non-negative numbers get a space.
pub fn sign_padded(text: &str) -> String {
    if text.starts_with('-') {
        text.to_string()
    } else {
        format!(" {}", text)
    }
}

pub fn format_integer(value: i64) -> String {
    sign_padded(&value.to_string())
}

/// Shortest round-trip representation, always with a decimal point.
pub fn format_float(value: f64) -> String {
    sign_padded(&format!("{:?}", value))
}
