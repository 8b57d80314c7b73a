//! Significant-figure number rendering for report text.

/// Render `x` with `sig` significant figures, `%g` style.
///
/// Fixed notation is used when the decimal exponent is in `[-4, sig)`,
/// scientific otherwise; trailing zeros are trimmed in both forms.
pub fn format_sig(x: f64, sig: usize) -> String {
    if x.is_nan() {
        return "nan".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if x == 0.0 {
        return "0".to_string();
    }

    let sig = sig.max(1);
    let sci = format!("{:.*e}", sig - 1, x);
    let (mantissa, exp) = match sci.split_once('e') {
        Some((m, e)) => (m.to_string(), e.parse::<i32>().unwrap_or(0)),
        None => return sci,
    };

    if exp < -4 || exp >= sig as i32 {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", trim_zeros(&mantissa), sign, exp.abs())
    } else {
        let decimals = (sig as i32 - 1 - exp).max(0) as usize;
        trim_zeros(&format!("{:.*}", decimals, x))
    }
}

/// Three significant figures, the precision used throughout the reports.
pub fn sig3(x: f64) -> String {
    format_sig(x, 3)
}

fn trim_zeros(s: &str) -> String {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s.to_string()
    }
}
