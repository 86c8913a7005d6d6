/// Whole-unit dollar amount with thousands separators, e.g. `$1,234,568`.
/// Negative amounts keep the sign after the dollar sign: `$-1,235`.
pub fn format_currency(value: f64) -> String {
    if !value.is_finite() {
        return "n/a".to_string();
    }

    let digits = format!("{:.0}", value.abs());
    let negative = value < 0.0 && digits != "0";

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if negative {
        format!("$-{grouped}")
    } else {
        format!("${grouped}")
    }
}
