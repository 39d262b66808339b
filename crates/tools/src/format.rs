use std::time::Duration;

/// Group digits in thousands: `16382` becomes `16,382`.
pub fn pretty_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Short human duration: `850ms`, `4.2s`, `3m 07s`, `1h 02m`.
pub fn pretty_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs == 0 {
        format!("{}ms", d.as_millis())
    } else if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {:02}s", secs / 60, secs % 60)
    } else {
        format!("{}h {:02}m", secs / 3600, (secs % 3600) / 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_are_grouped() {
        assert_eq!(pretty_count(0), "0");
        assert_eq!(pretty_count(999), "999");
        assert_eq!(pretty_count(1000), "1,000");
        assert_eq!(pretty_count(16382), "16,382");
        assert_eq!(pretty_count(1_234_567), "1,234,567");
    }

    #[test]
    fn durations_pick_a_unit() {
        assert_eq!(pretty_duration(Duration::from_millis(850)), "850ms");
        assert_eq!(pretty_duration(Duration::from_millis(4200)), "4.2s");
        assert_eq!(pretty_duration(Duration::from_secs(187)), "3m 07s");
        assert_eq!(pretty_duration(Duration::from_secs(3720)), "1h 02m");
    }
}
