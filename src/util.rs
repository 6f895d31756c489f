use std::num::ParseIntError;

/// Parse a count like `250`, `64k` or `1.5M`. `suffixes` lists the accepted
/// multiplier letters; `k`, `m` and `g` stand for thousand, million and
/// billion in either case.
pub fn parse_count(s: &str, suffixes: &str) -> Result<usize, String> {
    let s = s.trim();
    let last = match s.chars().last() {
        None => return Err("empty count".to_string()),
        Some(c) => c,
    };
    if !last.is_alphabetic() {
        return s
            .parse()
            .map_err(|e: ParseIntError| format!("bad count {}: {}", s, e));
    }
    if !suffixes.contains(last.to_ascii_lowercase()) {
        return Err(format!("bad multiplier {} in {}", last, s));
    }
    let multiplier = match last.to_ascii_lowercase() {
        'k' => 1e3,
        'm' => 1e6,
        'g' => 1e9,
        _ => return Err(format!("bad multiplier {} in {}", last, s)),
    };
    let number = &s[..s.len() - last.len_utf8()];
    match number.parse::<f64>() {
        Ok(x) if x >= 0. && x.is_finite() => Ok((x * multiplier).round() as usize),
        _ => Err(format!("bad count {}", s)),
    }
}
