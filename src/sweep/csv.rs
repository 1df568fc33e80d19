//! Sweep CSV line parser (spec §4.7).
//!
//! Ported from `original_source/scripts/processors/sweep_processor.py`'s
//! `SweepProcessor.process_line` field parsing: `date, time, hz_low,
//! hz_high, hz_bin_width, num_samples, dB, dB, ...`. Non-numeric fields
//! or lines with fewer than 7 fields are dropped silently (spec §7).

/// One parsed sweep segment: the bin layout plus the measured dB value
/// for each bin.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepLine {
    pub hz_low: f64,
    pub hz_bin_width: f64,
    pub db_values: Vec<f64>,
}

impl SweepLine {
    /// Bin center frequencies paired with their measured dB value
    /// (spec §4.7: `int(hz_low + bin_width * i + bin_width / 2)`).
    pub fn bins(&self) -> impl Iterator<Item = (i64, f64)> + '_ {
        self.db_values.iter().enumerate().map(move |(i, &db)| {
            let center = self.hz_low + self.hz_bin_width * i as f64 + self.hz_bin_width / 2.0;
            (center as i64, db)
        })
    }
}

/// Parse one non-empty, non-`#` hackrf_sweep CSV line. Returns `None` for
/// comment/blank lines, lines with fewer than 7 comma-separated fields,
/// or any non-numeric field among the ones this parser reads.
pub fn parse_line(line: &str) -> Option<SweepLine> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let parts: Vec<&str> = line.split(',').collect();
    if parts.len() < 7 {
        return None;
    }

    let hz_low: f64 = parts[2].trim().parse().ok()?;
    let hz_bin_width: f64 = parts[4].trim().parse().ok()?;
    // parts[3] (hz_high) and parts[5] (num_samples) are present in the
    // wire format but unused by this parser, matching the reference.
    let db_values = parts[6..]
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(|v| v.parse::<f64>())
        .collect::<Result<Vec<f64>, _>>()
        .ok()?;

    Some(SweepLine {
        hz_low,
        hz_bin_width,
        db_values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_well_formed_line() {
        let line = "2024-01-01,00:00:00,2400000000,2401000000,1000000,10,-70.0,-71.5";
        let parsed = parse_line(line).unwrap();
        assert_eq!(parsed.hz_low, 2_400_000_000.0);
        assert_eq!(parsed.hz_bin_width, 1_000_000.0);
        assert_eq!(parsed.db_values, vec![-70.0, -71.5]);
    }

    #[test]
    fn bin_centers_match_spec_formula() {
        let parsed = SweepLine {
            hz_low: 2_400_000_000.0,
            hz_bin_width: 1_000_000.0,
            db_values: vec![-70.0, -71.5],
        };
        let bins: Vec<(i64, f64)> = parsed.bins().collect();
        assert_eq!(bins[0], (2_400_500_000, -70.0));
        assert_eq!(bins[1], (2_401_500_000, -71.5));
    }

    #[test]
    fn drops_blank_and_comment_lines() {
        assert!(parse_line("").is_none());
        assert!(parse_line("   ").is_none());
        assert!(parse_line("# a comment").is_none());
    }

    #[test]
    fn drops_lines_with_too_few_fields() {
        assert!(parse_line("2024-01-01,00:00:00,2400000000,2401000000,1000000").is_none());
    }

    #[test]
    fn drops_lines_with_non_numeric_required_fields() {
        assert!(parse_line("2024-01-01,00:00:00,not-a-number,x,1000000,10,-70.0").is_none());
    }
}
