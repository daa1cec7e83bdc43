//! CSV codec for recorded sessions.
//!
//! Layout: a header row `timestamp,cpu_usage,ram_usage,gpu_usage,vram_usage,fps`
//! then one row per sample in recording order. All fields are numeric, so no
//! quoting is ever produced or accepted. Floats are written with Rust's
//! shortest round-trip formatting, which makes `decode(encode(s)) == s` exact.

use crate::error::{ProfilerError, Result};
use crate::metrics::Sample;
use std::fmt::Write as _;
use std::path::Path;

/// Column names in file order.
pub const HEADER: [&str; 6] = [
    "timestamp",
    "cpu_usage",
    "ram_usage",
    "gpu_usage",
    "vram_usage",
    "fps",
];

/// Render samples as CSV text, header first.
pub fn encode(samples: &[Sample]) -> String {
    let mut out = String::with_capacity(64 + samples.len() * 64);
    out.push_str(&HEADER.join(","));
    out.push('\n');

    for sample in samples {
        let fields = sample.fields();
        for (i, value) in fields.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            // Debug keeps a trailing ".0" and round-trips exactly
            let _ = write!(out, "{:?}", value);
        }
        out.push('\n');
    }

    out
}

/// Parse CSV text into samples.
///
/// Any malformed header or row fails the whole decode with
/// [`ProfilerError::Decode`]; no partial result is returned. A well-formed
/// file without data rows yields [`ProfilerError::EmptyData`].
pub fn decode(text: &str) -> Result<Vec<Sample>> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line))
        .filter(|(_, line)| !line.trim().is_empty());

    let (header_line, header) = lines
        .next()
        .ok_or_else(|| ProfilerError::decode_error(1, "missing header row"))?;
    check_header(header_line, header)?;

    let mut samples = Vec::new();
    for (line_no, line) in lines {
        samples.push(decode_row(line_no, line)?);
    }

    if samples.is_empty() {
        return Err(ProfilerError::EmptyData);
    }

    Ok(samples)
}

fn check_header(line_no: usize, header: &str) -> Result<()> {
    let columns: Vec<&str> = header.split(',').map(str::trim).collect();
    if columns != HEADER {
        return Err(ProfilerError::decode_error(
            line_no,
            format!("expected header '{}', found '{}'", HEADER.join(","), header.trim()),
        ));
    }
    Ok(())
}

fn decode_row(line_no: usize, line: &str) -> Result<Sample> {
    let mut values = [0.0f64; 6];
    let mut fields = line.split(',');

    for (slot, column) in values.iter_mut().zip(HEADER.iter()) {
        let raw = fields
            .next()
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .ok_or_else(|| {
                ProfilerError::decode_error(line_no, format!("missing field '{}'", column))
            })?;
        *slot = raw.parse::<f64>().map_err(|_| {
            ProfilerError::decode_error(
                line_no,
                format!("field '{}' is not a number: '{}'", column, raw),
            )
        })?;
    }

    if fields.next().is_some() {
        return Err(ProfilerError::decode_error(
            line_no,
            format!("expected {} fields", HEADER.len()),
        ));
    }

    let [elapsed_seconds, cpu_percent, ram_gb, gpu_percent, vram_gb, fps_estimate] = values;
    Ok(Sample {
        elapsed_seconds,
        cpu_percent,
        ram_gb,
        gpu_percent,
        vram_gb,
        fps_estimate,
    })
}

/// Write samples to `path`. I/O failures are reported as [`ProfilerError::Export`].
pub fn write_file(path: impl AsRef<Path>, samples: &[Sample]) -> Result<()> {
    let path = path.as_ref();
    std::fs::write(path, encode(samples)).map_err(|source| ProfilerError::Export {
        path: path.to_path_buf(),
        source,
    })
}

/// Read and decode a CSV file.
pub fn read_file(path: impl AsRef<Path>) -> Result<Vec<Sample>> {
    let text = std::fs::read_to_string(path)?;
    decode(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario() -> Vec<Sample> {
        vec![
            Sample::new(0.0, 10.0, 2.0, 0.0, 0.0, 0.0),
            Sample::new(0.5, 15.0, 2.1, 0.0, 0.0, 2.0),
            Sample::new(1.0, 20.0, 2.2, 0.0, 0.0, 4.0),
        ]
    }

    #[test]
    fn test_encode_layout() {
        let text = encode(&scenario());
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("timestamp,cpu_usage,ram_usage,gpu_usage,vram_usage,fps")
        );
        assert_eq!(lines.next(), Some("0.0,10.0,2.0,0.0,0.0,0.0"));
        assert_eq!(lines.next(), Some("0.5,15.0,2.1,0.0,0.0,2.0"));
        assert_eq!(lines.next(), Some("1.0,20.0,2.2,0.0,0.0,4.0"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_round_trip_keeps_full_precision() {
        let samples = vec![
            Sample::new(0.1 + 0.2, 33.333333333333336, 15.732421875, 99.9, 1e-7, 57.5),
            Sample::new(0.6000000000000001, 0.0, 1e20, 12.5, 3.25, 1.9999999999999998),
        ];
        let decoded = decode(&encode(&samples)).unwrap();
        assert_eq!(decoded, samples);
    }

    #[test]
    fn test_encode_does_not_clamp_fps() {
        let samples = vec![Sample::new(0.0, 1.0, 1.0, 0.0, 0.0, 45.25)];
        let decoded = decode(&encode(&samples)).unwrap();
        assert_eq!(decoded[0].fps_estimate, 45.25);
    }

    #[test]
    fn test_header_mismatch_fails() {
        let text = "timestamp,ram_usage,cpu_usage,gpu_usage,vram_usage,fps\n0,1,2,3,4,5\n";
        let err = decode(text).unwrap_err();
        assert!(matches!(err, ProfilerError::Decode { line: 1, .. }));
    }

    #[test]
    fn test_non_numeric_field_fails_whole_file() {
        let text = "timestamp,cpu_usage,ram_usage,gpu_usage,vram_usage,fps\n\
                    0.0,10.0,2.0,0.0,0.0,0.0\n\
                    0.5,abc,2.1,0.0,0.0,2.0\n\
                    1.0,20.0,2.2,0.0,0.0,4.0\n";
        let err = decode(text).unwrap_err();
        match err {
            ProfilerError::Decode { line, reason } => {
                assert_eq!(line, 3);
                assert!(reason.contains("cpu_usage"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_and_extra_fields_fail() {
        let missing = "timestamp,cpu_usage,ram_usage,gpu_usage,vram_usage,fps\n0.0,10.0,2.0,0.0,0.0\n";
        assert!(matches!(decode(missing), Err(ProfilerError::Decode { line: 2, .. })));

        let empty_field = "timestamp,cpu_usage,ram_usage,gpu_usage,vram_usage,fps\n0.0,,2.0,0.0,0.0,1.0\n";
        assert!(matches!(decode(empty_field), Err(ProfilerError::Decode { line: 2, .. })));

        let extra = "timestamp,cpu_usage,ram_usage,gpu_usage,vram_usage,fps\n0,1,2,3,4,5,6\n";
        assert!(matches!(decode(extra), Err(ProfilerError::Decode { line: 2, .. })));
    }

    #[test]
    fn test_header_only_is_empty_data() {
        let text = "timestamp,cpu_usage,ram_usage,gpu_usage,vram_usage,fps\n";
        let err = decode(text).unwrap_err();
        assert!(err.is_empty_data());
    }

    #[test]
    fn test_empty_text_is_decode_error() {
        assert!(matches!(decode(""), Err(ProfilerError::Decode { .. })));
    }

    #[test]
    fn test_accepts_crlf_bom_and_spaced_header() {
        let text = "\u{feff}timestamp, cpu_usage, ram_usage, gpu_usage, vram_usage, fps\r\n\
                    0.0,10.0,2.0,0.0,0.0,0.0\r\n\
                    \r\n\
                    0.5,15,2.1,0,0,2\r\n";
        let decoded = decode(text).unwrap();
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[1], Sample::new(0.5, 15.0, 2.1, 0.0, 0.0, 2.0));
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.csv");
        write_file(&path, &scenario()).unwrap();
        assert_eq!(read_file(&path).unwrap(), scenario());
    }

    #[test]
    fn test_write_into_missing_directory_is_export_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("session.csv");
        let err = write_file(&path, &scenario()).unwrap_err();
        assert!(matches!(err, ProfilerError::Export { .. }));
    }
}
