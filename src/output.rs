use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::cli::OutputFormat;

/// Writes the key bytes to stdout or a file in the specified format.
pub fn write_output(
    bytes: &[u8],
    format: &OutputFormat,
    output_file: Option<&Path>,
) -> io::Result<()> {
    match output_file {
        Some(path) => {
            let f = File::create(path)?;
            let mut out = BufWriter::new(f);
            format_output(bytes, format, &mut out)?;
            out.flush()
        }
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            format_output(bytes, format, &mut out)?;
            out.flush()
        }
    }
}

pub fn format_output(bytes: &[u8], format: &OutputFormat, out: &mut dyn Write) -> io::Result<()> {
    match format {
        OutputFormat::Hex => {
            for b in bytes {
                write!(out, "{:02x}", b)?;
            }
            writeln!(out)?;
        }
        OutputFormat::HexUpper => {
            for b in bytes {
                write!(out, "{:02X}", b)?;
            }
            writeln!(out)?;
        }
        OutputFormat::Binary => {
            // Contiguous, most significant bit of each byte first
            for b in bytes {
                write!(out, "{:08b}", b)?;
            }
            writeln!(out)?;
        }
        OutputFormat::Base64 => {
            writeln!(out, "{}", STANDARD.encode(bytes))?;
        }
        OutputFormat::Raw => {
            out.write_all(bytes)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format_to_string(bytes: &[u8], fmt: &OutputFormat) -> String {
        let mut buf = Vec::new();
        format_output(bytes, fmt, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_hex() {
        let out = format_to_string(&[0xde, 0xad, 0xbe, 0xef], &OutputFormat::Hex);
        assert_eq!(out, "deadbeef\n");
    }

    #[test]
    fn test_hex_upper() {
        let out = format_to_string(&[0xde, 0xad, 0xbe, 0xef], &OutputFormat::HexUpper);
        assert_eq!(out, "DEADBEEF\n");
    }

    #[test]
    fn test_binary_contiguous() {
        let out = format_to_string(&[0b10101010, 0b00001111], &OutputFormat::Binary);
        assert_eq!(out, "1010101000001111\n");
    }

    #[test]
    fn test_base64() {
        let out = format_to_string(&[0x00, 0x01, 0x02], &OutputFormat::Base64);
        assert_eq!(out, "AAEC\n");
    }

    #[test]
    fn test_raw() {
        let data = vec![0x01, 0x02, 0x03];
        let mut buf = Vec::new();
        format_output(&data, &OutputFormat::Raw, &mut buf).unwrap();
        assert_eq!(buf, data);
    }
}
