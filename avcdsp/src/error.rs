use thiserror::Error;

#[derive(Debug, Error)]
pub enum DspError {
    #[error("invalid dimensions {width}x{height}: width and height must be non-zero multiples of 16")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("frame dimension mismatch: expected {expected_w}x{expected_h}, got {got_w}x{got_h}")]
    DimensionMismatch {
        expected_w: u32,
        expected_h: u32,
        got_w: u32,
        got_h: u32,
    },

    #[error("invalid qp {0}: must be 0..=51")]
    InvalidQp(u8),

    #[error("malformed Y4M data: {0}")]
    InvalidY4m(String),

    #[error("unsupported backend: {0}")]
    UnsupportedBackend(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_values() {
        let e = DspError::InvalidDimensions {
            width: 20,
            height: 16,
        };
        assert!(e.to_string().contains("20x16"));

        let e = DspError::DimensionMismatch {
            expected_w: 32,
            expected_h: 32,
            got_w: 16,
            got_h: 32,
        };
        assert_eq!(
            e.to_string(),
            "frame dimension mismatch: expected 32x32, got 16x32"
        );

        assert!(DspError::InvalidQp(60).to_string().contains("60"));
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.y4m");
        let e: DspError = io.into();
        assert!(matches!(e, DspError::Io(_)));
        assert!(e.to_string().contains("missing.y4m"));
    }
}
