use std::io::{Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::error::SolverError;

pub fn decompress(bytes: &[u8]) -> Result<Vec<u8>, SolverError> {
    if bytes.is_empty() {
        return Err(SolverError::MalformedInput("empty bytecode buffer".to_string()));
    }
    let mut raw = Vec::new();
    GzDecoder::new(bytes)
        .read_to_end(&mut raw)
        .map_err(|e| SolverError::MalformedInput(format!("invalid gzip stream: {e}")))?;
    Ok(raw)
}

pub fn compress(raw: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(raw)?;
    encoder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &[u8] = include_bytes!("../tests/fixtures/schnorr_verify.gz");

    #[test]
    fn test_decompress_fixture() {
        let raw = decompress(FIXTURE).unwrap();
        assert_eq!(raw.len(), 1305);
        // one function, current witness index 100
        assert_eq!(&raw[..12], &[1, 0, 0, 0, 0, 0, 0, 0, 100, 0, 0, 0]);
    }

    #[test]
    fn test_compress_then_decompress() {
        let raw = b"any byte sequence at all".to_vec();
        assert_eq!(decompress(&compress(&raw).unwrap()).unwrap(), raw);
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(
            decompress(b"definitely not gzip"),
            Err(SolverError::MalformedInput(_))
        ));
        assert!(matches!(decompress(&[]), Err(SolverError::MalformedInput(_))));
        assert!(matches!(
            decompress(&FIXTURE[..FIXTURE.len() / 2]),
            Err(SolverError::MalformedInput(_))
        ));
    }
}
