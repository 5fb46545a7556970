use blake2::{Blake2s256, Digest};
use sha2::Sha256;
use tiny_keccak::{Hasher, Keccak};

use super::{from_bytes, to_bytes, Args, BlackBoxError};
use crate::field::FieldElement;

pub(crate) fn blake2s_digest(message: &[u8]) -> [u8; 32] {
    Blake2s256::digest(message).into()
}

pub(crate) fn blake3_digest(message: &[u8]) -> [u8; 32] {
    *::blake3::hash(message).as_bytes()
}

pub fn sha256(args: &Args<'_>) -> Result<Vec<FieldElement>, BlackBoxError> {
    let message = to_bytes(args.values)?;
    let digest: [u8; 32] = Sha256::digest(&message).into();
    Ok(from_bytes(&digest))
}

pub fn blake2s(args: &Args<'_>) -> Result<Vec<FieldElement>, BlackBoxError> {
    Ok(from_bytes(&blake2s_digest(&to_bytes(args.values)?)))
}

pub fn blake3(args: &Args<'_>) -> Result<Vec<FieldElement>, BlackBoxError> {
    Ok(from_bytes(&blake3_digest(&to_bytes(args.values)?)))
}

/// The last input is the number of leading message bytes to hash.
pub fn keccak256(args: &Args<'_>) -> Result<Vec<FieldElement>, BlackBoxError> {
    let (size, message) = args
        .values
        .split_last()
        .ok_or_else(|| BlackBoxError::InvalidInput("missing message size".to_string()))?;
    let message = to_bytes(message)?;
    let size = size
        .to_u128()
        .filter(|size| *size <= message.len() as u128)
        .ok_or_else(|| {
            BlackBoxError::InvalidInput(format!(
                "message size {size} exceeds {} input bytes",
                message.len()
            ))
        })? as usize;

    let mut hasher = Keccak::v256();
    hasher.update(&message[..size]);
    let mut digest = [0u8; 32];
    hasher.finalize(&mut digest);
    Ok(from_bytes(&digest))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(
        f: fn(&Args<'_>) -> Result<Vec<FieldElement>, BlackBoxError>,
        bytes: &[u64],
    ) -> Result<String, BlackBoxError> {
        let values: Vec<FieldElement> = bytes.iter().map(|b| FieldElement::from(*b)).collect();
        let num_bits = vec![8; values.len()];
        let out = f(&Args {
            values: &values,
            num_bits: &num_bits,
            params: &[],
        })?;
        let digest: Vec<u8> = out.iter().map(|v| v.to_be_bytes()[31]).collect();
        Ok(hex::encode(digest))
    }

    const ABC: [u64; 3] = [0x61, 0x62, 0x63];

    #[test]
    fn test_sha256() {
        assert_eq!(
            run(sha256, &ABC).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_blake2s() {
        assert_eq!(
            run(blake2s, &ABC).unwrap(),
            "508c5e8c327c14e2e1a72ba34eeb452f37458b209ed63a294d999b4c86675982"
        );
    }

    #[test]
    fn test_blake3() {
        assert_eq!(
            run(blake3, &ABC).unwrap(),
            "6437b3ac38465133ffb63b75273a8db548c558465d79db03fd359c6cd5bd9d85"
        );
    }

    #[test]
    fn test_keccak256_var_size() {
        let empty = "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470";
        assert_eq!(run(keccak256, &[0]).unwrap(), empty);
        // size zero ignores the padding bytes
        assert_eq!(run(keccak256, &[0x61, 0x62, 0]).unwrap(), empty);
        assert!(matches!(
            run(keccak256, &[0x61, 2]),
            Err(BlackBoxError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_rejects_non_bytes() {
        assert!(matches!(
            run(sha256, &[0x61, 0x100]),
            Err(BlackBoxError::InvalidInput(_))
        ));
    }
}
