//! EVM-style word encoding for proofs and keys
//!
//! Everything crossing the prover/verifier boundary is a list of 256-bit
//! big-endian words:
//!
//! - G1 point: `[x, y]`, the point at infinity is `[0, 0]`
//! - G2 point: `[x.c1, x.c0, y.c1, y.c0]` (imaginary part first)
//! - scalar: the canonical integer below the field modulus
//!
//! Decoding is strict: coordinates must be canonical base-field integers
//! and points must lie on the curve in the prime-order subgroup.

use std::fmt;
use std::str::FromStr;

use ark_bn254::{Fq, Fq2, G1Affine, G2Affine};
use ark_ec::AffineRepr;
use ark_ff::{BigInt, BigInteger, PrimeField, Zero};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodingError {
    #[error("invalid hex word: {0}")]
    InvalidHex(String),

    #[error("word is not a canonical field element")]
    NonCanonical,

    #[error("{0} point is not on the curve")]
    NotOnCurve(&'static str),

    #[error("{0} point is not in the prime-order subgroup")]
    NotInSubgroup(&'static str),

    #[error("{0} words cannot hold a verification key")]
    KeyLength(usize),
}

/// A 256-bit big-endian word.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Uint256(pub [u8; 32]);

impl Uint256 {
    pub const ZERO: Uint256 = Uint256([0u8; 32]);

    pub fn from_be_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn to_be_bytes(self) -> [u8; 32] {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    pub fn from_bigint(value: BigInt<4>) -> Self {
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&value.to_bytes_be());
        Self(bytes)
    }

    pub fn to_bigint(self) -> BigInt<4> {
        let mut limbs = [0u64; 4];
        for (i, limb) in limbs.iter_mut().enumerate() {
            let start = 32 - 8 * (i + 1);
            let mut chunk = [0u8; 8];
            chunk.copy_from_slice(&self.0[start..start + 8]);
            *limb = u64::from_be_bytes(chunk);
        }
        BigInt::new(limbs)
    }

    /// Encode a field element whose modulus fits in 256 bits.
    pub fn from_field<F: PrimeField<BigInt = BigInt<4>>>(value: F) -> Self {
        Self::from_bigint(value.into_bigint())
    }

    /// Decode a field element, rejecting integers at or above the modulus.
    pub fn to_field<F: PrimeField<BigInt = BigInt<4>>>(self) -> Result<F, EncodingError> {
        F::from_bigint(self.to_bigint()).ok_or(EncodingError::NonCanonical)
    }
}

impl From<u64> for Uint256 {
    fn from(value: u64) -> Self {
        let mut bytes = [0u8; 32];
        bytes[24..].copy_from_slice(&value.to_be_bytes());
        Self(bytes)
    }
}

impl From<u128> for Uint256 {
    fn from(value: u128) -> Self {
        let mut bytes = [0u8; 32];
        bytes[16..].copy_from_slice(&value.to_be_bytes());
        Self(bytes)
    }
}

impl fmt::Display for Uint256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Uint256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl FromStr for Uint256 {
    type Err = EncodingError;

    /// Accepts `0x`-prefixed or bare hex of up to 64 digits; shorter input
    /// is left-padded.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        if digits.is_empty() || digits.len() > 64 {
            return Err(EncodingError::InvalidHex(s.to_string()));
        }
        let padded = format!("{:0>64}", digits);
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(&padded, &mut bytes)
            .map_err(|e| EncodingError::InvalidHex(format!("{}: {}", s, e)))?;
        Ok(Self(bytes))
    }
}

impl Serialize for Uint256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Uint256 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

// ============================================================================
// Curve points
// ============================================================================

fn fq_word(value: &Fq) -> Uint256 {
    Uint256::from_field(*value)
}

pub fn g1_to_words(point: &G1Affine) -> [Uint256; 2] {
    match point.xy() {
        Some((x, y)) => [fq_word(x), fq_word(y)],
        None => [Uint256::ZERO; 2],
    }
}

pub fn g2_to_words(point: &G2Affine) -> [Uint256; 4] {
    match point.xy() {
        Some((x, y)) => [fq_word(&x.c1), fq_word(&x.c0), fq_word(&y.c1), fq_word(&y.c0)],
        None => [Uint256::ZERO; 4],
    }
}

pub fn g1_from_words(x: Uint256, y: Uint256, label: &'static str) -> Result<G1Affine, EncodingError> {
    let x: Fq = x.to_field()?;
    let y: Fq = y.to_field()?;
    if x.is_zero() && y.is_zero() {
        return Ok(G1Affine::zero());
    }

    let point = G1Affine::new_unchecked(x, y);
    if !point.is_on_curve() {
        return Err(EncodingError::NotOnCurve(label));
    }
    if !point.is_in_correct_subgroup_assuming_on_curve() {
        return Err(EncodingError::NotInSubgroup(label));
    }
    Ok(point)
}

pub fn g2_from_words(words: [Uint256; 4], label: &'static str) -> Result<G2Affine, EncodingError> {
    let [x_c1, x_c0, y_c1, y_c0] = words;
    let x = Fq2::new(x_c0.to_field()?, x_c1.to_field()?);
    let y = Fq2::new(y_c0.to_field()?, y_c1.to_field()?);
    if x.is_zero() && y.is_zero() {
        return Ok(G2Affine::zero());
    }

    let point = G2Affine::new_unchecked(x, y);
    if !point.is_on_curve() {
        return Err(EncodingError::NotOnCurve(label));
    }
    // G2 has a cofactor, so this check is not implied by being on the curve
    if !point.is_in_correct_subgroup_assuming_on_curve() {
        return Err(EncodingError::NotInSubgroup(label));
    }
    Ok(point)
}

// ============================================================================
// Proofs
// ============================================================================

/// Groth16 proof `(A, B, C)` in word encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofData {
    pub a: [Uint256; 2],
    pub b: [[Uint256; 2]; 2],
    pub c: [Uint256; 2],
}

impl ProofData {
    pub fn to_words(&self) -> [Uint256; 8] {
        [
            self.a[0], self.a[1], self.b[0][0], self.b[0][1], self.b[1][0], self.b[1][1], self.c[0],
            self.c[1],
        ]
    }

    pub fn from_words(words: [Uint256; 8]) -> Self {
        Self {
            a: [words[0], words[1]],
            b: [[words[2], words[3]], [words[4], words[5]]],
            c: [words[6], words[7]],
        }
    }

    /// Decode into curve points, checking each one.
    pub fn to_proof(&self) -> Result<ark_groth16::Proof<ark_bn254::Bn254>, EncodingError> {
        Ok(ark_groth16::Proof {
            a: g1_from_words(self.a[0], self.a[1], "A")?,
            b: g2_from_words([self.b[0][0], self.b[0][1], self.b[1][0], self.b[1][1]], "B")?,
            c: g1_from_words(self.c[0], self.c[1], "C")?,
        })
    }
}

impl From<&ark_groth16::Proof<ark_bn254::Bn254>> for ProofData {
    fn from(proof: &ark_groth16::Proof<ark_bn254::Bn254>) -> Self {
        let b = g2_to_words(&proof.b);
        Self {
            a: g1_to_words(&proof.a),
            b: [[b[0], b[1]], [b[2], b[3]]],
            c: g1_to_words(&proof.c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bn254::{Fr, G1Projective, G2Projective};
    use ark_ec::CurveGroup;
    use ark_std::{rand::rngs::StdRng, rand::SeedableRng, UniformRand};

    #[test]
    fn test_hex_parsing() {
        let w: Uint256 = "0x2a".parse().unwrap();
        assert_eq!(w, Uint256::from(42u64));
        assert_eq!(
            w.to_string(),
            "0x000000000000000000000000000000000000000000000000000000000000002a"
        );
        assert!("0x".parse::<Uint256>().is_err());
        assert!("0xzz".parse::<Uint256>().is_err());
        assert!(format!("0x{}", "1".repeat(65)).parse::<Uint256>().is_err());
    }

    #[test]
    fn test_serde_as_hex_string() {
        let w = Uint256::from(255u64);
        let json = serde_json::to_string(&w).unwrap();
        assert_eq!(json, format!("\"{}\"", w));
        let back: Uint256 = serde_json::from_str(&json).unwrap();
        assert_eq!(back, w);
    }

    #[test]
    fn test_modulus_is_not_canonical() {
        let modulus = Uint256::from_bigint(Fr::MODULUS);
        assert_eq!(modulus.to_field::<Fr>(), Err(EncodingError::NonCanonical));

        let below: Fr = Uint256::from(7u64).to_field().unwrap();
        assert_eq!(below, Fr::from(7u64));
    }

    #[test]
    fn test_field_words_are_big_endian() {
        let w = Uint256::from_field(Fr::from(0x0102u64));
        assert_eq!(w.0[30], 0x01);
        assert_eq!(w.0[31], 0x02);
        assert_eq!(w.to_field::<Fr>().unwrap(), Fr::from(0x0102u64));
    }

    #[test]
    fn test_points_decode() {
        let mut rng = StdRng::seed_from_u64(7);
        let g1 = G1Projective::rand(&mut rng).into_affine();
        let g2 = G2Projective::rand(&mut rng).into_affine();

        let [x, y] = g1_to_words(&g1);
        assert_eq!(g1_from_words(x, y, "g1").unwrap(), g1);
        assert_eq!(g2_from_words(g2_to_words(&g2), "g2").unwrap(), g2);

        let [zx, zy] = g1_to_words(&G1Affine::zero());
        assert!(zx.is_zero() && zy.is_zero());
        assert!(g1_from_words(zx, zy, "g1").unwrap().is_zero());
    }

    #[test]
    fn test_off_curve_point_rejected() {
        assert_eq!(
            g1_from_words(Uint256::from(1u64), Uint256::from(1u64), "A"),
            Err(EncodingError::NotOnCurve("A"))
        );
    }

    #[test]
    fn test_g2_word_order() {
        let g2 = G2Affine::generator();
        let words = g2_to_words(&g2);
        assert_eq!(words[0], Uint256::from_field(g2.x.c1));
        assert_eq!(words[1], Uint256::from_field(g2.x.c0));
    }
}
