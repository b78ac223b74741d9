//! Redemption Secrets
//!
//! ```text
//! SecretHash = Poseidon(GENERATOR_INDEX_SECRET_HASH, secret)
//! ```
//!
//! The hash goes on chain with the private mint; the secret stays with the
//! caller until it is revealed by `redeem_shield`.

use std::fmt;

use ark_bn254::Fr as Field;
use ark_crypto_primitives::sponge::{
    CryptographicSponge,
    poseidon::{PoseidonConfig, PoseidonSponge},
};
use ark_std::rand::Rng;
use shieldmint_primitives::Fr;

/// Domain separator absorbed ahead of the secret
pub const GENERATOR_INDEX_SECRET_HASH: u64 = 26;

/// A random preimage that unlocks a pending shield
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(Fr);

impl Secret {
    /// Fresh uniformly random secret
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self(Fr::random(rng))
    }

    pub fn from_fr(value: Fr) -> Self {
        Self(value)
    }

    /// The raw preimage. Only `redeem_shield` should need this.
    pub fn value(&self) -> Fr {
        self.0
    }

    pub fn hash(&self) -> Fr {
        compute_secret_hash(&self.0)
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(..)")
    }
}

/// One-way hash locking a private mint
pub fn compute_secret_hash(secret: &Fr) -> Fr {
    let config = poseidon_config();
    let mut sponge = PoseidonSponge::new(&config);

    sponge.absorb(&Field::from(GENERATOR_INDEX_SECRET_HASH));
    sponge.absorb(&secret.to_field());

    let result: Field = sponge.squeeze_field_elements(1)[0];
    Fr::from_field(result)
}

/// Poseidon over BN254 Fr (254 bits), rate 2, capacity 1
fn poseidon_config() -> PoseidonConfig<Field> {
    use ark_crypto_primitives::sponge::poseidon::find_poseidon_ark_and_mds;

    let prime_bits: u64 = 254;
    let rate: usize = 2;
    let capacity: usize = 1;
    let full_rounds: u64 = 8;
    let partial_rounds: u64 = 57;
    let alpha: u64 = 5;
    let skip_matrices: u64 = 0;

    let (ark, mds) = find_poseidon_ark_and_mds::<Field>(
        prime_bits,
        rate,
        full_rounds,
        partial_rounds,
        skip_matrices,
    );

    PoseidonConfig::new(
        full_rounds as usize,
        partial_rounds as usize,
        alpha,
        mds,
        ark,
        rate,
        capacity,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;

    #[test]
    fn test_secret_hash_deterministic() {
        let secret = Fr::from_u64(1234);
        assert_eq!(compute_secret_hash(&secret), compute_secret_hash(&secret));
    }

    #[test]
    fn test_secret_hash_binding() {
        let h1 = compute_secret_hash(&Fr::from_u64(1));
        let h2 = compute_secret_hash(&Fr::from_u64(2));
        assert_ne!(h1, h2, "different secrets must not collide");
        assert_ne!(h1, Fr::from_u64(1), "hash must not echo the secret");
    }

    #[test]
    fn test_random_secrets_differ() {
        let mut rng = OsRng;
        let a = Secret::random(&mut rng);
        let b = Secret::random(&mut rng);
        assert_ne!(a, b);
        assert_ne!(a.hash(), b.hash());
        assert_eq!(Secret::from_fr(a.value()).hash(), a.hash());
    }

    #[test]
    fn test_debug_redacts() {
        let secret = Secret::from_fr(Fr::from_u64(99));
        assert_eq!(format!("{secret:?}"), "Secret(..)");
    }
}
