//! Verifiable Randomness
//!
//! The draw seed comes from a VRF: a deterministic Ed25519 signature over
//! an alpha that includes the period id and the commitment root, hashed
//! under a domain tag. Binding the alpha to the root is the
//! anti-manipulation property - once randomness is requested, editing the
//! ticket table changes the root and invalidates the proof.
//!
//! `verify` needs only published data and the oracle's public key, so any
//! third party can re-check a draw.

use std::sync::Arc;
use std::time::Duration;

use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use tracing::{error, info, warn};

use crate::core::hash::{hash_with_domain, StateHash};
use crate::raffle::leaderboard::PeriodId;

/// Domain separator for the VRF input (alpha).
const VRF_ALPHA_DOMAIN: &[u8] = b"FAIRDRAW_VRF_ALPHA_V1";

/// Domain separator for deriving the draw seed from the proof.
const VRF_SEED_DOMAIN: &[u8] = b"FAIRDRAW_VRF_SEED_V1";

/// The verified random output for one period.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct VrfOutput {
    /// Draw seed: SHA-256 of the proof under the seed domain.
    pub seed: StateHash,
    /// The proof (an Ed25519 signature over the alpha).
    pub proof: Vec<u8>,
}

/// VRF failures.
#[derive(Clone, Debug, thiserror::Error)]
pub enum VrfError {
    /// A single oracle call exceeded its timeout.
    #[error("vrf oracle call timed out")]
    Timeout,

    /// The oracle reported a failure.
    #[error("vrf oracle failed: {0}")]
    Oracle(String),

    /// All attempts failed; the period must go `Undrawn`.
    #[error("vrf attempts exhausted after {attempts} tries")]
    Exhausted {
        /// How many attempts were made.
        attempts: u32,
    },

    /// The returned proof did not verify. Hard fail, never retried:
    /// a bad proof means a faulty or dishonest oracle, not a flaky one.
    #[error("vrf proof failed verification")]
    ProofInvalid,
}

/// Canonical VRF input for a period: domain ++ period_id LE ++ root.
pub fn vrf_alpha(period_id: PeriodId, commitment_root: &StateHash) -> Vec<u8> {
    let mut alpha = Vec::with_capacity(VRF_ALPHA_DOMAIN.len() + 8 + 32);
    alpha.extend_from_slice(VRF_ALPHA_DOMAIN);
    alpha.extend_from_slice(&period_id.to_le_bytes());
    alpha.extend_from_slice(commitment_root);
    alpha
}

/// Verify a VRF output against the oracle's public key and the exact
/// period/root it was requested for.
///
/// Independently callable by any third party; fails if the commitment
/// root was altered after the randomness was requested, even though the
/// proof is valid for the original root.
pub fn verify(
    output: &VrfOutput,
    public_key: &VerifyingKey,
    period_id: PeriodId,
    commitment_root: &StateHash,
) -> Result<(), VrfError> {
    let signature =
        Signature::from_slice(&output.proof).map_err(|_| VrfError::ProofInvalid)?;

    let alpha = vrf_alpha(period_id, commitment_root);
    public_key
        .verify_strict(&alpha, &signature)
        .map_err(|_| VrfError::ProofInvalid)?;

    let expected_seed = hash_with_domain(VRF_SEED_DOMAIN, &output.proof);
    if expected_seed != output.seed {
        return Err(VrfError::ProofInvalid);
    }

    Ok(())
}

/// A VRF signing key (held by the oracle, never by the raffle pipeline).
pub struct VrfKeypair {
    signing: SigningKey,
}

impl VrfKeypair {
    /// Derive a keypair from 32 seed bytes.
    pub fn from_seed_bytes(seed: [u8; 32]) -> Self {
        Self {
            signing: SigningKey::from_bytes(&seed),
        }
    }

    /// The public key verifiers use.
    pub fn public_key(&self) -> VerifyingKey {
        self.signing.verifying_key()
    }

    /// Produce the VRF output for an alpha. Ed25519 signatures are
    /// deterministic, so the same alpha always yields the same output.
    pub fn prove(&self, alpha: &[u8]) -> VrfOutput {
        let signature = self.signing.sign(alpha);
        let proof = signature.to_bytes().to_vec();
        let seed = hash_with_domain(VRF_SEED_DOMAIN, &proof);
        VrfOutput { seed, proof }
    }
}

/// The external randomness source. The only blocking external call in the
/// engine; the coordinator wraps it with timeout and bounded retries.
pub trait VrfOracle: Send + Sync {
    /// Produce a VRF output for the given alpha.
    fn request(&self, alpha: &[u8]) -> Result<VrfOutput, VrfError>;
}

/// In-process oracle backed by a local keypair (tests, demos, and
/// single-operator deployments).
pub struct LocalVrfOracle {
    keypair: VrfKeypair,
}

impl LocalVrfOracle {
    /// Wrap a keypair.
    pub fn new(keypair: VrfKeypair) -> Self {
        Self { keypair }
    }
}

impl VrfOracle for LocalVrfOracle {
    fn request(&self, alpha: &[u8]) -> Result<VrfOutput, VrfError> {
        Ok(self.keypair.prove(alpha))
    }
}

/// Retry behavior for oracle calls.
#[derive(Clone, Copy, Debug)]
pub struct VrfRetryConfig {
    /// Per-call timeout.
    pub timeout: Duration,
    /// Total attempts before the period goes `Undrawn`.
    pub max_attempts: u32,
    /// First backoff delay; doubles per retry.
    pub backoff_base: Duration,
}

impl Default for VrfRetryConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            max_attempts: 3,
            backoff_base: Duration::from_millis(500),
        }
    }
}

/// Requests randomness bound to a commitment root and verifies the proof
/// before handing it to the draw.
pub struct VrfCoordinator {
    oracle: Arc<dyn VrfOracle>,
    public_key: VerifyingKey,
    retry: VrfRetryConfig,
}

impl VrfCoordinator {
    /// Build a coordinator over an oracle and its known public key.
    pub fn new(oracle: Arc<dyn VrfOracle>, public_key: VerifyingKey, retry: VrfRetryConfig) -> Self {
        Self {
            oracle,
            public_key,
            retry,
        }
    }

    /// The oracle public key, for publication alongside draws.
    pub fn public_key(&self) -> VerifyingKey {
        self.public_key
    }

    /// Request and verify randomness for a committed period.
    ///
    /// Oracle timeouts and failures are retried with doubling backoff up
    /// to the configured attempt count; exhaustion is `Exhausted` and the
    /// caller marks the period `Undrawn`. An invalid proof is returned
    /// immediately: it is a hard failure, not a transient one.
    pub async fn request_randomness(
        &self,
        period_id: PeriodId,
        commitment_root: &StateHash,
    ) -> Result<VrfOutput, VrfError> {
        let alpha = vrf_alpha(period_id, commitment_root);
        let mut backoff = self.retry.backoff_base;

        for attempt in 1..=self.retry.max_attempts {
            let oracle = Arc::clone(&self.oracle);
            let call_alpha = alpha.clone();
            let call =
                tokio::task::spawn_blocking(move || oracle.request(&call_alpha));

            let result = match tokio::time::timeout(self.retry.timeout, call).await {
                Ok(Ok(result)) => result,
                Ok(Err(join_err)) => Err(VrfError::Oracle(join_err.to_string())),
                Err(_) => Err(VrfError::Timeout),
            };

            match result {
                Ok(output) => {
                    if let Err(err) = verify(&output, &self.public_key, period_id, commitment_root) {
                        error!(period_id, %err, "vrf proof rejected");
                        return Err(err);
                    }
                    info!(
                        period_id,
                        seed = %hex::encode(output.seed),
                        attempt,
                        "vrf randomness obtained"
                    );
                    return Ok(output);
                }
                Err(err) => {
                    warn!(period_id, attempt, %err, "vrf oracle attempt failed");
                }
            }

            if attempt < self.retry.max_attempts {
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }
        }

        Err(VrfError::Exhausted {
            attempts: self.retry.max_attempts,
        })
    }
}
