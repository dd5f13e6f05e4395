use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use troncrypt::{
    compact_from_der, message_bytes, personal_message_hash, Address, HashVal, PublicKey, Signature,
};
use tronnet::Context;
use tronstructs::Transaction;

use crate::autoretry::autoretry;
use crate::signer::{append_signature, Signer};
use crate::{Result, SdkError};

/// Attempts made for each remote key operation.
pub const KMS_ATTEMPTS: usize = 3;

const KMS_BACKOFF: Duration = Duration::from_millis(100);

/// A public key as a key management service returns it.
#[derive(Clone, Debug)]
pub struct KmsPublicKey {
    /// PKIX PEM document.
    pub pem: String,
    /// CRC32C of `pem`, if the service supplies one.
    pub pem_crc32c: Option<u32>,
}

#[derive(Clone, Debug)]
pub struct KmsSignRequest {
    pub key_id: String,
    pub digest: [u8; 32],
    pub digest_crc32c: u32,
}

#[derive(Clone, Debug)]
pub struct KmsSignResponse {
    /// DER-encoded `(R, S)`.
    pub signature: Vec<u8>,
    /// CRC32C of `signature`, if the service supplies one.
    pub signature_crc32c: Option<u32>,
    /// Whether the service checked the request's digest checksum.
    pub verified_digest_crc32c: bool,
}

/// The two operations consumed from a key management service.
#[async_trait]
pub trait KmsClient: Send + Sync + 'static {
    async fn get_public_key(&self, key_id: &str) -> anyhow::Result<KmsPublicKey>;

    async fn sign_digest(&self, request: &KmsSignRequest) -> anyhow::Result<KmsSignResponse>;
}

fn kms_error(err: anyhow::Error) -> SdkError {
    SdkError::Kms(format!("{:#}", err))
}

fn check_crc(what: &str, data: &[u8], expected: u32) -> Result<()> {
    let actual = crc32c::crc32c(data);
    if actual != expected {
        return Err(SdkError::Kms(format!(
            "bad {} crc: expected {:08x}, got {:08x}",
            what, expected, actual
        )));
    }
    Ok(())
}

/// A signer whose secp256k1 key never leaves a key management service.
///
/// The public key is fetched once, on creation. Signatures come back without a recovery byte;
/// the signer recovers it by matching both candidates against its own address.
pub struct KmsSigner {
    client: Arc<dyn KmsClient>,
    key_id: String,
    public_key: PublicKey,
    address: Address,
}

impl KmsSigner {
    pub async fn connect(
        ctx: &Context,
        client: Arc<dyn KmsClient>,
        key_id: impl Into<String>,
    ) -> Result<Self> {
        let key_id = key_id.into();
        let public_key = autoretry(ctx, KMS_ATTEMPTS, KMS_BACKOFF, || async {
            let key = ctx
                .run(async { client.get_public_key(&key_id).await.map_err(kms_error) })
                .await?;
            if let Some(crc) = key.pem_crc32c {
                check_crc("public key", key.pem.as_bytes(), crc)?;
            }
            Ok::<_, SdkError>(PublicKey::from_pem(&key.pem)?)
        })
        .await?;
        let address = public_key.address();
        log::debug!("kms key {} signs for {}", key_id, address);
        Ok(KmsSigner {
            client,
            key_id,
            public_key,
            address,
        })
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    async fn sign_once(&self, ctx: &Context, digest: &HashVal) -> Result<Signature> {
        let request = KmsSignRequest {
            key_id: self.key_id.clone(),
            digest: digest.0,
            digest_crc32c: crc32c::crc32c(&digest.0),
        };
        let response = ctx
            .run(async {
                self.client
                    .sign_digest(&request)
                    .await
                    .map_err(kms_error)
            })
            .await?;
        if !response.verified_digest_crc32c {
            return Err(SdkError::Kms("digest crc was not verified".into()));
        }
        if let Some(crc) = response.signature_crc32c {
            check_crc("signature", &response.signature, crc)?;
        }
        self.with_recovery(compact_from_der(&response.signature)?, digest)
    }

    /// Signs `digest`, retrying failed attempts until [`KMS_ATTEMPTS`] or the deadline.
    ///
    /// An answer that does not recover to this signer's address counts as a failed attempt.
    pub async fn sign_digest(&self, ctx: &Context, digest: &HashVal) -> Result<Signature> {
        autoretry(ctx, KMS_ATTEMPTS, KMS_BACKOFF, || self.sign_once(ctx, digest)).await
    }

    fn with_recovery(&self, rs: [u8; 64], digest: &HashVal) -> Result<Signature> {
        for recid in 0..=1 {
            let sig = Signature::from_compact(rs, recid)?;
            if sig.recover_address(digest).ok().as_ref() == Some(&self.address) {
                return Ok(sig);
            }
        }
        Err(SdkError::Kms(format!(
            "signature does not recover to {}",
            self.address
        )))
    }
}

#[async_trait]
impl Signer for KmsSigner {
    fn address(&self) -> Address {
        self.address.clone()
    }

    async fn sign_tx(&self, ctx: &Context, tx: &mut Transaction) -> Result<()> {
        tx.ensure_signable()?;
        let digest = tx.txid()?;
        let sig = self.sign_digest(ctx, &digest).await?;
        append_signature(tx, &sig);
        Ok(())
    }

    async fn sign_message_v2(&self, ctx: &Context, message: &str) -> Result<String> {
        let digest = personal_message_hash(&message_bytes(message)?);
        Ok(self.sign_digest(ctx, &digest).await?.to_hex_prefixed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use troncrypt::{verify_message_v2, PrivateKey};

    /// Signs with a local key, optionally corrupting the first few answers.
    struct FakeKms {
        key: PrivateKey,
        corrupt: Mutex<usize>,
        // answers signed by an unrelated key, served before the real ones
        foreign: Mutex<usize>,
        calls: Mutex<usize>,
    }

    impl FakeKms {
        fn new(corrupt: usize) -> Self {
            FakeKms {
                key: PrivateKey::generate(),
                corrupt: Mutex::new(corrupt),
                foreign: Mutex::new(0),
                calls: Mutex::new(0),
            }
        }

        fn with_foreign(foreign: usize) -> Self {
            let kms = Self::new(0);
            *kms.foreign.lock() = foreign;
            kms
        }
    }

    #[async_trait]
    impl KmsClient for FakeKms {
        async fn get_public_key(&self, _key_id: &str) -> anyhow::Result<KmsPublicKey> {
            let pem = self.key.public_key().to_pem()?;
            Ok(KmsPublicKey {
                pem_crc32c: Some(crc32c::crc32c(pem.as_bytes())),
                pem,
            })
        }

        async fn sign_digest(&self, request: &KmsSignRequest) -> anyhow::Result<KmsSignResponse> {
            *self.calls.lock() += 1;
            anyhow::ensure!(
                crc32c::crc32c(&request.digest) == request.digest_crc32c,
                "digest crc mismatch"
            );
            let key = {
                let mut foreign = self.foreign.lock();
                if *foreign > 0 {
                    *foreign -= 1;
                    PrivateKey::generate()
                } else {
                    self.key.clone()
                }
            };
            let der = key.sign_digest(&HashVal(request.digest))?.to_der()?;
            let mut crc = crc32c::crc32c(&der);
            let mut corrupt = self.corrupt.lock();
            if *corrupt > 0 {
                *corrupt -= 1;
                crc ^= 1;
            }
            Ok(KmsSignResponse {
                signature: der,
                signature_crc32c: Some(crc),
                verified_digest_crc32c: true,
            })
        }
    }

    #[test]
    fn derives_address_from_pem() {
        smol::block_on(async {
            let kms = Arc::new(FakeKms::new(0));
            let expected = kms.key.address();
            let signer = KmsSigner::connect(&Context::background(), kms, "key-1")
                .await
                .unwrap();
            assert_eq!(signer.address(), expected);
            assert_eq!(signer.key_id(), "key-1");

            let uncompressed = signer.public_key().to_uncompressed();
            let mut raw = vec![0x41];
            raw.extend_from_slice(&troncrypt::keccak256(&uncompressed[1..]).0[12..]);
            assert_eq!(signer.address().as_bytes(), raw.as_slice());
            assert_eq!(
                signer.address().to_base58(),
                troncrypt::base58check_encode(&raw)
            );
        })
    }

    #[test]
    fn retries_bad_checksums() {
        smol::block_on(async {
            let kms = Arc::new(FakeKms::new(2));
            let signer = KmsSigner::connect(&Context::background(), kms.clone(), "k")
                .await
                .unwrap();
            let sig = signer
                .sign_message_v2(&Context::background(), "hello")
                .await
                .unwrap();
            assert_eq!(*kms.calls.lock(), 3);
            assert!(verify_message_v2("hello", &sig, &signer.address()));
        })
    }

    #[test]
    fn fails_closed_after_attempts() {
        smol::block_on(async {
            let kms = Arc::new(FakeKms::new(10));
            let signer = KmsSigner::connect(&Context::background(), kms.clone(), "k")
                .await
                .unwrap();
            let res = signer
                .sign_digest(&Context::background(), &troncrypt::keccak256(b"x"))
                .await;
            assert!(matches!(res, Err(SdkError::Kms(_))));
            assert_eq!(*kms.calls.lock(), KMS_ATTEMPTS);
        })
    }

    struct TamperedKey;

    #[async_trait]
    impl KmsClient for TamperedKey {
        async fn get_public_key(&self, _key_id: &str) -> anyhow::Result<KmsPublicKey> {
            let pem = PrivateKey::generate().public_key().to_pem()?;
            Ok(KmsPublicKey {
                pem_crc32c: Some(crc32c::crc32c(pem.as_bytes()).wrapping_add(1)),
                pem,
            })
        }

        async fn sign_digest(&self, _request: &KmsSignRequest) -> anyhow::Result<KmsSignResponse> {
            anyhow::bail!("unreachable key")
        }
    }

    #[test]
    fn bad_public_key_crc_fails_connect() {
        smol::block_on(async {
            let res = KmsSigner::connect(&Context::background(), Arc::new(TamperedKey), "k").await;
            assert!(matches!(res, Err(SdkError::Kms(_))));
        })
    }

    #[test]
    fn foreign_signature_is_rejected() {
        smol::block_on(async {
            let kms = Arc::new(FakeKms::new(0));
            let signer = KmsSigner::connect(&Context::background(), kms, "k")
                .await
                .unwrap();
            let digest = troncrypt::keccak256(b"y");
            let stranger = PrivateKey::generate().sign_digest(&digest).unwrap();
            let mut rs = [0u8; 64];
            rs.copy_from_slice(&stranger.as_bytes()[..64]);
            assert!(matches!(
                signer.with_recovery(rs, &digest),
                Err(SdkError::Kms(_))
            ));
        })
    }

    #[test]
    fn retries_signature_from_wrong_key() {
        smol::block_on(async {
            let kms = Arc::new(FakeKms::with_foreign(1));
            let signer = KmsSigner::connect(&Context::background(), kms.clone(), "k")
                .await
                .unwrap();
            let digest = troncrypt::keccak256(b"z");
            let sig = signer
                .sign_digest(&Context::background(), &digest)
                .await
                .unwrap();
            assert_eq!(*kms.calls.lock(), 2);
            assert_eq!(sig.recover_address(&digest).unwrap(), signer.address());
        })
    }
}
