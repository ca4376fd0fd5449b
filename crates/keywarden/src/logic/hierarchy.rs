//! Key-hierarchy orchestration.
//!
//! `wrap_data_key` and `unwrap_data_key` coordinate the four collaborators
//! (access control, root key source, key registry, cipher) through a strict
//! gate sequence: authentication and authorization run before anything that
//! touches key material, so unauthorized probes never cause registry or KMS
//! traffic.
//!
//! Key lifetimes: the root key and the plaintext master key live on the
//! stack of a single call and are zeroised when it returns. Nothing is
//! cached between requests; every call re-resolves the master key from the
//! registry.

use tracing::{info, warn};

use crate::access::AccessControlLike;
use crate::error::WardenError;
use crate::logic::cipher::{CipherError, KeyCipherLike};
use crate::logic::master_key::{
    MasterKeyMaterial, PlainDataKey, WrappedDataKey, WrappedMasterKey,
};
use crate::repository::{CreateMasterKeyRecord, KeyRegistryLike, RegistryInsert};
use crate::rootkey::{RootKeyMaterial, RootKeySourceLike};

/// The unit of authentication and authorization: who is asking, for which
/// (table, column).
#[derive(Clone, Debug)]
pub struct AccessRequest {
    pub token: String,
    pub table: String,
    pub column: String,
}

/// Wrap a caller-supplied plaintext data key under the master key of
/// `request.table`, registering a master key for the table on first use.
pub async fn wrap_data_key<A, S, R, C>(
    access: &A,
    root_source: &S,
    registry: &R,
    cipher: &C,
    request: &AccessRequest,
    plain_key: &PlainDataKey,
) -> Result<WrappedDataKey, WardenError>
where
    A: AccessControlLike + ?Sized,
    S: RootKeySourceLike + ?Sized,
    R: KeyRegistryLike + ?Sized,
    C: KeyCipherLike + ?Sized,
{
    if plain_key.is_empty() {
        return Err(WardenError::InvalidRequest {
            msg: "plain key must not be empty".to_string(),
            source: None,
        });
    }

    authenticate_and_authorize(access, request).await?;

    let root_key = root_source.root_key().await?;
    let master_key =
        resolve_or_register_master_key(registry, cipher, &root_key, &request.table).await?;

    let wrapped = cipher
        .wrap(master_key.expose(), plain_key.expose())
        .map_err(|e| WardenError::CryptoOperation {
            source: Some(anyhow::Error::from(e)),
        })?;

    Ok(WrappedDataKey(wrapped))
}

/// Unwrap a previously wrapped data key for `request.table`.
///
/// Unlike the wrap path, an unregistered table is a caller-visible business
/// error here: unwrapping cannot fabricate the master key that wrapping can.
/// The root key is only fetched once the table is known to be registered.
pub async fn unwrap_data_key<A, S, R, C>(
    access: &A,
    root_source: &S,
    registry: &R,
    cipher: &C,
    request: &AccessRequest,
    wrapped_key: &WrappedDataKey,
) -> Result<PlainDataKey, WardenError>
where
    A: AccessControlLike + ?Sized,
    S: RootKeySourceLike + ?Sized,
    R: KeyRegistryLike + ?Sized,
    C: KeyCipherLike + ?Sized,
{
    if wrapped_key.0.is_empty() {
        return Err(WardenError::InvalidRequest {
            msg: "wrapped key must not be empty".to_string(),
            source: None,
        });
    }

    authenticate_and_authorize(access, request).await?;

    let master_key_id = registry
        .lookup_master_key_id(&request.table)
        .await?
        .ok_or_else(|| WardenError::TableNotRegistered {
            table: request.table.clone(),
        })?;

    let wrapped_master = registry.fetch_wrapped_master_key(&master_key_id).await?;
    let root_key = root_source.root_key().await?;
    let master_key = unwrap_master_key(cipher, &root_key, &wrapped_master, &request.table)?;

    let plaintext = cipher
        .unwrap(master_key.expose(), &wrapped_key.0)
        .map_err(|e| match e {
            // A tag mismatch here means tampered ciphertext or a
            // ciphertext/table mix-up, which is a caller mistake, not a
            // system fault.
            CipherError::Integrity => WardenError::InvalidWrappedKey { source: None },
            other => WardenError::CryptoOperation {
                source: Some(anyhow::Error::from(other)),
            },
        })?;

    Ok(PlainDataKey::new(plaintext))
}

async fn authenticate_and_authorize<A>(
    access: &A,
    request: &AccessRequest,
) -> Result<(), WardenError>
where
    A: AccessControlLike + ?Sized,
{
    if !access.authenticate(&request.token).await? {
        return Err(WardenError::Authentication {
            msg: "token validation failed".to_string(),
            source: None,
        });
    }

    if !access
        .authorize(&request.token, &request.table, &request.column)
        .await?
    {
        return Err(WardenError::Authorization {
            table: request.table.clone(),
            column: request.column.clone(),
        });
    }

    Ok(())
}

/// Resolve the master key for `table`, creating and registering one if this
/// is the table's first use.
///
/// Registration is a single-winner compare-and-swap at the registry layer: a
/// `Conflict` outcome means a concurrent request won the race, in which case
/// the winner's record is re-read exactly once and used instead. Two live
/// master keys for one table cannot exist, and the race never surfaces to
/// the caller.
async fn resolve_or_register_master_key<R, C>(
    registry: &R,
    cipher: &C,
    root_key: &RootKeyMaterial,
    table: &str,
) -> Result<MasterKeyMaterial, WardenError>
where
    R: KeyRegistryLike + ?Sized,
    C: KeyCipherLike + ?Sized,
{
    if let Some(master_key_id) = registry.lookup_master_key_id(table).await? {
        let wrapped = registry.fetch_wrapped_master_key(&master_key_id).await?;
        return unwrap_master_key(cipher, root_key, &wrapped, table);
    }

    // First use of this table: mint a master key and try to claim the slot.
    let master_key = MasterKeyMaterial::generate();
    let wrapped = cipher
        .wrap(root_key.expose(), master_key.expose())
        .map_err(|e| WardenError::CryptoOperation {
            source: Some(anyhow::Error::from(e)),
        })?;

    let record = CreateMasterKeyRecord {
        master_key_id: uuid::Uuid::new_v4().to_string(),
        table: table.to_string(),
        wrapped_master_key: WrappedMasterKey(wrapped),
        created_at: chrono::Utc::now(),
    };

    match registry.insert_master_key(&record).await? {
        RegistryInsert::Created(master_key_id) => {
            info!(table, %master_key_id, "registered master key for table");
            Ok(master_key)
        }
        RegistryInsert::Conflict => {
            // Lost the first-use race; the winner's record is authoritative.
            // One re-read is sufficient given the registry's uniqueness
            // guarantee; if the record is still missing the store itself is
            // misbehaving.
            warn!(table, "master key registration raced, re-reading winner");
            let master_key_id = registry.lookup_master_key_id(table).await?.ok_or_else(|| {
                WardenError::Dependency {
                    msg: "master key registry".to_string(),
                    source: Some(anyhow::anyhow!(
                        "insert conflict for table {table} but no record found on re-read"
                    )),
                }
            })?;
            let wrapped = registry.fetch_wrapped_master_key(&master_key_id).await?;
            unwrap_master_key(cipher, root_key, &wrapped, table)
        }
    }
}

fn unwrap_master_key<C>(
    cipher: &C,
    root_key: &RootKeyMaterial,
    wrapped: &WrappedMasterKey,
    table: &str,
) -> Result<MasterKeyMaterial, WardenError>
where
    C: KeyCipherLike + ?Sized,
{
    let bytes = cipher
        .unwrap(root_key.expose(), &wrapped.0)
        .map_err(|e| match e {
            // A stored record that no longer unwraps under the current root
            // key is an internal fault, distinct from a missing record.
            CipherError::Integrity => WardenError::KeyIntegrity {
                table: table.to_string(),
                source: None,
            },
            other => WardenError::CryptoOperation {
                source: Some(anyhow::Error::from(other)),
            },
        })?;
    Ok(MasterKeyMaterial::from_bytes(bytes))
}

#[cfg(test)]
mod unit_test {
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use base64::Engine;

    use super::*;
    use crate::logic::cipher::Aes256GcmCipher;
    use crate::repository::memory::InMemoryRegistry;
    use crate::rootkey::ROOT_KEY_LEN;

    struct CountingAccessControl {
        valid_tokens: HashSet<String>,
        grants: HashSet<(String, String, String)>,
        authenticate_calls: AtomicUsize,
        authorize_calls: AtomicUsize,
    }

    impl CountingAccessControl {
        fn allowing(token: &str, columns: &[(&str, &str)]) -> Self {
            Self {
                valid_tokens: HashSet::from([token.to_string()]),
                grants: columns
                    .iter()
                    .map(|(table, column)| {
                        (token.to_string(), table.to_string(), column.to_string())
                    })
                    .collect(),
                authenticate_calls: AtomicUsize::new(0),
                authorize_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait::async_trait]
    impl AccessControlLike for CountingAccessControl {
        async fn authenticate(&self, token: &str) -> Result<bool, WardenError> {
            self.authenticate_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.valid_tokens.contains(token))
        }

        async fn authorize(
            &self,
            token: &str,
            table: &str,
            column: &str,
        ) -> Result<bool, WardenError> {
            self.authorize_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.grants.contains(&(
                token.to_string(),
                table.to_string(),
                column.to_string(),
            )))
        }
    }

    struct CountingRootKeySource {
        key: Vec<u8>,
        calls: AtomicUsize,
        fail: AtomicBool,
    }

    impl CountingRootKeySource {
        fn with_key(byte: u8) -> Self {
            Self {
                key: vec![byte; ROOT_KEY_LEN],
                calls: AtomicUsize::new(0),
                fail: AtomicBool::new(false),
            }
        }
    }

    #[async_trait::async_trait]
    impl RootKeySourceLike for CountingRootKeySource {
        async fn root_key(&self) -> Result<RootKeyMaterial, WardenError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(WardenError::Dependency {
                    msg: "root key source".to_string(),
                    source: None,
                });
            }
            Ok(RootKeyMaterial::new(self.key.clone()))
        }
    }

    /// Registry fake: delegates to an in-memory registry while counting
    /// calls, and can simulate losing the first-use race by handing the
    /// slot to a pre-staged "winner" record on the next insert.
    struct CountingRegistry {
        inner: InMemoryRegistry,
        lookup_calls: AtomicUsize,
        fetch_calls: AtomicUsize,
        insert_calls: AtomicUsize,
        steal_next_insert: Mutex<Option<CreateMasterKeyRecord>>,
    }

    impl CountingRegistry {
        fn new() -> Self {
            Self {
                inner: InMemoryRegistry::new(),
                lookup_calls: AtomicUsize::new(0),
                fetch_calls: AtomicUsize::new(0),
                insert_calls: AtomicUsize::new(0),
                steal_next_insert: Mutex::new(None),
            }
        }
    }

    #[async_trait::async_trait]
    impl KeyRegistryLike for CountingRegistry {
        async fn lookup_master_key_id(&self, table: &str) -> Result<Option<String>, WardenError> {
            self.lookup_calls.fetch_add(1, Ordering::SeqCst);
            self.inner.lookup_master_key_id(table).await
        }

        async fn fetch_wrapped_master_key(
            &self,
            master_key_id: &str,
        ) -> Result<WrappedMasterKey, WardenError> {
            self.fetch_calls.fetch_add(1, Ordering::SeqCst);
            self.inner.fetch_wrapped_master_key(master_key_id).await
        }

        async fn insert_master_key(
            &self,
            record: &CreateMasterKeyRecord,
        ) -> Result<RegistryInsert, WardenError> {
            self.insert_calls.fetch_add(1, Ordering::SeqCst);
            let staged = self.steal_next_insert.lock().unwrap().take();
            if let Some(winner) = staged {
                self.inner.insert_master_key(&winner).await?;
                return Ok(RegistryInsert::Conflict);
            }
            self.inner.insert_master_key(record).await
        }
    }

    struct CountingCipher {
        inner: Aes256GcmCipher,
        wrap_calls: AtomicUsize,
        unwrap_calls: AtomicUsize,
    }

    impl CountingCipher {
        fn new() -> Self {
            Self {
                inner: Aes256GcmCipher,
                wrap_calls: AtomicUsize::new(0),
                unwrap_calls: AtomicUsize::new(0),
            }
        }

        fn total_calls(&self) -> usize {
            self.wrap_calls.load(Ordering::SeqCst) + self.unwrap_calls.load(Ordering::SeqCst)
        }
    }

    impl KeyCipherLike for CountingCipher {
        fn wrap(&self, key_bytes: &[u8], plaintext: &[u8]) -> Result<String, CipherError> {
            self.wrap_calls.fetch_add(1, Ordering::SeqCst);
            self.inner.wrap(key_bytes, plaintext)
        }

        fn unwrap(&self, key_bytes: &[u8], wrapped: &str) -> Result<Vec<u8>, CipherError> {
            self.unwrap_calls.fetch_add(1, Ordering::SeqCst);
            self.inner.unwrap(key_bytes, wrapped)
        }
    }

    fn request(table: &str, column: &str) -> AccessRequest {
        AccessRequest {
            token: "token-1".to_string(),
            table: table.to_string(),
            column: column.to_string(),
        }
    }

    fn orders_ssn_fixture() -> (CountingAccessControl, CountingRootKeySource, CountingRegistry, CountingCipher)
    {
        (
            CountingAccessControl::allowing("token-1", &[("orders", "ssn")]),
            CountingRootKeySource::with_key(42),
            CountingRegistry::new(),
            CountingCipher::new(),
        )
    }

    #[tokio::test]
    async fn round_trip_reuses_the_master_key_registered_on_first_wrap() {
        let (access, root, registry, cipher) = orders_ssn_fixture();
        let req = request("orders", "ssn");

        let plain_1 = PlainDataKey::new(b"123-45-6789".to_vec());
        let wrapped_1 = wrap_data_key(&access, &root, &registry, &cipher, &req, &plain_1)
            .await
            .unwrap();

        let unwrapped_1 = unwrap_data_key(&access, &root, &registry, &cipher, &req, &wrapped_1)
            .await
            .unwrap();
        assert_eq!(unwrapped_1.expose(), b"123-45-6789");

        // A second wrap for the same table must reuse the record created by
        // the first and produce a different ciphertext.
        let plain_2 = PlainDataKey::new(b"987-65-4321".to_vec());
        let wrapped_2 = wrap_data_key(&access, &root, &registry, &cipher, &req, &plain_2)
            .await
            .unwrap();
        assert_ne!(wrapped_1, wrapped_2);
        assert_eq!(registry.inner.record_count(), 1);
        assert_eq!(registry.insert_calls.load(Ordering::SeqCst), 1);

        let unwrapped_2 = unwrap_data_key(&access, &root, &registry, &cipher, &req, &wrapped_2)
            .await
            .unwrap();
        assert_eq!(unwrapped_2.expose(), b"987-65-4321");
    }

    #[tokio::test]
    async fn concurrent_first_use_registers_exactly_one_master_key() {
        let access = Arc::new(CountingAccessControl::allowing("token-1", &[("orders", "ssn")]));
        let root = Arc::new(CountingRootKeySource::with_key(42));
        let registry = Arc::new(InMemoryRegistry::new());
        let cipher = Arc::new(Aes256GcmCipher);

        let mut handles = Vec::new();
        for i in 0..8 {
            let access = access.clone();
            let root = root.clone();
            let registry = registry.clone();
            let cipher = cipher.clone();
            handles.push(tokio::spawn(async move {
                let req = request("orders", "ssn");
                let plain = PlainDataKey::new(format!("data-key-{i}").into_bytes());
                let wrapped =
                    wrap_data_key(&*access, &*root, &*registry, &*cipher, &req, &plain)
                        .await
                        .unwrap();
                (i, wrapped)
            }));
        }

        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap());
        }

        // All callers succeeded against the single registered master key.
        assert_eq!(registry.record_count(), 1);
        let req = request("orders", "ssn");
        for (i, wrapped) in results {
            let plain = unwrap_data_key(&*access, &*root, &*registry, &*cipher, &req, &wrapped)
                .await
                .unwrap();
            assert_eq!(plain.expose(), format!("data-key-{i}").as_bytes());
        }
    }

    #[tokio::test]
    async fn lost_insert_race_transparently_uses_the_winning_record() {
        let (access, root, registry, cipher) = orders_ssn_fixture();
        let req = request("orders", "ssn");

        // Stage the record another request will have inserted by the time
        // our insert lands.
        let winner_master = MasterKeyMaterial::generate();
        let root_key = root.root_key().await.unwrap();
        let winner_wrapped = cipher
            .wrap(root_key.expose(), winner_master.expose())
            .unwrap();
        *registry.steal_next_insert.lock().unwrap() = Some(CreateMasterKeyRecord {
            master_key_id: "winner-mk".to_string(),
            table: "orders".to_string(),
            wrapped_master_key: WrappedMasterKey(winner_wrapped),
            created_at: chrono::Utc::now(),
        });

        let plain = PlainDataKey::new(b"123-45-6789".to_vec());
        let wrapped = wrap_data_key(&access, &root, &registry, &cipher, &req, &plain)
            .await
            .unwrap();

        // The race never surfaced, only one record exists, and the wrapped
        // key opens under the winner's master key.
        assert_eq!(registry.inner.record_count(), 1);
        let direct = cipher.unwrap(winner_master.expose(), &wrapped.0).unwrap();
        assert_eq!(direct, b"123-45-6789");
    }

    #[tokio::test]
    async fn unauthenticated_request_touches_no_collaborators() {
        let (access, root, registry, cipher) = orders_ssn_fixture();
        let req = AccessRequest {
            token: "bogus-token".to_string(),
            table: "orders".to_string(),
            column: "ssn".to_string(),
        };

        let plain = PlainDataKey::new(b"123-45-6789".to_vec());
        let err = wrap_data_key(&access, &root, &registry, &cipher, &req, &plain)
            .await
            .unwrap_err();
        assert!(matches!(err, WardenError::Authentication { .. }));

        let wrapped = WrappedDataKey("AAAA".to_string());
        let err = unwrap_data_key(&access, &root, &registry, &cipher, &req, &wrapped)
            .await
            .unwrap_err();
        assert!(matches!(err, WardenError::Authentication { .. }));

        assert_eq!(access.authenticate_calls.load(Ordering::SeqCst), 2);
        assert_eq!(access.authorize_calls.load(Ordering::SeqCst), 0);
        assert_eq!(root.calls.load(Ordering::SeqCst), 0);
        assert_eq!(registry.lookup_calls.load(Ordering::SeqCst), 0);
        assert_eq!(registry.insert_calls.load(Ordering::SeqCst), 0);
        assert_eq!(cipher.total_calls(), 0);
    }

    #[tokio::test]
    async fn unauthorized_request_touches_no_key_material() {
        let (access, root, registry, cipher) = orders_ssn_fixture();
        // Authenticates fine, but only (orders, ssn) is granted.
        let req = request("orders", "email");

        let plain = PlainDataKey::new(b"123-45-6789".to_vec());
        let err = wrap_data_key(&access, &root, &registry, &cipher, &req, &plain)
            .await
            .unwrap_err();

        match &err {
            WardenError::Authorization { table, column } => {
                assert_eq!(table, "orders");
                assert_eq!(column, "email");
            }
            other => panic!("expected Authorization error, got {other:?}"),
        }

        assert_eq!(access.authorize_calls.load(Ordering::SeqCst), 1);
        assert_eq!(root.calls.load(Ordering::SeqCst), 0);
        assert_eq!(registry.lookup_calls.load(Ordering::SeqCst), 0);
        assert_eq!(cipher.total_calls(), 0);
    }

    #[tokio::test]
    async fn unwrap_of_unregistered_table_fetches_no_root_key() {
        let (access, root, registry, cipher) = orders_ssn_fixture();
        let req = request("orders", "ssn");

        let wrapped = WrappedDataKey("AAAA".to_string());
        let err = unwrap_data_key(&access, &root, &registry, &cipher, &req, &wrapped)
            .await
            .unwrap_err();

        assert!(matches!(err, WardenError::TableNotRegistered { .. }));
        assert!(err.is_business());
        assert_eq!(registry.lookup_calls.load(Ordering::SeqCst), 1);
        assert_eq!(registry.fetch_calls.load(Ordering::SeqCst), 0);
        assert_eq!(root.calls.load(Ordering::SeqCst), 0);
        assert_eq!(cipher.total_calls(), 0);
    }

    #[tokio::test]
    async fn tampered_wrapped_key_is_rejected_as_invalid() {
        let (access, root, registry, cipher) = orders_ssn_fixture();
        let req = request("orders", "ssn");

        let plain = PlainDataKey::new(b"123-45-6789".to_vec());
        let wrapped = wrap_data_key(&access, &root, &registry, &cipher, &req, &plain)
            .await
            .unwrap();

        // Flip one byte of the GCM tag.
        let mut raw = base64::engine::general_purpose::STANDARD
            .decode(&wrapped.0)
            .unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0x01;
        let tampered = WrappedDataKey(base64::engine::general_purpose::STANDARD.encode(&raw));

        let err = unwrap_data_key(&access, &root, &registry, &cipher, &req, &tampered)
            .await
            .unwrap_err();
        assert!(matches!(err, WardenError::InvalidWrappedKey { .. }));
        assert!(err.is_business());
    }

    #[tokio::test]
    async fn wrapped_key_from_another_table_is_rejected_as_invalid() {
        let access =
            CountingAccessControl::allowing("token-1", &[("orders", "ssn"), ("users", "ssn")]);
        let root = CountingRootKeySource::with_key(42);
        let registry = CountingRegistry::new();
        let cipher = CountingCipher::new();

        let plain = PlainDataKey::new(b"123-45-6789".to_vec());
        let wrapped_for_orders = wrap_data_key(
            &access,
            &root,
            &registry,
            &cipher,
            &request("orders", "ssn"),
            &plain,
        )
        .await
        .unwrap();

        // Register a master key for users too, then try to unwrap the
        // orders ciphertext under it.
        wrap_data_key(
            &access,
            &root,
            &registry,
            &cipher,
            &request("users", "ssn"),
            &plain,
        )
        .await
        .unwrap();

        let err = unwrap_data_key(
            &access,
            &root,
            &registry,
            &cipher,
            &request("users", "ssn"),
            &wrapped_for_orders,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, WardenError::InvalidWrappedKey { .. }));
    }

    #[tokio::test]
    async fn stale_record_under_changed_root_key_is_an_integrity_fault() {
        let access = CountingAccessControl::allowing("token-1", &[("orders", "ssn")]);
        let registry = CountingRegistry::new();
        let cipher = CountingCipher::new();
        let req = request("orders", "ssn");

        let plain = PlainDataKey::new(b"123-45-6789".to_vec());
        let old_root = CountingRootKeySource::with_key(42);
        let wrapped = wrap_data_key(&access, &old_root, &registry, &cipher, &req, &plain)
            .await
            .unwrap();

        // The root key changes underneath the stored record.
        let new_root = CountingRootKeySource::with_key(43);

        let err = wrap_data_key(&access, &new_root, &registry, &cipher, &req, &plain)
            .await
            .unwrap_err();
        assert!(matches!(err, WardenError::KeyIntegrity { .. }));
        assert!(!err.is_business());

        let err = unwrap_data_key(&access, &new_root, &registry, &cipher, &req, &wrapped)
            .await
            .unwrap_err();
        assert!(matches!(err, WardenError::KeyIntegrity { .. }));
    }

    #[tokio::test]
    async fn root_key_failure_is_a_dependency_fault_before_any_registry_io() {
        let (access, root, registry, cipher) = orders_ssn_fixture();
        root.fail.store(true, Ordering::SeqCst);
        let req = request("orders", "ssn");

        let plain = PlainDataKey::new(b"123-45-6789".to_vec());
        let err = wrap_data_key(&access, &root, &registry, &cipher, &req, &plain)
            .await
            .unwrap_err();

        assert!(matches!(err, WardenError::Dependency { .. }));
        assert!(!err.is_business());
        // Wrap acquires the root key before resolving the master key.
        assert_eq!(registry.lookup_calls.load(Ordering::SeqCst), 0);
        assert_eq!(cipher.total_calls(), 0);
    }

    #[tokio::test]
    async fn empty_inputs_are_rejected_before_the_gates() {
        let (access, root, registry, cipher) = orders_ssn_fixture();
        let req = request("orders", "ssn");

        let err = wrap_data_key(
            &access,
            &root,
            &registry,
            &cipher,
            &req,
            &PlainDataKey::new(Vec::new()),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, WardenError::InvalidRequest { .. }));

        let err = unwrap_data_key(
            &access,
            &root,
            &registry,
            &cipher,
            &req,
            &WrappedDataKey(String::new()),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, WardenError::InvalidRequest { .. }));

        assert_eq!(access.authenticate_calls.load(Ordering::SeqCst), 0);
        assert_eq!(root.calls.load(Ordering::SeqCst), 0);
    }
}
