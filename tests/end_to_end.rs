use std::sync::Arc;

use ark_std::rand::RngCore;
use ark_std::test_rng;
use searchable_vault::index::{IndexEntry, IndexStructure};
use searchable_vault::protocol::{DocumentFields, VaultApi};
use searchable_vault::store::RecordStore;
use searchable_vault::{Authority, Client, Config, Error, ErrorKind, UserId, Vault};

type E = ark_bls12_381::Bls12_381;

struct System {
    vault: Arc<Vault<E>>,
    authority: Authority<E, Vault<E>>,
}

impl System {
    fn new<R: RngCore>(rng: &mut R) -> Self {
        let vault = Arc::new(Vault::<E>::in_memory());
        let mut authority = Authority::<E, _>::with_vault(vault.clone());
        authority.setup(rng).unwrap();
        Self { vault, authority }
    }

    fn client<R: RngCore>(&self, rng: &mut R, user_id: UserId) -> Client<E> {
        let enrollment = self.authority.enroll(rng, user_id).unwrap();
        Client::from_enrollment(&enrollment, Config::default()).unwrap()
    }
}

fn jeremy() -> DocumentFields {
    [("name", "Jeremy"), ("surname", "Herbst"), ("ssn", "1536363")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

const JEREMY_KEYWORDS: [&str; 3] = ["name", "surname", "ssn"];

fn single(key: &str, value: &str) -> DocumentFields {
    [(key.to_string(), value.to_string())].into_iter().collect()
}

#[test]
fn test_exact_write_and_search() {
    let rng = &mut test_rng();
    let system = System::new(rng);
    let client = system.client(rng, 1);
    let vault = system.vault.as_ref();

    let added = client
        .add_record(rng, vault, &jeremy(), &JEREMY_KEYWORDS, false)
        .unwrap();
    client
        .add_record(rng, vault, &single("name", "Anna"), &["name"], false)
        .unwrap();

    let found = client
        .search_records(vault, &["Herbst", "Jeremy", "1536363"], false)
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].document, jeremy());
    assert_eq!(found[0].pseudonym, added.pseudonym);

    let found = client
        .search_records(vault, &["Smith", "Jeremy", "1536363"], false)
        .unwrap();
    assert!(found.is_empty());

    let found = client.search_records::<_, &str>(vault, &[], false).unwrap();
    assert!(found.is_empty());
}

#[test]
fn test_revocation_keeps_stored_data() {
    let rng = &mut test_rng();
    let system = System::new(rng);
    let client = system.client(rng, 1);
    let vault = system.vault.as_ref();
    let added = client
        .add_record(rng, vault, &jeremy(), &JEREMY_KEYWORDS, false)
        .unwrap();

    system.authority.revoke(1).unwrap();

    let err = client
        .search_records(vault, &["Jeremy"], false)
        .unwrap_err();
    assert_eq!(err, Error::NotAuthorized(1));
    let err = client
        .add_record(rng, vault, &single("name", "Anna"), &["name"], false)
        .unwrap_err();
    assert_eq!(err, Error::NotAuthorized(1));

    let stored = vault.record(1).unwrap().unwrap();
    assert_eq!(stored.document, added.record);
    assert_eq!(vault.store().record_counter().unwrap(), 1);
    assert_eq!(client.decrypt_document(&stored.document).unwrap(), jeremy());
}

#[test]
fn test_revoke_twice_fails() {
    let rng = &mut test_rng();
    let system = System::new(rng);
    let _client = system.client(rng, 1);

    system.authority.revoke(1).unwrap();
    let err = system.authority.revoke(1).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyRevokedOrUnknown);

    let err = system.vault.revoke_access(77).unwrap_err();
    assert_eq!(err, Error::AlreadyRevokedOrUnknown(77));
}

#[test]
fn test_fuzzy_write_and_search() {
    let rng = &mut test_rng();
    let system = System::new(rng);
    let client = system.client(rng, 1);
    let vault = system.vault.as_ref();

    client
        .add_record(rng, vault, &single("greeting", "hallo"), &["greeting"], true)
        .unwrap();

    let found = client.search_records(vault, &["hallo"], true).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].document, single("greeting", "hallo"));

    // One substitution away.
    assert_eq!(client.search_records(vault, &["hello"], true).unwrap().len(), 1);
    assert!(client.search_records(vault, &["welt"], true).unwrap().is_empty());
}

#[test]
fn test_fuzzy_search_needs_every_keyword() {
    let rng = &mut test_rng();
    let system = System::new(rng);
    let client = system.client(rng, 1);
    let vault = system.vault.as_ref();

    let doc: DocumentFields = [("first", "Jeremy"), ("last", "Herbst")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    client
        .add_record(rng, vault, &doc, &["first", "last"], true)
        .unwrap();

    assert_eq!(
        client
            .search_records(vault, &["Jeremi", "Herbst"], true)
            .unwrap()
            .len(),
        1
    );
    assert!(client
        .search_records(vault, &["Jeremy", "Schmidt"], true)
        .unwrap()
        .is_empty());
    // Two query keywords cannot both match the same stored keyword.
    assert!(client
        .search_records(vault, &["Herbst", "Herbst"], true)
        .unwrap()
        .is_empty());
}

#[test]
fn test_users_are_isolated() {
    let rng = &mut test_rng();
    let system = System::new(rng);
    let alice = system.client(rng, 1);
    let bob = system.client(rng, 2);
    let vault = system.vault.as_ref();

    alice
        .add_record(rng, vault, &jeremy(), &JEREMY_KEYWORDS, false)
        .unwrap();
    bob
        .add_record(rng, vault, &jeremy(), &JEREMY_KEYWORDS, false)
        .unwrap();

    let found = alice.search_records(vault, &["Jeremy"], false).unwrap();
    assert_eq!(found.len(), 1);
    let found = bob.search_records(vault, &["Jeremy"], false).unwrap();
    assert_eq!(found.len(), 1);

    // Bob's tokens presented under Alice's id.
    let mut query = bob.build_query(&["Jeremy"], false).unwrap();
    query.user_id = alice.user_id();
    let hits = vault.search(&query).unwrap();
    assert!(hits.is_empty());
}

#[test]
fn test_enrollment_over_security_details() {
    let rng = &mut test_rng();
    let system = System::new(rng);
    let details = system
        .authority
        .enroll(rng, 5)
        .unwrap()
        .security_details()
        .unwrap();
    let json = serde_json::to_string(&details).unwrap();

    let delivered = serde_json::from_str(&json).unwrap();
    let client = Client::<E>::from_security_details(5, &delivered, Config::default()).unwrap();
    let vault = system.vault.as_ref();
    client
        .add_record(rng, vault, &jeremy(), &JEREMY_KEYWORDS, false)
        .unwrap();
    assert_eq!(
        client.search_records(vault, &["1536363"], false).unwrap().len(),
        1
    );

    let err = system.authority.enroll(rng, 5).unwrap_err();
    assert_eq!(err, Error::UserAlreadyEnrolled(5));
}

#[test]
fn test_fuzzy_search_ignores_keyword_order() {
    let rng = &mut test_rng();
    let system = System::new(rng);
    let client = system.client(rng, 1);
    let vault = system.vault.as_ref();

    let doc: DocumentFields = [("a", "hallo"), ("b", "hello")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    client
        .add_record(rng, vault, &doc, &["a", "b"], true)
        .unwrap();

    // "hallx" only reaches "hallo", while "hello" reaches both stored words.
    for query in [["hallx", "hello"], ["hello", "hallx"]] {
        let found = client.search_records(vault, &query, true).unwrap();
        assert_eq!(found.len(), 1, "query {:?}", query);
        assert_eq!(found[0].document, doc);
    }
}

#[test]
fn test_search_skips_malformed_entries() {
    let rng = &mut test_rng();
    let system = System::new(rng);
    let client = system.client(rng, 1);
    let vault = system.vault.as_ref();

    let (request, blinding) = client
        .blind_index_request(rng, &["Jeremy", "Herbst"])
        .unwrap();
    let responses = vault.generate_index(&request).unwrap();
    let mut entries = client.finish_index(rng, blinding, &responses).unwrap();
    entries.insert(0, IndexEntry::from_raw("no-comma"));
    entries.push(IndexEntry::from_raw("R,!!not base64!!"));
    vault
        .store_record(rng, b"exact".to_vec(), IndexStructure::Exact(entries))
        .unwrap();

    let query = client.build_query(&["Herbst", "Jeremy"], false).unwrap();
    let hits = vault.search(&query).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].record, b"exact".to_vec());

    let doc = single("greeting", "hallo");
    let (document, index) = client
        .write(rng, vault, &doc, &["greeting"], true)
        .unwrap();
    let index = match index {
        IndexStructure::Fuzzy(mut positions) => {
            positions[0].insert(0, IndexEntry::from_raw("no-comma"));
            IndexStructure::Fuzzy(positions)
        }
        other => panic!("expected a fuzzy index, got {:?}", other),
    };
    vault.store_record(rng, document, index).unwrap();

    let query = client.build_query(&["hello"], true).unwrap();
    let hits = vault.search(&query).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(client.decrypt_document(&hits[0].record).unwrap(), doc);
}
