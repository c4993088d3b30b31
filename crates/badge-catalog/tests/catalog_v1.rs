use badge_catalog::{BadgeCatalog, BadgeV1, CatalogError};
use score_core::PayloadBytes;

fn badge(name: &str) -> BadgeV1 {
    BadgeV1 {
        name: name.to_string(),
        description: "a test badge".to_string(),
        metadata_uri: "ipfs://badge".to_string(),
        payload: PayloadBytes::new(vec![1, 2, 3]),
    }
}

fn open_catalog(tmp: &tempfile::TempDir) -> BadgeCatalog {
    BadgeCatalog::open(tmp.path()).expect("open catalog")
}

#[test]
fn generate_id_is_deterministic_and_content_sensitive() {
    let a = badge("reviewer");
    let b = badge("reviewer");
    assert_eq!(
        BadgeCatalog::generate_id(&a).unwrap(),
        BadgeCatalog::generate_id(&b).unwrap()
    );

    let mut c = badge("reviewer");
    c.description = "different".to_string();
    assert_ne!(
        BadgeCatalog::generate_id(&a).unwrap(),
        BadgeCatalog::generate_id(&c).unwrap()
    );

    let mut d = badge("reviewer");
    d.payload = PayloadBytes::new(vec![9]);
    assert_ne!(
        BadgeCatalog::generate_id(&a).unwrap(),
        BadgeCatalog::generate_id(&d).unwrap()
    );
}

#[test]
fn create_stores_and_rejects_duplicates() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let catalog = open_catalog(&tmp);

    let b = badge("auditor");
    let id = catalog.create(&b).expect("create badge");
    assert!(catalog.exists(id).unwrap());
    assert_eq!(catalog.get(id).unwrap(), Some(b.clone()));

    let err = catalog.create(&b).unwrap_err();
    assert!(matches!(err, CatalogError::DuplicateBadge(d) if d == id));
    assert_eq!(catalog.len().unwrap(), 1);
}

#[test]
fn create_rejects_empty_name() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let catalog = open_catalog(&tmp);

    let mut b = badge("x");
    b.name = "   ".to_string();
    let err = catalog.create(&b).unwrap_err();
    assert!(matches!(err, CatalogError::Validation(_)), "{err}");
    assert!(catalog.is_empty().unwrap());
}

#[test]
fn get_absent_badge_returns_none() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let catalog = open_catalog(&tmp);

    let id = BadgeCatalog::generate_id(&badge("never-created")).unwrap();
    assert_eq!(catalog.get(id).unwrap(), None);
    assert!(!catalog.exists(id).unwrap());
}

#[test]
fn badge_ids_lists_created_badges() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let catalog = open_catalog(&tmp);

    let id1 = catalog.create(&badge("one")).unwrap();
    let id2 = catalog.create(&badge("two")).unwrap();

    let mut ids = catalog.badge_ids().unwrap();
    ids.sort();
    let mut expected = vec![id1, id2];
    expected.sort();
    assert_eq!(ids, expected);
}
