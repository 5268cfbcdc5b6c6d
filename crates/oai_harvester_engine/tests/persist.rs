use std::fs;
use std::io::Read;

use oai_harvester_engine::{
    ensure_output_dir, AtomicFileWriter, FsPageStore, LastSession, PageStore, StoreError,
};
use tempfile::TempDir;

#[test]
fn creates_missing_output_dir() {
    let temp = TempDir::new().unwrap();
    let new_dir = temp.path().join("out");
    assert!(!new_dir.exists());
    ensure_output_dir(&new_dir).unwrap();
    assert!(new_dir.is_dir());
}

#[test]
fn atomic_write_never_replaces_existing() {
    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path().to_path_buf());

    let first = writer.write_new("reclist1_0001", b"hello").unwrap();
    assert_eq!(first.file_name().unwrap(), "reclist1_0001");
    assert_eq!(fs::read(&first).unwrap(), b"hello");

    let err = writer.write_new("reclist1_0001", b"world").unwrap_err();
    assert!(matches!(err, StoreError::PageExists(path) if path == first));
    assert_eq!(fs::read(&first).unwrap(), b"hello");
}

#[test]
fn no_partial_file_on_error() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("not_a_dir");
    fs::write(&file_path, "x").unwrap();

    let writer = AtomicFileWriter::new(file_path.clone());
    let result = writer.write_new("reclist1_0001", b"data");
    assert!(result.is_err());
    assert!(!file_path.with_file_name("reclist1_0001").exists());
}

#[test]
fn empty_store_has_no_last_session() {
    let temp = TempDir::new().unwrap();
    let store = FsPageStore::new(temp.path().join("reclist"));
    assert_eq!(store.locate_last_session().unwrap(), LastSession::default());

    let missing = FsPageStore::new(temp.path().join("nowhere").join("reclist"));
    assert_eq!(missing.locate_last_session().unwrap().session_number, 0);
}

#[test]
fn pages_are_one_based_and_padded() {
    let temp = TempDir::new().unwrap();
    let store = FsPageStore::new(temp.path().join("arXiv_oai").join("reclist"));

    let first = store.write_page(1, 0, 4, b"<a/>").unwrap();
    let second = store.write_page(1, 1, 4, b"<b/>").unwrap();
    let unpadded = store.write_page(2, 9, 0, b"<c/>").unwrap();

    assert_eq!(first.file_name().unwrap(), "reclist1_0001");
    assert_eq!(second.file_name().unwrap(), "reclist1_0002");
    assert_eq!(unpadded.file_name().unwrap(), "reclist2_10");
}

#[test]
fn last_session_points_at_its_lowest_page() {
    let temp = TempDir::new().unwrap();
    let store = FsPageStore::new(temp.path().join("reclist"));
    for (session, page) in [(1, 0), (1, 1), (3, 2), (3, 0), (3, 1)] {
        store.write_page(session, page, 4, b"<page/>").unwrap();
    }
    fs::write(temp.path().join("unrelated.txt"), "x").unwrap();
    fs::write(temp.path().join("reclist_notes"), "x").unwrap();

    let last = store.locate_last_session().unwrap();
    assert_eq!(last.session_number, 3);
    assert_eq!(last.first_page, Some(temp.path().join("reclist3_0001")));
}

#[test]
fn clear_session_deletes_only_that_session() {
    let temp = TempDir::new().unwrap();
    let store = FsPageStore::new(temp.path().join("reclist"));
    store.write_page(1, 0, 4, b"<a/>").unwrap();
    store.write_page(2, 0, 4, b"<b/>").unwrap();
    store.write_page(2, 1, 4, b"<c/>").unwrap();

    let mut deleted = store.clear_session(2).unwrap();
    deleted.sort();
    assert_eq!(
        deleted,
        vec![temp.path().join("reclist2_0001"), temp.path().join("reclist2_0002")]
    );
    assert_eq!(store.locate_last_session().unwrap().session_number, 1);
    assert!(store.clear_session(7).unwrap().is_empty());
}

#[test]
fn first_page_is_found_across_padding_changes() {
    let temp = TempDir::new().unwrap();
    let store = FsPageStore::new(temp.path().join("reclist"));
    store.write_page(5, 0, 0, b"<first/>").unwrap();

    let (path, mut reader) = store.read_first_page(5, 4).unwrap();
    assert_eq!(path, temp.path().join("reclist5_1"));
    let mut content = String::new();
    reader.read_to_string(&mut content).unwrap();
    assert_eq!(content.as_bytes(), b"<first/>");

    let err = store.read_first_page(6, 4).err().unwrap();
    assert!(matches!(err, StoreError::MissingPage { session_number: 6 }));
}
