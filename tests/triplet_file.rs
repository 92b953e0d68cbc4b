use std::fs::OpenOptions;

use ldcsr::ld::{read_ld_triplets, write_ld_triplets, IndexSpace};
use ldcsr::{ErrorKind, LdMatrixError, LdMatrixState};
use tempfile::tempdir;
mod common;
use common::{small_matrix, triplets};

#[test]
fn file_ingestion_matches_in_memory_ingestion() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("chr1.ld.bin");
    let batch = triplets(&[(0, 2, 0.5), (1, 0, 0.25), (1, 2, 0.05)]);
    write_ld_triplets(&path, &batch).expect("write succeeds");

    let mut from_file = small_matrix();
    from_file.ingest_file(1, &path, 0.1).expect("file ingestion succeeds");
    from_file.finalize(0.1).expect("finalize succeeds");

    let mut in_memory = small_matrix();
    in_memory.ingest(1, &batch, 0.1).unwrap();
    in_memory.finalize(0.1).unwrap();

    assert_eq!(from_file.csr().unwrap(), in_memory.csr().unwrap());
    assert_eq!(from_file.ld_tag_sum(), in_memory.ld_tag_sum());
    assert_eq!(from_file.find_ld_r2(1, 0).unwrap(), Some(0.25));
    assert_eq!(from_file.find_ld_r2(1, 1).unwrap(), None);
}

#[test]
fn truncated_file_is_malformed_input() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("short.ld.bin");
    write_ld_triplets(&path, &triplets(&[(0, 2, 0.5), (1, 2, 0.4)])).unwrap();
    let file = OpenOptions::new().write(true).open(&path).unwrap();
    file.set_len(8 + 20).unwrap();
    drop(file);

    let mut ld = small_matrix();
    let err = ld.ingest_file(1, &path, 0.1).unwrap_err();
    assert!(matches!(err, LdMatrixError::TruncatedFile { expected: 24, .. }));
    assert_eq!(err.kind(), ErrorKind::MalformedInput);
    assert_eq!(ld.state(), LdMatrixState::Empty);
}

#[test]
fn missing_file_surfaces_io_error() {
    let dir = tempdir().expect("tempdir");
    let mut ld = small_matrix();
    let err = ld
        .ingest_file(1, dir.path().join("absent.ld.bin"), 0.1)
        .unwrap_err();
    assert!(matches!(err, LdMatrixError::Io(_)));
}

#[test]
fn file_contents_are_checked_like_any_batch() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("bad.ld.bin");
    write_ld_triplets(&path, &triplets(&[(0, 2, 0.5), (0, 7, 0.5)])).unwrap();
    assert_eq!(read_ld_triplets(&path).unwrap().len(), 2);

    let mut ld = small_matrix();
    let err = ld.ingest_file(1, &path, 0.1).unwrap_err();
    assert!(matches!(
        err,
        LdMatrixError::IndexOutOfRange {
            space: IndexSpace::Snp,
            index: 7,
            bound: 3
        }
    ));
    assert_eq!(ld.coo_len(), 0);
}

#[test]
fn finalized_matrix_refuses_files_before_reading() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("chr1.ld.bin");
    write_ld_triplets(&path, &triplets(&[(0, 2, 0.5)])).unwrap();

    let mut ld = small_matrix();
    ld.ingest_file(1, &path, 0.1).unwrap();
    ld.finalize(0.1).unwrap();
    // the second path does not exist; the state check comes first
    let err = ld
        .ingest_file(2, dir.path().join("absent.ld.bin"), 0.1)
        .unwrap_err();
    assert!(matches!(err, LdMatrixError::AlreadyFinalized));
}
