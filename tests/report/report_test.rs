//! Persona report files.

use redpersona::persona::Persona;
use redpersona::report::{save_persona, ReportError};

fn persona(username: &str, text: &str) -> Persona {
    Persona {
        username: username.to_owned(),
        text: text.to_owned(),
        chunks_processed: 1,
        chunks_failed: 0,
        consolidation_failed: false,
    }
}

#[test]
fn writes_username_persona_txt() {
    let tmp = tempfile::tempdir().expect("should create temp dir");
    let path = save_persona(tmp.path(), &persona("kojied", "# 🎂 Estimated Age Range: 25-34"))
        .expect("should save");

    assert_eq!(path, tmp.path().join("kojied_persona.txt"));
    let written = std::fs::read_to_string(&path).expect("should read back");
    assert_eq!(written, "# 🎂 Estimated Age Range: 25-34");
}

#[test]
fn creates_missing_output_dir_and_overwrites() {
    let tmp = tempfile::tempdir().expect("should create temp dir");
    let dir = tmp.path().join("reports/nested");
    save_persona(&dir, &persona("spez", "old")).expect("should save");
    let path = save_persona(&dir, &persona("spez", "new")).expect("should overwrite");
    assert_eq!(std::fs::read_to_string(path).expect("should read back"), "new");
}

#[test]
fn unwritable_target_is_write_error() {
    let tmp = tempfile::tempdir().expect("should create temp dir");
    let blocker = tmp.path().join("file");
    std::fs::write(&blocker, "not a dir").expect("should write");

    let err = save_persona(&blocker, &persona("spez", "x")).expect_err("dir is a file");
    match err {
        ReportError::Write { path, .. } => assert!(path.ends_with("spez_persona.txt")),
    }
}
