//! End-to-end tests through the gated `Keeper` call path.

use std::sync::Arc;
use std::time::{Duration, Instant};

use keeper::auth::ManualClock;
use keeper::catalog::{Card, Credential, SecretBody, SecretKind};
use keeper::config::Settings;
use keeper::rpc::{Code, Metadata, Operation, Reply, Request, SecretInput};
use keeper::server::Keeper;
use keeper::store::Database;
use tempfile::TempDir;
use zeroize::Zeroizing;

const T0: i64 = 1_700_000_000;

/// Settings with a cheap Argon2 cost so tests stay fast.
fn settings(secret: &str) -> Settings {
    Settings {
        secret_key: secret.into(),
        token_duration_minutes: 1,
        argon2_memory_kib: 8_192,
        argon2_iterations: 1,
        ..Settings::default()
    }
}

fn keeper() -> (Keeper, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::at(T0));
    let keeper = Keeper::with_database(
        &settings("integration-secret"),
        Database::open_in_memory().unwrap(),
        clock.clone(),
    )
    .unwrap();
    (keeper, clock)
}

fn register(keeper: &Keeper, login: &str, password: &str) -> String {
    match keeper
        .call(Request::new(Operation::Register {
            login: login.into(),
            password: Zeroizing::new(password.into()),
        }))
        .unwrap()
    {
        Reply::Authorized { token, .. } => token,
        other => panic!("expected Authorized, got {other:?}"),
    }
}

fn raw(name: &str, text: &str, comment: &str) -> SecretInput {
    SecretInput {
        name: name.into(),
        body: SecretBody::Raw(text.into()),
        comment: comment.into(),
    }
}

fn get(kind: SecretKind, name: &str) -> Operation {
    Operation::Get {
        kind,
        name: name.into(),
    }
}

fn names(keeper: &Keeper, token: &str) -> Vec<String> {
    match keeper
        .call(Request::new(Operation::ListNames).with_token(token))
        .unwrap()
    {
        Reply::Names(mut names) => {
            names.sort();
            names
        }
        other => panic!("expected Names, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn raw_secret_lifecycle() {
    let (keeper, _) = keeper();
    let token = register(&keeper, "bob", "pw1");

    let reply = keeper
        .call(
            Request::new(Operation::Save(raw("note1", "hello world", "comment A")))
                .with_token(&token),
        )
        .unwrap();
    assert_eq!(reply, Reply::Done);

    let reply = keeper
        .call(Request::new(get(SecretKind::Raw, "note1")).with_token(&token))
        .unwrap();
    assert_eq!(
        reply,
        Reply::Secret {
            body: SecretBody::Raw("hello world".into()),
            comment: "comment A".into(),
        }
    );

    keeper
        .call(
            Request::new(Operation::Update(raw("note1", "hello again", "comment B")))
                .with_token(&token),
        )
        .unwrap();
    let reply = keeper
        .call(Request::new(get(SecretKind::Raw, "note1")).with_token(&token))
        .unwrap();
    assert_eq!(
        reply,
        Reply::Secret {
            body: SecretBody::Raw("hello again".into()),
            comment: "comment B".into(),
        }
    );

    keeper
        .call(
            Request::new(Operation::Delete {
                kind: SecretKind::Raw,
                name: "note1".into(),
            })
            .with_token(&token),
        )
        .unwrap();
    let status = keeper
        .call(Request::new(get(SecretKind::Raw, "note1")).with_token(&token))
        .unwrap_err();
    assert_eq!(status.code, Code::NotFound);
}

#[test]
fn card_and_credential_round_trip() {
    let (keeper, _) = keeper();
    let token = register(&keeper, "bob", "pw1");

    let card = Card {
        number: "4111111111111111".into(),
        month: "12".into(),
        year: "2030".into(),
        holder: "BOB".into(),
        cvv: "123".into(),
    };
    let cred = Credential {
        login: "bob@mail".into(),
        password: "hunter2".into(),
    };
    for (name, body) in [
        ("visa", SecretBody::Card(card.clone())),
        ("mail", SecretBody::Credential(cred.clone())),
    ] {
        keeper
            .call(
                Request::new(Operation::Save(SecretInput {
                    name: name.into(),
                    body,
                    comment: String::new(),
                }))
                .with_token(&token),
            )
            .unwrap();
    }

    let reply = keeper
        .call(Request::new(get(SecretKind::Card, "visa")).with_token(&token))
        .unwrap();
    assert_eq!(
        reply,
        Reply::Secret {
            body: SecretBody::Card(card),
            comment: String::new(),
        }
    );

    let reply = keeper
        .call(Request::new(get(SecretKind::Credential, "mail")).with_token(&token))
        .unwrap();
    assert_eq!(
        reply,
        Reply::Secret {
            body: SecretBody::Credential(cred),
            comment: String::new(),
        }
    );

    assert_eq!(names(&keeper, &token), vec!["mail", "visa"]);
}

#[test]
fn file_secret_keeps_bytes() {
    let (keeper, _) = keeper();
    let token = register(&keeper, "bob", "pw1");
    let bytes: Vec<u8> = (0..=255).rev().collect();

    keeper
        .call(
            Request::new(Operation::Save(SecretInput {
                name: "key.bin".into(),
                body: SecretBody::File(bytes.clone()),
                comment: "ssh".into(),
            }))
            .with_token(&token),
        )
        .unwrap();

    let reply = keeper
        .call(Request::new(get(SecretKind::File, "key.bin")).with_token(&token))
        .unwrap();
    assert_eq!(
        reply,
        Reply::Secret {
            body: SecretBody::File(bytes),
            comment: "ssh".into(),
        }
    );
}

// ---------------------------------------------------------------------------
// Auth gate
// ---------------------------------------------------------------------------

#[test]
fn secret_calls_without_token_are_unauthenticated() {
    let (keeper, _) = keeper();
    register(&keeper, "bob", "pw1");

    let status = keeper.call(Request::new(Operation::ListNames)).unwrap_err();
    assert_eq!(status.code, Code::Unauthenticated);

    let status = keeper
        .call(Request::new(Operation::ListNames).with_metadata(Metadata::new()))
        .unwrap_err();
    assert_eq!(status.code, Code::Unauthenticated);
}

#[test]
fn tampered_token_is_unauthenticated() {
    let (keeper, _) = keeper();
    let token = register(&keeper, "bob", "pw1");

    let mut parts: Vec<String> = token.split('.').map(String::from).collect();
    parts[1].push('A');
    let tampered = parts.join(".");

    let status = keeper
        .call(Request::new(Operation::ListNames).with_token(&tampered))
        .unwrap_err();
    assert_eq!(status.code, Code::Unauthenticated);
}

#[test]
fn token_expires_after_configured_duration() {
    let (keeper, clock) = keeper();
    let token = register(&keeper, "bob", "pw1");

    clock.set(T0 + 59);
    assert!(keeper
        .call(Request::new(Operation::ListNames).with_token(&token))
        .is_ok());

    clock.set(T0 + 61);
    let status = keeper
        .call(Request::new(Operation::ListNames).with_token(&token))
        .unwrap_err();
    assert_eq!(status.code, Code::Unauthenticated);
}

#[test]
fn login_checks_password() {
    let (keeper, _) = keeper();
    register(&keeper, "bob", "pw1");

    let login = |password: &str| {
        keeper.call(Request::new(Operation::Login {
            login: "bob".into(),
            password: Zeroizing::new(password.into()),
        }))
    };
    assert!(matches!(login("pw1"), Ok(Reply::Authorized { .. })));
    assert_eq!(login("pw2").unwrap_err().code, Code::Unauthenticated);

    let status = keeper
        .call(Request::new(Operation::Login {
            login: "ghost".into(),
            password: Zeroizing::new("pw1".into()),
        }))
        .unwrap_err();
    assert_eq!(status.code, Code::NotFound);
}

#[test]
fn duplicate_login_is_already_exists() {
    let (keeper, _) = keeper();
    register(&keeper, "bob", "pw1");

    let status = keeper
        .call(Request::new(Operation::Register {
            login: "bob".into(),
            password: Zeroizing::new("other".into()),
        }))
        .unwrap_err();
    assert_eq!(status.code, Code::AlreadyExists);
}

// ---------------------------------------------------------------------------
// Conflicts, existence and ownership
// ---------------------------------------------------------------------------

#[test]
fn saving_a_taken_name_is_already_exists() {
    let (keeper, _) = keeper();
    let token = register(&keeper, "bob", "pw1");

    keeper
        .call(Request::new(Operation::Save(raw("note1", "a", ""))).with_token(&token))
        .unwrap();
    let status = keeper
        .call(Request::new(Operation::Save(raw("note1", "b", ""))).with_token(&token))
        .unwrap_err();
    assert_eq!(status.code, Code::AlreadyExists);
}

#[test]
fn unknown_names_are_not_found() {
    let (keeper, _) = keeper();
    let token = register(&keeper, "bob", "pw1");

    let status = keeper
        .call(Request::new(Operation::Update(raw("ghost", "x", ""))).with_token(&token))
        .unwrap_err();
    assert_eq!(status.code, Code::NotFound);

    let status = keeper
        .call(
            Request::new(Operation::Delete {
                kind: SecretKind::Raw,
                name: "ghost".into(),
            })
            .with_token(&token),
        )
        .unwrap_err();
    assert_eq!(status.code, Code::NotFound);
}

#[test]
fn names_are_global_but_secrets_are_private() {
    let (keeper, _) = keeper();
    let alice = register(&keeper, "alice", "pw-a");
    let bob = register(&keeper, "bob", "pw-b");

    keeper
        .call(Request::new(Operation::Save(raw("shared", "alice's", ""))).with_token(&alice))
        .unwrap();

    let status = keeper
        .call(Request::new(Operation::Save(raw("shared", "bob's", ""))).with_token(&bob))
        .unwrap_err();
    assert_eq!(status.code, Code::AlreadyExists);

    for op in [
        get(SecretKind::Raw, "shared"),
        Operation::Update(raw("shared", "bob's", "")),
        Operation::Delete {
            kind: SecretKind::Raw,
            name: "shared".into(),
        },
    ] {
        let status = keeper.call(Request::new(op).with_token(&bob)).unwrap_err();
        assert_eq!(status.code, Code::NotFound);
    }

    assert!(names(&keeper, &bob).is_empty());
    assert_eq!(names(&keeper, &alice), vec!["shared"]);
}

#[test]
fn list_names_tracks_saves_and_deletes() {
    let (keeper, _) = keeper();
    let token = register(&keeper, "bob", "pw1");
    assert!(names(&keeper, &token).is_empty());

    for name in ["c", "a", "b"] {
        keeper
            .call(Request::new(Operation::Save(raw(name, "x", ""))).with_token(&token))
            .unwrap();
    }
    assert_eq!(names(&keeper, &token), vec!["a", "b", "c"]);

    keeper
        .call(
            Request::new(Operation::Delete {
                kind: SecretKind::Raw,
                name: "b".into(),
            })
            .with_token(&token),
        )
        .unwrap();
    assert_eq!(names(&keeper, &token), vec!["a", "c"]);
}

#[test]
fn delete_matches_by_name_whatever_the_kind() {
    let (keeper, _) = keeper();
    let token = register(&keeper, "bob", "pw1");

    keeper
        .call(Request::new(Operation::Save(raw("note1", "x", ""))).with_token(&token))
        .unwrap();

    let reply = keeper
        .call(
            Request::new(Operation::Delete {
                kind: SecretKind::Card,
                name: "note1".into(),
            })
            .with_token(&token),
        )
        .unwrap();
    assert_eq!(reply, Reply::Done);

    let status = keeper
        .call(Request::new(get(SecretKind::Raw, "note1")).with_token(&token))
        .unwrap_err();
    assert_eq!(status.code, Code::NotFound);
}

#[test]
fn expired_deadline_is_deadline_exceeded() {
    let (keeper, _) = keeper();

    let mut request = Request::new(Operation::Register {
        login: "bob".into(),
        password: Zeroizing::new("pw1".into()),
    });
    request.deadline = Some(Instant::now());

    let status = keeper.call(request).unwrap_err();
    assert_eq!(status.code, Code::DeadlineExceeded);
}

#[test]
fn deadline_bounds_wait_on_a_locked_database() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("keeper.db");
    let keeper = Keeper::with_database(
        &settings("integration-secret"),
        Database::open(&path, Duration::from_secs(5)).unwrap(),
        Arc::new(ManualClock::at(T0)),
    )
    .unwrap();

    let other = rusqlite::Connection::open(&path).unwrap();
    other.execute_batch("BEGIN EXCLUSIVE").unwrap();

    let started = Instant::now();
    let status = keeper
        .call(
            Request::new(Operation::Register {
                login: "bob".into(),
                password: Zeroizing::new("pw1".into()),
            })
            .with_timeout(Duration::from_millis(20)),
        )
        .unwrap_err();
    assert_eq!(status.code, Code::DeadlineExceeded);
    assert!(started.elapsed() < Duration::from_secs(1));

    other.execute_batch("ROLLBACK").unwrap();
    register(&keeper, "bob", "pw1");
}

// ---------------------------------------------------------------------------
// Persistence and key separation
// ---------------------------------------------------------------------------

#[test]
fn database_file_survives_reopen() {
    let tmp = TempDir::new().unwrap();
    let settings = Settings {
        database_path: tmp.path().join("keeper.db"),
        ..settings("persistent-secret")
    };

    {
        let keeper = Keeper::open(&settings).unwrap();
        let token = register(&keeper, "bob", "pw1");
        keeper
            .call(Request::new(Operation::Save(raw("note1", "kept", "c"))).with_token(&token))
            .unwrap();
    }

    let keeper = Keeper::open(&settings).unwrap();
    let Reply::Authorized { token, .. } = keeper
        .call(Request::new(Operation::Login {
            login: "bob".into(),
            password: Zeroizing::new("pw1".into()),
        }))
        .unwrap()
    else {
        panic!("expected Authorized");
    };
    let reply = keeper
        .call(Request::new(get(SecretKind::Raw, "note1")).with_token(&token))
        .unwrap();
    assert_eq!(
        reply,
        Reply::Secret {
            body: SecretBody::Raw("kept".into()),
            comment: "c".into(),
        }
    );
}

#[test]
fn another_secret_key_can_neither_verify_tokens_nor_decrypt() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("keeper.db");
    let first = Settings {
        database_path: path.clone(),
        ..settings("first-secret")
    };
    let second = Settings {
        database_path: path,
        ..settings("second-secret")
    };

    let old_token = {
        let keeper = Keeper::open(&first).unwrap();
        let token = register(&keeper, "bob", "pw1");
        keeper
            .call(Request::new(Operation::Save(raw("note1", "x", ""))).with_token(&token))
            .unwrap();
        token
    };

    let keeper = Keeper::open(&second).unwrap();
    let status = keeper
        .call(Request::new(Operation::ListNames).with_token(&old_token))
        .unwrap_err();
    assert_eq!(status.code, Code::Unauthenticated);

    let Reply::Authorized { token, .. } = keeper
        .call(Request::new(Operation::Login {
            login: "bob".into(),
            password: Zeroizing::new("pw1".into()),
        }))
        .unwrap()
    else {
        panic!("expected Authorized");
    };
    let status = keeper
        .call(Request::new(get(SecretKind::Raw, "note1")).with_token(&token))
        .unwrap_err();
    assert_eq!(status.code, Code::Internal);
}

#[test]
fn open_rejects_missing_secret_key() {
    let tmp = TempDir::new().unwrap();
    let settings = Settings {
        database_path: tmp.path().join("keeper.db"),
        ..Settings::default()
    };
    assert!(Keeper::open(&settings).is_err());
}
