//! Integration tests for build_runtime.
//!
//! All tests use temporary directories for isolation.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use serde_json::json;

use build_engine::actions::{ActionRequest, BuildAction};
use build_engine::domain::AttackMode;
use build_engine::engine::BuildEngine;
use build_engine::ruleset::Ruleset;

use build_runtime::error::{JournalError, SessionError};
use build_runtime::journal::ActionJournal;
use build_runtime::proto_bridge::action_to_proto;
use build_runtime::registry::SessionRegistry;
use build_runtime::replay::{self, decode_records};
use build_runtime::session::{Session, SharedSession};
use build_runtime::snapshot;

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join("build_runtime_tests").join(name);
    if dir.exists() {
        fs::remove_dir_all(&dir).ok();
    }
    fs::create_dir_all(&dir).expect("Failed to create temp dir");
    dir
}

fn set(name: &str, level: u8) -> BuildAction {
    BuildAction::SetStat {
        name: name.to_string(),
        level,
    }
}

fn major(slug: &str) -> BuildAction {
    BuildAction::SelectMajor {
        path: format!("/guardian_ability/major/{slug}"),
    }
}

fn minor(slug: &str) -> BuildAction {
    BuildAction::SelectMinor {
        path: format!("/guardian_ability/minor/{slug}"),
    }
}

/// A full, accepted build: every action here is legal in order.
fn scripted_build() -> Vec<BuildAction> {
    vec![
        BuildAction::SetName {
            name: "Star Platinum".to_string(),
        },
        set("Damage", 3),
        set("Speed", 2),
        major("charger"),
        major("assassin"),
        minor("telepathy"),
        BuildAction::SwitchAttackMode {
            mode: AttackMode::Ranged,
        },
        BuildAction::RequestColor,
        BuildAction::SetColor {
            color: "#3355AA".parse().expect("valid colour"),
        },
        set("Speed", 1),
        BuildAction::Finalize,
    ]
}

// ─────────────────────────────────────────────────────────────
// Journal and replay
// ─────────────────────────────────────────────────────────────

#[test]
fn append_and_replay_is_deterministic() {
    let dir = temp_dir("append_deterministic");
    let ruleset = Ruleset::default();
    let actions = scripted_build();

    let log_path = dir.join("actions.log");
    {
        let mut journal = ActionJournal::open(&log_path).expect("open journal");
        for (i, action) in actions.iter().enumerate() {
            journal
                .append(&action_to_proto(i as u64 + 1, action))
                .expect("append action");
        }
    }

    let journal = ActionJournal::open(&log_path).expect("reopen journal");
    let loaded = decode_records(&journal.load_all().expect("load")).expect("decode");
    assert_eq!(loaded, actions);

    let hash = replay::verify_determinism(&ruleset, &loaded).expect("deterministic");
    let mut live = BuildEngine::new(&ruleset);
    live.apply_sequence(&actions).expect("legal script");
    assert_eq!(hash, live.state_hash());
}

#[test]
fn corrupted_log_detection() {
    let dir = temp_dir("corrupted_log");
    let log_path = dir.join("actions.log");
    {
        let mut journal = ActionJournal::open(&log_path).expect("open journal");
        for (i, action) in scripted_build()[..5].iter().enumerate() {
            journal
                .append(&action_to_proto(i as u64 + 1, action))
                .expect("append");
        }
    }

    let data = fs::read(&log_path).expect("read log");
    fs::write(&log_path, &data[..data.len() - 3]).expect("truncate");

    match ActionJournal::open(&log_path) {
        Ok(journal) => assert!(
            journal.load_all().is_err(),
            "Corrupted log should produce an error on load"
        ),
        Err(e) => assert!(matches!(e, JournalError::Truncated { after: 4 })),
    }
}

#[test]
fn truncated_tail_is_reported() {
    let dir = temp_dir("truncated_tail");
    let log_path = dir.join("actions.log");
    {
        let mut journal = ActionJournal::open(&log_path).expect("open journal");
        journal
            .append(&action_to_proto(1, &set("Damage", 2)))
            .expect("append");
        journal
            .append(&action_to_proto(2, &BuildAction::Reset))
            .expect("append");
    }

    // A frame header promising more bytes than follow it.
    let mut file = OpenOptions::new()
        .append(true)
        .open(&log_path)
        .expect("open log for append");
    file.write_all(&64u32.to_le_bytes()).expect("write length");
    file.write_all(&[0x08, 0x03]).expect("write partial frame");
    drop(file);

    let err = ActionJournal::open(&log_path)
        .err()
        .expect("truncated tail must fail");
    assert!(matches!(err, JournalError::Truncated { after: 2 }), "{err}");
}

#[test]
fn garbage_frame_length_is_rejected() {
    let dir = temp_dir("garbage_frame");
    let log_path = dir.join("actions.log");
    fs::write(&log_path, u32::MAX.to_le_bytes()).expect("write garbage");
    assert!(matches!(
        ActionJournal::open(&log_path),
        Err(JournalError::InvalidFrameLength(_))
    ));
}

// ─────────────────────────────────────────────────────────────
// Sessions
// ─────────────────────────────────────────────────────────────

#[test]
fn sessions_are_isolated() {
    let dir = temp_dir("isolated_sessions");
    let actions = scripted_build();

    let mut session_a =
        Session::open(&dir, "session_a", Ruleset::default(), 0).expect("open session_a");
    let mut session_b =
        Session::open(&dir, "session_b", Ruleset::default(), 0).expect("open session_b");

    for action in &actions {
        session_a.apply_action(action).expect("apply to a");
    }
    for action in &actions[..3] {
        session_b.apply_action(action).expect("apply to b");
    }

    assert_ne!(session_a.current_hash(), session_b.current_hash());
    assert_eq!(session_a.current_sequence(), actions.len() as u64);
    assert_eq!(session_b.current_sequence(), 3);
    assert!(session_a.state().finalized);
    assert!(!session_b.state().finalized);
}

#[test]
fn rejected_actions_are_not_journaled() {
    let dir = temp_dir("rejected_not_journaled");
    let mut session =
        Session::open(&dir, "s", Ruleset::default(), 0).expect("open session");

    session.apply_action(&set("Damage", 5)).expect("4 points");
    session.apply_action(&set("Defense", 5)).expect("8 points");
    session.apply_action(&set("Speed", 5)).expect("12 points");
    let before = session.current_hash();

    let err = session.apply_action(&major("assassin")).unwrap_err();
    let build = err.as_build_error().expect("kernel rejection");
    assert_eq!(build.code(), "invalid_transition");

    let err = session
        .apply(&ActionRequest::bare("teleport"))
        .unwrap_err();
    assert_eq!(err.as_build_error().map(|e| e.code()), Some("malformed_action"));

    assert_eq!(session.current_hash(), before);
    assert_eq!(session.current_sequence(), 3);

    let journal = ActionJournal::open(&dir.join("s").join("actions.log")).expect("journal");
    assert_eq!(journal.last_sequence(), 3);
}

#[test]
fn reopened_session_recovers_build() {
    let dir = temp_dir("reopen_session");
    let actions = scripted_build();
    let expected = {
        let mut session =
            Session::open(&dir, "guardian", Ruleset::default(), 0).expect("open");
        for action in &actions[..6] {
            session.apply_action(action).expect("apply");
        }
        session.current_hash()
    };

    let mut session = Session::open(&dir, "guardian", Ruleset::default(), 0).expect("reopen");
    assert_eq!(session.current_hash(), expected);
    assert_eq!(session.current_sequence(), 6);

    // Journal continues from the recovered sequence.
    for action in &actions[6..] {
        session.apply_action(action).expect("apply remaining");
    }
    assert!(session.state().finalized);
    assert_eq!(
        session.current_hash(),
        replay::rebuild_hash(&Ruleset::default(), &actions).expect("replay")
    );
}

// ─────────────────────────────────────────────────────────────
// Checkpoints
// ─────────────────────────────────────────────────────────────

#[test]
fn checkpoint_replay_parity() {
    let dir = temp_dir("checkpoint_parity");
    let actions = scripted_build();
    let ruleset = Ruleset::default();

    let live_hash = {
        let mut session = Session::open(&dir, "cp", ruleset.clone(), 4).expect("open");
        for action in &actions {
            session.apply_action(action).expect("apply");
        }
        session.current_hash()
    };

    let checkpoint_dir = dir.join("cp").join("checkpoints");
    let latest = snapshot::load_latest_checkpoint(&checkpoint_dir)
        .expect("load latest")
        .expect("checkpoint written");
    assert_eq!(latest.sequence, 8);
    assert!(latest.verify_digest());

    let (_, hash_at_8) = replay::rebuild_state(&ruleset, &actions[..8]).expect("replay");
    assert_eq!(latest.state_hash, hash_at_8);

    let session = Session::open(&dir, "cp", ruleset, 4).expect("reopen");
    assert_eq!(session.current_hash(), live_hash);
}

#[test]
fn reopening_under_another_ruleset_is_refused() {
    let dir = temp_dir("ruleset_mismatch");
    {
        let mut session = Session::open(&dir, "g", Ruleset::default(), 1).expect("open");
        session.apply_action(&set("Damage", 3)).expect("apply");
    }

    let mut richer = Ruleset::default();
    richer.starting_points = 20;
    let err = Session::open(&dir, "g", richer, 1)
        .err()
        .expect("foreign ruleset must be refused");
    assert!(
        matches!(err, SessionError::RulesetMismatch { sequence: 1 }),
        "{err}"
    );

    let mut session = Session::open(&dir, "g", Ruleset::default(), 1).expect("original ruleset");
    assert_eq!(session.state().points, 13);
    let live = session.current_hash();
    let (_, replayed) = session.replay_full().expect("replay");
    assert_eq!(live, replayed);
}

#[test]
fn checkpoint_that_disagrees_with_journal_falls_back() {
    let dir = temp_dir("checkpoint_tail");
    let ruleset = Ruleset::default();
    let actions = vec![set("Damage", 5), set("Defense", 5), set("Speed", 5)];
    {
        let mut session = Session::open(&dir, "s", ruleset.clone(), 0).expect("open");
        for action in &actions {
            session.apply_action(action).expect("apply");
        }
    }

    // Valid on its own, but already finalized: the journal tail cannot
    // be applied on top of it.
    let mut stale = BuildEngine::new(&ruleset);
    stale
        .apply_sequence(&[set("Damage", 5), BuildAction::Finalize])
        .expect("legal");
    snapshot::save_checkpoint(
        &dir.join("s").join("checkpoints"),
        1,
        stale.state(),
        &ruleset.digest().expect("digest"),
    )
    .expect("save checkpoint");

    let session = Session::open(&dir, "s", ruleset.clone(), 0).expect("reopen");
    assert!(!session.state().finalized);
    assert_eq!(
        session.current_hash(),
        replay::rebuild_hash(&ruleset, &actions).expect("replay")
    );
}

#[test]
fn tampered_checkpoint_falls_back_to_replay() {
    let dir = temp_dir("tampered_checkpoint");
    let actions = scripted_build();
    {
        let mut session = Session::open(&dir, "t", Ruleset::default(), 2).expect("open");
        for action in &actions[..5] {
            session.apply_action(action).expect("apply");
        }
    }

    let path = dir.join("t").join("checkpoints").join("checkpoint_000004.json");
    let content = fs::read_to_string(&path).expect("read checkpoint");
    fs::write(&path, content.replace("Star Platinum", "The World")).expect("tamper");

    let session = Session::open(&dir, "t", Ruleset::default(), 2).expect("reopen");
    assert_eq!(
        session.current_hash(),
        replay::rebuild_hash(&Ruleset::default(), &actions[..5]).expect("replay")
    );
    assert_eq!(session.state().display_name(), "Star Platinum");
}

// ─────────────────────────────────────────────────────────────
// Concurrency and registry
// ─────────────────────────────────────────────────────────────

#[test]
fn shared_session_serializes_threads() {
    let shared = Arc::new(SharedSession::new(Session::in_memory(
        "shared",
        Ruleset::default(),
    )));

    let handles: Vec<_> = ["Damage", "Defense", "Speed", "Potential", "Range"]
        .into_iter()
        .map(|stat| {
            let shared = Arc::clone(&shared);
            thread::spawn(move || {
                let mut accepted = 0;
                for level in 2..=5u8 {
                    let request = ActionRequest::new("set", json!({"name": stat, "level": level}));
                    if shared.apply(&request).is_ok() {
                        accepted += 1;
                    }
                }
                accepted
            })
        })
        .collect();

    let accepted: u64 = handles
        .into_iter()
        .map(|h| h.join().expect("thread panicked"))
        .sum();

    let snapshot = shared.snapshot().expect("snapshot");
    let spent: u32 = snapshot
        .ratedskills
        .iter()
        .map(|s| u32::from(s.level) - 1)
        .sum();
    assert_eq!(snapshot.points + spent, 15);
    // Every accepted raise spends exactly one point.
    assert_eq!(u64::from(spent), accepted);
    assert_eq!(shared.current_sequence().expect("sequence"), accepted);
}

#[test]
fn registry_isolates_sessions_across_threads() {
    let registry = Arc::new(SessionRegistry::new());
    for id in ["alpha", "beta", "gamma"] {
        registry
            .create_in_memory(id, Ruleset::default())
            .expect("create");
    }
    assert_eq!(registry.ids(), vec!["alpha", "beta", "gamma"]);

    let handles: Vec<_> = registry
        .ids()
        .into_iter()
        .enumerate()
        .map(|(i, id)| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                let session = registry.get(&id).expect("lookup");
                let level = i as u8 + 2;
                session
                    .apply_action(&set("Damage", level))
                    .expect("apply");
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("thread panicked");
    }

    let points: Vec<u32> = registry
        .ids()
        .iter()
        .map(|id| registry.get(id).expect("lookup").snapshot().expect("snapshot").points)
        .collect();
    assert_eq!(points, vec![14, 13, 12]);

    registry.discard("beta").expect("discard");
    assert!(matches!(
        registry.get("beta"),
        Err(SessionError::UnknownSession(_))
    ));
    assert_eq!(registry.len(), 2);
}

#[test]
fn registry_rejects_invalid_ruleset() {
    let registry = SessionRegistry::new();
    let mut ruleset = Ruleset::default();
    ruleset.stats[1].name = ruleset.stats[0].name.clone();
    assert!(matches!(
        registry.create_in_memory("bad", ruleset),
        Err(SessionError::Ruleset(_))
    ));
    assert!(registry.is_empty());
}
