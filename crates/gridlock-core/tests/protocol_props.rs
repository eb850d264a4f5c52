// Property-based tests for the locking and versioning protocol.
// CI: 256 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use std::collections::HashMap;

use gridlock_core::protocol::{ErrorKind, Request, Response, handle};
use gridlock_core::{CellRef, Document, DocumentStore, GridlockError};
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn config_256() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

const USERS: [&str; 3] = ["alice", "bob", "carol"];

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
enum Action {
    Lock { cell: CellRef, user: &'static str },
    Unlock { cell: CellRef, user: &'static str },
    Update { cell: CellRef, user: &'static str, value: u8 },
}

fn arb_cell() -> impl Strategy<Value = CellRef> {
    (0usize..3, 0usize..3).prop_map(|(col, row)| CellRef::new(col, row))
}

fn arb_user() -> impl Strategy<Value = &'static str> {
    prop::sample::select(USERS.to_vec())
}

fn arb_action() -> impl Strategy<Value = Action> {
    prop_oneof![
        2 => (arb_cell(), arb_user()).prop_map(|(cell, user)| Action::Lock { cell, user }),
        1 => (arb_cell(), arb_user()).prop_map(|(cell, user)| Action::Unlock { cell, user }),
        2 => (arb_cell(), arb_user(), any::<u8>())
            .prop_map(|(cell, user, value)| Action::Update { cell, user, value }),
    ]
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_256())]
    #[test]
    fn locks_match_a_simple_model(actions in prop::collection::vec(arb_action(), 0..60)) {
        let mut doc = Document::new("props");
        let mut model: HashMap<CellRef, &str> = HashMap::new();

        for action in actions {
            match action {
                Action::Lock { cell, user } => {
                    let result = doc.lock_cell(cell, user);
                    match model.get(&cell) {
                        Some(holder) if *holder != user => {
                            prop_assert_eq!(
                                result,
                                Err(GridlockError::CellAlreadyLocked { cell, holder: holder.to_string() })
                            );
                        }
                        _ => {
                            prop_assert_eq!(result, Ok(()));
                            model.insert(cell, user);
                        }
                    }
                }
                Action::Unlock { cell, user } => {
                    let result = doc.unlock_cell(cell, user);
                    if model.get(&cell) == Some(&user) {
                        prop_assert_eq!(result, Ok(()));
                        model.remove(&cell);
                    } else {
                        prop_assert_eq!(result, Err(GridlockError::LockNotHeld { cell }));
                    }
                }
                Action::Update { cell, user, value } => {
                    let before = doc.version();
                    let result = doc.update_cell(cell, vec![value.to_string()], user);
                    if model.get(&cell) == Some(&user) {
                        prop_assert_eq!(result, Ok(before + 1));
                    } else {
                        prop_assert!(result.is_err());
                        prop_assert_eq!(doc.version(), before);
                    }
                }
            }

            for (cell, holder) in &model {
                prop_assert_eq!(doc.lock_status(cell), Some(*holder));
            }
            prop_assert_eq!(doc.locked_cells().count(), model.len());
        }
    }
}

proptest! {
    #![proptest_config(config_256())]
    #[test]
    fn committed_versions_increase_by_one(
        updates in prop::collection::vec((arb_cell(), any::<u8>()), 1..40),
    ) {
        let store = DocumentStore::new();
        store.create("d").unwrap();

        let mut versions = Vec::new();
        for (cell, value) in updates {
            let lock = handle(&store, Request::LockCell {
                document: "d".into(),
                cell,
                user: "alice".into(),
            });
            prop_assert!(!lock.is_error());

            let response = handle(&store, Request::UpdateCell {
                document: "d".into(),
                cell,
                formula: vec![value.to_string()],
                user: "alice".into(),
            });
            match response {
                Response::Updated { version, .. } => versions.push(version),
                other => prop_assert!(false, "unexpected response {:?}", other),
            }
        }

        for pair in versions.windows(2) {
            prop_assert_eq!(pair[1], pair[0] + 1);
        }
        prop_assert_eq!(versions[0], 1);

        let last = *versions.last().unwrap();
        match handle(&store, Request::SheetState { document: "d".into() }) {
            Response::SheetState { version, .. } => prop_assert_eq!(version, last),
            other => prop_assert!(false, "unexpected response {:?}", other),
        }
    }
}

proptest! {
    #![proptest_config(config_256())]
    #[test]
    fn second_user_always_sees_first_holder(cell in arb_cell(), first in 0usize..3, offset in 1usize..3) {
        let store = DocumentStore::new();
        store.create("d").unwrap();
        let (first, second) = (USERS[first], USERS[(first + offset) % USERS.len()]);

        let lock = |user: &str| handle(&store, Request::LockCell {
            document: "d".into(),
            cell,
            user: user.into(),
        });
        prop_assert!(!lock(first).is_error());

        match lock(second) {
            Response::Error { kind, editing_by, .. } => {
                prop_assert_eq!(kind, ErrorKind::CellAlreadyLocked);
                prop_assert_eq!(editing_by.as_deref(), Some(first));
            }
            other => prop_assert!(false, "unexpected response {:?}", other),
        }
    }
}
