//! Reading state and the reducer that owns every transition.

use crate::types::{Identity, LibraryRecord};

/// Application state, mutated only by [`reduce`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReadingState {
    pub identity: Option<Identity>,
    /// Newest first.
    pub library_records: Vec<LibraryRecord>,
    /// True until the auth provider has reported a session at least once.
    pub is_loading: bool,
}

impl Default for ReadingState {
    fn default() -> Self {
        Self {
            identity: None,
            library_records: Vec::new(),
            is_loading: true,
        }
    }
}

impl ReadingState {
    pub fn owner_id(&self) -> Option<&str> {
        self.identity.as_ref().map(|i| i.id.as_str())
    }

    pub fn is_signed_in(&self) -> bool {
        self.identity.is_some()
    }
}

/// State transitions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    SetIdentity(Identity),
    ClearIdentity,
    /// Authoritative replacement of the whole list.
    SetRecords(Vec<LibraryRecord>),
    /// Prepend a record the store has just confirmed.
    AddRecordOptimistic(LibraryRecord),
    SetLoading(bool),
}

/// Apply `action` to `state`.
///
/// Records never outlive the identity that owns them: switching identity
/// empties the list, and records for any other owner are rejected.
pub fn reduce(state: ReadingState, action: Action) -> ReadingState {
    match action {
        Action::SetIdentity(identity) => {
            let same_owner = state.owner_id() == Some(identity.id.as_str());
            ReadingState {
                library_records: if same_owner {
                    state.library_records
                } else {
                    Vec::new()
                },
                identity: Some(identity),
                is_loading: false,
            }
        }

        Action::ClearIdentity => ReadingState {
            identity: None,
            library_records: Vec::new(),
            is_loading: false,
        },

        Action::SetRecords(mut records) => {
            match state.owner_id() {
                Some(owner) => records.retain(|r| r.owner_id == owner),
                None => records.clear(),
            }
            ReadingState {
                library_records: records,
                ..state
            }
        }

        Action::AddRecordOptimistic(record) => {
            if state.owner_id() != Some(record.owner_id.as_str()) {
                return state;
            }
            let mut library_records = Vec::with_capacity(state.library_records.len() + 1);
            library_records.push(record);
            library_records.extend(state.library_records);
            ReadingState {
                library_records,
                ..state
            }
        }

        Action::SetLoading(is_loading) => ReadingState { is_loading, ..state },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RecordId, Timestamp};
    use std::collections::BTreeSet;

    fn identity(id: &str) -> Identity {
        Identity {
            id: id.to_string(),
            display_name: id.to_uppercase(),
            email: format!("{id}@example.com"),
        }
    }

    fn record(id: &str, owner: &str, ts: i64) -> LibraryRecord {
        LibraryRecord {
            id: RecordId::from(id),
            owner_id: owner.to_string(),
            title: format!("Title {id}"),
            author: "Author".into(),
            cover_url: None,
            mood_color: "#000000".into(),
            emotions: BTreeSet::new(),
            notes: String::new(),
            date_added: Timestamp(ts),
        }
    }

    fn signed_in(id: &str) -> ReadingState {
        reduce(ReadingState::default(), Action::SetIdentity(identity(id)))
    }

    #[test]
    fn test_initial_state() {
        let state = ReadingState::default();
        assert!(state.identity.is_none());
        assert!(state.library_records.is_empty());
        assert!(state.is_loading);
    }

    #[test]
    fn test_first_auth_report_ends_loading() {
        assert!(!signed_in("a").is_loading);

        let cleared = reduce(ReadingState::default(), Action::ClearIdentity);
        assert!(!cleared.is_loading);
        assert!(cleared.identity.is_none());
    }

    #[test]
    fn test_identity_switch_empties_records() {
        let state = reduce(signed_in("a"), Action::SetRecords(vec![record("1", "a", 1)]));

        let refreshed = reduce(
            state.clone(),
            Action::SetIdentity(Identity {
                display_name: "Renamed".into(),
                ..identity("a")
            }),
        );
        assert_eq!(refreshed.library_records.len(), 1);

        let switched = reduce(state, Action::SetIdentity(identity("b")));
        assert!(switched.library_records.is_empty());
        assert_eq!(switched.owner_id(), Some("b"));
    }

    #[test]
    fn test_clear_identity_empties_records() {
        let state = reduce(signed_in("a"), Action::SetRecords(vec![record("1", "a", 1)]));
        let state = reduce(state, Action::ClearIdentity);
        assert!(state.library_records.is_empty());
    }

    #[test]
    fn test_set_records_rejects_other_owners() {
        let state = reduce(
            signed_in("a"),
            Action::SetRecords(vec![record("1", "a", 2), record("2", "b", 1)]),
        );
        let ids: Vec<_> = state.library_records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["1"]);

        let anonymous = reduce(
            ReadingState::default(),
            Action::SetRecords(vec![record("1", "a", 2)]),
        );
        assert!(anonymous.library_records.is_empty());
    }

    #[test]
    fn test_optimistic_add_prepends_then_snapshot_replaces() {
        let state = reduce(signed_in("a"), Action::SetRecords(vec![record("1", "a", 1)]));
        let state = reduce(state, Action::AddRecordOptimistic(record("2", "a", 5)));

        let ids: Vec<_> = state.library_records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "1"]);

        let state = reduce(
            state,
            Action::SetRecords(vec![record("2", "a", 5), record("1", "a", 1)]),
        );
        assert_eq!(state.library_records.len(), 2);
    }

    #[test]
    fn test_optimistic_add_for_other_owner_ignored() {
        let state = signed_in("a");
        let next = reduce(state.clone(), Action::AddRecordOptimistic(record("9", "b", 1)));
        assert_eq!(next, state);
    }

    #[test]
    fn test_set_loading() {
        let state = reduce(signed_in("a"), Action::SetLoading(true));
        assert!(state.is_loading);
        assert_eq!(state.owner_id(), Some("a"));
    }
}
