use std::sync::Once;

use chrono::{TimeZone, Utc};
use feed_core::{
    update, Action, Draft, Effect, FeedError, FeedItem, FeedState, Generation, MutationId,
    MutationKind, MutationStatus, Msg, Notice, Page, ReportReason, UserRef,
};
use pretty_assertions::assert_eq;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(feed_logging::initialize_for_tests);
}

fn item(id: &str) -> FeedItem {
    let at = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    FeedItem {
        id: id.to_string(),
        user_id: "u1".to_string(),
        content: format!("post {id}"),
        images: Vec::new(),
        image_layout: "grid".to_string(),
        created_at: at,
        updated_at: at,
        user: UserRef {
            id: "u1".to_string(),
            username: "ada".to_string(),
            name: "Ada".to_string(),
            avatar: None,
        },
        comment_count: 0,
        report_count: 0,
        reported_by_me: false,
    }
}

fn page(number: u32, ids: &[&str], has_more: bool) -> Page<FeedItem> {
    Page {
        items: ids.iter().map(|id| item(id)).collect(),
        page_number: number,
        has_more,
        total: ids.len() as u64,
        limit: 10,
        total_pages: 1,
    }
}

fn fetched(effects: &[Effect]) -> Option<(Generation, u32)> {
    effects.iter().find_map(|effect| match effect {
        Effect::FetchPage {
            generation, page, ..
        } => Some((*generation, *page)),
        _ => None,
    })
}

fn delete_submitted(effects: &[Effect]) -> MutationId {
    effects
        .iter()
        .find_map(|effect| match effect {
            Effect::SubmitDelete { mutation_id, .. } => Some(*mutation_id),
            _ => None,
        })
        .expect("delete effect")
}

fn create_submitted(effects: &[Effect]) -> MutationId {
    effects
        .iter()
        .find_map(|effect| match effect {
            Effect::SubmitCreate { mutation_id, .. } => Some(*mutation_id),
            _ => None,
        })
        .expect("create effect")
}

fn ids(state: &FeedState) -> Vec<String> {
    state.items().iter().map(|i| i.id.clone()).collect()
}

fn loaded(ids: &[&str]) -> FeedState {
    let (state, effects) = update(FeedState::new(), Msg::NextPageRequested);
    let (generation, _) = fetched(&effects).unwrap();
    let (mut state, _) = update(
        state,
        Msg::PageLoaded {
            generation,
            page: page(1, ids, false),
        },
    );
    state.consume_dirty();
    state
}

#[test]
fn delete_removes_item_immediately_and_decrements_total() {
    init_logging();
    let state = loaded(&["X", "Y", "Z"]);
    assert_eq!(state.total(), Some(3));

    let (mut state, effects) = update(state, Msg::DeleteRequested("Y".to_string()));
    assert_eq!(ids(&state), vec!["X", "Z"]);
    assert_eq!(state.total(), Some(2));
    assert!(state.consume_dirty());
    assert_eq!(
        effects,
        vec![Effect::SubmitDelete {
            mutation_id: 1,
            feed_id: "Y".to_string(),
        }]
    );
    assert_eq!(state.view().pending_mutations, 1);
}

#[test]
fn pages_landing_while_delete_is_pending_keep_the_decremented_total() {
    init_logging();
    let (state, effects) = update(FeedState::new(), Msg::NextPageRequested);
    let (generation, _) = fetched(&effects).unwrap();
    let mut first = page(1, &["X", "Y", "Z"], true);
    first.total = 4;
    let (state, _) = update(
        state,
        Msg::PageLoaded {
            generation,
            page: first,
        },
    );
    let (state, _) = update(state, Msg::DeleteRequested("Y".to_string()));
    assert_eq!(state.total(), Some(3));

    let (state, effects) = update(state, Msg::NextPageRequested);
    let (page_two, number) = fetched(&effects).unwrap();
    assert_eq!(number, 2);
    let mut second = page(2, &["W"], false);
    second.total = 4;
    let (state, _) = update(
        state,
        Msg::PageLoaded {
            generation: page_two,
            page: second,
        },
    );
    assert_eq!(ids(&state), vec!["X", "Z", "W"]);
    assert_eq!(state.total(), Some(3));

    // A refresh before the server confirms still reports the delete.
    let (state, effects) = update(state, Msg::RefreshRequested);
    let (refresh, _) = fetched(&effects).unwrap();
    let mut reread = page(1, &["X", "Y", "Z", "W"], false);
    reread.total = 4;
    let (state, _) = update(
        state,
        Msg::PageLoaded {
            generation: refresh,
            page: reread,
        },
    );
    assert_eq!(ids(&state), vec!["X", "Z", "W"]);
    assert_eq!(state.total(), Some(3));
}

#[test]
fn successful_delete_forces_reset_to_server_truth() {
    init_logging();
    let state = loaded(&["1", "2", "3"]);
    let (state, effects) = update(state, Msg::DeleteRequested("2".to_string()));
    let mutation_id = delete_submitted(&effects);

    let (mut state, effects) = update(
        state,
        Msg::DeleteCompleted {
            mutation_id,
            result: Ok(()),
        },
    );
    let (generation, number) = fetched(&effects).expect("reconcile fetch");
    assert_eq!(number, 1);
    assert_eq!(
        state.take_notices(),
        vec![Notice::PostDeleted {
            feed_id: "2".to_string()
        }]
    );

    let (state, _) = update(
        state,
        Msg::PageLoaded {
            generation,
            page: page(1, &["1", "3"], false),
        },
    );
    assert_eq!(ids(&state), vec!["1", "3"]);
    assert_eq!(
        state.settled_mutations()[0].status,
        MutationStatus::Confirmed
    );
}

#[test]
fn failed_delete_is_restored_by_the_forced_read() {
    init_logging();
    let state = loaded(&["X", "Y", "Z"]);
    let (state, effects) = update(state, Msg::DeleteRequested("Y".to_string()));
    let mutation_id = delete_submitted(&effects);
    assert_eq!(ids(&state), vec!["X", "Z"]);

    let error = FeedError::TransientNetwork("connection refused".to_string());
    let (mut state, effects) = update(
        state,
        Msg::DeleteCompleted {
            mutation_id,
            result: Err(error.clone()),
        },
    );
    // Not re-inserted locally; the read supplies the truth.
    assert_eq!(ids(&state), vec!["X", "Z"]);
    assert_eq!(
        state.take_notices(),
        vec![Notice::Failed {
            action: Action::DeletePost,
            error
        }]
    );

    let (generation, number) = fetched(&effects).expect("forced read");
    assert_eq!(number, 1);
    let (state, _) = update(
        state,
        Msg::PageLoaded {
            generation,
            page: page(1, &["X", "Y", "Z"], false),
        },
    );
    assert_eq!(ids(&state), vec!["X", "Y", "Z"]);
    assert_eq!(state.settled_mutations()[0].status, MutationStatus::Failed);
}

#[test]
fn not_found_delete_takes_the_failure_recovery_path() {
    init_logging();
    let state = loaded(&["1", "2"]);
    let (state, effects) = update(state, Msg::DeleteRequested("2".to_string()));
    let mutation_id = delete_submitted(&effects);

    let (_state, effects) = update(
        state,
        Msg::DeleteCompleted {
            mutation_id,
            result: Err(FeedError::NotFound("feed 2".to_string())),
        },
    );
    assert_eq!(fetched(&effects).map(|(_, page)| page), Some(1));
}

#[test]
fn repeated_delete_of_same_item_is_ignored_while_pending() {
    init_logging();
    let state = loaded(&["1", "2"]);
    let (state, _) = update(state, Msg::DeleteRequested("2".to_string()));
    let (state, effects) = update(state, Msg::DeleteRequested("2".to_string()));
    assert!(effects.is_empty());
    assert_eq!(state.outstanding_mutations().len(), 1);
}

#[test]
fn reconciliation_waits_for_the_last_outstanding_mutation() {
    init_logging();
    let state = loaded(&["1", "2", "3"]);
    let (state, effects) = update(state, Msg::DeleteRequested("1".to_string()));
    let first = delete_submitted(&effects);
    let (state, effects) = update(state, Msg::DeleteRequested("2".to_string()));
    let second = delete_submitted(&effects);

    let (state, effects) = update(
        state,
        Msg::DeleteCompleted {
            mutation_id: first,
            result: Ok(()),
        },
    );
    assert!(fetched(&effects).is_none());
    assert!(state.reconcile_pending());

    let (state, effects) = update(
        state,
        Msg::DeleteCompleted {
            mutation_id: second,
            result: Ok(()),
        },
    );
    let fetches: Vec<_> = effects
        .iter()
        .filter(|e| matches!(e, Effect::FetchPage { .. }))
        .collect();
    assert_eq!(fetches.len(), 1);
    assert!(!state.reconcile_pending());
}

#[test]
fn second_mutation_supersedes_running_reconciliation() {
    init_logging();
    let state = loaded(&["1", "2", "3"]);
    let (state, effects) = update(state, Msg::DeleteRequested("1".to_string()));
    let first = delete_submitted(&effects);
    let (state, effects) = update(
        state,
        Msg::DeleteCompleted {
            mutation_id: first,
            result: Ok(()),
        },
    );
    let (first_reconcile, _) = fetched(&effects).unwrap();

    // Another delete starts before the first reconciliation lands.
    let (state, effects) = update(state, Msg::DeleteRequested("2".to_string()));
    let second = delete_submitted(&effects);
    let (state, effects) = update(
        state,
        Msg::DeleteCompleted {
            mutation_id: second,
            result: Ok(()),
        },
    );
    assert!(effects.contains(&Effect::CancelFetch {
        generation: first_reconcile
    }));
    let (second_reconcile, _) = fetched(&effects).unwrap();

    let (state, _) = update(
        state,
        Msg::PageLoaded {
            generation: first_reconcile,
            page: page(1, &["2", "3"], false),
        },
    );
    assert_eq!(ids(&state), vec!["3"]);

    let (state, _) = update(
        state,
        Msg::PageLoaded {
            generation: second_reconcile,
            page: page(1, &["3"], false),
        },
    );
    assert_eq!(ids(&state), vec!["3"]);
}

#[test]
fn page_read_during_delete_does_not_resurrect_the_item() {
    init_logging();
    let (state, effects) = update(FeedState::new(), Msg::NextPageRequested);
    let (generation, _) = fetched(&effects).unwrap();
    let (state, _) = update(
        state,
        Msg::PageLoaded {
            generation,
            page: page(1, &["1", "2"], true),
        },
    );
    let (state, effects) = update(state, Msg::NextPageRequested);
    let (page_two, _) = fetched(&effects).unwrap();
    let (state, _) = update(state, Msg::DeleteRequested("3".to_string()));

    let (state, _) = update(
        state,
        Msg::PageLoaded {
            generation: page_two,
            page: page(2, &["3", "4"], false),
        },
    );
    assert_eq!(ids(&state), vec!["1", "2", "4"]);
}

#[test]
fn invalid_draft_is_rejected_without_effects() {
    init_logging();
    let state = loaded(&["1"]);
    let (mut state, effects) = update(
        state,
        Msg::CreateSubmitted(Draft::new("   ", Vec::new())),
    );
    assert!(effects.is_empty());
    assert!(state.outstanding_mutations().is_empty());
    assert!(matches!(
        state.take_notices().as_slice(),
        [Notice::Failed {
            action: Action::CreatePost,
            error: FeedError::Validation(_)
        }]
    ));

    let (mut state, effects) = update(
        state,
        Msg::CreateSubmitted(Draft::new("hi", vec!["not a url".to_string()])),
    );
    assert!(effects.is_empty());
    assert_eq!(state.take_notices().len(), 1);
    assert_eq!(ids(&state), vec!["1"]);
}

#[test]
fn image_only_draft_is_accepted() {
    init_logging();
    let draft = Draft::new(
        "",
        vec!["http://localhost:3001/uploads/a.png".to_string()],
    );
    let (_state, effects) = update(FeedState::new(), Msg::CreateSubmitted(draft.clone()));
    assert_eq!(
        effects,
        vec![Effect::SubmitCreate {
            mutation_id: 1,
            draft
        }]
    );
}

#[test]
fn confirmed_create_reloads_from_the_top() {
    init_logging();
    let state = loaded(&["1", "2"]);
    let (state, effects) = update(state, Msg::CreateSubmitted(Draft::new("hello", Vec::new())));
    let mutation_id = create_submitted(&effects);
    // No placeholder is staged in the list.
    assert_eq!(ids(&state), vec!["1", "2"]);
    assert!(matches!(
        state.outstanding_mutations()[0].kind,
        MutationKind::Create { .. }
    ));

    let (mut state, effects) = update(
        state,
        Msg::CreateCompleted {
            mutation_id,
            result: Ok(item("new")),
        },
    );
    let (generation, number) = fetched(&effects).unwrap();
    assert_eq!(number, 1);
    assert_eq!(state.take_notices(), vec![Notice::PostPublished]);

    let (state, _) = update(
        state,
        Msg::PageLoaded {
            generation,
            page: page(1, &["new", "1", "2"], false),
        },
    );
    assert_eq!(ids(&state), vec!["new", "1", "2"]);
}

#[test]
fn failed_create_leaves_list_untouched() {
    init_logging();
    let state = loaded(&["1", "2"]);
    let (state, effects) = update(state, Msg::CreateSubmitted(Draft::new("hello", Vec::new())));
    let mutation_id = create_submitted(&effects);

    let error = FeedError::NotPermitted("no session".to_string());
    let (mut state, effects) = update(
        state,
        Msg::CreateCompleted {
            mutation_id,
            result: Err(error.clone()),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(ids(&state), vec!["1", "2"]);
    assert_eq!(
        state.take_notices(),
        vec![Notice::Failed {
            action: Action::CreatePost,
            error
        }]
    );
}

#[test]
fn report_has_no_local_effect_and_conflict_stays_distinct() {
    init_logging();
    let state = loaded(&["1", "2"]);
    let (state, effects) = update(
        state,
        Msg::ReportRequested {
            feed_id: "2".to_string(),
            reason: ReportReason::new(None),
        },
    );
    assert_eq!(
        effects,
        vec![Effect::SubmitReport {
            feed_id: "2".to_string(),
            reason: ReportReason::new(Some("Other")),
        }]
    );
    assert_eq!(ids(&state), vec!["1", "2"]);

    let (mut state, effects) = update(
        state,
        Msg::ReportCompleted {
            feed_id: "2".to_string(),
            result: Err(FeedError::Conflict("already reported".to_string())),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(
        state.take_notices(),
        vec![Notice::Failed {
            action: Action::ReportPost,
            error: FeedError::Conflict("already reported".to_string()),
        }]
    );
}

#[test]
fn report_of_vanished_post_forces_fresh_read() {
    init_logging();
    let state = loaded(&["1", "2"]);
    let (_state, effects) = update(
        state,
        Msg::ReportCompleted {
            feed_id: "2".to_string(),
            result: Err(FeedError::NotFound("feed 2".to_string())),
        },
    );
    assert_eq!(fetched(&effects).map(|(_, page)| page), Some(1));
}

#[test]
fn completion_for_unknown_mutation_is_ignored() {
    init_logging();
    let state = loaded(&["1"]);
    let before = state.clone();
    let (state, effects) = update(
        state,
        Msg::DeleteCompleted {
            mutation_id: 42,
            result: Ok(()),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state, before);
}
