use feed_logging::{feed_debug, feed_info, feed_warn};

use crate::mutation::{MutationKind, MutationStatus};
use crate::{Action, Effect, FeedError, FeedState, Msg, Notice};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: FeedState, msg: Msg) -> (FeedState, Vec<Effect>) {
    let effects = match msg {
        Msg::NextPageRequested => state.request_next_page(),
        Msg::RefreshRequested => state.start_reset(),
        Msg::PageLoaded { generation, page } => {
            state.apply_page(generation, page);
            Vec::new()
        }
        Msg::PageFailed { generation, error } => {
            // Accumulated items stay as they are; retry is up to the user.
            if state.settle_feed_fetch(generation) {
                feed_warn!("Feed page fetch {} failed: {}", generation, error);
                state.push_notice(Notice::failed(Action::LoadFeed, error));
            }
            Vec::new()
        }
        Msg::PageCancelled { generation } => {
            if !state.settle_feed_fetch(generation) && !state.settle_comments_fetch(generation) {
                feed_debug!("Cancellation of {} arrived after it was superseded", generation);
            }
            Vec::new()
        }
        Msg::CreateSubmitted(draft) => match draft.validate() {
            Ok(()) => {
                let mutation_id = state.mutations.stage(MutationKind::Create {
                    draft: draft.clone(),
                });
                state.mark_dirty();
                vec![Effect::SubmitCreate { mutation_id, draft }]
            }
            Err(error) => {
                state.push_notice(Notice::failed(Action::CreatePost, error));
                Vec::new()
            }
        },
        Msg::CreateCompleted {
            mutation_id,
            result,
        } => match result {
            Ok(item) => {
                if state
                    .mutations
                    .settle(mutation_id, MutationStatus::Confirmed)
                    .is_none()
                {
                    return (state, Vec::new());
                }
                feed_info!("Post {} published; reconciling", item.id);
                state.push_notice(Notice::PostPublished);
                state.request_reconcile()
            }
            Err(error) => {
                if state
                    .mutations
                    .settle(mutation_id, MutationStatus::Failed)
                    .is_none()
                {
                    return (state, Vec::new());
                }
                // Nothing was staged in the list, so there is nothing to roll back.
                feed_warn!("Create {} failed: {}", mutation_id, error);
                state.push_notice(Notice::failed(Action::CreatePost, error));
                state.flush_deferred_reconcile()
            }
        },
        Msg::DeleteRequested(feed_id) => {
            if state.mutations.is_deleting(&feed_id) {
                feed_debug!("Delete of {} already in flight", feed_id);
                return (state, Vec::new());
            }
            state.remove_locally(&feed_id);
            let mutation_id = state.mutations.stage(MutationKind::Delete {
                target_id: feed_id.clone(),
            });
            vec![Effect::SubmitDelete {
                mutation_id,
                feed_id,
            }]
        }
        Msg::DeleteCompleted {
            mutation_id,
            result,
        } => {
            let status = match result {
                Ok(()) => MutationStatus::Confirmed,
                Err(_) => MutationStatus::Failed,
            };
            let Some(mutation) = state.mutations.settle(mutation_id, status) else {
                return (state, Vec::new());
            };
            let MutationKind::Delete { target_id } = mutation.kind else {
                let effects = state.flush_deferred_reconcile();
                return (state, effects);
            };
            let mut effects = Vec::new();
            match result {
                Ok(()) => {
                    if state.comment_thread_for(&target_id) {
                        // Comments of a deleted post are gone with it.
                        effects.extend(state.close_comments());
                    }
                    state.push_notice(Notice::PostDeleted { feed_id: target_id });
                }
                Err(error) => {
                    // The removed item is not re-inserted; the forced read restores it.
                    feed_warn!("Delete of {} failed: {}", target_id, error);
                    state.push_notice(Notice::failed(Action::DeletePost, error));
                }
            }
            effects.extend(state.request_reconcile());
            effects
        }
        Msg::ReportRequested { feed_id, reason } => {
            vec![Effect::SubmitReport { feed_id, reason }]
        }
        Msg::ReportCompleted { feed_id, result } => match result {
            Ok(()) => {
                state.push_notice(Notice::Reported { feed_id });
                Vec::new()
            }
            Err(error) => {
                let stale = error.invalidates_view();
                feed_warn!("Report of {} failed: {}", feed_id, error);
                state.push_notice(Notice::failed(Action::ReportPost, error));
                if stale {
                    state.request_reconcile()
                } else {
                    Vec::new()
                }
            }
        },
        Msg::CommentsOpened(feed_id) => state.open_comments(feed_id),
        Msg::CommentsClosed => state.close_comments(),
        Msg::MoreCommentsRequested => state.request_more_comments(),
        Msg::CommentsLoaded { generation, page } => {
            state.apply_comments(generation, page);
            Vec::new()
        }
        Msg::CommentsFailed { generation, error } => {
            if state.settle_comments_fetch(generation) {
                feed_warn!("Comment page fetch {} failed: {}", generation, error);
                state.push_notice(Notice::failed(Action::LoadComments, error));
            }
            Vec::new()
        }
        Msg::CommentSubmitted { feed_id, content } => {
            let content = content.trim();
            if content.is_empty() {
                state.push_notice(Notice::failed(
                    Action::PostComment,
                    FeedError::Validation("a comment needs text".to_string()),
                ));
                Vec::new()
            } else {
                vec![Effect::SubmitComment {
                    feed_id,
                    content: content.to_string(),
                }]
            }
        }
        Msg::CommentCompleted { feed_id, result } => match result {
            Ok(_) => {
                let mut effects = if state.comment_thread_for(&feed_id) {
                    state.reload_comments()
                } else {
                    Vec::new()
                };
                effects.push(Effect::FetchItem {
                    feed_id: feed_id.clone(),
                });
                state.push_notice(Notice::CommentPosted { feed_id });
                effects
            }
            Err(error) => {
                let stale = error.invalidates_view();
                state.push_notice(Notice::failed(Action::PostComment, error));
                if stale {
                    state.request_reconcile()
                } else {
                    Vec::new()
                }
            }
        },
        Msg::CommentDeleteRequested(comment_id) => match state.open_thread().cloned() {
            Some(feed_id) => vec![Effect::SubmitCommentDelete {
                feed_id,
                comment_id,
            }],
            None => {
                state.push_notice(Notice::failed(
                    Action::DeleteComment,
                    FeedError::Validation("open the post's comments first".to_string()),
                ));
                Vec::new()
            }
        },
        Msg::CommentDeleteCompleted {
            feed_id,
            comment_id,
            result,
        } => {
            let refresh = match result {
                Ok(()) => {
                    state.push_notice(Notice::CommentDeleted {
                        feed_id: feed_id.clone(),
                    });
                    true
                }
                Err(error) => {
                    feed_warn!("Delete of comment {} failed: {}", comment_id, error);
                    // Already gone server-side: the thread is stale either way.
                    let stale = error.invalidates_view();
                    state.push_notice(Notice::failed(Action::DeleteComment, error));
                    stale
                }
            };
            if refresh {
                let mut effects = if state.comment_thread_for(&feed_id) {
                    state.reload_comments()
                } else {
                    Vec::new()
                };
                effects.push(Effect::FetchItem { feed_id });
                effects
            } else {
                Vec::new()
            }
        }
        Msg::ItemRefreshed { feed_id, result } => match result {
            Ok(item) => {
                state.replace_item(item);
                Vec::new()
            }
            Err(error) if error.invalidates_view() => {
                feed_info!("Post {} vanished server-side; reconciling", feed_id);
                state.request_reconcile()
            }
            Err(error) => {
                feed_warn!("Refreshing post {} failed: {}", feed_id, error);
                Vec::new()
            }
        },
    };

    (state, effects)
}
