use std::fmt::Write;

use chrono::{DateTime, Utc};
use feed_core::{Action, CommentsView, FeedError, FeedItem, FeedViewModel, Notice};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

pub fn render(view: &FeedViewModel) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{}", status_line(view));
    if view.items.is_empty() && !view.is_loading_first_page {
        let _ = writeln!(out, "  (no posts)");
    }
    for item in &view.items {
        render_item(&mut out, item);
    }
    if view.has_more {
        let _ = writeln!(out, "  ... `more` for the next page");
    }
    if let Some(comments) = &view.comments {
        render_comments(&mut out, comments);
    }
    out
}

fn status_line(view: &FeedViewModel) -> String {
    let total = match view.total {
        Some(total) => format!("{} of {}", view.items.len(), total),
        None => view.items.len().to_string(),
    };
    let mut line = format!("== feed: {total} posts");
    if view.is_loading_first_page {
        line.push_str(" | loading");
    } else if view.is_loading_more {
        line.push_str(" | loading more");
    }
    if view.pending_mutations > 0 {
        let _ = write!(line, " | {} pending", view.pending_mutations);
    }
    line
}

fn render_item(out: &mut String, item: &FeedItem) {
    let _ = writeln!(
        out,
        "[{}] @{} {}",
        item.id,
        item.user.username,
        timestamp(&item.created_at)
    );
    if !item.content.is_empty() {
        for line in item.content.lines() {
            let _ = writeln!(out, "    {line}");
        }
    }
    for image in &item.images {
        let _ = writeln!(out, "    image: {image}");
    }
    let mut counts = format!("    {} comments", item.comment_count);
    if item.reported_by_me {
        counts.push_str(" | reported");
    }
    let _ = writeln!(out, "{counts}");
}

fn render_comments(out: &mut String, view: &CommentsView) {
    let _ = writeln!(out, "-- comments on [{}]", view.feed_id);
    if view.comments.is_empty() && !view.is_loading {
        let _ = writeln!(out, "  (no comments)");
    }
    for comment in &view.comments {
        let _ = writeln!(
            out,
            "  [{}] @{} {}: {}",
            comment.id,
            comment.user.username,
            timestamp(&comment.created_at),
            comment.content
        );
    }
    if view.is_loading {
        let _ = writeln!(out, "  loading...");
    } else if view.has_more {
        let _ = writeln!(out, "  ... `more-comments` for older comments");
    }
}

fn timestamp(at: &DateTime<Utc>) -> String {
    at.format(TIME_FORMAT).to_string()
}

pub fn render_notice(notice: &Notice) -> String {
    match notice {
        Notice::PostPublished => "Post published.".to_string(),
        Notice::PostDeleted { feed_id } => format!("Post {feed_id} deleted."),
        Notice::Reported { feed_id } => format!("Post {feed_id} reported. Thank you."),
        Notice::CommentPosted { feed_id } => format!("Comment added to {feed_id}."),
        Notice::CommentDeleted { feed_id } => format!("Comment removed from {feed_id}."),
        Notice::Failed { action, error } => failure_text(*action, error),
    }
}

fn failure_text(action: Action, error: &FeedError) -> String {
    match (action, error) {
        (Action::ReportPost, FeedError::Conflict(_)) => {
            "You have already reported this post.".to_string()
        }
        (Action::DeleteComment, FeedError::NotFound(_)) => {
            "The comment no longer exists. Reloading the thread.".to_string()
        }
        (_, FeedError::NotPermitted(_)) => "You must be logged in (set FEED_TOKEN).".to_string(),
        (_, FeedError::NotFound(_)) => {
            format!("{} failed: the post no longer exists. Refreshing.", verb(action))
        }
        (_, FeedError::Validation(message)) => format!("{}: {message}", verb(action)),
        (_, error) => format!("{} failed: {error}", verb(action)),
    }
}

fn verb(action: Action) -> &'static str {
    match action {
        Action::LoadFeed => "Loading the feed",
        Action::LoadComments => "Loading comments",
        Action::CreatePost => "Publishing",
        Action::DeletePost => "Deleting",
        Action::ReportPost => "Reporting",
        Action::PostComment => "Commenting",
        Action::DeleteComment => "Deleting the comment",
    }
}
