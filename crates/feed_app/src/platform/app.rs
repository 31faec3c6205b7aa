use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc};
use std::thread;

use anyhow::Context;
use feed_core::{update, Draft, FeedState, Msg, Notice, ReportReason};
use feed_engine::{ApiError, EngineHandle, ImageUpload};
use feed_logging::{feed_info, feed_warn};

use super::commands::{self, Command, HELP};
use super::config::AppConfig;
use super::effects::{AppSink, EffectRunner};
use super::{logging, render};

/// Everything the main loop reacts to, from the engine or the terminal.
pub enum Inbox {
    Core(Msg),
    ImageUploaded {
        file_name: String,
        result: Result<String, ApiError>,
    },
    Command(Command),
    InputError(String),
    InputClosed,
}

pub fn run_app() -> anyhow::Result<()> {
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = AppConfig::load(config_path.as_deref())?;
    logging::initialize(config.log_destination, config.log_level());
    feed_info!(
        "Starting feed client against {} (authenticated: {})",
        config.api_base_url,
        config.session().is_authenticated()
    );

    let (tx, rx) = mpsc::channel::<Inbox>();
    let sink = Arc::new(AppSink::new(tx.clone()));
    let engine = EngineHandle::new(config.api_settings(), config.session(), sink)
        .context("starting the request engine")?;

    spawn_input_reader(tx);
    println!("{HELP}");

    let mut app = App::new(
        FeedState::with_limits(config.page_limit, config.comment_limit),
        EffectRunner::new(engine),
    );
    app.dispatch(Msg::NextPageRequested);

    while let Ok(inbox) = rx.recv() {
        let keep_running = match inbox {
            Inbox::Core(msg) => {
                app.dispatch(msg);
                true
            }
            Inbox::ImageUploaded { file_name, result } => {
                app.image_uploaded(&file_name, result);
                true
            }
            Inbox::Command(command) => app.handle_command(command),
            Inbox::InputError(message) => {
                println!("{message}");
                true
            }
            Inbox::InputClosed => false,
        };
        if !keep_running {
            break;
        }
    }
    feed_info!("Shutting down");
    Ok(())
}

fn spawn_input_reader(tx: mpsc::Sender<Inbox>) {
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let inbox = match commands::parse(&line) {
                Ok(Some(command)) => Inbox::Command(command),
                Ok(None) => continue,
                Err(message) => Inbox::InputError(message),
            };
            if tx.send(inbox).is_err() {
                return;
            }
        }
        let _ = tx.send(Inbox::InputClosed);
    });
}

struct App {
    state: FeedState,
    runner: EffectRunner,
    staged: StagedImages,
}

impl App {
    fn new(state: FeedState, runner: EffectRunner) -> Self {
        Self {
            state,
            runner,
            staged: StagedImages::default(),
        }
    }

    fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        let notices = state.take_notices();
        let was_dirty = state.consume_dirty();
        let view = was_dirty.then(|| state.view());
        self.state = state;

        self.runner.enqueue(effects);
        if let Some(view) = view {
            print!("{}", render::render(&view));
        }
        for notice in &notices {
            self.staged.observe(notice);
            println!("* {}", render::render_notice(notice));
        }
    }

    /// Returns false when the user asked to quit.
    fn handle_command(&mut self, command: Command) -> bool {
        match command {
            Command::More => self.dispatch(Msg::NextPageRequested),
            Command::Refresh => self.dispatch(Msg::RefreshRequested),
            Command::Show => print!("{}", render::render(&self.state.view())),
            Command::Post(text) => {
                let images = self.staged.for_draft();
                self.dispatch(Msg::CreateSubmitted(Draft::new(text, images)));
            }
            Command::Upload { path, crop } => self.upload(&path, crop),
            Command::Delete(feed_id) => self.dispatch(Msg::DeleteRequested(feed_id)),
            Command::Report { id, reason } => self.dispatch(Msg::ReportRequested {
                feed_id: id,
                reason: ReportReason::new(reason.as_deref()),
            }),
            Command::Comments(feed_id) => self.dispatch(Msg::CommentsOpened(feed_id)),
            Command::MoreComments => self.dispatch(Msg::MoreCommentsRequested),
            Command::Comment { id, text } => self.dispatch(Msg::CommentSubmitted {
                feed_id: id,
                content: text,
            }),
            Command::DeleteComment(comment_id) => {
                self.dispatch(Msg::CommentDeleteRequested(comment_id))
            }
            Command::Help => println!("{HELP}"),
            Command::Quit => return false,
        }
        true
    }

    fn upload(&mut self, path: &Path, crop: Option<feed_engine::CropRect>) {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) => {
                println!("* Cannot read {}: {err}", path.display());
                return;
            }
        };
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        feed_info!("Uploading {} ({} bytes)", file_name, bytes.len());
        self.runner.upload(ImageUpload {
            bytes,
            file_name,
            crop,
        });
    }

    fn image_uploaded(&mut self, file_name: &str, result: Result<String, ApiError>) {
        match result {
            Ok(url) => {
                println!("* Staged {file_name} as {url}");
                self.staged.push(url);
            }
            Err(err) => {
                feed_warn!("Upload of {} failed: {}", file_name, err);
                println!("* Upload of {file_name} failed: {err}");
            }
        }
    }
}

/// Uploaded image URLs waiting for a post.
///
/// They survive a rejected or failed create so the user can retry. Only the
/// images handed to the last draft are released once a post is published.
#[derive(Debug, Default)]
struct StagedImages {
    urls: Vec<String>,
    submitted: Vec<String>,
}

impl StagedImages {
    fn push(&mut self, url: String) {
        self.urls.push(url);
    }

    #[cfg(test)]
    fn urls(&self) -> &[String] {
        &self.urls
    }

    fn for_draft(&mut self) -> Vec<String> {
        self.submitted = self.urls.clone();
        self.urls.clone()
    }

    fn observe(&mut self, notice: &Notice) {
        if matches!(notice, Notice::PostPublished) {
            let submitted = std::mem::take(&mut self.submitted);
            self.urls.retain(|url| !submitted.contains(url));
        }
    }
}

#[cfg(test)]
mod tests {
    use feed_core::{Action, FeedError, Notice};

    use super::StagedImages;

    #[test]
    fn staged_images_survive_a_failed_post() {
        let mut staged = StagedImages::default();
        staged.push("https://cdn.example.com/a.png".to_string());
        let draft_images = staged.for_draft();

        staged.observe(&Notice::Failed {
            action: Action::CreatePost,
            error: FeedError::Rejected {
                status: 503,
                message: "unavailable".to_string(),
            },
        });
        assert_eq!(staged.urls(), draft_images.as_slice());

        // An upload finished while the retried post was in flight.
        staged.for_draft();
        staged.push("https://cdn.example.com/b.png".to_string());
        staged.observe(&Notice::PostPublished);
        assert_eq!(
            staged.urls().to_vec(),
            vec!["https://cdn.example.com/b.png".to_string()]
        );
    }
}
