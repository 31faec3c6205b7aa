use std::path::PathBuf;

use feed_engine::CropRect;

pub const HELP: &str = "\
commands:
  more                       load the next page
  refresh                    reload from the top
  show                       print the current feed
  post <text>                publish a post with any staged images
  upload <path> [x y w h]    upload an image (optionally cropped) and stage it
  delete <id>                delete one of your posts
  report <id> [reason]       report a post
  comments <id>              open the comment thread of a post
  more-comments              load more comments
  comment <id> <text>        add a comment
  delete-comment <id>        delete a comment of the open thread
  help                       show this text
  quit                       exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    More,
    Refresh,
    Show,
    Post(String),
    Upload { path: PathBuf, crop: Option<CropRect> },
    Delete(String),
    Report { id: String, reason: Option<String> },
    Comments(String),
    MoreComments,
    Comment { id: String, text: String },
    DeleteComment(String),
    Help,
    Quit,
}

/// Parses one input line. Blank lines yield `Ok(None)`.
pub fn parse(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let command = match verb {
        "more" | "m" => Command::More,
        "refresh" | "r" => Command::Refresh,
        "show" | "ls" => Command::Show,
        "post" => Command::Post(rest.to_string()),
        "upload" => parse_upload(rest)?,
        "delete" | "rm" => Command::Delete(required_id(verb, rest)?),
        "report" => {
            let (id, reason) = split_id(verb, rest)?;
            Command::Report {
                id,
                reason: (!reason.is_empty()).then(|| reason.to_string()),
            }
        }
        "comments" => Command::Comments(required_id(verb, rest)?),
        "more-comments" | "mc" => Command::MoreComments,
        "comment" => {
            let (id, text) = split_id(verb, rest)?;
            Command::Comment {
                id,
                text: text.to_string(),
            }
        }
        "delete-comment" | "rmc" => Command::DeleteComment(required_id(verb, rest)?),
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(format!("unknown command {other:?}; try `help`")),
    };
    Ok(Some(command))
}

fn required_id(verb: &str, rest: &str) -> Result<String, String> {
    match rest.split_whitespace().next() {
        Some(id) => Ok(id.to_string()),
        None => Err(format!("usage: {verb} <id>")),
    }
}

fn split_id<'a>(verb: &str, rest: &'a str) -> Result<(String, &'a str), String> {
    let id = required_id(verb, rest)?;
    let remainder = rest[id.len()..].trim();
    Ok((id, remainder))
}

fn parse_upload(rest: &str) -> Result<Command, String> {
    let parts: Vec<&str> = rest.split_whitespace().collect();
    let usage = || "usage: upload <path> [x y width height]".to_string();
    match parts.as_slice() {
        [path] => Ok(Command::Upload {
            path: PathBuf::from(path),
            crop: None,
        }),
        [path, x, y, width, height] => {
            let number = |raw: &str| raw.parse::<u32>().map_err(|_| usage());
            let crop = CropRect {
                x: number(*x)?,
                y: number(*y)?,
                width: number(*width)?,
                height: number(*height)?,
            };
            if crop.width == 0 || crop.height == 0 {
                return Err("crop width and height must be positive".to_string());
            }
            Ok(Command::Upload {
                path: PathBuf::from(path),
                crop: Some(crop),
            })
        }
        _ => Err(usage()),
    }
}
