//! The host-facing side of an invocation: who called us, what we hand back,
//! and how we ask the user for input.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;
use url::form_urlencoded;

#[derive(Error, Debug)]
pub enum PluginError {
    #[error("missing plugin base URL argument")]
    MissingBaseUrl,
    #[error("missing plugin handle argument")]
    MissingHandle,
    #[error("invalid plugin handle: {0}")]
    InvalidHandle(String),
}

/// Identifies the current invocation. The host passes these on every call.
#[derive(Debug, Clone)]
pub struct PluginContext {
    pub base_url: String,
    pub handle: i32,
    pub query: String,
    pub icons_dir: PathBuf,
}

impl PluginContext {
    /// Parse `<base-url> <handle> [?query]`, without the program name
    pub fn from_args<I>(args: I) -> Result<Self, PluginError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();
        let base_url = args.next().ok_or(PluginError::MissingBaseUrl)?;
        let handle = args.next().ok_or(PluginError::MissingHandle)?;
        let handle = handle
            .parse()
            .map_err(|_| PluginError::InvalidHandle(handle))?;
        let query = args.next().unwrap_or_default();

        Ok(Self {
            base_url,
            handle,
            query: query.trim_start_matches('?').to_string(),
            icons_dir: PathBuf::new(),
        })
    }

    pub fn with_icons_dir(mut self, icons_dir: impl Into<PathBuf>) -> Self {
        self.icons_dir = icons_dir.into();
        self
    }

    /// `plugin://plugin.video.vska/` + `[("mode", "searchtv")]`
    /// -> `plugin://plugin.video.vska/?mode=searchtv`
    pub fn build_url(&self, params: &[(&str, String)]) -> String {
        let query = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())))
            .finish();
        format!("{}?{}", self.base_url, query)
    }

    pub fn icon(&self, name: &str) -> String {
        self.icons_dir.join(name).to_string_lossy().into_owned()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMethod {
    Size,
    LabelIgnoreThe,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Art {
    pub icon: Option<String>,
    pub fanart: Option<String>,
}

/// One selectable entry in a rendered directory
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectoryItem {
    pub label: String,
    pub plot: String,
    pub art: Art,
    pub url: String,
    pub is_folder: bool,
    pub playable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Directory {
    pub category: String,
    pub content: String,
    pub sort: SortMethod,
    pub items: Vec<DirectoryItem>,
}

/// Result of one routed invocation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Outcome {
    Directory(Directory),
    Play { url: String },
    /// Settings changed; the host should reload its current view
    Refresh,
    /// The user dismissed a prompt
    Cancelled,
}

/// Renders outcomes for the host
pub trait Presenter {
    fn present(&mut self, ctx: &PluginContext, outcome: &Outcome) -> io::Result<()>;
}

#[derive(Serialize)]
struct Envelope<'a> {
    handle: i32,
    #[serde(flatten)]
    outcome: &'a Outcome,
}

/// Writes each outcome as a single line of JSON
pub struct JsonPresenter<W: Write> {
    out: W,
}

impl<W: Write> JsonPresenter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Presenter for JsonPresenter<W> {
    fn present(&mut self, ctx: &PluginContext, outcome: &Outcome) -> io::Result<()> {
        let envelope = Envelope {
            handle: ctx.handle,
            outcome,
        };
        serde_json::to_writer(&mut self.out, &envelope)?;
        writeln!(self.out)?;
        self.out.flush()
    }
}

/// Free-text input from the user. `None` means cancelled.
pub trait Prompt {
    fn input(&mut self, heading: &str) -> Option<String>;
}

/// Asks on stderr and reads a line from stdin
pub struct StdinPrompt;

impl Prompt for StdinPrompt {
    fn input(&mut self, heading: &str) -> Option<String> {
        eprint!("{} ", heading);
        let _ = io::stderr().flush();

        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim().to_string()).filter(|l| !l.is_empty()),
        }
    }
}
