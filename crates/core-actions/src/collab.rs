//! External collaborators: version control, system clipboard, formatter and
//! language server. The process-backed implementations shell out; every
//! failure becomes a [`CollabError`] whose `Display` is the status text.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;

use core_syntax::{Language, NoopParser, SyntaxParser};
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum CollabError {
    #[error("clipboard unavailable (using internal)")]
    ClipboardUnavailable,
    #[error("not a git repository")]
    NotARepository,
    #[error("git failed: {0}")]
    Git(String),
    #[error("format failed: {0}")]
    Formatter(String),
    #[error("{0}")]
    Io(#[from] io::Error),
}

pub trait Vcs: Send + Sync {
    fn current_branch(&self, path: &Path) -> Result<String, CollabError>;
    /// All local branches and the checked-out one.
    fn list_branches(&self, path: &Path) -> Result<(Vec<String>, Option<String>), CollabError>;
    fn checkout(&self, path: &Path, branch: &str) -> Result<(), CollabError>;
}

pub trait Clipboard: Send + Sync {
    fn copy(&self, text: &str) -> Result<(), CollabError>;
    fn paste(&self) -> Result<String, CollabError>;
}

pub trait Formatter: Send + Sync {
    fn format(&self, language: Option<Language>, text: &str) -> Result<String, CollabError>;
}

/// Language server session. The editor only announces opened documents.
pub trait LanguageClient: Send + Sync {
    fn open_file(&self, path: &Path, content: &str);
    fn start(&self) {}
    fn stop(&self) {}
}

/// Everything the dispatcher references but does not own.
#[derive(Clone)]
pub struct Collaborators {
    pub parser: Arc<dyn SyntaxParser>,
    pub vcs: Arc<dyn Vcs>,
    pub clipboard: Arc<dyn Clipboard>,
    pub formatter: Arc<dyn Formatter>,
    pub lsp: Arc<dyn LanguageClient>,
}

impl Collaborators {
    /// Process-backed collaborators around the given parser.
    pub fn system(parser: Arc<dyn SyntaxParser>) -> Self {
        Self {
            parser,
            vcs: Arc::new(GitCli),
            clipboard: Arc::new(SystemClipboard),
            formatter: Arc::new(Gofmt),
            lsp: Arc::new(NullLanguageClient),
        }
    }

    /// Collaborators that do nothing and touch no processes.
    pub fn inert() -> Self {
        Self {
            parser: Arc::new(NoopParser),
            vcs: Arc::new(NoVcs),
            clipboard: Arc::new(NoClipboard),
            formatter: Arc::new(NoFormatter),
            lsp: Arc::new(NullLanguageClient),
        }
    }
}

fn run(
    program: &str,
    args: &[&str],
    dir: Option<&Path>,
    input: Option<&str>,
) -> io::Result<std::process::Output> {
    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(if input.is_some() { Stdio::piped() } else { Stdio::null() })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(dir) = dir {
        cmd.current_dir(dir);
    }
    let mut child = cmd.spawn()?;
    if let (Some(text), Some(mut stdin)) = (input, child.stdin.take()) {
        stdin.write_all(text.as_bytes())?;
    }
    child.wait_with_output()
}

/// Directory git commands run in: the document's parent, or the cwd.
fn repo_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

pub struct GitCli;

impl GitCli {
    fn git(&self, path: &Path, args: &[&str]) -> Result<String, CollabError> {
        let out = run("git", args, Some(&repo_dir(path)), None)?;
        if out.status.success() {
            return Ok(String::from_utf8_lossy(&out.stdout).into_owned());
        }
        let stderr = String::from_utf8_lossy(&out.stderr);
        debug!(target: "collab.git", ?args, stderr = %stderr.trim(), "git failed");
        if stderr.contains("not a git repository") {
            Err(CollabError::NotARepository)
        } else {
            Err(CollabError::Git(stderr.trim().to_string()))
        }
    }
}

impl Vcs for GitCli {
    fn current_branch(&self, path: &Path) -> Result<String, CollabError> {
        Ok(self
            .git(path, &["rev-parse", "--abbrev-ref", "HEAD"])?
            .trim()
            .to_string())
    }

    fn list_branches(&self, path: &Path) -> Result<(Vec<String>, Option<String>), CollabError> {
        let out = self.git(path, &["branch", "--format=%(HEAD) %(refname:short)"])?;
        let mut branches = Vec::new();
        let mut current = None;
        for line in out.lines() {
            let (head, name) = line.split_at(line.len().min(2));
            let name = name.trim().to_string();
            if name.is_empty() {
                continue;
            }
            if head.starts_with('*') {
                current = Some(name.clone());
            }
            branches.push(name);
        }
        Ok((branches, current))
    }

    fn checkout(&self, path: &Path, branch: &str) -> Result<(), CollabError> {
        self.git(path, &["checkout", branch]).map(|_| ())
    }
}

pub struct NoVcs;

impl Vcs for NoVcs {
    fn current_branch(&self, _: &Path) -> Result<String, CollabError> {
        Err(CollabError::NotARepository)
    }

    fn list_branches(&self, _: &Path) -> Result<(Vec<String>, Option<String>), CollabError> {
        Err(CollabError::NotARepository)
    }

    fn checkout(&self, _: &Path, _: &str) -> Result<(), CollabError> {
        Err(CollabError::NotARepository)
    }
}

/// `pbcopy` / `pbpaste`.
pub struct SystemClipboard;

impl Clipboard for SystemClipboard {
    fn copy(&self, text: &str) -> Result<(), CollabError> {
        match run("pbcopy", &[], None, Some(text)) {
            Ok(out) if out.status.success() => Ok(()),
            Ok(_) => Err(CollabError::ClipboardUnavailable),
            Err(e) => {
                warn!(target: "collab.clipboard", error = %e, "pbcopy unavailable");
                Err(CollabError::ClipboardUnavailable)
            }
        }
    }

    fn paste(&self) -> Result<String, CollabError> {
        match run("pbpaste", &[], None, None) {
            Ok(out) if out.status.success() => {
                Ok(String::from_utf8_lossy(&out.stdout).into_owned())
            }
            Ok(_) => Err(CollabError::ClipboardUnavailable),
            Err(e) => {
                warn!(target: "collab.clipboard", error = %e, "pbpaste unavailable");
                Err(CollabError::ClipboardUnavailable)
            }
        }
    }
}

pub struct NoClipboard;

impl Clipboard for NoClipboard {
    fn copy(&self, _: &str) -> Result<(), CollabError> {
        Err(CollabError::ClipboardUnavailable)
    }

    fn paste(&self) -> Result<String, CollabError> {
        Err(CollabError::ClipboardUnavailable)
    }
}

/// `gofmt` over stdin. Only Go documents have a formatter.
pub struct Gofmt;

impl Formatter for Gofmt {
    fn format(&self, language: Option<Language>, text: &str) -> Result<String, CollabError> {
        if language != Some(Language::Go) {
            return Err(CollabError::Formatter(format!(
                "no formatter for {}",
                language.map_or("this file", Language::name)
            )));
        }
        let out = run("gofmt", &[], None, Some(text))?;
        if out.status.success() {
            Ok(String::from_utf8_lossy(&out.stdout).into_owned())
        } else {
            let stderr = String::from_utf8_lossy(&out.stderr);
            Err(CollabError::Formatter(
                stderr.lines().next().unwrap_or("gofmt error").to_string(),
            ))
        }
    }
}

pub struct NoFormatter;

impl Formatter for NoFormatter {
    fn format(&self, _: Option<Language>, _: &str) -> Result<String, CollabError> {
        Err(CollabError::Formatter("no formatter configured".to_string()))
    }
}

pub struct NullLanguageClient;

impl LanguageClient for NullLanguageClient {
    fn open_file(&self, path: &Path, content: &str) {
        debug!(target: "collab.lsp", path = %path.display(), bytes = content.len(), "open_file (no server)");
    }
}
