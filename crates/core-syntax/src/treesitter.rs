//! Tree-sitter backed [`SyntaxParser`].
//!
//! Parsing runs on a dedicated worker thread fed through a bounded channel.
//! A request that does not fit is dropped. The caller sees `false` and the
//! highlight cache retries with a full parse on its next tick. Parsed trees
//! and their sources live behind one mutex; read paths only `try_lock` it
//! and return empty results when the worker holds it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, TryLockError};
use std::thread::JoinHandle;
use std::time::Duration;

use core_text::{Position, TextEdit};
use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use streaming_iterator::StreamingIterator;
use tracing::{debug, error, trace, warn};
use tree_sitter::{InputEdit, Parser, Point, Query, QueryCursor, Tree};

use crate::{HighlightKind, HighlightSpan, Language, NodeRange, SyntaxParser};

/// Pending parse requests the channel holds before dropping.
pub const PARSE_QUEUE_CAP: usize = 4;
const DEFAULT_PARSE_WAIT: Duration = Duration::from_millis(200);

struct ParseRequest {
    path: PathBuf,
    language: Language,
    text: String,
    edit: Option<TextEdit>,
    reply: Sender<bool>,
}

struct DocTree {
    language: Language,
    tree: Tree,
    source: String,
    line_starts: Vec<usize>,
}

impl DocTree {
    fn line(&self, row: usize) -> &str {
        let Some(&start) = self.line_starts.get(row) else {
            return "";
        };
        let end = self
            .line_starts
            .get(row + 1)
            .map_or(self.source.len(), |next| next - 1);
        &self.source[start..end]
    }
}

fn line_starts(source: &str) -> Vec<usize> {
    std::iter::once(0)
        .chain(source.match_indices('\n').map(|(i, _)| i + 1))
        .collect()
}

/// Code-point column of a byte column, snapping back to a char boundary.
fn char_col(line: &str, byte_col: usize) -> usize {
    let mut b = byte_col.min(line.len());
    while b > 0 && !line.is_char_boundary(b) {
        b -= 1;
    }
    line[..b].chars().count()
}

fn byte_col(line: &str, col: usize) -> usize {
    line.char_indices().nth(col).map_or(line.len(), |(i, _)| i)
}

fn ts_language(language: Language) -> tree_sitter::Language {
    match language {
        Language::Rust => tree_sitter_rust::LANGUAGE.into(),
        Language::Go => tree_sitter_go::LANGUAGE.into(),
    }
}

fn highlights_query(language: Language) -> &'static str {
    match language {
        Language::Rust => tree_sitter_rust::HIGHLIGHTS_QUERY,
        Language::Go => tree_sitter_go::HIGHLIGHTS_QUERY,
    }
}

fn compile_queries() -> HashMap<Language, Query> {
    let mut out = HashMap::new();
    for language in [Language::Rust, Language::Go] {
        match Query::new(&ts_language(language), highlights_query(language)) {
            Ok(q) => {
                out.insert(language, q);
            }
            Err(e) => error!(target: "syntax.parse", language = language.name(), error = ?e, "query compile failed"),
        }
    }
    out
}

type Docs = Arc<Mutex<HashMap<PathBuf, DocTree>>>;

pub struct TreeSitterService {
    docs: Docs,
    queries: Arc<HashMap<Language, Query>>,
    tx: Mutex<Option<Sender<ParseRequest>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    parse_wait: Duration,
}

impl Default for TreeSitterService {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeSitterService {
    pub fn new() -> Self {
        Self {
            docs: Arc::new(Mutex::new(HashMap::new())),
            queries: Arc::new(compile_queries()),
            tx: Mutex::new(None),
            worker: Mutex::new(None),
            parse_wait: DEFAULT_PARSE_WAIT,
        }
    }

    /// How long `parse_sync` waits for the worker before giving up.
    pub fn with_parse_wait(mut self, wait: Duration) -> Self {
        self.parse_wait = wait;
        self
    }

    fn try_docs(&self) -> Option<MutexGuard<'_, HashMap<PathBuf, DocTree>>> {
        match self.docs.try_lock() {
            Ok(g) => Some(g),
            Err(TryLockError::WouldBlock) => {
                trace!(target: "syntax.parse", "trees busy");
                None
            }
            Err(TryLockError::Poisoned(p)) => Some(p.into_inner()),
        }
    }
}

fn worker_loop(rx: Receiver<ParseRequest>, docs: Docs) {
    let mut parsers: HashMap<Language, Parser> = HashMap::new();
    for req in rx.iter() {
        let parser = match parsers.entry(req.language) {
            std::collections::hash_map::Entry::Occupied(e) => e.into_mut(),
            std::collections::hash_map::Entry::Vacant(v) => {
                let mut p = Parser::new();
                if let Err(e) = p.set_language(&ts_language(req.language)) {
                    error!(target: "syntax.parse", language = req.language.name(), error = %e, "set_language failed");
                    let _ = req.reply.send(false);
                    continue;
                }
                v.insert(p)
            }
        };
        let ok = parse_one(parser, &docs, &req);
        // The caller may have timed out already.
        let _ = req.reply.send(ok);
    }
    debug!(target: "syntax.parse", "worker exiting");
}

fn parse_one(parser: &mut Parser, docs: &Docs, req: &ParseRequest) -> bool {
    let mut old: Option<Tree> = None;
    if let Some(edit) = &req.edit {
        let guard = docs.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(doc) = guard.get(&req.path)
            && doc.language == req.language
        {
            let mut tree = doc.tree.clone();
            tree.edit(&InputEdit {
                start_byte: edit.start_byte,
                old_end_byte: edit.old_end_byte,
                new_end_byte: edit.new_end_byte,
                start_position: Point::new(edit.start_point.row, edit.start_point.column),
                old_end_position: Point::new(edit.old_end_point.row, edit.old_end_point.column),
                new_end_position: Point::new(edit.new_end_point.row, edit.new_end_point.column),
            });
            old = Some(tree);
        }
    }
    let incremental = old.is_some();
    let tree = match parser.parse(&req.text, old.as_ref()) {
        Some(t) => t,
        None if incremental => {
            warn!(target: "syntax.parse", path = %req.path.display(), "incremental parse failed, retrying full");
            match parser.parse(&req.text, None) {
                Some(t) => t,
                None => return false,
            }
        }
        None => return false,
    };
    trace!(target: "syntax.parse", path = %req.path.display(), incremental, bytes = req.text.len(), "parsed");
    let doc = DocTree {
        language: req.language,
        tree,
        line_starts: line_starts(&req.text),
        source: req.text.clone(),
    };
    docs.lock()
        .unwrap_or_else(|p| p.into_inner())
        .insert(req.path.clone(), doc);
    true
}

impl SyntaxParser for TreeSitterService {
    fn start(&self) {
        let mut tx = self.tx.lock().unwrap_or_else(|p| p.into_inner());
        if tx.is_some() {
            return;
        }
        let (sender, receiver) = bounded(PARSE_QUEUE_CAP);
        let docs = Arc::clone(&self.docs);
        let spawned = std::thread::Builder::new()
            .name("ferrite-parser".into())
            .spawn(move || worker_loop(receiver, docs));
        match spawned {
            Ok(handle) => {
                *tx = Some(sender);
                *self.worker.lock().unwrap_or_else(|p| p.into_inner()) = Some(handle);
                debug!(target: "syntax.parse", "worker started");
            }
            Err(e) => error!(target: "syntax.parse", error = %e, "cannot spawn parser worker"),
        }
    }

    fn stop(&self) {
        // Dropping the sender ends the worker loop.
        self.tx.lock().unwrap_or_else(|p| p.into_inner()).take();
        if let Some(handle) = self.worker.lock().unwrap_or_else(|p| p.into_inner()).take()
            && handle.join().is_err()
        {
            warn!(target: "syntax.parse", "parser worker panicked");
        }
    }

    fn parse_sync(
        &self,
        path: &Path,
        language: Language,
        text: &str,
        edit: Option<&TextEdit>,
    ) -> bool {
        let (reply, answer) = bounded(1);
        let req = ParseRequest {
            path: path.to_path_buf(),
            language,
            text: text.to_string(),
            edit: edit.copied(),
            reply,
        };
        {
            let tx = self.tx.lock().unwrap_or_else(|p| p.into_inner());
            let Some(tx) = tx.as_ref() else {
                return false;
            };
            match tx.try_send(req) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    debug!(target: "syntax.parse", "parse queue full, request dropped");
                    return false;
                }
                Err(TrySendError::Disconnected(_)) => return false,
            }
        }
        answer.recv_timeout(self.parse_wait).unwrap_or(false)
    }

    fn highlights(
        &self,
        path: &Path,
        start: usize,
        end: usize,
    ) -> HashMap<usize, Vec<HighlightSpan>> {
        let mut out: HashMap<usize, Vec<HighlightSpan>> = HashMap::new();
        let Some(docs) = self.try_docs() else {
            return out;
        };
        let Some(doc) = docs.get(path) else {
            return out;
        };
        let Some(query) = self.queries.get(&doc.language) else {
            return out;
        };
        let mut cursor = QueryCursor::new();
        cursor.set_point_range(Point::new(start, 0)..Point::new(end, 0));
        let names = query.capture_names();
        let mut captures = cursor.captures(query, doc.tree.root_node(), doc.source.as_bytes());
        while let Some((m, idx)) = captures.next() {
            let capture = &m.captures[*idx];
            let Some(kind) = HighlightKind::from_capture_name(names[capture.index as usize]) else {
                continue;
            };
            let s = capture.node.start_position();
            let e = capture.node.end_position();
            for row in s.row.max(start)..=e.row.min(end.saturating_sub(1)) {
                let line = doc.line(row);
                let start_col = if row == s.row { char_col(line, s.column) } else { 0 };
                let end_col = if row == e.row {
                    char_col(line, e.column)
                } else {
                    line.chars().count()
                };
                if start_col < end_col {
                    out.entry(row).or_default().push(HighlightSpan {
                        start_col,
                        end_col,
                        kind,
                    });
                }
            }
        }
        for spans in out.values_mut() {
            spans.sort_by_key(|s| (s.start_col, s.end_col));
        }
        out
    }

    fn node_stack_at(&self, path: &Path, pos: Position) -> Vec<NodeRange> {
        let Some(docs) = self.try_docs() else {
            return Vec::new();
        };
        let Some(doc) = docs.get(path) else {
            return Vec::new();
        };
        let point = Point::new(pos.row, byte_col(doc.line(pos.row), pos.col));
        let Some(mut node) = doc.tree.root_node().descendant_for_point_range(point, point) else {
            return Vec::new();
        };
        let to_pos = |p: Point| Position::new(p.row, char_col(doc.line(p.row), p.column));
        let mut stack: Vec<NodeRange> = Vec::new();
        loop {
            let range = NodeRange {
                start: to_pos(node.start_position()),
                end: to_pos(node.end_position()),
            };
            if stack.last() != Some(&range) {
                stack.push(range);
            }
            match node.parent() {
                Some(p) => node = p,
                None => break,
            }
        }
        stack
    }
}

impl Drop for TreeSitterService {
    fn drop(&mut self) {
        self.stop();
    }
}
