//! Applicable changes, undo, and invalidation when the workspace changes underneath them.

use std::collections::BTreeMap;
use std::fmt;

use jfix_core::{apply_text_edits, EditError, FileId, TextEdit, TextRange};
use thiserror::Error;

use crate::materialize::SourceChange;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Ok,
    Info,
    Warning,
    Error,
    Fatal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    pub severity: Severity,
    pub message: String,
}

/// Outcome of checking whether a change may still be performed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefactoringStatus {
    entries: Vec<StatusEntry>,
}

impl RefactoringStatus {
    pub fn fatal(message: impl Into<String>) -> Self {
        let mut status = Self::default();
        status.add(Severity::Fatal, message);
        status
    }

    pub fn add(&mut self, severity: Severity, message: impl Into<String>) {
        self.entries.push(StatusEntry {
            severity,
            message: message.into(),
        });
    }

    pub fn entries(&self) -> &[StatusEntry] {
        &self.entries
    }

    #[must_use]
    pub fn severity(&self) -> Severity {
        self.entries
            .iter()
            .map(|entry| entry.severity)
            .max()
            .unwrap_or(Severity::Ok)
    }

    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.severity() == Severity::Ok
    }

    #[must_use]
    pub fn has_fatal_error(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

/// In-memory file contents that changes are performed against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Documents {
    texts: BTreeMap<FileId, String>,
}

impl Documents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, file: FileId, text: impl Into<String>) {
        self.texts.insert(file, text.into());
    }

    pub fn get(&self, file: &FileId) -> Option<&str> {
        self.texts.get(file).map(String::as_str)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChangeError {
    #[error("unknown file `{0}`")]
    UnknownFile(String),
    #[error("change `{name}` is no longer valid: {message}")]
    Invalid { name: String, message: String },
    #[error(transparent)]
    Edit(#[from] EditError),
}

/// A unit of work that can be applied to [`Documents`] and usually undone.
pub trait Change: fmt::Debug {
    fn name(&self) -> &str;

    fn is_undoable(&self) -> bool {
        true
    }

    /// Apply the change. Returns the undo change when the change is undoable.
    fn perform(&mut self, documents: &mut Documents) -> Result<Option<Box<dyn Change>>, ChangeError>;
}

/// Text edits against one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextFileChange {
    name: String,
    file: FileId,
    edits: Vec<TextEdit>,
}

impl TextFileChange {
    pub fn new(name: impl Into<String>, file: FileId, edits: Vec<TextEdit>) -> Self {
        Self {
            name: name.into(),
            file,
            edits,
        }
    }

    pub fn from_source_change(name: impl Into<String>, change: &SourceChange) -> Self {
        Self::new(name, change.file.clone(), change.edits.clone())
    }

    pub fn file(&self) -> &FileId {
        &self.file
    }

    pub fn edits(&self) -> &[TextEdit] {
        &self.edits
    }
}

impl Change for TextFileChange {
    fn name(&self) -> &str {
        &self.name
    }

    fn perform(&mut self, documents: &mut Documents) -> Result<Option<Box<dyn Change>>, ChangeError> {
        let text = documents
            .texts
            .get_mut(&self.file)
            .ok_or_else(|| ChangeError::UnknownFile(self.file.as_str().to_string()))?;
        let mut edits = self.edits.clone();
        jfix_core::normalize_text_edits(text, &mut edits)?;
        let updated = apply_text_edits(text, &edits)?;

        // Each inverse edit covers the inserted text, shifted by the edits before it.
        let mut delta: isize = 0;
        let mut inverse = Vec::with_capacity(edits.len());
        for edit in &edits {
            let start = edit.range.start.saturating_add_signed(delta);
            inverse.push(TextEdit::new(
                TextRange::new(start, start + edit.replacement.len()),
                &text[edit.range.start..edit.range.end],
            ));
            delta += edit.replacement.len() as isize - edit.range.len() as isize;
        }

        tracing::debug!(
            target: "jfix.change",
            file = %self.file.as_str(),
            edits = edits.len(),
            "performed text file change"
        );
        *text = updated;
        Ok(Some(Box::new(TextFileChange::new(
            self.name.clone(),
            self.file.clone(),
            inverse,
        ))))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JavaElementKind {
    JavaModel,
    JavaProject,
    PackageFragmentRoot,
    PackageFragment,
    CompilationUnit { is_working_copy: bool },
    ClassFile,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaKind {
    Added,
    Removed,
    Changed,
}

/// Bit set describing what changed in a delta.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeltaFlags(u32);

impl DeltaFlags {
    pub const NONE: DeltaFlags = DeltaFlags(0);
    pub const CHILDREN: DeltaFlags = DeltaFlags(1);
    pub const CONTENT: DeltaFlags = DeltaFlags(1 << 1);
    pub const PRIMARY_WORKING_COPY: DeltaFlags = DeltaFlags(1 << 2);

    #[must_use]
    pub fn contains(self, other: DeltaFlags) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }
}

impl std::ops::BitOr for DeltaFlags {
    type Output = DeltaFlags;

    fn bitor(self, rhs: DeltaFlags) -> DeltaFlags {
        DeltaFlags(self.0 | rhs.0)
    }
}

/// Change to the Java model, as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementDelta {
    pub element: JavaElementKind,
    pub kind: DeltaKind,
    pub flags: DeltaFlags,
    pub children: Vec<ElementDelta>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Root,
    Project,
    Folder,
    File,
}

/// Change to the file system resources, as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDelta {
    pub path: String,
    pub resource: ResourceKind,
    pub kind: DeltaKind,
    pub flags: DeltaFlags,
    /// Whether the resource still exists after the change.
    pub exists: bool,
    pub children: Vec<ResourceDelta>,
}

/// Notified when a [`ValidationStateChange`] may have become invalid.
pub trait ValidationStateListener {
    fn state_changed(&mut self, change_name: &str, status: &RefactoringStatus);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExceptionDecision {
    Abort,
    Continue,
}

/// Decides what happens when a child change fails.
pub trait ChangeExceptionHandler {
    fn handle(&mut self, change: &dyn Change, error: &ChangeError) -> ExceptionDecision;
}

/// Aborts on the first failure.
#[derive(Debug, Clone, Copy, Default)]
pub struct AbortOnError;

impl ChangeExceptionHandler for AbortOnError {
    fn handle(&mut self, _change: &dyn Change, _error: &ChangeError) -> ExceptionDecision {
        ExceptionDecision::Abort
    }
}

/// Composite change that stays valid only while the workspace is not modified by anyone else.
pub struct ValidationStateChange {
    name: String,
    children: Vec<Box<dyn Change>>,
    listeners: Vec<(ListenerId, Box<dyn ValidationStateListener>)>,
    next_listener: u64,
    in_change_count: usize,
    status: RefactoringStatus,
}

impl fmt::Debug for ValidationStateChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationStateChange")
            .field("name", &self.name)
            .field("children", &self.children)
            .field("listeners", &self.listeners.len())
            .field("in_change_count", &self.in_change_count)
            .field("status", &self.status)
            .finish()
    }
}

impl ValidationStateChange {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
            listeners: Vec::new(),
            next_listener: 0,
            in_change_count: 0,
            status: RefactoringStatus::default(),
        }
    }

    pub fn with_children(name: impl Into<String>, children: Vec<Box<dyn Change>>) -> Self {
        let mut change = Self::new(name);
        change.children = children;
        change
    }

    pub fn add(&mut self, child: Box<dyn Change>) {
        self.children.push(child);
    }

    pub fn children(&self) -> &[Box<dyn Change>] {
        &self.children
    }

    pub fn is_valid(&self) -> &RefactoringStatus {
        &self.status
    }

    pub fn add_listener(&mut self, listener: Box<dyn ValidationStateListener>) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, listener));
        id
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener, _)| *listener != id);
        self.listeners.len() != before
    }

    /// Deltas are only observed while someone listens.
    #[must_use]
    pub fn is_observing(&self) -> bool {
        !self.listeners.is_empty()
    }

    pub fn element_changed(&mut self, delta: &ElementDelta) {
        if !self.is_observing() {
            return;
        }
        if !Self::process_element_delta(delta) {
            self.workspace_changed();
        }
    }

    pub fn resource_changed(&mut self, delta: &ResourceDelta) {
        if !self.is_observing() {
            return;
        }
        if Self::touches_java_source(delta) {
            self.workspace_changed();
        }
    }

    /// Returns `false` when the delta invalidates the change.
    fn process_element_delta(delta: &ElementDelta) -> bool {
        match delta.element {
            JavaElementKind::JavaModel
            | JavaElementKind::JavaProject
            | JavaElementKind::PackageFragmentRoot
            | JavaElementKind::PackageFragment => {
                if delta.kind != DeltaKind::Changed || delta.flags != DeltaFlags::CHILDREN {
                    return false;
                }
                delta.children.iter().all(Self::process_element_delta)
            }
            JavaElementKind::CompilationUnit { is_working_copy } => {
                delta.flags.contains(DeltaFlags::PRIMARY_WORKING_COPY) || is_working_copy
            }
            JavaElementKind::ClassFile => true,
            JavaElementKind::Other => false,
        }
    }

    fn touches_java_source(delta: &ResourceDelta) -> bool {
        let saved = delta.resource == ResourceKind::File
            && delta.kind == DeltaKind::Changed
            && delta.flags.contains(DeltaFlags::CONTENT)
            && delta.exists
            && delta
                .path
                .rsplit_once('.')
                .is_some_and(|(_, ext)| ext == "java");
        saved || delta.children.iter().any(Self::touches_java_source)
    }

    fn workspace_changed(&mut self) {
        self.status = RefactoringStatus::fatal("Workspace has changed");
        tracing::debug!(
            target: "jfix.change",
            change = %self.name,
            in_change = self.in_change_count,
            "workspace changed"
        );
        if self.in_change_count > 0 {
            return;
        }
        self.fire_state_changed();
    }

    fn fire_state_changed(&mut self) {
        for (_, listener) in &mut self.listeners {
            listener.state_changed(&self.name, &self.status);
        }
    }

    pub fn about_to_perform(&mut self) {
        self.in_change_count += 1;
    }

    pub fn change_performed(&mut self, undoable: bool, failed: bool) {
        self.in_change_count = self.in_change_count.saturating_sub(1);
        if !undoable || failed {
            self.fire_state_changed();
        } else {
            self.status = RefactoringStatus::default();
        }
    }

    /// Perform all children in order. A failing child is reported to `handler`; on
    /// [`ExceptionDecision::Abort`] the error is returned and later children are skipped.
    ///
    /// The returned undo runs the children's undos in reverse order.
    pub fn perform_with(
        &mut self,
        documents: &mut Documents,
        handler: &mut dyn ChangeExceptionHandler,
    ) -> Result<ValidationStateChange, ChangeError> {
        if self.status.has_fatal_error() {
            let message = self
                .status
                .entries()
                .last()
                .map(|entry| entry.message.clone())
                .unwrap_or_default();
            return Err(ChangeError::Invalid {
                name: self.name.clone(),
                message,
            });
        }

        let mut undos = Vec::new();
        let mut children = std::mem::take(&mut self.children);
        let mut outcome = Ok(());
        for child in &mut children {
            self.about_to_perform();
            let result = child.perform(documents);
            self.change_performed(child.is_undoable(), result.is_err());
            match result {
                Ok(Some(undo)) => undos.push(undo),
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(
                        target: "jfix.change",
                        change = %child.name(),
                        error = %err,
                        "child change failed"
                    );
                    if handler.handle(child.as_ref(), &err) == ExceptionDecision::Abort {
                        outcome = Err(err);
                        break;
                    }
                }
            }
        }
        self.children = children;
        outcome?;

        undos.reverse();
        Ok(ValidationStateChange::with_children(self.name.clone(), undos))
    }
}

impl Change for ValidationStateChange {
    fn name(&self) -> &str {
        &self.name
    }

    fn perform(&mut self, documents: &mut Documents) -> Result<Option<Box<dyn Change>>, ChangeError> {
        let undo = self.perform_with(documents, &mut AbortOnError)?;
        Ok(Some(Box::new(undo)))
    }
}
