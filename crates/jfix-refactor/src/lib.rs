//! "Convert to enhanced for loop" quick fix.
//!
//! The fix runs as a pipeline:
//! - [`classify`] decides whether a counted `for` loop is driven by an `Iterator` or
//!   `Enumeration` over an `Iterable` and records what the loop reads;
//! - [`suggest_names`] proposes a name for the new loop variable;
//! - [`plan`] describes the rewrite, and a [`TreeRewriter`] turns it into text edits.
//!
//! [`convert_loop`] wires the three together with the in-repo services. Applying the
//! result goes through a [`ValidationStateChange`], which becomes invalid once the
//! workspace changes underneath it.

mod change;
mod classify;
mod imports;
mod materialize;
mod names;
mod plan;

pub use change::{
    AbortOnError, Change, ChangeError, ChangeExceptionHandler, DeltaFlags, DeltaKind, Documents,
    ElementDelta, ExceptionDecision, JavaElementKind, ListenerId, RefactoringStatus, ResourceDelta,
    ResourceKind, Severity, StatusEntry, TextFileChange, ValidationStateChange,
    ValidationStateListener,
};
pub use classify::{
    classify, counted_loops, Classification, ClassificationResult, ClassifyOptions,
    ElementBinding, IterableBinding, NotApplicableReason, Occurrence,
};
pub use imports::{ImportChanges, ImportCleanup, ImportRemover};
pub use materialize::{LinkedRanges, RewriteError, SourceChange, TextRewriter, TreeRewriter};
pub use names::{suggest_names, LocalNameSuggester, NameCandidateList, NameSuggestionOracle};
pub use plan::{
    plan, EnhancedForHeader, LinkedPosition, LinkedPositionGroup, RewriteOp, RewritePlan,
    Transplant,
};

use jfix_config::JfixConfig;
use jfix_core::is_java_identifier;
use jfix_hir::scope::{ScopeAnalyzer, UnitScopes};
use jfix_hir::{CompilationUnit, StmtId};
use jfix_types::TypeStore;
use thiserror::Error;

/// Label shown for the quick fix and used as the change name.
pub const CONVERT_LOOP_LABEL: &str = "Convert to enhanced for loop";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FixError {
    #[error("`{name}` is not a valid Java identifier")]
    InvalidElementName { name: String },
    #[error(transparent)]
    Rewrite(#[from] RewriteError),
    #[error(transparent)]
    Change(#[from] ChangeError),
}

/// A ready-to-apply conversion of one loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopFixProposal {
    pub classification: ClassificationResult,
    pub names: NameCandidateList,
    pub plan: RewritePlan,
    pub change: SourceChange,
}

impl LoopFixProposal {
    pub fn label(&self) -> &'static str {
        CONVERT_LOOP_LABEL
    }

    /// Wrap the edits in a change that can be performed and undone.
    pub fn into_change(self) -> ValidationStateChange {
        let text = TextFileChange::from_source_change(CONVERT_LOOP_LABEL, &self.change);
        ValidationStateChange::with_children(CONVERT_LOOP_LABEL, vec![Box::new(text)])
    }
}

/// Host services the pipeline calls out to.
pub struct FixServices<'a> {
    pub scopes: &'a dyn ScopeAnalyzer,
    pub oracle: &'a dyn NameSuggestionOracle,
    pub rewriter: &'a mut dyn TreeRewriter,
}

/// Run the quick fix on `loop_stmt` with the in-repo scope analysis, name suggester and text
/// rewriter. `Ok(None)` means the fix does not apply.
pub fn convert_loop(
    unit: &CompilationUnit,
    types: &TypeStore,
    loop_stmt: StmtId,
    config: &JfixConfig,
) -> Result<Option<LoopFixProposal>, FixError> {
    let scopes = UnitScopes::new(unit);
    let mut rewriter = TextRewriter;
    let mut services = FixServices {
        scopes: &scopes,
        oracle: &LocalNameSuggester,
        rewriter: &mut rewriter,
    };
    convert_loop_with(unit, types, loop_stmt, config, &mut services)
}

pub fn convert_loop_with(
    unit: &CompilationUnit,
    types: &TypeStore,
    loop_stmt: StmtId,
    config: &JfixConfig,
    services: &mut FixServices<'_>,
) -> Result<Option<LoopFixProposal>, FixError> {
    let default_name = config.convert_loop.default_element_name.as_str();
    if !is_java_identifier(default_name) {
        return Err(FixError::InvalidElementName {
            name: default_name.to_string(),
        });
    }

    let options = ClassifyOptions::from_config(config);
    let classification = match classify(unit, types, loop_stmt, options) {
        Classification::Applicable(result) => result,
        Classification::NotApplicable(reason) => {
            tracing::debug!(
                target: "jfix.refactor",
                file = %unit.file.as_str(),
                ?loop_stmt,
                ?reason,
                "loop conversion not offered"
            );
            return Ok(None);
        }
    };

    let loop_range = unit.stmt(loop_stmt).range();
    let names = suggest_names(
        types,
        &classification,
        services.scopes,
        services.oracle,
        loop_range,
        default_name,
    );
    let plan = plan(unit, types, &classification, &names);
    let change = services.rewriter.apply(unit, &plan)?;

    tracing::info!(
        target: "jfix.refactor",
        file = %unit.file.as_str(),
        name = %names.first().map(|name| name.as_str()).unwrap_or_default(),
        edits = change.edits.len(),
        "offering enhanced for conversion"
    );

    Ok(Some(LoopFixProposal {
        classification,
        names,
        plan,
        change,
    }))
}
