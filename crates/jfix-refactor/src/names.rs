//! Name proposals for the enhanced `for` variable.

use indexmap::IndexSet;
use jfix_core::{is_java_keyword, Name, TextRange};
use jfix_hir::scope::ScopeAnalyzer;
use jfix_types::{simple_name, TypeStore};

use crate::classify::ClassificationResult;

/// Host service that proposes local variable names.
pub trait NameSuggestionOracle {
    /// Ordered, non-empty list of names derived from `base` that avoid `excluded`.
    ///
    /// `start_index` is the first numeric suffix to use; `0` means plain names first.
    fn suggest(&self, base: &str, start_index: usize, excluded: &[Name]) -> Vec<Name>;
}

/// Camel-case suffix words of the base (`ArrayList` → `arrayList`, `list`), with numbered
/// variants once every plain candidate is taken.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalNameSuggester;

const FALLBACK_BASE: &str = "element";

impl NameSuggestionOracle for LocalNameSuggester {
    fn suggest(&self, base: &str, start_index: usize, excluded: &[Name]) -> Vec<Name> {
        let words = split_words(base);
        let mut bases: Vec<String> = (0..words.len())
            .map(|start| sanitize(&to_lower_camel(&words[start..])))
            .filter(|candidate| !candidate.is_empty())
            .collect();
        if bases.is_empty() {
            bases.push(FALLBACK_BASE.to_string());
        }
        bases.dedup();

        let is_free = |candidate: &str| !excluded.iter().any(|name| name == candidate);
        let mut out: Vec<Name> = Vec::new();
        for candidate in &bases {
            let candidate = if start_index == 0 {
                candidate.clone()
            } else {
                format!("{candidate}{start_index}")
            };
            if is_free(&candidate) && !out.iter().any(|name| name == candidate.as_str()) {
                out.push(Name::new(candidate));
            }
        }
        if out.is_empty() {
            // The shortest base is the most generic one; number it.
            let base = bases.last().map(String::as_str).unwrap_or(FALLBACK_BASE);
            let mut suffix = start_index.max(1);
            loop {
                let candidate = format!("{base}{suffix}");
                if is_free(&candidate) {
                    out.push(Name::new(candidate));
                    break;
                }
                suffix += 1;
            }
        }
        out
    }
}

fn sanitize(candidate: &str) -> String {
    let mut candidate = if is_java_keyword(candidate) {
        format!("{candidate}_")
    } else {
        candidate.to_string()
    };
    if candidate.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        candidate.insert(0, '_');
    }
    candidate
}

fn to_lower_camel(words: &[String]) -> String {
    let mut out = String::new();
    for (idx, word) in words.iter().enumerate() {
        if idx == 0 {
            out.push_str(&word.to_ascii_lowercase());
        } else {
            out.push_str(&capitalize(word));
        }
    }
    out
}

fn split_words(name: &str) -> Vec<String> {
    let chars: Vec<char> = name.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();
    for (idx, &ch) in chars.iter().enumerate() {
        if ch == '_' || ch == '-' || ch == ' ' || ch == '$' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        if ch.is_ascii_uppercase() && !current.is_empty() {
            // `URLConnection` splits as `URL`, `Connection`.
            let prev_upper = idx > 0 && chars[idx - 1].is_ascii_uppercase();
            let next_lower = chars.get(idx + 1).is_some_and(|c| c.is_ascii_lowercase());
            if !prev_upper || next_lower {
                words.push(std::mem::take(&mut current));
            }
        }
        if ch.is_ascii_alphanumeric() {
            current.push(ch);
        }
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase(),
        None => String::new(),
    }
}

/// Ordered, duplicate-free identifiers proposed for the loop variable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameCandidateList {
    names: IndexSet<Name>,
}

impl NameCandidateList {
    pub fn new(names: impl IntoIterator<Item = Name>) -> Self {
        Self {
            names: names.into_iter().collect(),
        }
    }

    /// Move `name` to the front, inserting it when missing.
    pub fn force_front(&mut self, name: Name) {
        self.names.shift_remove(&name);
        let rest = std::mem::take(&mut self.names);
        self.names.insert(name);
        self.names.extend(rest);
    }

    #[must_use]
    pub fn first(&self) -> Option<&Name> {
        self.names.first()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|candidate| candidate == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Name> {
        self.names.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<Name> {
        self.names.iter().cloned().collect()
    }
}

/// Propose names for the enhanced `for` variable of a classified loop.
///
/// The seed is the simple name of the iterator's first type argument (`Iterator<Item>` →
/// `item`), else `default_name`. Names visible before the loop and names declared after it in
/// the enclosing block are excluded. A pre-existing element variable keeps its name: it is
/// forced to the front even when the exclusion set contains it.
pub fn suggest_names(
    types: &TypeStore,
    classification: &ClassificationResult,
    scopes: &dyn ScopeAnalyzer,
    oracle: &dyn NameSuggestionOracle,
    loop_range: TextRange,
    default_name: &str,
) -> NameCandidateList {
    let iterator_type = types.variable(classification.iterator).ty;
    let seed = iterator_type
        .filter(|ty| types.ty(*ty).is_parameterized())
        .and_then(|ty| types.first_type_argument(ty))
        .map(|arg| simple_name(&types.ty(arg).name).to_string())
        .unwrap_or_else(|| default_name.to_string());

    let mut excluded = scopes.declarations_before(loop_range.start);
    excluded.extend(scopes.declarations_after(loop_range.end));

    let mut names = NameCandidateList::new(
        oracle
            .suggest(&seed, 0, &excluded)
            .into_iter()
            .filter(|name| !excluded.contains(name)),
    );
    if names.is_empty() {
        names = NameCandidateList::new(LocalNameSuggester.suggest(default_name, 0, &excluded));
    }

    if let Some(element) = classification.element {
        names.force_front(types.variable(element.var).name.clone());
    }

    tracing::trace!(
        target: "jfix.refactor",
        seed = %seed,
        excluded = excluded.len(),
        names = ?names.to_vec(),
        "suggested loop variable names"
    );
    names
}
