use jfix_config::JfixConfig;
use jfix_core::{is_java_identifier, Name};
use jfix_hir::scope::ScopeAnalyzer;
use jfix_hir::{CompilationUnit, LiteralKind, StmtId, UnitBuilder};
use jfix_refactor::{
    classify, convert_loop, suggest_names, Classification, ClassifyOptions, LocalNameSuggester,
    NameSuggestionOracle, NotApplicableReason,
};
use jfix_test_utils::Jdk;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

/// What the unit does with the element field besides the loop's `current = it.next()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExtraUse {
    Nowhere,
    WriteBeforeLoop,
    WriteAfterLoop,
    WriteInOtherMethod,
    FieldInitializer,
    WriteInsideLoopBody,
    WriteInsideNestedLoop,
    ReadAfterLoop,
}

const EXTRA_USES: [ExtraUse; 8] = [
    ExtraUse::Nowhere,
    ExtraUse::WriteBeforeLoop,
    ExtraUse::WriteAfterLoop,
    ExtraUse::WriteInOtherMethod,
    ExtraUse::FieldInitializer,
    ExtraUse::WriteInsideLoopBody,
    ExtraUse::WriteInsideNestedLoop,
    ExtraUse::ReadAfterLoop,
];

/// `class Demo { String current; ... }` with a loop assigning `current = it.next()`.
fn field_element(jdk: &mut Jdk, extra: ExtraUse) -> (CompilationUnit, StmtId) {
    let list_string = jdk.parameterize(jdk.list, &[jdk.string]);
    let iter_string = jdk.parameterize(jdk.iterator, &[jdk.string]);
    let current = jdk.field("current", jdk.string);
    let list = jdk.param("list", list_string);
    let it = jdk.local("it", iter_string);
    let jdk: &Jdk = jdk;

    let mut b = UnitBuilder::new("Demo.java", &jdk.types);
    let field_init = (extra == ExtraUse::FieldInitializer).then(|| b.null());

    let write_current = |b: &mut UnitBuilder<'_>| {
        let lhs = b.name(current);
        let rhs = b.literal(LiteralKind::String, "reset", Some(jdk.string));
        let assign = b.assign(lhs, rhs);
        b.expr_stmt(assign)
    };

    let receiver = b.name(list);
    let iterator_call = b.call(Some(receiver), jdk.iterable_iterator, vec![], Some(iter_string));
    let init = b.var_decl_expr(&[(it, Some(iterator_call))]);
    let it_ref = b.name(it);
    let condition = b.call(Some(it_ref), jdk.iterator_has_next, vec![], None);
    let it_ref = b.name(it);
    let next = b.call(Some(it_ref), jdk.iterator_next, vec![], Some(jdk.string));
    let lhs = b.name(current);
    let assign = b.assign(lhs, next);
    let mut body_statements = vec![b.expr_stmt(assign)];
    match extra {
        ExtraUse::WriteInsideLoopBody => body_statements.push(write_current(&mut b)),
        ExtraUse::WriteInsideNestedLoop => {
            let write = write_current(&mut b);
            let nested_body = b.block(vec![write]);
            body_statements.push(b.for_loop(vec![], None, vec![], nested_body));
        }
        _ => {}
    }
    let body = b.block(body_statements);
    let loop_stmt = b.for_loop(vec![init], Some(condition), vec![], body);

    let mut statements = Vec::new();
    if extra == ExtraUse::WriteBeforeLoop {
        statements.push(write_current(&mut b));
    }
    statements.push(loop_stmt);
    match extra {
        ExtraUse::WriteAfterLoop => statements.push(write_current(&mut b)),
        ExtraUse::ReadAfterLoop => {
            let current_ref = b.name(current);
            let call = b.unresolved_call(None, "use", vec![current_ref]);
            statements.push(b.expr_stmt(call));
        }
        _ => {}
    }
    let method_body = b.block(statements);
    let other_body = if extra == ExtraUse::WriteInOtherMethod {
        let stmt = write_current(&mut b);
        b.block(vec![stmt])
    } else {
        b.block(vec![])
    };

    b.class("Demo", None)
        .field(current, field_init)
        .method("print", &[list], method_body)
        .method("reset", &[], other_body);
    (b.finish(), loop_stmt)
}

#[test]
fn outer_element_is_accepted_only_when_never_written_elsewhere() {
    for extra in EXTRA_USES {
        let mut jdk = Jdk::new();
        let (unit, loop_stmt) = field_element(&mut jdk, extra);
        let classification = classify(&unit, &jdk.types, loop_stmt, ClassifyOptions::default());
        match extra {
            ExtraUse::Nowhere => {
                let result = classification.result().expect("applicable");
                let element = result.element.expect("element");
                assert!(!element.declared_in_loop);
                assert_eq!(element.outer_declaration, None);
                assert_eq!(jdk.types.variable(element.var).name, "current");
            }
            ExtraUse::ReadAfterLoop => assert_eq!(
                classification,
                Classification::NotApplicable(NotApplicableReason::ElementUsedOutsideLoop),
            ),
            _ => assert_eq!(
                classification,
                Classification::NotApplicable(NotApplicableReason::ElementAssignedElsewhere),
                "{extra:?}"
            ),
        }
    }
}

#[test]
fn parameter_element_cannot_be_redeclared_by_the_header() {
    let mut jdk = Jdk::new();
    let list_string = jdk.parameterize(jdk.list, &[jdk.string]);
    let iter_string = jdk.parameterize(jdk.iterator, &[jdk.string]);
    let list = jdk.param("list", list_string);
    let last = jdk.param("last", jdk.string);
    let it = jdk.local("it", iter_string);
    let jdk: &Jdk = &jdk;

    let mut b = UnitBuilder::new("Demo.java", &jdk.types);
    let receiver = b.name(list);
    let iterator_call = b.call(Some(receiver), jdk.iterable_iterator, vec![], Some(iter_string));
    let init = b.var_decl_expr(&[(it, Some(iterator_call))]);
    let it_ref = b.name(it);
    let condition = b.call(Some(it_ref), jdk.iterator_has_next, vec![], None);
    let it_ref = b.name(it);
    let next = b.call(Some(it_ref), jdk.iterator_next, vec![], Some(jdk.string));
    let lhs = b.name(last);
    let assign = b.assign(lhs, next);
    let assign_stmt = b.expr_stmt(assign);
    let body = b.block(vec![assign_stmt]);
    let loop_stmt = b.for_loop(vec![init], Some(condition), vec![], body);
    let method_body = b.block(vec![loop_stmt]);
    b.class("Demo", None).method("print", &[list, last], method_body);
    let unit = b.finish();

    assert_eq!(
        classify(&unit, &jdk.types, loop_stmt, ClassifyOptions::default()),
        Classification::NotApplicable(NotApplicableReason::ElementUsedOutsideLoop)
    );
}

proptest! {
    #[test]
    fn classification_and_conversion_are_deterministic(
        extra in proptest::sample::select(EXTRA_USES.to_vec()),
        strict in any::<bool>(),
    ) {
        let mut jdk = Jdk::new();
        let (unit, loop_stmt) = field_element(&mut jdk, extra);
        let options = ClassifyOptions { strict, ..ClassifyOptions::default() };
        prop_assert_eq!(
            classify(&unit, &jdk.types, loop_stmt, options),
            classify(&unit, &jdk.types, loop_stmt, options)
        );

        let mut config = JfixConfig::default();
        config.convert_loop.strict = strict;
        prop_assert_eq!(
            convert_loop(&unit, &jdk.types, loop_stmt, &config),
            convert_loop(&unit, &jdk.types, loop_stmt, &config)
        );
    }

    #[test]
    fn suggested_names_avoid_exclusions(
        base in "[A-Za-z]{0,12}",
        excluded in proptest::collection::vec("[a-z]{1,6}", 0..6),
    ) {
        let excluded: Vec<Name> = excluded.into_iter().map(Name::from).collect();
        let names = LocalNameSuggester.suggest(&base, 0, &excluded);
        prop_assert!(!names.is_empty());
        for (idx, name) in names.iter().enumerate() {
            prop_assert!(!excluded.contains(name), "{} is excluded", name);
            prop_assert!(is_java_identifier(name), "{} is not an identifier", name);
            prop_assert!(!names[..idx].contains(name), "{} is duplicated", name);
        }
    }
}

struct FixedScopes {
    before: Vec<&'static str>,
    after: Vec<&'static str>,
}

impl ScopeAnalyzer for FixedScopes {
    fn declarations_before(&self, _offset: usize) -> Vec<Name> {
        self.before.iter().copied().map(Name::new).collect()
    }

    fn declarations_after(&self, _offset: usize) -> Vec<Name> {
        self.after.iter().copied().map(Name::new).collect()
    }
}

/// Suggests `base` lower-cased, whether or not it is excluded.
struct CarelessOracle;

impl NameSuggestionOracle for CarelessOracle {
    fn suggest(&self, base: &str, _start_index: usize, _excluded: &[Name]) -> Vec<Name> {
        vec![Name::new(base.to_ascii_lowercase())]
    }
}

#[test]
fn names_visible_around_the_loop_are_excluded() {
    let mut jdk = Jdk::new();
    let (unit, loop_stmt) = field_element(&mut jdk, ExtraUse::Nowhere);
    let mut result = classify(&unit, &jdk.types, loop_stmt, ClassifyOptions::default())
        .result()
        .cloned()
        .expect("applicable");
    let loop_range = unit.stmt(loop_stmt).range();

    // The pre-existing element is forced to the front even though it is visible.
    let scopes = FixedScopes {
        before: vec!["current", "string"],
        after: vec!["string1"],
    };
    let names = suggest_names(
        &jdk.types,
        &result,
        &scopes,
        &LocalNameSuggester,
        loop_range,
        "element",
    );
    assert_eq!(
        names.iter().map(|name| name.as_str()).collect::<Vec<_>>(),
        vec!["current", "string2"]
    );

    result.element = None;
    let names = suggest_names(
        &jdk.types,
        &result,
        &scopes,
        &LocalNameSuggester,
        loop_range,
        "element",
    );
    assert_eq!(names.to_vec(), vec![Name::new("string2")]);

    // Excluded proposals from the oracle are dropped; the default name fills in.
    let names = suggest_names(&jdk.types, &result, &scopes, &CarelessOracle, loop_range, "item");
    assert_eq!(names.to_vec(), vec![Name::new("item")]);
}

#[test]
fn supertype_search_walks_superclasses_and_interfaces() {
    let mut jdk = Jdk::new();
    let array_list_string = jdk.parameterize(jdk.array_list, &[jdk.string]);
    let list_iterator_string = jdk.parameterize(jdk.list_iterator, &[jdk.string]);
    let types = &jdk.types;

    // ArrayList -> AbstractList -> AbstractCollection -> Collection -> Iterable
    let iterable = types
        .super_type(array_list_string, "java.lang.Iterable")
        .expect("ArrayList<String> is Iterable");
    assert_eq!(types.ty(iterable).erasure, Some(jdk.iterable));
    assert_eq!(types.first_type_argument(iterable), Some(jdk.string));

    // Qualified names carry type arguments; the search matches on the raw prefix.
    let iterator = types
        .super_type(list_iterator_string, "java.util.Iterator")
        .expect("ListIterator<String> is an Iterator");
    assert_eq!(types.ty(iterator).qualified_name, "java.util.Iterator<java.lang.String>");

    assert_eq!(types.super_type(jdk.string, "java.lang.Iterable"), None);
    assert_eq!(types.super_type(jdk.int, "java.lang.Object"), None);
}

#[test]
fn list_iterator_over_array_list_is_recognized() {
    let mut jdk = Jdk::new();
    let array_list_string = jdk.parameterize(jdk.array_list, &[jdk.string]);
    let list_iterator_string = jdk.parameterize(jdk.list_iterator, &[jdk.string]);
    let list_iterator = jdk.method(jdk.list, "listIterator", Some(jdk.list_iterator));
    let items = jdk.param("items", array_list_string);
    let it = jdk.local("it", list_iterator_string);
    let s = jdk.local("s", jdk.string);
    let jdk_ref: &Jdk = &jdk;

    let mut b = UnitBuilder::new("Demo.java", &jdk_ref.types);
    let receiver = b.name(items);
    let call = b.call(Some(receiver), list_iterator, vec![], Some(list_iterator_string));
    let init = b.var_decl_expr(&[(it, Some(call))]);
    let it_ref = b.name(it);
    let condition = b.call(Some(it_ref), jdk_ref.iterator_has_next, vec![], None);
    let it_ref = b.name(it);
    let next = b.call(Some(it_ref), jdk_ref.iterator_next, vec![], Some(jdk_ref.string));
    let s_decl = b.local(s, Some(next));
    let body = b.block(vec![s_decl]);
    let loop_stmt = b.for_loop(vec![init], Some(condition), vec![], body);
    let method_body = b.block(vec![loop_stmt]);
    b.class("Demo", None).method("print", &[items], method_body);
    let unit = b.finish();

    let result = classify(&unit, &jdk.types, loop_stmt, ClassifyOptions::default());
    let result = result.result().expect("applicable");
    assert_eq!(result.iterator, it);
    assert_eq!(result.element_type, jdk.string);
    assert_eq!(result.element.map(|element| element.var), Some(s));
}

#[test]
fn iterator_from_a_non_iterable_receiver_is_not_converted() {
    let mut jdk = Jdk::new();
    let iter_string = jdk.parameterize(jdk.iterator, &[jdk.string]);
    let bag = jdk.class("app.Bag");
    let bag_iterator = jdk.method(bag, "iterator", Some(iter_string));
    let items = jdk.param("items", bag);
    let it = jdk.local("it", iter_string);
    let jdk_ref: &Jdk = &jdk;

    let mut b = UnitBuilder::new("Demo.java", &jdk_ref.types);
    let receiver = b.name(items);
    let call = b.call(Some(receiver), bag_iterator, vec![], None);
    let init = b.var_decl_expr(&[(it, Some(call))]);
    let it_ref = b.name(it);
    let condition = b.call(Some(it_ref), jdk_ref.iterator_has_next, vec![], None);
    let body = b.block(vec![]);
    let loop_stmt = b.for_loop(vec![init], Some(condition), vec![], body);
    let method_body = b.block(vec![loop_stmt]);
    b.class("Demo", None).method("print", &[items], method_body);
    let unit = b.finish();

    assert_eq!(
        classify(&unit, &jdk.types, loop_stmt, ClassifyOptions::default()),
        Classification::NotApplicable(NotApplicableReason::NoIterable)
    );
}
