use jfix_hir::scope::{ScopeAnalyzer, UnitScopes};
use jfix_hir::walk::{walk, Descend, Node, ParentMap};
use jfix_hir::{CompilationUnit, Expr, LiteralKind, Stmt, StmtId, UnitBuilder};
use jfix_test_utils::Jdk;
use pretty_assertions::assert_eq;

struct Fixture {
    unit: CompilationUnit,
    loop_stmt: StmtId,
}

fn iterator_loop(jdk: &mut Jdk) -> Fixture {
    let list_string = jdk.parameterize(jdk.list, &[jdk.string]);
    let iter_string = jdk.parameterize(jdk.iterator, &[jdk.string]);
    let items = jdk.field("items", list_string);
    let list = jdk.param("list", list_string);
    let count = jdk.local("count", jdk.int);
    let it = jdk.local("it", iter_string);
    let s = jdk.local("s", jdk.string);
    let after = jdk.local("after", jdk.string);

    let mut b = UnitBuilder::new("Demo.java", &jdk.types);
    b.import("java.util.Iterator").import("java.util.List");
    b.class("Demo", None).field(items, None);

    let zero = b.literal(LiteralKind::Int, "0", Some(jdk.int));
    let count_decl = b.local(count, Some(zero));
    let receiver = b.name(list);
    let iterator_call = b.call(Some(receiver), jdk.iterable_iterator, vec![], Some(iter_string));
    let init = b.var_decl_expr(&[(it, Some(iterator_call))]);
    let it_ref = b.name(it);
    let condition = b.call(Some(it_ref), jdk.iterator_has_next, vec![], None);
    let it_ref = b.name(it);
    let next = b.call(Some(it_ref), jdk.iterator_next, vec![], Some(jdk.string));
    let s_decl = b.local(s, Some(next));
    let body = b.block(vec![s_decl]);
    let loop_stmt = b.for_loop(vec![init], Some(condition), vec![], body);
    let null = b.null();
    let after_decl = b.local(after, Some(null));
    let method_body = b.block(vec![count_decl, loop_stmt, after_decl]);
    b.method("run", &[list], method_body);

    Fixture {
        unit: b.finish(),
        loop_stmt,
    }
}

#[test]
fn printer_renders_java_and_assigns_ranges() {
    let mut jdk = Jdk::new();
    let fixture = iterator_loop(&mut jdk);
    let unit = &fixture.unit;

    assert_eq!(
        unit.text,
        r#"import java.util.Iterator;
import java.util.List;

class Demo {
    List<String> items;

    void run(List<String> list) {
        int count = 0;
        for (Iterator<String> it = list.iterator(); it.hasNext();) {
            String s = it.next();
        }
        String after = null;
    }
}
"#
    );

    let loop_range = unit.stmt(fixture.loop_stmt).range();
    assert!(unit.slice(loop_range).starts_with("for (Iterator<String> it"));
    assert!(unit.slice(loop_range).ends_with('}'));
    assert_eq!(unit.slice(unit.imports[1].range), "import java.util.List;");

    let mut calls = Vec::new();
    walk(unit, Node::Stmt(fixture.loop_stmt), &mut |node| {
        if let Node::Expr(id) = node {
            if let Expr::MethodCall { name_range, .. } = unit.expr(id) {
                calls.push(unit.slice(*name_range).to_string());
            }
        }
        Descend::Children
    });
    assert_eq!(calls, vec!["iterator", "hasNext", "next"]);
}

#[test]
fn walk_can_prune_subtrees() {
    let mut jdk = Jdk::new();
    let fixture = iterator_loop(&mut jdk);
    let unit = &fixture.unit;
    let body = unit.types[0].methods[0].body.unwrap();

    let mut visited_calls = 0;
    walk(unit, Node::Stmt(body), &mut |node| match node {
        Node::Stmt(id) if matches!(unit.stmt(id), Stmt::For { .. }) => Descend::Skip,
        Node::Expr(id) => {
            if matches!(unit.expr(id), Expr::MethodCall { .. }) {
                visited_calls += 1;
            }
            Descend::Children
        }
        Node::Stmt(_) => Descend::Children,
    });
    assert_eq!(visited_calls, 0);
}

#[test]
fn parent_map_finds_enclosing_statements() {
    let mut jdk = Jdk::new();
    let fixture = iterator_loop(&mut jdk);
    let unit = &fixture.unit;
    let parents = ParentMap::new(unit);

    let Stmt::For { body, .. } = unit.stmt(fixture.loop_stmt) else {
        panic!("expected a for statement");
    };
    let Stmt::Block { statements, .. } = unit.stmt(*body) else {
        panic!("expected a block body");
    };
    let s_decl = statements[0];
    let Stmt::LocalVar { decl, .. } = unit.stmt(s_decl) else {
        panic!("expected a declaration");
    };
    let next = decl.fragments[0].initializer.unwrap();

    assert_eq!(parents.enclosing_stmt(Node::Expr(next)), Some(s_decl));
    assert_eq!(parents.parent(Node::Stmt(s_decl)), Some(Node::Stmt(*body)));
    assert!(parents.is_within(Node::Expr(next), Node::Stmt(fixture.loop_stmt)));
}

#[test]
fn scopes_report_names_before_and_after_the_loop() {
    let mut jdk = Jdk::new();
    let fixture = iterator_loop(&mut jdk);
    let unit = &fixture.unit;
    let scopes = UnitScopes::new(unit);
    let loop_range = unit.stmt(fixture.loop_stmt).range();

    let before: Vec<String> = scopes
        .declarations_before(loop_range.start)
        .iter()
        .map(|name| name.to_string())
        .collect();
    assert_eq!(before, vec!["items", "list", "count"]);

    let after: Vec<String> = scopes
        .declarations_after(loop_range.end)
        .iter()
        .map(|name| name.to_string())
        .collect();
    assert_eq!(after, vec!["after"]);

    let inside = unit.text.find("String s").unwrap();
    let visible: Vec<String> = scopes
        .declarations_before(inside)
        .iter()
        .map(|name| name.to_string())
        .collect();
    assert_eq!(visible, vec!["items", "list", "count", "it"]);
}
