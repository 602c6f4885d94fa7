use std::cell::RefCell;
use std::rc::Rc;

use jfix_config::JfixConfig;
use jfix_core::{FileId, TextEdit, TextRange};
use jfix_hir::UnitBuilder;
use jfix_refactor::{
    convert_loop, AbortOnError, Change, ChangeError, ChangeExceptionHandler, DeltaFlags,
    DeltaKind, Documents, ElementDelta, ExceptionDecision, JavaElementKind, RefactoringStatus,
    ResourceDelta, ResourceKind, TextFileChange, ValidationStateChange, ValidationStateListener,
};
use jfix_test_utils::Jdk;
use pretty_assertions::assert_eq;

#[derive(Clone, Default)]
struct Recorder {
    events: Rc<RefCell<Vec<(String, bool)>>>,
}

impl ValidationStateListener for Recorder {
    fn state_changed(&mut self, change_name: &str, status: &RefactoringStatus) {
        self.events
            .borrow_mut()
            .push((change_name.to_string(), status.has_fatal_error()));
    }
}

impl Recorder {
    fn count(&self) -> usize {
        self.events.borrow().len()
    }
}

fn saved_java_file() -> ResourceDelta {
    ResourceDelta {
        path: "src/Demo.java".to_string(),
        resource: ResourceKind::File,
        kind: DeltaKind::Changed,
        flags: DeltaFlags::CONTENT,
        exists: true,
        children: Vec::new(),
    }
}

fn edited_source_unit() -> ElementDelta {
    ElementDelta {
        element: JavaElementKind::CompilationUnit {
            is_working_copy: false,
        },
        kind: DeltaKind::Changed,
        flags: DeltaFlags::CONTENT,
        children: Vec::new(),
    }
}

fn replace(file: &FileId, range: TextRange, text: &str) -> Box<dyn Change> {
    Box::new(TextFileChange::new(
        "replace",
        file.clone(),
        vec![TextEdit::new(range, text)],
    ))
}

#[test]
fn loop_proposal_applies_and_undoes() {
    let mut jdk = Jdk::new();
    let list_string = jdk.parameterize(jdk.list, &[jdk.string]);
    let iter_string = jdk.parameterize(jdk.iterator, &[jdk.string]);
    let list = jdk.param("list", list_string);
    let it = jdk.local("it", iter_string);
    let item = jdk.local("item", jdk.string);
    let jdk_ref: &Jdk = &jdk;

    let mut b = UnitBuilder::new("src/Demo.java", &jdk_ref.types);
    b.package("app").import("java.util.Iterator").import("java.util.List");
    let receiver = b.name(list);
    let call = b.call(Some(receiver), jdk_ref.iterable_iterator, vec![], Some(iter_string));
    let init = b.var_decl_expr(&[(it, Some(call))]);
    let it_ref = b.name(it);
    let condition = b.call(Some(it_ref), jdk_ref.iterator_has_next, vec![], None);
    let it_ref = b.name(it);
    let next = b.call(Some(it_ref), jdk_ref.iterator_next, vec![], Some(jdk_ref.string));
    let decl = b.local(item, Some(next));
    let body = b.block(vec![decl]);
    let loop_stmt = b.for_loop(vec![init], Some(condition), vec![], body);
    let method_body = b.block(vec![loop_stmt]);
    b.class("Demo", None).method("print", &[list], method_body);
    let unit = b.finish();

    let proposal = convert_loop(&unit, &jdk.types, loop_stmt, &JfixConfig::default())
        .expect("conversion succeeds")
        .expect("conversion is offered");
    assert_eq!(proposal.label(), "Convert to enhanced for loop");

    let mut documents = Documents::new();
    documents.insert(unit.file.clone(), unit.text.clone());
    let mut change = proposal.into_change();
    assert!(change.is_valid().is_ok());

    let mut undo = change
        .perform_with(&mut documents, &mut AbortOnError)
        .expect("change performs");
    assert_eq!(
        documents.get(&unit.file),
        Some(
            r#"package app;

import java.util.List;

class Demo {
    void print(List<String> list) {
        for (String item : list) {
        }
    }
}
"#
        )
    );
    assert_eq!(undo.children().len(), 1);

    undo.perform(&mut documents).expect("undo performs");
    assert_eq!(documents.get(&unit.file), Some(unit.text.as_str()));
}

#[test]
fn deltas_are_ignored_without_listeners() {
    let mut change = ValidationStateChange::new("rename");
    assert!(!change.is_observing());
    change.element_changed(&edited_source_unit());
    change.resource_changed(&saved_java_file());
    assert!(change.is_valid().is_ok());
}

#[test]
fn workspace_changes_invalidate_and_notify() {
    let recorder = Recorder::default();
    let mut change = ValidationStateChange::new("rename");
    let id = change.add_listener(Box::new(recorder.clone()));

    change.element_changed(&ElementDelta {
        element: JavaElementKind::CompilationUnit {
            is_working_copy: true,
        },
        kind: DeltaKind::Changed,
        flags: DeltaFlags::CONTENT,
        children: Vec::new(),
    });
    assert!(change.is_valid().is_ok());
    assert_eq!(recorder.count(), 0);

    change.resource_changed(&saved_java_file());
    assert!(change.is_valid().has_fatal_error());
    assert_eq!(
        change.is_valid().entries()[0].message,
        "Workspace has changed"
    );
    assert_eq!(
        recorder.events.borrow().as_slice(),
        &[("rename".to_string(), true)]
    );

    let mut documents = Documents::new();
    assert_eq!(
        change.perform_with(&mut documents, &mut AbortOnError).err(),
        Some(ChangeError::Invalid {
            name: "rename".to_string(),
            message: "Workspace has changed".to_string(),
        })
    );

    assert!(change.remove_listener(id));
    assert!(!change.remove_listener(id));
    assert!(!change.is_observing());
}

#[test]
fn notifications_wait_until_the_change_is_performed() {
    let recorder = Recorder::default();
    let mut change = ValidationStateChange::new("rename");
    change.add_listener(Box::new(recorder.clone()));

    change.about_to_perform();
    change.element_changed(&edited_source_unit());
    assert!(change.is_valid().has_fatal_error());
    assert_eq!(recorder.count(), 0);

    change.change_performed(true, false);
    assert!(change.is_valid().is_ok());
    assert_eq!(recorder.count(), 0);

    change.about_to_perform();
    change.change_performed(false, false);
    assert_eq!(recorder.count(), 1);
}

struct Collecting {
    errors: Vec<ChangeError>,
}

impl ChangeExceptionHandler for Collecting {
    fn handle(&mut self, _change: &dyn Change, error: &ChangeError) -> ExceptionDecision {
        self.errors.push(error.clone());
        ExceptionDecision::Continue
    }
}

#[test]
fn exception_handler_decides_whether_to_continue() {
    let known = FileId::new("A.java");
    let missing = FileId::new("Missing.java");

    let mut documents = Documents::new();
    documents.insert(known.clone(), "class A {}");
    let mut change = ValidationStateChange::with_children(
        "batch",
        vec![
            replace(&missing, TextRange::new(0, 0), "x"),
            replace(&known, TextRange::new(6, 7), "B"),
        ],
    );
    let recorder = Recorder::default();
    change.add_listener(Box::new(recorder.clone()));

    assert_eq!(
        change.perform_with(&mut documents, &mut AbortOnError).err(),
        Some(ChangeError::UnknownFile("Missing.java".to_string()))
    );
    assert_eq!(documents.get(&known), Some("class A {}"));
    assert_eq!(recorder.count(), 1);

    let mut handler = Collecting { errors: Vec::new() };
    let undo = change
        .perform_with(&mut documents, &mut handler)
        .expect("failures are skipped");
    assert_eq!(documents.get(&known), Some("class B {}"));
    assert_eq!(handler.errors.len(), 1);
    assert_eq!(undo.children().len(), 1);
    assert_eq!(change.children().len(), 2);
}

#[test]
fn undo_runs_children_in_reverse_order() {
    let file = FileId::new("A.java");
    let mut documents = Documents::new();
    documents.insert(file.clone(), "abc");
    let mut change = ValidationStateChange::with_children(
        "two steps",
        vec![
            replace(&file, TextRange::new(0, 1), "xy"),
            replace(&file, TextRange::new(0, 2), "z"),
        ],
    );

    let mut undo = change
        .perform_with(&mut documents, &mut AbortOnError)
        .expect("change performs");
    assert_eq!(documents.get(&file), Some("zbc"));

    undo.perform(&mut documents).expect("undo performs");
    assert_eq!(documents.get(&file), Some("abc"));
}
