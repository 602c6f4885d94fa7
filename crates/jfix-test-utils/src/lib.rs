//! Utilities shared by jfix tests.
//!
//! [`Jdk`] declares the slice of the JDK the loop conversion cares about (the collection
//! hierarchy, `Iterator`, `Enumeration`) with the same supertype structure as the real
//! library, so tests can build resolved units without a classpath.

use std::sync::Once;

use jfix_types::{MethodId, TypeId, TypeStore, VarId, VariableKind};

/// Bindings for a minimal JDK.
pub struct Jdk {
    pub types: TypeStore,
    pub object: TypeId,
    pub string: TypeId,
    pub integer: TypeId,
    pub boolean: TypeId,
    pub int: TypeId,
    pub iterable: TypeId,
    pub iterator: TypeId,
    pub list_iterator: TypeId,
    pub enumeration: TypeId,
    pub collection: TypeId,
    pub list: TypeId,
    pub abstract_collection: TypeId,
    pub abstract_list: TypeId,
    pub array_list: TypeId,
    pub vector: TypeId,
    pub iterable_iterator: MethodId,
    pub iterator_has_next: MethodId,
    pub iterator_next: MethodId,
    pub iterator_remove: MethodId,
    pub enumeration_has_more_elements: MethodId,
    pub enumeration_next_element: MethodId,
    pub vector_elements: MethodId,
    pub list_size: MethodId,
}

impl Default for Jdk {
    fn default() -> Self {
        Self::new()
    }
}

impl Jdk {
    pub fn new() -> Self {
        let mut types = TypeStore::new();
        let object = types.object();
        let string = types.declare_class("java.lang.String", &[]);
        let integer = types.declare_class("java.lang.Integer", &[]);
        let boolean = types.primitive("boolean");
        let int = types.primitive("int");

        let iterator = types.declare_interface("java.util.Iterator", &["E"]);
        let list_iterator = types.declare_interface("java.util.ListIterator", &["E"]);
        let e = types.type_parameters(list_iterator)[0];
        let iterator_e = types.parameterize(iterator, &[e]);
        types.add_interface(list_iterator, iterator_e);

        let enumeration = types.declare_interface("java.util.Enumeration", &["E"]);

        let iterable = types.declare_interface("java.lang.Iterable", &["T"]);
        let t = types.type_parameters(iterable)[0];
        let iterator_t = types.parameterize(iterator, &[t]);
        let iterable_iterator = types.add_method(iterable, "iterator", Some(iterator_t));

        let collection = types.declare_interface("java.util.Collection", &["E"]);
        let e = types.type_parameters(collection)[0];
        let iterable_e = types.parameterize(iterable, &[e]);
        types.add_interface(collection, iterable_e);

        let list = types.declare_interface("java.util.List", &["E"]);
        let e = types.type_parameters(list)[0];
        let collection_e = types.parameterize(collection, &[e]);
        types.add_interface(list, collection_e);
        let list_size = types.add_method(list, "size", Some(int));

        let abstract_collection = types.declare_class("java.util.AbstractCollection", &["E"]);
        let e = types.type_parameters(abstract_collection)[0];
        let collection_e = types.parameterize(collection, &[e]);
        types.add_interface(abstract_collection, collection_e);

        let abstract_list = types.declare_class("java.util.AbstractList", &["E"]);
        let e = types.type_parameters(abstract_list)[0];
        let abstract_collection_e = types.parameterize(abstract_collection, &[e]);
        types.set_superclass(abstract_list, abstract_collection_e);
        let list_e = types.parameterize(list, &[e]);
        types.add_interface(abstract_list, list_e);

        let array_list = types.declare_class("java.util.ArrayList", &["E"]);
        let e = types.type_parameters(array_list)[0];
        let abstract_list_e = types.parameterize(abstract_list, &[e]);
        types.set_superclass(array_list, abstract_list_e);
        let list_e = types.parameterize(list, &[e]);
        types.add_interface(array_list, list_e);

        let vector = types.declare_class("java.util.Vector", &["E"]);
        let e = types.type_parameters(vector)[0];
        let abstract_list_e = types.parameterize(abstract_list, &[e]);
        types.set_superclass(vector, abstract_list_e);
        let enumeration_e = types.parameterize(enumeration, &[e]);
        let vector_elements = types.add_method(vector, "elements", Some(enumeration_e));

        let iterator_has_next = types.add_method(iterator, "hasNext", Some(boolean));
        let iterator_next = types.add_method(iterator, "next", None);
        let iterator_remove = types.add_method(iterator, "remove", None);
        let enumeration_has_more_elements =
            types.add_method(enumeration, "hasMoreElements", Some(boolean));
        let enumeration_next_element = types.add_method(enumeration, "nextElement", None);

        Self {
            types,
            object,
            string,
            integer,
            boolean,
            int,
            iterable,
            iterator,
            list_iterator,
            enumeration,
            collection,
            list,
            abstract_collection,
            abstract_list,
            array_list,
            vector,
            iterable_iterator,
            iterator_has_next,
            iterator_next,
            iterator_remove,
            enumeration_has_more_elements,
            enumeration_next_element,
            vector_elements,
            list_size,
        }
    }

    pub fn parameterize(&mut self, generic: TypeId, args: &[TypeId]) -> TypeId {
        self.types.parameterize(generic, args)
    }

    pub fn local(&mut self, name: &str, ty: TypeId) -> VarId {
        self.types.add_variable(name, Some(ty), VariableKind::Local)
    }

    pub fn param(&mut self, name: &str, ty: TypeId) -> VarId {
        self.types.add_variable(name, Some(ty), VariableKind::Parameter)
    }

    pub fn field(&mut self, name: &str, ty: TypeId) -> VarId {
        self.types.add_variable(name, Some(ty), VariableKind::Field)
    }

    /// Declare an application class `qualified_name` with no supertypes beyond `Object`.
    pub fn class(&mut self, qualified_name: &str) -> TypeId {
        self.types.declare_class(qualified_name, &[])
    }

    /// Declare a method on `owner`.
    pub fn method(&mut self, owner: TypeId, name: &str, return_type: Option<TypeId>) -> MethodId {
        self.types.add_method(owner, name, return_type)
    }
}

static TRACING: Once = Once::new();

/// Route `tracing` output through the test harness' captured writer.
pub fn init_test_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
        tracing::debug!(target: "jfix.test", "test tracing initialized");
    });
}
