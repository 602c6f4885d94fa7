//! Resolved bindings for Java types, methods and variables.
//!
//! This is the binding half of the AST/binding provider: the HIR refers to bindings by id and
//! [`TypeStore`] answers the questions quick fixes ask about them (qualified names, type
//! arguments, the superclass chain and implemented interfaces).
//!
//! Types are interned. Two parameterizations of the same generic type with the same arguments
//! share a [`TypeId`], so binding identity is plain id equality.

use std::collections::HashMap;
use std::fmt;

use jfix_core::Name;

macro_rules! id_type {
    ($name:ident) => {
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u32);

        impl $name {
            fn from_raw(raw: usize) -> Self {
                $name(u32::try_from(raw).unwrap_or(u32::MAX))
            }

            #[must_use]
            pub fn idx(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

id_type!(TypeId);
id_type!(MethodId);
id_type!(VarId);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Class,
    Interface,
    Array,
    Primitive,
    TypeVariable,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeBinding {
    pub kind: TypeKind,
    /// Fully qualified name including type arguments (`java.util.List<java.lang.String>`).
    pub qualified_name: String,
    /// Simple name including type arguments (`List<String>`).
    pub name: String,
    /// The generic declaration this type parameterizes.
    pub erasure: Option<TypeId>,
    /// Type variables declared by a generic class or interface.
    pub type_parameters: Vec<TypeId>,
    pub type_arguments: Vec<TypeId>,
    pub superclass: Option<TypeId>,
    pub interfaces: Vec<TypeId>,
    pub component: Option<TypeId>,
}

impl TypeBinding {
    fn declared(kind: TypeKind, qualified_name: &str) -> Self {
        Self {
            kind,
            qualified_name: qualified_name.to_string(),
            name: simple_name(qualified_name).to_string(),
            erasure: None,
            type_parameters: Vec::new(),
            type_arguments: Vec::new(),
            superclass: None,
            interfaces: Vec::new(),
            component: None,
        }
    }

    #[must_use]
    pub fn is_parameterized(&self) -> bool {
        !self.type_arguments.is_empty()
    }

    #[must_use]
    pub fn is_array(&self) -> bool {
        self.kind == TypeKind::Array
    }

    #[must_use]
    pub fn is_primitive(&self) -> bool {
        self.kind == TypeKind::Primitive
    }

    #[must_use]
    pub fn is_type_variable(&self) -> bool {
        self.kind == TypeKind::TypeVariable
    }

    /// Qualified name without type arguments (`java.util.List`).
    #[must_use]
    pub fn raw_qualified_name(&self) -> &str {
        match self.qualified_name.find('<') {
            Some(idx) => &self.qualified_name[..idx],
            None => &self.qualified_name,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodBinding {
    pub name: Name,
    pub declaring_type: TypeId,
    pub return_type: Option<TypeId>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VariableKind {
    Local,
    Parameter,
    Field,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VariableBinding {
    pub name: Name,
    pub ty: Option<TypeId>,
    pub kind: VariableKind,
}

/// Arena of resolved bindings for one compilation unit snapshot.
#[derive(Clone, Debug)]
pub struct TypeStore {
    types: Vec<TypeBinding>,
    methods: Vec<MethodBinding>,
    variables: Vec<VariableBinding>,
    parameterized: HashMap<(TypeId, Vec<TypeId>), TypeId>,
    arrays: HashMap<TypeId, TypeId>,
    by_name: HashMap<String, TypeId>,
    object: TypeId,
}

impl Default for TypeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeStore {
    pub const OBJECT: &'static str = "java.lang.Object";

    pub fn new() -> Self {
        let mut store = Self {
            types: Vec::new(),
            methods: Vec::new(),
            variables: Vec::new(),
            parameterized: HashMap::new(),
            arrays: HashMap::new(),
            by_name: HashMap::new(),
            object: TypeId(0),
        };
        store.object = store.alloc(TypeBinding::declared(TypeKind::Class, Self::OBJECT));
        store
    }

    fn alloc(&mut self, binding: TypeBinding) -> TypeId {
        let id = TypeId::from_raw(self.types.len());
        if binding.erasure.is_none()
            && matches!(binding.kind, TypeKind::Class | TypeKind::Interface | TypeKind::Primitive)
        {
            self.by_name.insert(binding.qualified_name.clone(), id);
        }
        self.types.push(binding);
        id
    }

    /// `java.lang.Object`; the default supertype of every class.
    #[must_use]
    pub fn object(&self) -> TypeId {
        self.object
    }

    #[must_use]
    pub fn ty(&self, id: TypeId) -> &TypeBinding {
        &self.types[id.idx()]
    }

    #[must_use]
    pub fn method(&self, id: MethodId) -> &MethodBinding {
        &self.methods[id.idx()]
    }

    #[must_use]
    pub fn variable(&self, id: VarId) -> &VariableBinding {
        &self.variables[id.idx()]
    }

    /// Look up a declared (non-parameterized) class, interface or primitive by qualified name.
    #[must_use]
    pub fn lookup(&self, qualified_name: &str) -> Option<TypeId> {
        self.by_name.get(qualified_name).copied()
    }

    /// Declare a class. Classes other than `java.lang.Object` extend `Object` until
    /// [`TypeStore::set_superclass`] says otherwise.
    pub fn declare_class(&mut self, qualified_name: &str, type_params: &[&str]) -> TypeId {
        if qualified_name == Self::OBJECT {
            return self.object;
        }
        let mut binding = TypeBinding::declared(TypeKind::Class, qualified_name);
        binding.superclass = Some(self.object);
        let id = self.alloc(binding);
        self.declare_type_parameters(id, type_params);
        id
    }

    pub fn declare_interface(&mut self, qualified_name: &str, type_params: &[&str]) -> TypeId {
        let id = self.alloc(TypeBinding::declared(TypeKind::Interface, qualified_name));
        self.declare_type_parameters(id, type_params);
        id
    }

    pub fn primitive(&mut self, name: &str) -> TypeId {
        if let Some(id) = self.lookup(name) {
            return id;
        }
        self.alloc(TypeBinding::declared(TypeKind::Primitive, name))
    }

    fn declare_type_parameters(&mut self, owner: TypeId, names: &[&str]) {
        let params: Vec<TypeId> = names
            .iter()
            .map(|name| {
                let mut binding = TypeBinding::declared(TypeKind::TypeVariable, name);
                binding.superclass = Some(self.object);
                self.alloc(binding)
            })
            .collect();
        self.types[owner.idx()].type_parameters = params;
    }

    #[must_use]
    pub fn type_parameters(&self, ty: TypeId) -> &[TypeId] {
        &self.ty(ty).type_parameters
    }

    /// Declare the superclass of a generic declaration or plain class.
    ///
    /// Supertypes must be declared before the type is parameterized: parameterizations copy
    /// (and substitute) the supertypes known at creation time.
    pub fn set_superclass(&mut self, ty: TypeId, superclass: TypeId) {
        self.types[ty.idx()].superclass = Some(superclass);
    }

    pub fn add_interface(&mut self, ty: TypeId, interface: TypeId) {
        self.types[ty.idx()].interfaces.push(interface);
    }

    /// Intern the parameterization `generic<args...>`.
    pub fn parameterize(&mut self, generic: TypeId, args: &[TypeId]) -> TypeId {
        let generic = self.ty(generic).erasure.unwrap_or(generic);
        if args.is_empty() {
            return generic;
        }
        let key = (generic, args.to_vec());
        if let Some(id) = self.parameterized.get(&key) {
            return *id;
        }

        let decl = self.ty(generic).clone();
        let qualified_args: Vec<&str> = args
            .iter()
            .map(|arg| self.ty(*arg).qualified_name.as_str())
            .collect();
        let simple_args: Vec<&str> = args.iter().map(|arg| self.ty(*arg).name.as_str()).collect();
        let binding = TypeBinding {
            kind: decl.kind,
            qualified_name: format!("{}<{}>", decl.qualified_name, qualified_args.join(",")),
            name: format!("{}<{}>", decl.name, simple_args.join(",")),
            erasure: Some(generic),
            type_parameters: Vec::new(),
            type_arguments: args.to_vec(),
            superclass: None,
            interfaces: Vec::new(),
            component: None,
        };
        let id = self.alloc(binding);
        // Register before substituting supertypes so self-referential bounds terminate.
        self.parameterized.insert(key, id);

        let substitution: Vec<(TypeId, TypeId)> = decl
            .type_parameters
            .iter()
            .copied()
            .zip(args.iter().copied())
            .collect();
        let superclass = decl.superclass.map(|ty| self.substitute(ty, &substitution));
        let interfaces: Vec<TypeId> = decl
            .interfaces
            .iter()
            .map(|ty| self.substitute(*ty, &substitution))
            .collect();
        let binding = &mut self.types[id.idx()];
        binding.superclass = superclass;
        binding.interfaces = interfaces;
        id
    }

    fn substitute(&mut self, ty: TypeId, substitution: &[(TypeId, TypeId)]) -> TypeId {
        if let Some((_, arg)) = substitution.iter().find(|(param, _)| *param == ty) {
            return *arg;
        }
        let binding = self.ty(ty);
        match (binding.erasure, binding.is_parameterized()) {
            (Some(generic), true) => {
                let args: Vec<TypeId> = binding.type_arguments.clone();
                let args: Vec<TypeId> = args
                    .into_iter()
                    .map(|arg| self.substitute(arg, substitution))
                    .collect();
                self.parameterize(generic, &args)
            }
            _ => ty,
        }
    }

    pub fn array_of(&mut self, component: TypeId) -> TypeId {
        if let Some(id) = self.arrays.get(&component) {
            return *id;
        }
        let elem = self.ty(component);
        let binding = TypeBinding {
            kind: TypeKind::Array,
            qualified_name: format!("{}[]", elem.qualified_name),
            name: format!("{}[]", elem.name),
            erasure: None,
            type_parameters: Vec::new(),
            type_arguments: Vec::new(),
            superclass: Some(self.object),
            interfaces: Vec::new(),
            component: Some(component),
        };
        let id = self.alloc(binding);
        self.arrays.insert(component, id);
        id
    }

    pub fn add_method(
        &mut self,
        declaring_type: TypeId,
        name: &str,
        return_type: Option<TypeId>,
    ) -> MethodId {
        let id = MethodId::from_raw(self.methods.len());
        self.methods.push(MethodBinding {
            name: Name::new(name),
            declaring_type,
            return_type,
        });
        id
    }

    pub fn add_variable(&mut self, name: &str, ty: Option<TypeId>, kind: VariableKind) -> VarId {
        let id = VarId::from_raw(self.variables.len());
        self.variables.push(VariableBinding {
            name: Name::new(name),
            ty,
            kind,
        });
        id
    }

    /// Returns the supertype of `ty` whose qualified name starts with `name`.
    ///
    /// The type itself matches first (this also covers parameterizations of the sought raw
    /// type), then the full superclass chain, then every implemented interface, recursively.
    /// Arrays and primitives never match.
    #[must_use]
    pub fn super_type(&self, ty: TypeId, name: &str) -> Option<TypeId> {
        let binding = self.ty(ty);
        if binding.is_array() || binding.is_primitive() {
            return None;
        }
        if binding.qualified_name.starts_with(name) {
            return Some(ty);
        }
        if let Some(superclass) = binding.superclass {
            if let Some(found) = self.super_type(superclass, name) {
                return Some(found);
            }
        }
        binding
            .interfaces
            .iter()
            .find_map(|interface| self.super_type(*interface, name))
    }

    /// First type argument of a parameterized type.
    #[must_use]
    pub fn first_type_argument(&self, ty: TypeId) -> Option<TypeId> {
        self.ty(ty).type_arguments.first().copied()
    }

    /// Simple names a source reference to `ty` mentions (`Map<String, Item>` mentions `Map`,
    /// `String` and `Item`). Type variables and primitives are not importable and are skipped.
    #[must_use]
    pub fn referenced_types(&self, ty: TypeId) -> Vec<TypeId> {
        let mut out = Vec::new();
        self.collect_referenced_types(ty, &mut out);
        out
    }

    fn collect_referenced_types(&self, ty: TypeId, out: &mut Vec<TypeId>) {
        let binding = self.ty(ty);
        match binding.kind {
            TypeKind::Primitive | TypeKind::TypeVariable => {}
            TypeKind::Array => {
                if let Some(component) = binding.component {
                    self.collect_referenced_types(component, out);
                }
            }
            TypeKind::Class | TypeKind::Interface => {
                let raw = binding.erasure.unwrap_or(ty);
                if !out.contains(&raw) {
                    out.push(raw);
                }
                for arg in &binding.type_arguments {
                    self.collect_referenced_types(*arg, out);
                }
            }
        }
    }
}

/// Last segment of a dotted name, ignoring type arguments.
#[must_use]
pub fn simple_name(qualified_name: &str) -> &str {
    let raw = match qualified_name.find('<') {
        Some(idx) => &qualified_name[..idx],
        None => qualified_name,
    };
    raw.rsplit('.').next().unwrap_or(raw)
}

/// Package part of a dotted type name (`java.util` for `java.util.List`).
#[must_use]
pub fn package_name(qualified_name: &str) -> Option<&str> {
    let raw = match qualified_name.find('<') {
        Some(idx) => &qualified_name[..idx],
        None => qualified_name,
    };
    raw.rfind('.').map(|idx| &raw[..idx])
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn names_split_on_dots_and_type_arguments() {
        assert_eq!(simple_name("java.util.List<java.lang.String>"), "List");
        assert_eq!(package_name("java.util.List<java.lang.String>"), Some("java.util"));
        assert_eq!(package_name("Item"), None);
    }

    #[test]
    fn parameterizations_are_interned() {
        let mut types = TypeStore::new();
        let string = types.declare_class("java.lang.String", &[]);
        let iterator = types.declare_interface("java.util.Iterator", &["E"]);

        let a = types.parameterize(iterator, &[string]);
        let b = types.parameterize(iterator, &[string]);
        assert_eq!(a, b);
        assert_eq!(types.ty(a).qualified_name, "java.util.Iterator<java.lang.String>");
        assert_eq!(types.ty(a).name, "Iterator<String>");
        assert_eq!(types.ty(a).raw_qualified_name(), "java.util.Iterator");
    }

    #[test]
    fn supertypes_are_substituted_on_parameterization() {
        let mut types = TypeStore::new();
        let string = types.declare_class("java.lang.String", &[]);
        let iterable = types.declare_interface("java.lang.Iterable", &["T"]);
        let collection = types.declare_interface("java.util.Collection", &["E"]);
        let e = types.type_parameters(collection)[0];
        let iterable_e = types.parameterize(iterable, &[e]);
        types.add_interface(collection, iterable_e);

        let strings = types.parameterize(collection, &[string]);
        let found = types.super_type(strings, "java.lang.Iterable").unwrap();
        assert_eq!(types.ty(found).name, "Iterable<String>");
        assert_eq!(types.first_type_argument(found), Some(string));
    }

    #[test]
    fn arrays_and_primitives_have_no_supertypes() {
        let mut types = TypeStore::new();
        let int = types.primitive("int");
        let ints = types.array_of(int);
        assert_eq!(types.super_type(int, "int"), None);
        assert_eq!(types.super_type(ints, TypeStore::OBJECT), None);
        assert_eq!(types.ty(ints).name, "int[]");
    }
}
