//! High-level intermediate representation (HIR) for one Java compilation unit.
//!
//! Statements and expressions live in arenas and are addressed by [`StmtId`] / [`ExprId`].
//! Nodes carry the bindings the host resolved for them ([`VarId`], [`MethodId`]) and the
//! unit keeps a side table of static expression types. The representation is a closed set
//! of tagged variants; consumers match on it exhaustively and traverse it with
//! [`walk`](crate::walk::walk).

mod builder;
mod hir;
mod printer;
pub mod scope;
pub mod walk;

pub use builder::UnitBuilder;
pub use hir::*;
pub use jfix_types::{MethodId, TypeId, VarId};
pub use printer::print_unit;
