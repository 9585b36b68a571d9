//! Pass 2: cross-file resolution.
//!
//! Runs after every Pass 1 result has been merged and indexed. Each
//! language family has its own resolver that reads the shared [`NodeIndex`]
//! and returns an [`EdgePatch`]; nothing here mutates Pass 1 nodes. Resolver
//! failures are logged and skipped, never fatal: an unresolved target stays
//! a placeholder edge.

pub mod includes;
pub mod python;
pub mod sql;
pub mod typescript;

use crate::graph::{EdgePatch, NodeIndex};
use crate::parser::typescript::TsProject;

/// Run every language resolver over the merged index.
pub fn resolve_all(index: &NodeIndex<'_>, ts_project: &TsProject) -> EdgePatch {
    let mut patch = EdgePatch::default();
    patch.merge(typescript::resolve(index, ts_project));
    patch.merge(includes::resolve(index));
    patch.merge(python::resolve(index));
    patch.merge(sql::resolve(index));
    patch
}
