//! Foundation types for keepset.
//!
//! This crate provides the row types shared by every other keepset crate:
//! the objects being pruned, the dependent records they own, and the entries
//! of the retain-set.
//!
//! # Key Types
//!
//! - [`ObjectId`] -- Store-assigned, monotonically increasing object identifier
//! - [`ObjectType`] -- Type discriminator (`post`, `attachment`, `revision`, ...)
//! - [`Object`] -- One row of the object table
//! - [`MetaEntry`], [`Comment`], [`CommentMeta`], [`TermTaxonomy`],
//!   [`TermRelationship`] -- Dependent records owned by an object
//! - [`RetainedEntry`] -- One `(id, type)` pair of the retain-set

pub mod error;
pub mod object;
pub mod records;
pub mod retained;

pub use error::TypeError;
pub use object::{Object, ObjectId, ObjectStatus, ObjectType};
pub use records::{
    Comment, CommentId, CommentMeta, MetaEntry, TermRelationship, TermTaxonomy,
};
pub use retained::RetainedEntry;
