//! Hindley-Milner type inference for a block-based editor of a small ML-like
//! language.
//!
//! The core is the [`types`] module: a snapshotting store of type expressions
//! with a transactional unifier, and let-polymorphic [`Scheme`]s. Around it
//! sit the [`binding`] table that links variable blocks to the blocks that
//! declare them, a headless [`block`] model with per-kind typing rules in
//! [`infer`], and the [`workspace`] that keeps everything consistent across
//! edits. The [`import`] and [`codegen`] modules convert between blocks and
//! TypedLang source text.
//!
//! [`Scheme`]: types::Scheme

pub mod binding;
pub mod block;
pub mod codegen;
pub mod config;
pub mod import;
pub mod infer;
pub mod symbol;
pub mod syntax;
pub mod types;
pub mod unique;
pub mod workspace;
