//! Variable declarations, their use-sites, and the table that tracks both.
//!
//! A [`TypedVariableValue`] is a variable declared by a block (the `x` of a
//! `let x = ...`, a lambda parameter, a pattern variable). A
//! [`TypedVariableValueReference`] is a use-site of a variable, owned by a
//! variable block. References start out unresolved and are resolved exactly
//! once; a reference whose declaration goes away is disposed of and replaced
//! by a fresh one rather than being re-pointed.
//!
//! Violating any of these rules is a bug in the caller, so every such case
//! panics.

use std::collections::HashMap;

use crate::{
    symbol::Symbol,
    types::TyId,
    unique::{BlockId, RefId, ValueId},
};

/// A variable declared by a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedVariableValue {
    id: ValueId,
    block: BlockId,
    field_name: Box<str>,
    /// The inputs of `block` in which this variable can be referred to.
    scope_inputs: Box<[Box<str>]>,
    name: Symbol,
    ty: TyId,
    references: Vec<RefId>,
}

impl TypedVariableValue {
    pub fn new(
        block: BlockId,
        ty: TyId,
        field_name: &str,
        scope_inputs: &[&str],
        name: Symbol,
    ) -> Self {
        Self {
            id: ValueId::fresh(),
            block,
            field_name: field_name.into(),
            scope_inputs: scope_inputs.iter().map(|&input| input.into()).collect(),
            name,
            ty,
            references: Vec::new(),
        }
    }

    pub fn id(&self) -> ValueId {
        self.id
    }

    pub fn source_block(&self) -> BlockId {
        self.block
    }

    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    pub fn scope_inputs(&self) -> &[Box<str>] {
        &self.scope_inputs
    }

    /// Returns `true` if this variable is visible inside the input `input` of
    /// its source block.
    pub fn is_visible_in(&self, input: &str) -> bool {
        self.scope_inputs.iter().any(|scope| scope.as_ref() == input)
    }

    pub fn name(&self) -> Symbol {
        self.name
    }

    pub(crate) fn set_name(&mut self, name: Symbol) {
        self.name = name;
    }

    pub fn ty(&self) -> TyId {
        self.ty
    }

    pub fn references(&self) -> &[RefId] {
        &self.references
    }

    /// # Panics
    /// Panics if `reference` is already stored.
    fn store_reference(&mut self, reference: RefId) {
        if self.references.contains(&reference) {
            panic!("{reference:?} is already stored in {:?}", self.id);
        }
        self.references.push(reference);
    }

    /// # Panics
    /// Panics if `reference` is not stored.
    fn remove_reference(&mut self, reference: RefId) {
        match self.references.iter().position(|&r| r == reference) {
            Some(index) => {
                self.references.remove(index);
            }
            None => panic!("{reference:?} is not stored in {:?}", self.id),
        }
    }
}

/// A use-site of a variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedVariableValueReference {
    id: RefId,
    block: BlockId,
    /// The name shown while the reference is unresolved.
    temp_name: Symbol,
    value: Option<ValueId>,
}

impl TypedVariableValueReference {
    pub fn new(block: BlockId, name: Symbol) -> Self {
        Self {
            id: RefId::fresh(),
            block,
            temp_name: name,
            value: None,
        }
    }

    pub fn id(&self) -> RefId {
        self.id
    }

    pub fn block(&self) -> BlockId {
        self.block
    }

    pub fn temp_name(&self) -> Symbol {
        self.temp_name
    }

    pub fn bound_value(&self) -> Option<ValueId> {
        self.value
    }

    pub fn is_resolved(&self) -> bool {
        self.value.is_some()
    }
}

/// The per-workspace registry of declarations and use-sites.
#[derive(Debug, Clone, Default)]
pub struct BindingTable {
    values: HashMap<ValueId, TypedVariableValue>,
    references: HashMap<RefId, TypedVariableValueReference>,
}

impl BindingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// # Panics
    /// Panics if a value with the same id is already present.
    pub fn add_value(&mut self, value: TypedVariableValue) {
        let id = value.id;
        if self.values.insert(id, value).is_some() {
            panic!("{id:?} already exists in the value table");
        }
    }

    /// Removes and returns the value `id`. References bound to it are left
    /// as they are; the caller is responsible for disposing of them.
    ///
    /// # Panics
    /// Panics if no value with this id is present.
    pub fn remove_value(&mut self, id: ValueId) -> TypedVariableValue {
        match self.values.remove(&id) {
            Some(value) => value,
            None => panic!("{id:?} does not exist in the value table"),
        }
    }

    pub fn get_value_by_id(&self, id: ValueId) -> Option<&TypedVariableValue> {
        self.values.get(&id)
    }

    pub(crate) fn get_value_mut(&mut self, id: ValueId) -> Option<&mut TypedVariableValue> {
        self.values.get_mut(&id)
    }

    /// # Panics
    /// Panics if a reference with the same id is already present.
    pub fn add_reference(&mut self, reference: TypedVariableValueReference) {
        let id = reference.id;
        if self.references.insert(id, reference).is_some() {
            panic!("{id:?} already exists in the reference table");
        }
    }

    /// Removes and returns the reference `id`, detaching it from its bound
    /// value if that value still exists.
    ///
    /// # Panics
    /// Panics if no reference with this id is present.
    pub fn remove_reference(&mut self, id: RefId) -> TypedVariableValueReference {
        let Some(reference) = self.references.remove(&id) else {
            panic!("{id:?} does not exist in the reference table");
        };

        if let Some(value) = reference.value.and_then(|v| self.values.get_mut(&v)) {
            value.remove_reference(id);
        }

        reference
    }

    pub fn get_reference_by_id(&self, id: RefId) -> Option<&TypedVariableValueReference> {
        self.references.get(&id)
    }

    /// Resolves the reference `reference` to the value `value`.
    ///
    /// # Panics
    /// Panics if either id is unknown, if the reference is already resolved,
    /// or if the two names differ.
    pub fn set_bound_value(&mut self, reference: RefId, value: ValueId) {
        let Some(target) = self.values.get_mut(&value) else {
            panic!("{value:?} does not exist in the value table");
        };
        let Some(r) = self.references.get_mut(&reference) else {
            panic!("{reference:?} does not exist in the reference table");
        };

        if let Some(bound) = r.value {
            panic!("{reference:?} has already been resolved to {bound:?}");
        }
        if target.name != r.temp_name {
            panic!("{reference:?} and {value:?} have different names");
        }

        tracing::trace!(?reference, ?value, "resolved variable reference");
        r.value = Some(value);
        target.store_reference(reference);
    }

    /// The name a reference is displayed with: the name of its bound value
    /// when resolved, its temporary name otherwise.
    pub fn display_name(&self, reference: RefId) -> Option<Symbol> {
        let r = self.references.get(&reference)?;
        Some(
            r.value
                .and_then(|v| self.values.get(&v))
                .map_or(r.temp_name, |value| value.name),
        )
    }

    pub fn values(&self) -> impl Iterator<Item = &TypedVariableValue> {
        self.values.values()
    }

    pub fn references(&self) -> impl Iterator<Item = &TypedVariableValueReference> {
        self.references.values()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.references.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
        self.references.clear();
    }
}
