//! Small wrapper over [`string_interner`].
//!
//! Program identifiers (variable names) and type variable names are interned
//! so that environments, schemes and type nodes can carry a [`Symbol`] by
//! value instead of owning strings.

use string_interner::{self, backend, symbol};

/// The initial capacity of a [`StringInterner`].
///
/// Workspaces are small compared to whole programs, so this is well below
/// what a compiler would reserve up front.
const INTERNER_CAPACITY: usize = 128;

#[derive(Debug, Hash, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Symbol(symbol::SymbolU32);

#[derive(Debug)]
pub struct StringInterner(
    string_interner::StringInterner<backend::StringBackend<symbol::SymbolU32>>,
);

impl StringInterner {
    pub fn new() -> Self {
        StringInterner(string_interner::StringInterner::with_capacity(
            INTERNER_CAPACITY,
        ))
    }

    pub fn intern(&mut self, s: &str) -> Symbol {
        let raw_symbol = self.0.get_or_intern(s);
        Symbol(raw_symbol)
    }

    /// Returns the symbol for `s` if it has already been interned.
    pub fn get(&self, s: &str) -> Option<Symbol> {
        self.0.get(s).map(Symbol)
    }

    pub fn resolve(&self, sym: Symbol) -> Option<&str> {
        self.0.resolve(sym.0)
    }

    /// Resolves a symbol that is known to belong to this interner.
    ///
    /// # Panics
    /// Panics if `sym` was produced by a different interner.
    pub fn name(&self, sym: Symbol) -> &str {
        match self.resolve(sym) {
            Some(name) => name,
            None => panic!("symbol {sym:?} does not belong to this interner"),
        }
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}
