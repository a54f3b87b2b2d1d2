//! Symbol interning.
//!
//! Every call to [`Ex::symbol`] creates a fresh symbol, even for a name seen
//! before. A [`SymbolTable`] maps names to symbols so that the same name
//! always yields the same handle.

use hashbrown::HashMap;

use crate::handle::Ex;

/// A name-to-symbol interning table.
#[derive(Debug, Default)]
pub struct SymbolTable {
    /// Maps names to their position in `symbols`.
    map: HashMap<String, usize>,
    /// Symbols in creation order.
    symbols: Vec<Ex>,
}

impl SymbolTable {
    /// Creates a new empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table with pre-allocated capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            map: HashMap::with_capacity(capacity),
            symbols: Vec::with_capacity(capacity),
        }
    }

    /// Returns the symbol named `name`, creating a commutative one on first
    /// use.
    pub fn symbol(&mut self, name: &str) -> Ex {
        self.intern(name, Ex::symbol)
    }

    /// Returns the symbol named `name`, creating a noncommutative one on
    /// first use.
    pub fn nc_symbol(&mut self, name: &str) -> Ex {
        self.intern(name, Ex::nc_symbol)
    }

    fn intern(&mut self, name: &str, create: fn(&str) -> Ex) -> Ex {
        if let Some(&index) = self.map.get(name) {
            return self.symbols[index].clone();
        }
        let symbol = create(name);
        self.map.insert(name.to_owned(), self.symbols.len());
        self.symbols.push(symbol.clone());
        symbol
    }

    /// Looks up an existing symbol.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Ex> {
        self.map.get(name).map(|&index| &self.symbols[index])
    }

    /// Returns the number of interned symbols.
    #[must_use]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Returns true if no symbols have been interned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Iterates over the symbols in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Ex> {
        self.symbols.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_table() {
        let mut table = SymbolTable::new();

        let x1 = table.symbol("x");
        let y = table.symbol("y");
        let x2 = table.symbol("x");

        assert!(x1.ptr_eq(&x2));
        assert_ne!(x1, y);
        assert_ne!(x1, Ex::symbol("x"));
        assert_eq!(table.get("y"), Some(&y));
        assert_eq!(table.get("z"), None);
        assert_eq!(table.len(), 2);

        let names: Vec<String> = table.iter().map(ToString::to_string).collect();
        assert_eq!(names, ["x", "y"]);
    }

    #[test]
    fn test_first_use_fixes_commutativity() {
        let mut table = SymbolTable::with_capacity(2);
        let a = table.nc_symbol("A");
        assert!(!a.is_commutative());
        assert!(table.symbol("A").ptr_eq(&a));
        assert!(!table.is_empty());
    }
}
