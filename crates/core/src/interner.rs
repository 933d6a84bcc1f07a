//! The string-intern table shared by the compiler and the VM.
//!
//! The compiler interns identifier and string-literal lexemes while it
//! emits bytecode; the VM interns the runtime result of `+` on two strings.
//! Both go through this one table so that two strings with identical bytes
//! are always the same allocation, making `==` on strings pointer equality.

use std::rc::Rc;

use crate::object::{fnv1a_hash, ObjString};
use crate::table::Table;

#[derive(Default)]
pub struct Interner {
    strings: Table<()>,
}

impl Interner {
    pub fn new() -> Self {
        Interner {
            strings: Table::new(),
        }
    }

    /// Intern `s`, returning the existing allocation on a hit.
    pub fn intern(&mut self, s: &str) -> Rc<ObjString> {
        let hash = fnv1a_hash(s.as_bytes());
        if let Some(existing) = self.strings.find_key(s, hash) {
            return existing;
        }
        let obj = Rc::new(ObjString::new(s));
        self.strings.set(Rc::clone(&obj), ());
        obj
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_bytes_intern_to_the_same_allocation() {
        let mut interner = Interner::new();
        let a = interner.intern("hello");
        let b = interner.intern("hello");
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(interner.len(), 1);
    }

    #[test]
    fn distinct_bytes_intern_separately() {
        let mut interner = Interner::new();
        let a = interner.intern("hello");
        let b = interner.intern("world");
        assert!(!Rc::ptr_eq(&a, &b));
        assert_eq!(interner.len(), 2);
    }
}
