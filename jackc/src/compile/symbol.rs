use std::{collections::BTreeMap, fmt};

use smol_str::SmolStr;

use crate::vm::Segment;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolEntry {
    /// Declared type, either a primitive keyword or a class name.
    pub ty: SmolStr,
    pub kind: Kind,
    /// Position within the entry's kind, used as the segment offset.
    pub index: u16,
}

/// Storage kind of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Kind {
    /// Class scope, shared by all instances.
    Static,
    /// Class scope, one per instance.
    Field,
    /// Subroutine scope, passed by the caller.
    Argument,
    /// Subroutine scope.
    Local,
}

impl Kind {
    /// Memory segment variables of this kind live in.
    #[rustfmt::skip]
    pub fn segment(&self) -> Segment {
        match self {
            Kind::Static   => Segment::Static,
            Kind::Field    => Segment::This,
            Kind::Argument => Segment::Argument,
            Kind::Local    => Segment::Local,
        }
    }

    #[inline]
    fn is_class_scope(&self) -> bool {
        matches!(self, Kind::Static | Kind::Field)
    }
}

impl fmt::Display for Kind {
    #[rustfmt::skip]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Kind::Static   => write!(f, "static"),
            Kind::Field    => write!(f, "field"),
            Kind::Argument => write!(f, "argument"),
            Kind::Local    => write!(f, "local"),
        }
    }
}

/// Names and counters for one lifetime, class or subroutine.
#[derive(Debug, Default)]
struct Scope {
    symbols: BTreeMap<SmolStr, SymbolEntry>,
    counts: BTreeMap<Kind, u16>,
}

impl Scope {
    fn define(&mut self, name: SmolStr, ty: SmolStr, kind: Kind) -> Option<u16> {
        let count = self.counts.entry(kind).or_insert(0);
        let index = *count;
        *count = count.checked_add(1)?;

        // Redefinition overwrites, the old slot stays allocated.
        self.symbols.insert(name, SymbolEntry { ty, kind, index });
        Some(index)
    }

    fn count(&self, kind: Kind) -> u16 {
        self.counts.get(&kind).copied().unwrap_or(0)
    }
}

/// Two level symbol table.
///
/// Statics and fields live in the class scope for the whole class,
/// arguments and locals in the subroutine scope which is cleared at
/// the start of every subroutine. Lookups try the subroutine scope first,
/// so a local shadows a field of the same name.
#[derive(Debug, Default)]
pub struct SymbolTable {
    class: Scope,
    subroutine: Scope,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget all arguments and locals, and restart their counters.
    pub fn reset_subroutine_scope(&mut self) {
        self.subroutine = Scope::default();
    }

    /// Add a variable to the scope its kind belongs to.
    ///
    /// Returns the index assigned to the new entry, or `None` when
    /// the scope already holds the most variables of that kind a
    /// segment can address.
    pub fn define(&mut self, name: impl Into<SmolStr>, ty: impl Into<SmolStr>, kind: Kind) -> Option<u16> {
        self.scope_mut(kind).define(name.into(), ty.into(), kind)
    }

    #[inline]
    pub fn lookup(&self, name: &str) -> Option<&SymbolEntry> {
        self.subroutine.symbols.get(name).or_else(|| self.class.symbols.get(name))
    }

    #[inline]
    pub fn kind_of(&self, name: &str) -> Option<Kind> {
        self.lookup(name).map(|entry| entry.kind)
    }

    #[inline]
    pub fn type_of(&self, name: &str) -> Option<&str> {
        self.lookup(name).map(|entry| entry.ty.as_str())
    }

    #[inline]
    pub fn index_of(&self, name: &str) -> Option<u16> {
        self.lookup(name).map(|entry| entry.index)
    }

    /// Number of variables of the given kind defined so far.
    pub fn count(&self, kind: Kind) -> u16 {
        self.scope(kind).count(kind)
    }

    fn scope(&self, kind: Kind) -> &Scope {
        if kind.is_class_scope() {
            &self.class
        } else {
            &self.subroutine
        }
    }

    fn scope_mut(&mut self, kind: Kind) -> &mut Scope {
        if kind.is_class_scope() {
            &mut self.class
        } else {
            &mut self.subroutine
        }
    }
}
