//! Compilation context: identifier interning and compile options.
//!
//! The context is the IR's conduit to the rest of the compiler. At this
//! layer its contract is small: hash-consed identifier interning and
//! read-only access to compile options. Diagnostics and source management
//! live with the front-end.

use std::sync::Arc;

use rustc_hash::FxHashMap;

/// An interned, hash-consed string handle.
///
/// Two identifiers interned from equal strings within one [`Context`]
/// compare equal; comparison and hashing never touch the string data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Identifier(u32);

impl Identifier {
    /// The null sentinel, never returned by interning.
    pub const INVALID: Identifier = Identifier(u32::MAX);

    /// Check if this identifier was produced by interning.
    #[inline]
    pub const fn is_valid(self) -> bool {
        self.0 != u32::MAX
    }
}

impl Default for Identifier {
    fn default() -> Self {
        Identifier::INVALID
    }
}

/// A contiguous, inclusive range of CommonJS module indices forming one
/// output segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentRange {
    pub first: u32,
    pub last: u32,
}

/// Compile options visible to the IR layer.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompileOptions {
    /// Treat every function as strict-mode code.
    pub strict_mode: bool,
    /// Run the optimizing pipeline over the IR.
    pub optimize: bool,
}

/// Per-compilation services shared by every module.
#[derive(Debug, Default)]
pub struct Context {
    idents: Vec<Arc<str>>,
    ident_table: FxHashMap<Arc<str>, Identifier>,
    options: CompileOptions,
}

impl Context {
    /// Create a context with default options.
    pub fn new() -> Context {
        Context::default()
    }

    /// Create a context with the given options.
    pub fn with_options(options: CompileOptions) -> Context {
        Context {
            options,
            ..Context::default()
        }
    }

    /// Intern a string, returning its stable handle.
    pub fn get_identifier(&mut self, s: &str) -> Identifier {
        if let Some(&id) = self.ident_table.get(s) {
            return id;
        }
        let id = Identifier(self.idents.len() as u32);
        let owned: Arc<str> = Arc::from(s);
        self.idents.push(owned.clone());
        self.ident_table.insert(owned, id);
        id
    }

    /// Resolve an identifier back to its string.
    ///
    /// # Panics
    ///
    /// Panics on an identifier from another context or on
    /// [`Identifier::INVALID`].
    #[inline]
    pub fn ident_str(&self, id: Identifier) -> &str {
        &self.idents[id.0 as usize]
    }

    /// The compile options this context was created with.
    #[inline]
    pub fn options(&self) -> &CompileOptions {
        &self.options
    }
}
