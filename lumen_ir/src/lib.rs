//! Typed SSA intermediate representation for the Lumen JavaScript compiler.
//!
//! The IR is a control-flow-graph representation organized into a
//! containment hierarchy (module → function → basic block → instruction)
//! with precise use-def edges maintained bidirectionally between every
//! producer value and every operand slot referencing it.
//!
//! # Core Components
//!
//! - **Arena** (`arena.rs`): typed value storage and id handles
//! - **Kinds** (`kind.rs`): the closed value-kind enumeration and class ranges
//! - **Types** (`types.rs`): the symbolic type lattice
//! - **Context** (`context.rs`): identifier interning and compile options
//! - **Values** (`value.rs`): the value base and the use-def registry
//! - **Instructions** (`instr.rs`, `instrs.rs`): operand vectors and the
//!   per-opcode catalog
//! - **Containers** (`block.rs`, `function.rs`, `module.rs`): insertion-ordered
//!   containment with cascade erase
//! - **Scopes** (`scope.rs`): function and external scopes, variables
//! - **Printer** (`printer.rs`): convenience textual dumps
//!
//! # Design Principles
//!
//! - **Arena identity**: values are addressed by copyable ids; the cyclic
//!   graph needs no reference counting and equality is identity
//! - **Bidirectional use-def edges**: O(1) edge removal via swap-with-last
//!   plus back-edge patching
//! - **Closed world**: kind dispatch is a total match over one enumeration,
//!   checked at build time
//! - **Single-threaded mutation**: every operation completes synchronously
//!   under exclusive ownership of the module

pub mod arena;
pub mod block;
pub mod context;
pub mod function;
pub mod instr;
pub mod instrs;
pub mod kind;
pub mod module;
pub mod printer;
pub mod scope;
pub mod types;
pub mod value;

pub use arena::{Arena, Id};
pub use context::{CompileOptions, Context, Identifier, SegmentRange};
pub use function::DefinitionKind;
pub use instr::SourceRange;
pub use instrs::{BinaryOp, InstDetail, OperandBitSet, SideEffectKind, UnaryOp};
pub use kind::ValueKind;
pub use module::{CjsModule, Module};
pub use types::{type_kind_str, Type, TypeKind, NUM_TYPE_KINDS};
pub use value::{Use, ValueData, ValueId};

#[cfg(test)]
pub(crate) mod test_util {
    use crate::{Context, Module};

    pub fn test_module() -> Module {
        Module::new(Context::new())
    }
}
