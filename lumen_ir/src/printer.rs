//! Convenience textual dumps.
//!
//! The full IR printer lives with the tooling crates; these entry points
//! render a compact, human-oriented form for debugging and tests. The
//! output is not a stable serialization format.

use std::fmt::{self, Write};

use crate::instrs::InstDetail;
use crate::kind::ValueKind;
use crate::module::Module;
use crate::value::ValueId;

impl Module {
    /// Render every function in the module.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        let p = IrPrinter { m: self };
        for &f in self.functions() {
            let _ = p.print_function(f, &mut out);
        }
        out
    }

    /// Render one function with all of its blocks.
    pub fn dump_function(&self, f: ValueId) -> String {
        let mut out = String::new();
        let _ = IrPrinter { m: self }.print_function(f, &mut out);
        out
    }

    /// Render one block.
    pub fn dump_block(&self, bb: ValueId) -> String {
        let mut out = String::new();
        let _ = IrPrinter { m: self }.print_block(bb, &mut out);
        out
    }
}

struct IrPrinter<'m> {
    m: &'m Module,
}

impl IrPrinter<'_> {
    fn print_function(&self, f: ValueId, out: &mut String) -> fmt::Result {
        write!(out, "function {}(", self.m.internal_name_str(f))?;
        for (i, &p) in self.m.function_params(f).iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            out.push_str(self.m.ctx().ident_str(self.m.param_name(p)));
        }
        out.push_str(")\n");
        for &bb in self.m.function_blocks(f) {
            self.print_block(bb, out)?;
        }
        out.push('\n');
        Ok(())
    }

    fn print_block(&self, bb: ValueId, out: &mut String) -> fmt::Result {
        writeln!(out, "BB#{}:", bb.index())?;
        for &inst in self.m.block_insts(bb) {
            self.print_inst(inst, out)?;
        }
        Ok(())
    }

    fn print_inst(&self, inst: ValueId, out: &mut String) -> fmt::Result {
        write!(out, "  %{} = {}", inst.index(), self.m.inst_name(inst))?;
        match self.m.inst(inst).detail {
            InstDetail::Unary(op) => write!(out, " '{}'", op.op_str())?,
            InstDetail::Binary(op) => write!(out, " '{}'", op.op_str())?,
            InstDetail::None => {}
        }
        for i in 0..self.m.num_operands(inst) {
            out.push_str(if i == 0 { " " } else { ", " });
            self.print_operand(self.m.operand(inst, i), out)?;
        }
        let ty = self.m.value_type(inst);
        if !ty.is_no_type() {
            write!(out, " : {ty}")?;
        }
        out.push('\n');
        Ok(())
    }

    fn print_operand(&self, operand: Option<ValueId>, out: &mut String) -> fmt::Result {
        let Some(v) = operand else {
            return out.write_str("null");
        };
        match self.m.kind(v) {
            ValueKind::LiteralNumber => write!(out, "{}", self.m.literal_number_value(v)),
            ValueKind::LiteralString => {
                write!(out, "\"{}\"", self.m.ctx().ident_str(self.m.literal_string_value(v)))
            }
            ValueKind::LiteralBool => write!(out, "{}", self.m.literal_bool_value(v)),
            // Blocks print by object identity.
            ValueKind::BasicBlock => write!(out, "BB#{}", v.index()),
            ValueKind::Function => write!(out, "%{}()", self.m.internal_name_str(v)),
            ValueKind::GlobalObjectProperty => {
                let name = self.m.global_property_name(v);
                write!(
                    out,
                    "globalObject.{}",
                    self.m.ctx().ident_str(self.m.literal_string_value(name))
                )
            }
            ValueKind::Parameter => {
                write!(out, "%{}", self.m.ctx().ident_str(self.m.param_name(v)))
            }
            ValueKind::Variable => {
                write!(out, "[{}]", self.m.ctx().ident_str(self.m.variable_name(v)))
            }
            ValueKind::VariableScope | ValueKind::ExternalScope => {
                write!(out, "scope({})", self.m.scope_depth(v))
            }
            k if k.is_instruction() => write!(out, "%{}", v.index()),
            _ => unreachable!("Invalid kind"),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::test_util::test_module;
    use crate::*;

    #[test]
    fn test_dump_function_shape() {
        let mut m = test_module();
        let f = m.create_function_named("f");
        let a = m.ctx_mut().get_identifier("a");
        m.create_parameter(f, a);

        let bb = m.create_basic_block(f);
        let x = m.get_literal_number(1.0);
        let y = m.get_literal_number(2.0);
        let add = m.create_binary_operator(BinaryOp::Add, x, y);
        let ret = m.create_return(add);
        m.block_push_back(bb, add);
        m.block_push_back(bb, ret);

        let text = m.dump_function(f);
        assert!(text.starts_with("function f(a)\n"));
        assert!(text.contains(&format!("BB#{}:", bb.index())));
        assert!(text.contains("BinaryOperatorInst '+' 1, 2"));
        assert!(text.contains(&format!("ReturnInst %{}", add.index())));
    }

    #[test]
    fn test_block_prints_as_operand_identity() {
        let mut m = test_module();
        let f = m.create_function_named("f");
        let bb1 = m.create_basic_block(f);
        let bb2 = m.create_basic_block(f);
        let br = m.create_branch(bb2);
        m.block_push_back(bb1, br);

        let text = m.dump_block(bb1);
        assert!(text.contains(&format!("BranchInst BB#{}", bb2.index())));
    }

    #[test]
    fn test_null_operand_renders() {
        let mut m = test_module();
        let f = m.create_function_named("f");
        let bb = m.create_basic_block(f);
        let x = m.get_literal_number(1.0);
        let mov = m.create_mov(x);
        m.block_push_back(bb, mov);
        m.set_operand(mov, None, 0);

        assert!(m.dump_block(bb).contains("MovInst null"));
    }
}
