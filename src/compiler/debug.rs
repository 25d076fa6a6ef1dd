//! Debug utilities for minifn compilation
//!
//! Tools for inspecting and checking IR.

use super::ir::{IrFunction, IrInstruction, IrModule, IrReg, Linkage};
use crate::error::{Error, Result};
use std::collections::HashSet;
use std::fmt;

impl fmt::Display for IrReg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

impl fmt::Display for Linkage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Linkage::External => write!(f, "external"),
        }
    }
}

impl fmt::Display for IrInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_ir_instr(self))
    }
}

impl fmt::Display for IrFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<String> = (0..self.params.len())
            .map(|i| format!("i64 %{}", i))
            .collect();
        write!(
            f,
            "define {} i64 @{}({}) {{",
            self.linkage,
            self.name,
            params.join(", ")
        )?;
        if !self.params.is_empty() {
            write!(f, " ; {}", self.params.join(", "))?;
        }
        writeln!(f)?;
        for block in &self.blocks {
            writeln!(f, "{}:", block.label)?;
            for instr in &block.instructions {
                writeln!(f, "  {}", instr)?;
            }
        }
        write!(f, "}}")
    }
}

impl fmt::Display for IrModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "; module {}", self.name)?;
        for function in &self.functions {
            write!(f, "\n\n{}", function)?;
        }
        writeln!(f)
    }
}

/// Format a single IR instruction
pub fn format_ir_instr(instr: &IrInstruction) -> String {
    match instr {
        IrInstruction::ConstI64(dst, val) => format!("{} = i64 {}", dst, val),
        IrInstruction::Return(src) => format!("ret i64 {}", src),
        IrInstruction::Nop => "nop".to_string(),
        binary => match binary.as_binary() {
            Some((op, dst, a, b)) => format!("{} = {} i64 {}, {}", dst, op.mnemonic(), a, b),
            None => format!("{:?}", binary),
        },
    }
}

/// Log an IR module line by line at debug level
pub fn dump_ir(module: &IrModule) {
    tracing::debug!(
        module = %module.name,
        functions = module.functions.len(),
        instructions = module.instruction_count(),
        "IR dump"
    );
    for line in module.to_string().lines() {
        tracing::debug!("{}", line);
    }
}

/// Serialize a module as pretty-printed JSON
pub fn module_to_json(module: &IrModule) -> Result<String> {
    serde_json::to_string_pretty(module)
        .map_err(|e| Error::compiler(format!("IR export failed: {}", e)))
}

/// Read a module back from [`module_to_json`] output
pub fn module_from_json(json: &str) -> Result<IrModule> {
    let module: IrModule = serde_json::from_str(json)
        .map_err(|e| Error::compiler(format!("IR import failed: {}", e)))?;

    let problems = validate_module(&module);
    if !problems.is_empty() {
        return Err(Error::compiler(format!(
            "IR import failed: {}",
            problems.join("; ")
        )));
    }
    Ok(module)
}

/// Structural checks on a module. Returns a list of problems, empty if valid.
pub fn validate_module(module: &IrModule) -> Vec<String> {
    let mut errors = Vec::new();
    let mut names = HashSet::new();

    for function in &module.functions {
        if !names.insert(function.name.as_str()) {
            errors.push(format!("@{}: defined more than once", function.name));
        }
        validate_function(function, &mut errors);
    }

    errors
}

fn validate_function(function: &IrFunction, errors: &mut Vec<String>) {
    let name = &function.name;
    if function.blocks.is_empty() {
        errors.push(format!("@{}: no entry block", name));
        return;
    }

    let mut defined: HashSet<IrReg> = (0..function.params.len() as u32).map(IrReg).collect();

    for block in &function.blocks {
        if !block.is_terminated() {
            errors.push(format!("@{}/{}: block does not end in ret", name, block.label));
        }

        let body_len = block.instructions.len().saturating_sub(1);
        for (i, instr) in block.instructions.iter().enumerate() {
            if instr.is_terminator() && i < body_len {
                errors.push(format!(
                    "@{}/{}: instruction {} follows a terminator",
                    name, block.label, i + 1
                ));
            }

            for reg in instr.operands() {
                if !defined.contains(&reg) {
                    errors.push(format!(
                        "@{}/{}: {} read before it is written",
                        name, block.label, reg
                    ));
                }
            }

            if let Some(dst) = instr.dst() {
                if dst.0 >= function.register_count {
                    errors.push(format!(
                        "@{}/{}: {} exceeds register count {}",
                        name, block.label, dst, function.register_count
                    ));
                }
                if !defined.insert(dst) {
                    errors.push(format!("@{}/{}: {} written twice", name, block.label, dst));
                }
            }
        }
    }
}

/// Full debug report of one compilation: source, AST, unoptimized and
/// optimized IR
pub fn debug_compile(source: &str) -> String {
    use crate::compiler::{lower, CompileOptions, Compiler};
    use crate::parser::parse;
    use std::fmt::Write;

    let mut out = String::new();
    let rule = "─".repeat(61);

    let _ = writeln!(out, "{}\n SOURCE\n{}", rule, rule);
    for (i, line) in source.lines().enumerate() {
        let _ = writeln!(out, "{:3}│ {}", i + 1, line);
    }

    let program = match parse(source) {
        Ok(program) => program,
        Err(e) => {
            let _ = writeln!(out, "{}\n PARSE FAILED\n{}\n  {}", rule, rule, e);
            return out;
        }
    };
    let _ = writeln!(out, "{}\n AST\n{}\n{}", rule, rule, program);

    if let Ok(module) = lower(&program) {
        let _ = writeln!(out, "{}\n IR (unoptimized)\n{}\n{}", rule, rule, module);
    }

    let compiler = Compiler::new(CompileOptions {
        opt_level: 2,
        ..Default::default()
    });
    match compiler.compile_ast(&program) {
        Ok(result) => {
            let _ = writeln!(out, "{}\n IR (optimized)\n{}\n{}", rule, rule, result.module);
            let _ = writeln!(out, "  Functions:     {}", result.function_count);
            let _ = writeln!(out, "  IR instrs:     {}", result.ir_instruction_count);
            for problem in validate_module(&result.module) {
                let _ = writeln!(out, "  Invalid:       {}", problem);
            }
        }
        Err(e) => {
            let _ = writeln!(out, "{}\n COMPILATION FAILED\n{}\n  {}", rule, rule, e);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::ir::BasicBlock;
    use crate::compiler::lower;
    use crate::parser::parse;

    #[test]
    fn test_listing() {
        let module = lower(&parse("fn add(x, y){x+y} fn one(){1}").unwrap()).unwrap();
        let text = module.to_string();

        assert!(text.starts_with("; module main"));
        assert!(text.contains("define external i64 @add(i64 %0, i64 %1) { ; x, y"));
        assert!(text.contains("  %2 = add i64 %0, %1\n"));
        assert!(text.contains("  ret i64 %2\n"));
        assert!(text.contains("define external i64 @one() {\nentry:\n  %0 = i64 1\n"));
    }

    #[test]
    fn test_format_division() {
        let instr = IrInstruction::Div(IrReg(3), IrReg(1), IrReg(2));
        assert_eq!(format_ir_instr(&instr), "%3 = sdiv i64 %1, %2");
    }

    #[test]
    fn test_json_round_trip() {
        let module = lower(&parse("fn f(a){a*3-1}").unwrap()).unwrap();
        let json = module_to_json(&module).unwrap();
        assert!(json.contains("\"name\": \"f\""));
        assert_eq!(module_from_json(&json).unwrap(), module);
        assert!(module_from_json("{").is_err());
    }

    #[test]
    fn test_json_import_rejects_invalid_modules() {
        let mut module = lower(&parse("fn f(a){a*3-1}").unwrap()).unwrap();
        module.functions[0].register_count = 1;
        let json = module_to_json(&module).unwrap();

        let err = module_from_json(&json).unwrap_err();
        assert!(err.to_string().contains("exceeds register count"));
    }

    #[test]
    fn test_validate_module() {
        let module = lower(&parse("fn f(a, b){a/b + 2}").unwrap()).unwrap();
        assert!(validate_module(&module).is_empty());

        let mut broken = IrFunction::new("g", Vec::new());
        let mut entry = BasicBlock::new("entry");
        entry.instructions.push(IrInstruction::Add(IrReg(0), IrReg(1), IrReg(1)));
        broken.blocks.push(entry);
        let errors = validate_module(&IrModule {
            name: "m".to_string(),
            functions: vec![broken],
        });
        assert!(errors.iter().any(|e| e.contains("does not end in ret")));
        assert!(errors.iter().any(|e| e.contains("%1 read before it is written")));
        assert!(errors.iter().any(|e| e.contains("exceeds register count")));
    }

    #[test]
    fn test_debug_compile() {
        let report = debug_compile("fn main(){(2*3)*7}");
        assert!(report.contains(" AST"));
        assert!(report.contains(" IR (optimized)"));
        assert!(report.contains("%"));
        assert!(!report.contains("Invalid:"));

        let failed = debug_compile("fn main({1}");
        assert!(failed.contains("PARSE FAILED"));
    }
}
