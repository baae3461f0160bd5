// SPDX-License-Identifier: BSD-3-Clause
//! An LLVM module as a [`Program`].
//!
//! Rules need values that implement `Clone`, `Hash`, and `Eq`, with equality
//! meaning "same memory location". The `llvm_ir` AST has neither identity
//! nor `Eq` (it contains floats), so this module rebuilds the parts of the
//! module structure that pointer rules look at, interning every named entity
//! once in a [`UArc`].

use std::collections::HashMap;

use llvm_ir::{types::Typed, Name, TypeRef};

use crate::arc::UArc;
use crate::program::{self, Kind, Program, ValueKind};

use self::instruction::Opcode;
use self::value::Scope;

pub mod constant;
mod error;
pub use error::*;
mod name;
pub use name::*;
pub mod instruction;
mod value;
pub use value::*;

#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct Instruction {
    pub(crate) function: UArc<FunctionName>,
    pub opcode: Opcode,
    pub(crate) ty: TypeRef,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct Function {
    pub parameters: Vec<Value>,
    pub return_type: TypeRef,
    pub signature: TypeRef,
    /// `None` for declarations
    pub body: Option<Vec<UArc<InstructionName>>>,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct Global {
    pub(crate) initializer: Option<Value>,
}

#[derive(Debug)]
pub struct Module {
    functions: HashMap<UArc<FunctionName>, Function>,
    function_order: Vec<UArc<FunctionName>>,
    instructions: HashMap<UArc<InstructionName>, Instruction>,
    parameters: HashMap<UArc<ParameterName>, TypeRef>,
    globals: HashMap<UArc<GlobalName>, Global>,
    global_order: Vec<UArc<GlobalName>>,
}

fn _assert_module_send_sync()
where
    Module: Send + Sync,
{
}

fn is_pointer(ty: &TypeRef) -> bool {
    matches!(**ty, llvm_ir::Type::PointerType { .. })
}

impl Module {
    /// Intern names of functions and global variables so they can be shared
    fn global_names(m: &llvm_ir::Module) -> HashMap<&str, Value> {
        let mut global_names: HashMap<&str, Value> = HashMap::with_capacity(
            m.functions.len()
                + m.func_declarations.len()
                + m.global_vars.len()
                + m.global_aliases.len(),
        );
        // NOTE! These are the only calls of `UArc::new` for function and
        // global names. Every other handle is a clone of one of these.
        for f in &m.functions {
            global_names.insert(
                f.name.as_ref(),
                Value::Function(UArc::new(FunctionName::from(f.name.as_str()))),
            );
        }
        for f in &m.func_declarations {
            global_names.insert(
                f.name.as_ref(),
                Value::Function(UArc::new(FunctionName::from(f.name.as_str()))),
            );
        }
        for g in &m.global_vars {
            global_names.insert(g.name.as_ref(), Value::Global(UArc::new(GlobalName::new(g))));
        }
        for g in &m.global_aliases {
            global_names.insert(g.name.as_ref(), Value::Global(UArc::new(GlobalName::alias(g))));
        }
        global_names
    }

    fn interned_function(
        global_names: &HashMap<&str, Value>,
        name: &str,
    ) -> Result<UArc<FunctionName>, Error> {
        match global_names.get(name) {
            Some(Value::Function(f)) => Ok(f.clone()),
            _ => Err(Error(format!("Function {} was not interned", name))),
        }
    }

    pub fn new(m: &llvm_ir::Module) -> Result<Self, Error> {
        let global_names = Self::global_names(m);
        let no_locals = HashMap::new();
        let module_scope = Scope {
            globals: &global_names,
            locals: &no_locals,
            types: &m.types,
        };

        let mut module = Module {
            functions: HashMap::with_capacity(m.functions.len() + m.func_declarations.len()),
            function_order: Vec::with_capacity(m.functions.len() + m.func_declarations.len()),
            instructions: HashMap::new(),
            parameters: HashMap::new(),
            globals: HashMap::with_capacity(m.global_vars.len()),
            global_order: Vec::with_capacity(m.global_vars.len()),
        };

        for g in &m.global_vars {
            let name = match global_names.get::<str>(g.name.as_ref()) {
                Some(Value::Global(name)) => name.clone(),
                _ => return Err(Error(format!("Global {} was not interned", g.name))),
            };
            let initializer = match &g.initializer {
                None => None,
                Some(c) => Some(module_scope.constant(c)?),
            };
            module.globals.insert(name.clone(), Global { initializer });
            module.global_order.push(name);
        }

        for d in &m.func_declarations {
            let name = Self::interned_function(&global_names, &d.name)?;
            let parameters = module.intern_parameters(&name, &d.parameters);
            let param_types = d.parameters.iter().map(|p| p.ty.clone()).collect();
            let function = Function {
                parameters,
                return_type: d.return_type.clone(),
                signature: m
                    .types
                    .func_type(d.return_type.clone(), param_types, d.is_var_arg),
                body: None,
            };
            module.functions.insert(name.clone(), function);
            module.function_order.push(name);
        }

        for f in &m.functions {
            let name = Self::interned_function(&global_names, &f.name)?;
            let function = module.define(m, &global_names, f, &name)?;
            module.functions.insert(name.clone(), function);
            module.function_order.push(name);
        }

        Ok(module)
    }

    fn intern_parameters(
        &mut self,
        function: &UArc<FunctionName>,
        parameters: &[llvm_ir::function::Parameter],
    ) -> Vec<Value> {
        let mut values = Vec::with_capacity(parameters.len());
        for p in parameters {
            let name = UArc::new(ParameterName::new(function.clone(), p));
            self.parameters.insert(name.clone(), p.ty.clone());
            values.push(Value::Parameter(name));
        }
        values
    }

    fn define<'m>(
        &mut self,
        m: &'m llvm_ir::Module,
        global_names: &HashMap<&'m str, Value>,
        f: &'m llvm_ir::Function,
        name: &UArc<FunctionName>,
    ) -> Result<Function, Error> {
        let mut locals = HashMap::<&Name, Value>::new();

        let parameters = self.intern_parameters(name, &f.parameters);
        for (p, v) in f.parameters.iter().zip(&parameters) {
            locals.insert(&p.name, v.clone());
        }

        // Name everything first: LLVM sometimes references values before
        // their definitions.
        let mut body = Vec::new();
        for b in &f.basic_blocks {
            let block_name = UArc::new(BlockName::new(name.clone(), b));
            for (idx, instr) in b.instrs.iter().enumerate() {
                let inst_name = UArc::new(InstructionName::new(block_name.clone(), idx));
                if let Some(n) = instr.try_get_result() {
                    locals.insert(n, Value::Instruction(inst_name.clone()));
                }
                body.push(inst_name);
            }
            let term_name = UArc::new(InstructionName::new(block_name, b.instrs.len()));
            if let Some(n) = b.term.try_get_result() {
                locals.insert(n, Value::Instruction(term_name.clone()));
            }
            body.push(term_name);
        }

        let scope = Scope {
            globals: global_names,
            locals: &locals,
            types: &m.types,
        };
        let mut names = body.iter();
        for b in &f.basic_blocks {
            for instr in &b.instrs {
                let opcode = Opcode::from_instruction(&scope, instr)?;
                self.insert_instruction(&mut names, name, opcode, instr.get_type(&m.types))?;
            }
            let opcode = Opcode::from_terminator(&scope, &b.term)?;
            self.insert_instruction(&mut names, name, opcode, b.term.get_type(&m.types))?;
        }

        let param_types = f.parameters.iter().map(|p| p.ty.clone()).collect();
        Ok(Function {
            parameters,
            return_type: f.return_type.clone(),
            signature: m
                .types
                .func_type(f.return_type.clone(), param_types, f.is_var_arg),
            body: Some(body),
        })
    }

    fn insert_instruction<'a>(
        &mut self,
        names: &mut impl Iterator<Item = &'a UArc<InstructionName>>,
        function: &UArc<FunctionName>,
        opcode: Opcode,
        ty: TypeRef,
    ) -> Result<(), Error> {
        let name = names
            .next()
            .ok_or_else(|| Error(format!("Instruction count changed in {}", function)))?;
        self.instructions.insert(
            name.clone(),
            Instruction {
                function: function.clone(),
                opcode,
                ty,
            },
        );
        Ok(())
    }

    /// Look up a function by its name, without the leading `@`
    pub fn function(&self, name: &str) -> Option<UArc<FunctionName>> {
        self.function_order.iter().find(|f| f.get() == name).cloned()
    }

    /// Look up a global variable by its name, without the leading `@`
    pub fn global(&self, name: &str) -> Option<Value> {
        self.global_order
            .iter()
            .find(|g| g.get() == name)
            .map(|g| Value::Global(g.clone()))
    }
}

impl Program for Module {
    type Value = Value;
    type Function = UArc<FunctionName>;
    type Type = TypeRef;

    fn kind(&self, value: &Value) -> Kind<Self> {
        match value {
            Value::Instruction(i) => match self.instructions.get(i) {
                None => ValueKind::Other,
                Some(instr) => match &instr.opcode {
                    Opcode::BitCast(b) => ValueKind::BitCast {
                        operand: b.operand.clone(),
                    },
                    Opcode::Call(c) => ValueKind::Call(program::Call {
                        callee: c.callee.clone(),
                        args: c.args.clone(),
                    }),
                    Opcode::ExtractValue(e) => ValueKind::ExtractValue {
                        aggregate: e.aggregate.clone(),
                    },
                    Opcode::GetElementPtr(g) => ValueKind::GetElementPtr {
                        pointer: g.pointer.clone(),
                    },
                    Opcode::InsertValue(iv) => ValueKind::InsertValue {
                        aggregate: iv.aggregate.clone(),
                        value: iv.element.clone(),
                    },
                    Opcode::IntToPtr => ValueKind::IntToPtr,
                    Opcode::Load(l) => ValueKind::Load {
                        pointer: l.pointer.clone(),
                    },
                    Opcode::Phi(p) => ValueKind::Phi {
                        incoming: p.incoming.clone(),
                    },
                    Opcode::Ret(operand) => ValueKind::Ret {
                        function: instr.function.clone(),
                        operand: operand.clone(),
                    },
                    Opcode::Store(s) => ValueKind::Store {
                        value: s.value.clone(),
                        pointer: s.pointer.clone(),
                    },
                    Opcode::Alloca | Opcode::Other => ValueKind::Other,
                },
            },
            Value::Global(g) => match self.globals.get(g) {
                Some(global) => ValueKind::Global {
                    initializer: global.initializer.clone(),
                },
                // aliases
                None => ValueKind::Other,
            },
            _ => ValueKind::Other,
        }
    }

    fn elim_const_expr(&self, value: &Value) -> Value {
        let mut v = value;
        while let Value::Constant(c) = v {
            match c.strip() {
                Some(inner) => v = inner,
                None => break,
            }
        }
        v.clone()
    }

    fn has_extra_reference(&self, value: &Value) -> bool {
        match value {
            Value::Instruction(i) => matches!(
                self.instructions.get(i).map(|i| &i.opcode),
                Some(Opcode::Alloca)
            ),
            Value::Global(_) | Value::Function(_) => true,
            _ => false,
        }
    }

    fn is_null(&self, value: &Value) -> bool {
        matches!(value, Value::Constant(c) if matches!(**c, constant::Constant::Null(_)))
    }

    fn is_pointer_value(&self, value: &Value) -> bool {
        match value {
            Value::Instruction(i) => self.instructions.get(i).map_or(false, |i| is_pointer(&i.ty)),
            Value::Parameter(p) => self.parameters.get(p).map_or(false, is_pointer),
            Value::Global(_) | Value::Function(_) => true,
            Value::Constant(c) => c.ty().map_or(false, is_pointer),
            Value::Metadata => false,
        }
    }

    fn is_pointer_type(&self, ty: &TypeRef) -> bool {
        is_pointer(ty)
    }

    fn pointee_type(&self, ty: &TypeRef) -> Option<TypeRef> {
        match &**ty {
            llvm_ir::Type::PointerType { pointee_type, .. } => Some(pointee_type.clone()),
            _ => None,
        }
    }

    fn undef_value(&self, ty: Option<&TypeRef>) -> Value {
        Value::constant(constant::Constant::Undef(ty.cloned()))
    }

    fn function_name(&self, function: &UArc<FunctionName>) -> String {
        function.get().to_string()
    }

    fn parameters(&self, function: &UArc<FunctionName>) -> Vec<Value> {
        self.functions
            .get(function)
            .map(|f| f.parameters.clone())
            .unwrap_or_default()
    }

    fn return_type(&self, function: &UArc<FunctionName>) -> TypeRef {
        self.functions[function].return_type.clone()
    }

    fn signature(&self, function: &UArc<FunctionName>) -> TypeRef {
        self.functions[function].signature.clone()
    }

    fn is_declaration(&self, function: &UArc<FunctionName>) -> bool {
        self.functions
            .get(function)
            .map_or(true, |f| f.body.is_none())
    }

    fn functions(&self) -> Vec<UArc<FunctionName>> {
        self.function_order.clone()
    }

    fn globals(&self) -> Vec<Value> {
        self.global_order
            .iter()
            .map(|g| Value::Global(g.clone()))
            .collect()
    }

    fn instructions(&self, function: &UArc<FunctionName>) -> Vec<Value> {
        match self.functions.get(function).and_then(|f| f.body.as_ref()) {
            Some(body) => body.iter().cloned().map(Value::Instruction).collect(),
            None => Vec::new(),
        }
    }
}
