//! The built-in operations
//!
//! Every built-in is one variant of [`Builtin`]; the identifiers a program
//! uses to reach it are fixed here and registered once by
//! [`crate::install`].

mod algebraic;
mod control;
mod io;
mod memory;


use concrete_core::vm::{Activation, EngineError, Executor, ExecutorContext, Script};
use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

/// Where `print!` writes
pub type Output = Rc<RefCell<dyn Write>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Greater,
    Less,
    GreaterEqual,
    LessEqual,
    Equal,
    And,
    Or,
    Not,
    Call,
    Jump,
    While,
    Return,
    If,
    Else,
    Set,
    Into,
    Get,
    Print,
    Debug,
}

impl Builtin {
    pub const ALL: [Builtin; 24] = [
        Builtin::Add,
        Builtin::Subtract,
        Builtin::Multiply,
        Builtin::Divide,
        Builtin::Modulo,
        Builtin::Greater,
        Builtin::Less,
        Builtin::GreaterEqual,
        Builtin::LessEqual,
        Builtin::Equal,
        Builtin::And,
        Builtin::Or,
        Builtin::Not,
        Builtin::Call,
        Builtin::Jump,
        Builtin::While,
        Builtin::Return,
        Builtin::If,
        Builtin::Else,
        Builtin::Set,
        Builtin::Into,
        Builtin::Get,
        Builtin::Print,
        Builtin::Debug,
    ];

    /// Identifiers this operation is registered under; the first is its name
    pub fn identifiers(&self) -> &'static [&'static str] {
        match self {
            Builtin::Add => &["add", "+"],
            Builtin::Subtract => &["subtract", "-"],
            Builtin::Multiply => &["multiply", "*"],
            Builtin::Divide => &["divide", "/"],
            Builtin::Modulo => &["modulo", "%"],
            Builtin::Greater => &[">"],
            Builtin::Less => &["<"],
            Builtin::GreaterEqual => &[">="],
            Builtin::LessEqual => &["<="],
            Builtin::Equal => &["="],
            Builtin::And => &["&"],
            Builtin::Or => &["|"],
            Builtin::Not => &["not", "~"],
            Builtin::Call => &["call"],
            Builtin::Jump => &["jump"],
            Builtin::While => &["while"],
            Builtin::Return => &["return"],
            Builtin::If => &["if"],
            Builtin::Else => &["else"],
            Builtin::Set => &["set"],
            Builtin::Into => &["into"],
            Builtin::Get => &["get"],
            Builtin::Print => &["print"],
            Builtin::Debug => &["debug"],
        }
    }

    pub fn name(&self) -> &'static str {
        self.identifiers()[0]
    }
}

pub struct BuiltinExecutor {
    builtin: Builtin,
    output: Output,
}

impl BuiltinExecutor {
    pub fn new(builtin: Builtin, output: Output) -> Self {
        BuiltinExecutor { builtin, output }
    }
}

impl Executor for BuiltinExecutor {
    fn invoke(&self, ctx: &ExecutorContext<'_>) -> Result<Box<dyn Activation>, EngineError> {
        let arguments = ctx.arguments;
        let commands = match self.builtin {
            Builtin::Add
            | Builtin::Subtract
            | Builtin::Multiply
            | Builtin::Divide
            | Builtin::Modulo
            | Builtin::Greater
            | Builtin::Less
            | Builtin::GreaterEqual
            | Builtin::LessEqual
            | Builtin::Equal
            | Builtin::And
            | Builtin::Or => algebraic::reduce(self.builtin, arguments)?,
            Builtin::Not => algebraic::not(arguments)?,
            Builtin::Call => control::call(arguments)?,
            Builtin::Jump => control::jump(arguments)?,
            Builtin::While => control::while_block(arguments, ctx.head)?,
            Builtin::Return => control::explicit_return(),
            Builtin::If => control::if_block(arguments),
            Builtin::Else => control::else_block(ctx.should_execute_else),
            Builtin::Set => memory::set(arguments)?,
            Builtin::Into => memory::into(arguments, ctx.next_block)?,
            Builtin::Get => return memory::get(arguments),
            Builtin::Print => io::print(arguments, &self.output)?,
            Builtin::Debug => io::debug(ctx),
        };
        Ok(Script::boxed(commands))
    }
}
