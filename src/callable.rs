//! The call capability shared by native builtins, user functions and
//! classes (which construct instances when called).

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::class::LoxInstance;
use crate::environment::{EnvRef, Environment};
use crate::interpreter::{IResult, InterpretError, Interpreter};
use crate::stmt::FunctionDecl;
use crate::token::Token;
use crate::value::Value;

/// Anything that can appear in callee position.
///
/// The interpreter checks `arity` against the argument count before `call`
/// runs, so implementations may assume `arguments.len() == self.arity()`.
pub trait Callable {
    fn arity(&self) -> usize;

    /// `call_site` is the closing paren of the call expression, used to
    /// position errors raised by the callee itself.
    fn call(
        &self,
        interpreter: &mut Interpreter,
        call_site: &Token,
        arguments: Vec<Value>,
    ) -> IResult<Value>;
}

/// Host function exposed to Lox programs.
pub struct NativeFunction {
    pub name: String,
    pub arity: usize,
    pub func: fn(&[Value]) -> Result<Value, String>,
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native fn {}>", self.name)
    }
}

impl Callable for NativeFunction {
    fn arity(&self) -> usize {
        self.arity
    }

    fn call(
        &self,
        _interpreter: &mut Interpreter,
        call_site: &Token,
        arguments: Vec<Value>,
    ) -> IResult<Value> {
        debug!("Calling native function '{}'", self.name);

        (self.func)(&arguments).map_err(|message| InterpretError::runtime(call_site, message))
    }
}

/// A user function or method together with the environment it closes over.
pub struct LoxFunction {
    declaration: Rc<FunctionDecl>,
    closure: EnvRef,
    is_initializer: bool,
}

impl LoxFunction {
    pub fn new(declaration: Rc<FunctionDecl>, closure: EnvRef, is_initializer: bool) -> Self {
        Self {
            declaration,
            closure,
            is_initializer,
        }
    }

    pub fn name(&self) -> &str {
        &self.declaration.name.lexeme
    }

    /// Produce a copy of this method whose closure has one extra scope
    /// binding `this` to `instance`.
    pub fn bind(&self, instance: Rc<RefCell<LoxInstance>>) -> LoxFunction {
        let environment: EnvRef = Environment::child_of(&self.closure);
        environment
            .borrow_mut()
            .define("this", Value::Instance(instance));

        LoxFunction::new(
            Rc::clone(&self.declaration),
            environment,
            self.is_initializer,
        )
    }

    /// The instance an initializer yields: the `this` bound one scope up.
    fn bound_this(&self) -> Value {
        self.closure.borrow().get_local("this").unwrap_or(Value::Nil)
    }
}

impl fmt::Debug for LoxFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<fn {}>", self.name())
    }
}

impl Callable for LoxFunction {
    fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    fn call(
        &self,
        interpreter: &mut Interpreter,
        _call_site: &Token,
        arguments: Vec<Value>,
    ) -> IResult<Value> {
        debug!("Calling user-defined function '{}'", self.name());

        // Each call gets a fresh frame chained to the *captured* closure.
        let frame: EnvRef = Environment::child_of(&self.closure);

        for (param, argument) in self.declaration.params.iter().zip(arguments) {
            frame.borrow_mut().define(&param.lexeme, argument);
        }

        match interpreter.execute_block(&self.declaration.body, frame) {
            Ok(()) if self.is_initializer => Ok(self.bound_this()),
            Ok(()) => Ok(Value::Nil),
            Err(InterpretError::Return(_)) if self.is_initializer => Ok(self.bound_this()),
            Err(InterpretError::Return(value)) => {
                debug!("Function '{}' returned: {}", self.name(), value);
                Ok(value)
            }
            Err(e) => Err(e),
        }
    }
}
