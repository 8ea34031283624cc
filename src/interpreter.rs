use std::collections::HashMap;
use std::io::{self, Write};
use std::mem;
use std::rc::Rc;

use chrono::Utc;
use log::{debug, info};
use thiserror::Error;

use crate::callable::{LoxFunction, NativeFunction};
use crate::class::{LoxClass, LoxInstance, INITIALIZER};
use crate::environment::{self, EnvRef, Environment};
use crate::error::LoxError;
use crate::expr::{Expr, ExprId, LiteralValue};
use crate::stack;
use crate::stmt::{FunctionDecl, Stmt};
use crate::token::{Token, TokenType};
use crate::value::Value;

/// Calls nested deeper than this raise `Stack overflow.` by default.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 4096;

/// Non‑local exits from statement execution.
///
/// `Runtime` unwinds to the top of the current [`Interpreter::interpret`];
/// `Return` unwinds only to the nearest call frame.
#[derive(Error, Debug)]
pub enum InterpretError {
    #[error("[line {line}] Runtime error at '{lexeme}': {message}")]
    Runtime {
        message: String,
        lexeme: String,
        line: usize,
    },

    #[error("Return signal with value: {0}")]
    Return(Value),

    /// The output channel failed.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl InterpretError {
    pub fn runtime<S: Into<String>>(token: &Token, message: S) -> Self {
        let message: String = message.into();

        debug!("Runtime error at line {}: {}", token.line, message);

        InterpretError::Runtime {
            message,
            lexeme: token.lexeme.clone(),
            line: token.line,
        }
    }
}

/// Convenient alias for interpreter results.
pub type IResult<T> = Result<T, InterpretError>;

pub struct Interpreter {
    globals: EnvRef,
    environment: EnvRef,
    /// Scope distance per resolved reference node; absent ⇒ global.
    locals: HashMap<ExprId, usize>,
    /// Entries of `locals` outside any function body; dropped after the
    /// unit that owns them has run, since nothing can execute them again.
    unit_locals: Vec<ExprId>,
    output: Box<dyn Write>,
    call_depth: usize,
    max_call_depth: usize,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Creates an Interpreter printing to stdout.
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    /// Creates an Interpreter whose `print` statements write to `output`, and
    /// defines native functions such as `clock`.
    pub fn with_output(output: Box<dyn Write>) -> Self {
        info!("Initializing Interpreter");

        let globals: EnvRef = Rc::new(std::cell::RefCell::new(Environment::new()));

        debug!("Defining native function 'clock'");

        globals.borrow_mut().define(
            "clock",
            Value::NativeFunction(Rc::new(NativeFunction {
                name: "clock".to_string(),
                arity: 0,
                func: |_args: &[Value]| {
                    let millis: i64 = Utc::now().timestamp_millis();
                    Ok(Value::Number(millis as f64 / 1000.0))
                },
            })),
        );

        Self {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            unit_locals: Vec::new(),
            output,
            call_depth: 0,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }

    pub fn with_max_call_depth(mut self, max_call_depth: usize) -> Self {
        self.max_call_depth = max_call_depth;
        self
    }

    /// Called by the resolver: `id` refers to a binding `depth` scopes out.
    pub fn resolve(&mut self, id: ExprId, depth: usize) {
        debug!("Noting local {:?} at depth {}", id, depth);

        self.locals.insert(id, depth);
    }

    /// Like [`Interpreter::resolve`], for a reference that only the current
    /// unit's top-level code can reach.
    pub fn resolve_in_unit(&mut self, id: ExprId, depth: usize) {
        self.resolve(id, depth);
        self.unit_locals.push(id);
    }

    pub fn resolved_depth(&self, id: ExprId) -> Option<usize> {
        self.locals.get(&id).copied()
    }

    /// Number of reference nodes the resolver has annotated so far.
    pub fn resolved_count(&self) -> usize {
        self.locals.len()
    }

    /// Interprets a list of statements as one execution unit.  A runtime
    /// error aborts the unit but leaves the interpreter usable.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<(), LoxError> {
        debug!("Interpreting {} statements", statements.len());

        let result: IResult<()> = statements.iter().try_for_each(|stmt| self.execute(stmt));

        // Block and call exits already restore these; reset anyway so a
        // failed unit can never leak a nested scope into the next one.
        self.environment = Rc::clone(&self.globals);
        self.call_depth = 0;

        for id in self.unit_locals.drain(..) {
            self.locals.remove(&id);
        }

        match result {
            Ok(()) | Err(InterpretError::Return(_)) => {
                info!("Interpretation completed successfully");
                Ok(())
            }
            Err(InterpretError::Runtime {
                message,
                lexeme,
                line,
            }) => Err(LoxError::Runtime {
                message,
                lexeme,
                line,
            }),
            Err(InterpretError::Io(e)) => Err(LoxError::Io(e)),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statements
    // ─────────────────────────────────────────────────────────────────────────

    /// Executes a single statement.
    pub fn execute(&mut self, stmt: &Stmt) -> IResult<()> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(())
            }

            Stmt::Print(expr) => {
                let value: Value = self.evaluate(expr)?;
                writeln!(self.output, "{}", value)?;
                debug!("Printed value: {}", value);
                Ok(())
            }

            Stmt::Var { name, initializer } => {
                let value: Value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                debug!("Defining variable '{}' = {}", name.lexeme, value);
                self.environment.borrow_mut().define(&name.lexeme, value);
                Ok(())
            }

            Stmt::Block(statements) => {
                let scope: EnvRef = Environment::child_of(&self.environment);
                self.execute_block(statements, scope)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_stmt) = else_branch {
                    self.execute(else_stmt)
                } else {
                    Ok(())
                }
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    self.execute(body)?;
                }
                Ok(())
            }

            Stmt::Function(declaration) => {
                debug!("Defining function '{}'", declaration.name.lexeme);
                let function = LoxFunction::new(
                    Rc::clone(declaration),
                    Rc::clone(&self.environment),
                    false,
                );
                self.environment.borrow_mut().define(
                    &declaration.name.lexeme,
                    Value::Function(Rc::new(function)),
                );
                Ok(())
            }

            Stmt::Return { value, .. } => {
                let value: Value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                Err(InterpretError::Return(value))
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => self.execute_class(name, superclass.as_ref(), methods),
        }
    }

    /// Runs `statements` with `environment` as the current scope, restoring
    /// the previous scope on every exit path.
    pub fn execute_block(&mut self, statements: &[Stmt], environment: EnvRef) -> IResult<()> {
        let previous: EnvRef = mem::replace(&mut self.environment, environment);

        let result: IResult<()> = statements.iter().try_for_each(|stmt| self.execute(stmt));

        self.environment = previous;
        result
    }

    fn execute_class(
        &mut self,
        name: &Token,
        superclass: Option<&Expr>,
        methods: &[Rc<FunctionDecl>],
    ) -> IResult<()> {
        debug!("Declaring class '{}'", name.lexeme);

        let superclass: Option<Rc<LoxClass>> = match superclass {
            Some(expr) => match self.evaluate(expr)? {
                Value::Class(class) => Some(class),
                _ => {
                    let at: &Token = match expr {
                        Expr::Variable { name, .. } => name,
                        _ => name,
                    };
                    return Err(InterpretError::runtime(at, "Superclass must be a class."));
                }
            },
            None => None,
        };

        // Reserved once the superclass checks out, so methods can refer to
        // their own class and a failed declaration binds nothing.
        self.environment
            .borrow_mut()
            .define(&name.lexeme, Value::Nil);

        let method_env: EnvRef = match &superclass {
            Some(parent) => {
                let env: EnvRef = Environment::child_of(&self.environment);
                env.borrow_mut()
                    .define("super", Value::Class(Rc::clone(parent)));
                env
            }
            None => Rc::clone(&self.environment),
        };

        let table: HashMap<String, Rc<LoxFunction>> = methods
            .iter()
            .map(|method| {
                let function = LoxFunction::new(
                    Rc::clone(method),
                    Rc::clone(&method_env),
                    method.name.lexeme == INITIALIZER,
                );
                (method.name.lexeme.clone(), Rc::new(function))
            })
            .collect();

        let class = LoxClass::new(name.lexeme.clone(), superclass, table);

        self.environment
            .borrow_mut()
            .assign(&name.lexeme, Value::Class(Rc::new(class)));

        info!("Class '{}' defined", name.lexeme);
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expressions
    // ─────────────────────────────────────────────────────────────────────────

    /// Evaluates an expression and returns a Value.
    pub fn evaluate(&mut self, expr: &Expr) -> IResult<Value> {
        match expr {
            Expr::Literal(literal) => Ok(literal_value(literal)),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => self.evaluate_unary(operator, right),

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right),

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left_val: Value = self.evaluate(left)?;

                let short_circuit: bool = if operator.token_type == TokenType::OR {
                    left_val.is_truthy()
                } else {
                    !left_val.is_truthy()
                };

                if short_circuit {
                    Ok(left_val)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Variable { id, name } => self.look_up_variable(*id, name),

            Expr::Assign { id, name, value } => {
                let value: Value = self.evaluate(value)?;
                self.assign_variable(*id, name, value.clone())?;
                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee: Value = self.evaluate(callee)?;

                let mut args: Vec<Value> = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    args.push(self.evaluate(argument)?);
                }

                self.call_value(&callee, paren, args)
            }

            Expr::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => LoxInstance::get(&instance, name),
                _ => Err(InterpretError::runtime(
                    name,
                    "Only instances have properties.",
                )),
            },

            Expr::Set {
                object,
                name,
                value,
            } => {
                let Value::Instance(instance) = self.evaluate(object)? else {
                    return Err(InterpretError::runtime(name, "Only instances have fields."));
                };

                let value: Value = self.evaluate(value)?;
                instance.borrow_mut().set(name, value.clone());
                Ok(value)
            }

            Expr::This { id, keyword } => self.look_up_variable(*id, keyword),

            Expr::Super {
                id,
                keyword,
                method,
            } => self.evaluate_super(*id, keyword, method),
        }
    }

    /// Evaluates a unary expression.
    fn evaluate_unary(&mut self, operator: &Token, right: &Expr) -> IResult<Value> {
        let right_val: Value = self.evaluate(right)?;

        match operator.token_type {
            TokenType::MINUS => match right_val {
                Value::Number(n) => Ok(Value::Number(-n)),
                _ => Err(InterpretError::runtime(
                    operator,
                    "Operand must be a number.",
                )),
            },

            TokenType::BANG => Ok(Value::Bool(!right_val.is_truthy())),

            _ => Err(InterpretError::runtime(operator, "Invalid unary operator.")),
        }
    }

    /// Evaluates a binary expression, left operand first.
    fn evaluate_binary(&mut self, left: &Expr, operator: &Token, right: &Expr) -> IResult<Value> {
        let left_val: Value = self.evaluate(left)?;
        let right_val: Value = self.evaluate(right)?;

        debug!(
            "Binary '{}' on {} and {}",
            operator.lexeme, left_val, right_val
        );

        match operator.token_type {
            TokenType::PLUS => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
                _ => Err(InterpretError::runtime(
                    operator,
                    "Operands must be two numbers or two strings.",
                )),
            },

            TokenType::EQUAL_EQUAL => Ok(Value::Bool(left_val == right_val)),

            TokenType::BANG_EQUAL => Ok(Value::Bool(left_val != right_val)),

            _ => {
                let (a, b) = number_operands(operator, &left_val, &right_val)?;

                let result: Value = match operator.token_type {
                    TokenType::MINUS => Value::Number(a - b),
                    TokenType::STAR => Value::Number(a * b),
                    TokenType::SLASH => Value::Number(a / b),
                    TokenType::GREATER => Value::Bool(a > b),
                    TokenType::GREATER_EQUAL => Value::Bool(a >= b),
                    TokenType::LESS => Value::Bool(a < b),
                    TokenType::LESS_EQUAL => Value::Bool(a <= b),
                    _ => {
                        return Err(InterpretError::runtime(
                            operator,
                            "Invalid binary operator.",
                        ))
                    }
                };

                Ok(result)
            }
        }
    }

    fn evaluate_super(&mut self, id: ExprId, keyword: &Token, method: &Token) -> IResult<Value> {
        let depth: usize = self
            .resolved_depth(id)
            .ok_or_else(|| InterpretError::runtime(keyword, "Undefined variable 'super'."))?;

        let superclass: Option<Value> = environment::get_at(&self.environment, depth, "super");
        let instance: Option<Value> =
            environment::get_at(&self.environment, depth.saturating_sub(1), "this");

        let (Some(Value::Class(superclass)), Some(Value::Instance(instance))) =
            (superclass, instance)
        else {
            return Err(InterpretError::runtime(keyword, "Undefined variable 'super'."));
        };

        match superclass.find_method(&method.lexeme) {
            Some(found) => Ok(Value::Function(Rc::new(found.bind(instance)))),
            None => Err(InterpretError::runtime(
                method,
                format!("Undefined property '{}'.", method.lexeme),
            )),
        }
    }

    /// Invokes a callable (native function, user function or class).
    fn call_value(&mut self, callee: &Value, paren: &Token, arguments: Vec<Value>) -> IResult<Value> {
        let Some(callable) = callee.as_callable() else {
            return Err(InterpretError::runtime(
                paren,
                "Can only call functions and classes.",
            ));
        };

        if arguments.len() != callable.arity() {
            return Err(InterpretError::runtime(
                paren,
                format!(
                    "Expected {} arguments but got {}.",
                    callable.arity(),
                    arguments.len()
                ),
            ));
        }

        if self.call_depth >= self.max_call_depth {
            return Err(InterpretError::runtime(paren, "Stack overflow."));
        }

        debug!("Calling {} with {} argument(s)", callee, arguments.len());

        self.call_depth += 1;
        let result: IResult<Value> =
            stack::ensure_sufficient_stack(|| callable.call(self, paren, arguments));
        self.call_depth -= 1;

        result
    }

    fn look_up_variable(&self, id: ExprId, name: &Token) -> IResult<Value> {
        let found: Option<Value> = match self.locals.get(&id) {
            Some(&depth) => environment::get_at(&self.environment, depth, &name.lexeme),
            None => self.globals.borrow().get(&name.lexeme),
        };

        found.ok_or_else(|| {
            InterpretError::runtime(name, format!("Undefined variable '{}'.", name.lexeme))
        })
    }

    fn assign_variable(&mut self, id: ExprId, name: &Token, value: Value) -> IResult<()> {
        let assigned: bool = match self.locals.get(&id) {
            Some(&depth) => environment::assign_at(&self.environment, depth, &name.lexeme, value),
            None => self.globals.borrow_mut().assign(&name.lexeme, value),
        };

        if assigned {
            Ok(())
        } else {
            Err(InterpretError::runtime(
                name,
                format!("Undefined variable '{}'.", name.lexeme),
            ))
        }
    }
}

fn literal_value(literal: &LiteralValue) -> Value {
    match literal {
        LiteralValue::Number(n) => Value::Number(*n),
        LiteralValue::Str(s) => Value::String(s.clone()),
        LiteralValue::True => Value::Bool(true),
        LiteralValue::False => Value::Bool(false),
        LiteralValue::Nil => Value::Nil,
    }
}

fn number_operands(operator: &Token, left: &Value, right: &Value) -> IResult<(f64, f64)> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
        _ => Err(InterpretError::runtime(
            operator,
            "Operands must be numbers.",
        )),
    }
}
