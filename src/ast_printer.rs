use crate::expr::{Expr, LiteralValue};
use crate::value::format_number;

/// Renders an expression in fully parenthesised prefix form, e.g.
/// `1 + 2 * 3` → `(+ 1 (* 2 3))`.  Debug aid only; nothing in the pipeline
/// depends on it.
pub struct AstPrinter;

impl AstPrinter {
    pub fn print(expr: &Expr) -> String {
        match expr {
            // ── literals ────────────────────────────────────────────────
            Expr::Literal(lit) => match lit {
                LiteralValue::True => "true".into(),

                LiteralValue::False => "false".into(),

                LiteralValue::Nil => "nil".into(),

                LiteralValue::Str(s) => s.clone(),

                LiteralValue::Number(n) => format_number(*n),
            },

            Expr::Grouping(inner) => Self::parenthesize("group", &[inner.as_ref()]),

            Expr::Unary { operator, right } => Self::parenthesize(&operator.lexeme, &[right.as_ref()]),

            Expr::Binary {
                left,
                operator,
                right,
            }
            | Expr::Logical {
                left,
                operator,
                right,
            } => Self::parenthesize(&operator.lexeme, &[left.as_ref(), right.as_ref()]),

            Expr::Variable { name, .. } => name.lexeme.clone(),

            Expr::Assign { name, value, .. } => {
                Self::parenthesize(&format!("= {}", name.lexeme), &[value.as_ref()])
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                let mut parts: Vec<&Expr> = vec![callee.as_ref()];
                parts.extend(arguments.iter());
                Self::parenthesize("call", &parts)
            }

            Expr::Get { object, name } => {
                format!("(. {} {})", Self::print(object), name.lexeme)
            }

            Expr::Set {
                object,
                name,
                value,
            } => format!(
                "(= (. {} {}) {})",
                Self::print(object),
                name.lexeme,
                Self::print(value)
            ),

            Expr::This { .. } => "this".into(),

            Expr::Super { method, .. } => format!("(super {})", method.lexeme),
        }
    }

    fn parenthesize(name: &str, exprs: &[&Expr]) -> String {
        let mut s = format!("({}", name);
        for expr in exprs {
            s.push(' ');
            s.push_str(&Self::print(expr));
        }
        s.push(')');
        s
    }
}
