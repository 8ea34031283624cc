#[cfg(test)]
mod parser_tests {
    use pretty_assertions::assert_eq;

    use rox::ast_printer::AstPrinter;
    use rox::error::LoxError;
    use rox::expr::{Expr, LiteralValue};
    use rox::parser::Parser;
    use rox::scanner::Scanner;
    use rox::stmt::Stmt;

    fn parse_program(source: &str) -> Result<Vec<Stmt>, Vec<LoxError>> {
        let (tokens, errors) = Scanner::scan_all(source);
        assert!(errors.is_empty(), "unexpected lex errors: {:?}", errors);

        Parser::new(tokens).parse()
    }

    fn print_expression(source: &str) -> String {
        let (tokens, _) = Scanner::scan_all(source);

        match Parser::new(tokens).parse_expression() {
            Ok(expr) => AstPrinter::print(&expr),
            Err(errors) => panic!("parse failed: {:?}", errors),
        }
    }

    fn messages(errors: &[LoxError]) -> Vec<String> {
        errors.iter().map(|e| e.to_string()).collect()
    }

    #[test]
    fn test_precedence_and_associativity() {
        assert_eq!(print_expression("1 + 2 * 3"), "(+ 1 (* 2 3))");
        assert_eq!(print_expression("1 - 2 - 3"), "(- (- 1 2) 3)");
        assert_eq!(
            print_expression("-(1 + 2) * 3 == 4"),
            "(== (* (- (group (+ 1 2))) 3) 4)"
        );
        assert_eq!(
            print_expression("1 < 2 != 3 >= 4"),
            "(!= (< 1 2) (>= 3 4))"
        );
        assert_eq!(
            print_expression("!true or false and nil"),
            "(or (! true) (and false nil))"
        );
    }

    #[test]
    fn test_literals_render_plainly() {
        assert_eq!(print_expression("\"hi there\""), "hi there");
        assert_eq!(print_expression("1.5"), "1.5");
        assert_eq!(print_expression("10"), "10");
        assert_eq!(print_expression("nil"), "nil");
    }

    #[test]
    fn test_assignment_is_right_associative() {
        assert_eq!(print_expression("a = b = c"), "(= a (= b c))");
        assert_eq!(print_expression("obj.field = 1"), "(= (. obj field) 1)");
    }

    #[test]
    fn test_calls_and_property_chains() {
        assert_eq!(
            print_expression("a.b.c(1, 2)(3)"),
            "(call (call (. (. a b) c) 1 2) 3)"
        );
        assert_eq!(print_expression("super.method"), "(super method)");
        assert_eq!(print_expression("this.x"), "(. this x)");
    }

    #[test]
    fn test_for_loop_desugars_to_while() {
        let statements = match parse_program("for (var i = 0; i < 3; i = i + 1) print i;") {
            Ok(statements) => statements,
            Err(errors) => panic!("parse failed: {:?}", errors),
        };

        assert_eq!(statements.len(), 1);

        let Stmt::Block(outer) = &statements[0] else {
            panic!("expected block, got {:?}", statements[0]);
        };
        assert!(matches!(outer[0], Stmt::Var { .. }));

        let Stmt::While { condition, body } = &outer[1] else {
            panic!("expected while, got {:?}", outer[1]);
        };
        assert_eq!(AstPrinter::print(condition), "(< i 3)");

        let Stmt::Block(inner) = body.as_ref() else {
            panic!("expected loop body block, got {:?}", body);
        };
        assert!(matches!(inner[0], Stmt::Print(_)));
        assert!(matches!(inner[1], Stmt::Expression(Expr::Assign { .. })));
    }

    #[test]
    fn test_empty_for_clauses_loop_forever() {
        let statements = parse_program("for (;;) {}").unwrap_or_default();

        assert!(matches!(
            &statements[..],
            [Stmt::While {
                condition: Expr::Literal(LiteralValue::True),
                ..
            }]
        ));
    }

    #[test]
    fn test_class_declaration_with_superclass() {
        let statements = parse_program("class B < A { init(x) {} speak() { return 1; } }")
            .unwrap_or_default();

        let [Stmt::Class {
            name,
            superclass,
            methods,
        }] = &statements[..]
        else {
            panic!("expected one class, got {:?}", statements);
        };

        assert_eq!(name.lexeme, "B");
        assert!(matches!(superclass, Some(Expr::Variable { name, .. }) if name.lexeme == "A"));

        let names: Vec<&str> = methods.iter().map(|m| m.name.lexeme.as_str()).collect();
        assert_eq!(names, vec!["init", "speak"]);
        assert_eq!(methods[0].params.len(), 1);
    }

    #[test]
    fn test_multiple_errors_are_all_reported() {
        let errors = parse_program("var = 1;\nprint ;\nvar ok = 2;").unwrap_err();

        assert_eq!(
            messages(&errors),
            vec![
                "[line 1] Error at '=': Expect variable name.",
                "[line 2] Error at ';': Expect expression.",
            ]
        );
    }

    #[test]
    fn test_error_at_end_of_input() {
        let errors = parse_program("print 1").unwrap_err();

        assert_eq!(
            messages(&errors),
            vec!["[line 1] Error at end: Expect ';' after value."]
        );
    }

    #[test]
    fn test_invalid_assignment_target_does_not_stop_parsing() {
        let errors = parse_program("1 = 2;\nprint (;").unwrap_err();

        assert_eq!(
            messages(&errors),
            vec![
                "[line 1] Error at '=': Invalid assignment target.",
                "[line 2] Error at ';': Expect expression.",
            ]
        );
    }

    #[test]
    fn test_argument_limit() {
        let args: Vec<String> = (0..256).map(|n| n.to_string()).collect();
        let source = format!("f({});", args.join(", "));

        let errors = parse_program(&source).unwrap_err();

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message(), "Can't have more than 255 arguments.");
    }

    #[test]
    fn test_parameter_limit() {
        let params: Vec<String> = (0..256).map(|n| format!("p{}", n)).collect();
        let source = format!("fun f({}) {{}}", params.join(", "));

        let errors = parse_program(&source).unwrap_err();

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message(), "Can't have more than 255 parameters.");
    }

    #[test]
    fn test_parse_expression_reports_errors() {
        let (tokens, _) = Scanner::scan_all("1 +");
        let errors = Parser::new(tokens).parse_expression().unwrap_err();

        assert_eq!(
            messages(&errors),
            vec!["[line 1] Error at end: Expect expression."]
        );
    }

    #[test]
    fn test_missing_eof_is_supplied() {
        let (mut tokens, _) = Scanner::scan_all("print 1;");
        tokens.pop();

        let statements = Parser::new(tokens).parse().unwrap_or_default();
        assert_eq!(statements.len(), 1);
    }
}
