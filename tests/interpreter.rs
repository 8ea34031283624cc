#[cfg(test)]
mod interpreter_tests {
    use std::cell::RefCell;
    use std::io::{self, Write};
    use std::rc::Rc;

    use pretty_assertions::assert_eq;

    use rox::interpreter::Interpreter;
    use rox::parser::Parser;
    use rox::scanner::Scanner;
    use rox::session::{RunStatus, Session};

    /// In-memory writer whose contents stay readable after it is boxed.
    #[derive(Clone, Default)]
    struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

    impl SharedBuffer {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.borrow()).into_owned()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct Outcome {
        status: RunStatus,
        out: String,
        err: String,
    }

    fn run_with(interpreter: Interpreter, out: SharedBuffer, source: &str) -> Outcome {
        let err = SharedBuffer::default();
        let mut session = Session::with_interpreter(interpreter, Box::new(err.clone()));

        let status = session.run(source);

        Outcome {
            status,
            out: out.contents(),
            err: err.contents(),
        }
    }

    fn run(source: &str) -> Outcome {
        let out = SharedBuffer::default();
        run_with(Interpreter::with_output(Box::new(out.clone())), out, source)
    }

    /// Runs a program expected to succeed and returns its printed output.
    fn output_of(source: &str) -> String {
        let outcome = run(source);
        assert_eq!(outcome.err, "");
        assert_eq!(outcome.status, RunStatus::Ok);
        outcome.out
    }

    /// Runs a program expected to fail at runtime; returns (output, diagnostic).
    fn runtime_failure(source: &str) -> (String, String) {
        let outcome = run(source);
        assert_eq!(outcome.status, RunStatus::RuntimeError);
        (outcome.out, outcome.err)
    }

    #[test]
    fn test_arithmetic_and_display() {
        assert_eq!(
            output_of(
                "print 1 + 2;\n\
                 print 7 / 2;\n\
                 print -3 * 2;\n\
                 print 10 - 2.5;\n\
                 print 1 / 0;\n\
                 print \"a\" + \"b\";\n\
                 print nil;\n\
                 print !nil;"
            ),
            "3\n3.5\n-6\n7.5\ninf\nab\nnil\ntrue\n"
        );
    }

    #[test]
    fn test_comparison_and_equality() {
        assert_eq!(
            output_of(
                "print 1 < 2;\n\
                 print 2 <= 1;\n\
                 print nil == false;\n\
                 print nil == nil;\n\
                 print \"a\" == \"a\";\n\
                 print 1 != \"1\";"
            ),
            "true\nfalse\nfalse\ntrue\ntrue\ntrue\n"
        );
    }

    #[test]
    fn test_logical_operators_return_operands() {
        assert_eq!(
            output_of(
                "print nil or \"yes\";\n\
                 print false and 1;\n\
                 print 0 and \"zero is truthy\";\n\
                 var touched = false;\n\
                 fun touch() { touched = true; return true; }\n\
                 print true or touch();\n\
                 print touched;"
            ),
            "yes\nfalse\nzero is truthy\ntrue\nfalse\n"
        );
    }

    #[test]
    fn test_type_errors() {
        let (_, err) = runtime_failure("print 1 + \"a\";");
        assert_eq!(
            err,
            "[line 1] Runtime error at '+': Operands must be two numbers or two strings.\n"
        );

        let (_, err) = runtime_failure("print 1 < \"a\";");
        assert_eq!(
            err,
            "[line 1] Runtime error at '<': Operands must be numbers.\n"
        );

        let (_, err) = runtime_failure("print -\"x\";");
        assert_eq!(
            err,
            "[line 1] Runtime error at '-': Operand must be a number.\n"
        );
    }

    #[test]
    fn test_control_flow() {
        assert_eq!(
            output_of(
                "for (var i = 0; i < 3; i = i + 1) print i;\n\
                 var n = 0;\n\
                 while (n < 2) { n = n + 1; }\n\
                 if (n == 2) print \"two\"; else print \"other\";\n\
                 if (nil) print \"never\";"
            ),
            "0\n1\n2\ntwo\n"
        );
    }

    #[test]
    fn test_shadowing_leaves_global_untouched() {
        assert_eq!(
            output_of(
                "var a = \"global\";\n\
                 {\n\
                   var a = \"inner\";\n\
                   a = \"changed\";\n\
                   print a;\n\
                 }\n\
                 print a;"
            ),
            "changed\nglobal\n"
        );
    }

    #[test]
    fn test_closure_binds_to_definition_scope() {
        assert_eq!(
            output_of(
                "var a = \"global\";\n\
                 {\n\
                   fun showA() { print a; }\n\
                   showA();\n\
                   var a = \"block\";\n\
                   showA();\n\
                 }"
            ),
            "global\nglobal\n"
        );
    }

    #[test]
    fn test_counters_are_independent() {
        assert_eq!(
            output_of(
                "fun makeCounter() {\n\
                   var i = 0;\n\
                   fun count() { i = i + 1; return i; }\n\
                   return count;\n\
                 }\n\
                 var a = makeCounter();\n\
                 var b = makeCounter();\n\
                 print a();\n\
                 print a();\n\
                 print b();\n\
                 print a();"
            ),
            "1\n2\n1\n3\n"
        );
    }

    #[test]
    fn test_recursion() {
        assert_eq!(
            output_of(
                "fun fib(n) { if (n < 2) return n; return fib(n - 1) + fib(n - 2); }\n\
                 print fib(15);"
            ),
            "610\n"
        );
    }

    #[test]
    fn test_function_values_display() {
        assert_eq!(
            output_of(
                "fun f() {}\n\
                 class K {}\n\
                 print f;\n\
                 print clock;\n\
                 print K;\n\
                 print K();\n\
                 print f();\n\
                 print clock() > 0;"
            ),
            "<fn f>\n<native fn>\nK\nK instance\nnil\ntrue\n"
        );
    }

    #[test]
    fn test_arity_is_checked_before_the_body_runs() {
        let (out, err) = runtime_failure("fun f(a, b) { print \"body\"; }\nf(1);");

        assert_eq!(out, "");
        assert_eq!(
            err,
            "[line 2] Runtime error at ')': Expected 2 arguments but got 1.\n"
        );
    }

    #[test]
    fn test_calling_a_non_callable() {
        let (_, err) = runtime_failure("\"str\"();");
        assert_eq!(
            err,
            "[line 1] Runtime error at ')': Can only call functions and classes.\n"
        );
    }

    #[test]
    fn test_undefined_variables() {
        let (_, err) = runtime_failure("print nope;");
        assert_eq!(
            err,
            "[line 1] Runtime error at 'nope': Undefined variable 'nope'.\n"
        );

        let (_, err) = runtime_failure("nope = 1;");
        assert_eq!(
            err,
            "[line 1] Runtime error at 'nope': Undefined variable 'nope'.\n"
        );
    }

    #[test]
    fn test_runtime_error_keeps_earlier_output() {
        let (out, _) = runtime_failure("print 1;\nprint x;\nprint 2;");
        assert_eq!(out, "1\n");
    }

    #[test]
    fn test_fields_and_methods() {
        assert_eq!(
            output_of(
                "class Box {\n\
                   init(v) { this.v = v; }\n\
                   get() { return this.v; }\n\
                 }\n\
                 var b = Box(3);\n\
                 var g = b.get;\n\
                 b.v = 4;\n\
                 print g();\n\
                 b.get = \"shadowed\";\n\
                 print b.get;"
            ),
            "4\nshadowed\n"
        );
    }

    #[test]
    fn test_property_errors() {
        let (_, err) = runtime_failure("class C {}\nprint C().missing;");
        assert_eq!(
            err,
            "[line 2] Runtime error at 'missing': Undefined property 'missing'.\n"
        );

        let (_, err) = runtime_failure("var n = 1;\nn.x = 2;");
        assert_eq!(
            err,
            "[line 2] Runtime error at 'x': Only instances have fields.\n"
        );

        let (_, err) = runtime_failure("print \"s\".length;");
        assert_eq!(
            err,
            "[line 1] Runtime error at 'length': Only instances have properties.\n"
        );
    }

    #[test]
    fn test_initializer_returns_instance() {
        assert_eq!(
            output_of(
                "class P {\n\
                   init(x) {\n\
                     this.x = x;\n\
                     if (x > 1) return;\n\
                     this.small = true;\n\
                   }\n\
                 }\n\
                 var p = P(5);\n\
                 print p;\n\
                 print p.x;\n\
                 print P(1).small;\n\
                 print p.init(7) == p;\n\
                 print p.x;"
            ),
            "P instance\n5\ntrue\ntrue\n7\n"
        );
    }

    #[test]
    fn test_class_arity_follows_init() {
        let (_, err) = runtime_failure("class P { init(a, b) {} }\nP(1);");
        assert_eq!(
            err,
            "[line 2] Runtime error at ')': Expected 2 arguments but got 1.\n"
        );

        let (_, err) = runtime_failure("class Q {}\nQ(1);");
        assert_eq!(
            err,
            "[line 2] Runtime error at ')': Expected 0 arguments but got 1.\n"
        );
    }

    #[test]
    fn test_super_dispatch_keeps_this() {
        assert_eq!(
            output_of(
                "class A {\n\
                   method() { print \"A method on \" + this.name; }\n\
                 }\n\
                 class B < A {\n\
                   init(name) { this.name = name; }\n\
                   method() { print \"B method\"; super.method(); }\n\
                 }\n\
                 class C < B {}\n\
                 C(\"c\").method();"
            ),
            "B method\nA method on c\n"
        );
    }

    #[test]
    fn test_inherited_initializer_and_methods() {
        assert_eq!(
            output_of(
                "class Base { init(v) { this.v = v; } show() { print this.v; } }\n\
                 class Derived < Base {}\n\
                 Derived(9).show();"
            ),
            "9\n"
        );
    }

    #[test]
    fn test_superclass_must_be_a_class() {
        let (_, err) = runtime_failure("var NotClass = 1;\nclass D < NotClass {}");
        assert_eq!(
            err,
            "[line 2] Runtime error at 'NotClass': Superclass must be a class.\n"
        );
    }

    #[test]
    fn test_object_identity_equality() {
        assert_eq!(
            output_of(
                "class C {}\n\
                 var a = C();\n\
                 var b = C();\n\
                 print a == a;\n\
                 print a == b;\n\
                 fun f() {}\n\
                 print f == f;"
            ),
            "true\nfalse\ntrue\n"
        );
    }

    #[test]
    fn test_call_depth_guard() {
        let out = SharedBuffer::default();
        let interpreter = Interpreter::with_output(Box::new(out.clone())).with_max_call_depth(16);

        let outcome = run_with(
            interpreter,
            out,
            "fun down(n) { return down(n + 1); }\ndown(0);",
        );

        assert_eq!(outcome.status, RunStatus::RuntimeError);
        assert_eq!(
            outcome.err,
            "[line 1] Runtime error at ')': Stack overflow.\n"
        );
    }

    #[test]
    fn test_deep_recursion_within_default_limit() {
        assert_eq!(
            output_of(
                "fun sum(n) { if (n == 0) return 0; return n + sum(n - 1); }\n\
                 print sum(1000);"
            ),
            "500500\n"
        );
    }

    #[test]
    fn test_default_depth_guard_reports_overflow() {
        let (_, err) = runtime_failure("fun forever(n) { return forever(n + 1); }\nforever(0);");

        assert_eq!(err, "[line 1] Runtime error at ')': Stack overflow.\n");
    }

    #[test]
    fn test_unresolved_super_is_a_runtime_error() {
        let source = "class A { m() {} }\n\
                      class B < A { m() { super.m(); } }\n\
                      B().m();";

        let (tokens, _) = Scanner::scan_all(source);
        let statements = match Parser::new(tokens).parse() {
            Ok(statements) => statements,
            Err(errors) => panic!("parse failed: {:?}", errors),
        };

        let mut interpreter = Interpreter::with_output(Box::new(io::sink()));
        let err = interpreter.interpret(&statements).unwrap_err();

        assert_eq!(
            err.to_string(),
            "[line 2] Runtime error at 'super': Undefined variable 'super'."
        );
    }

    #[test]
    fn test_globals_run_the_same_without_resolving() {
        let source = "var a = 1;\n\
                      var b = a + 2;\n\
                      a = b * 2;\n\
                      if (a > b) print a; else print b;\n\
                      while (b > 0) b = b - 1;\n\
                      print b;";

        let out = SharedBuffer::default();
        let (tokens, _) = Scanner::scan_all(source);
        let statements = match Parser::new(tokens).parse() {
            Ok(statements) => statements,
            Err(errors) => panic!("parse failed: {:?}", errors),
        };

        let mut interpreter = Interpreter::with_output(Box::new(out.clone()));
        assert!(interpreter.interpret(&statements).is_ok());

        assert_eq!(out.contents(), output_of(source));
    }
}
