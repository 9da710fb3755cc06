#[cfg(test)]
mod interpreter_tests {
    use rlox::ast::Stmt;
    use rlox::error::LoxError;
    use rlox::interpreter::Interpreter;
    use rlox::parser::Parser;
    use rlox::scanner::Scanner;
    use rlox::token::Token;

    fn parse_program(source: &str) -> Vec<Stmt> {
        let tokens: Vec<Token> = Scanner::new(source).filter_map(Result::ok).collect();
        let mut parser = Parser::new(&tokens);

        match parser.parse() {
            Ok(statements) => statements,
            Err(errors) => panic!("unexpected parse errors for {source:?}: {errors:?}"),
        }
    }

    /// Runs `source` against a fresh interpreter, capturing everything
    /// `print` wrote plus the final outcome.
    fn run_capture(source: &str) -> (String, Result<(), LoxError>) {
        let statements: Vec<Stmt> = parse_program(source);

        let mut output: Vec<u8> = Vec::new();

        let result: Result<(), LoxError> = {
            let mut interpreter = Interpreter::new(&mut output);
            interpreter.interpret(&statements)
        };

        let printed: String = String::from_utf8(output).expect("print output should be UTF-8");

        (printed, result)
    }

    fn run(source: &str) -> String {
        let (printed, result) = run_capture(source);

        if let Err(e) = result {
            panic!("unexpected runtime error for {source:?}: {e}");
        }

        printed
    }

    fn run_err(source: &str) -> LoxError {
        let (_, result) = run_capture(source);

        match result {
            Ok(()) => panic!("expected a runtime error for {source:?}"),
            Err(e) => e,
        }
    }

    // ── expressions and printing ──────────────────────────────────────

    #[test]
    fn test_arithmetic_precedence() {
        assert_eq!(run("print 1 + 2 * 3;"), "7\n");
    }

    #[test]
    fn test_number_formatting() {
        assert_eq!(run("print 4 / 2;"), "2\n");
        assert_eq!(run("print 5 / 2;"), "2.5\n");
        assert_eq!(run("print 0.5 + 0.25;"), "0.75\n");
    }

    #[test]
    fn test_string_concatenation() {
        assert_eq!(run(r#"print "foo" + "bar";"#), "foobar\n");
    }

    #[test]
    fn test_unary_operators() {
        assert_eq!(run("print -(3 + 4);"), "-7\n");
        assert_eq!(run("print !nil;"), "true\n");
        assert_eq!(run("print !false;"), "true\n");
        assert_eq!(run("print !0;"), "false\n");
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(run("print 1 < 2;"), "true\n");
        assert_eq!(run("print 2 <= 1;"), "false\n");
        assert_eq!(run("print 3 >= 3;"), "true\n");
    }

    #[test]
    fn test_equality_is_total_over_values() {
        let source: &str = "print nil == nil;\n\
                            print 1 == 1;\n\
                            print 1 == 2;\n\
                            print true != false;\n\
                            print 1 == true;";

        assert_eq!(run(source), "true\ntrue\nfalse\ntrue\nfalse\n");
    }

    #[test]
    fn test_function_values_compare_by_identity() {
        assert_eq!(run("fun f() {} var g = f; print f == g;"), "true\n");
        assert_eq!(run("fun f() {} fun g() {} print f == g;"), "false\n");
    }

    #[test]
    fn test_only_plus_works_on_string_pairs() {
        let err: LoxError = run_err(r#"print "a" - "b";"#);

        assert_eq!(
            err.to_string(),
            "Cannot use operator '-' with string operands\n[line 1]"
        );

        let err: LoxError = run_err(r#"print "a" == "a";"#);

        assert_eq!(
            err.to_string(),
            "Cannot use operator '==' with string operands\n[line 1]"
        );
    }

    #[test]
    fn test_mixed_operands_are_rejected() {
        let err: LoxError = run_err(r#"print 1 + "a";"#);

        assert_eq!(err.to_string(), "Operands must both be numbers.\n[line 1]");
    }

    #[test]
    fn test_unary_minus_needs_a_number() {
        let err: LoxError = run_err(r#"print -"a";"#);

        assert_eq!(err.to_string(), "Operand must be a number.\n[line 1]");
    }

    #[test]
    fn test_divide_by_zero_is_caught_before_dividing() {
        let err: LoxError = run_err("print 1 / 0;");

        assert_eq!(err.to_string(), "Cannot divide by zero\n[line 1]");
    }

    // ── truthiness and logical operators ──────────────────────────────

    #[test]
    fn test_only_nil_and_false_are_falsy() {
        let source: &str = "if (0) print \"zero\";\n\
                            if (\"\") print \"empty\";\n\
                            if (nil) print \"nil\";\n\
                            if (false) print \"false\";";

        assert_eq!(run(source), "zero\nempty\n");
    }

    #[test]
    fn test_short_circuit_skips_the_right_operand() {
        // Evaluating the right side would blow up on division by zero.
        assert_eq!(run("print false and (1 / 0);"), "false\n");
        assert_eq!(run("print true or (1 / 0);"), "true\n");
    }

    #[test]
    fn test_logical_operators_yield_the_operand_value() {
        assert_eq!(run(r#"print nil or "fallback";"#), "fallback\n");
        assert_eq!(run("print 0 and 1;"), "1\n");
    }

    // ── variables and scoping ─────────────────────────────────────────

    #[test]
    fn test_declaration_and_assignment() {
        assert_eq!(run("var a = 1; a = a + 1; print a;"), "2\n");
    }

    #[test]
    fn test_assignment_yields_the_assigned_value() {
        assert_eq!(run("var a; var b; print a = b = 5; print b;"), "5\n5\n");
    }

    #[test]
    fn test_uninitialized_variable_is_nil() {
        assert_eq!(run("var x; print x;"), "nil\n");
    }

    #[test]
    fn test_undefined_variable() {
        let err: LoxError = run_err("print ghost;");

        assert_eq!(err.to_string(), "Undefined variable 'ghost'.\n[line 1]");
    }

    #[test]
    fn test_assignment_never_declares() {
        let err: LoxError = run_err("ghost = 1;");

        assert_eq!(err.to_string(), "Undefined variable 'ghost'.\n[line 1]");
    }

    #[test]
    fn test_nested_block_scoping() {
        let source: &str = "var a = \"global a\";\n\
                            var b = \"global b\";\n\
                            {\n\
                              var a = \"outer a\";\n\
                              {\n\
                                var a = \"inner a\";\n\
                                print a;\n\
                                print b;\n\
                              }\n\
                              print a;\n\
                              print b;\n\
                            }\n\
                            print a;\n\
                            print b;";

        assert_eq!(
            run(source),
            "inner a\nglobal b\nouter a\nglobal b\nglobal a\nglobal b\n"
        );
    }

    #[test]
    fn test_block_locals_do_not_leak() {
        let err: LoxError = run_err("{ var local = 1; }\nprint local;");

        assert_eq!(err.to_string(), "Undefined variable 'local'.\n[line 2]");
        assert_eq!(err.line(), Some(2));
    }

    // ── control flow ──────────────────────────────────────────────────

    #[test]
    fn test_if_else_takes_the_right_branch() {
        assert_eq!(run(r#"if (1 > 2) print "then"; else print "else";"#), "else\n");
    }

    #[test]
    fn test_while_loop() {
        assert_eq!(
            run("var i = 0; while (i < 3) { print i; i = i + 1; }"),
            "0\n1\n2\n"
        );
    }

    #[test]
    fn test_for_loop() {
        assert_eq!(
            run("for (var i = 0; i < 3; i = i + 1) print i;"),
            "0\n1\n2\n"
        );
    }

    #[test]
    fn test_runtime_error_aborts_remaining_statements() {
        let (printed, result) = run_capture("print 1; print ghost; print 2;");

        assert_eq!(printed, "1\n");
        assert!(result.is_err());
    }

    // ── functions, returns, closures ──────────────────────────────────

    #[test]
    fn test_function_declaration_binds_a_value() {
        assert_eq!(run("fun greet() {} print greet;"), "<fn greet>\n");
    }

    #[test]
    fn test_call_with_return_value() {
        assert_eq!(run("fun add(a, b) { return a + b; } print add(1, 2);"), "3\n");
    }

    #[test]
    fn test_function_without_return_yields_nil() {
        assert_eq!(run("fun noop() {} print noop();"), "nil\n");
    }

    #[test]
    fn test_return_short_circuits_the_body() {
        assert_eq!(
            run(r#"fun f() { return 1; print "unreachable"; } print f();"#),
            "1\n"
        );
    }

    #[test]
    fn test_return_escapes_nested_loops_and_blocks() {
        let source: &str = "fun first() {\n\
                              for (var i = 0; i < 10; i = i + 1) {\n\
                                if (i == 3) return i;\n\
                              }\n\
                            }\n\
                            print first();";

        assert_eq!(run(source), "3\n");
    }

    #[test]
    fn test_recursion() {
        let source: &str = "fun fib(n) {\n\
                              if (n <= 1) return n;\n\
                              return fib(n - 2) + fib(n - 1);\n\
                            }\n\
                            print fib(10);";

        assert_eq!(run(source), "55\n");
    }

    #[test]
    fn test_each_call_gets_a_fresh_scope() {
        let source: &str = "fun countdown(n) {\n\
                              if (n > 0) { countdown(n - 1); }\n\
                              print n;\n\
                            }\n\
                            countdown(2);";

        assert_eq!(run(source), "0\n1\n2\n");
    }

    #[test]
    fn test_closures_capture_the_defining_scope() {
        let source: &str = "fun makeCounter() {\n\
                              var count = 0;\n\
                              fun increment() {\n\
                                count = count + 1;\n\
                                return count;\n\
                              }\n\
                              return increment;\n\
                            }\n\
                            var counter = makeCounter();\n\
                            print counter();\n\
                            print counter();";

        assert_eq!(run(source), "1\n2\n");
    }

    #[test]
    fn test_arity_mismatch() {
        let err: LoxError = run_err("fun f(a) {} f(1, 2);");

        assert_eq!(err.to_string(), "Expected 1 arguments but got 2.\n[line 1]");
    }

    #[test]
    fn test_calling_a_non_callable() {
        let err: LoxError = run_err(r#""hi"();"#);

        assert_eq!(
            err.to_string(),
            "Can only call functions and classes.\n[line 1]"
        );
    }

    #[test]
    fn test_return_at_top_level_is_an_error() {
        let err: LoxError = run_err("return 1;");

        assert_eq!(
            err.to_string(),
            "Cannot return from top-level code.\n[line 1]"
        );
    }

    #[test]
    fn test_clock_native_returns_seconds() {
        assert_eq!(run("print clock() > 0;"), "true\n");
    }

    // ── session behavior (REPL-style reuse) ───────────────────────────

    #[test]
    fn test_globals_persist_across_interpret_calls() {
        let mut output: Vec<u8> = Vec::new();

        {
            let mut interpreter = Interpreter::new(&mut output);

            interpreter
                .interpret(&parse_program("var session = 41;"))
                .expect("declaration should run");
            interpreter
                .interpret(&parse_program("print session + 1;"))
                .expect("lookup should run");
        }

        assert_eq!(String::from_utf8(output).unwrap(), "42\n");
    }

    #[test]
    fn test_scope_cursor_survives_a_runtime_error() {
        let mut output: Vec<u8> = Vec::new();

        {
            let mut interpreter = Interpreter::new(&mut output);

            interpreter
                .interpret(&parse_program(r#"var a = "outer";"#))
                .expect("declaration should run");

            // Fails inside a nested scope that shadows `a`.
            interpreter
                .interpret(&parse_program(r#"{ var a = "inner"; print ghost; }"#))
                .expect_err("lookup of ghost should fail");

            // If the cursor leaked we would see "inner" here.
            interpreter
                .interpret(&parse_program("print a;"))
                .expect("session should continue");
        }

        assert_eq!(String::from_utf8(output).unwrap(), "outer\n");
    }
}
