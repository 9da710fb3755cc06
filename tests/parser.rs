#[cfg(test)]
mod parser_tests {
    use rlox::ast::Stmt;
    use rlox::ast_printer::AstPrinter;
    use rlox::error::LoxError;
    use rlox::parser::Parser;
    use rlox::scanner::Scanner;
    use rlox::token::Token;

    fn parse(source: &str) -> Result<Vec<Stmt>, Vec<LoxError>> {
        let tokens: Vec<Token> = Scanner::new(source).filter_map(Result::ok).collect();
        let mut parser = Parser::new(&tokens);

        parser.parse()
    }

    fn parse_ok(source: &str) -> Vec<Stmt> {
        match parse(source) {
            Ok(statements) => statements,
            Err(errors) => panic!("unexpected parse errors for {source:?}: {errors:?}"),
        }
    }

    /// Parses a single-statement program and renders it in prefix form.
    fn rendered(source: &str) -> String {
        let statements: Vec<Stmt> = parse_ok(source);

        assert_eq!(statements.len(), 1, "expected one statement in {source:?}");

        AstPrinter::print_stmt(&statements[0])
    }

    // ── expression shapes ─────────────────────────────────────────────

    #[test]
    fn test_unary_binds_tighter_than_factor() {
        assert_eq!(rendered("-123 * (45.67);"), "(expr (* (- 123.0) (group 45.67)))");
    }

    #[test]
    fn test_factor_binds_tighter_than_term() {
        assert_eq!(
            rendered("1 + 2 * 3 - 4;"),
            "(expr (- (+ 1.0 (* 2.0 3.0)) 4.0))"
        );
    }

    #[test]
    fn test_comparison_binds_tighter_than_equality() {
        assert_eq!(rendered("1 < 2 == true;"), "(expr (== (< 1.0 2.0) true))");
    }

    #[test]
    fn test_binary_operators_fold_left() {
        assert_eq!(rendered("1 - 2 - 3;"), "(expr (- (- 1.0 2.0) 3.0))");
    }

    #[test]
    fn test_logical_operators_fold_left() {
        assert_eq!(rendered("a or b or c;"), "(expr (or (or a b) c))");
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        assert_eq!(rendered("a or b and c;"), "(expr (or a (and b c)))");
    }

    #[test]
    fn test_assignment_is_right_associative() {
        assert_eq!(rendered("a = b = 1;"), "(expr (= a (= b 1.0)))");
    }

    #[test]
    fn test_call_with_arguments() {
        assert_eq!(rendered("add(1, 2 + 3);"), "(expr (call add 1.0 (+ 2.0 3.0)))");
    }

    #[test]
    fn test_calls_chain() {
        assert_eq!(rendered("f(1)(2);"), "(expr (call (call f 1.0) 2.0))");
    }

    // ── statement shapes ──────────────────────────────────────────────

    #[test]
    fn test_var_declaration_with_initializer() {
        assert_eq!(rendered("var x = 1;"), "(var x = 1.0)");
    }

    #[test]
    fn test_var_declaration_without_initializer() {
        assert_eq!(rendered("var y;"), "(var y)");
    }

    #[test]
    fn test_function_declaration() {
        assert_eq!(
            rendered("fun add(a, b) { return a + b; }"),
            "(fun add (a b) (return (+ a b)))"
        );
    }

    #[test]
    fn test_return_without_value() {
        assert_eq!(rendered("fun f() { return; }"), "(fun f () (return))");
    }

    #[test]
    fn test_if_with_else() {
        assert_eq!(
            rendered("if (x) print 1; else print 2;"),
            "(if-else x (print 1.0) (print 2.0))"
        );
    }

    #[test]
    fn test_while_statement() {
        assert_eq!(
            rendered("while (x) x = x - 1;"),
            "(while x (expr (= x (- x 1.0))))"
        );
    }

    #[test]
    fn test_for_desugars_to_block_and_while() {
        assert_eq!(
            rendered("for (var i = 0; i < 3; i = i + 1) print i;"),
            "(block (var i = 0.0) \
             (while (< i 3.0) \
             (block (print i) (expr (= i (+ i 1.0))))))"
        );
    }

    #[test]
    fn test_for_with_empty_clauses_is_a_bare_while() {
        assert_eq!(rendered("for (;;) print 1;"), "(while true (print 1.0))");
    }

    #[test]
    fn test_for_without_initializer_adds_no_outer_block() {
        assert_eq!(
            rendered("for (; x < 3;) print x;"),
            "(while (< x 3.0) (print x))"
        );
    }

    #[test]
    fn test_program_renders_one_line_per_statement() {
        let statements: Vec<Stmt> = parse_ok("var x = 1;\nprint x;");

        assert_eq!(
            AstPrinter::print_program(&statements),
            "(var x = 1.0)\n(print x)"
        );
    }

    #[test]
    fn test_expression_line_follows_the_operator() {
        let statements: Vec<Stmt> = parse_ok("1\n+ 2;");

        match &statements[0] {
            Stmt::Expression(expr) => assert_eq!(expr.line(), 2),
            other => panic!("expected an expression statement, got {other:?}"),
        }
    }

    // ── syntax errors ─────────────────────────────────────────────────

    fn parse_errors(source: &str) -> Vec<LoxError> {
        match parse(source) {
            Ok(statements) => panic!("expected errors for {source:?}, got {statements:?}"),
            Err(errors) => errors,
        }
    }

    #[test]
    fn test_invalid_assignment_target() {
        let errors: Vec<LoxError> = parse_errors("1 = 2;");

        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].to_string(),
            "[line 1] Error at '=': Invalid assignment target."
        );
    }

    #[test]
    fn test_missing_semicolon_is_reported_at_end() {
        let errors: Vec<LoxError> = parse_errors("print 1");

        assert_eq!(
            errors[0].to_string(),
            "[line 1] Error at end: Expect ';' after value."
        );
    }

    #[test]
    fn test_missing_expression() {
        let errors: Vec<LoxError> = parse_errors("print ;");

        assert_eq!(
            errors[0].to_string(),
            "[line 1] Error at ';': Expect expression."
        );
    }

    #[test]
    fn test_recovery_surfaces_independent_errors() {
        let errors: Vec<LoxError> = parse_errors("var 1 = 2;\nprint 3;\nfun 4;");

        assert_eq!(errors.len(), 2);
        assert_eq!(
            errors[0].to_string(),
            "[line 1] Error at '1': Expect variable name."
        );
        assert_eq!(
            errors[1].to_string(),
            "[line 3] Error at '4': Expect function name."
        );
    }

    #[test]
    fn test_recovery_inside_a_block() {
        // The bad declaration is skipped but the block still closes.
        let errors: Vec<LoxError> = parse_errors("{ var 1; print 2; }");

        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("Expect variable name."));
    }

    #[test]
    fn test_unclosed_block() {
        let errors: Vec<LoxError> = parse_errors("{ print 1;");

        assert_eq!(
            errors[0].to_string(),
            "[line 1] Error at end: Expect '}' after block."
        );
    }

    #[test]
    fn test_argument_limit() {
        let mut source: String = String::from("f(");

        for _ in 0..255 {
            source.push_str("0,");
        }

        source.push_str("0);");

        let errors: Vec<LoxError> = parse_errors(&source);

        assert!(errors[0]
            .to_string()
            .contains("Can't have more than 255 arguments."));
    }

    #[test]
    fn test_parameter_limit() {
        let mut source: String = String::from("fun f(");

        for i in 0..255 {
            source.push_str(&format!("p{i},"));
        }

        source.push_str("last) { return; }");

        let errors: Vec<LoxError> = parse_errors(&source);

        assert!(errors[0]
            .to_string()
            .contains("Can't have more than 255 parameters."));
    }
}
