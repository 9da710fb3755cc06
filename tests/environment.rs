#[cfg(test)]
mod environment_tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use rlox::environment::Environment;
    use rlox::value::Value;

    #[test]
    fn test_define_and_get() {
        let mut env: Environment = Environment::new();

        env.define("foo", Value::Number(123.0));

        let value: Value = env.get("foo", 1).expect("foo should be defined");

        assert_eq!(value, Value::Number(123.0));
    }

    #[test]
    fn test_get_undefined_is_a_runtime_error() {
        let env: Environment = Environment::new();

        let err = env.get("foo", 4).unwrap_err();

        assert_eq!(err.to_string(), "Undefined variable 'foo'.\n[line 4]");
    }

    #[test]
    fn test_redefine_overwrites_in_place() {
        let mut env: Environment = Environment::new();

        env.define("x", Value::Number(1.0));
        env.define("x", Value::Bool(true));

        assert_eq!(env.get("x", 1).unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_get_walks_the_enclosing_chain() {
        let globals = Rc::new(RefCell::new(Environment::new()));
        globals.borrow_mut().define("answer", Value::Number(42.0));

        let middle = Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(
            &globals,
        ))));
        let inner: Environment = Environment::with_enclosing(Rc::clone(&middle));

        assert_eq!(inner.get("answer", 1).unwrap(), Value::Number(42.0));
    }

    #[test]
    fn test_shadowing_does_not_touch_the_outer_binding() {
        let outer = Rc::new(RefCell::new(Environment::new()));
        outer.borrow_mut().define("x", Value::Number(1.0));

        let mut inner: Environment = Environment::with_enclosing(Rc::clone(&outer));
        inner.define("x", Value::Number(2.0));

        assert_eq!(inner.get("x", 1).unwrap(), Value::Number(2.0));
        assert_eq!(outer.borrow().get("x", 1).unwrap(), Value::Number(1.0));
    }

    #[test]
    fn test_assign_rebinds_in_the_declaring_scope() {
        let outer = Rc::new(RefCell::new(Environment::new()));
        outer.borrow_mut().define("x", Value::Number(1.0));

        let mut inner: Environment = Environment::with_enclosing(Rc::clone(&outer));

        inner
            .assign("x", Value::Number(99.0), 2)
            .expect("x is declared in the outer scope");

        assert_eq!(outer.borrow().get("x", 2).unwrap(), Value::Number(99.0));
    }

    #[test]
    fn test_assign_never_creates_a_binding() {
        let mut env: Environment = Environment::new();

        let err = env.assign("ghost", Value::Nil, 7).unwrap_err();

        assert_eq!(err.to_string(), "Undefined variable 'ghost'.\n[line 7]");
        assert!(env.get("ghost", 7).is_err());
    }
}
