//! End-to-end scripts, exercised against the public `Vm` API rather than
//! any one internal module.

use wisp_vm::{InterpretError, Vm};

fn interpret(source: &str) -> Result<(), InterpretError> {
    Vm::new().interpret(source)
}

#[test]
fn arithmetic_respects_precedence() {
    assert!(interpret("print 1 + 2 * 2;").is_ok());
}

#[test]
fn lexical_scope_shadows_then_restores() {
    assert!(interpret(
        r#"
        var a = "global";
        {
            var a = "local";
            print a;
        }
        print a;
        "#
    )
    .is_ok());
}

#[test]
fn const_cannot_be_reassigned() {
    let err = interpret("const max = 10; max = 20;").unwrap_err();
    let InterpretError::Compile(errors) = err else {
        panic!("expected a compile error");
    };
    assert!(errors
        .iter()
        .any(|e| e.message.contains("Can't reassign to const")));
}

#[test]
fn while_loop_counts_up() {
    assert!(interpret(
        r#"
        var i = 0;
        while (i < 3) {
            print i;
            i = i + 1;
        }
        "#
    )
    .is_ok());
}

#[test]
fn switch_falls_through_to_default_after_a_match() {
    assert!(interpret(
        r#"
        var x = 1;
        switch (x) {
            case 1: print "one";
            case 2: print "two";
            default: print "other";
        }
        "#
    )
    .is_ok());
}

#[test]
fn switch_with_no_match_still_runs_default() {
    assert!(interpret(
        r#"
        var x = 99;
        switch (x) {
            case 1: print "one";
            default: print "other";
        }
        "#
    )
    .is_ok());
}

#[test]
fn number_and_string_equality() {
    assert!(interpret(
        r#"
        print 0 == 0.0;
        print nil == false;
        print "a" == "a";
        "#
    )
    .is_ok());
}

#[test]
fn string_number_addition_is_a_runtime_error() {
    let err = interpret(r#"print "a" + 1;"#).unwrap_err();
    assert!(matches!(err, InterpretError::Runtime(_)));
}

#[test]
fn dividing_by_zero_is_not_a_compile_time_concern() {
    assert!(interpret("print 1 / 0;").is_ok());
}

#[test]
fn undefined_variable_read_is_a_runtime_error() {
    let err = interpret("print undefined_name;").unwrap_err();
    let InterpretError::Runtime(e) = err else {
        panic!("expected a runtime error");
    };
    assert!(e.message.contains("Undefined variable"));
}

#[test]
fn reassigning_an_undefined_global_is_a_runtime_error() {
    let err = interpret("undefined_name = 1;").unwrap_err();
    assert!(matches!(err, InterpretError::Runtime(_)));
}

#[test]
fn for_loop_accumulates_into_a_global() {
    assert!(interpret(
        r#"
        var total = 0;
        for (var i = 0; i < 5; i = i + 1) {
            total = total + i;
        }
        print total;
        "#
    )
    .is_ok());
}

#[test]
fn or_short_circuits_without_evaluating_the_right_operand() {
    let mut vm = Vm::new();
    assert!(vm.interpret("var x = 0; true or (x = 1); print x;").is_ok());
}

#[test]
fn and_short_circuits_without_evaluating_the_right_operand() {
    let mut vm = Vm::new();
    assert!(vm
        .interpret("var x = 0; false and (x = 1); print x;")
        .is_ok());
}
