mod common;

use common::{numbers, run, run_captured};
use concrete_core::pipeline::PipelineError;
use concrete_core::vm::{EngineError, HostValue};
use concrete_stdlib::interpret;
use pretty_assertions::assert_eq;

fn fib(n: u32) -> String {
    format!(
        r#"
        fib: (n)[
            n, 1 > _, @recurse jump! 1 return!

            recurse:_

            n, 1 - _, fib! a: _
            n, 2 - _, fib! b: _

            a, b + _
        ]

        {n}, fib! _
        "#
    )
}

#[test]
fn test_place_result_after_jump() {
    assert_eq!(run("@end jump! 5, end: 3 add! _"), numbers(&[3.0]));
}

#[test]
fn test_call_and_return() {
    assert_eq!(run("[] call! _"), vec![HostValue::Null]);
    assert_eq!(run("[3, 4] call! _"), numbers(&[3.0]));
    assert_eq!(
        run("[3, 4 add! _ return! 5, 6] call! _"),
        numbers(&[7.0])
    );
}

#[test]
fn test_parameter_binding() {
    assert_eq!(
        run("5, (n)[ n, n multiply! _ ] call! _"),
        numbers(&[25.0])
    );
}

#[test]
fn test_closures() {
    assert_eq!(run("a: 5 [ a, a * _ ] call! 50"), numbers(&[25.0]));
    assert_eq!(
        run("a: 5 [ 10, @a set! ] call! a, a * _"),
        numbers(&[100.0])
    );
}

#[test]
fn test_fibonacci() {
    let expected = [1.0, 1.0, 2.0, 3.0, 5.0, 8.0, 13.0, 21.0, 34.0, 55.0, 89.0];
    for (n, want) in expected.into_iter().enumerate() {
        assert_eq!(run(&fib(n as u32)), numbers(&[want]), "fib({n})");
    }
}

#[test]
fn test_fizzbuzz() {
    let source = r#"
        n: 15
        i: 0

        start:
          i, n = _, @end jump!
          i, 1 + _, @i set!

        i, 3 % _ ~ fizz: _
        i, 5 % _ ~ buzz: _
        fizz, buzz & fizzbuzz: _

        fizzbuzz, @fb jump!
        fizz, @f jump!
        buzz, @b jump!

        i print! @start jump!
        fb: "FizzBuzz" print! @start jump!
        f: "Fizz" print! @start jump!
        b: "Buzz" print! @start jump!

        end:_
    "#;

    let captured = run_captured(source);
    assert_eq!(captured.results.expect("run"), vec![HostValue::Null]);

    let lines: Vec<&str> = captured.printed.lines().collect();
    assert_eq!(
        lines,
        vec![
            "1", "2", "Fizz", "4", "Buzz", "Fizz", "7", "8", "Fizz", "Buzz", "11", "Fizz", "13",
            "14", "FizzBuzz",
        ]
    );
}

#[test]
fn test_if_else_picks_one_branch() {
    let program = |n: u32| {
        format!(
            r#"
            big: [ "big" print! ]
            small: [ "small" print! ]
            {n}, 3 > _ if! big! _ else! small! _
            "#
        )
    };

    assert_eq!(run_captured(&program(5)).printed, "big\n");
    assert_eq!(run_captured(&program(1)).printed, "small\n");
}

#[test]
fn test_into_and_get() {
    assert_eq!(run(r#"v: _ "stored" into! @v @v get! _"#), vec![HostValue::String("stored".into())]);
}

#[test]
fn test_string_concatenation() {
    assert_eq!(
        run(r#""n = ", 4 + _"#),
        vec![HostValue::String("n = 4".into())]
    );
}

#[test]
fn test_counting_loop() {
    let source = r#"
        i: 0
        top:
          i, 1 + _, @i set!
          i, 10 < _, @top jump!
        i
    "#;
    assert_eq!(run(source), numbers(&[10.0]));
}

#[test]
fn test_while_loop() {
    let program = |start: u32| {
        format!(
            r#"
            step: [ i, 1 + _, @i set!  i, 3 < _, @go set! ]
            i: {start}
            go: 1
            go while! step! _
            i
            "#
        )
    };
    assert_eq!(run(&program(0)), numbers(&[3.0]));
    assert_eq!(run(&program(7)), numbers(&[8.0]));
}

#[test]
fn test_while_with_falsy_condition_skips_body() {
    let source = r#"
        step: [ "ran" print! ]
        go: 0
        go while! step! _
        "after" print!
    "#;
    assert_eq!(run_captured(source).printed, "after\n");
}

#[test]
fn test_hyphenated_labels() {
    assert_eq!(run("my-label: 5 my-label"), numbers(&[5.0]));
}

#[test]
fn test_interpret_empty_program() {
    assert_eq!(interpret("").expect("run"), Vec::<HostValue>::new());
    assert_eq!(interpret("// nothing here\n").expect("run"), Vec::<HostValue>::new());
}

#[test]
fn test_parse_error_is_reported() {
    let captured = run_captured("[ 1, 2");
    assert!(matches!(captured.results, Err(PipelineError::Parse(_))));
}

#[test]
fn test_runtime_error_carries_snapshot() {
    let captured = run_captured("1 call! _");
    let Err(PipelineError::Runtime(failure)) = captured.results else {
        panic!("expected a runtime failure");
    };
    assert!(matches!(failure.error, EngineError::Executor(ref m) if m.contains("must be a tape")));
    assert_eq!(failure.snapshot.state, "run.execute_op");
}

#[test]
fn test_unconvertible_result() {
    let captured = run_captured("[ 1 ]");
    assert!(matches!(captured.results, Err(PipelineError::Conversion(_))));
}
