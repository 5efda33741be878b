use checkscope::config::InvocationArguments;
use checkscope::debug::{debug_run, Debugger};
use checkscope::routine::{FnRoutine, RoutineKind, RoutineOutput, RoutineSpec, TypeTag};
use serde_json::json;
use std::io::Cursor;

fn execute_debugger(
    commands: &str,
    routine: &FnRoutine<impl Fn(&InvocationArguments) -> Result<RoutineOutput, checkscope::domain::RoutineFailure>>,
    args: &InvocationArguments,
) -> (Vec<serde_json::Value>, String) {
    let mut session = Debugger::new(Cursor::new(commands.as_bytes().to_vec()), Vec::new());
    let result = debug_run(routine, args, &mut session).unwrap();
    (result, String::from_utf8(session.into_output()).unwrap())
}

#[test]
fn test_lazy_run_yields_in_order_under_stepping() {
    let spec = RoutineSpec::new("StreamCheck", RoutineKind::WholeRun);
    let routine = FnRoutine::new(spec, |_args| {
        Ok(RoutineOutput::lazy(
            vec![Ok(json!(1)), Ok(json!(2)), Ok(json!(3))].into_iter(),
        ))
    });

    // Three resumes: quit, continue, quit.
    let (result, output) = execute_debugger("quit\ncontinue\nquit\n", &routine, &InvocationArguments::new());

    assert_eq!(result, vec![json!(1), json!(2), json!(3)]);
    let yields: Vec<&str> = output
        .lines()
        .filter(|line| line.contains("-> yield"))
        .collect();
    assert_eq!(yields.len(), 3);
    assert!(yields[0].ends_with("-> yield 1"));
    assert!(yields[1].ends_with("-> yield 2"));
    assert!(yields[2].ends_with("-> yield 3"));
}

#[test]
fn test_eager_run_observes_return_once() {
    let spec = RoutineSpec::new("ListCheck", RoutineKind::WholeRun);
    let routine =
        FnRoutine::new(spec, |_args| Ok(RoutineOutput::Eager(vec![json!(1), json!(2)])));

    let (result, output) = execute_debugger("q\n", &routine, &InvocationArguments::new());

    assert_eq!(result, vec![json!(1), json!(2)]);
    assert_eq!(output.matches("-> return").count(), 1);
}

#[test]
fn test_settings_shows_bound_values_then_defaults() {
    let spec = RoutineSpec::new("TestOne", RoutineKind::FileScoped)
        .with_param("x", Some(TypeTag::Int))
        .with_param("y", Some(TypeTag::Str))
        .with_optional_param("z", 79i64, Some(TypeTag::Int))
        .with_optional_param("w", "kbc", Some(TypeTag::Str));
    let routine = FnRoutine::new(spec, |_args| {
        Ok(RoutineOutput::lazy(vec![Ok(json!(1)), Ok(json!(2))].into_iter()))
    });
    let mut args = InvocationArguments::new();
    args.set("x", checkscope::settings::SettingValue::Int(2));
    args.set("y", checkscope::settings::SettingValue::from("abc"));

    let (result, output) = execute_debugger("settings\nq\nc\nq\n", &routine, &args);

    assert_eq!(result, vec![json!(1), json!(2)]);
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines[2], "(dbg) x = 2");
    assert_eq!(lines[3], "y = 'abc'");
    assert_eq!(lines[4], "z = 79");
    assert_eq!(lines[5], "w = 'kbc'");
}
