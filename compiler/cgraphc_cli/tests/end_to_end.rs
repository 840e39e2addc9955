//! Integration tests driving `cgraphc` end-to-end through the toy text front-end's public
//! `run` entry point, covering reachability, reclamation, and emission-ordering scenarios:
//! simple call chains, address-taken functions, COMDAT candidates, forced-output variables,
//! local statics, and static destructors.

use cgraphc::DriverConfig;
use cgraphc_cli::run;

#[test]
fn simple_chain_with_orphan_is_reclaimed() {
    let src = "\
fn main pub {
    call a
}
fn a {
    call b
}
fn b {
    call c
}
fn c {
}
fn d {
}
";
    let report = run(src, DriverConfig::whole_unit()).unwrap();
    for name in ["main", "a", "b", "c"] {
        assert!(
            report.surviving_functions.contains(&name.to_string()),
            "{name} should survive"
        );
    }
    assert!(!report.surviving_functions.contains(&"d".to_string()));
    assert_eq!(report.emission_order.last(), Some(&"main".to_string()));
}

#[test]
fn variable_initializer_keeps_addressed_function_alive() {
    let src = "\
fn main pub {
}
fn f {
}
var v = addr f
";
    let report = run(src, DriverConfig::whole_unit()).unwrap();
    assert!(report.surviving_functions.contains(&"f".to_string()));
    assert!(report.emission_order.contains(&"f".to_string()));
}

#[test]
fn comdat_function_with_a_caller_survives() {
    let src = "\
fn main pub {
    call t
}
fn t comdat {
}
";
    let report = run(src, DriverConfig::whole_unit()).unwrap();
    assert!(report.surviving_functions.contains(&"t".to_string()));
}

#[test]
fn comdat_function_without_a_caller_is_reclaimed() {
    let src = "\
fn main pub {
}
fn t comdat {
}
";
    let report = run(src, DriverConfig::whole_unit()).unwrap();
    assert!(!report.surviving_functions.contains(&"t".to_string()));
}

#[test]
fn force_output_variable_survives_without_being_referenced() {
    let src = "\
fn main pub {
}
var unused force_output {
}
";
    let report = run(src, DriverConfig::whole_unit()).unwrap();
    assert!(report.surviving_variables.contains(&"unused".to_string()));
}

#[test]
fn local_static_initializer_is_discovered_transitively() {
    let src = "\
fn main pub {
    static cache = addr helper
}
fn helper {
}
";
    let report = run(src, DriverConfig::whole_unit()).unwrap();
    assert!(report.surviving_functions.contains(&"helper".to_string()));
    assert!(report.emission_order.contains(&"helper".to_string()));
}

#[test]
fn destructor_is_reachable_without_any_caller() {
    let src = "\
fn main pub {
}
dtor 200 {
    call teardown
}
fn teardown {
}
";
    let report = run(src, DriverConfig::whole_unit()).unwrap();
    assert!(report.emission_order.iter().any(|n| n == "teardown"));
}

#[test]
fn streaming_mode_keeps_uninlinable_static_function_alive() {
    // Streaming mode's more conservative neededness test: a static function is
    // needed even when otherwise uncalled, since there is no later whole-unit sweep.
    let src = "\
fn standalone {
}
";
    let report = run(src, DriverConfig::streaming()).unwrap();
    assert!(report.surviving_functions.contains(&"standalone".to_string()));
}

#[test]
fn whole_program_mode_still_reclaims_dead_code() {
    let src = "\
fn main pub {
}
fn unused {
}
";
    let report = run(src, DriverConfig::whole_unit().with_whole_program(true)).unwrap();
    assert!(!report.surviving_functions.contains(&"unused".to_string()));
}
