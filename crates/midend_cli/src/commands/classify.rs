//! Classify command implementation.

use midend_core::{is_of_base, Phase};

/// Runs the classify command.
pub fn run(types: &[String], base: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    for kind in types {
        println!("{}", describe(kind, base));
    }
    Ok(())
}

/// One output line for `kind`.
pub fn describe(kind: &str, base: Option<&str>) -> String {
    let phase = match Phase::of(kind) {
        Some(Phase::Begin) => "begin",
        Some(Phase::Success) => "success",
        Some(Phase::Fail) => "fail",
        None => "-",
    };
    match base {
        Some(base) => format!("{kind}\t{phase}\t{}", is_of_base(kind, base)),
        None => format!("{kind}\t{phase}"),
    }
}
