//! Stand-in for the Patito compiler and virtual machine.
//!
//! `patito-stub <file.patito> -c` behaves like the compiler: it rejects
//! sources containing `bad syntax` and otherwise writes `<file>.patitoc`.
//! `patito-stub <file.patitoc>` behaves like the VM: each `print(x)` line
//! prints `x`, and a `fail()` line prints `runtime error` and exits 1.

use std::fs;
use std::path::Path;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.as_slice() {
        [source, flag] if flag == "-c" => compile(Path::new(source)),
        [artifact] => run(Path::new(artifact)),
        _ => {
            eprintln!("usage: patito-stub <source.patito> -c | <artifact.patitoc>");
            ExitCode::from(64)
        }
    }
}

fn compile(source: &Path) -> ExitCode {
    let text = match fs::read_to_string(source) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("cannot read {}: {}", source.display(), e);
            return ExitCode::from(3);
        }
    };

    if text.trim().is_empty() {
        eprintln!("error: empty program");
        return ExitCode::from(2);
    }
    if let Some(n) = text.lines().position(|l| l.contains("bad syntax")) {
        eprintln!("syntax error at line {}", n + 1);
        return ExitCode::from(2);
    }

    let artifact = source.with_extension("patitoc");
    if let Err(e) = fs::write(&artifact, text.as_bytes()) {
        eprintln!("cannot write {}: {}", artifact.display(), e);
        return ExitCode::from(3);
    }
    ExitCode::SUCCESS
}

fn run(artifact: &Path) -> ExitCode {
    let text = match fs::read_to_string(artifact) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("cannot read {}: {}", artifact.display(), e);
            return ExitCode::from(3);
        }
    };

    for line in text.lines().map(str::trim) {
        if line == "fail()" {
            println!("runtime error");
            return ExitCode::from(1);
        }
        if let Some(arg) = line.strip_prefix("print(").and_then(|l| l.strip_suffix(')')) {
            println!("{}", arg.trim_matches('"'));
        }
    }
    ExitCode::SUCCESS
}
