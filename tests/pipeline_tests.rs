mod common;

use common::*;
use patito_shell::output::OutputLog;
use patito_shell::pipeline::{BuildError, BuildOutcome, BuildRequest, Stage, Tool};
use patito_shell::process::ProcessResult;
use std::sync::Arc;

fn position(log: &OutputLog, needle: &str) -> usize {
    log.lines()
        .iter()
        .position(|l| l.contains(needle))
        .unwrap_or_else(|| panic!("{:?} not in log:\n{}", needle, log.text()))
}

#[cfg(test)]
mod scenario_tests {
    use super::*;

    #[test]
    fn test_compile_only_success() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ScriptedRunner::new(vec![ProcessResult::new("", 0)]);
        let pipeline = pipeline_in(dir.path(), runner.clone(), FixedTools::both());

        let mut log = OutputLog::new();
        let outcome = pipeline.execute(&BuildRequest::compile("print(1)"), &mut log);

        assert!(outcome.is_success());
        assert!(log.contains("Compiling"));
        assert!(log.contains("Compilation succeeded."));
        assert!(!log.contains("Running"));
        assert_eq!(runner.calls().len(), 1);
        assert_eq!(runner.vm_calls(), 0);
    }

    #[test]
    fn test_compile_failure_skips_vm() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ScriptedRunner::new(vec![ProcessResult::from_streams(
            "",
            "syntax error at line 1",
            2,
        )]);
        let pipeline = pipeline_in(dir.path(), runner.clone(), FixedTools::both());

        let mut log = OutputLog::new();
        let outcome = pipeline.execute(&BuildRequest::compile_and_run("bad syntax"), &mut log);

        assert!(log.contains("syntax error at line 1"));
        assert!(log.contains("Compilation failed (exit code 2)"));
        assert!(matches!(
            outcome.error(),
            Some(BuildError::NonZeroExit {
                stage: Stage::Compile,
                code: 2
            })
        ));
        assert_eq!(runner.vm_calls(), 0);
        assert!(!log.contains("Running"));
    }

    #[test]
    fn test_runtime_failure_reported_after_output() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ScriptedRunner::new(vec![
            ProcessResult::new("", 0),
            ProcessResult::from_streams("runtime error", "", 1),
        ]);
        let pipeline = pipeline_in(dir.path(), runner.clone(), FixedTools::both());

        let mut log = OutputLog::new();
        let outcome = pipeline.execute(&BuildRequest::compile_and_run("fail()"), &mut log);

        assert_eq!(outcome.error().and_then(BuildError::exit_code), Some(1));
        let compiled = position(&log, "Compilation succeeded.");
        let running = position(&log, "Running");
        let output = position(&log, "runtime error");
        let failed = position(&log, "Execution failed (exit code 1)");
        assert!(compiled < running && running < output && output < failed);
    }

    #[test]
    fn test_missing_compiler_launches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ScriptedRunner::new(vec![]);
        let tools = Arc::new(FixedTools {
            compiler: false,
            vm: true,
        });
        let pipeline = pipeline_in(dir.path(), runner.clone(), tools);

        let mut log = OutputLog::new();
        let outcome = pipeline.execute(&BuildRequest::compile_and_run("print(1)"), &mut log);

        assert!(log.contains("Tool not found: compiler"));
        assert!(matches!(
            outcome,
            BuildOutcome::Failed(BuildError::ToolNotFound {
                tool: Tool::Compiler,
                ..
            })
        ));
        assert!(runner.calls().is_empty());
        assert!(dir_is_empty(dir.path()));
    }

    #[test]
    fn test_missing_vm_after_successful_compile() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ScriptedRunner::new(vec![ProcessResult::new("", 0)]);
        let tools = Arc::new(FixedTools {
            compiler: true,
            vm: false,
        });
        let pipeline = pipeline_in(dir.path(), runner.clone(), tools);

        let mut log = OutputLog::new();
        let outcome = pipeline.execute(&BuildRequest::compile_and_run("print(1)"), &mut log);

        assert!(log.contains("Compilation succeeded."));
        assert!(log.contains("Tool not found: virtual machine"));
        assert!(!outcome.is_success());
        assert_eq!(runner.calls().len(), 1);
        assert!(dir_is_empty(dir.path()));
    }

    #[test]
    fn test_compile_and_run_success() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ScriptedRunner::new(vec![
            ProcessResult::new("", 0),
            ProcessResult::new("1\n", 0),
        ]);
        let pipeline = pipeline_in(dir.path(), runner.clone(), FixedTools::both());

        let mut log = OutputLog::new();
        let outcome = pipeline.execute(&BuildRequest::compile_and_run("print(1)"), &mut log);

        assert!(outcome.is_success());
        assert_eq!(
            log.lines().last().map(String::as_str),
            Some("Execution finished.")
        );
        assert!(log.lines().iter().any(|l| l == "1"));
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;

    #[test]
    fn test_staged_bytes_seen_by_compiler() {
        let texts = ["", "print(1)", "línea uno\r\nlínea dos\n", "\u{1F986} pato\n\n"];
        for text in texts {
            let dir = tempfile::tempdir().unwrap();
            let runner = ScriptedRunner::new(vec![]);
            let pipeline = pipeline_in(dir.path(), runner.clone(), FixedTools::both());

            pipeline.execute(&BuildRequest::compile(text), &mut OutputLog::new());

            let calls = runner.calls();
            assert_eq!(calls.len(), 1);
            assert!(calls[0].is_compiler());
            assert_eq!(calls[0].file_text.as_deref(), Some(text));
            assert_eq!(calls[0].args[1], "-c");
        }
    }

    #[test]
    fn test_vm_gets_artifact_derived_from_source() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ScriptedRunner::new(vec![]);
        let pipeline = pipeline_in(dir.path(), runner.clone(), FixedTools::both());

        pipeline.execute(&BuildRequest::compile_and_run("print(1)"), &mut OutputLog::new());

        let calls = runner.calls();
        assert_eq!(calls.len(), 2);
        let source = calls[0].first_arg();
        let artifact = calls[1].first_arg();
        assert!(calls[1].is_vm());
        assert_eq!(source.extension().unwrap(), "patito");
        assert_eq!(artifact, source.with_extension("patitoc"));
        assert_eq!(calls[1].file_text.as_deref(), Some("artifact"));
    }

    #[test]
    fn test_vm_never_runs_when_not_requested() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ScriptedRunner::new(vec![]);
        let pipeline = pipeline_in(dir.path(), runner.clone(), FixedTools::both());

        let outcome = pipeline.execute(&BuildRequest::compile("print(1)"), &mut OutputLog::new());

        assert!(outcome.is_success());
        assert_eq!(runner.vm_calls(), 0);
    }

    #[test]
    fn test_cleanup_after_every_terminal_state() {
        let cases = vec![
            (vec![ProcessResult::new("", 0)], false),
            (vec![ProcessResult::new("", 0), ProcessResult::new("", 0)], true),
            (vec![ProcessResult::new("boom", 1)], true),
            (vec![ProcessResult::new("", 0), ProcessResult::new("", 7)], true),
            (vec![ProcessResult::launch_failure("permission denied")], true),
        ];

        for (responses, run) in cases {
            let dir = tempfile::tempdir().unwrap();
            let runner = ScriptedRunner::new(responses);
            let pipeline = pipeline_in(dir.path(), runner.clone(), FixedTools::both());
            let request = BuildRequest {
                source_text: "print(1)".to_string(),
                run_after_compile: run,
            };

            pipeline.execute(&request, &mut OutputLog::new());

            let source = runner.calls()[0].first_arg();
            assert!(!source.exists());
            assert!(!source.with_extension("patitoc").exists());
            assert!(dir_is_empty(dir.path()));
        }
    }

    #[test]
    fn test_cleanup_failure_keeps_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ScriptedRunner::with_directory_artifact(vec![ProcessResult::new("", 0)]);
        let pipeline = pipeline_in(dir.path(), runner.clone(), FixedTools::both());

        let mut log = OutputLog::new();
        let outcome = pipeline.execute(&BuildRequest::compile("print(1)"), &mut log);

        assert!(matches!(outcome, BuildOutcome::Succeeded));
        assert_eq!(
            log.lines().last().map(String::as_str),
            Some("Compilation succeeded.")
        );
        let source = runner.calls()[0].first_arg();
        assert!(!source.exists());
        assert!(source.with_extension("patitoc").is_dir());
    }

    #[test]
    fn test_log_cleared_at_start_of_run() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ScriptedRunner::new(vec![ProcessResult::new("", 3)]);
        let pipeline = pipeline_in(dir.path(), runner, FixedTools::both());

        let mut log = OutputLog::new();
        log.append("left over from the previous run");
        pipeline.execute(&BuildRequest::compile("x"), &mut log);

        assert!(!log.contains("left over"));
        assert!(log.lines()[0].starts_with("Compiling patito-"));
        assert!(log.contains("Compilation failed (exit code 3)"));
    }

    #[test]
    fn test_launch_failure_reported_distinctly() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ScriptedRunner::new(vec![ProcessResult::launch_failure(
            "Permission denied (os error 13)",
        )]);
        let pipeline = pipeline_in(dir.path(), runner, FixedTools::both());

        let mut log = OutputLog::new();
        let outcome = pipeline.execute(&BuildRequest::compile("x"), &mut log);

        assert!(log.contains("Could not launch compiler: Permission denied"));
        assert!(!log.contains("exit code"));
        assert!(matches!(
            outcome.error(),
            Some(BuildError::LaunchFailure {
                tool: Tool::Compiler,
                ..
            })
        ));
    }

    #[test]
    fn test_staging_failure_stops_before_compiler() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gone");
        let runner = ScriptedRunner::new(vec![]);
        let pipeline = pipeline_in(&missing, runner.clone(), FixedTools::both());

        let mut log = OutputLog::new();
        let outcome = pipeline.execute(&BuildRequest::compile("x"), &mut log);

        assert!(matches!(outcome.error(), Some(BuildError::Staging(_))));
        assert!(log.contains("Could not stage source file"));
        assert!(runner.calls().is_empty());
    }
}
