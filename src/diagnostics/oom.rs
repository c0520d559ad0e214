//! Out-of-memory heuristics for compiler failures.
//!
//! Link-time optimisation of a large onefile build can exhaust memory; the
//! kernel then kills the C compiler and the failure looks unrelated.

/// Exit code a shell reports for a child killed with SIGKILL.
const SIGKILL_EXIT_CODE: i32 = 137;

/// What the executor records when the compiler itself was SIGKILLed.
const SIGKILL_NOTE: &str = "compiler terminated by signal 9";

const OOM_MARKERS: &[&str] = &[
    "out of memory",
    "cannot allocate memory",
    "memoryerror",
    "killed signal terminated program",
    "oom-kill",
];

/// Whether a failed build looks like it ran out of memory.
pub fn looks_like_oom(exit_code: i32, stderr: &str) -> bool {
    if exit_code == SIGKILL_EXIT_CODE {
        return true;
    }
    if stderr.lines().any(|line| line == SIGKILL_NOTE) {
        return true;
    }
    let lower = stderr.to_lowercase();
    OOM_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Operator advice for an out-of-memory build, including host memory.
pub fn oom_hint() -> String {
    let mut sys = sysinfo::System::new();
    sys.refresh_memory();
    let total_memory_gb = sys.total_memory() / 1024 / 1024 / 1024;

    format!(
        "The compiler appears to have run out of memory.\n\
         \n\
         Link-time optimisation of a onefile build needs a lot of RAM. Try:\n\
         • Closing other memory-hungry processes\n\
         • Adding swap space\n\
         • Building on a machine with more memory\n\
         \n\
         Host memory: {total_memory_gb} GB total"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sigkill_exit_code_is_oom() {
        assert!(looks_like_oom(137, ""));
    }

    #[test]
    fn sigkilled_compiler_is_oom() {
        let stderr = format!("partial output\n{} 9\n", crate::compiler::TERMINATED_BY_SIGNAL);
        assert!(looks_like_oom(1, &stderr));
        assert!(!looks_like_oom(1, "compiler terminated by signal 15\n"));
    }

    #[test]
    fn stderr_markers_are_case_insensitive() {
        assert!(looks_like_oom(1, "clang: error: unable to execute command: Killed signal terminated program clang"));
        assert!(looks_like_oom(1, "fatal: Out of memory"));
        assert!(!looks_like_oom(1, "SyntaxError: invalid syntax"));
    }
}
