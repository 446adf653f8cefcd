#![allow(dead_code)]

pub use gitvisor_test_utils::builders;
pub use gitvisor_test_utils::scripted_repo;
pub use gitvisor_test_utils::{init_tracing, with_timeout};

use std::path::Path;
use std::time::Duration;

/// Wait until `path` exists and holds a parseable pid.
pub async fn wait_for_pid(path: &Path) -> u32 {
    for _ in 0..500 {
        if let Ok(s) = std::fs::read_to_string(path) {
            if let Ok(pid) = s.trim().parse() {
                return pid;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("pid file {} never appeared", path.display());
}

/// True if a process with this pid still exists.
#[cfg(unix)]
pub fn process_alive(pid: u32) -> bool {
    use nix::errno::Errno;
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    matches!(kill(Pid::from_raw(pid as i32), None), Ok(()) | Err(Errno::EPERM))
}
