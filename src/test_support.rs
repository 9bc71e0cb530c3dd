use crate::events::NullSink;
use crate::locks::{LockMode, LockRegion, driver};
use crate::restore::{RestoreTask, restore};
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

// POSIX record locks never conflict within one process, so a "foreign"
// holder has to be a separate process. The test binary re-runs itself with
// only `foreign_lock_holder_entry` selected and these variables set.
const HOLDER_PATH_ENV: &str = "SQLITE3_RESTORE_HOLDER_PATH";
const HOLDER_LOCKS_ENV: &str = "SQLITE3_RESTORE_HOLDER_LOCKS";
const HOLDER_ACTION_ENV: &str = "SQLITE3_RESTORE_HOLDER_ACTION";
const HOLDER_SOURCE_ENV: &str = "SQLITE3_RESTORE_HOLDER_SOURCE";
const HOLDER_TEST: &str = "test_support::foreign_lock_holder_entry";

const HOLDING_MARK: &str = "@@HOLDING@@";
const FREE_MARK: &str = "@@FREE@@";
const BUSY_MARK: &str = "@@BUSY:";
const RESTORED_MARK: &str = "@@RESTORED@@";
const FAILED_MARK: &str = "@@FAILED:";

/// Another process holding byte-range locks on a file.
pub(crate) struct ForeignHolder {
    child: Child,
    stdin: Option<ChildStdin>,
    _stdout: BufReader<ChildStdout>,
}

impl ForeignHolder {
    /// Start a process that takes every lock in `locks` on `path` and keeps
    /// them until [`ForeignHolder::release`] (or drop).
    pub(crate) fn hold(path: &Path, locks: &[(LockRegion, LockMode)]) -> Self {
        let mut child = spawn(holder_command(path, locks, "hold").stdin(Stdio::piped()));
        let stdin = child.stdin.take();
        let mut stdout = BufReader::new(child.stdout.take().unwrap());

        let marker = read_marker(&mut stdout);
        assert_eq!(
            marker, HOLDING_MARK,
            "foreign holder could not take its locks on {}",
            path.display()
        );

        Self {
            child,
            stdin,
            _stdout: stdout,
        }
    }

    pub(crate) fn pid(&self) -> i32 {
        self.child.id() as i32
    }

    /// Let the holder exit, dropping its locks, and wait for it.
    pub(crate) fn release(mut self) {
        drop(self.stdin.take());
        let _ = self.child.wait();
    }
}

impl Drop for ForeignHolder {
    fn drop(&mut self) {
        drop(self.stdin.take());
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// From a separate process, try to take every lock in `locks` on `path`.
///
/// Returns the name of the first region that is busy, or `None` if all of
/// them were free.
pub(crate) fn probe_from_other_process(
    path: &Path,
    locks: &[(LockRegion, LockMode)],
) -> Option<String> {
    let mut child = spawn(holder_command(path, locks, "probe").stdin(Stdio::null()));
    let mut stdout = BufReader::new(child.stdout.take().unwrap());
    let marker = read_marker(&mut stdout);
    let _ = child.wait();

    if marker == FREE_MARK {
        None
    } else {
        Some(
            marker
                .trim_start_matches(BUSY_MARK)
                .trim_end_matches("@@")
                .to_string(),
        )
    }
}

/// A full restore of `source` over `destination` running in another process.
pub(crate) struct RestoreChild {
    child: Child,
    stdout: BufReader<ChildStdout>,
}

impl RestoreChild {
    pub(crate) fn spawn(source: &Path, destination: &Path) -> Self {
        let mut child = spawn(
            holder_command(destination, &[], "restore")
                .env(HOLDER_SOURCE_ENV, source)
                .stdin(Stdio::null()),
        );
        let stdout = BufReader::new(child.stdout.take().unwrap());
        Self { child, stdout }
    }

    /// Wait for the restore to finish. `Err` carries its error message.
    pub(crate) fn wait(mut self) -> Result<(), String> {
        let marker = read_marker(&mut self.stdout);
        let _ = self.child.wait();
        if marker == RESTORED_MARK {
            Ok(())
        } else {
            Err(marker
                .trim_start_matches(FAILED_MARK)
                .trim_end_matches("@@")
                .to_string())
        }
    }
}

impl Drop for RestoreChild {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Every region of both catalogs, exclusively.
pub(crate) fn all_exclusive(regions: &[LockRegion]) -> Vec<(LockRegion, LockMode)> {
    regions.iter().map(|r| (*r, LockMode::Exclusive)).collect()
}

fn holder_command(path: &Path, locks: &[(LockRegion, LockMode)], action: &str) -> Command {
    let mut command = Command::new(std::env::current_exe().unwrap());
    command
        .args([
            "--exact",
            HOLDER_TEST,
            "--ignored",
            "--nocapture",
            "--test-threads=1",
        ])
        .env(HOLDER_PATH_ENV, path)
        .env(HOLDER_LOCKS_ENV, encode_locks(locks))
        .env(HOLDER_ACTION_ENV, action)
        .stdout(Stdio::piped())
        .stderr(Stdio::null());
    command
}

fn spawn(command: &mut Command) -> Child {
    command
        .spawn()
        .unwrap_or_else(|e| panic!("failed to spawn foreign lock holder: {}", e))
}

fn read_marker(stdout: &mut BufReader<ChildStdout>) -> String {
    let mut line = String::new();
    loop {
        line.clear();
        let n = stdout.read_line(&mut line).unwrap();
        assert!(n > 0, "foreign lock holder exited without reporting");
        for mark in [HOLDING_MARK, FREE_MARK, BUSY_MARK, RESTORED_MARK, FAILED_MARK] {
            if let Some(at) = line.find(mark) {
                return line[at..].trim().to_string();
            }
        }
    }
}

fn encode_locks(locks: &[(LockRegion, LockMode)]) -> String {
    locks
        .iter()
        .map(|(region, mode)| {
            let tag = match mode {
                LockMode::Shared => "s",
                LockMode::Exclusive => "x",
                LockMode::Unlock => "u",
            };
            format!("{}={}", region.name, tag)
        })
        .collect::<Vec<_>>()
        .join(",")
}

fn decode_locks(encoded: &str) -> Vec<(LockRegion, LockMode)> {
    encoded
        .split(',')
        .filter(|s| !s.is_empty())
        .map(|item| {
            let (name, tag) = item.split_once('=').unwrap();
            let region = LockRegion::by_name(name).unwrap();
            let mode = match tag {
                "s" => LockMode::Shared,
                "x" => LockMode::Exclusive,
                _ => LockMode::Unlock,
            };
            (region, mode)
        })
        .collect()
}

/// A 100-byte database header with the given write/read format versions.
pub(crate) fn header(write_version: u8, read_version: u8) -> Vec<u8> {
    let mut header = vec![0u8; 100];
    header[..16].copy_from_slice(b"SQLite format 3\0");
    // 4096-byte pages, big-endian.
    header[16] = 0x10;
    header[17] = 0x00;
    header[18] = write_version;
    header[19] = read_version;
    header
}

/// A database image of `pages` 4 KiB pages whose header carries `version`
/// in both format bytes, with each page filled with a distinct byte.
pub(crate) fn database_image(version: u8, pages: usize, fill: u8) -> Vec<u8> {
    let mut image = vec![0u8; pages * 4096];
    for (i, page) in image.chunks_mut(4096).enumerate() {
        page.fill(fill.wrapping_add(i as u8));
    }
    if !image.is_empty() {
        image[..100].copy_from_slice(&header(version, version));
    }
    image
}

#[test]
#[ignore = "child-process entry point, run by ForeignHolder and RestoreChild"]
fn foreign_lock_holder_entry() {
    let Ok(path) = std::env::var(HOLDER_PATH_ENV) else {
        return;
    };
    let locks = decode_locks(&std::env::var(HOLDER_LOCKS_ENV).unwrap_or_default());
    let action = std::env::var(HOLDER_ACTION_ENV).unwrap_or_default();
    let mut out = std::io::stdout();

    if action == "restore" {
        // No other handle to the destination may be opened in this process.
        let source = std::env::var(HOLDER_SOURCE_ENV).unwrap();
        let task = RestoreTask::new(source, &path);
        match restore(&task, &task.cancellation(), &NullSink) {
            Ok(_) => writeln!(out, "{}", RESTORED_MARK).unwrap(),
            Err(e) => writeln!(out, "{}{}@@", FAILED_MARK, e).unwrap(),
        }
        out.flush().unwrap();
        return;
    }

    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(&path)
        .unwrap();

    for (region, mode) in &locks {
        if !driver::try_lock(&file, region, *mode).unwrap() {
            writeln!(out, "{}{}@@", BUSY_MARK, region.name).unwrap();
            out.flush().unwrap();
            return;
        }
    }

    if action == "hold" {
        writeln!(out, "{}", HOLDING_MARK).unwrap();
        out.flush().unwrap();
        // Hold until the parent closes our stdin.
        let mut rest = Vec::new();
        let _ = std::io::stdin().read_to_end(&mut rest);
    } else {
        writeln!(out, "{}", FREE_MARK).unwrap();
        out.flush().unwrap();
    }
}
