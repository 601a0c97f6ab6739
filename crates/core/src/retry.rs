use std::io::{self, ErrorKind};
use std::path::Path;
use std::thread;
use std::time::Duration;

/// 有界重试策略（线性退避）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 总尝试次数（含第一次）
    pub attempts: u32,
    /// 第 n 次重试前等待 `backoff * n`
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff: Duration::from_millis(25),
        }
    }
}

impl RetryPolicy {
    pub fn no_retry() -> Self {
        Self {
            attempts: 1,
            backoff: Duration::ZERO,
        }
    }

    /// 执行 `op`，遇到瞬时错误时重试，其余错误立即返回
    pub fn run<T>(&self, mut op: impl FnMut() -> io::Result<T>) -> io::Result<T> {
        let attempts = self.attempts.max(1);
        let mut attempt = 1;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(err) if attempt < attempts && is_transient(&err) => {
                    tracing::debug!(attempt, error = %err, "transient io error, retrying");
                    thread::sleep(self.backoff * attempt);
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

fn is_transient(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::Interrupted
            | ErrorKind::WouldBlock
            | ErrorKind::PermissionDenied
            | ErrorKind::TimedOut
    )
}

/// 读取文本文件；编辑器保存过程中的短暂失败会被重试
pub fn read_to_string_with_retry(path: &Path, policy: RetryPolicy) -> io::Result<String> {
    policy.run(|| std::fs::read_to_string(path))
}
