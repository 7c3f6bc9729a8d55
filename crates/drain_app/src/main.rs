mod logging;

use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use drain_engine::{ExportSummary, CONFIG_FILENAME};
use drain_logging::drain_warn;

fn main() -> ExitCode {
    logging::initialize();

    let result = locate_base_dir().and_then(|base_dir| {
        let runtime = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
        Ok(runtime.block_on(drain_engine::run(&base_dir)))
    });

    match result {
        Ok(Ok(summary)) => ExitCode::from(exit_status(&summary)),
        Ok(Err(err)) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

/// Directory holding `_drain.yml`: the working directory when it has one,
/// otherwise the directory of the executable.
fn locate_base_dir() -> anyhow::Result<PathBuf> {
    let cwd = env::current_dir().context("cannot determine working directory")?;
    let exe = env::current_exe().context("cannot determine executable path")?;
    Ok(choose_base_dir(&cwd, exe.parent()))
}

fn choose_base_dir(cwd: &Path, exe_dir: Option<&Path>) -> PathBuf {
    if cwd.join(CONFIG_FILENAME).is_file() {
        return cwd.to_path_buf();
    }
    exe_dir.unwrap_or(cwd).to_path_buf()
}

/// `0` when every broadcast was written or skipped, `2` when some failed.
fn exit_status(summary: &ExportSummary) -> u8 {
    if summary.failed() > 0 {
        drain_warn!("{} broadcasts could not be written", summary.failed());
        2
    } else {
        0
    }
}
