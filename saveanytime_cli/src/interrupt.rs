use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};

use saveanytime::Outcome;

pub(crate) const EXIT_PROMPT: &str = "Press Enter to exit.";

static INTERRUPTED: AtomicBool = AtomicBool::new(false);
static ACKNOWLEDGED: AtomicBool = AtomicBool::new(false);

/// Ctrl-C marks the run interrupted and shows the exit prompt right away, since the main thread
/// may be blocked reading stdin. A second Ctrl-C exits immediately.
pub(crate) fn install() -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(|| {
        if INTERRUPTED.swap(true, Ordering::SeqCst) {
            std::process::exit(Outcome::Interrupted.exit_code());
        }
        let mut stdout = io::stdout();
        let _ = write!(stdout, "\n{EXIT_PROMPT}");
        let _ = stdout.flush();
    })
}

pub(crate) fn interrupted() -> bool {
    INTERRUPTED.load(Ordering::SeqCst)
}

/// Record that the operator answered the exit prompt shown by the handler.
pub(crate) fn acknowledge() {
    ACKNOWLEDGED.store(true, Ordering::SeqCst);
}

pub(crate) fn acknowledged() -> bool {
    ACKNOWLEDGED.load(Ordering::SeqCst)
}
