// Boot log ring for irisboot

use spin::Mutex;

const MAX_LOG_ENTRIES: usize = 64;

struct LogRing {
    entries: [Option<&'static str>; MAX_LOG_ENTRIES],
    next: usize,
    total: usize,
}

impl LogRing {
    const fn new() -> Self {
        Self {
            entries: [None; MAX_LOG_ENTRIES],
            next: 0,
            total: 0,
        }
    }

    fn push(&mut self, message: &'static str) {
        self.entries[self.next] = Some(message);
        self.next = (self.next + 1) % MAX_LOG_ENTRIES;
        self.total = self.total.wrapping_add(1);
    }

    fn for_each<F: FnMut(&'static str)>(&self, mut f: F) {
        let (newer, older) = self.entries.split_at(self.next);
        for msg in older.iter().chain(newer.iter()).flatten() {
            f(msg);
        }
    }

    fn contains(&self, message: &str) -> bool {
        let mut found = false;
        self.for_each(|m| found |= m == message);
        found
    }
}

static LOG: Mutex<LogRing> = Mutex::new(LogRing::new());

/// Record a message. The oldest entry is overwritten once the ring is full.
pub fn log(message: &'static str) {
    LOG.lock().push(message);
}

/// Visit retained entries, oldest first.
pub fn for_each_log<F: FnMut(&'static str)>(f: F) {
    LOG.lock().for_each(f);
}

/// Is `message` among the retained entries?
pub fn contains(message: &str) -> bool {
    LOG.lock().contains(message)
}

/// Messages logged since boot (including overwritten ones).
pub fn log_count() -> usize {
    LOG.lock().total
}

// Macro for easier logging
#[macro_export]
macro_rules! log_info {
    ($msg:expr) => {
        $crate::logger::log($msg)
    };
}

/// Log a message and echo it to the boot console.
#[macro_export]
macro_rules! diag {
    ($console:expr, $msg:expr) => {{
        $crate::logger::log($msg);
        $crate::hwinit::Console::puts(&$console, $msg);
    }};
}
