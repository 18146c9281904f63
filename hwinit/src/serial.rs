//! Console collaborator.
//!
//! The boot image owns the Z8530 console driver; everything below it only
//! needs to push one diagnostic line at a time. No buffering, no return
//! status: a lost console line never changes a boot decision.

/// Line-oriented diagnostic output.
pub trait Console {
    /// Emit one line. Implementations append the line terminator.
    fn puts(&self, line: &str);
}

impl<C: Console + ?Sized> Console for &C {
    #[inline]
    fn puts(&self, line: &str) {
        (**self).puts(line)
    }
}

/// Console that drops everything (headless bring-up, tests).
#[derive(Debug, Clone, Copy, Default)]
pub struct NullConsole;

impl Console for NullConsole {
    #[inline]
    fn puts(&self, _line: &str) {}
}
