use std::borrow::Cow;

/// The placeholder replaced by the interpreter's process ID.
pub(super) const PID_MARKER: &str = "$$";

/// Replace every occurrence of [`PID_MARKER`] in `line` with `pid`.
///
/// Occurrences are matched left to right without overlapping, so `$$$` becomes `<pid>$`. A line
/// without the marker is returned as is.
pub(super) fn expand_pid<'a>(line: &'a str, pid: &str) -> Cow<'a, str> {
    if line.contains(PID_MARKER) {
        Cow::Owned(line.replace(PID_MARKER, pid))
    } else {
        Cow::Borrowed(line)
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use super::{expand_pid, PID_MARKER};

    #[test]
    fn no_marker_is_untouched() {
        let expanded = expand_pid("echo hello $HOME", "4242");
        assert!(matches!(expanded, Cow::Borrowed("echo hello $HOME")));
    }

    #[test]
    fn every_occurrence_is_replaced() {
        assert_eq!(expand_pid("echo $$", "4242"), "echo 4242");
        assert_eq!(expand_pid("$$ $$$$x", "17"), "17 1717x");
        assert_eq!(expand_pid("a$$b$$c", "123456"), "a123456b123456c");
    }

    #[test]
    fn odd_dollars_leave_a_remainder() {
        assert_eq!(expand_pid("$$$", "9"), "9$");
        assert_eq!(expand_pid("$ $", "9"), "$ $");
    }

    #[test]
    fn lengthening_keeps_trailing_text() {
        let line = format!("touch file{PID_MARKER}.txt > out{PID_MARKER} &");
        let expanded = expand_pid(&line, "1234567");
        assert_eq!(expanded, "touch file1234567.txt > out1234567 &");
        assert_eq!(expanded.matches("1234567").count(), 2);
        assert!(!expanded.contains(PID_MARKER));
    }
}
