//! A text field with change watchers, and the watcher that keeps it formatted as money.
use std::fmt;

/// A replacement for the text of a [`TextField`], produced by a [`TextWatcher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub text: String,
    /// Cursor position, in characters.
    pub cursor: usize,
}

/// Observes the text of a [`TextField`] after every change.
pub trait TextWatcher: Send {
    fn after_text_changed(&mut self, text: &str) -> Option<Rewrite>;
}

/// Handle returned by [`TextField::add_watcher`], used to remove the watcher again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatcherRegistration(u64);

/// An editable text with a cursor and the watchers attached to it.
#[derive(Default)]
pub struct TextField {
    text: String,
    cursor: usize,
    watchers: Vec<(WatcherRegistration, Box<dyn TextWatcher>)>,
    next_id: u64,
}

impl fmt::Debug for TextField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextField")
            .field("text", &self.text)
            .field("cursor", &self.cursor)
            .field("watchers", &self.watchers.len())
            .finish()
    }
}

impl TextField {
    pub fn text(&self) -> &str {
        &self.text
    }
    pub fn cursor(&self) -> usize {
        self.cursor
    }
    pub fn add_watcher(&mut self, watcher: impl TextWatcher + 'static) -> WatcherRegistration {
        let registration = WatcherRegistration(self.next_id);
        self.next_id += 1;
        self.watchers.push((registration, Box::new(watcher)));
        registration
    }
    /// Returns `false` if the watcher was not attached.
    pub fn remove_watcher(&mut self, registration: WatcherRegistration) -> bool {
        let len = self.watchers.len();
        self.watchers.retain(|(r, _)| *r != registration);
        self.watchers.len() != len
    }
    pub fn watcher_count(&self) -> usize {
        self.watchers.len()
    }
    /// Replace the text, placing the cursor at its end, and notify the watchers.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.cursor = self.text.chars().count();
        self.notify();
    }
    fn notify(&mut self) {
        let registrations = self.watchers.iter().map(|(r, _)| *r).collect::<Vec<_>>();
        for registration in registrations {
            let Some(index) = self.watchers.iter().position(|(r, _)| *r == registration) else {
                continue;
            };
            // detached while its own rewrite is applied
            let (registration, mut watcher) = self.watchers.remove(index);
            let rewrite = watcher.after_text_changed(&self.text);
            let rewritten = rewrite.is_some();
            if let Some(Rewrite { text, cursor }) = rewrite {
                self.cursor = cursor.min(text.chars().count());
                self.text = text;
                self.notify();
            }
            self.watchers.insert(index.min(self.watchers.len()), (registration, watcher));
            // the nested notification already delivered the rewritten text to the others
            if rewritten {
                return;
            }
        }
    }
}

/// Keeps a [`TextField`] formatted as an amount with two decimals.
///
/// Whatever is typed is read as a number of cents: typing `1`, `2`, `3` shows `0.01`, `0.12`
/// and `1.23`.
#[derive(Debug, Default, Clone, Copy)]
pub struct MoneyChangedHandler;

impl TextWatcher for MoneyChangedHandler {
    fn after_text_changed(&mut self, text: &str) -> Option<Rewrite> {
        let text = format_money_input(text)?;
        Some(Rewrite { cursor: text.chars().count(), text })
    }
}

/// Reformat `input` as an amount with two decimals, reading its digits as cents.
///
/// Returns `None` for empty input and for input that is not digits with separators.
pub fn format_money_input(input: &str) -> Option<String> {
    if input.is_empty() {
        return None;
    }
    let clean = input.replace([',', '.'], "");
    let (negative, digits) = match clean.strip_prefix('-') {
        Some(digits) => (true, digits),
        None => (false, clean.as_str()),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        tracing::warn!(%input, "ignoring non-numeric money input");
        return None;
    }
    let digits = digits.trim_start_matches('0');
    let padded = format!("{digits:0>3}");
    let (units, cents) = padded.split_at(padded.len() - 2);
    let sign = if negative && !digits.is_empty() { "-" } else { "" };
    Some(format!("{sign}{units}.{cents}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_format_money_input() {
        for (input, expected) in [
            ("1", Some("0.01")),
            ("0.012", Some("0.12")),
            ("0.123", Some("1.23")),
            ("1,234.567", Some("12345.67")),
            ("000", Some("0.00")),
            ("-5", Some("-0.05")),
            ("-0", Some("0.00")),
            ("", None),
            ("-", None),
            ("1a", None),
            ("+1", None),
            ("١٢", None),
        ] {
            assert_eq!(format_money_input(input).as_deref(), expected, "input: {input:?}");
        }
    }

    #[test]
    fn test_format_money_input_shape() {
        for input in ["7", "42", "1.00", "99,999.99", "0000001", "18446744073709551616123"] {
            let formatted = format_money_input(input).expect("should format");
            let (units, cents) = formatted.split_once('.').expect("should have a point");
            assert_eq!(cents.len(), 2);
            assert!(!units.is_empty());
            assert!(units == "0" || !units.starts_with('0'));
            let digits = input.replace([',', '.'], "");
            assert_eq!(
                format!("{units}{cents}").trim_start_matches('0'),
                digits.trim_start_matches('0')
            );
        }
    }

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<String>>>);

    impl TextWatcher for Recorder {
        fn after_text_changed(&mut self, text: &str) -> Option<Rewrite> {
            if let Ok(mut seen) = self.0.lock() {
                seen.push(text.to_string());
            }
            None
        }
    }

    #[test]
    fn test_money_handler_rewrites_field() {
        let mut field = TextField::default();
        let recorder = Recorder::default();
        field.add_watcher(recorder.clone());
        let registration = field.add_watcher(MoneyChangedHandler);
        assert_eq!(field.watcher_count(), 2);

        field.set_text("1");
        assert_eq!(field.text(), "0.01");
        assert_eq!(field.cursor(), 4);
        field.set_text("0.012");
        assert_eq!(field.text(), "0.12");
        field.set_text("abc");
        assert_eq!(field.text(), "abc");
        assert_eq!(field.cursor(), 3);
        assert_eq!(field.watcher_count(), 2);
        assert_eq!(
            *recorder.0.lock().expect("poisoned"),
            vec!["1", "0.01", "0.012", "0.12", "abc"]
        );

        assert!(field.remove_watcher(registration));
        assert!(!field.remove_watcher(registration));
        field.set_text("5");
        assert_eq!(field.text(), "5");
    }

    struct Counter(Arc<Mutex<usize>>);

    impl TextWatcher for Counter {
        fn after_text_changed(&mut self, text: &str) -> Option<Rewrite> {
            if let Ok(mut count) = self.0.lock() {
                *count += 1;
            }
            Some(Rewrite { text: format!("{text}!"), cursor: 0 })
        }
    }

    #[test]
    fn test_watcher_does_not_see_its_own_rewrite() {
        let calls = Arc::new(Mutex::new(0));
        let mut field = TextField::default();
        field.add_watcher(Counter(calls.clone()));
        field.set_text("hi");
        assert_eq!(field.text(), "hi!");
        assert_eq!(field.cursor(), 0);
        assert_eq!(*calls.lock().expect("poisoned"), 1);
    }
}
