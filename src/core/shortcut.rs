/// The key that triggers "download all".
pub const DOWNLOAD_ALL_KEY: char = 'd';

/// Where input is currently directed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    /// Plain command input; shortcuts are live.
    Command,
    /// Free text, such as a question being typed.
    TextInput,
    /// A choice from a fixed list, such as the target extension.
    Select,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    DownloadAll,
}

/// Maps a key press to a shortcut, unless focus is on an input control.
pub fn resolve_shortcut(key: char, focus: Focus) -> Option<ShortcutAction> {
    match focus {
        Focus::TextInput | Focus::Select => None,
        Focus::Command if key.eq_ignore_ascii_case(&DOWNLOAD_ALL_KEY) => {
            Some(ShortcutAction::DownloadAll)
        }
        Focus::Command => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn download_key_fires_only_in_command_focus() {
        assert_eq!(
            resolve_shortcut('d', Focus::Command),
            Some(ShortcutAction::DownloadAll)
        );
        assert_eq!(
            resolve_shortcut('D', Focus::Command),
            Some(ShortcutAction::DownloadAll)
        );
        assert_eq!(resolve_shortcut('d', Focus::TextInput), None);
        assert_eq!(resolve_shortcut('d', Focus::Select), None);
        assert_eq!(resolve_shortcut('x', Focus::Command), None);
    }
}
