//! File and folder pickers

use std::path::PathBuf;

/// Extension filter shown in a picker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileFilter {
    /// Label shown in the picker
    pub name: &'static str,
    /// Extensions without the dot
    pub extensions: &'static [&'static str],
}

/// Filter for partition tables and command documents
pub const XML_FILTER: FileFilter = FileFilter {
    name: "XML file",
    extensions: &["xml"],
};

/// Native file dialogs. `None` means the user cancelled, which callers
/// treat as a no-op.
pub trait FileDialog {
    /// Pick an existing file
    fn pick_file(&self, filter: Option<FileFilter>) -> Option<PathBuf>;

    /// Pick an existing folder
    fn pick_folder(&self) -> Option<PathBuf>;

    /// Choose a destination file
    fn save_file(&self, filter: Option<FileFilter>) -> Option<PathBuf>;
}
