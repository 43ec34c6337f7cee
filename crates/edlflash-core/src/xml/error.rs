//! Errors for command-document reading and writing

use thiserror::Error;

/// Errors that can occur while reading or writing command documents
#[derive(Error, Debug)]
pub enum XmlError {
    #[error("XML parsing error: {0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Document has no root element")]
    MissingRoot,

    #[error("Unexpected root element <{0}>, expected <data>")]
    UnexpectedRoot(String),

    #[error("Document contains no <program> elements")]
    NoProgramElements,

    #[error("Unknown command type: {0}")]
    UnknownCommand(String),
}

impl XmlError {
    /// True for failures that mean "this is not a partition table document"
    pub fn is_invalid_document(&self) -> bool {
        matches!(
            self,
            XmlError::XmlError(_)
                | XmlError::MissingRoot
                | XmlError::UnexpectedRoot(_)
                | XmlError::NoProgramElements
        )
    }
}
