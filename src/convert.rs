//! Markdown to Confluence storage-format conversion boundary.

/// Converts a local document body into the remote store's format.
pub trait Converter {
    fn to_storage(&self, markdown: &str) -> Result<String, ConvertError>;
}

/// Wraps the markdown source in a preformatted code macro.
///
/// Content survives round trips verbatim but renders as a code block
/// rather than rich text. TODO: replace with a proper markdown-to-storage
/// renderer once the target macro set is agreed with the space owners.
#[derive(Debug, Clone, Copy, Default)]
pub struct CodeMacroConverter;

impl Converter for CodeMacroConverter {
    fn to_storage(&self, markdown: &str) -> Result<String, ConvertError> {
        let escaped = markdown
            .replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;");
        Ok(format!(
            "<ac:structured-macro ac:name=\"code\"><ac:plain-text-body><![CDATA[{}]]></ac:plain-text-body></ac:structured-macro>",
            escaped
        ))
    }
}

/// Error from content conversion.
#[derive(Debug)]
pub enum ConvertError {
    /// The body could not be represented in the target format.
    Unrepresentable(String),
}

impl std::fmt::Display for ConvertError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConvertError::Unrepresentable(e) => write!(f, "Conversion failed: {}", e),
        }
    }
}

impl std::error::Error for ConvertError {}
