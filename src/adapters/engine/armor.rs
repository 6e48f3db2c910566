use pem::{EncodeConfig, LineEnding, Pem};

/// Wrap `data` in a PEM block with the given label.
pub(super) fn armor(label: &str, data: &[u8]) -> String {
    let block = Pem::new(label, data);
    pem::encode_config(&block, EncodeConfig::new().set_line_ending(LineEnding::LF))
}

/// Parse a PEM block and return its body, provided the label matches.
pub(super) fn dearmor(label: &str, text: &str) -> Result<Vec<u8>, String> {
    let block = pem::parse(text).map_err(|e| format!("invalid armor block: {e}"))?;
    if block.tag() != label {
        return Err(format!(
            "expected a '{label}' armor block, found '{}'",
            block.tag()
        ));
    }
    Ok(block.into_contents())
}
