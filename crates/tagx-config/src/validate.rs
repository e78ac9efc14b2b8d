use crate::tagx::TagxConfig;

/// Called from `TagxConfig::from_str` / `load`.
pub(crate) fn validate(config: &TagxConfig) -> anyhow::Result<()> {
    if !is_valid_name(&config.engine.tag) {
        anyhow::bail!(
            "engine.tag: invalid annotation key {:?}, must match [A-Za-z_][A-Za-z0-9_]*",
            config.engine.tag,
        );
    }
    // `@` names the default expression and can never hold the message.
    if !is_valid_name(&config.engine.message) {
        anyhow::bail!(
            "engine.message: invalid expression name {:?}, must match [A-Za-z_][A-Za-z0-9_]*",
            config.engine.message,
        );
    }
    if config.logging.level.trim().is_empty() {
        anyhow::bail!("logging.level must not be empty");
    }
    Ok(())
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.bytes();
    match chars.next() {
        Some(b) if b.is_ascii_alphabetic() || b == b'_' => {}
        _ => return false,
    }
    chars.all(|b| b.is_ascii_alphanumeric() || b == b'_')
}
