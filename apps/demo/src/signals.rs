use glview_core::ShutdownToken;

/// Ctrl-C requests a cooperative shutdown; the main loop detaches the view and drains.
pub fn install_ctrlc(shutdown: &ShutdownToken) -> anyhow::Result<()> {
    let token = shutdown.clone();
    ctrlc::set_handler(move || {
        token.request();
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handler_installs_once_and_leaves_token_clear() {
        let shutdown = ShutdownToken::new();
        assert!(install_ctrlc(&shutdown).is_ok());
        assert!(!shutdown.is_requested());
        assert!(install_ctrlc(&shutdown).is_err());
    }
}
