use std::path::PathBuf;

/// Values every action needs, resolved once at startup.
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub api_url: String,
    pub state_dir: Option<PathBuf>,
    pub ephemeral: bool,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(api_url: String) -> Self {
        Self {
            api_url,
            state_dir: None,
            ephemeral: false,
        }
    }
}
