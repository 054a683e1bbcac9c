use nodeboot_config::{Backend, NodeHome};

/// Flag that disables the IAVL fast-node index.
pub const DISABLE_FASTNODE_FLAG: &str = "--iavl-disable-fastnode";

/// Arguments of the final `start` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchPlan {
    args: Vec<String>,
}

impl LaunchPlan {
    /// `start --home H --db_backend B [--iavl-disable-fastnode] [--halt-height=N]`
    pub fn new(home: &NodeHome, backend: Backend, halt_height: u64, disable_fastnode: bool) -> Self {
        let mut args = vec![
            "start".to_string(),
            "--home".to_string(),
            home.root().display().to_string(),
            "--db_backend".to_string(),
            backend.as_str().to_string(),
        ];
        if disable_fastnode {
            args.push(DISABLE_FASTNODE_FLAG.to_string());
        }
        if halt_height > 0 {
            args.push(format!("--halt-height={halt_height}"));
        }
        Self { args }
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}
