//! Token classifier — separates control tokens from forwarded tokens.

/// Builder state a recognized control token toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlToken {
    /// Enable the runtime debug listener.
    Debug,
    /// Enable the security-manager mode of the launched server.
    SecurityManager,
}

/// A single recognized control token.
#[derive(Debug, Clone, Copy)]
pub struct ControlDef {
    /// Exact token as it appears on the command line.
    pub token: &'static str,
    pub control: ControlToken,
}

/// One scanned caller token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifiedToken {
    /// Recognized control token; mutates builder state, never forwarded.
    Control(ControlToken),
    /// Anything else; handed to the builder in order.
    Forward(String),
}

/// Control tokens recognized by the standalone topology.
pub fn standalone_controls() -> &'static [ControlDef] {
    const CONTROLS: &[ControlDef] = &[
        ControlDef {
            token: "--debug",
            control: ControlToken::Debug,
        },
        ControlDef {
            token: "-secmgr",
            control: ControlToken::SecurityManager,
        },
    ];
    CONTROLS
}

/// Control tokens recognized by the domain topology.
pub fn domain_controls() -> &'static [ControlDef] {
    const CONTROLS: &[ControlDef] = &[ControlDef {
        token: "-secmgr",
        control: ControlToken::SecurityManager,
    }];
    CONTROLS
}

/// Classify caller tokens against a control registry, preserving order.
pub fn classify(tokens: &[String], controls: &[ControlDef]) -> Vec<ClassifiedToken> {
    tokens
        .iter()
        .map(|token| {
            match controls.iter().find(|def| def.token == token.as_str()) {
                Some(def) => ClassifiedToken::Control(def.control),
                None => ClassifiedToken::Forward(token.clone()),
            }
        })
        .collect()
}
