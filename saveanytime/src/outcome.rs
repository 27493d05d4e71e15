/// How a run ended. Every failure the user can act on maps to the same non-zero exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Site rewritten at the given offset.
    Applied { offset: u64 },
    /// Site located but left untouched.
    DryRun { offset: u64 },
    /// User answered no when asked to use the default install.
    Declined,
    /// No path given and no install at the default location.
    NoInstallFound,
    Interrupted,
    ExeNotFound,
    Failed,
}

impl Outcome {
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Applied { .. }
            | Self::DryRun { .. }
            | Self::Declined
            | Self::NoInstallFound
            | Self::Interrupted => 0,
            Self::ExeNotFound | Self::Failed => 1,
        }
    }
}
