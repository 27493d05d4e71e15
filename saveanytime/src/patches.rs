use strum::{Display, EnumIter};

use crate::scanner::Pattern;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Direction {
    Patch,
    Unpatch,
}

impl Direction {
    pub fn new(unpatch: bool) -> Self {
        if unpatch {
            Self::Unpatch
        } else {
            Self::Patch
        }
    }

    pub fn action(self) -> &'static str {
        match self {
            Self::Patch => "Patching",
            Self::Unpatch => "Unpatching",
        }
    }

    /// State the executable is in once this direction has been applied.
    pub fn target_state(self) -> &'static str {
        match self {
            Self::Patch => "patched",
            Self::Unpatch => "unpatched",
        }
    }

    pub fn reverse(self) -> Self {
        match self {
            Self::Patch => Self::Unpatch,
            Self::Unpatch => Self::Patch,
        }
    }
}

/// A single in-place modification, described by the bytes found at the site in both states.
/// Both sides must be the same length.
#[derive(Debug)]
pub struct PatchSite<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub unpatched: &'a [u8],
    pub patched: &'a [u8],
}

impl<'a> PatchSite<'a> {
    /// Bytes expected at the site before applying `direction`.
    pub fn search(&self, direction: Direction) -> &'a [u8] {
        match direction {
            Direction::Patch => self.unpatched,
            Direction::Unpatch => self.patched,
        }
    }

    /// Bytes written over the site when applying `direction`.
    pub fn replace(&self, direction: Direction) -> &'a [u8] {
        self.search(direction.reverse())
    }

    pub fn pattern(&self, direction: Direction) -> anyhow::Result<Pattern> {
        Pattern::from_bytes(self.search(direction))
    }

    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.unpatched.len()
    }
}

// call qword ptr [rax+170h]
// cmp  dword ptr [rsp+20h], 0
// jne  +10h                     -> nop; nop
pub const SAVE_ANYWHERE: PatchSite<'static> = PatchSite {
    name: "save_anywhere",
    description: "allow saving while the save restriction check would otherwise block it",
    unpatched: b"\xff\x90\x70\x01\x00\x00\x83\x7c\x24\x20\x00\x75\x10",
    patched: b"\xff\x90\x70\x01\x00\x00\x83\x7c\x24\x20\x00\x90\x90",
};
