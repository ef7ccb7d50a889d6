//! Compilation options shared by the library entry points and the CLI.

use clap::ValueEnum;

/// How memory segments are spelled in emitted code.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum SegmentNames {
    /// `constant`, `argument`, ... as read by the VM translator.
    #[default]
    Standard,
    /// `const`, `arg`, ...
    Short,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Options {
    pub segment_names: SegmentNames,
}

impl Options {
    pub fn with_segment_names(mut self, segment_names: SegmentNames) -> Self {
        self.segment_names = segment_names;
        self
    }
}
