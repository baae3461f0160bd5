// SPDX-License-Identifier: BSD-3-Clause
use std::fmt;
use std::path::PathBuf;

#[derive(Clone, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum Check {
    /// Report values that could not be translated
    Default,
    None,
    /// Fail if any value could not be translated
    Strict,
}

impl std::fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Check::Default => write!(f, "default"),
            Check::None => write!(f, "none"),
            Check::Strict => write!(f, "strict"),
        }
    }
}

/// Pointer rules of LLVM bitcode
#[derive(Debug, clap::Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Check for untranslatable values
    #[arg(long, default_value_t = Check::Default)]
    pub check: Check,

    /// LLVM bitcode module
    #[arg()]
    pub module: PathBuf,

    /// Memory-management models, in addition to the C and C++ standard ones
    #[arg(short, long)]
    pub models: Option<PathBuf>,

    /// Quiet
    #[arg(long)]
    pub quiet: bool,

    /// Tracing
    #[arg(long)]
    pub tracing: bool,
}
