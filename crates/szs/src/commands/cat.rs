use std::{io, path::PathBuf};

use clap::Args;
use miette::{Context, IntoDiagnostic, Result};
use szs_vfs::{OpenOptions, VirtualPath};

#[derive(Args)]
pub struct CatArgs {
    /// An input archive
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// The file inside the archive
    #[arg(value_name = "PATH")]
    path: String,
}

impl CatArgs {
    pub fn handle(&self, options: &OpenOptions) -> Result<()> {
        let archive = super::open(&self.file, options)?;
        let node = archive.lookup(&VirtualPath::parse(&self.path))?;
        let mut file = node.open_file()?;

        io::copy(&mut file, &mut io::stdout().lock())
            .into_diagnostic()
            .context(format!("reading {}", node.path()?))?;
        Ok(())
    }
}
