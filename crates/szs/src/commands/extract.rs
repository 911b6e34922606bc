use std::{
    fs::File,
    path::{Component, Path, PathBuf},
};

use clap::Args;
use miette::{miette, Context, IntoDiagnostic, Result};
use szs_vfs::{OpenOptions, VirtualPath};
use tracing::info;

#[derive(Args)]
pub struct ExtractArgs {
    /// An input archive
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// A target directory
    #[arg(short, long, value_name = "DIR")]
    output: PathBuf,

    /// Allow overwriting existing files
    #[arg(long, default_value_t = false)]
    overwrite: bool,
}

impl ExtractArgs {
    pub fn handle(&self, options: &OpenOptions) -> Result<()> {
        let archive = super::open(&self.file, options)?;

        let mut count = 0;
        super::visit(archive.root()?, 0, &mut |node, _| {
            if node.is_dir()? {
                return Ok(());
            }

            let path = node.path()?;
            let target = target_path(&self.output, &path)?;
            info!("writing {}", target.display());

            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)
                    .into_diagnostic()
                    .context(format!("creating {}", parent.display()))?;
            }
            let mut out = if !self.overwrite {
                File::create_new(&target)
            } else {
                File::create(&target)
            }
            .into_diagnostic()
            .context(format!("creating {}", target.display()))?;

            std::io::copy(&mut node.open_file()?, &mut out)
                .into_diagnostic()
                .context(format!("extracting {path}"))?;
            count += 1;
            Ok(())
        })?;

        info!("extracted {count} files into {}", self.output.display());
        Ok(())
    }
}

/// Where a file ends up below `output`, refusing names that would leave it
fn target_path(output: &Path, path: &VirtualPath) -> Result<PathBuf> {
    let mut target = output.to_path_buf();
    for segment in path.segments() {
        let mut components = Path::new(segment).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None) => target.push(name),
            _ => {
                return Err(miette!(
                    "{path} would be written outside of {}",
                    output.display()
                ))
            }
        }
    }
    Ok(target)
}
