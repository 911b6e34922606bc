use std::path::PathBuf;

use clap::Args;
use miette::Result;
use owo_colors::{OwoColorize, Stream};
use szs_vfs::{OpenOptions, VirtualPath};

#[derive(Args)]
pub struct TreeArgs {
    /// An input archive
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Only print what is below this directory
    #[arg(short, long, value_name = "PATH", default_value = "/")]
    path: String,
}

impl TreeArgs {
    pub fn handle(&self, options: &OpenOptions) -> Result<()> {
        let archive = super::open(&self.file, options)?;
        let start = archive.lookup(&VirtualPath::parse(&self.path))?;

        super::visit(start, 0, &mut |node, depth| {
            let indent = "  ".repeat(depth);
            if node.is_dir()? {
                let name = match node.name()? {
                    "" => "/".to_string(),
                    name => format!("{name}/"),
                };
                println!(
                    "{indent}{}",
                    name.if_supports_color(Stream::Stdout, |n| n.blue().bold().to_string())
                );
            } else {
                println!(
                    "{indent}{} {}",
                    node.name()?,
                    node.size()?
                        .if_supports_color(Stream::Stdout, |s| s.dimmed().to_string())
                );
            }
            Ok(())
        })
    }
}
