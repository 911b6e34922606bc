use std::path::Path;

use miette::{Context, Result};
use szs_vfs::{Archive, NodeRef, OpenOptions};

pub mod cat;
pub mod extract;
pub mod info;
pub mod tree;

#[derive(clap::Subcommand)]
pub enum Commands {
    /// Print every file and directory of an archive
    Tree(tree::TreeArgs),
    /// Write one file of an archive to stdout
    Cat(cat::CatArgs),
    /// Extract every file of an archive into a directory
    Extract(extract::ExtractArgs),
    /// Describe an archive
    Info(info::InfoArgs),
}

impl Commands {
    pub fn handle(&self, options: &OpenOptions) -> Result<()> {
        match self {
            Commands::Tree(tree) => tree.handle(options),
            Commands::Cat(cat) => cat.handle(options),
            Commands::Extract(extract) => extract.handle(options),
            Commands::Info(info) => info.handle(options),
        }
    }
}

fn open(file: &Path, options: &OpenOptions) -> Result<Archive> {
    Archive::open_path_with(file, options).context(format!("opening {}", file.display()))
}

/// Visit `node` and everything below it depth first, with the depth relative to `node`
fn visit<'a>(
    node: NodeRef<'a>,
    depth: usize,
    f: &mut impl FnMut(NodeRef<'a>, usize) -> Result<()>,
) -> Result<()> {
    f(node, depth)?;
    if node.is_dir()? {
        for child in node.children()? {
            visit(child, depth + 1, f)?;
        }
    }
    Ok(())
}
