use std::{iter, path::PathBuf};

use clap::Args;
use itertools::Itertools;
use miette::Result;
use owo_colors::{OwoColorize, Stream};
use szs_vfs::{Format, OpenOptions};

#[derive(Args)]
pub struct InfoArgs {
    /// An input archive
    #[arg(value_name = "FILE")]
    file: PathBuf,
}

#[derive(Default)]
struct Totals {
    directories: usize,
    files: usize,
    bytes: u64,
}

impl InfoArgs {
    pub fn handle(&self, options: &OpenOptions) -> Result<()> {
        let archive = super::open(&self.file, options)?;

        let layers = iter::repeat(Format::Yaz0)
            .take(archive.compression_layers())
            .chain(iter::once(archive.format()))
            .join(" > ");

        let mut totals = Totals::default();
        super::visit(archive.root()?, 0, &mut |node, depth| {
            if node.is_file()? {
                totals.files += 1;
                totals.bytes += node.size()?;
            } else if depth > 0 {
                totals.directories += 1;
            }
            Ok(())
        })?;

        let label = |text: &'static str| {
            text.if_supports_color(Stream::Stdout, |t| t.bold().to_string())
                .to_string()
        };
        println!("{} {}", label("file:       "), self.file.display());
        println!("{} {layers}", label("format:     "));
        println!("{} {}", label("directories:"), totals.directories);
        println!("{} {}", label("files:      "), totals.files);
        println!("{} {}", label("bytes:      "), totals.bytes);
        Ok(())
    }
}
