mod common;

use std::io::{Cursor, Read, Seek, SeekFrom};

use common::{course, sarc_archive, u8_archive, yaz0, Entry};
use pretty_assertions::assert_eq;
use szs_vfs::{
    error::{Error, Result},
    Archive, ErrorKind, Format, OpenOptions, VirtualPath,
};
use tracing::info;
use tracing_test::traced_test;

fn read_all(archive: &Archive, path: &str) -> Result<Vec<u8>> {
    let mut data = Vec::new();
    archive
        .lookup(&VirtualPath::parse(path))?
        .open_file()?
        .read_to_end(&mut data)?;
    Ok(data)
}

fn child_names(archive: &Archive, path: &str) -> Result<Vec<String>> {
    archive
        .lookup(&VirtualPath::parse(path))?
        .children()?
        .iter()
        .map(|child| child.name().map(String::from))
        .collect()
}

#[traced_test]
#[test]
fn smallest_tree() -> Result<()> {
    use Entry::{Dir, File};

    let input = u8_archive(Dir("", vec![Dir(".", vec![File("child.bin", b"xyz".to_vec())])]));
    let archive = Archive::open(Cursor::new(input))?;
    assert_eq!(archive.format(), Format::U8);
    assert_eq!(archive.compression_layers(), 0);

    let child = archive.lookup(&VirtualPath::parse("/child.bin"))?;
    assert!(child.is_file()?);
    assert_eq!(child.path()?.to_string(), "/child.bin");
    assert_eq!(child.size()?, 3);

    let root = archive.root()?;
    assert_eq!(root.name()?, "");
    assert_eq!(root.path()?, VirtualPath::root());
    assert_eq!(root.parent()?, root);
    assert_eq!(child.parent()?, root);

    assert_eq!(read_all(&archive, "child.bin")?, b"xyz");

    Ok(())
}

#[traced_test]
#[test]
fn browse_tree() -> Result<()> {
    let archive = Archive::open(Cursor::new(course()))?;

    assert_eq!(child_names(&archive, "/")?, vec!["course", "readme.txt", "empty"]);
    assert_eq!(child_names(&archive, "/course")?, vec!["course.kmp", "model.brres"]);
    assert!(child_names(&archive, "/empty")?.is_empty());

    let model = archive.lookup(&VirtualPath::parse("/course/model.brres"))?;
    assert_eq!(model.size()?, 1000);
    assert_eq!(model.path()?.to_string(), "/course/model.brres");
    assert_eq!(model.parent()?.path()?.to_string(), "/course");

    let course = archive.lookup(&VirtualPath::parse("course"))?;
    assert!(course.is_dir()?);
    assert_eq!(course.size()?, 0);

    assert_eq!(read_all(&archive, "/course/../readme.txt")?, b"hello");
    assert_eq!(read_all(&archive, "/course/./course.kmp")?, b"RKMD course data");

    Ok(())
}

#[traced_test]
#[test]
fn climbing_stops_at_root() -> Result<()> {
    let archive = Archive::open(Cursor::new(course()))?;

    let root = archive.lookup(&VirtualPath::parse("/.."))?;
    assert_eq!(root, archive.root()?);
    assert_eq!(read_all(&archive, "../../readme.txt")?, b"hello");
    assert_eq!(archive.lookup(&VirtualPath::empty())?, root);

    Ok(())
}

#[traced_test]
#[test]
fn lookup_errors() -> Result<()> {
    let archive = Archive::open(Cursor::new(course()))?;

    assert!(archive.resolve(&VirtualPath::parse("/missing"))?.is_none());
    let err = archive
        .lookup(&VirtualPath::parse("course/missing.kmp"))
        .expect_err("nothing is there");
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.to_string(), "/course/missing.kmp does not exist in the archive");

    let err = archive
        .lookup(&VirtualPath::parse("/readme.txt/inner"))
        .expect_err("a file has no children");
    assert!(matches!(err, Error::NotADirectory(ref path) if path.to_string() == "/readme.txt"));

    let readme = archive.lookup(&VirtualPath::parse("/readme.txt"))?;
    assert_eq!(
        readme.children().expect_err("a file has no children").kind(),
        ErrorKind::NotADirectory
    );

    let empty = archive.lookup(&VirtualPath::parse("/empty"))?;
    let err = empty.open_file().expect_err("directories can't be read");
    assert!(matches!(err, Error::NotAFile(ref path) if path.to_string() == "/empty"));

    Ok(())
}

#[traced_test]
#[test]
fn compressed_tree() -> Result<()> {
    let input = yaz0(&course());
    info!("testing {} compressed bytes", input.len());

    let archive = Archive::open(Cursor::new(input))?;
    assert_eq!(archive.format(), Format::U8);
    assert_eq!(archive.compression_layers(), 1);
    assert_eq!(read_all(&archive, "/course/course.kmp")?, b"RKMD course data");
    assert!(logs_contain("detected archive layer"));

    let twice = Archive::open(Cursor::new(yaz0(&yaz0(&course()))))?;
    assert_eq!(twice.compression_layers(), 2);
    assert_eq!(read_all(&twice, "readme.txt")?, b"hello");

    Ok(())
}

#[traced_test]
#[test]
fn flat_archive() -> Result<()> {
    let input = sarc_archive(&[
        ("course.kmp", b"RKMD"),
        ("Model/course.bfres", &[0x42; 10]),
        ("message.msbt", b""),
    ]);
    let archive = Archive::open(Cursor::new(yaz0(&input)))?;
    assert_eq!(archive.format(), Format::Sarc);

    let root = archive.root()?;
    assert!(root.is_dir()?);
    assert_eq!(root.parent()?, root);
    assert_eq!(
        child_names(&archive, "/")?,
        vec!["course.kmp", "Model/course.bfres", "message.msbt"]
    );

    let model = archive.lookup(&VirtualPath::parse("/Model/course.bfres"))?;
    assert!(model.is_file()?);
    assert_eq!(model.size()?, 10);
    assert_eq!(model.path()?.to_string(), "/Model/course.bfres");
    assert_eq!(model.parent()?, root);

    assert_eq!(read_all(&archive, "Model/../Model/course.bfres")?, vec![0x42; 10]);
    assert_eq!(read_all(&archive, "/message.msbt")?, b"");
    assert!(archive.resolve(&VirtualPath::parse("/Model"))?.is_none());

    assert!(matches!(root.open_file(), Err(Error::NotAFile(_))));
    assert!(matches!(model.children(), Err(Error::NotADirectory(_))));

    Ok(())
}

#[traced_test]
#[test]
fn seek_within_file() -> Result<()> {
    let archive = Archive::open(Cursor::new(course()))?;
    let model = archive.lookup(&VirtualPath::parse("/course/model.brres"))?;

    let mut file = model.open_file()?;
    assert_eq!(file.size(), 1000);
    file.seek(SeekFrom::Start(256))?;
    let mut buf = [0; 4];
    file.read_exact(&mut buf)?;
    assert_eq!(buf, [0, 1, 2, 3]);
    assert_eq!(file.position(), 260);

    file.seek(SeekFrom::End(-1))?;
    let mut rest = Vec::new();
    file.read_to_end(&mut rest)?;
    assert_eq!(rest, vec![(999 % 256) as u8]);

    file.seek(SeekFrom::End(10))?;
    assert_eq!(file.read(&mut buf)?, 0);

    Ok(())
}

#[traced_test]
#[test]
fn independent_handles() -> Result<()> {
    let archive = Archive::open(Cursor::new(course()))?;
    let kmp = archive.lookup(&VirtualPath::parse("/course/course.kmp"))?;
    let readme = archive.lookup(&VirtualPath::parse("/readme.txt"))?;

    let mut first = kmp.open_file()?;
    let mut second = readme.open_file()?;
    let mut third = kmp.open_file()?;

    let mut buf = [0; 4];
    first.read_exact(&mut buf)?;
    assert_eq!(&buf, b"RKMD");
    second.read_exact(&mut buf)?;
    assert_eq!(&buf, b"hell");
    third.read_exact(&mut buf[..2])?;
    assert_eq!(&buf[..2], b"RK");
    first.read_exact(&mut buf)?;
    assert_eq!(&buf, b" cou");

    Ok(())
}

#[traced_test]
#[test]
fn concurrent_handles() -> Result<()> {
    let archive = Archive::open(Cursor::new(course()))?;
    let expected = (0..=255u8).cycle().take(1000).collect::<Vec<_>>();

    std::thread::scope(|scope| {
        let workers = (0..4)
            .map(|i| {
                let archive = &archive;
                scope.spawn(move || -> Result<Vec<u8>> {
                    let path = if i % 2 == 0 {
                        "/course/model.brres"
                    } else {
                        "/readme.txt"
                    };
                    let mut file = archive.lookup(&VirtualPath::parse(path))?.open_file()?;
                    let mut data = Vec::new();
                    let mut buf = [0; 7];
                    loop {
                        let read = file.read(&mut buf)?;
                        if read == 0 {
                            break;
                        }
                        data.extend_from_slice(&buf[..read]);
                        std::thread::yield_now();
                    }
                    Ok(data)
                })
            })
            .collect::<Vec<_>>();

        for (i, worker) in workers.into_iter().enumerate() {
            let data = worker.join().expect("reader thread panicked")?;
            if i % 2 == 0 {
                assert_eq!(data, expected);
            } else {
                assert_eq!(data, b"hello");
            }
        }
        Ok(())
    })
}

#[traced_test]
#[test]
fn closing() -> Result<()> {
    let archive = Archive::open(Cursor::new(course()))?;
    let readme = archive.lookup(&VirtualPath::parse("/readme.txt"))?;

    let mut handle = readme.open_file()?;
    handle.close();
    assert!(!handle.is_open());
    let err = Error::from(handle.read(&mut [0; 4]).expect_err("handle is closed"));
    assert_eq!(err.kind(), ErrorKind::HandleClosed);

    let mut other = readme.open_file()?;
    archive.close();
    archive.close();
    assert!(!archive.is_open());
    assert!(!other.is_open());
    assert!(other.read(&mut [0; 4]).is_err());
    assert!(matches!(readme.name(), Err(Error::HandleClosed)));
    assert!(matches!(archive.root(), Err(Error::HandleClosed)));

    let flat = Archive::open(Cursor::new(sarc_archive(&[("a", b"1")])))?;
    let mut file = flat.lookup(&VirtualPath::parse("a"))?.open_file()?;
    flat.close();
    assert!(file.read(&mut [0; 1]).is_err());
    assert!(file.seek(SeekFrom::Start(0)).is_err());

    Ok(())
}

#[traced_test]
#[test]
fn unknown_format() {
    let err = Archive::open(Cursor::new(b"PK\x03\x04rest".to_vec())).expect_err("not an archive");
    assert!(matches!(err, Error::UnknownFormat(ref magic) if magic == b"PK\x03\x04"));
    assert_eq!(err.kind(), ErrorKind::InvalidFormat);

    let err = Archive::open(Cursor::new(b"SA".to_vec())).expect_err("too short");
    assert_eq!(err.kind(), ErrorKind::InvalidFormat);
}

#[traced_test]
#[test]
fn limits() {
    let options = OpenOptions::builder().max_wrapper_depth(1).build();
    let input = yaz0(&yaz0(&course()));
    let err = Archive::open_with(Cursor::new(input), &options).expect_err("two layers");
    assert!(matches!(err, Error::NestingTooDeep(1)));

    let options = OpenOptions::builder().max_decompressed_len(16).build();
    let err = Archive::open_with(Cursor::new(yaz0(&course())), &options).expect_err("too big");
    assert!(matches!(err, Error::TooLarge { limit: 16, .. }));
    assert_eq!(err.kind(), ErrorKind::Limit);
}

#[traced_test]
#[test]
fn truncated_compression() {
    let mut input = yaz0(&course());
    input.truncate(input.len() / 2);
    let err = Archive::open(Cursor::new(input)).expect_err("half the stream is missing");
    assert_eq!(err.kind(), ErrorKind::TruncatedStream);
}
