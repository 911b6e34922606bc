use std::io::{Cursor, Read};

use pretty_assertions::assert_eq;
use szs_sarc::{error::Error, types::hash_name, Endianness, SarcArchive};
use tracing::info;
use tracing_test::traced_test;

const KEY: u32 = 0x65;

struct Fixture {
    endianness: Endianness,
    /// `None` stores an entry without a name
    files: Vec<(Option<&'static str>, Vec<u8>)>,
    padding: usize,
}

impl Fixture {
    fn new(endianness: Endianness) -> Self {
        Fixture {
            endianness,
            files: Vec::new(),
            padding: 0,
        }
    }

    fn file(mut self, name: &'static str, data: &[u8]) -> Self {
        self.files.push((Some(name), data.to_vec()));
        self
    }

    fn anonymous(mut self, data: &[u8]) -> Self {
        self.files.push((None, data.to_vec()));
        self
    }

    fn u16(&self, out: &mut Vec<u8>, value: u16) {
        match self.endianness {
            Endianness::Big => out.extend_from_slice(&value.to_be_bytes()),
            Endianness::Little => out.extend_from_slice(&value.to_le_bytes()),
        }
    }

    fn u32(&self, out: &mut Vec<u8>, value: u32) {
        match self.endianness {
            Endianness::Big => out.extend_from_slice(&value.to_be_bytes()),
            Endianness::Little => out.extend_from_slice(&value.to_le_bytes()),
        }
    }

    fn build(&self) -> Vec<u8> {
        let mut pool = Vec::new();
        let mut data = Vec::new();
        let mut table = Vec::new();
        for (name, contents) in &self.files {
            let (hash, attrs) = match name {
                Some(name) => {
                    let attrs = 0x0100_0000 | (pool.len() / 4) as u32;
                    pool.extend_from_slice(name.as_bytes());
                    pool.push(0);
                    pool.resize(pool.len().next_multiple_of(4), 0);
                    (hash_name(name.as_bytes(), KEY), attrs)
                }
                None => (0, 0),
            };
            let begin = data.len() as u32;
            data.extend_from_slice(contents);
            table.push([hash, attrs, begin, data.len() as u32]);
            data.resize(data.len().next_multiple_of(4), 0);
        }

        let data_start = 40 + 16 * self.files.len() + pool.len();
        let file_size = data_start + data.len() + self.padding;

        let mut out = b"SARC".to_vec();
        out.extend_from_slice(&[0x00, 0x14]);
        out.extend_from_slice(match self.endianness {
            Endianness::Big => &[0xFE, 0xFF],
            Endianness::Little => &[0xFF, 0xFE],
        });
        self.u32(&mut out, file_size as u32);
        self.u32(&mut out, data_start as u32);
        self.u16(&mut out, 0x0100);
        self.u16(&mut out, 0);

        out.extend_from_slice(b"SFAT");
        self.u16(&mut out, 12);
        self.u16(&mut out, self.files.len() as u16);
        self.u32(&mut out, KEY);
        for entry in table {
            for value in entry {
                self.u32(&mut out, value);
            }
        }

        out.extend_from_slice(b"SFNT");
        self.u16(&mut out, 8);
        self.u16(&mut out, 0);
        out.extend_from_slice(&pool);
        out.extend_from_slice(&data);
        out.resize(file_size, 0);
        out
    }
}

fn sample(endianness: Endianness) -> Vec<u8> {
    Fixture::new(endianness)
        .file("course.kmp", b"RKMD")
        .file("Model/course.bfres", &[0x42; 10])
        .file("message.msbt", b"")
        .build()
}

#[traced_test]
#[test]
fn read_both_byte_orders() -> Result<(), Error> {
    for endianness in [Endianness::Big, Endianness::Little] {
        let input = sample(endianness);
        info!("testing {} byte {endianness} archive", input.len());

        let sarc = SarcArchive::new(Cursor::new(input))?;
        assert_eq!(sarc.endianness(), endianness);
        assert_eq!(sarc.hash_key(), KEY);
        assert_eq!(sarc.len(), 3);
        assert_eq!(
            sarc.names().collect::<Vec<_>>(),
            vec!["course.kmp", "Model/course.bfres", "message.msbt"]
        );
        assert_eq!(sarc.by_name("course.kmp"), Some(&b"RKMD"[..]));
        assert_eq!(sarc.by_name("Model/course.bfres"), Some(&[0x42; 10][..]));
        assert_eq!(sarc.by_name("message.msbt"), Some(&b""[..]));
        assert_eq!(sarc.by_name("missing"), None);
    }

    Ok(())
}

#[traced_test]
#[test]
fn entries_in_table_order() -> Result<(), Error> {
    let sarc = SarcArchive::new(Cursor::new(sample(Endianness::Big)))?;
    let sizes = sarc
        .entries()
        .map(|(name, data)| (name, data.len()))
        .collect::<Vec<_>>();
    assert_eq!(
        sizes,
        vec![("course.kmp", 4), ("Model/course.bfres", 10), ("message.msbt", 0)]
    );

    let index = sarc.index_for_name("message.msbt");
    assert_eq!(index, Some(2));
    assert_eq!(sarc.by_index(1).map(|(name, _)| name), Some("Model/course.bfres"));
    assert_eq!(sarc.by_index(3), None);
    Ok(())
}

#[traced_test]
#[test]
fn anonymous_entries_are_skipped() -> Result<(), Error> {
    let input = Fixture::new(Endianness::Little)
        .anonymous(b"nameless")
        .file("named", b"data")
        .build();

    let sarc = SarcArchive::new(Cursor::new(input))?;
    assert_eq!(sarc.names().collect::<Vec<_>>(), vec!["named"]);
    assert_eq!(sarc.by_name("named"), Some(&b"data"[..]));
    assert!(logs_contain("without a name"));

    Ok(())
}

#[traced_test]
#[test]
fn duplicate_names_keep_later_entry() -> Result<(), Error> {
    let input = Fixture::new(Endianness::Big)
        .file("course.kmp", b"first")
        .file("message.msbt", b"between")
        .file("course.kmp", b"second")
        .build();

    let sarc = SarcArchive::new(Cursor::new(input))?;
    assert!(logs_contain("duplicate"));
    assert_eq!(sarc.len(), 2);
    assert_eq!(
        sarc.names().collect::<Vec<_>>(),
        vec!["course.kmp", "message.msbt"]
    );
    assert_eq!(sarc.by_name("course.kmp"), Some(&b"second"[..]));
    assert_eq!(sarc.index_for_name("course.kmp"), Some(0));

    Ok(())
}

#[traced_test]
#[test]
fn corrupted_name_fails_hash_check() {
    let mut input = sample(Endianness::Big);
    let name = input
        .windows(10)
        .position(|w| w == b"course.kmp")
        .expect("name is in the pool");
    input[name] = b'C';

    assert!(matches!(
        SarcArchive::new(Cursor::new(input)),
        Err(Error::CorruptArchive(_))
    ));
}

#[traced_test]
#[test]
fn unknown_version() {
    let mut input = sample(Endianness::Big);
    input[16..18].copy_from_slice(&[0x02, 0x00]);

    assert!(matches!(
        SarcArchive::new(Cursor::new(input)),
        Err(Error::UnsupportedVersion(0x0200))
    ));
}

#[traced_test]
#[test]
fn unknown_byte_order_mark() {
    let mut input = sample(Endianness::Big);
    input[6..8].copy_from_slice(&[0x12, 0x34]);

    assert!(matches!(
        SarcArchive::new(Cursor::new(input)),
        Err(Error::InvalidFormat)
    ));
}

#[traced_test]
#[test]
fn truncated_data() {
    let mut input = sample(Endianness::Little);
    input.truncate(input.len() - 4);

    assert!(matches!(
        SarcArchive::new(Cursor::new(input)),
        Err(Error::TruncatedStream(_))
    ));
}

#[traced_test]
#[test]
fn truncated_table() {
    let mut input = sample(Endianness::Little);
    input.truncate(50);

    assert!(matches!(
        SarcArchive::new(Cursor::new(input)),
        Err(Error::TruncatedStream("SFAT section"))
    ));
}

#[traced_test]
#[test]
fn reader_left_after_archive() -> Result<(), Error> {
    let mut fixture = Fixture::new(Endianness::Big).file("a", b"1234");
    fixture.padding = 12;
    let mut input = fixture.build();
    input.extend_from_slice(b"next");

    let mut reader = Cursor::new(input);
    let sarc = SarcArchive::new(&mut reader)?;
    assert_eq!(sarc.by_name("a"), Some(&b"1234"[..]));

    let mut rest = String::new();
    reader.read_to_string(&mut rest)?;
    assert_eq!(rest, "next");

    Ok(())
}

#[traced_test]
#[test]
fn rejects_u8() {
    let input = vec![0x55, 0xAA, 0x38, 0x2D, 0, 0, 0, 0x20];
    assert!(matches!(
        SarcArchive::new(Cursor::new(input)),
        Err(Error::InvalidFormat)
    ));
}
