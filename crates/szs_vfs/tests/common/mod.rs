#![allow(dead_code)]

use szs_sarc::types::hash_name;

pub enum Entry {
    Dir(&'static str, Vec<Entry>),
    File(&'static str, Vec<u8>),
}

/// Serialize a U8 tree whose root directory is `root`
pub fn u8_archive(root: Entry) -> Vec<u8> {
    fn add(
        entry: &Entry,
        parent: u32,
        records: &mut Vec<[u32; 4]>,
        pool: &mut Vec<u8>,
        data: &mut Vec<u8>,
    ) {
        let name = match entry {
            Entry::Dir(name, _) | Entry::File(name, _) => name,
        };
        let name_offset = pool.len() as u32;
        pool.extend_from_slice(name.as_bytes());
        pool.push(0);

        match entry {
            Entry::Dir(_, children) => {
                let index = records.len();
                records.push([1, name_offset, parent, 0]);
                for child in children {
                    add(child, index as u32, records, pool, data);
                }
                records[index][3] = records.len() as u32;
            }
            Entry::File(_, contents) => {
                records.push([0, name_offset, data.len() as u32, contents.len() as u32]);
                data.extend_from_slice(contents);
                data.resize(data.len().next_multiple_of(0x20), 0);
            }
        }
    }

    let (mut records, mut pool, mut data) = (Vec::new(), Vec::new(), Vec::new());
    add(&root, 0, &mut records, &mut pool, &mut data);

    let tree_len = records.len() * 12 + pool.len();
    let data_start = (0x20 + tree_len).next_multiple_of(0x20) as u32;

    let mut output = vec![0x55, 0xAA, 0x38, 0x2D];
    output.extend_from_slice(&0x20u32.to_be_bytes());
    output.extend_from_slice(&(tree_len as u32).to_be_bytes());
    output.extend_from_slice(&data_start.to_be_bytes());
    output.resize(0x20, 0);

    for [kind, name, field1, field2] in records {
        let field1 = if kind == 0 { field1 + data_start } else { field1 };
        output.push(kind as u8);
        output.extend_from_slice(&name.to_be_bytes()[1..]);
        output.extend_from_slice(&field1.to_be_bytes());
        output.extend_from_slice(&field2.to_be_bytes());
    }
    output.extend_from_slice(&pool);
    output.resize(data_start as usize, 0);
    output.extend_from_slice(&data);
    output
}

/// A course archive: `/course/course.kmp`, `/course/model.brres`, `/readme.txt`, `/empty/`
pub fn course() -> Vec<u8> {
    use Entry::{Dir, File};

    u8_archive(Dir(
        "",
        vec![Dir(
            ".",
            vec![
                Dir(
                    "course",
                    vec![
                        File("course.kmp", b"RKMD course data".to_vec()),
                        File("model.brres", (0..=255u8).cycle().take(1000).collect()),
                    ],
                ),
                File("readme.txt", b"hello".to_vec()),
                Dir("empty", vec![]),
            ],
        )],
    ))
}

/// Serialize a big endian SARC archive
pub fn sarc_archive(files: &[(&str, &[u8])]) -> Vec<u8> {
    const KEY: u32 = 0x65;

    let mut pool = Vec::new();
    let mut data = Vec::new();
    let mut table = Vec::new();
    for (name, contents) in files {
        let attrs = 0x0100_0000 | (pool.len() / 4) as u32;
        pool.extend_from_slice(name.as_bytes());
        pool.push(0);
        pool.resize(pool.len().next_multiple_of(4), 0);

        let begin = data.len() as u32;
        data.extend_from_slice(contents);
        table.push([hash_name(name.as_bytes(), KEY), attrs, begin, data.len() as u32]);
        data.resize(data.len().next_multiple_of(4), 0);
    }

    let data_start = 40 + 16 * files.len() + pool.len();
    let file_size = data_start + data.len();

    let mut out = b"SARC".to_vec();
    out.extend_from_slice(&[0x00, 0x14, 0xFE, 0xFF]);
    out.extend_from_slice(&(file_size as u32).to_be_bytes());
    out.extend_from_slice(&(data_start as u32).to_be_bytes());
    out.extend_from_slice(&[0x01, 0x00, 0x00, 0x00]);

    out.extend_from_slice(b"SFAT");
    out.extend_from_slice(&12u16.to_be_bytes());
    out.extend_from_slice(&(files.len() as u16).to_be_bytes());
    out.extend_from_slice(&KEY.to_be_bytes());
    for entry in table {
        for value in entry {
            out.extend_from_slice(&value.to_be_bytes());
        }
    }

    out.extend_from_slice(b"SFNT");
    out.extend_from_slice(&[0x00, 0x08, 0x00, 0x00]);
    out.extend_from_slice(&pool);
    out.extend_from_slice(&data);
    out
}

/// Wrap `data` in a Yaz0 stream made only of literals
pub fn yaz0(data: &[u8]) -> Vec<u8> {
    let mut output = b"Yaz0".to_vec();
    output.extend_from_slice(&(data.len() as u32).to_be_bytes());
    output.extend_from_slice(&[0; 8]);
    for group in data.chunks(8) {
        output.push(0xFF);
        output.extend_from_slice(group);
    }
    output
}
