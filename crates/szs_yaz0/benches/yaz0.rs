use divan::AllocProfiler;

#[global_allocator]
static ALLOC: AllocProfiler = AllocProfiler::system();

fn main() {
    divan::main();
}

pub mod read {
    use divan::Bencher;
    use std::io::{prelude::*, Cursor};
    use szs_yaz0::Yaz0Reader;

    /// About a megabyte made of short literal runs followed by long back-references
    fn get_input() -> Vec<u8> {
        const BLOCKS: u32 = 956;
        // four literals then four maximum length references
        const BLOCK_SIZE: u32 = 4 + 4 * (0xFF + 0x12);

        let mut data = b"Yaz0".to_vec();
        data.extend_from_slice(&(BLOCKS * BLOCK_SIZE).to_be_bytes());
        data.extend_from_slice(&[0; 8]);

        for _ in 0..BLOCKS {
            data.extend_from_slice(&[0xF0, b'l', b'o', b'o', b'p']);
            for _ in 0..4 {
                data.extend_from_slice(&[0x00, 0x03, 0xFF]);
            }
        }
        data
    }

    #[divan::bench]
    fn open(bencher: Bencher) {
        bencher.with_inputs(get_input).bench_refs(|data| {
            divan::black_box(Yaz0Reader::new(Cursor::new(data)).unwrap());
        });
    }

    #[divan::bench(sample_count = 10)]
    fn read_to_end(bencher: Bencher) {
        bencher.with_inputs(get_input).bench_refs(|data| {
            let mut reader = Yaz0Reader::new(Cursor::new(data)).unwrap();
            let mut buffer = Vec::new();
            divan::black_box(reader.read_to_end(&mut buffer)).ok();
        });
    }

    #[divan::bench(sample_count = 10)]
    fn decompress(bencher: Bencher) {
        bencher.with_inputs(get_input).bench_refs(|data| {
            divan::black_box(szs_yaz0::decompress(Cursor::new(data))).ok();
        });
    }
}
