// In benches/page_bench.rs

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use bulkrow::{
    BufferAllocator, BulkrowError, ColumnType, Page, PageBuilder, PageOutput, PageReader,
    Schema, Timestamp,
};

/// A sink that drops pages immediately, so the write path is what's measured.
struct DrainOutput;

impl PageOutput for DrainOutput {
    fn push(&mut self, page: Page) -> Result<(), BulkrowError> {
        black_box(page);
        Ok(())
    }
    fn finish(&mut self) -> Result<(), BulkrowError> {
        Ok(())
    }
}

fn bench_schema() -> Arc<Schema> {
    Arc::new(Schema::new([
        ("flag", ColumnType::Boolean),
        ("count", ColumnType::Long),
        ("name", ColumnType::String),
        ("at", ColumnType::Timestamp),
    ]))
}

const BENCH_RECORDS: i64 = 10_000;

fn write_records(builder: &mut PageBuilder) {
    for i in 0..BENCH_RECORDS {
        builder.set_boolean(0, i % 2 == 0).unwrap();
        builder.set_long(1, i).unwrap();
        builder.set_string(2, "a-moderately-sized-string-value").unwrap();
        builder
            .set_timestamp(3, Timestamp::new(1_600_000_000 + i, 0))
            .unwrap();
        builder.add_record().unwrap();
    }
}

fn bench_page_pipeline(c: &mut Criterion) {
    let schema = bench_schema();
    let allocator = BufferAllocator::default();

    c.bench_function("build_10k_records", |b| {
        b.iter(|| {
            let mut builder = PageBuilder::new(
                allocator.clone(),
                Arc::clone(&schema),
                Box::new(DrainOutput),
            )
            .unwrap();
            write_records(&mut builder);
            builder.finish().unwrap();
        })
    });

    // Build one page up front, then measure decode alone.
    #[derive(Clone, Default)]
    struct KeepLast(Rc<RefCell<Option<Page>>>);
    impl PageOutput for KeepLast {
        fn push(&mut self, page: Page) -> Result<(), BulkrowError> {
            *self.0.borrow_mut() = Some(page);
            Ok(())
        }
        fn finish(&mut self) -> Result<(), BulkrowError> {
            Ok(())
        }
    }

    let page = {
        let keep = KeepLast::default();
        let handle = Rc::clone(&keep.0);
        let mut builder =
            PageBuilder::new(allocator.clone(), Arc::clone(&schema), Box::new(keep)).unwrap();
        for i in 0..1000 {
            builder.set_long(1, i).unwrap();
            builder.set_string(2, "payload").unwrap();
            builder.add_record().unwrap();
        }
        builder.finish().unwrap();
        drop(builder);
        handle.take().expect("one page was flushed")
    };

    c.bench_function("read_1k_records", |b| {
        b.iter(|| {
            let mut reader = PageReader::new(Arc::clone(&schema), &page).unwrap();
            let mut sum = 0i64;
            while reader.next_record() {
                sum += reader.get_long(1).unwrap();
            }
            black_box(sum);
        })
    });
}

criterion_group!(benches, bench_page_pipeline);
criterion_main!(benches);
