use criterion::{black_box, criterion_group, criterion_main, Criterion};
use voxelkv::{BlockIndex, BlockSize, Mode, Point3, Region, Shape};

fn bench_kernel(c: &mut Criterion) {
    let bs = BlockSize::new(16, 16, 16);
    let block_index = BlockIndex::new(0, 0, 0);

    let mut vol_block = vec![0u8; 16 * 16 * 16];
    let mut vol_buf = vec![7u8; 16 * 16 * 16];
    let vol_region = Region::new_vol(Point3::ZERO, 16, 16, 16);
    c.bench_function("copy_chunk_vol_put_16cube", |b| {
        b.iter(|| {
            voxelkv::kernel::copy_chunk(
                black_box(block_index),
                bs,
                1,
                black_box(&mut vol_block),
                &vol_region,
                black_box(&mut vol_buf),
                Mode::Put,
            )
            .unwrap()
        })
    });

    let mut xy_block = vec![0u8; 16 * 16 * 16];
    let mut xy_buf = vec![7u8; 16 * 16];
    let xy_region = Region::new_slice(Shape::Xy, Point3::ZERO, 16, 16, 16);
    c.bench_function("copy_chunk_xy_put_one_plane", |b| {
        b.iter(|| {
            voxelkv::kernel::copy_chunk(
                black_box(block_index),
                bs,
                1,
                black_box(&mut xy_block),
                &xy_region,
                black_box(&mut xy_buf),
                Mode::Put,
            )
            .unwrap()
        })
    });
}

criterion_group!(benches, bench_kernel);
criterion_main!(benches);
