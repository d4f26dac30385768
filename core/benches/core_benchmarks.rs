use criterion::{Criterion, black_box, criterion_group, criterion_main};

use redlilium_core::image::{
    BufferFormat, FormatInfo, ImageBufferList, ImageData, ImageSettings, PitchFlags, Rect,
};

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

fn bench_pitch(c: &mut Criterion) {
    let info = FormatInfo::new(BufferFormat::Bc3Unorm);
    c.bench_function("pitch_bc3_1024", |b| {
        b.iter(|| info.pitch(black_box(1024), black_box(1024), PitchFlags::empty()));
    });
}

fn bench_buffer_list_cube_chain(c: &mut Criterion) {
    let settings = ImageSettings::new_cube(1024, BufferFormat::R8G8B8A8Unorm)
        .with_mip_count(0)
        .sanitize();
    c.bench_function("buffer_list_cube_1024_full_chain", |b| {
        b.iter(|| ImageBufferList::create_buffers(black_box(&settings)));
    });
}

fn bench_buffer_list_volume(c: &mut Criterion) {
    let settings = ImageSettings::new_3d(256, 256, 256, BufferFormat::R8Unorm)
        .with_mip_count(0)
        .sanitize();
    c.bench_function("buffer_list_volume_256_full_chain", |b| {
        b.iter(|| ImageBufferList::create_buffers(black_box(&settings)));
    });
}

// ---------------------------------------------------------------------------
// Buffer copies
// ---------------------------------------------------------------------------

fn bench_copy_region(c: &mut Criterion) {
    let settings = ImageSettings::new_2d(512, 512, BufferFormat::R8G8B8A8Unorm);
    let source = ImageData::new(settings).unwrap();
    let mut dest = ImageData::new(settings).unwrap();

    c.bench_function("copy_region_256_rgba8", |b| {
        b.iter(|| {
            let src = source.buffer(0, 0).unwrap();
            let mut dst = dest.buffer_mut(0, 0).unwrap();
            src.copy_to(
                &mut dst,
                Some(Rect::new(64, 64, 256, 256)),
                black_box(-32),
                black_box(100),
            )
            .unwrap();
        });
    });
}

// ---------------------------------------------------------------------------
// Transforms
// ---------------------------------------------------------------------------

#[cfg(feature = "codecs")]
fn bench_generate_mips(c: &mut Criterion) {
    use redlilium_core::image::{ImageCrateTransform, ImageFilter};

    let transform = ImageCrateTransform::new();
    let image = ImageData::new(ImageSettings::new_2d(256, 256, BufferFormat::R8G8B8A8Unorm))
        .unwrap();

    c.bench_function("generate_mips_256_linear", |b| {
        b.iter(|| {
            let mut image = image.clone();
            image
                .generate_mip_maps(0, ImageFilter::Linear, &transform)
                .unwrap()
        });
    });
}

#[cfg(not(feature = "codecs"))]
fn bench_generate_mips(_c: &mut Criterion) {}

criterion_group!(
    benches,
    bench_pitch,
    bench_buffer_list_cube_chain,
    bench_buffer_list_volume,
    bench_copy_region,
    bench_generate_mips,
);
criterion_main!(benches);
