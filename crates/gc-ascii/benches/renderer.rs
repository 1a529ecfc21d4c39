use criterion::{Criterion, criterion_group, criterion_main};
use gc_ascii::renderer::FrameRenderer;
use gc_core::config::{ColorMode, Settings};
use gc_core::frame::{FrameBuffer, GlyphGrid};
use std::hint::black_box;

fn test_frame(w: u32, h: u32) -> FrameBuffer {
    let mut fb = FrameBuffer::new(w, h);
    for (i, px) in fb.data.chunks_exact_mut(4).enumerate() {
        let x = (i as u32 % w) as u8;
        let y = (i as u32 / w) as u8;
        px.copy_from_slice(&[x, y, x ^ y, 255]);
    }
    fb
}

fn bench_render(c: &mut Criterion) {
    let frame = test_frame(640, 480);
    let mut group = c.benchmark_group("render_640x480");

    for (name, cell_size, mode) in [
        ("mono_cell10", 10, ColorMode::Monochrome),
        ("sepia_cell10", 10, ColorMode::Sepia),
        ("neon_cell4", 4, ColorMode::Neon),
    ] {
        let settings = Settings {
            cell_size,
            color_mode: mode,
            ..Settings::default()
        };
        let mut renderer = FrameRenderer::new(&settings.ramp);
        let mut grid = GlyphGrid::new(0, 0, cell_size);
        group.bench_function(name, |b| {
            b.iter(|| renderer.render(black_box(&frame), black_box(&settings), &mut grid));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_render);
criterion_main!(benches);
