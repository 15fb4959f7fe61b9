use criterion::{Criterion, black_box, criterion_group, criterion_main};
use glam::{UVec2, UVec3, Vec3};
use umbra_volume::*;

fn cloud_atlas() -> DensityAtlas {
    let layout = AtlasLayout::new(
        UVec3::new(60, 48, 30),
        UVec2::new(384, 240),
        UVec2::new(6, 5),
        SlicePolicy::Exact,
    )
    .unwrap();
    DensityAtlas::from_voxels(layout, |v| {
        let p = v.as_vec3() * 0.15;
        (0.5 + 0.5 * (p.x.sin() * p.y.cos() + (p.z * 0.7).sin() * 0.5)).clamp(0.0, 1.0)
    })
}

fn pass() -> ShadowPass {
    ShadowPass::new(
        LightDirection::new(Vec3::new(1.0, 0.3, 0.5)).unwrap(),
        RayMarchConfig::new(81, 2.0).unwrap(),
    )
}

fn bench_sample(c: &mut Criterion) {
    let atlas = cloud_atlas();
    let sampler = DensitySampler::new(&atlas);
    let p = black_box(Vec3::new(17.3, 22.8, 11.4));
    c.bench_function("density_sample", |bencher| {
        bencher.iter(|| black_box(sampler.sample(p)))
    });
}

fn bench_single_ray(c: &mut Criterion) {
    let atlas = cloud_atlas();
    let marcher = RayMarcher::new(
        DensitySampler::new(&atlas),
        pass().light(),
        pass().march(),
    );
    c.bench_function("integrate_shadow_81_steps", |bencher| {
        bencher.iter(|| black_box(marcher.integrate_voxel(black_box(UVec3::new(3, 5, 2)))))
    });
}

fn bench_full_pass(c: &mut Criterion) {
    let atlas = cloud_atlas();
    let shadow = pass();
    let serial = SerialDispatch;
    let pool = PoolDispatch::new(0).unwrap();
    c.bench_function("shadow_pass_serial", |bencher| {
        bencher.iter(|| black_box(shadow.run(&atlas, &serial)))
    });
    c.bench_function("shadow_pass_pool", |bencher| {
        bencher.iter(|| black_box(shadow.run(&atlas, &pool)))
    });
}

criterion_group!(benches, bench_sample, bench_single_ray, bench_full_pass);
criterion_main!(benches);
