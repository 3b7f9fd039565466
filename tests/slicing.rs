use gridfix::prelude::*;
use ndarray::{arr1, arr2, s, Array, Array3, ArrayD, Ix1, Ix2, IxDyn};
use rand::{rngs::StdRng, Rng, SeedableRng};

fn grid(shape: (usize, usize, usize), seed: u64) -> Array3<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    Array::from_shape_fn(shape, |_| rng.gen_range(-50.0..50.0))
}

fn create_with<F>(name: &str, build: F) -> (tempfile::TempDir, std::path::PathBuf)
where
    F: FnOnce(&mut GroupMut<'_>),
{
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(name);

    let mut f = gridfix::create(&path).unwrap();
    build(&mut f.root_mut().unwrap());
    f.close().unwrap();

    (dir, path)
}

#[test]
fn slices_across_chunks() {
    let values = grid((10, 12, 7), 1);

    let (_dir, path) = create_with("chunks.gfx", |root| {
        root.add_dimension("a", 10).unwrap();
        root.add_dimension("b", 12).unwrap();
        root.add_dimension("c", 7).unwrap();
        root.add_variable_with_options(
            "v",
            Datatype::F32,
            &["a", "b", "c"],
            VariableOptions::new().chunking(&[3, 5, 2]).zlib().shuffle(true),
        )
        .unwrap()
        .put(.., values.view())
        .unwrap();
    });

    let f = gridfix::open_with(
        &path,
        Options {
            chunk_cache_bytes: 256,
        },
    )
    .unwrap();
    let v = f.root().unwrap().variable("v").unwrap();
    assert_eq!(v.chunk_shape(), [3, 5, 2]);
    assert_eq!(v.options().deflate, Some(4));
    assert!(v.options().shuffle);

    assert_eq!(v.values::<f32, _>(..).unwrap(), values.clone().into_dyn());

    let sub = v.values::<f32, _>(s![2..9, 4..11, 1..6]).unwrap();
    assert_eq!(sub, values.slice(s![2..9, 4..11, 1..6]).into_dyn());

    let column = v.values::<f32, _>(s![4, 7, ..]).unwrap();
    assert_eq!(column, values.slice(s![4, 7, ..]).into_dyn());

    let plane = v.values::<f32, _>((.., 3, ..)).unwrap();
    assert_eq!(plane, values.slice(s![.., 3, ..]).into_dyn());

    let start: &[usize] = &[1, 2, 3];
    let count: &[usize] = &[2, 2, 2];
    let counted = v.values::<f32, _>((start, count)).unwrap();
    assert_eq!(counted, values.slice(s![1..3, 2..4, 3..5]).into_dyn());

    assert_eq!(v.value::<f32, _>((9, 11, 6)).unwrap(), values[[9, 11, 6]]);
}

#[test]
fn reads_only_overlapping_chunks() {
    let values = grid((28, 22, 20), 7);
    let chunk_bytes = 14 * 11 * 10 * 4;

    let (_dir, path) = create_with("partial.gfx", |root| {
        root.add_unlimited_dimension("time").unwrap();
        root.add_dimension("lon", 28).unwrap();
        root.add_dimension("lat", 22).unwrap();
        root.add_dimension("z", 20).unwrap();
        let mut t = root
            .add_variable_with_options(
                "Temperature",
                Datatype::F32,
                &["time", "lon", "lat", "z"],
                VariableOptions::new().chunking(&[1, 14, 11, 10]).zlib(),
            )
            .unwrap();
        for i in 0..3 {
            t.put(s![i, .., .., ..], values.view()).unwrap();
        }
    });

    let f = gridfix::open_with(
        &path,
        Options {
            chunk_cache_bytes: 1024 * 1024 * 1024,
        },
    )
    .unwrap();
    assert_eq!(f.cached_bytes(), 0);

    let t = f.root().unwrap().variable("Temperature").unwrap();
    let surface = t.values::<f32, _>(s![0, .., .., 0]).unwrap();
    assert_eq!(surface, values.slice(s![.., .., 0]).into_dyn());

    // 4 of the 24 chunks hold z = 0 of the first record
    assert_eq!(f.cached_bytes(), 4 * chunk_bytes);

    // already decoded
    t.values::<f32, _>(s![0, 3..20, 2..15, 0]).unwrap();
    assert_eq!(f.cached_bytes(), 4 * chunk_bytes);

    assert_eq!(t.value::<f32, _>([2, 27, 21, 19]).unwrap(), values[[27, 21, 19]]);
    assert_eq!(f.cached_bytes(), 5 * chunk_bytes);
}

#[test]
fn selector_errors() {
    let (_dir, path) = create_with("errors.gfx", |root| {
        root.add_dimension("x", 4).unwrap();
        root.add_dimension("y", 3).unwrap();
        root.add_unlimited_dimension("t").unwrap();
        root.add_variable::<i16>("v", &["x", "y"]).unwrap();
        root.add_variable::<i16>("r", &["t", "x"])
            .unwrap()
            .put(s![0, ..], arr1(&[1_i16, 2, 3, 4]).view())
            .unwrap();
    });

    let f = gridfix::open(&path).unwrap();
    let root = f.root().unwrap();
    let v = root.variable("v").unwrap();

    assert!(matches!(
        v.values::<i16, _>(s![4, ..]),
        Err(Error::OutOfRange { axis: 0, .. })
    ));
    assert!(matches!(
        v.values::<i16, _>(s![.., 1..4]),
        Err(Error::OutOfRange { axis: 1, end: 4, len: 3 })
    ));
    assert!(matches!(
        v.values::<i16, _>(s![.., .., ..]),
        Err(Error::SelectorRank { expected: 2, found: 3 })
    ));
    assert!(matches!(
        v.values::<f32, _>(..),
        Err(Error::TypeMismatch {
            expected: Datatype::I16,
            found: Datatype::F32
        })
    ));
    assert!(matches!(
        v.values::<i16, _>(s![..;2, ..]),
        Err(Error::InvalidSelector(_))
    ));

    // reads along the unlimited axis are bounded by its current length
    let r = root.variable("r").unwrap();
    assert!(matches!(
        r.values::<i16, _>(s![1, ..]),
        Err(Error::OutOfRange { axis: 0, end: 1, len: 1 })
    ));
}

#[test]
fn write_errors_leave_variable_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("atomic.gfx");

    let mut f = gridfix::create(&path).unwrap();
    let mut root = f.root_mut().unwrap();
    root.add_dimension("x", 4).unwrap();
    root.add_unlimited_dimension("t").unwrap();
    let mut v = root.add_variable::<i32>("v", &["t", "x"]).unwrap();

    assert!(matches!(
        v.put(s![0, ..], arr1(&[1, 2, 3]).view()),
        Err(Error::ShapeMismatch { .. })
    ));
    assert!(matches!(
        v.put(s![0, 2..6], arr1(&[1, 2, 3, 4]).view()),
        Err(Error::OutOfRange { .. })
    ));
    assert!(matches!(
        v.put(s![0, ..], arr1(&[1_i64, 2, 3, 4]).view()),
        Err(Error::TypeMismatch { .. })
    ));
    assert!(matches!(
        v.put(s![0], arr1(&[1, 2, 3, 4]).view()),
        Err(Error::SelectorRank { .. })
    ));

    assert_eq!(v.shape(), [0, 4]);
    drop(v);
    assert_eq!(root.dimension("t").unwrap().len(), 0);
    f.close().unwrap();

    let f = gridfix::open(&path).unwrap();
    assert_eq!(f.root().unwrap().variable("v").unwrap().shape(), [0, 4]);
}

#[test]
fn index_axes_kept_or_dropped() {
    let (_dir, path) = create_with("layouts.gfx", |root| {
        root.add_unlimited_dimension("time").unwrap();
        root.add_dimension("x", 2).unwrap();
        root.add_dimension("y", 3).unwrap();

        let mut v = root.add_variable::<u8>("v", &["time", "x", "y"]).unwrap();
        // index axis dropped from the values
        v.put(s![0, .., ..], arr2(&[[1_u8, 2, 3], [4, 5, 6]]).view())
            .unwrap();
        // index axis kept with length 1
        let kept = Array::from_shape_vec((1, 2, 3), vec![7_u8, 8, 9, 10, 11, 12]).unwrap();
        v.put(s![1, .., ..], kept.view()).unwrap();
    });

    let f = gridfix::open(&path).unwrap();
    let v = f.root().unwrap().variable("v").unwrap();

    let r1 = v.values::<u8, _>(s![1, .., ..]).unwrap();
    assert_eq!(r1.shape(), [2, 3]);
    assert_eq!(r1.into_dimensionality::<Ix2>().unwrap(), arr2(&[[7_u8, 8, 9], [10, 11, 12]]));

    let r0 = v.values::<u8, _>(s![0..1, .., ..]).unwrap();
    assert_eq!(r0.shape(), [1, 2, 3]);

    let y = v.values::<u8, _>(s![.., 1, 2]).unwrap();
    assert_eq!(y.into_dimensionality::<Ix1>().unwrap(), arr1(&[6_u8, 12]));
}

#[test]
fn unwritten_elements_read_as_fill() {
    let (_dir, path) = create_with("fill.gfx", |root| {
        root.add_unlimited_dimension("time").unwrap();
        root.add_dimension("x", 3).unwrap();

        root.add_variable::<f64>("d", &["time", "x"])
            .unwrap()
            .put(s![4, 1], ndarray::arr0(1.5).view())
            .unwrap();
        root.add_variable::<i64>("never", &["x"]).unwrap();
        root.add_variable::<u16>("other", &["time"]).unwrap();
    });

    let f = gridfix::open(&path).unwrap();
    let root = f.root().unwrap();

    let d = root.variable("d").unwrap();
    assert_eq!(d.shape(), [5, 3]);
    let values = d.values::<f64, _>(..).unwrap();
    assert_eq!(values[[4, 1]], 1.5);
    assert_eq!(values.iter().filter(|&&x| x == f64::FILL).count(), 14);
    assert_eq!(f64::FILL, 9.969_209_968_386_869e36);

    let never = root.variable("never").unwrap().values::<i64, _>(..).unwrap();
    assert!(never.iter().all(|&x| x == -9223372036854775806));

    // grown by another variable sharing the unlimited dimension
    let other = root.variable("other").unwrap();
    assert_eq!(other.shape(), [5]);
    assert!(other
        .values::<u16, _>(..)
        .unwrap()
        .iter()
        .all(|&x| x == 65535));
}

#[test]
fn overwrite_is_idempotent() {
    let values = grid((4, 6, 5), 7);
    let build = |root: &mut GroupMut<'_>| {
        root.add_dimension("a", 4).unwrap();
        root.add_dimension("b", 6).unwrap();
        root.add_dimension("c", 5).unwrap();
        let mut v = root
            .add_variable_with_options(
                "v",
                Datatype::F32,
                &["a", "b", "c"],
                VariableOptions::new().chunking(&[2, 4, 5]).zlib(),
            )
            .unwrap();
        v.put(.., values.view()).unwrap();
        v.put(s![1..3, 2..5, ..], values.slice(s![1..3, 2..5, ..])).unwrap();
    };

    let (_d1, once) = create_with("once.gfx", |root| {
        build(root);
    });
    let (_d2, twice) = create_with("twice.gfx", |root| {
        build(root);
        root.variable_mut("v").unwrap().put(.., values.view()).unwrap();
    });

    assert_eq!(std::fs::read(&once).unwrap().len(), std::fs::read(&twice).unwrap().len());

    let a = gridfix::open(&once).unwrap();
    let b = gridfix::open(&twice).unwrap();
    let va: ArrayD<f32> = a.root().unwrap().variable("v").unwrap().values(..).unwrap();
    let vb: ArrayD<f32> = b.root().unwrap().variable("v").unwrap().values(..).unwrap();
    assert_eq!(va, vb);
    assert_eq!(va, values.into_dyn());
}

#[test]
fn quantized_within_precision() {
    let values = grid((2, 30, 30), 3);

    let (_dir, path) = create_with("lsd.gfx", |root| {
        root.add_dimension("a", 2).unwrap();
        root.add_dimension("b", 30).unwrap();
        root.add_dimension("c", 30).unwrap();
        root.add_variable_with_options(
            "q",
            Datatype::F32,
            &["a", "b", "c"],
            VariableOptions::new().zlib().least_significant_digit(1),
        )
        .unwrap()
        .put(.., values.view())
        .unwrap();
        root.add_variable_with_options(
            "raw",
            Datatype::F32,
            &["a", "b", "c"],
            VariableOptions::new().zlib(),
        )
        .unwrap()
        .put(.., values.view())
        .unwrap();
    });

    let f = gridfix::open(&path).unwrap();
    let root = f.root().unwrap();

    let q = root.variable("q").unwrap();
    assert_eq!(q.options().least_significant_digit, Some(1));
    for (a, b) in q.values::<f32, _>(..).unwrap().iter().zip(values.iter()) {
        assert!((a - b).abs() <= 0.1);
    }

    let raw = root.variable("raw").unwrap().values::<f32, _>(..).unwrap();
    assert_eq!(raw, values.into_dyn());
}

#[test]
fn scalar_variable() {
    let (_dir, path) = create_with("scalar.gfx", |root| {
        let mut v = root.add_variable::<f64>("offset", &[]).unwrap();
        assert_eq!(v.shape(), Vec::<usize>::new());
        v.put_value((), 273.15).unwrap();
    });

    let f = gridfix::open(&path).unwrap();
    let v = f.root().unwrap().variable("offset").unwrap();
    assert_eq!(v.ndim(), 0);
    assert_eq!(v.value::<f64, _>(()).unwrap(), 273.15);
    assert_eq!(v.values::<f64, _>(..).unwrap()[IxDyn(&[])], 273.15);
}

#[test]
fn dimensions_are_per_group() {
    let dir = tempfile::tempdir().unwrap();
    let mut f = gridfix::create(dir.path().join("groups.gfx")).unwrap();
    f.root_mut().unwrap().add_dimension("x", 3).unwrap();

    let mut g = f.add_group("g").unwrap();
    assert!(matches!(
        g.add_variable::<f32>("v", &["x"]),
        Err(Error::UnknownDimension(_))
    ));
    g.add_dimension("x", 5).unwrap();
    assert_eq!(g.add_variable::<f32>("v", &["x"]).unwrap().shape(), [5]);

    assert!(matches!(f.add_group("g"), Err(Error::DuplicateName(_))));
    f.close().unwrap();
}
