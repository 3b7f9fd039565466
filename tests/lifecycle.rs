use gridfix::prelude::*;
use ndarray::{arr1, s, Array, Ix2};

fn records(path: &std::path::Path, n: usize) {
    let mut f = gridfix::create(path).unwrap();
    let mut root = f.root_mut().unwrap();
    root.add_unlimited_dimension("time").unwrap();
    root.add_dimension("x", 4).unwrap();

    let mut v = root.add_variable::<f64>("v", &["time", "x"]).unwrap();
    for r in 0..n {
        v.put(s![r, ..], Array::from_elem(4, r as f64).view()).unwrap();
    }
    f.close().unwrap();
}

#[test]
fn second_writer_is_locked_out() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("locked.gfx");

    let mut f = gridfix::create(&path).unwrap();
    assert!(matches!(gridfix::create(&path), Err(Error::LockHeld(_))));
    f.close().unwrap();

    let mut a = gridfix::append(&path).unwrap();
    assert!(matches!(gridfix::append(&path), Err(Error::LockHeld(_))));
    assert!(matches!(gridfix::create(&path), Err(Error::LockHeld(_))));

    // readers do not take the lock
    let r = gridfix::open(&path).unwrap();
    assert_eq!(r.state(), State::Readable);

    a.close().unwrap();
    gridfix::append(&path).unwrap().close().unwrap();
}

#[test]
fn read_only() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ro.gfx");
    records(&path, 1);

    let mut f = gridfix::open(&path).unwrap();
    assert!(matches!(f.add_attribute("a", 1_i32), Err(Error::ReadOnly)));
    assert!(matches!(f.add_group("g"), Err(Error::ReadOnly)));
    assert!(matches!(f.root_mut(), Err(Error::ReadOnly)));
    assert!(matches!(f.group_mut("g"), Err(Error::ReadOnly)));

    // reads are fine
    assert_eq!(f.root().unwrap().variable_names(), ["v"]);
}

#[test]
fn closed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("closed.gfx");

    let mut f = gridfix::create(&path).unwrap();
    f.close().unwrap();
    assert_eq!(f.state(), State::Closed);

    assert!(matches!(f.root(), Err(Error::FileNotOpen)));
    assert!(matches!(f.root_mut(), Err(Error::FileNotOpen)));
    assert!(matches!(f.groups(), Err(Error::FileNotOpen)));
    assert!(matches!(f.group("g"), Err(Error::FileNotOpen)));
    assert!(matches!(f.add_group("g"), Err(Error::FileNotOpen)));
    assert!(matches!(f.attribute("a"), Err(Error::FileNotOpen)));
    assert!(matches!(f.attribute_names(), Err(Error::FileNotOpen)));
    assert!(matches!(f.add_attribute("a", "b"), Err(Error::FileNotOpen)));

    // idempotent
    f.close().unwrap();
    f.close().unwrap();
}

#[test]
fn close_releases_lock() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("release.gfx");

    let mut f = gridfix::create(&path).unwrap();
    assert!(dir.path().join("release.gfx.lock").exists());
    f.close().unwrap();
    assert!(!dir.path().join("release.gfx.lock").exists());
    assert!(!dir.path().join("release.gfx.tmp").exists());
}

#[test]
fn drop_without_close_discards() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dropped.gfx");
    records(&path, 2);

    {
        let mut f = gridfix::append(&path).unwrap();
        f.add_attribute("description", "never persisted").unwrap();
        f.root_mut()
            .unwrap()
            .variable_mut("v")
            .unwrap()
            .put(s![5, ..], arr1(&[1., 2., 3., 4.]).view())
            .unwrap();
    }

    assert!(!dir.path().join("dropped.gfx.lock").exists());

    let f = gridfix::open(&path).unwrap();
    assert!(matches!(
        f.attribute("description"),
        Err(Error::AttributeNotFound(_))
    ));
    assert_eq!(f.root().unwrap().variable("v").unwrap().shape(), [2, 4]);

    // and a dropped create leaves nothing behind
    drop(gridfix::create(dir.path().join("never.gfx")).unwrap());
    assert!(!dir.path().join("never.gfx").exists());
}

#[test]
fn append_grows_records() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("append.gfx");
    records(&path, 3);
    let before = std::fs::metadata(&path).unwrap().len();

    let mut f = gridfix::append(&path).unwrap();
    {
        let mut root = f.root_mut().unwrap();
        let mut v = root.variable_mut("v").unwrap();
        assert_eq!(v.shape(), [3, 4]);
        v.put(s![3.., ..], Array::from_elem((2, 4), 9.).view()).unwrap();
        assert_eq!(v.shape(), [5, 4]);
    }
    f.close().unwrap();
    assert!(std::fs::metadata(&path).unwrap().len() > before);

    let f = gridfix::open(&path).unwrap();
    let v = f.root().unwrap().variable("v").unwrap();
    assert_eq!(v.shape(), [5, 4]);
    assert_eq!(f.root().unwrap().dimension("time").unwrap().len(), 5);

    let values = v.values::<f64, _>(..).unwrap().into_dimensionality::<Ix2>().unwrap();
    for r in 0..3 {
        assert!(values.row(r).iter().all(|&x| x == r as f64));
    }
    assert!(values.slice(s![3.., ..]).iter().all(|&x| x == 9.));
}

#[test]
fn append_modifies_existing_chunk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("modify.gfx");
    records(&path, 2);

    let mut f = gridfix::append(&path).unwrap();
    f.root_mut()
        .unwrap()
        .variable_mut("v")
        .unwrap()
        .put_value(s![1, 2], -1.)
        .unwrap();
    f.close().unwrap();

    let f = gridfix::open(&path).unwrap();
    let row = f
        .root()
        .unwrap()
        .variable("v")
        .unwrap()
        .values::<f64, _>(s![1, ..])
        .unwrap();
    assert_eq!(row.iter().copied().collect::<Vec<_>>(), [1., 1., -1., 1.]);
}

#[test]
fn readers_keep_their_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("snapshot.gfx");
    records(&path, 2);

    let r1 = gridfix::open(&path).unwrap();
    let r2 = gridfix::open(&path).unwrap();

    let mut w = gridfix::append(&path).unwrap();
    {
        let mut root = w.root_mut().unwrap();
        let mut v = root.variable_mut("v").unwrap();
        v.put(s![2, ..], Array::from_elem(4, 7.).view()).unwrap();
        v.put(s![0, ..], Array::from_elem(4, -7.).view()).unwrap();
    }
    w.close().unwrap();

    for r in [&r1, &r2] {
        let v = r.root().unwrap().variable("v").unwrap();
        assert_eq!(v.shape(), [2, 4]);
        assert!(v.values::<f64, _>(s![0, ..]).unwrap().iter().all(|&x| x == 0.));
    }

    let r3 = gridfix::open(&path).unwrap();
    let v = r3.root().unwrap().variable("v").unwrap();
    assert_eq!(v.shape(), [3, 4]);
    assert!(v.values::<f64, _>(s![0, ..]).unwrap().iter().all(|&x| x == -7.));

    // a new file replacing the old one is not visible to open readers either
    records(&path, 1);
    let v = r1.root().unwrap().variable("v").unwrap();
    assert_eq!(v.shape(), [2, 4]);
    assert!(v.values::<f64, _>(s![1, ..]).unwrap().iter().all(|&x| x == 1.));
}

#[test]
fn not_a_gridfix_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("text.gfx");
    std::fs::write(&path, "netcdf sample {\n dimensions:\n lon = 28 ;\n}\n").unwrap();

    assert!(matches!(gridfix::open(&path), Err(Error::Corrupt(_))));
    assert!(matches!(gridfix::append(&path), Err(Error::Corrupt(_))));
    assert!(!dir.path().join("text.gfx.lock").exists());
}

#[test]
fn missing_file() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        gridfix::open(dir.path().join("missing.gfx")),
        Err(Error::Io(_))
    ));
}
