use gridfix::prelude::*;

#[test]
fn attributes_on_every_target() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("attributes.gfx");

    let mut f = gridfix::create(&path).unwrap();
    assert!(f.attribute_names().unwrap().is_empty());

    f.add_attribute("description", "bogus example script").unwrap();
    f.add_attribute("history", "Created 18/10/26").unwrap();
    f.add_attribute("source", "netCDF4 python module tutorial").unwrap();

    let mut g = f.add_group("Temp_data").unwrap();
    g.add_attribute("comment", "group level").unwrap();
    g.add_attribute("levels", vec![0_i32, 10, 20]).unwrap();
    g.add_dimension("lon", 28).unwrap();

    let mut v = g.add_variable::<f32>("Longitude", &["lon"]).unwrap();
    v.put_attribute("units", "degrees east").unwrap();
    v.put_attribute("valid_range", vec![45.0_f32, 99.0]).unwrap();
    v.put_attribute("scale", 1.0_f64).unwrap();
    v.put_attribute("flags", &["east", "west"][..]).unwrap();

    // overwriting keeps the position
    f.add_attribute("history", "Modified 18/10/26").unwrap();
    assert_eq!(
        f.attribute_names().unwrap(),
        ["description", "history", "source"]
    );
    f.close().unwrap();

    let f = gridfix::open(&path).unwrap();
    assert_eq!(
        f.attribute_names().unwrap(),
        ["description", "history", "source"]
    );
    assert_eq!(f.attribute("history").unwrap().as_str(), Some("Modified 18/10/26"));

    let g = f.group("Temp_data").unwrap().unwrap();
    assert_eq!(g.attribute_names(), ["comment", "levels"]);
    assert_eq!(g.attribute("levels").unwrap(), &AttrValue::I32s(vec![0, 10, 20]));

    let v = g.variable("Longitude").unwrap();
    assert_eq!(v.attribute_names(), ["units", "valid_range", "scale", "flags"]);
    assert_eq!(v.attribute("units").unwrap().as_str(), Some("degrees east"));
    assert_eq!(
        v.attribute("valid_range").unwrap(),
        &AttrValue::F32s(vec![45., 99.])
    );
    assert_eq!(v.attribute("scale").unwrap(), &AttrValue::F64(1.));
    assert_eq!(
        v.attribute("flags").unwrap(),
        &AttrValue::Strs(vec!["east".into(), "west".into()])
    );

    let pairs: Vec<(&str, String)> = v
        .attributes()
        .iter()
        .map(|(n, a)| (n, a.to_string()))
        .collect();
    assert_eq!(pairs[0], ("units", "\"degrees east\"".to_string()));
}

#[test]
fn missing_attributes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.gfx");

    let mut f = gridfix::create(&path).unwrap();
    let mut root = f.root_mut().unwrap();
    root.add_dimension("x", 2).unwrap();
    root.add_variable::<u8>("v", &["x"]).unwrap();
    f.close().unwrap();

    let f = gridfix::open(&path).unwrap();
    assert!(matches!(f.attribute("units"), Err(Error::AttributeNotFound(n)) if n == "units"));

    let root = f.root().unwrap();
    let v = root.variable("v").unwrap();
    assert!(v.attribute_names().is_empty());
    assert!(matches!(v.attribute("units"), Err(Error::AttributeNotFound(_))));
}

#[test]
fn same_name_on_different_targets() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("targets.gfx");

    let mut f = gridfix::create(&path).unwrap();
    f.add_attribute("units", "file").unwrap();
    let mut g = f.add_group("g").unwrap();
    g.add_attribute("units", "group").unwrap();
    g.add_dimension("x", 1).unwrap();
    g.add_variable::<i8>("v", &["x"])
        .unwrap()
        .put_attribute("units", "variable")
        .unwrap();
    f.close().unwrap();

    let f = gridfix::open(&path).unwrap();
    let g = f.group("g").unwrap().unwrap();
    assert_eq!(f.attribute("units").unwrap().as_str(), Some("file"));
    assert_eq!(g.attribute("units").unwrap().as_str(), Some("group"));
    assert_eq!(
        g.variable("v").unwrap().attribute("units").unwrap().as_str(),
        Some("variable")
    );
}
