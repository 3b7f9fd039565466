//! Write a sample file with a group of coordinates and a random temperature
//! grid, then read it back and print the first surface record.
use std::path::PathBuf;

use chrono::{Datelike, Local, NaiveDate};
use clap::Parser;
use ndarray::{s, Array, Array1, Array4};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use gridfix::{Datatype, VariableOptions};

#[derive(Parser, Debug)]
#[command(version, about = "Write and read back a sample gridfix file")]
struct Args {
    /// Output file
    #[arg(short, long, default_value = "sample.gfx")]
    output: PathBuf,

    /// Seed for the random temperatures
    #[arg(short, long)]
    seed: Option<u64>,
}

fn write(args: &Args) -> anyhow::Result<()> {
    let mut f = gridfix::create(&args.output)?;
    println!("Writing {:?}..", args.output);

    f.add_attribute("description", "Example dataset containing one group")?;
    f.add_attribute(
        "history",
        format!("Created {}", Local::now().format("%d/%m/%y")),
    )?;

    let mut g = f.add_group("Temp_data")?;

    let lon = Array1::<f32>::range(45., 101., 2.);
    let lat = Array1::<f32>::range(-30., 25., 2.5);
    let z: Array1<i32> = Array1::<f64>::range(0., 200., 10.).mapv(|v| v as i32);

    g.add_dimension("lon", lon.len())?;
    g.add_dimension("lat", lat.len())?;
    g.add_dimension("z", z.len())?;
    g.add_unlimited_dimension("time")?;

    let mut v = g.add_variable::<f32>("Longitude", &["lon"])?;
    v.put_attribute("units", "degrees east")?;
    v.put(.., lon.view())?;

    let mut v = g.add_variable::<f32>("Latitude", &["lat"])?;
    v.put_attribute("units", "degrees north")?;
    v.put(.., lat.view())?;

    let mut v = g.add_variable_with_type("Levels", "i4", &["z"])?;
    v.put_attribute("units", "meters")?;
    v.put(.., z.view())?;

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let temp: Array4<f32> = Array::from_shape_fn((1, lon.len(), lat.len(), z.len()), |_| {
        rng.gen_range(10..25) as f32 + rng.gen::<f32>()
    });

    let mut v = g.add_variable_with_options(
        "Temperature",
        Datatype::F32,
        &["time", "lon", "lat", "z"],
        VariableOptions::new().zlib().least_significant_digit(1),
    )?;
    v.put_attribute("units", "Kelvin")?;
    v.put_attribute("warning", "This data is not real!")?;
    v.put_attribute(
        "description",
        "This is a description of the input data, could be as long as we want yada yada yada",
    )?;
    v.put(s![0, .., .., ..], temp.view())?;

    let mut v = g.add_variable::<i32>("Time", &["time"])?;
    v.put_attribute("units", "days since Jan 01, 0001")?;

    // day ordinal, 0001-01-01 is day 1
    let today: NaiveDate = Local::now().date_naive();
    v.put_value(s![0], today.num_days_from_ce())?;

    print!("{f}");
    f.close()?;

    Ok(())
}

fn read(args: &Args) -> anyhow::Result<()> {
    let f = gridfix::open(&args.output)?;
    println!("\nReading {:?}..", args.output);

    let g = f
        .group("Temp_data")?
        .ok_or_else(|| anyhow::anyhow!("missing group Temp_data"))?;
    println!("meta data for the Temp_data group:\n{g}");
    println!("variables: {:?}", g.variable_names());
    println!("description: {}", f.attribute("description")?);

    let temp = g
        .variable("Temperature")
        .ok_or_else(|| anyhow::anyhow!("missing variable Temperature"))?;
    println!("meta data for Temperature variable:\n{temp}");

    let time = g
        .variable("Time")
        .ok_or_else(|| anyhow::anyhow!("missing variable Time"))?;
    println!("Time attributes: {:?}", time.attribute_names());
    println!("Time units: {}", time.attribute("units")?);

    let surface = temp.values::<f32, _>(s![0, .., .., 0])?;

    println!("Temperature[0, :, :, 0] ({:?}) =\n{surface}", surface.shape());

    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    write(&args)?;
    read(&args)?;

    Ok(())
}
