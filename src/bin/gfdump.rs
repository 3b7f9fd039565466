//! Print the schema and attributes of a gridfix file, and optionally the
//! values of a variable.
use std::path::PathBuf;

use anyhow::{anyhow, Context};
use clap::Parser;

use gridfix::{Datatype, Variable};

#[derive(Parser, Debug)]
#[command(version, about = "Dump the header of a gridfix file")]
struct Args {
    /// Input file
    file: PathBuf,

    /// Also print the values of a variable, as `name` (root) or `group/name`
    #[arg(short, long)]
    var: Option<String>,
}

fn print_values(v: &Variable<'_>) -> anyhow::Result<()> {
    macro_rules! print_as {
        ($t:ty) => {
            println!("{} =\n{}", v.name(), v.values::<$t, _>(..)?)
        };
    }

    match v.dtype() {
        Datatype::I8 => print_as!(i8),
        Datatype::U8 => print_as!(u8),
        Datatype::I16 => print_as!(i16),
        Datatype::U16 => print_as!(u16),
        Datatype::I32 => print_as!(i32),
        Datatype::U32 => print_as!(u32),
        Datatype::I64 => print_as!(i64),
        Datatype::U64 => print_as!(u64),
        Datatype::F32 => print_as!(f32),
        Datatype::F64 => print_as!(f64),
    }

    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let f = gridfix::open(&args.file).with_context(|| format!("opening {:?}", args.file))?;
    print!("{f}");

    if let Some(var) = &args.var {
        let (group, name) = match var.split_once('/') {
            Some((group, name)) => (
                f.group(group)?
                    .ok_or_else(|| anyhow!("no group named `{group}`"))?,
                name,
            ),
            None => (f.root()?, var.as_str()),
        };

        let v = group
            .variable(name)
            .ok_or_else(|| anyhow!("no variable named `{var}`"))?;

        println!();
        print_values(&v)?;
    }

    Ok(())
}
