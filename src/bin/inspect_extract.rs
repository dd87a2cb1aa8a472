use anyhow::{Context, Result};
use clap::Parser;
use parquet::file::reader::{FileReader, SerializedFileReader};
use parquet::schema::types::Type;
use regfeed::extract::read_parquet_rows;
use std::{fs::File, path::PathBuf};

#[derive(Parser)]
#[command(about = "Print the schema and first rows of a parquet extract")]
struct Args {
    parquet: PathBuf,
    /// Rows to print.
    #[arg(default_value_t = 5)]
    rows: usize,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // 1) file-level metadata
    let file = File::open(&args.parquet)
        .with_context(|| format!("opening {}", args.parquet.display()))?;
    let reader = SerializedFileReader::new(file)?;
    let meta = reader.metadata();
    let file_meta = meta.file_metadata();
    println!("=== Extract: {} ===", args.parquet.display());
    println!(
        "Created by:     {}",
        file_meta.created_by().unwrap_or("<unknown>")
    );
    println!("Total rows:     {}", file_meta.num_rows());
    println!("Row groups:     {}", meta.num_row_groups());
    println!();

    // 2) schema
    println!("=== Schema ===");
    print_schema(file_meta.schema_descr().root_schema(), 0);
    println!();

    // 3) rows as the programs see them
    println!("=== First {} rows ===", args.rows);
    let rows = read_parquet_rows(&args.parquet)?;
    for (i, row) in rows.iter().take(args.rows).enumerate() {
        let cells: Vec<String> = row
            .columns()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect();
        println!("{:>5}: {}", i + 1, cells.join(" "));
    }
    Ok(())
}

fn print_schema(node: &Type, level: usize) {
    let indent = "  ".repeat(level);
    match node {
        Type::PrimitiveType {
            basic_info,
            physical_type,
            ..
        } => {
            let logical = basic_info
                .logical_type()
                .as_ref()
                .map_or(String::new(), |lt| format!(", {:?}", lt));
            println!(
                "{}- {}: {:?}{}",
                indent,
                basic_info.name(),
                physical_type,
                logical
            );
        }
        Type::GroupType {
            basic_info, fields, ..
        } => {
            println!("{}+ {} (group)", indent, basic_info.name());
            for field in fields {
                print_schema(field.as_ref(), level + 1);
            }
        }
    }
}
