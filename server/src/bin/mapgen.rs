use clap::Parser;
use log::{info, warn};
use server::mapgen::{map_file_name, save_map, MapGenerator};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Random map generator for CHaser", long_about = None)]
struct Args {
    /// Number of maps to generate
    #[arg(value_parser = clap::value_parser!(u32).range(1..))]
    count: u32,

    /// Maximum number of blocks per quadrant
    #[arg(short = 'b', long, default_value = "9")]
    block_num: usize,

    /// Maximum number of items per quadrant
    #[arg(short = 'i', long, default_value = "10")]
    item_num: usize,

    /// Output directory
    #[arg(short = 'o', long, default_value = "./generated_map")]
    output: PathBuf,

    /// Random seed, 0 for entropy
    #[arg(short = 's', long, default_value = "0")]
    seed: u64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Args::parse();

    let mut generator = if args.seed != 0 {
        info!("Using seed {}", args.seed);
        MapGenerator::with_seed(args.seed)
    } else {
        info!("Using a random seed");
        MapGenerator::new()
    };

    info!(
        "Generating {} map(s) into {} (max blocks {}, max items {})",
        args.count,
        args.output.display(),
        args.block_num,
        args.item_num
    );

    let count = args.count as usize;
    let mut written = 0;
    for index in 1..=count {
        let board = generator.generate(args.block_num, args.item_num);
        let path = args.output.join(map_file_name(index));

        match save_map(&board, &path) {
            Ok(()) => {
                written += 1;
                info!("[{}/{}] Generated {}", index, count, path.display());
            }
            Err(e) => warn!("Failed to save map {}: {}", index, e),
        }
    }

    if written < count {
        return Err(format!("generated {}/{} maps", written, count).into());
    }
    info!("Generated {} map(s)", written);

    Ok(())
}
