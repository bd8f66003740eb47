use clap::Parser;
use slab_optimizer::compare::{Comparison, Recommendation};
use slab_optimizer::config::OptimizerConfig;
use slab_optimizer::presets::{PieceStats, Preset};
use slab_optimizer::types::{Algorithm, PieceRequest, Rect, Solution};
use slab_optimizer::Solver;
use tracing::Level;

#[derive(Parser)]
#[command(
    name = "slab_optimizer",
    about = "Countertop slab cutting optimizer"
)]
struct Cli {
    /// Slab dimensions (WxH, e.g. 133x78)
    #[arg(long, default_value = "133x78")]
    slab: String,

    /// Pieces as WxH[:qty][=label] (e.g. 137x26=Long 50x26:2)
    #[arg(long = "pieces", num_args = 1.., required_unless_present = "preset")]
    pieces: Vec<String>,

    /// Use a built-in piece list: standard or minimal
    #[arg(long, conflicts_with = "pieces")]
    preset: Option<Preset>,

    /// Blade kerf added to each piece dimension
    #[arg(long, default_value_t = 0.125)]
    kerf: f64,

    /// Algorithm: guillotine, first_fit, best_fit, branch_and_bound, or genetic
    #[arg(long, default_value = "guillotine")]
    algorithm: Algorithm,

    /// Do not split pieces that are too long for the slab
    #[arg(long)]
    no_split: bool,

    /// Shortest section kept when splitting
    #[arg(long, default_value_t = 24.0)]
    min_split: f64,

    /// Slab limit for branch_and_bound and genetic
    #[arg(long, default_value_t = 10)]
    max_slabs: usize,

    /// Time budget for branch_and_bound, in milliseconds
    #[arg(long, default_value_t = 10_000)]
    time_limit_ms: u64,

    /// Run every algorithm and rank the results
    #[arg(long)]
    compare: bool,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    /// Log solver details to stderr
    #[arg(long)]
    verbose: bool,
}

fn log_level(verbose: bool) -> Level {
    if verbose { Level::DEBUG } else { Level::INFO }
}

fn parse_dimensions(s: &str) -> Result<Rect, String> {
    let parts: Vec<&str> = s.split('x').collect();
    if parts.len() != 2 {
        return Err(format!("invalid dimensions '{}', expected WxH", s));
    }
    let width = parts[0]
        .parse::<f64>()
        .map_err(|_| format!("invalid width in '{}'", s))?;
    let height = parts[1]
        .parse::<f64>()
        .map_err(|_| format!("invalid height in '{}'", s))?;
    if !(width > 0.0 && height > 0.0) {
        return Err(format!("dimensions must be positive in '{}'", s));
    }
    Ok(Rect::new(width, height))
}

/// Expands one `WxH[:qty][=label]` argument into `qty` requests with
/// sequential ids starting at `next_id`.
fn parse_piece(s: &str, next_id: &mut usize) -> Result<Vec<PieceRequest>, String> {
    let (spec, label) = match s.split_once('=') {
        Some((spec, label)) => (spec, Some(label)),
        None => (s, None),
    };
    let (dims, qty) = match spec.split_once(':') {
        Some((dims, qty)) => {
            let qty = qty
                .parse::<u32>()
                .map_err(|_| format!("invalid quantity in '{}'", s))?;
            (dims, qty)
        }
        None => (spec, 1),
    };
    if qty == 0 {
        return Err(format!("quantity must be non-zero in '{}'", s));
    }
    let rect = parse_dimensions(dims)?;

    Ok((0..qty)
        .map(|_| {
            let id = *next_id;
            *next_id += 1;
            let label = label
                .map(str::to_string)
                .unwrap_or_else(|| format!("Countertop {id}"));
            PieceRequest::new(id.to_string(), rect.w, rect.h, label)
        })
        .collect())
}

fn parse_pieces(args: &[String]) -> Result<Vec<PieceRequest>, String> {
    let mut next_id = 1;
    let mut requests = Vec::new();
    for arg in args {
        requests.extend(parse_piece(arg, &mut next_id)?);
    }
    Ok(requests)
}

fn print_piece_stats(stats: &PieceStats) {
    let largest = stats
        .largest_piece
        .as_ref()
        .map(|p| format!("{} {}x{}", p.label, p.width, p.height))
        .unwrap_or_else(|| "-".to_string());
    println!(
        "{} piece{}, {} sq in, largest: {}",
        stats.piece_count,
        if stats.piece_count == 1 { "" } else { "s" },
        stats.total_area,
        largest
    );
    if stats.oversized_count > 0 {
        println!(
            "Warning: {} piece{} may be too large for the slab",
            stats.oversized_count,
            if stats.oversized_count == 1 { "" } else { "s" }
        );
    }
    println!();
}

fn print_solution(solution: &Solution) {
    for slab in &solution.slabs {
        println!(
            "Slab {} ({:.1}% waste):",
            slab.id, slab.waste_percentage
        );
        for p in &slab.pieces {
            let rot = if p.piece.rotated { " [rotated]" } else { "" };
            println!(
                "  {} {} @ ({}, {}){}",
                p.piece.label,
                p.piece.nominal(),
                p.x,
                p.y,
                rot
            );
        }
        println!();
    }

    for split in &solution.split_pieces {
        println!(
            "{} -> {} sections (split {}ly)",
            split.original_label, split.parts, split.direction
        );
        for (i, part) in split.pieces.iter().enumerate() {
            println!("  Part {}: {}", i + 1, part.nominal());
        }
    }

    let stats = &solution.stats;
    println!(
        "Summary: {} piece{} on {} slab{}, {:.1}% waste, {:.2} sq ft, est. ${:.2}{}",
        stats.total_pieces,
        if stats.total_pieces == 1 { "" } else { "s" },
        stats.total_slabs,
        if stats.total_slabs == 1 { "" } else { "s" },
        stats.total_waste_percentage,
        stats.total_slab_sq_ft,
        stats.estimated_cost,
        if solution.optimal { " (optimal)" } else { "" },
    );
}

fn print_comparison(comparison: &Comparison) {
    for (rank, run) in comparison.runs.iter().enumerate() {
        match (&run.error, run.slab_count, run.waste_percentage) {
            (None, Some(slabs), Some(waste)) => println!(
                "{}. {:<16} {} slab{}, {:.1}% waste, {:.1} ms{}",
                rank + 1,
                run.algorithm.as_str(),
                slabs,
                if slabs == 1 { "" } else { "s" },
                waste,
                run.elapsed_ms,
                if run.optimal { " (optimal)" } else { "" },
            ),
            (error, _, _) => println!(
                "{}. {:<16} failed: {}",
                rank + 1,
                run.algorithm.as_str(),
                error.as_deref().unwrap_or("no result"),
            ),
        }
    }

    match &comparison.recommendation {
        Some(Recommendation::Fastest { algorithm }) => {
            println!("\nAll algorithms use the same number of slabs; {algorithm} is fastest.")
        }
        Some(Recommendation::Best {
            algorithm,
            slabs_saved,
            versus,
        }) => println!(
            "\nRecommended: {algorithm}, saving {slabs_saved} slab{} over {versus}.",
            if *slabs_saved == 1 { "" } else { "s" }
        ),
        None => println!("\nNo algorithm produced a layout."),
    }
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_max_level(log_level(cli.verbose))
        .init();

    let slab = parse_dimensions(&cli.slab).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    let requests = match cli.preset {
        Some(preset) => preset.pieces(),
        None => parse_pieces(&cli.pieces).unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }),
    };

    let mut config = OptimizerConfig::new()
        .with_slab(slab.w, slab.h)
        .with_kerf(cli.kerf)
        .with_splitting(!cli.no_split, cli.min_split)
        .with_algorithm(cli.algorithm)
        .with_max_slabs(cli.max_slabs);
    config.exact.time_limit_ms = cli.time_limit_ms;

    let solver = Solver::new(config, requests);

    if cli.compare {
        match solver.compare() {
            Ok(comparison) if cli.json => {
                println!("{}", serde_json::to_string_pretty(&comparison).unwrap_or_default())
            }
            Ok(comparison) => print_comparison(&comparison),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    match solver.solve() {
        Ok(solution) if cli.json => {
            println!("{}", serde_json::to_string_pretty(&solution).unwrap_or_default())
        }
        Ok(solution) => {
            print_piece_stats(&solver.piece_stats());
            print_solution(&solution)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dimensions() {
        assert_eq!(parse_dimensions("133x78").unwrap(), Rect::new(133.0, 78.0));
        assert_eq!(parse_dimensions("50.5x26").unwrap(), Rect::new(50.5, 26.0));
        assert!(parse_dimensions("133").is_err());
        assert!(parse_dimensions("0x10").is_err());
        assert!(parse_dimensions("ax10").is_err());
    }

    #[test]
    fn test_parse_piece_expands_quantity() {
        let mut next_id = 1;
        let pieces = parse_piece("50x26:2=Stove Left", &mut next_id).unwrap();
        assert_eq!(pieces.len(), 2);
        assert_eq!(pieces[0].id, "1");
        assert_eq!(pieces[1].id, "2");
        assert!(pieces.iter().all(|p| p.label == "Stove Left" && p.width == 50.0));

        let pieces = parse_piece("137x26", &mut next_id).unwrap();
        assert_eq!(pieces[0].id, "3");
        assert_eq!(pieces[0].label, "Countertop 3");

        assert!(parse_piece("10x10:0", &mut next_id).is_err());
        assert!(parse_piece("10x10:x", &mut next_id).is_err());
    }

    #[test]
    fn test_parse_pieces_numbers_across_arguments() {
        let args = vec!["96x26=Main".to_string(), "96x4:2".to_string()];
        let pieces = parse_pieces(&args).unwrap();
        let ids: Vec<&str> = pieces.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_run_summary_logged_by_default() {
        assert_eq!(log_level(false), Level::INFO);
        assert_eq!(log_level(true), Level::DEBUG);
    }

    #[test]
    fn test_preset_flag_replaces_pieces() {
        let cli = Cli::try_parse_from(["slab_optimizer", "--preset", "minimal"]).unwrap();
        assert_eq!(cli.preset, Some(Preset::Minimal));
        assert!(cli.pieces.is_empty());

        assert!(Cli::try_parse_from(["slab_optimizer"]).is_err());
        assert!(
            Cli::try_parse_from(["slab_optimizer", "--preset", "minimal", "--pieces", "10x10"]).is_err()
        );
    }
}
